//! HTML for the question form

pub const TITLE: &str = "🧠 AI Text-to-SQL Assistant";
pub const DESCRIPTION: &str =
    "Ask in English or Vietnamese. The assistant queries the database and answers.";

/// What the form shows: the submitted question and both outputs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    pub sql: &'a str,
}

pub fn render_page(state: &FormState<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; }}
label {{ display: block; font-weight: bold; margin-top: 1rem; }}
textarea {{ width: 100%; box-sizing: border-box; font-size: 1rem; }}
textarea[readonly] {{ background: #f6f6f6; }}
button {{ margin-top: 1rem; padding: 0.5rem 1.5rem; font-size: 1rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>{description}</p>
<form method="post" action="/">
<label for="question">💬 Your question</label>
<textarea id="question" name="question" rows="3">{question}</textarea>
<button type="submit">Submit</button>
</form>
<label for="answer">✅ Answer</label>
<textarea id="answer" rows="6" readonly>{answer}</textarea>
<label for="sql">📄 Generated SQL</label>
<textarea id="sql" rows="4" readonly>{sql}</textarea>
</body>
</html>
"#,
        title = escape_html(TITLE),
        description = escape_html(DESCRIPTION),
        question = escape_html(state.question),
        answer = escape_html(state.answer),
        sql = escape_html(state.sql),
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
