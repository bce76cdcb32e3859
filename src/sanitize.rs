//! Strips markdown code fences the model sometimes wraps around SQL.
//!
//! Output never starts with a fence, so applying `clean_sql` twice gives the
//! same result as applying it once.

const FENCE: &str = "```";

/// Language tags recognized even when the SQL continues on the fence line
const SQL_TAGS: &[&str] = &["sql", "sqlite", "sqlite3"];

/// Words that open a statement and so are never a language tag
const STATEMENT_KEYWORDS: &[&str] = &[
    "select", "with", "insert", "update", "delete", "replace", "create", "drop", "alter",
    "pragma", "explain", "vacuum", "analyze", "reindex", "begin", "commit", "rollback", "values",
];

/// Remove an opening fence (and its language tag) and everything from the
/// closing fence on. Input without a leading fence is only trimmed.
pub fn clean_sql(raw: &str) -> String {
    let text = raw.trim();
    let Some(after_open) = text.strip_prefix(FENCE) else {
        return text.to_string();
    };

    let body = strip_language_tag(after_open);
    let body = match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };

    body.trim().to_string()
}

fn strip_language_tag(after_open: &str) -> &str {
    let (first_line, rest) = match after_open.split_once('\n') {
        Some((line, rest)) => (line, Some(rest)),
        None => (after_open, None),
    };

    // ```sql\nSELECT ... : a lone word on the fence line is a tag
    let word = first_line.trim();
    if let Some(rest) = rest {
        let is_keyword = STATEMENT_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word));
        let is_single_word = !word.contains(char::is_whitespace) && !word.contains(FENCE);
        if !word.is_empty() && !is_keyword && is_single_word {
            return rest;
        }
    }

    // ```sql SELECT ... : only well-known tags are stripped inline
    let leading = first_line.trim_start();
    let tag_len = leading
        .find(|c: char| c.is_whitespace() || c == '`')
        .unwrap_or(leading.len());
    let tag = &leading[..tag_len];
    if SQL_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
        let offset = after_open.len() - leading.len() + tag_len;
        return &after_open[offset..];
    }

    after_open
}
