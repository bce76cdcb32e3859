//! Answer composition: phrase a query result as a natural-language reply.

use crate::db::QueryResult;
use crate::error::Result;
use crate::llm::ChatCompletion;
use std::sync::Arc;

/// Build the explanation prompt from the question and the raw result data
pub fn build_answer_prompt(
    question: &str,
    result: &QueryResult,
    language: Option<&str>,
) -> Result<String> {
    let columns = serde_json::to_string(&result.columns)?;
    let rows = serde_json::to_string(&result.rows)?;

    let instruction = match language {
        Some(language) => format!(
            "Answer in {}, clearly and naturally, like a real person would.",
            language
        ),
        None => "Answer in the same language the user asked in, \
                 clearly and naturally, like a real person would."
            .to_string(),
    };

    Ok(format!(
        r#"The user asked:
{}

Query result:
Columns: {}
Rows: {}

{}
"#,
        question, columns, rows, instruction
    ))
}

pub struct AnswerComposer {
    llm: Arc<dyn ChatCompletion>,
    temperature: f32,
    language: Option<String>,
}

impl AnswerComposer {
    pub fn new(llm: Arc<dyn ChatCompletion>, temperature: f32, language: Option<String>) -> Self {
        Self {
            llm,
            temperature,
            language,
        }
    }

    /// Ask the model to explain `result` as an answer to `question`
    pub async fn compose(&self, question: &str, result: &QueryResult) -> Result<String> {
        let prompt = build_answer_prompt(question, result, self.language.as_deref())?;
        self.llm.complete(&prompt, self.temperature).await
    }
}
