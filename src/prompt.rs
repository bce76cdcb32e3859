//! SQL-generation prompt
//!
//! Pure templating over the structured schema; no inputs are validated.

use crate::db::Schema;

/// Build the prompt asking for one raw SQLite statement that answers `question`
pub fn build_sql_prompt(schema: &Schema, question: &str) -> String {
    format!(
        r#"You are an SQL expert.

Database schema (SQLite):
{}
Write one CORRECT SQL statement that answers the question.
Return only the raw SQL. NO markdown, NO explanation.

Question:
{}
"#,
        schema.describe(),
        question
    )
}
