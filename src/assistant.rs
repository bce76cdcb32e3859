//! Request handler
//!
//! Runs one question through the pipeline:
//! introspect → prompt → generate → sanitize → (guard) → execute → compose.
//! The first failing stage ends the request; nothing is retried and no
//! partial result is returned.

use crate::answer::AnswerComposer;
use crate::config::AssistantConfig;
use crate::db::{Database, QueryResult};
use crate::error::{AssistantError, AtStage, PipelineError, Stage};
use crate::guard::StatementGuard;
use crate::llm::{ChatCompletion, LlmClient};
use crate::prompt::build_sql_prompt;
use crate::sanitize::clean_sql;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Prefix of every failure string shown to the user
pub const ERROR_MARKER: &str = "❌ Error";

/// Everything a successful request produced
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub sql: String,
    pub result: QueryResult,
    pub answer: String,
}

pub struct Assistant {
    db: Database,
    llm: Arc<dyn ChatCompletion>,
    guard: StatementGuard,
    composer: AnswerComposer,
    sql_temperature: f32,
}

impl Assistant {
    pub fn new(config: &AssistantConfig, llm: Arc<dyn ChatCompletion>) -> Self {
        let db = Database::new(&config.database_path).with_read_only(config.read_only);
        let composer = AnswerComposer::new(
            llm.clone(),
            config.answer_temperature,
            config.answer_language.clone(),
        );
        Self {
            db,
            llm,
            guard: StatementGuard::new(config.read_only),
            composer,
            sql_temperature: config.sql_temperature,
        }
    }

    /// Assistant backed by the configured remote chat-completions service
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(config, Arc::new(LlmClient::from_config(config)))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Translate `question` into sanitized SQL against the current schema
    pub async fn generate_sql(&self, question: &str) -> Result<String, PipelineError> {
        let schema = self.db.introspect_async().await.at(Stage::Introspect)?;
        debug!(tables = schema.tables.len(), "Schema loaded");

        let prompt = build_sql_prompt(&schema, question);
        let raw = self
            .llm
            .complete(&prompt, self.sql_temperature)
            .await
            .at(Stage::GenerateSql)?;

        let sql = clean_sql(&raw);
        if sql.is_empty() {
            return Err(PipelineError::new(
                Stage::GenerateSql,
                AssistantError::Llm("model returned no SQL".to_string()),
            ));
        }
        Ok(sql)
    }

    /// Run the whole pipeline for one question
    pub async fn run(&self, question: &str) -> Result<Outcome, PipelineError> {
        let sql = self.generate_sql(question).await?;
        info!(sql = %sql, "Generated SQL");

        self.guard.check(&sql).at(Stage::Guard)?;

        let result = self.db.execute_async(&sql).await.at(Stage::Execute)?;
        debug!(
            columns = result.columns.len(),
            rows = result.row_count(),
            "Query executed"
        );

        let answer = self
            .composer
            .compose(question, &result)
            .await
            .at(Stage::Compose)?;

        Ok(Outcome {
            sql,
            result,
            answer,
        })
    }

    /// Form-facing entry point: `(answer, sql)` on success,
    /// `(error message, "")` on any failure.
    pub async fn handle_query(&self, question: &str) -> (String, String) {
        let span = info_span!("request", id = %Uuid::new_v4());
        async {
            match self.run(question).await {
                Ok(outcome) => (outcome.answer, outcome.sql),
                Err(err) => {
                    warn!(stage = %err.stage, error = %err.source, "Request failed");
                    (render_failure(&err), String::new())
                }
            }
        }
        .instrument(span)
        .await
    }
}

pub fn render_failure(err: &PipelineError) -> String {
    format!("{} ({}): {}", ERROR_MARKER, err.stage, err.source)
}
