use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Statement rejected: {0}")]
    Guard(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AssistantError>;

impl From<tokio::task::JoinError> for AssistantError {
    fn from(err: tokio::task::JoinError) -> Self {
        AssistantError::Task(err.to_string())
    }
}

/// Pipeline stage a request was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Introspect,
    GenerateSql,
    Guard,
    Execute,
    Compose,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Introspect => "read schema",
            Stage::GenerateSql => "generate SQL",
            Stage::Guard => "check SQL",
            Stage::Execute => "execute query",
            Stage::Compose => "compose answer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed request: the stage that failed and the underlying error.
#[derive(Error, Debug)]
#[error("{stage}: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: AssistantError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: AssistantError) -> Self {
        Self { stage, source }
    }
}

/// Attach a pipeline stage to a fallible step.
pub trait AtStage<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, PipelineError>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, PipelineError> {
        self.map_err(|e| PipelineError::new(stage, e))
    }
}
