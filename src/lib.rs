pub mod answer;
pub mod assistant;
pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod llm;
pub mod logging;
pub mod prompt;
pub mod sanitize;
pub mod web;

pub use assistant::{Assistant, Outcome, ERROR_MARKER};
pub use config::AssistantConfig;
pub use error::{AssistantError, PipelineError, Result, Stage};
