//! End-to-end pipeline tests against a real SQLite file and scripted models

use async_trait::async_trait;
use rusqlite::Connection;
use serde_json::json;
use sql_assistant::answer::build_answer_prompt;
use sql_assistant::db::QueryResult;
use sql_assistant::llm::ChatCompletion;
use sql_assistant::{Assistant, AssistantConfig, Result, Stage, ERROR_MARKER};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Always answers with the same text and records every call
struct FixedReply {
    reply: String,
    calls: Mutex<Vec<(String, f32)>>,
}

impl FixedReply {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatCompletion for FixedReply {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.calls.lock().unwrap().push((prompt.to_string(), temperature));
        Ok(self.reply.clone())
    }
}

/// Picks a reply as a pure function of the prompt and temperature
struct Deterministic;

#[async_trait]
impl ChatCompletion for Deterministic {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let mut hasher = DefaultHasher::new();
        prompt.hash(&mut hasher);
        temperature.to_bits().hash(&mut hasher);
        let candidates = [
            "SELECT COUNT(*) FROM X;",
            "```sql\nSELECT name FROM X ORDER BY id;\n```",
            "SELECT MAX(id) FROM X;",
        ];
        Ok(candidates[(hasher.finish() % candidates.len() as u64) as usize].to_string())
    }
}

fn create_database(dir: &Path) -> AssistantConfig {
    let path = dir.join("my_data.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch(
            r#"
            CREATE TABLE X (id INTEGER PRIMARY KEY, name TEXT);
            INSERT INTO X (name) VALUES ('a'), ('b'), ('c');
            "#,
        )
        .unwrap();
    AssistantConfig {
        database_path: path,
        ..AssistantConfig::default()
    }
}

#[tokio::test]
async fn test_count_rows_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_database(temp_dir.path());
    let llm = FixedReply::new("SELECT COUNT(*) FROM X;");
    let assistant = Assistant::new(&config, llm.clone());

    let question = "How many rows are in table X?";
    let outcome = assistant.run(question).await.unwrap();

    let expected = QueryResult {
        columns: vec!["COUNT(*)".to_string()],
        rows: vec![vec![json!(3)]],
    };
    assert_eq!(outcome.sql, "SELECT COUNT(*) FROM X;");
    assert_eq!(outcome.result, expected);

    let calls = llm.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, config.sql_temperature);
    assert!(calls[0].0.contains("Table X (\n  id INTEGER,\n  name TEXT,\n)"));
    assert_eq!(calls[1].0, build_answer_prompt(question, &expected, None).unwrap());
    assert_eq!(calls[1].1, config.answer_temperature);
}

#[tokio::test]
async fn test_sql_generation_is_deterministic_at_temperature_zero() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_database(temp_dir.path());
    let assistant = Assistant::new(&config, Arc::new(Deterministic));

    let question = "List every name in X";
    let first = assistant.generate_sql(question).await.unwrap();
    let second = assistant.generate_sql(question).await.unwrap();
    assert_eq!(first, second);
    assert!(!first.contains("```"));
}

#[tokio::test]
async fn test_malformed_sql_yields_marker_and_empty_sql() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_database(temp_dir.path());
    let llm = FixedReply::new("SELECT COUNT(* FROM X");
    let assistant = Assistant::new(&config, llm.clone());

    let (message, sql) = assistant.handle_query("How many rows are in table X?").await;
    assert!(message.starts_with(ERROR_MARKER), "{}", message);
    assert_eq!(sql, "");

    // The answer step never ran
    assert_eq!(llm.calls.lock().unwrap().len(), 1);

    let err = assistant.run("How many rows are in table X?").await.unwrap_err();
    assert_eq!(err.stage, Stage::Execute);
}

#[tokio::test]
async fn test_schema_is_read_fresh_for_every_request() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_database(temp_dir.path());
    let llm = FixedReply::new("SELECT COUNT(*) FROM X;");
    let assistant = Assistant::new(&config, llm.clone());

    assistant.handle_query("first").await;
    Connection::open(&config.database_path)
        .unwrap()
        .execute_batch("CREATE TABLE Y (label TEXT);")
        .unwrap();
    assistant.handle_query("second").await;

    let calls = llm.calls.lock().unwrap();
    assert!(!calls[0].0.contains("Table Y ("));
    assert!(calls[2].0.contains("Table Y (\n  label TEXT,\n)"));
}

#[tokio::test]
async fn test_model_output_is_executed_verbatim_by_default() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_database(temp_dir.path());
    let assistant = Assistant::new(&config, FixedReply::new("DELETE FROM X WHERE name = 'a'"));

    let outcome = assistant.run("remove a").await.unwrap();
    assert!(outcome.result.columns.is_empty());

    let remaining = assistant.database().execute("SELECT COUNT(*) FROM X").unwrap();
    assert_eq!(remaining.rows, vec![vec![json!(2)]]);
}
