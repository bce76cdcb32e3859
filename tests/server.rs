//! Form server over a real socket

use async_trait::async_trait;
use rusqlite::Connection;
use sql_assistant::llm::ChatCompletion;
use sql_assistant::{web, Assistant, AssistantConfig, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

struct CountingModel;

#[async_trait]
impl ChatCompletion for CountingModel {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        if temperature == 0.0 {
            Ok("```sql\nSELECT COUNT(*) FROM orders;\n```".to_string())
        } else if prompt.contains("Rows: [[2]]") {
            Ok("There are 2 orders.".to_string())
        } else {
            Ok("unexpected result".to_string())
        }
    }
}

async fn start_server(temp_dir: &TempDir) -> SocketAddr {
    let path = temp_dir.path().join("shop.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch(
            r#"
            CREATE TABLE orders (id INTEGER PRIMARY KEY, total REAL);
            INSERT INTO orders (total) VALUES (1.0), (2.0);
            "#,
        )
        .unwrap();
    let config = AssistantConfig {
        database_path: path,
        ..AssistantConfig::default()
    };

    let assistant: &'static Assistant =
        Box::leak(Box::new(Assistant::new(&config, Arc::new(CountingModel))));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = web::serve(listener, assistant).await;
    });
    addr
}

/// Write `request` on a fresh socket and read until the server closes it
async fn send_raw(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).to_string()
}

async fn get_status(addr: SocketAddr) -> reqwest::StatusCode {
    reqwest::get(format!("http://{}/", addr)).await.unwrap().status()
}

#[tokio::test]
async fn test_get_renders_empty_form() {
    let temp_dir = TempDir::new().unwrap();
    let addr = start_server(&temp_dir).await;

    let response = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let html = response.text().await.unwrap();
    assert!(html.contains("AI Text-to-SQL Assistant"));
    assert!(html.contains(r#"name="question""#));
}

#[tokio::test]
async fn test_post_answers_question() {
    let temp_dir = TempDir::new().unwrap();
    let addr = start_server(&temp_dir).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/", addr))
        .form(&[("question", "How many orders are there?")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let html = response.text().await.unwrap();
    assert!(html.contains(">How many orders are there?</textarea>"));
    assert!(html.contains(">There are 2 orders.</textarea>"));
    assert!(html.contains(">SELECT COUNT(*) FROM orders;</textarea>"));
}

#[tokio::test]
async fn test_unknown_routes() {
    let temp_dir = TempDir::new().unwrap();
    let addr = start_server(&temp_dir).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("http://{}/api/query", addr)).send().await.unwrap();
    assert_eq!(response.status(), 404);

    let response = client.delete(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(response.status(), 405);
}

#[tokio::test]
async fn test_huge_content_length_is_rejected_and_server_keeps_running() {
    let temp_dir = TempDir::new().unwrap();
    let addr = start_server(&temp_dir).await;

    let response = send_raw(
        addr,
        b"POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 18446744073709551615\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 413 "), "{}", response);

    assert_eq!(get_status(addr).await, 200);
}

#[tokio::test]
async fn test_body_over_limit_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let addr = start_server(&temp_dir).await;

    let response = send_raw(
        addr,
        b"POST / HTTP/1.1\r\nHost: x\r\n\
          Content-Type: application/x-www-form-urlencoded\r\n\
          Content-Length: 2000000\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 413 "), "{}", response);
    assert_eq!(get_status(addr).await, 200);
}

#[tokio::test]
async fn test_wrong_content_type_and_malformed_form() {
    let temp_dir = TempDir::new().unwrap();
    let addr = start_server(&temp_dir).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/", addr))
        .header("content-type", "application/json")
        .body(r#"{"question":"How many orders?"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 415);

    let response = client
        .post(format!("http://{}/", addr))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("question=a&question=b")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_stalled_client_times_out_and_server_recovers() {
    let temp_dir = TempDir::new().unwrap();
    let addr = start_server(&temp_dir).await;

    let mut stalled = TcpStream::connect(addr).await.unwrap();
    stalled
        .write_all(b"POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 10\r\n\r\nque")
        .await
        .unwrap();

    // Served once the stalled read times out
    assert_eq!(get_status(addr).await, 200);

    let mut leftover = Vec::new();
    let n = stalled.read_to_end(&mut leftover).await.unwrap_or(0);
    assert_eq!(n, 0);
}
