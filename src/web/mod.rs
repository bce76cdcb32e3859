//! Form server
//!
//! Plain tokio TCP with just enough HTTP/1.1 for one form: `GET /` shows it,
//! `POST /` answers a question. Connections are served one at a time, so a
//! submission runs to completion before the next connection is accepted.

pub mod page;

use crate::assistant::Assistant;
use crate::error::Result;
use page::{render_page, FormState};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

const READ_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_REQUEST_BYTES: usize = 1_000_000;

#[derive(Debug, Deserialize)]
struct QuestionForm {
    #[serde(default)]
    question: String,
}

/// Accept connections forever, handling each to completion before the next
pub async fn serve(listener: TcpListener, assistant: &Assistant) -> Result<()> {
    info!("Form available at http://{}", listener.local_addr()?);
    loop {
        let (stream, addr) = listener.accept().await?;
        debug!("New connection from: {}", addr);
        handle_connection(stream, assistant).await;
    }
}

async fn handle_connection(mut stream: TcpStream, assistant: &Assistant) {
    let mut buffer = Vec::new();
    let mut temp_buf = [0; 8192];

    let read_result = timeout(READ_TIMEOUT, async {
        loop {
            let n = stream.read(&mut temp_buf).await?;
            if n == 0 {
                return Ok::<_, std::io::Error>(RequestState::Incomplete);
            }
            buffer.extend_from_slice(&temp_buf[..n]);
            match request_state(&buffer) {
                RequestState::Incomplete => continue,
                state => return Ok(state),
            }
        }
    })
    .await;

    let response = match read_result {
        Err(_) => {
            warn!("Request read timeout");
            return;
        }
        Ok(Err(e)) => {
            warn!("Failed to read from stream: {}", e);
            return;
        }
        Ok(Ok(_)) if buffer.is_empty() => return,
        Ok(Ok(RequestState::TooLarge)) => {
            warn!("Rejecting request larger than {} bytes", MAX_REQUEST_BYTES);
            text_response(413, "Payload Too Large", "Request too large")
        }
        Ok(Ok(_)) => match String::from_utf8(buffer) {
            Ok(request) => handle_request(&request, assistant).await,
            Err(_) => text_response(400, "Bad Request", "Request is not UTF-8"),
        },
    };

    if let Err(e) = stream.write_all(response.as_bytes()).await {
        warn!("Failed to write response: {}", e);
    }
    let _ = stream.shutdown().await;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestState {
    /// Headers or announced body still missing
    Incomplete,
    Complete,
    /// Buffer or announced body exceeds `MAX_REQUEST_BYTES`
    TooLarge,
}

fn request_state(buffer: &[u8]) -> RequestState {
    if buffer.len() > MAX_REQUEST_BYTES {
        return RequestState::TooLarge;
    }
    let Some(headers_end) = find_subslice(buffer, b"\r\n\r\n") else {
        return RequestState::Incomplete;
    };
    let head = String::from_utf8_lossy(&buffer[..headers_end]);
    let content_length = extract_content_length(&head).unwrap_or(0);
    if content_length > MAX_REQUEST_BYTES {
        return RequestState::TooLarge;
    }

    let expected = (headers_end + 4).saturating_add(content_length);
    if buffer.len() >= expected {
        RequestState::Complete
    } else {
        RequestState::Incomplete
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn extract_content_length(request: &str) -> Option<usize> {
    for line in request.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            if let Some(value) = line.split(':').nth(1) {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

/// Route one complete request and build the raw HTTP response
pub async fn handle_request(request: &str, assistant: &Assistant) -> String {
    let (head, body) = request.split_once("\r\n\r\n").unwrap_or((request, ""));
    let mut lines = head.lines();

    let parts: Vec<&str> = lines
        .next()
        .map(|l| l.split_whitespace().collect())
        .unwrap_or_default();
    if parts.len() < 2 {
        return text_response(400, "Bad Request", "Bad Request");
    }

    let method = parts[0];
    let path = parts[1].split('?').next().unwrap_or("/");
    let path = match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    };

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    debug!("Request: {} {}", method, path);

    match (method, path) {
        ("GET", "/") => create_response(
            200,
            "OK",
            "text/html; charset=utf-8",
            &render_page(&FormState::default()),
        ),
        ("POST", "/") => {
            let form_encoded = headers
                .get("content-type")
                .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
                .unwrap_or(true);
            if !form_encoded {
                return text_response(
                    415,
                    "Unsupported Media Type",
                    "Expected application/x-www-form-urlencoded",
                );
            }

            let Some(question) = parse_question(body) else {
                return text_response(400, "Bad Request", "Malformed form body");
            };

            let (answer, sql) = assistant.handle_query(&question).await;
            let html = render_page(&FormState {
                question: &question,
                answer: &answer,
                sql: &sql,
            });
            create_response(200, "OK", "text/html; charset=utf-8", &html)
        }
        (_, "/") => text_response(405, "Method Not Allowed", "Method Not Allowed"),
        _ => text_response(404, "Not Found", "Not Found"),
    }
}

/// Decode the `question` field of a urlencoded form body
pub fn parse_question(body: &str) -> Option<String> {
    serde_urlencoded::from_str::<QuestionForm>(body.trim())
        .ok()
        .map(|form| form.question)
}

fn text_response(status: u16, status_text: &str, body: &str) -> String {
    create_response(status, status_text, "text/plain; charset=utf-8", body)
}

fn create_response(status: u16, status_text: &str, content_type: &str, body: &str) -> String {
    let allow = if status == 405 { "Allow: GET, POST\r\n" } else { "" };
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}\r\n\
         {}Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        status,
        status_text,
        content_type,
        allow,
        body.len(),
        body
    )
}
