//! Scripted OCR server for end-to-end tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use url::Url;

/// What the fake server answers with.
#[derive(Clone)]
pub struct Script {
    pub status: StatusCode,
    pub body: Vec<u8>,
    /// Size of each body chunk on the wire.
    pub chunk_size: usize,
}

impl Script {
    pub fn ok(body: &str, chunk_size: usize) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.as_bytes().to_vec(),
            chunk_size,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: br#"{"detail":"boom"}"#.to_vec(),
            chunk_size: 64,
        }
    }
}

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub query: Option<String>,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Clone)]
struct FakeState {
    script: Script,
    captured: Arc<Mutex<Vec<Captured>>>,
}

pub struct FakeServer {
    pub base_url: Url,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl FakeServer {
    pub async fn spawn(script: Script) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            script,
            captured: captured.clone(),
        };

        let app = Router::new()
            .route("/api/ocr/stream", post(stream_handler))
            .route("/api/ocr", post(recognize_handler))
            .route("/api/health", get(health_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: Url::parse(&format!("http://{}", addr)).unwrap(),
            captured,
        }
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

async fn stream_handler(
    State(state): State<FakeState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    state.captured.lock().unwrap().push(Captured {
        query,
        body: body.to_vec(),
    });

    let script = state.script;
    if !script.status.is_success() {
        return (script.status, script.body).into_response();
    }

    let chunks: Vec<Vec<u8>> = script
        .body
        .chunks(script.chunk_size.max(1))
        .map(|c| c.to_vec())
        .collect();
    // Pause between chunks so they reach the client as separate reads.
    let stream = futures::stream::iter(chunks).then(|chunk| async move {
        tokio::time::sleep(Duration::from_millis(2)).await;
        Ok::<_, std::io::Error>(chunk)
    });

    Response::builder()
        .header("content-type", "text/event-stream")
        .body(Body::from_stream(stream))
        .unwrap()
}

async fn recognize_handler(State(state): State<FakeState>, body: Bytes) -> Response {
    state.captured.lock().unwrap().push(Captured {
        query: None,
        body: body.to_vec(),
    });
    Json(serde_json::json!({ "result": "Recognized text" })).into_response()
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "model": "test-model" }))
}

/// Stream body for a two-page document.
pub const TWO_PAGE_STREAM: &str = concat!(
    "data: {\"type\": \"page_start\", \"page\": 1, \"total\": 2}\n\n",
    "data: {\"type\": \"content\", \"text\": \"Hello\", \"page\": 1}\n\n",
    "data: {\"type\": \"page_end\", \"page\": 1}\n\n",
    "data: {not valid json\n\n",
    "data: {\"type\": \"page_start\", \"page\": 2, \"total\": 2}\n\n",
    "data: {\"type\": \"content\", \"text\": \"Wörld\", \"page\": 2}\n\n",
    "data: {\"type\": \"page_end\", \"page\": 2}\n\n",
    "data: {\"type\": \"done\", \"filename\": \"20250101_120000_abcd1234.pdf\", \"total_pages\": 2}\n\n",
);

pub fn png_bytes() -> Vec<u8> {
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&4u32.to_be_bytes());
    png.extend_from_slice(&4u32.to_be_bytes());
    png
}
