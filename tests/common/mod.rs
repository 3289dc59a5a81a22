//! Common test utilities - RiddleTest harness for end-to-end testing
//!
//! Spawns a real artriddle server on a random port, wired to a fake Gemini
//! API that replays scripted responses and records what it received.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use artriddle::{Config, Server};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// API key the harness configures
pub const TEST_API_KEY: &str = "test-key";

/// A request received by the fake Gemini API
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// `{model}:{method}` path segment
    pub call: String,
    pub api_key: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct FakeState {
    responses: Mutex<HashMap<String, VecDeque<(StatusCode, Value)>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

/// Fake Gemini REST API
pub struct FakeGemini {
    pub addr: SocketAddr,
    state: Arc<FakeState>,
    _handle: JoinHandle<()>,
}

impl FakeGemini {
    /// Start the fake on a random port
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(FakeState::default());

        let router = Router::new()
            .route("/models/{call}", post(handle_call))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                eprintln!("Fake Gemini error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn push(&self, method: &str, status: StatusCode, body: Value) {
        self.state
            .responses
            .lock()
            .entry(method.to_string())
            .or_default()
            .push_back((status, body));
    }

    /// Queue a successful text answer
    pub fn push_text(&self, text: &str) {
        self.push(
            "generateContent",
            StatusCode::OK,
            json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]}),
        );
    }

    /// Queue a structured riddle answer
    pub fn push_riddle(&self, number: u32, title: &str, description: &str, solution: &str) {
        let riddle = json!({
            "riddleNumber": number,
            "title": title,
            "description": description,
            "solution": solution
        });
        self.push_text(&riddle.to_string());
    }

    /// Queue an image answer with the given raw bytes
    pub fn push_images(&self, images: &[&[u8]]) {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

        let predictions: Vec<Value> = images
            .iter()
            .map(|bytes| json!({"bytesBase64Encoded": BASE64.encode(bytes), "mimeType": "image/jpeg"}))
            .collect();
        self.push("predict", StatusCode::OK, json!({"predictions": predictions}));
    }

    /// Queue an image answer where every image was filtered out
    pub fn push_no_images(&self) {
        self.push("predict", StatusCode::OK, json!({}));
    }

    /// Queue an API error for a method (`generateContent` or `predict`)
    pub fn push_error(&self, method: &str, status: u16, api_status: &str, message: &str) {
        let status = StatusCode::from_u16(status).unwrap();
        self.push(
            method,
            status,
            json!({"error": {"code": status.as_u16(), "message": message, "status": api_status}}),
        );
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().clone()
    }

    /// Most recent call
    pub fn last_call(&self) -> RecordedCall {
        self.calls().last().cloned().expect("no calls recorded")
    }
}

async fn handle_call(
    Path(call): Path<String>,
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.calls.lock().push(RecordedCall {
        call: call.clone(),
        api_key,
        body,
    });

    let method = call.rsplit(':').next().unwrap_or_default().to_string();
    let scripted = state
        .responses
        .lock()
        .get_mut(&method)
        .and_then(|queue| queue.pop_front());

    match scripted {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"code": 500, "message": "nothing scripted", "status": "INTERNAL"}})),
        )
            .into_response(),
    }
}

/// Test harness that spawns a real artriddle server on a random port
pub struct RiddleTest {
    pub addr: SocketAddr,
    pub client: Client,
    pub gemini: FakeGemini,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl RiddleTest {
    /// Start a server with an in-memory database
    pub async fn start() -> Result<Self> {
        Self::start_with_db(None).await
    }

    /// Start a server, optionally backed by a database file
    pub async fn start_with_db(db_path: Option<String>) -> Result<Self> {
        let gemini = FakeGemini::start().await?;

        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let mut config = Config {
            bind_addr: addr,
            db_path,
            ..Config::default()
        };
        config.gemini.base_url = gemini.base_url();
        config.gemini.api_key = Some(TEST_API_KEY.to_string());

        let server = Arc::new(Server::new(config).await?);
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            gemini,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a POST request without a body
    pub async fn post(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Shutdown the server gracefully
    pub fn shutdown(&self) {
        self.server.shutdown();
    }
}

impl Drop for RiddleTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}
