use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::llm::GeminiClient;
use crate::utils::http::build_http_client;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_router(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[derive(Clone)]
pub struct StubGemini {
    status: StatusCode,
    body: Value,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl StubGemini {
    pub fn replying_text(text: &str) -> Self {
        Self::replying(
            StatusCode::OK,
            json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }),
        )
    }

    pub fn replying(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Starts the stub and returns a client pointed at it.
    pub async fn start(&self) -> GeminiClient {
        let router = Router::new()
            .route("/models/:call", post(stub_generate))
            .with_state(self.clone());
        let base = spawn_router(router).await;
        GeminiClient::new(build_http_client(10).unwrap(), "test-key", "gemini-test", base)
    }

    pub fn recorded(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

async fn stub_generate(
    State(stub): State<StubGemini>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.requests.lock().unwrap().push(payload);
    (stub.status, Json(stub.body.clone()))
}

pub const SAMPLE_RESULT: &str = r#"{"face_shape":"Oval","explanation_face_shape":"Balanced proportions.","celebrities":["A","B"],"recommended_styles":[{"style":"Aviator","reason":"Adds angles.","link":"https://example.com"}]}"#;

/// Smallest byte sequence `infer` recognises as JPEG.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
