//! Mock Ollama-style HTTP server for integration tests

use ai_services_client::GenerationClient;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Client for `phi3` pointed at the mock server.
    pub fn client(&self) -> GenerationClient {
        GenerationClient::builder()
            .base_url(&self.base_url)
            .model("phi3")
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client")
    }

    pub async fn mock_get(&self, path: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("GET", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    pub async fn mock_post(&self, path: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// POST mock that only matches when the request body contains `expected`.
    pub async fn mock_post_matching(&self, path: &str, expected: Value, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .match_body(Matcher::PartialJson(expected))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// `/api/chat` answering with assistant `content`.
    pub async fn mock_chat_content(&self, content: &str) -> Mock {
        self.mock_post("/api/chat", 200, &chat_body(content, None)).await
    }

    /// `/api/chat` answering with `tool_calls`.
    pub async fn mock_chat_tool_calls(&self, calls: Value) -> Mock {
        self.mock_post("/api/chat", 200, &chat_body("", Some(calls))).await
    }
}

pub fn chat_body(content: &str, tool_calls: Option<Value>) -> String {
    let mut message = json!({"role": "assistant", "content": content});
    if let Some(calls) = tool_calls {
        message["tool_calls"] = calls;
    }
    json!({"model": "phi3", "message": message, "done": true}).to_string()
}
