//! Client for the assistant proxy endpoint.
//!
//! Posts `{"question": ...}` with browser `fetch()` via gloo-net and reads
//! `{"response": ...}` back. Failure bodies carry `{"error": ...}`.

use async_trait::async_trait;
use gloo_net::http::Request;
use serde::{Deserialize, Serialize};

use journal_core::ports::AssistantPort;
use journal_types::{JournalError, Result};

pub struct ProxyClient {
    endpoint: String,
}

#[derive(Serialize)]
struct QuestionBody<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct ReplyBody {
    response: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ProxyClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait(?Send)]
impl AssistantPort for ProxyClient {
    async fn ask(&self, question: &str) -> Result<String> {
        let response = Request::post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&QuestionBody { question })
            .map_err(|e| JournalError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| JournalError::Network(e.to_string()))?;

        if !response.ok() {
            let status = response.status();
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => "unknown error".to_string(),
            };
            return Err(if status == 400 {
                JournalError::Validation(message)
            } else {
                JournalError::Upstream(format!("HTTP {}: {}", status, message))
            });
        }

        let body: ReplyBody = response
            .json()
            .await
            .map_err(|e| JournalError::Serialization(e.to_string()))?;
        Ok(body.response)
    }
}
