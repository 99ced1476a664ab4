//! OpenAI Assistants v2 adapter.
//!
//! Implements [`AssistantPlatformPort`] over the REST API with reqwest.
//! Every call sends the `OpenAI-Beta: assistants=v2` header.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use journal_core::ports::{AssistantInfo, AssistantPlatformPort, ThreadMessage, ThreadRole};
use journal_types::{
    JournalError, Result,
    config::AssistantConfig,
    run::{AssistantRun, RunStatus},
};

pub struct OpenAiAssistants {
    client: Client,
    api_base: String,
    api_key: String,
}

#[derive(Deserialize)]
struct AssistantObject {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Deserialize)]
struct RunObject {
    id: String,
    thread_id: String,
    status: RunStatus,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Deserialize)]
struct MessageObject {
    role: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct TextValue {
    value: String,
}

impl From<RunObject> for AssistantRun {
    fn from(run: RunObject) -> Self {
        AssistantRun {
            thread_id: run.thread_id,
            run_id: run.id,
            status: run.status,
        }
    }
}

impl OpenAiAssistants {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| JournalError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(JournalError::Upstream(format!("HTTP {}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| JournalError::Upstream(format!("unexpected response body: {}", e)))
    }
}

#[async_trait(?Send)]
impl AssistantPlatformPort for OpenAiAssistants {
    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<AssistantInfo> {
        let assistant: AssistantObject = self
            .send(self.client.get(self.url(&format!("assistants/{}", assistant_id))))
            .await?;
        Ok(AssistantInfo {
            id: assistant.id,
            name: assistant.name,
        })
    }

    async fn create_thread(&self) -> Result<String> {
        let thread: ThreadObject = self
            .send(self.client.post(self.url("threads")).json(&json!({})))
            .await?;
        Ok(thread.id)
    }

    async fn add_user_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let _: serde_json::Value = self
            .send(
                self.client
                    .post(self.url(&format!("threads/{}/messages", thread_id)))
                    .json(&json!({ "role": "user", "content": content })),
            )
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<AssistantRun> {
        let run: RunObject = self
            .send(
                self.client
                    .post(self.url(&format!("threads/{}/runs", thread_id)))
                    .json(&json!({ "assistant_id": assistant_id })),
            )
            .await?;
        Ok(run.into())
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<AssistantRun> {
        let run: RunObject = self
            .send(
                self.client
                    .get(self.url(&format!("threads/{}/runs/{}", thread_id, run_id))),
            )
            .await?;
        Ok(run.into())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let list: MessageList = self
            .send(
                self.client
                    .get(self.url(&format!("threads/{}/messages", thread_id)))
                    .query(&[("order", "desc")]),
            )
            .await?;

        Ok(list
            .data
            .into_iter()
            .map(|m| ThreadMessage {
                role: if m.role == "assistant" {
                    ThreadRole::Assistant
                } else {
                    ThreadRole::User
                },
                text_parts: m
                    .content
                    .into_iter()
                    .filter_map(|part| match part {
                        ContentPart::Text { text } => Some(text.value),
                        ContentPart::Other => None,
                    })
                    .collect(),
            })
            .collect())
    }
}
