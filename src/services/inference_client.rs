use crate::error::{CoreError, CoreResult};
use crate::wire::{self, WireMessage};
use async_trait::async_trait;
use std::time::Duration;

/// The inference backend, treated as an opaque HTTP collaborator at `/ask`.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait InferenceClient: Send + Sync {
    async fn ask(&self, user_uuid: &str, messages: &[WireMessage]) -> CoreResult<String>;
}

pub struct HttpInferenceClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInferenceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn ask(&self, user_uuid: &str, messages: &[WireMessage]) -> CoreResult<String> {
        let response = self
            .client
            .post(format!("{}/ask", self.base_url))
            .json(&serde_json::json!({ "userid": user_uuid, "messages": messages }))
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        wire::extract_reply(&body).ok_or(CoreError::MalformedReply)
    }
}
