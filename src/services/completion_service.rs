//! Client for an OpenAI-compatible chat-completions endpoint (Groq by default).
//!
//! The credential only ever lives in backend configuration.

use crate::config::CompletionSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion endpoint is not configured")]
    NotConfigured,
    #[error("HTTP error! status: {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to reach completion endpoint: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    settings: CompletionSettings,
}

impl CompletionClient {
    pub fn new(settings: CompletionSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Sends one system + user exchange and returns the first choice's text.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, CompletionError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(CompletionError::NotConfigured)?;

        let payload = ChatRequest {
            model: &self.settings.model,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        log::debug!(
            "🤖 Sending completion request (model: {}, prompt: {} chars)",
            self.settings.model,
            prompt.len()
        );

        let response = self
            .http
            .post(&self.settings.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CompletionError::Status(response.status()));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| CompletionError::Malformed("no content in first choice".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> CompletionClient {
        CompletionClient::new(CompletionSettings {
            api_url: format!("{}/openai/v1/chat/completions", server.url()),
            api_key: Some("gsk_test".to_string()),
            ..CompletionSettings::default()
        })
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/v1/chat/completions")
            .match_header("authorization", "Bearer gsk_test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "max_tokens": 2048,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "plan please"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r##"{"choices":[{"message":{"role":"assistant","content":"# Plan\nDay 1"}}]}"##)
            .create_async()
            .await;

        let text = client_for(&server).complete("sys", "plan please").await.unwrap();

        assert_eq!(text, "# Plan\nDay 1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/openai/v1/chat/completions")
            .with_status(500)
            .create_async()
            .await;

        let err = client_for(&server).complete("sys", "p").await.unwrap_err();
        assert!(matches!(err, CompletionError::Status(s) if s.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_missing_choices_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/openai/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = client_for(&server).complete("sys", "p").await.unwrap_err();
        assert!(matches!(err, CompletionError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_client_never_calls_out() {
        let client = CompletionClient::new(CompletionSettings::default());
        assert!(!client.is_configured());

        let err = client.complete("sys", "p").await.unwrap_err();
        assert!(matches!(err, CompletionError::NotConfigured));
    }
}
