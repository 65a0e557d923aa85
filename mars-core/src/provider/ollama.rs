//! Ollama local-model provider
//!
//! Ollama rarely reports token usage accurately for every model; a zero
//! `TokenUsage` is treated as "unknown", matching the data model's
//! invariant for local models (see the cost analyzer's unknown-model
//! handling).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::types::{Message, Role, TokenUsage};

use super::retry::{retry_generate, RetryConfig};
use super::{Provider, ProviderError};

const DEFAULT_MODEL: &str = "llama3";

#[derive(Debug)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            retry,
        }
    }

    async fn send_once(&self, messages: &[Message], model: &str, max_tokens: usize, temperature: Option<f32>) -> Result<(String, TokenUsage), ProviderError> {
        let mut options = json!({"num_predict": max_tokens});
        if let Some(temp) = temperature {
            options["temperature"] = json!(temp);
        }
        let body = json!({
            "model": model,
            "messages": to_ollama_messages(messages),
            "stream": false,
            "options": options,
        });

        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let response = self.client.post(url).json(&body).send().await.map_err(classify_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_reqwest_error)?;
        if !status.is_success() {
            return Err(classify_http_status(status.as_u16(), &text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| ProviderError::Other(format!("invalid response body: {e}")))?;
        let usage = TokenUsage::new(parsed.prompt_eval_count.unwrap_or(0), parsed.eval_count.unwrap_or(0));
        Ok((parsed.message.content, usage))
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    async fn generate(&self, messages: &[Message], model: Option<&str>, max_tokens: usize, temperature: Option<f32>) -> Result<(String, TokenUsage), ProviderError> {
        let model = model.unwrap_or(DEFAULT_MODEL).to_string();
        retry_generate(&self.retry, || self.send_once(messages, &model, max_tokens, temperature)).await
    }
}

fn to_ollama_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            json!({"role": role, "content": m.content})
        })
        .collect()
}

fn classify_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else if err.is_connect() {
        ProviderError::Connection(err.to_string())
    } else {
        ProviderError::Other(err.to_string())
    }
}

fn classify_http_status(status: u16, body: &str) -> ProviderError {
    match status {
        404 => ProviderError::Model(body.to_string()),
        400 => ProviderError::Configuration(body.to_string()),
        500..=599 => ProviderError::ServiceUnavailable {
            status,
            message: body.to_string(),
        },
        _ => ProviderError::Other(format!("unexpected status {status}: {body}")),
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
    prompt_eval_count: Option<usize>,
    eval_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_usage_counts_default_to_zero() {
        let response: ChatResponse = serde_json::from_str(r#"{"message": {"content": "hi"}}"#).unwrap();
        assert_eq!(response.prompt_eval_count, None);
        assert_eq!(response.eval_count, None);
    }
}
