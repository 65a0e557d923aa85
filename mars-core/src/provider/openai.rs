//! OpenAI Chat Completions API provider

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::types::{Message, Role, TokenUsage};

use super::retry::{retry_generate, RetryConfig};
use super::{Provider, ProviderError};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    retry: RetryConfig,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            retry,
        }
    }

    async fn send_once(&self, messages: &[Message], model: &str, max_tokens: usize, temperature: Option<f32>) -> Result<(String, TokenUsage), ProviderError> {
        let mut body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "messages": to_openai_messages(messages),
        });
        if let Some(temp) = temperature {
            body["temperature"] = json!(temp);
        }

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_reqwest_error)?;
        if !status.is_success() {
            return Err(classify_http_status(status.as_u16(), &text));
        }

        let parsed: ChatCompletion = serde_json::from_str(&text).map_err(|e| ProviderError::Other(format!("invalid response body: {e}")))?;
        let content = parsed.choices.into_iter().next().map(|c| c.message.content).unwrap_or_default();
        let usage = TokenUsage::new(parsed.usage.prompt_tokens, parsed.usage.completion_tokens);
        Ok((content, usage))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    async fn generate(&self, messages: &[Message], model: Option<&str>, max_tokens: usize, temperature: Option<f32>) -> Result<(String, TokenUsage), ProviderError> {
        let model = model.unwrap_or(DEFAULT_MODEL).to_string();
        retry_generate(&self.retry, || self.send_once(messages, &model, max_tokens, temperature)).await
    }
}

fn to_openai_messages(messages: &[Message]) -> Vec<serde_json::Value> {
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
        401 | 403 => ProviderError::Authentication(body.to_string()),
        429 => ProviderError::RateLimited(body.to_string()),
        400 | 404 => ProviderError::Configuration(body.to_string()),
        500..=599 => ProviderError::ServiceUnavailable {
            status,
            message: body.to_string(),
        },
        _ => ProviderError::Other(format!("unexpected status {status}: {body}")),
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    usage: OpenAiUsage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}
