//! Google Gemini generateContent API provider

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::types::{Message, Role, TokenUsage};

use super::retry::{retry_generate, RetryConfig};
use super::{Provider, ProviderError};

const DEFAULT_MODEL: &str = "gemini-1.5-pro";

#[derive(Debug)]
pub struct GoogleProvider {
    client: reqwest::Client,
    api_key: String,
    retry: RetryConfig,
}

impl GoogleProvider {
    pub fn new(api_key: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            retry,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent?key={}", self.api_key)
    }

    async fn send_once(&self, messages: &[Message], model: &str, max_tokens: usize, temperature: Option<f32>) -> Result<(String, TokenUsage), ProviderError> {
        let (system, contents) = to_gemini_contents(messages);
        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": max_tokens,
            },
        });
        if let Some(system) = system {
            body["systemInstruction"] = json!({"parts": [{"text": system}]});
        }
        if let Some(temp) = temperature {
            body["generationConfig"]["temperature"] = json!(temp);
        }

        let response = self.client.post(self.endpoint(model)).json(&body).send().await.map_err(classify_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_reqwest_error)?;
        if !status.is_success() {
            return Err(classify_http_status(status.as_u16(), &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| ProviderError::Other(format!("invalid response body: {e}")))?;
        let content = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join(""))
            .unwrap_or_default();
        let usage = parsed
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();
        Ok((content, usage))
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    async fn generate(&self, messages: &[Message], model: Option<&str>, max_tokens: usize, temperature: Option<f32>) -> Result<(String, TokenUsage), ProviderError> {
        let model = model.unwrap_or(DEFAULT_MODEL).to_string();
        retry_generate(&self.retry, || self.send_once(messages, &model, max_tokens, temperature)).await
    }
}

fn to_gemini_contents(messages: &[Message]) -> (Option<String>, Vec<serde_json::Value>) {
    let mut system = None;
    let mut contents = Vec::new();
    for message in messages {
        match message.role {
            Role::System => system = Some(message.content.clone()),
            Role::User => contents.push(json!({"role": "user", "parts": [{"text": message.content}]})),
            Role::Assistant => contents.push(json!({"role": "model", "parts": [{"text": message.content}]})),
        }
    }
    (system, contents)
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
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: usize,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_gemini_contents_maps_assistant_to_model_role() {
        let messages = vec![Message::user("hi"), Message::assistant("hello")];
        let (system, contents) = to_gemini_contents(&messages);
        assert!(system.is_none());
        assert_eq!(contents[1]["role"], "model");
    }
}
