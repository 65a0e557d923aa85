//! Anthropic Messages API provider
//!
//! Talks to the API directly over `reqwest`; streaming uses
//! `reqwest-eventsource` to consume the SSE event stream and convert
//! `content_block_delta` events into [`StreamEvent::TextDelta`].

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde::Deserialize;
use serde_json::json;

use crate::types::{Message, Role, TokenUsage};

use super::retry::{is_transient, retry_generate, RetryConfig};
use super::{Provider, ProviderError, StreamEvent};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug)]
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    retry: RetryConfig,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            retry,
        }
    }

    fn request_body(&self, messages: &[Message], model: &str, max_tokens: usize, temperature: Option<f32>) -> serde_json::Value {
        let (system, turns) = split_system(messages);
        let mut body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "messages": turns,
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }
        if let Some(temp) = temperature {
            body["temperature"] = json!(temp);
        }
        body
    }

    async fn send_once(&self, messages: &[Message], model: &str, max_tokens: usize, temperature: Option<f32>) -> Result<(String, TokenUsage), ProviderError> {
        let body = self.request_body(messages, model, max_tokens, temperature);
        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_reqwest_error)?;
        if !status.is_success() {
            return Err(classify_http_status(status.as_u16(), &text));
        }

        let parsed: AnthropicMessage = serde_json::from_str(&text).map_err(|e| ProviderError::Other(format!("invalid response body: {e}")))?;
        let content = parsed.content.into_iter().map(|block| block.text).collect::<Vec<_>>().join("");
        let usage = TokenUsage::new(parsed.usage.input_tokens, parsed.usage.output_tokens);
        Ok((content, usage))
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    async fn generate(&self, messages: &[Message], model: Option<&str>, max_tokens: usize, temperature: Option<f32>) -> Result<(String, TokenUsage), ProviderError> {
        let model = model.unwrap_or(DEFAULT_MODEL).to_string();
        retry_generate(&self.retry, || self.send_once(messages, &model, max_tokens, temperature)).await
    }

    async fn stream(&self, messages: &[Message], model: Option<&str>, max_tokens: usize, temperature: Option<f32>) -> Result<BoxStream<'static, Result<StreamEvent, ProviderError>>, ProviderError> {
        let model = model.unwrap_or(DEFAULT_MODEL).to_string();
        let mut body = self.request_body(messages, &model, max_tokens, temperature);
        body["stream"] = json!(true);

        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let retry = self.retry;

        let stream = async_stream::stream! {
            let mut emitted_any = false;
            let mut usage = TokenUsage::default();
            let mut attempt = 0usize;

            // Retry is only permitted before the first chunk is emitted; once
            // `emitted_any` is true a failure is wrapped as `MidStream` and
            // the stream ends instead of reconnecting.
            'connect: loop {
                let event_source = client
                    .post(API_URL)
                    .header("x-api-key", &api_key)
                    .header("anthropic-version", API_VERSION)
                    .json(&body)
                    .eventsource();

                let mut event_source = match event_source {
                    Ok(es) => es,
                    Err(e) => {
                        let err = ProviderError::Connection(e.to_string());
                        if attempt < retry.max_retries && is_transient(&err) {
                            tokio::time::sleep(retry.delay_for_attempt(attempt)).await;
                            attempt += 1;
                            continue 'connect;
                        }
                        yield Err(err);
                        return;
                    }
                };

                loop {
                    match event_source.next().await {
                        None => {
                            yield Ok(StreamEvent::Done { usage });
                            return;
                        }
                        Some(Ok(Event::Open)) => continue,
                        Some(Ok(Event::Message(msg))) => {
                            if msg.event == "content_block_delta" {
                                if let Ok(delta) = serde_json::from_str::<ContentBlockDeltaEvent>(&msg.data) {
                                    if !delta.delta.text.is_empty() {
                                        emitted_any = true;
                                        yield Ok(StreamEvent::TextDelta(delta.delta.text));
                                    }
                                }
                            } else if msg.event == "message_delta" {
                                if let Ok(delta) = serde_json::from_str::<MessageDeltaEvent>(&msg.data) {
                                    usage.output_tokens = delta.usage.output_tokens;
                                }
                            } else if msg.event == "message_start" {
                                if let Ok(start) = serde_json::from_str::<MessageStartEvent>(&msg.data) {
                                    usage.input_tokens = start.message.usage.input_tokens;
                                }
                            }
                        }
                        Some(Err(reqwest_eventsource::Error::StreamEnded)) => {
                            event_source.close();
                            yield Ok(StreamEvent::Done { usage });
                            return;
                        }
                        Some(Err(e)) => {
                            event_source.close();
                            let err = ProviderError::Connection(e.to_string());
                            if emitted_any {
                                yield Err(ProviderError::MidStream(err.to_string()));
                                return;
                            }
                            if attempt < retry.max_retries && is_transient(&err) {
                                tokio::time::sleep(retry.delay_for_attempt(attempt)).await;
                                attempt += 1;
                                continue 'connect;
                            }
                            yield Err(err);
                            return;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn split_system(messages: &[Message]) -> (Option<String>, Vec<serde_json::Value>) {
    let mut system = None;
    let mut turns = Vec::new();
    for message in messages {
        match message.role {
            Role::System => system = Some(message.content.clone()),
            Role::User => turns.push(json!({"role": "user", "content": message.content})),
            Role::Assistant => turns.push(json!({"role": "assistant", "content": message.content})),
        }
    }
    (system, turns)
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
struct AnthropicMessage {
    content: Vec<AnthropicContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: usize,
    output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDeltaEvent {
    delta: TextDelta,
}

#[derive(Debug, Deserialize)]
struct TextDelta {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaEvent {
    usage: DeltaUsage,
}

#[derive(Debug, Deserialize)]
struct DeltaUsage {
    output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct MessageStartEvent {
    message: MessageStartInner,
}

#[derive(Debug, Deserialize)]
struct MessageStartInner {
    usage: AnthropicUsage,
}
