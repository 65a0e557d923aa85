//! Name to provider constructor mapping
//!
//! The registry never performs HTTP calls itself. Each vendor module owns
//! its own construction and credential plumbing; the registry's job is
//! purely to associate a configured name with a constructed provider, so
//! unknown names surface a [`ConfigError`] before any debate I/O starts.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Credentials;
use crate::error::ConfigError;
use crate::provider::{anthropic::AnthropicProvider, google::GoogleProvider, ollama::OllamaProvider, openai::OpenAiProvider, Provider, RetryConfig};

/// Built, ready-to-use providers keyed by their configured name.
///
/// Registration order is preserved (`BTreeMap` is keyed by name, but
/// `order` records the sequence providers were registered in, which the
/// synthesis-fallback and verbose-mode ordering rules depend on).
#[derive(Clone, Default)]
pub struct Registry {
    providers: BTreeMap<String, Arc<dyn Provider>>,
    order: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct and register every provider named in `names`, using
    /// `credentials` to supply API keys/URLs and `retry` as the shared
    /// retry policy. Returns `UnknownProvider` for any name MARS does not
    /// recognise.
    pub fn build(names: &[String], credentials: &Credentials, retry: RetryConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for name in names {
            let provider = construct(name, credentials, retry)?;
            registry.insert(name.clone(), provider);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, name: String, provider: Arc<dyn Provider>) {
        if !self.providers.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.providers.insert(name, provider);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.get(name)
    }

    /// Names in the order they were registered.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}

fn construct(name: &str, credentials: &Credentials, retry: RetryConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    match name {
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(
            credentials
                .anthropic_api_key
                .clone()
                .ok_or_else(|| ConfigError::MissingCredentials("anthropic".into()))?,
            retry,
        ))),
        "openai" => Ok(Arc::new(OpenAiProvider::new(
            credentials
                .openai_api_key
                .clone()
                .ok_or_else(|| ConfigError::MissingCredentials("openai".into()))?,
            retry,
        ))),
        "google" => Ok(Arc::new(GoogleProvider::new(
            credentials
                .google_api_key
                .clone()
                .ok_or_else(|| ConfigError::MissingCredentials("google".into()))?,
            retry,
        ))),
        "ollama" => Ok(Arc::new(OllamaProvider::new(
            credentials
                .ollama_base_url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            retry,
        ))),
        other => Err(ConfigError::UnknownProvider(other.to_string())),
    }
}
