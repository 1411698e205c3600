//! Backend Client Adapters
//!
//! A backend turns a composed [`BackendRequest`] into raw response text. The
//! dispatcher only sees the [`BackendClient`] trait, so providers are swappable.
//!
//! Shipped adapters:
//! - [`OpenAiBackend`]: OpenAI-compatible chat completions over HTTP
//! - [`MockBackend`]: answers through a closure and records requests
//! - [`StaticBackend`]: always answers with the same text

pub mod mock;
pub mod openai;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
pub use crate::prompt::BackendRequest;

pub use mock::{MockBackend, StaticBackend};
pub use openai::{OpenAiBackend, OpenAiConfig};
pub use retry::RetryPolicy;

/// Token accounting reported by a provider.
/// Providers omit counters they do not track; missing ones read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw answer from a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendResponse {
    pub text: String,
    /// Model id reported by the provider, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl BackendResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            usage: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub const fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Sends one request to an LLM provider.
///
/// Implementations must be safe to share between concurrent calls. Dropping the
/// returned future must abandon the request.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Short provider name used in logs and error messages.
    fn provider_id(&self) -> &str;

    async fn send(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_usage_defaults_missing_counters() {
        let usage: Usage = serde_json::from_str(r#"{"prompt_tokens": 12}"#).unwrap();
        assert_eq!(
            usage,
            Usage {
                prompt_tokens: 12,
                completion_tokens: 0,
                total_tokens: 0,
            }
        );
        let empty: Usage = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Usage::default());
    }
}
