//! OpenAI-compatible chat completions backend
//!
//! Sends the system and user messages to `{base_url}/chat/completions` and
//! returns the first choice's content. Works with any server that speaks the
//! OpenAI chat completions wire format.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::retry::RetryPolicy;
use super::{BackendClient, BackendRequest, BackendResponse, Usage};
use crate::error::{BackendError, ProxyError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const PROVIDER_ID: &str = "openai";

/// Configuration for [`OpenAiBackend`].
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    /// Model used when a request carries no override
    pub model: String,
    pub timeout: Duration,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Retry policy for transient failures; `None` sends each request once
    pub retry: Option<RetryPolicy>,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("retry", &self.retry)
            .field("has_api_key", &!self.api_key.expose_secret().is_empty())
            .finish()
    }
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            temperature: None,
            max_tokens: None,
            retry: None,
        }
    }

    /// Load from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL`.
    pub fn from_env() -> Result<Self, ProxyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProxyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProxyError::ConfigurationError("OPENAI_API_KEY is not set".to_string())
            })?;
        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("OPENAI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(base_url);
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
            config = config.with_model(model);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ProxyError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ProxyError::ConfigurationError(
                "API key cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ProxyError::ConfigurationError(
                "Base URL must start with http:// or https://".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ProxyError::ConfigurationError(
                "Model cannot be empty".to_string(),
            ));
        }

        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ProxyError::ConfigurationError(format!(
                    "Temperature must be between 0.0 and 2.0, got {t}"
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Backend for OpenAI and OpenAI-compatible servers.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProxyError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProxyError::ConfigurationError(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self::with_http_client(config, http))
    }

    /// Use a caller-provided HTTP client. The configured timeout is not applied.
    pub fn with_http_client(config: OpenAiConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    pub const fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        let url = self.endpoint();
        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let body = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(target: "aiface::http", %url, model, "sending chat completion request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(target: "aiface::http", status = status.as_u16(), "received response");
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(classify_http_error(
                PROVIDER_ID,
                status.as_u16(),
                &text,
                &headers,
            ));
        }

        let parsed: ChatResponse = response.json().await?;
        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            BackendError::InvalidResponse("response contains no choices".to_string())
        })?;
        let text = choice.message.content.ok_or_else(|| {
            BackendError::InvalidResponse("first choice has no content".to_string())
        })?;

        let mut out = BackendResponse::new(text);
        if let Some(model) = parsed.model {
            out = out.with_model(model);
        }
        if let Some(usage) = parsed.usage {
            out = out.with_usage(usage);
        }
        Ok(out)
    }
}

#[async_trait]
impl BackendClient for OpenAiBackend {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn send(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        match &self.config.retry {
            Some(policy) => policy.run(PROVIDER_ID, || self.send_once(request)).await,
            None => self.send_once(request).await,
        }
    }
}

/// Map a non-success HTTP response to a [`BackendError`].
pub fn classify_http_error(
    provider_id: &str,
    status: u16,
    body_text: &str,
    headers: &HeaderMap,
) -> BackendError {
    let lower = body_text.to_lowercase();
    // Limit body sample size to avoid noisy logs
    let body_sample = body_text.chars().take(200).collect::<String>();
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|id| format!(" request_id={id}"))
        .unwrap_or_default();

    let rate_like = lower.contains("rate limit")
        || lower.contains("ratelimit")
        || lower.contains("rate_limit_exceeded");
    let quota_like = lower.contains("insufficient_quota") || lower.contains("quota");

    // Explicit rate-limit markers win: OpenAI's 429 body says "rate_limit_exceeded".
    if status == 429 || (matches!(status, 400 | 403) && rate_like) {
        if quota_like && !rate_like {
            return BackendError::QuotaExceededError(format!(
                "provider={provider_id} http={status} quota exceeded{request_id}"
            ));
        }
        let retry_after = headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        return BackendError::RateLimitError(format!(
            "provider={provider_id} http={status} retry_after={retry_after}{request_id} body_sample={body_sample}"
        ));
    }

    if matches!(status, 400 | 403) && quota_like {
        return BackendError::QuotaExceededError(format!(
            "provider={provider_id} http={status} quota exceeded{request_id}"
        ));
    }

    if status == 401 || status == 403 {
        return BackendError::AuthenticationError(format!(
            "provider={provider_id} http={status}{request_id} body_sample={body_sample}"
        ));
    }

    let api_message = serde_json::from_str::<serde_json::Value>(body_text)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        });

    if (500..=599).contains(&status) {
        return BackendError::api_error(status, api_message.unwrap_or_else(|| "server error".into()));
    }

    let message = match api_message {
        Some(m) => m,
        None if body_text.trim().is_empty() => "api error".to_string(),
        None => body_sample,
    };
    BackendError::api_error(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_status_codes() {
        let h = HeaderMap::new();
        assert!(matches!(
            classify_http_error("openai", 401, "", &h),
            BackendError::AuthenticationError(_)
        ));
        assert!(matches!(
            classify_http_error("openai", 429, "slow down", &h),
            BackendError::RateLimitError(_)
        ));
        assert!(matches!(
            classify_http_error(
                "openai",
                429,
                r#"{"error":{"code":"insufficient_quota"}}"#,
                &h
            ),
            BackendError::QuotaExceededError(_)
        ));
        assert!(matches!(
            classify_http_error(
                "openai",
                429,
                r#"{"error":{"message":"Rate limit reached for requests","type":"requests","code":"rate_limit_exceeded"}}"#,
                &h
            ),
            BackendError::RateLimitError(_)
        ));
        assert!(matches!(
            classify_http_error("openai", 403, "You exceeded your current quota", &h),
            BackendError::QuotaExceededError(_)
        ));
        assert!(matches!(
            classify_http_error("openai", 400, "context length exceeded", &h),
            BackendError::ApiError { .. }
        ));
        assert_eq!(
            classify_http_error("openai", 502, "<html>bad gateway</html>", &h),
            BackendError::api_error(502, "server error")
        );
        assert_eq!(
            classify_http_error(
                "openai",
                404,
                r#"{"error":{"message":"model not found"}}"#,
                &h
            ),
            BackendError::api_error(404, "model not found")
        );
    }

    #[test]
    fn config_validation() {
        assert!(OpenAiConfig::new("sk-test").validate().is_ok());
        assert!(OpenAiConfig::new("").validate().is_err());
        assert!(
            OpenAiConfig::new("sk-test")
                .with_base_url("ftp://example.com")
                .validate()
                .is_err()
        );
        assert!(
            OpenAiConfig::new("sk-test")
                .with_temperature(3.5)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn config_from_lookup() {
        let config = OpenAiConfig::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-env".into()),
            "OPENAI_MODEL" => Some("gpt-4o".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key.expose_secret(), "sk-env");

        let missing = OpenAiConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(missing, ProxyError::ConfigurationError(_)));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let rendered = format!("{:?}", OpenAiConfig::new("sk-secret-value"));
        assert!(!rendered.contains("sk-secret-value"));
        assert!(rendered.contains("has_api_key: true"));
    }
}
