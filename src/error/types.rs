//! Core error types for aiface.

use thiserror::Error;

/// Error category used to tell the failure classes apart without matching on
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The interface could not be turned into a proxy.
    Configuration,
    /// The backend adapter failed to produce a response.
    Backend,
    /// The response text did not yield a value of the declared type.
    Decode,
    /// A call argument did not match the method signature.
    Argument,
    /// The call was cancelled before it completed.
    Cancelled,
}

/// Errors surfaced by proxy creation and proxied method calls.
#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    /// Unsupported type or malformed interface, raised once at proxy creation.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Failure reported by the backend adapter.
    #[error("Backend error: {0}")]
    BackendError(#[from] BackendError),

    /// The backend answer could not be decoded into the declared return type.
    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),

    /// A call argument does not conform to its declared parameter type.
    #[error("Invalid argument `{parameter}`: {reason}")]
    InvalidArgument { parameter: String, reason: String },

    /// The method is not declared by the proxied interface.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// The call was cancelled through its cancel handle.
    #[error("Invocation cancelled")]
    Cancelled,
}

impl ProxyError {
    /// Create an invalid argument error.
    pub fn invalid_argument(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Get the error category.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationError(_) => ErrorKind::Configuration,
            Self::BackendError(_) => ErrorKind::Backend,
            Self::DecodeError(_) => ErrorKind::Decode,
            Self::InvalidArgument { .. } | Self::UnknownMethod(_) => ErrorKind::Argument,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether repeating the same call could succeed.
    ///
    /// Only transient backend failures qualify; decode failures are terminal
    /// for the call that produced them.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::BackendError(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Failures raised by a backend client adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The request did not complete in time.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Credentials were rejected.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider throttled the request.
    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    /// The account quota is exhausted.
    #[error("Quota exceeded: {0}")]
    QuotaExceededError(String),

    /// Non-success status that does not fit a more specific variant.
    #[error("API error {code}: {message}")]
    ApiError { code: u16, message: String },

    /// The provider answered with a payload the adapter cannot read.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Create an API error.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
        }
    }

    /// Whether the failure is transient.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::Timeout(_) | Self::RateLimitError(_) => true,
            Self::ApiError { code, .. } => *code >= 500 && *code < 600,
            _ => false,
        }
    }
}

/// Reasons a backend answer could not be mapped to the declared return type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Nothing in the response looks like a value of the expected type.
    #[error("no {expected} found in response: {response:?}")]
    NoMatch { expected: String, response: String },

    /// A candidate was found but it violates the expected type.
    #[error("expected {expected}: {reason}")]
    TypeMismatch { expected: String, reason: String },
}

/// Responses longer than this are truncated inside `NoMatch` errors.
const RESPONSE_SAMPLE_CHARS: usize = 200;

impl DecodeError {
    /// Create a `NoMatch` error, keeping a bounded sample of the response.
    pub fn no_match(expected: impl Into<String>, response: &str) -> Self {
        Self::NoMatch {
            expected: expected.into(),
            response: response.chars().take(RESPONSE_SAMPLE_CHARS).collect(),
        }
    }

    /// Create a `TypeMismatch` error.
    pub fn type_mismatch(expected: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            reason: reason.into(),
        }
    }

    pub const fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch { .. })
    }

    pub const fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}
