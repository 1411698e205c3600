//! Error Handling Module
//!
//! Three failure classes reach the caller of a proxied method:
//! - `ConfigurationError`: the interface cannot be proxied (raised once, at creation)
//! - `BackendError`: the backend adapter failed (per call, never retried by the core)
//! - `DecodeError`: the model's answer did not yield the declared type (per call)
//!
//! # Example
//!
//! ```rust,ignore
//! use aiface::error::{DecodeError, ErrorKind, ProxyError};
//!
//! let error = ProxyError::from(DecodeError::no_match("i64", "three"));
//! assert_eq!(error.kind(), ErrorKind::Decode);
//! assert!(!error.is_retryable());
//! ```

mod conversions;
pub mod types;

pub use types::*;
