//! # aiface - Interfaces Implemented by Language Models
//!
//! aiface turns a declared interface (method names, typed parameters and typed
//! return values) into a proxy object. Every call on the proxy is rendered into
//! a prompt, answered by a large language model and decoded back into the
//! declared return type.
//!
#![deny(unsafe_code)]

//! ## Features
//!
//! - **Typed Boundary**: Parameters and return values are described by semantic
//!   types; answers that do not fit fail with a typed error instead of a guess.
//! - **Fail Fast**: Unsupported types and malformed interfaces are rejected when
//!   the proxy is created, before any request is sent.
//! - **Pluggable Backends**: Any [`BackendClient`] can answer calls; an
//!   OpenAI-compatible adapter is included.
//! - **Custom Types**: [`TranscodingRule`]s add application types to the
//!   transcoder.
//! - **Library First**: The crate emits `tracing` events; the optional
//!   `telemetry` feature installs a subscriber.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aiface::prelude::*;
//!
//! aiface::ai_interface! {
//!     pub struct Calculator {
//!         hint: "Performs integer arithmetic";
//!         fn sum(a: i64, b: i64) -> i64 => "Adds two numbers";
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = ProxyFactory::openai(OpenAiConfig::from_env()?)?;
//!     let calc = Calculator::create(&factory)?;
//!     println!("1 + 2 = {}", calc.sum(1, 2).await?);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod prompt;
pub mod proxy;
pub mod transcoder;
pub mod types;
pub mod utils;

#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use backend::{BackendClient, BackendResponse, MockBackend, OpenAiBackend, OpenAiConfig};
pub use dispatcher::Dispatcher;
pub use error::{BackendError, DecodeError, ErrorKind, ProxyError};
pub use prompt::{BackendRequest, PromptBuilder};
pub use proxy::{AiProxy, ProxyFactory};
pub use transcoder::{Transcodable, Transcoder, TranscodingRule};
pub use utils::cancel::CancelHandle;

/// Convenient imports for typical use.
pub mod prelude {
    pub use crate::backend::{BackendClient, BackendResponse, OpenAiConfig};
    pub use crate::error::{BackendError, DecodeError, ErrorKind, ProxyError};
    pub use crate::proxy::{AiProxy, ProxyFactory};
    pub use crate::transcoder::{Transcodable, Transcoder, TranscodingRule};
    pub use crate::types::{
        EnumSchema, FloatKind, IntKind, InterfaceDescriptor, MethodDescriptor, ObjectSchema,
        SemanticType, Value,
    };
    pub use crate::utils::cancel::CancelHandle;
    pub use crate::{ai_enum, ai_interface, ai_object};
}
