//! Prompt Builder
//!
//! Composes the request sent to the backend from a method signature and its
//! encoded arguments. The output depends only on its inputs, so identical
//! calls produce byte-identical requests.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::ProxyError;
use crate::transcoder::{EncodedValue, Transcoder};
use crate::types::{InterfaceDescriptor, MethodDescriptor};

const SYSTEM_PREAMBLE: &str = "You will be given the specification of a method declared by the user.
By carefully following the method specification, respond as the method would.
Respond with the return value only, using the response format below and no additional text.
Your response will be decoded and returned to the caller as the method result.";

const USER_REMINDER: &str = "Again, respond with the return value only, following the response format without any additional text.";

/// Request handed to a backend adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendRequest {
    /// Model override; adapters fall back to their configured model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub system: String,
    pub user: String,
}

impl BackendRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: None,
            system: system.into(),
            user: user.into(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Builds backend requests using a transcoder's response-format descriptions.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder<'a> {
    transcoder: &'a Transcoder,
}

impl<'a> PromptBuilder<'a> {
    pub const fn new(transcoder: &'a Transcoder) -> Self {
        Self { transcoder }
    }

    /// Build the request for one call.
    ///
    /// `parameters` must be in declaration order, as produced by
    /// `Transcoder::encode_parameter`.
    pub fn build(
        &self,
        interface: &InterfaceDescriptor,
        method: &MethodDescriptor,
        parameters: &[EncodedValue],
    ) -> Result<BackendRequest, ProxyError> {
        self.transcoder.check_supported(&method.returns).map_err(|reason| {
            ProxyError::ConfigurationError(format!(
                "{}.{}: unsupported return type: {reason}",
                interface.name, method.name
            ))
        })?;

        let system = format!(
            "{SYSTEM_PREAMBLE}\nresponse format: {}",
            self.transcoder.describe(&method.returns)
        );

        let mut user = String::new();
        let _ = writeln!(user, "interface: {}", interface.name);
        if let Some(hint) = &interface.hint {
            let _ = writeln!(user, "interface description: {hint}");
        }
        let _ = writeln!(user, "method: {}", method.name);
        if let Some(hint) = &method.hint {
            let _ = writeln!(user, "description: {hint}");
        }
        if parameters.is_empty() {
            user.push_str("parameters: none\n");
        } else {
            user.push_str("parameters:\n");
            for p in parameters {
                let _ = writeln!(user, "- {} ({}) = {}", p.name, p.ty, p.text);
            }
        }
        let _ = writeln!(user, "return type: {}", method.returns);
        user.push('\n');
        user.push_str(USER_REMINDER);

        let request = BackendRequest::new(system, user);
        Ok(match &method.model {
            Some(model) => request.with_model(model.clone()),
            None => request,
        })
    }
}
