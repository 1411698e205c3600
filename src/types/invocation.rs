//! Per-call invocation record

use std::fmt;

use uuid::Uuid;

use crate::transcoder::EncodedValue;

/// Lifecycle of one proxied call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationState {
    /// Arguments encoded and request composed.
    Built,
    /// Request handed to the backend.
    Sent,
    /// Response decoded into the declared return type.
    Decoded,
    /// The call ended with an error.
    Failed,
}

impl InvocationState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Decoded | Self::Failed)
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Built => "built",
            Self::Sent => "sent",
            Self::Decoded => "decoded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One method call in flight. Never shared across calls.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub correlation_id: Uuid,
    pub interface: String,
    pub method: String,
    pub parameters: Vec<EncodedValue>,
    state: InvocationState,
}

impl Invocation {
    pub fn new(
        interface: impl Into<String>,
        method: impl Into<String>,
        parameters: Vec<EncodedValue>,
    ) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            interface: interface.into(),
            method: method.into(),
            parameters,
            state: InvocationState::Built,
        }
    }

    pub const fn state(&self) -> InvocationState {
        self.state
    }

    /// Move to `next`. Terminal states are final.
    pub fn transition(&mut self, next: InvocationState) {
        if self.state.is_terminal() {
            tracing::warn!(from = %self.state, to = %next, "ignoring transition out of terminal state");
            return;
        }
        tracing::debug!(from = %self.state, to = %next, "invocation state");
        self.state = next;
    }
}
