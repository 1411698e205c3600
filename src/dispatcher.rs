//! Invocation Dispatcher
//!
//! Drives one call through encode → prompt → backend → decode. Every call gets
//! its own [`Invocation`] record and tracing span; nothing is shared between
//! calls except the read-only transcoder and the backend handle.
//!
//! There is no retry and no reprompting here. A backend failure or an
//! undecodable answer is the outcome of the call.

use std::fmt;
use std::sync::Arc;

use tracing::Instrument;

use crate::backend::BackendClient;
use crate::error::ProxyError;
use crate::prompt::PromptBuilder;
use crate::transcoder::{EncodedValue, Transcoder};
use crate::types::{Invocation, InvocationState, InterfaceDescriptor, MethodDescriptor, Value};
use crate::utils::cancel::{CancelHandle, run_cancellable};

/// Routes calls to a backend and decodes the answers.
#[derive(Clone)]
pub struct Dispatcher {
    transcoder: Arc<Transcoder>,
    backend: Arc<dyn BackendClient>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("transcoder", &self.transcoder)
            .field("backend", &self.backend.provider_id())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(transcoder: Arc<Transcoder>, backend: Arc<dyn BackendClient>) -> Self {
        Self {
            transcoder,
            backend,
        }
    }

    pub fn transcoder(&self) -> &Transcoder {
        &self.transcoder
    }

    /// Perform one call.
    pub async fn dispatch(
        &self,
        interface: &InterfaceDescriptor,
        method: &MethodDescriptor,
        args: &[Value],
    ) -> Result<Value, ProxyError> {
        self.run(interface, method, args, None).await
    }

    /// Perform one call unless `cancel` fires first, in which case the
    /// in-flight backend request is dropped and the call fails with
    /// `Cancelled`.
    pub async fn dispatch_with_cancel(
        &self,
        interface: &InterfaceDescriptor,
        method: &MethodDescriptor,
        args: &[Value],
        cancel: &CancelHandle,
    ) -> Result<Value, ProxyError> {
        self.run(interface, method, args, Some(cancel)).await
    }

    async fn run(
        &self,
        interface: &InterfaceDescriptor,
        method: &MethodDescriptor,
        args: &[Value],
        cancel: Option<&CancelHandle>,
    ) -> Result<Value, ProxyError> {
        let mut invocation = Invocation::new(&interface.name, &method.name, Vec::new());
        let span = tracing::info_span!(
            "invocation",
            interface = %interface.name,
            method = %method.name,
            correlation_id = %invocation.correlation_id,
        );

        async {
            let result = self
                .execute(&mut invocation, interface, method, args, cancel)
                .await;
            match &result {
                Ok(_) => invocation.transition(InvocationState::Decoded),
                Err(error) => {
                    invocation.transition(InvocationState::Failed);
                    tracing::warn!(kind = ?error.kind(), %error, "invocation failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        invocation: &mut Invocation,
        interface: &InterfaceDescriptor,
        method: &MethodDescriptor,
        args: &[Value],
        cancel: Option<&CancelHandle>,
    ) -> Result<Value, ProxyError> {
        if cancel.is_some_and(CancelHandle::is_cancelled) {
            return Err(ProxyError::Cancelled);
        }

        invocation.parameters = self.encode_arguments(method, args)?;
        let request =
            PromptBuilder::new(&self.transcoder).build(interface, method, &invocation.parameters)?;

        invocation.transition(InvocationState::Sent);
        let send = self.backend.send(&request);
        let response = match cancel {
            Some(handle) => run_cancellable(handle, send)
                .await
                .ok_or(ProxyError::Cancelled)??,
            None => send.await?,
        };
        tracing::debug!(
            provider = self.backend.provider_id(),
            model = response.model.as_deref().unwrap_or_default(),
            response_chars = response.text.chars().count(),
            "backend answered"
        );

        Ok(self
            .transcoder
            .decode_result(&response.text, &method.returns)?)
    }

    /// Encode arguments in declaration order, stopping at the first failure.
    fn encode_arguments(
        &self,
        method: &MethodDescriptor,
        args: &[Value],
    ) -> Result<Vec<EncodedValue>, ProxyError> {
        if args.len() < method.arity() {
            let missing = &method.parameters[args.len()];
            return Err(ProxyError::invalid_argument(
                missing.name.as_str(),
                format!(
                    "missing argument: `{}` takes {} argument(s), got {}",
                    method.name,
                    method.arity(),
                    args.len()
                ),
            ));
        }
        if args.len() > method.arity() {
            return Err(ProxyError::invalid_argument(
                format!("#{}", method.arity()),
                format!(
                    "unexpected argument: `{}` takes {} argument(s), got {}",
                    method.name,
                    method.arity(),
                    args.len()
                ),
            ));
        }
        method
            .parameters
            .iter()
            .zip(args)
            .map(|(param, value)| self.transcoder.encode_parameter(&param.name, &param.ty, value))
            .collect()
    }
}
