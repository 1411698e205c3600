//! Proxy Factory
//!
//! [`ProxyFactory`] validates an interface descriptor once and turns it into
//! an [`AiProxy`], a cheap-to-clone handle whose method calls are answered by
//! the configured backend.
//!
//! ```rust,ignore
//! use aiface::prelude::*;
//!
//! let factory = ProxyFactory::openai(OpenAiConfig::from_env()?)?;
//! let calc = factory.create(
//!     InterfaceDescriptor::builder("Calculator")
//!         .method(
//!             MethodDescriptor::new("sum", SemanticType::Int(IntKind::I64))
//!                 .param("a", SemanticType::Int(IntKind::I64))
//!                 .param("b", SemanticType::Int(IntKind::I64)),
//!         )
//!         .build(),
//! )?;
//! let three: i64 = calc.invoke_typed("sum", &[1i64.into(), 2i64.into()]).await?;
//! ```

pub mod macros;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::backend::{BackendClient, OpenAiBackend, OpenAiConfig};
use crate::dispatcher::Dispatcher;
use crate::error::ProxyError;
use crate::transcoder::{Transcodable, Transcoder, TranscodingRule};
use crate::types::{InterfaceDescriptor, MethodDescriptor, Value};
use crate::utils::cancel::CancelHandle;

/// Creates proxies bound to one backend and one transcoder.
#[derive(Clone)]
pub struct ProxyFactory {
    backend: Arc<dyn BackendClient>,
    transcoder: Transcoder,
}

impl fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("backend", &self.backend.provider_id())
            .field("transcoder", &self.transcoder)
            .finish()
    }
}

impl ProxyFactory {
    pub fn new(backend: impl BackendClient + 'static) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    /// Use a shared backend handle.
    pub fn with_backend(backend: Arc<dyn BackendClient>) -> Self {
        Self {
            backend,
            transcoder: Transcoder::new(),
        }
    }

    /// Factory backed by an OpenAI-compatible chat completions endpoint.
    pub fn openai(config: OpenAiConfig) -> Result<Self, ProxyError> {
        Ok(Self::new(OpenAiBackend::new(config)?))
    }

    /// Register a rule for a custom semantic type.
    pub fn with_rule<R: TranscodingRule + 'static>(mut self, rule: R) -> Self {
        self.transcoder = self.transcoder.with_rule(rule);
        self
    }

    /// Replace the transcoder entirely.
    pub fn with_transcoder(mut self, transcoder: Transcoder) -> Self {
        self.transcoder = transcoder;
        self
    }

    pub fn transcoder(&self) -> &Transcoder {
        &self.transcoder
    }

    pub fn backend(&self) -> &Arc<dyn BackendClient> {
        &self.backend
    }

    /// Validate `descriptor` and build a proxy for it.
    ///
    /// All unsupported types and malformed declarations are reported here,
    /// before any call can reach the backend.
    pub fn create(&self, descriptor: InterfaceDescriptor) -> Result<AiProxy, ProxyError> {
        self.validate(&descriptor)?;

        let table = descriptor
            .methods
            .iter()
            .enumerate()
            .map(|(idx, m)| (m.name.clone(), idx))
            .collect();
        tracing::info!(
            interface = %descriptor.name,
            methods = descriptor.methods.len(),
            provider = self.backend.provider_id(),
            "created proxy"
        );

        // The transcoder is snapshotted so later changes to this factory do
        // not affect proxies already handed out.
        let dispatcher = Dispatcher::new(Arc::new(self.transcoder.clone()), self.backend.clone());
        Ok(AiProxy {
            inner: Arc::new(ProxyInner {
                descriptor,
                table,
                dispatcher,
            }),
        })
    }

    /// Check a descriptor without building a proxy.
    pub fn validate(&self, descriptor: &InterfaceDescriptor) -> Result<(), ProxyError> {
        let interface = descriptor.name.as_str();
        if interface.trim().is_empty() {
            return Err(ProxyError::ConfigurationError(
                "interface name must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for method in &descriptor.methods {
            if method.name.trim().is_empty() {
                return Err(configuration(interface, "<unnamed>", "method name must not be empty"));
            }
            if !seen.insert(method.name.as_str()) {
                return Err(configuration(interface, &method.name, "method is declared twice"));
            }
            self.validate_method(interface, method)?;
        }
        Ok(())
    }

    fn validate_method(&self, interface: &str, method: &MethodDescriptor) -> Result<(), ProxyError> {
        let mut seen = HashSet::new();
        for param in &method.parameters {
            if param.name.trim().is_empty() {
                return Err(configuration(
                    interface,
                    &method.name,
                    "parameter name must not be empty",
                ));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(configuration(
                    interface,
                    &method.name,
                    format!("parameter `{}` is declared twice", param.name),
                ));
            }
            self.transcoder.check_supported(&param.ty).map_err(|reason| {
                configuration(
                    interface,
                    &method.name,
                    format!("parameter `{}` has unsupported type {}: {reason}", param.name, param.ty),
                )
            })?;
        }
        self.transcoder.check_supported(&method.returns).map_err(|reason| {
            configuration(
                interface,
                &method.name,
                format!("unsupported return type {}: {reason}", method.returns),
            )
        })
    }
}

fn configuration(interface: &str, method: &str, reason: impl fmt::Display) -> ProxyError {
    ProxyError::ConfigurationError(format!("{interface}.{method}: {reason}"))
}

struct ProxyInner {
    descriptor: InterfaceDescriptor,
    table: HashMap<String, usize>,
    dispatcher: Dispatcher,
}

/// A live proxy for one interface.
///
/// Clones share the same descriptor and backend. Concurrent calls are
/// independent of each other.
#[derive(Clone)]
pub struct AiProxy {
    inner: Arc<ProxyInner>,
}

impl fmt::Debug for AiProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiProxy")
            .field("interface", &self.inner.descriptor.name)
            .field("methods", &self.inner.descriptor.methods.len())
            .field("dispatcher", &self.inner.dispatcher)
            .finish()
    }
}

impl AiProxy {
    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.inner.descriptor
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.inner
            .table
            .get(name)
            .map(|&idx| &self.inner.descriptor.methods[idx])
    }

    /// Call `method` with positional arguments.
    pub async fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, ProxyError> {
        let method = self.resolve(method)?;
        self.inner
            .dispatcher
            .dispatch(&self.inner.descriptor, method, args)
            .await
    }

    /// Like [`invoke`](Self::invoke), aborting when `cancel` fires.
    pub async fn invoke_with_cancel(
        &self,
        method: &str,
        args: &[Value],
        cancel: &CancelHandle,
    ) -> Result<Value, ProxyError> {
        let method = self.resolve(method)?;
        self.inner
            .dispatcher
            .dispatch_with_cancel(&self.inner.descriptor, method, args, cancel)
            .await
    }

    /// Call `method` and convert the decoded value into `R`.
    pub async fn invoke_typed<R: Transcodable>(
        &self,
        method: &str,
        args: &[Value],
    ) -> Result<R, ProxyError> {
        let value = self.invoke(method, args).await?;
        Ok(R::from_value(value)?)
    }

    fn resolve(&self, name: &str) -> Result<&MethodDescriptor, ProxyError> {
        self.method(name).ok_or_else(|| {
            ProxyError::UnknownMethod(format!("{}.{name}", self.inner.descriptor.name))
        })
    }
}
