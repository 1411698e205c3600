//! In-process backends for tests and offline use.

use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{BackendClient, BackendRequest, BackendResponse};
use crate::error::BackendError;

type Responder = dyn Fn(&BackendRequest) -> Result<String, BackendError> + Send + Sync;

/// Backend that answers through a closure and records every request.
#[derive(Clone)]
pub struct MockBackend {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<BackendRequest>>>,
}

impl fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBackend")
            .field("recorded_requests", &self.request_count())
            .finish()
    }
}

impl MockBackend {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&BackendRequest) -> Result<String, BackendError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Backend that always answers `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Backend that always fails with `error`.
    pub fn failing(error: BackendError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    /// Snapshot of the requests seen so far, in arrival order.
    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    fn provider_id(&self) -> &str {
        "mock"
    }

    async fn send(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        (self.responder)(request).map(BackendResponse::new)
    }
}

/// Backend that always returns the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticBackend {
    text: String,
}

impl StaticBackend {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl BackendClient for StaticBackend {
    fn provider_id(&self) -> &str {
        "static"
    }

    async fn send(&self, _request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        Ok(BackendResponse::new(self.text.clone()))
    }
}
