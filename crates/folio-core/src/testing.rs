//! Test doubles for the `Model` seam
//!
//! Enabled for this crate's own tests and, for downstream crates, through
//! the `testing` feature.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::model::{Model, ModelOutput, ModelRequest};

type Responder = Box<dyn Fn(&ModelRequest) -> ModelResult<ModelOutput> + Send + Sync>;

/// A scripted model that records every request it receives
pub struct StubModel {
    responder: Responder,
    calls: AtomicUsize,
    requests: Mutex<Vec<ModelRequest>>,
}

impl StubModel {
    /// Answer every request with the output of `responder`
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ModelRequest) -> ModelResult<ModelOutput> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always return the same output
    pub fn returning(output: ModelOutput) -> Self {
        Self::new(move |_| Ok(output.clone()))
    }

    /// Always return the same JSON record
    pub fn json(value: Value) -> Self {
        Self::returning(ModelOutput::Json(value))
    }

    /// Always fail with a transport error carrying `message`
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(ModelError::transport(message.clone())))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Model for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(&self, request: ModelRequest) -> ModelResult<ModelOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let output = (self.responder)(&request);
        self.requests.lock().push(request);
        output
    }
}
