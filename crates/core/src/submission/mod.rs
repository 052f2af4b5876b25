//! Wire records for the spreadsheet webhook and the dispatch seam.
//!
//! Dispatch is fire-and-forget: implementations report failure only when the
//! request could not be delivered at all. Response status and body are never
//! interpreted.

pub mod record;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

pub use record::{ContactRecord, QuoteRecord, SubmissionContext, SubmissionRecord};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("webhook transport failed: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, record: &SubmissionRecord) -> Result<(), TransportError>;
}

/// Keeps delivered records in memory; can be told to fail the next N sends.
#[derive(Clone, Default)]
pub struct InMemoryDispatcher {
    inner: Arc<Mutex<InMemoryDispatcherState>>,
}

#[derive(Default)]
struct InMemoryDispatcherState {
    delivered: Vec<SubmissionRecord>,
    failures_remaining: usize,
}

impl InMemoryDispatcher {
    pub fn fail_next(&self, count: usize) {
        self.with_state(|state| state.failures_remaining = count);
    }

    pub fn delivered(&self) -> Vec<SubmissionRecord> {
        self.with_state(|state| state.delivered.clone())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut InMemoryDispatcherState) -> T) -> T {
        match self.inner.lock() {
            Ok(mut state) => f(&mut state),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl Dispatcher for InMemoryDispatcher {
    async fn dispatch(&self, record: &SubmissionRecord) -> Result<(), TransportError> {
        self.with_state(|state| {
            if state.failures_remaining > 0 {
                state.failures_remaining -= 1;
                return Err(TransportError::new("simulated network failure"));
            }
            state.delivered.push(record.clone());
            Ok(())
        })
    }
}
