//! Where handler failures go.
//!
//! A failing handler must not stop the remaining handlers of the same publish
//! and must not surface to the publisher. The bus converts the failure into a
//! [`HandlerFailure`] and hands it to a [`DiagnosticSink`].

use std::cell::RefCell;

use chrono::{DateTime, Utc};

use crate::bus::SubscriptionId;

/// A handler returned an error or panicked during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Name the event was published under.
    pub topic: String,
    pub subscription: SubscriptionId,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl HandlerFailure {
    pub fn new(topic: impl Into<String>, subscription: SubscriptionId, message: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            subscription,
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Receives handler failures reported by the bus.
pub trait DiagnosticSink {
    fn report(&self, failure: &HandlerFailure);
}

/// Default sink: logs each failure at `error` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, failure: &HandlerFailure) {
        tracing::error!(
            topic = %failure.topic,
            subscription = %failure.subscription,
            error = %failure.message,
            "event handler failed"
        );
    }
}

/// Sink that keeps every failure in memory (tests, debug overlays).
#[derive(Debug, Default)]
pub struct CollectingSink {
    failures: RefCell<Vec<HandlerFailure>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<HandlerFailure> {
        self.failures.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.failures.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.borrow().is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, failure: &HandlerFailure) {
        self.failures.borrow_mut().push(failure.clone());
    }
}
