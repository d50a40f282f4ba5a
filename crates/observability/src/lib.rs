//! Process-wide logging setup and the bus-wide event logger.

/// Install the JSON tracing subscriber.
///
/// Later calls are no-ops, so tests and binaries may both call it.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filter, formatter).
pub mod tracing;

/// Catch-all observer that logs every announcement.
pub mod events;

pub use events::trace_events;
