//! Log every announcement on a bus.

use larek_events::{EventBus, Subscription};

/// Subscribe a catch-all observer that logs each publish at `debug`.
///
/// The observer lives in the pattern registry, so on any given topic it runs
/// after the exact-name handlers. Enable with `RUST_LOG=larek=debug` or
/// broader.
pub fn trace_events<M>(bus: &EventBus<M>) -> Subscription<M>
where
    M: core::fmt::Debug + 'static,
{
    bus.subscribe_all(|name, payload| {
        ::tracing::debug!(target: "larek::events", topic = name, payload = ?payload, "event");
        Ok(())
    })
}
