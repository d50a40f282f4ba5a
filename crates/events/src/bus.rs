//! Event publishing/subscription (mechanics only).
//!
//! This module provides the **event bus pattern** used between the storefront
//! state and its views: producers announce a named payload, any number of
//! consumers react to it, and neither side knows about the other.
//!
//! ## Dispatch contract
//!
//! - **Synchronous**: `publish` runs every matching handler on the calling
//!   thread before it returns. There is no queue and no backpressure.
//! - **Deterministic order**: exact-name handlers first, in registration order,
//!   then pattern handlers (including `subscribe_all`), in registration order.
//! - **Re-entrant**: a handler may publish, subscribe or unsubscribe while it
//!   runs. A nested publish is dispatched completely before the outer dispatch
//!   moves on to its next handler. There is no cycle guard; a handler that
//!   republishes its own topic unconditionally recurses until the stack ends.
//! - **Isolated failures**: a handler that returns `Err` or panics is reported
//!   to the bus's [`DiagnosticSink`] and the remaining handlers still run.
//!   Panics are only caught when the binary unwinds (`panic = "unwind"`).
//!
//! The handler set is fixed when a publish starts: handlers registered during
//! dispatch first see the next publish, and handlers removed during dispatch
//! are skipped if they have not run yet.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use regex::Regex;
use tracing::trace;

use crate::diagnostics::{DiagnosticSink, HandlerFailure, TracingSink};
use crate::event::Event;
use crate::topic::Topic;

/// What a handler returns. `Err` is reported, never propagated.
pub type HandlerResult = anyhow::Result<()>;

type Handler<M> = Rc<dyn Fn(&str, &M) -> HandlerResult>;

/// Identifies one registration on one bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl core::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

enum Matcher {
    Pattern(Regex),
    All,
}

impl Matcher {
    fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Pattern(re) => re.is_match(name),
            Matcher::All => true,
        }
    }
}

struct Registration<M> {
    id: SubscriptionId,
    handler: Handler<M>,
}

struct PatternRegistration<M> {
    matcher: Matcher,
    registration: Registration<M>,
}

/// Two independent registries, always checked exact first.
struct Registry<M> {
    next_id: u64,
    exact: HashMap<String, Vec<Registration<M>>>,
    patterns: Vec<PatternRegistration<M>>,
    live: HashSet<SubscriptionId>,
}

impl<M> Registry<M> {
    fn new() -> Self {
        Self {
            next_id: 1,
            exact: HashMap::new(),
            patterns: Vec::new(),
            live: HashSet::new(),
        }
    }

    fn allocate(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.live.insert(id);
        id
    }

    fn insert_exact(&mut self, name: String, handler: Handler<M>) -> SubscriptionId {
        let id = self.allocate();
        self.exact
            .entry(name)
            .or_default()
            .push(Registration { id, handler });
        id
    }

    fn insert_pattern(&mut self, matcher: Matcher, handler: Handler<M>) -> SubscriptionId {
        let id = self.allocate();
        self.patterns.push(PatternRegistration {
            matcher,
            registration: Registration { id, handler },
        });
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        if !self.live.remove(&id) {
            return false;
        }

        let emptied = self.exact.iter_mut().find_map(|(name, regs)| {
            let pos = regs.iter().position(|r| r.id == id)?;
            regs.remove(pos);
            Some((name.clone(), regs.is_empty()))
        });
        match emptied {
            Some((name, true)) => {
                self.exact.remove(&name);
            }
            Some((_, false)) => {}
            None => self.patterns.retain(|p| p.registration.id != id),
        }
        true
    }

    fn is_live(&self, id: SubscriptionId) -> bool {
        self.live.contains(&id)
    }

    fn matching(&self, name: &str) -> Vec<(SubscriptionId, Handler<M>)> {
        let exact = self
            .exact
            .get(name)
            .into_iter()
            .flatten()
            .map(|r| (r.id, Rc::clone(&r.handler)));
        let patterns = self
            .patterns
            .iter()
            .filter(|p| p.matcher.matches(name))
            .map(|p| (p.registration.id, Rc::clone(&p.registration.handler)));
        exact.chain(patterns).collect()
    }
}

/// Synchronous, single-threaded pub/sub bus.
///
/// Cloning is cheap and yields a handle to the same registries, so the bus can
/// be handed to every producer and consumer through explicit wiring.
pub struct EventBus<M> {
    registry: Rc<RefCell<Registry<M>>>,
    sink: Rc<dyn DiagnosticSink>,
}

impl<M> Clone for EventBus<M> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
            sink: Rc::clone(&self.sink),
        }
    }
}

impl<M: 'static> Default for EventBus<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> core::fmt::Debug for EventBus<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.registry.borrow().live.len())
            .finish()
    }
}

impl<M: 'static> EventBus<M> {
    /// Bus reporting handler failures through `tracing`.
    pub fn new() -> Self {
        Self::with_sink(Rc::new(TracingSink))
    }

    pub fn with_sink(sink: Rc<dyn DiagnosticSink>) -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry::new())),
            sink,
        }
    }

    /// Register `handler` for every future publish whose name matches `topic`.
    ///
    /// The bus keeps the handler until [`Subscription::unsubscribe`] is called;
    /// dropping the returned handle does not unregister it.
    pub fn subscribe<F>(&self, topic: impl Into<Topic>, handler: F) -> Subscription<M>
    where
        F: Fn(&str, &M) -> HandlerResult + 'static,
    {
        let topic = topic.into();
        let label = topic.to_string();
        let handler: Handler<M> = Rc::new(handler);
        let id = {
            let mut registry = self.registry.borrow_mut();
            match topic {
                Topic::Name(name) => registry.insert_exact(name, handler),
                Topic::Pattern(re) => registry.insert_pattern(Matcher::Pattern(re), handler),
            }
        };
        trace!(subscription = %id, topic = %label, "subscribed");
        Subscription::new(id, label, &self.registry)
    }

    /// Register `handler` for every publish, whatever its name.
    ///
    /// Lives in the pattern registry, so it runs after exact-name handlers.
    pub fn subscribe_all<F>(&self, handler: F) -> Subscription<M>
    where
        F: Fn(&str, &M) -> HandlerResult + 'static,
    {
        let handler: Handler<M> = Rc::new(handler);
        let id = self.registry.borrow_mut().insert_pattern(Matcher::All, handler);
        trace!(subscription = %id, topic = "*", "subscribed");
        Subscription::new(id, "*".to_string(), &self.registry)
    }

    /// Dispatch `payload` to every handler matching `name`.
    ///
    /// Fire-and-forget: returns once every matching handler has run.
    pub fn publish(&self, name: &str, payload: &M) {
        let targets = self.registry.borrow().matching(name);
        trace!(topic = name, handlers = targets.len(), "dispatching");

        for (id, handler) in targets {
            if !self.registry.borrow().is_live(id) {
                continue;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(name, payload)));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => format!("{err:#}"),
                Err(panic) => panic_message(panic.as_ref()),
            };
            self.sink.report(&HandlerFailure::new(name, id, message));
        }
    }

    /// Number of active registrations across both registries.
    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().live.len()
    }

    /// Whether a publish under `name` would reach at least one handler.
    pub fn has_subscribers(&self, name: &str) -> bool {
        !self.registry.borrow().matching(name).is_empty()
    }
}

impl<M: Event> EventBus<M> {
    /// Publish `event` under its own topic.
    pub fn emit(&self, event: &M) {
        self.publish(event.topic(), event);
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    }
}

/// Deregistration capability for one handler.
///
/// `unsubscribe` is idempotent and harmless after the bus is gone. Never
/// calling it is fine too: the bus then owns the handler for its lifetime.
pub struct Subscription<M> {
    id: SubscriptionId,
    topic: String,
    registry: Weak<RefCell<Registry<M>>>,
}

impl<M> Subscription<M> {
    fn new(id: SubscriptionId, topic: String, registry: &Rc<RefCell<Registry<M>>>) -> Self {
        Self {
            id,
            topic,
            registry: Rc::downgrade(registry),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The exact name, `/pattern/`, or `*` for catch-all subscriptions.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Remove exactly this handler. Returns `true` if it was still registered.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry.borrow_mut().remove(self.id);
        if removed {
            trace!(subscription = %self.id, topic = %self.topic, "unsubscribed");
        }
        removed
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.borrow().is_live(self.id))
    }
}

impl<M> core::fmt::Debug for Subscription<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}
