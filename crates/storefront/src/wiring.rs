//! Routes view intents published on the bus into store mutations.

use std::rc::{Rc, Weak};

use anyhow::anyhow;

use larek_events::{BusError, EventBus, HandlerResult, Subscription, Topic};

use crate::events::{StorefrontEvent, topics};
use crate::store::StateStore;

/// Subscribe the store to the checkout forms, catalog cards and basket
/// buttons.
///
/// Handlers hold a weak reference, so the bus never keeps the store alive.
/// Returns the subscriptions so a caller can tear the wiring down.
pub fn bind_inputs(
    bus: &EventBus<StorefrontEvent>,
    store: &Rc<StateStore>,
) -> Result<Vec<Subscription<StorefrontEvent>>, BusError> {
    let fields = Topic::pattern(topics::FIELD_CHANGE_PATTERN)?;

    Ok(vec![
        bus.subscribe(fields, route(store, |store, event| match event {
            StorefrontEvent::FieldChanged { field, value } => {
                store.set_order_field(*field, value.clone());
                Ok(())
            }
            other => Err(unexpected(other)),
        })),
        bus.subscribe(topics::CARD_SELECT, route(store, |store, event| match event {
            StorefrontEvent::ProductSelected(id) => {
                store.select_preview(id);
                Ok(())
            }
            other => Err(unexpected(other)),
        })),
        bus.subscribe(topics::BASKET_TOGGLE, route(store, |store, event| match event {
            StorefrontEvent::BasketToggled(id) => {
                store.toggle_basket(id);
                Ok(())
            }
            other => Err(unexpected(other)),
        })),
        bus.subscribe(topics::BASKET_REMOVE, route(store, |store, event| match event {
            StorefrontEvent::BasketRemoved(id) => {
                store.remove_from_basket(id);
                Ok(())
            }
            other => Err(unexpected(other)),
        })),
    ])
}

fn route<F>(store: &Rc<StateStore>, apply: F) -> impl Fn(&str, &StorefrontEvent) -> HandlerResult + 'static
where
    F: Fn(&StateStore, &StorefrontEvent) -> HandlerResult + 'static,
{
    let store: Weak<StateStore> = Rc::downgrade(store);
    move |_, event| {
        let store = store
            .upgrade()
            .ok_or_else(|| anyhow!("state store dropped"))?;
        apply(store.as_ref(), event)
    }
}

fn unexpected(event: &StorefrontEvent) -> anyhow::Error {
    anyhow!("unexpected payload for this topic: {event:?}")
}
