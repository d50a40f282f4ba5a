//! Storefront state: catalog, basket, preview, order draft, validation.
//!
//! [`StateStore`] is the single writer of all of it. Every mutation updates the
//! state completely, releases its borrow, and only then announces the change on
//! the bus, so a handler that reads the store back (or mutates it again) sees
//! the state the event describes. Announcements are synchronous and never
//! batched: one mutation, one announcement.
//!
//! Handlers may call back into the store while it is announcing (for example
//! `formErrors:changed` -> `set_order_field`). There is no re-entrancy guard;
//! such chains must terminate on their own.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use larek_core::ProductId;
use larek_events::EventBus;

use crate::basket::{Basket, BasketSnapshot};
use crate::events::StorefrontEvent;
use crate::order::{OrderDraft, OrderField, ValidationErrors};
use crate::product::Product;

#[derive(Debug, Default)]
struct State {
    catalog: Vec<Rc<Product>>,
    basket: Basket,
    preview: Option<Rc<Product>>,
    order: OrderDraft,
    errors: ValidationErrors,
}

impl State {
    fn find(&self, id: &ProductId) -> Option<Rc<Product>> {
        self.catalog.iter().find(|p| &p.id == id).cloned()
    }
}

pub struct StateStore {
    state: RefCell<State>,
    bus: EventBus<StorefrontEvent>,
}

impl core::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateStore")
            .field("state", &self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl StateStore {
    /// Empty store announcing on `bus`.
    pub fn new(bus: EventBus<StorefrontEvent>) -> Self {
        Self {
            state: RefCell::new(State::default()),
            bus,
        }
    }

    pub fn bus(&self) -> &EventBus<StorefrontEvent> {
        &self.bus
    }

    // ---- mutations --------------------------------------------------------

    /// Replace the catalog wholesale. Announces `catalog:updated`.
    pub fn replace_catalog(&self, products: impl IntoIterator<Item = Product>) {
        let catalog: Vec<Rc<Product>> = products.into_iter().map(Rc::new).collect();
        self.state.borrow_mut().catalog = catalog.clone();

        debug!(products = catalog.len(), "catalog replaced");
        self.bus.emit(&StorefrontEvent::CatalogUpdated(catalog));
    }

    /// Point the preview at `id`, or at nothing if the catalog lacks it.
    /// Always announces `preview:changed`.
    pub fn select_preview(&self, id: &ProductId) -> Option<Rc<Product>> {
        let resolved = {
            let mut state = self.state.borrow_mut();
            let resolved = state.find(id);
            state.preview = resolved.clone();
            resolved
        };

        debug!(product_id = %id, found = resolved.is_some(), "preview selected");
        self.bus
            .emit(&StorefrontEvent::PreviewChanged(resolved.clone()));
        resolved
    }

    /// Append the catalog product `id` to the basket.
    ///
    /// Unknown ids and ids already in the basket are silent no-ops. Announces
    /// `basket:updated` only when the basket changed; returns the same fact.
    pub fn add_to_basket(&self, id: &ProductId) -> bool {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            let Some(product) = state.find(id) else {
                debug!(product_id = %id, "add to basket ignored: not in catalog");
                return false;
            };
            if !state.basket.insert(product) {
                debug!(product_id = %id, "add to basket ignored: already present");
                return false;
            }
            state.basket.snapshot()
        };

        debug!(product_id = %id, items = snapshot.count(), "added to basket");
        self.bus.emit(&StorefrontEvent::BasketUpdated(snapshot));
        true
    }

    /// Remove `id` from the basket. Announces `basket:updated` if it was there.
    pub fn remove_from_basket(&self, id: &ProductId) -> bool {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            if !state.basket.remove(id) {
                return false;
            }
            state.basket.snapshot()
        };

        debug!(product_id = %id, items = snapshot.count(), "removed from basket");
        self.bus.emit(&StorefrontEvent::BasketUpdated(snapshot));
        true
    }

    /// Remove `id` if present, add it otherwise. Returns whether it ends up in
    /// the basket.
    pub fn toggle_basket(&self, id: &ProductId) -> bool {
        if self.contains(id) {
            self.remove_from_basket(id);
            false
        } else {
            self.add_to_basket(id)
        }
    }

    /// Empty the basket. Always announces `basket:updated`, even if it was
    /// already empty.
    pub fn clear_basket(&self) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            state.basket.clear();
            state.basket.snapshot()
        };

        debug!("basket cleared");
        self.bus.emit(&StorefrontEvent::BasketUpdated(snapshot));
    }

    /// Set one draft field, revalidate, and announce `order:ready` when the
    /// draft is complete.
    pub fn set_order_field(&self, field: OrderField, value: impl Into<String>) {
        self.state.borrow_mut().order.set(field, value);
        debug!(field = %field, "order field updated");

        if self.validate_order() {
            let draft = self.order_draft();
            self.bus.emit(&StorefrontEvent::OrderReady(draft));
        }
    }

    /// Recompute the error map from the current draft, replacing the old one.
    /// Announces `formErrors:changed` and returns whether the map is empty.
    pub fn validate_order(&self) -> bool {
        let errors = {
            let mut state = self.state.borrow_mut();
            state.errors = state.order.validate();
            state.errors.clone()
        };

        let valid = errors.is_empty();
        debug!(valid, errors = errors.len(), "order validated");
        self.bus.emit(&StorefrontEvent::FormErrorsChanged(errors));
        valid
    }

    /// Reset every draft field to empty. Announces nothing and leaves the
    /// error map and basket alone.
    pub fn clear_order(&self) {
        self.state.borrow_mut().order = OrderDraft::new();
        debug!("order draft cleared");
    }

    /// Drop all validation errors. Announces `formErrors:changed`.
    pub fn reset_validation(&self) {
        self.state.borrow_mut().errors = ValidationErrors::new();
        debug!("validation errors reset");
        self.bus
            .emit(&StorefrontEvent::FormErrorsChanged(ValidationErrors::new()));
    }

    // ---- reads ------------------------------------------------------------

    pub fn catalog(&self) -> Vec<Rc<Product>> {
        self.state.borrow().catalog.clone()
    }

    pub fn product(&self, id: &ProductId) -> Option<Rc<Product>> {
        self.state.borrow().find(id)
    }

    pub fn preview(&self) -> Option<Rc<Product>> {
        self.state.borrow().preview.clone()
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.state.borrow().basket.contains(id)
    }

    /// Sum of basket prices, priceless items counting as zero.
    pub fn basket_total(&self) -> u64 {
        self.state.borrow().basket.total()
    }

    pub fn basket_count(&self) -> usize {
        self.state.borrow().basket.len()
    }

    pub fn basket_ids(&self) -> Vec<ProductId> {
        self.state.borrow().basket.ids()
    }

    pub fn basket_items(&self) -> Vec<Rc<Product>> {
        self.state.borrow().basket.items().to_vec()
    }

    /// Basket items that can be submitted with an order (price above zero).
    pub fn orderable_basket_items(&self) -> Vec<Rc<Product>> {
        self.state
            .borrow()
            .basket
            .items()
            .iter()
            .filter(|item| item.is_orderable())
            .cloned()
            .collect()
    }

    pub fn basket_snapshot(&self) -> BasketSnapshot {
        self.state.borrow().basket.snapshot()
    }

    pub fn order_draft(&self) -> OrderDraft {
        self.state.borrow().order.clone()
    }

    pub fn validation_errors(&self) -> ValidationErrors {
        self.state.borrow().errors.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larek_core::Price;
    use larek_events::{CollectingSink, HandlerResult, Topic};

    use crate::events::topics;

    type Seen = Rc<RefCell<Vec<StorefrontEvent>>>;

    fn id(raw: &str) -> ProductId {
        ProductId::new(raw).unwrap()
    }

    fn catalog() -> Vec<Product> {
        vec![
            Product::new(id("a"), "Фреймворк куки судьбы", Price::new(100)),
            Product::new(id("b"), "Мамка-таймер", Price::PRICELESS),
            Product::new(id("c"), "+1 час в сутках", Price::new(750)),
        ]
    }

    fn store_with_catalog() -> StateStore {
        let store = StateStore::new(EventBus::new());
        store.replace_catalog(catalog());
        store
    }

    fn record(store: &StateStore, topic: &str) -> Seen {
        let seen: Seen = Rc::default();
        let sink = Rc::clone(&seen);
        store.bus().subscribe(topic, move |_, event: &StorefrontEvent| -> HandlerResult {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });
        seen
    }

    fn fill(store: &StateStore) {
        store.set_order_field(OrderField::Payment, "card");
        store.set_order_field(OrderField::Address, "Moscow");
        store.set_order_field(OrderField::Email, "test@test.ru");
        store.set_order_field(OrderField::Phone, "+71234567890");
    }

    #[test]
    fn starts_empty() {
        let store = StateStore::new(EventBus::new());
        assert!(store.catalog().is_empty());
        assert_eq!(store.basket_count(), 0);
        assert_eq!(store.basket_total(), 0);
        assert!(store.preview().is_none());
        assert!(store.order_draft().is_empty());
        assert!(store.validation_errors().is_empty());
    }

    #[test]
    fn replace_catalog_announces_the_new_list() {
        let store = StateStore::new(EventBus::new());
        let seen = record(&store, topics::CATALOG_UPDATED);

        store.replace_catalog(catalog());
        store.replace_catalog(vec![Product::new(id("z"), "Z", Price::new(1))]);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        match &seen[1] {
            StorefrontEvent::CatalogUpdated(products) => {
                assert_eq!(products.len(), 1);
                assert_eq!(products[0].id, id("z"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(store.catalog().len(), 1);
    }

    #[test]
    fn basket_scenario_with_priceless_item() {
        let store = store_with_catalog();

        assert!(store.add_to_basket(&id("a")));
        assert!(store.add_to_basket(&id("b")));
        assert_eq!(store.basket_total(), 100);

        assert!(!store.add_to_basket(&id("a")));
        assert_eq!(store.basket_count(), 2);
        assert_eq!(store.basket_total(), 100);
        assert_eq!(store.basket_ids(), vec![id("a"), id("b")]);

        let orderable: Vec<_> = store.orderable_basket_items().iter().map(|p| p.id.clone()).collect();
        assert_eq!(orderable, vec![id("a")]);
        assert_eq!(store.basket_items().len(), 2);
    }

    #[test]
    fn basket_announcements_match_mutations() {
        let store = store_with_catalog();
        let seen = record(&store, topics::BASKET_UPDATED);

        store.add_to_basket(&id("a"));
        store.add_to_basket(&id("a"));
        store.add_to_basket(&id("missing"));
        store.remove_from_basket(&id("c"));
        store.remove_from_basket(&id("a"));

        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn clear_basket_always_announces() {
        let store = store_with_catalog();
        let seen = record(&store, topics::BASKET_UPDATED);

        store.clear_basket();
        store.add_to_basket(&id("c"));
        store.clear_basket();

        assert_eq!(seen.borrow().len(), 3);
        assert_eq!(store.basket_count(), 0);
        assert_eq!(store.basket_total(), 0);
        assert_eq!(
            seen.borrow().last(),
            Some(&StorefrontEvent::BasketUpdated(BasketSnapshot::default()))
        );
    }

    #[test]
    fn toggle_adds_then_removes() {
        let store = store_with_catalog();

        assert!(store.toggle_basket(&id("c")));
        assert!(store.contains(&id("c")));
        assert!(!store.toggle_basket(&id("c")));
        assert!(!store.contains(&id("c")));
        assert!(!store.toggle_basket(&id("missing")));
    }

    #[test]
    fn remove_then_add_moves_item_to_the_end() {
        let store = store_with_catalog();
        store.add_to_basket(&id("a"));
        store.add_to_basket(&id("c"));

        store.remove_from_basket(&id("a"));
        store.add_to_basket(&id("a"));

        assert_eq!(store.basket_ids(), vec![id("c"), id("a")]);
    }

    #[test]
    fn unknown_preview_resolves_to_none() {
        let store = store_with_catalog();
        let seen = record(&store, topics::PREVIEW_CHANGED);

        assert!(store.select_preview(&id("a")).is_some());
        assert!(store.select_preview(&id("missing-id")).is_none());

        assert!(store.preview().is_none());
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], StorefrontEvent::PreviewChanged(None));
    }

    #[test]
    fn preview_shares_the_catalog_allocation() {
        let store = store_with_catalog();
        let preview = store.select_preview(&id("c")).unwrap();
        let in_catalog = store.product(&id("c")).unwrap();
        assert!(Rc::ptr_eq(&preview, &in_catalog));
    }

    #[test]
    fn empty_draft_fails_validation_with_four_errors() {
        let store = StateStore::new(EventBus::new());
        let seen = record(&store, topics::FORM_ERRORS_CHANGED);

        assert!(!store.validate_order());

        let errors = store.validation_errors();
        assert_eq!(errors.len(), 4);
        for field in OrderField::ALL {
            assert!(errors.contains(field));
        }
        assert_eq!(*seen.borrow(), vec![StorefrontEvent::FormErrorsChanged(errors)]);
    }

    #[test]
    fn order_ready_fires_once_when_the_draft_becomes_complete() {
        let store = StateStore::new(EventBus::new());
        let ready = record(&store, topics::ORDER_READY);

        store.set_order_field(OrderField::Payment, "card");
        store.set_order_field(OrderField::Address, "Moscow");
        store.set_order_field(OrderField::Email, "test@test.ru");
        assert!(ready.borrow().is_empty());

        store.set_order_field(OrderField::Phone, "+71234567890");

        let ready = ready.borrow();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0], StorefrontEvent::OrderReady(store.order_draft()));
    }

    #[test]
    fn validation_map_never_keeps_stale_entries() {
        let store = StateStore::new(EventBus::new());
        store.set_order_field(OrderField::Email, "a@b.c");
        assert!(!store.validation_errors().contains(OrderField::Email));

        store.set_order_field(OrderField::Email, "");
        assert!(store.validation_errors().contains(OrderField::Email));
    }

    #[test]
    fn clear_order_keeps_errors_and_basket() {
        let store = store_with_catalog();
        store.add_to_basket(&id("a"));
        store.set_order_field(OrderField::Payment, "cash");
        let errors = store.validation_errors();

        store.clear_order();

        assert!(store.order_draft().is_empty());
        assert_eq!(store.validation_errors(), errors);
        assert_eq!(store.basket_count(), 1);
    }

    #[test]
    fn reset_validation_announces_an_empty_map() {
        let store = StateStore::new(EventBus::new());
        store.validate_order();
        let seen = record(&store, topics::FORM_ERRORS_CHANGED);

        store.reset_validation();

        assert!(store.validation_errors().is_empty());
        assert_eq!(
            *seen.borrow(),
            vec![StorefrontEvent::FormErrorsChanged(ValidationErrors::new())]
        );
    }

    #[test]
    fn handlers_observe_state_after_the_mutation() {
        let store = Rc::new(store_with_catalog());
        let observed: Rc<RefCell<Vec<(usize, u64)>>> = Rc::default();

        let reader = Rc::downgrade(&store);
        let sink = Rc::clone(&observed);
        store.bus().subscribe(topics::BASKET_UPDATED, move |_, _| {
            let store = reader.upgrade().ok_or_else(|| anyhow::anyhow!("store dropped"))?;
            sink.borrow_mut().push((store.basket_count(), store.basket_total()));
            Ok(())
        });

        store.add_to_basket(&id("a"));
        store.add_to_basket(&id("c"));
        store.remove_from_basket(&id("a"));

        assert_eq!(*observed.borrow(), vec![(1, 100), (2, 850), (1, 750)]);
    }

    #[test]
    fn handler_may_mutate_the_store_during_an_announcement() {
        let store = Rc::new(StateStore::new(EventBus::new()));
        let ready = record(&store, topics::ORDER_READY);

        // Auto-fill the phone as soon as the email is valid.
        let writer = Rc::downgrade(&store);
        store.bus().subscribe(topics::FORM_ERRORS_CHANGED, move |_, event| {
            let store = writer.upgrade().ok_or_else(|| anyhow::anyhow!("store dropped"))?;
            if let StorefrontEvent::FormErrorsChanged(errors) = event {
                if !errors.contains(OrderField::Email) && errors.contains(OrderField::Phone) {
                    store.set_order_field(OrderField::Phone, "+70000000000");
                }
            }
            Ok(())
        });

        store.set_order_field(OrderField::Payment, "card");
        store.set_order_field(OrderField::Address, "Moscow");
        store.set_order_field(OrderField::Email, "a@b.c");

        assert_eq!(store.order_draft().phone(), "+70000000000");
        assert!(store.validation_errors().is_empty());
        // Only the nested call completed the draft; the outer validation pass
        // ran before it and still saw the phone missing.
        assert_eq!(ready.borrow().len(), 1);
    }

    #[test]
    fn failing_view_does_not_block_other_views_or_the_store() {
        let sink = Rc::new(CollectingSink::new());
        let store = StateStore::new(EventBus::with_sink(sink.clone()));
        store.replace_catalog(catalog());
        store
            .bus()
            .subscribe(Topic::pattern("^basket:").unwrap(), |_, _| anyhow::bail!("view detached"));
        let seen = record(&store, topics::BASKET_UPDATED);

        assert!(store.add_to_basket(&id("a")));

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.failures()[0].topic, topics::BASKET_UPDATED);
        assert_eq!(store.basket_count(), 1);
    }

    #[test]
    fn complete_draft_matches_helper() {
        let store = StateStore::new(EventBus::new());
        fill(&store);
        assert!(store.validate_order());
        assert_eq!(store.order_draft().email(), "test@test.ru");
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(usize),
            Remove(usize),
            Clear,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => (0usize..6).prop_map(Op::Add),
                2 => (0usize..6).prop_map(Op::Remove),
                1 => Just(Op::Clear),
            ]
        }

        fn ids() -> Vec<ProductId> {
            ["a", "b", "c", "d", "e", "missing"].into_iter().map(id).collect()
        }

        fn priced_catalog(prices: &[Option<u64>]) -> Vec<Product> {
            ids()
                .into_iter()
                .take(5)
                .zip(prices.iter())
                .map(|(id, price)| Product::new(id.clone(), id.to_string(), Price::from(*price)))
                .collect()
        }

        fn draft_value() -> impl Strategy<Value = String> {
            prop_oneof![Just(String::new()), "[a-z@.+0-9 ]{1,12}"]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: the basket never holds the same id twice, and the
            /// announcement count equals the number of effective mutations.
            #[test]
            fn basket_ids_stay_unique(
                prices in proptest::collection::vec(proptest::option::of(0u64..5000), 5),
                ops in proptest::collection::vec(op(), 0..40),
            ) {
                let store = StateStore::new(EventBus::new());
                store.replace_catalog(priced_catalog(&prices));
                let seen = record(&store, topics::BASKET_UPDATED);
                let ids = ids();
                let mut mutations = 0;

                for op in ops {
                    match op {
                        Op::Add(i) => mutations += usize::from(store.add_to_basket(&ids[i])),
                        Op::Remove(i) => mutations += usize::from(store.remove_from_basket(&ids[i])),
                        Op::Clear => {
                            store.clear_basket();
                            mutations += 1;
                            prop_assert_eq!(store.basket_count(), 0);
                            prop_assert_eq!(store.basket_total(), 0);
                        }
                    }

                    let basket = store.basket_ids();
                    let mut unique = basket.clone();
                    unique.sort();
                    unique.dedup();
                    prop_assert_eq!(unique.len(), basket.len());
                    prop_assert!(!basket.contains(&ids[5]));
                }

                prop_assert_eq!(seen.borrow().len(), mutations);
                let expected: u64 = store.basket_items().iter().map(|p| p.price.amount_or_zero()).sum();
                prop_assert_eq!(store.basket_total(), expected);
            }

            /// Property: remove followed by add restores basket membership.
            #[test]
            fn remove_then_add_restores_membership(
                picks in proptest::collection::vec(0usize..5, 1..8),
                target in 0usize..5,
            ) {
                let store = StateStore::new(EventBus::new());
                store.replace_catalog(priced_catalog(&[Some(1), Some(2), None, Some(4), Some(5)]));
                let ids = ids();
                for i in picks {
                    store.add_to_basket(&ids[i]);
                }
                store.add_to_basket(&ids[target]);

                let mut before = store.basket_ids();
                store.remove_from_basket(&ids[target]);
                store.add_to_basket(&ids[target]);
                let mut after = store.basket_ids();

                prop_assert_eq!(after.last(), Some(&ids[target]));
                before.sort();
                after.sort();
                prop_assert_eq!(before, after);
            }

            /// Property: validate_order is true iff the announced map is empty.
            #[test]
            fn validation_result_matches_announcement(
                payment in draft_value(),
                address in draft_value(),
                email in draft_value(),
                phone in draft_value(),
            ) {
                let store = StateStore::new(EventBus::new());
                store.set_order_field(OrderField::Payment, payment.clone());
                store.set_order_field(OrderField::Address, address.clone());
                store.set_order_field(OrderField::Email, email.clone());
                store.set_order_field(OrderField::Phone, phone.clone());
                let seen = record(&store, topics::FORM_ERRORS_CHANGED);

                let valid = store.validate_order();

                let seen = seen.borrow();
                prop_assert_eq!(seen.len(), 1);
                let StorefrontEvent::FormErrorsChanged(errors) = &seen[0] else {
                    return Err(TestCaseError::fail("unexpected event"));
                };
                prop_assert_eq!(valid, errors.is_empty());
                let empty_fields = [&payment, &address, &email, &phone]
                    .iter()
                    .filter(|v| v.is_empty())
                    .count();
                prop_assert_eq!(errors.len(), empty_fields);
            }
        }
    }
}
