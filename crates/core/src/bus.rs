//! Page-wide publish/subscribe bus.
//!
//! Components never hold references to each other; they agree only on event
//! names and payload types. The bus is single-threaded: it is shared with
//! `Rc` and handlers run to completion on the publisher's call stack, in
//! subscription order. Nothing is buffered, so a late subscriber never sees
//! earlier events.

use crate::domain::events::{Event, EventName, Payload};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tracing::{debug, error, warn};

type Handler = Rc<RefCell<dyn FnMut(&Event) -> anyhow::Result<()>>>;

struct Listener {
    id: u64,
    handler: Handler,
}

/// Handle returned by `subscribe`, used to detach the handler again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
    name: EventName,
}

impl Subscription {
    pub fn name(&self) -> EventName {
        self.name
    }
}

/// Outcome of a single publish call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Handlers that ran and returned `Ok`
    pub delivered: usize,
    /// Handlers that returned an error, panicked, or were already running
    pub failed: usize,
}

#[derive(Default)]
pub struct EventBus {
    next_id: Cell<u64>,
    listeners: RefCell<HashMap<EventName, Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Attach `handler` to every future event published under `name`
    pub fn subscribe<F>(&self, name: EventName, handler: F) -> Subscription
    where
        F: FnMut(&Event) -> anyhow::Result<()> + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let handler: Handler = Rc::new(RefCell::new(handler));
        self.listeners
            .borrow_mut()
            .entry(name)
            .or_default()
            .push(Listener { id, handler });

        debug!("Subscribed listener {} to {}", id, name);
        Subscription { id, name }
    }

    /// Typed variant of `subscribe`: the handler receives the payload of `P`
    pub fn subscribe_to<P, F>(&self, mut handler: F) -> Subscription
    where
        P: Payload,
        F: FnMut(&P) -> anyhow::Result<()> + 'static,
    {
        self.subscribe(P::NAME, move |event| match P::extract(event) {
            Some(payload) => handler(payload),
            None => Ok(()),
        })
    }

    /// Detach a handler. Returns false if it was already gone.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(&subscription.name) else {
            return false;
        };

        let before = list.len();
        list.retain(|listener| listener.id != subscription.id);
        let removed = list.len() != before;

        if removed {
            debug!("Unsubscribed listener {} from {}", subscription.id, subscription.name);
        }
        removed
    }

    pub fn listener_count(&self, name: EventName) -> usize {
        self.listeners
            .borrow()
            .get(&name)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Deliver `event` synchronously to every listener of its name.
    ///
    /// A failing or panicking handler is logged and does not stop delivery
    /// to the handlers after it. Handlers may subscribe, unsubscribe and
    /// publish other events while running.
    pub fn publish(&self, event: impl Into<Event>) -> Delivery {
        let event = event.into();
        let name = event.name();

        // Snapshot so handlers can touch the listener table during delivery
        let snapshot: Vec<(u64, Handler)> = self
            .listeners
            .borrow()
            .get(&name)
            .map(|list| {
                list.iter()
                    .map(|listener| (listener.id, Rc::clone(&listener.handler)))
                    .collect()
            })
            .unwrap_or_default();

        debug!("Publishing {} to {} listener(s)", name, snapshot.len());

        let mut delivery = Delivery::default();
        for (id, handler) in snapshot {
            if !self.is_subscribed(name, id) {
                continue;
            }

            let Ok(mut guard) = handler.try_borrow_mut() else {
                warn!("Listener {} is already handling {}; skipping re-entrant delivery", id, name);
                delivery.failed += 1;
                continue;
            };

            match panic::catch_unwind(AssertUnwindSafe(|| (*guard)(&event))) {
                Ok(Ok(())) => delivery.delivered += 1,
                Ok(Err(e)) => {
                    error!("Listener {} failed handling {}: {:#}", id, name, e);
                    delivery.failed += 1;
                }
                Err(_) => {
                    error!("Listener {} panicked handling {}", id, name);
                    delivery.failed += 1;
                }
            }
        }

        delivery
    }

    fn is_subscribed(&self, name: EventName, id: u64) -> bool {
        self.listeners
            .borrow()
            .get(&name)
            .is_some_and(|list| list.iter().any(|listener| listener.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{CompletionSignal, StatusFragment};

    fn fragment(text: &str) -> StatusFragment {
        StatusFragment { html: text.to_string() }
    }

    #[test]
    fn test_delivers_in_subscription_order() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            bus.subscribe_to::<StatusFragment, _>(move |_| {
                seen.borrow_mut().push(label);
                Ok(())
            });
        }

        let delivery = bus.publish(fragment("x"));
        assert_eq!(delivery.delivered, 3);
        assert_eq!(*seen.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_only_matching_name_is_delivered() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        bus.subscribe_to::<CompletionSignal, _>(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        assert_eq!(bus.publish(fragment("x")), Delivery::default());
        bus.publish(CompletionSignal::any());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_failing_handlers_are_isolated() {
        let bus = EventBus::new();
        let reached = Rc::new(Cell::new(false));

        bus.subscribe(EventName::StatusUpdate, |_| anyhow::bail!("boom"));
        bus.subscribe(EventName::StatusUpdate, |_| panic!("handler panicked"));
        let flag = Rc::clone(&reached);
        bus.subscribe(EventName::StatusUpdate, move |_| {
            flag.set(true);
            Ok(())
        });

        let delivery = bus.publish(fragment("x"));
        assert_eq!(delivery, Delivery { delivered: 1, failed: 2 });
        assert!(reached.get());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        let sub = bus.subscribe(EventName::Completion, move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        bus.publish(CompletionSignal::any());
        assert!(bus.unsubscribe(&sub));
        assert!(!bus.unsubscribe(&sub));
        bus.publish(CompletionSignal::any());

        assert_eq!(hits.get(), 1);
        assert_eq!(bus.listener_count(EventName::Completion), 0);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();
        bus.publish(fragment("early"));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe_to::<StatusFragment, _>(move |f| {
            sink.borrow_mut().push(f.html.clone());
            Ok(())
        });
        bus.publish(fragment("late"));

        assert_eq!(*seen.borrow(), vec!["late".to_string()]);
    }

    #[test]
    fn test_handler_removed_mid_delivery_is_skipped() {
        let bus = EventBus::new();
        let second_ran = Rc::new(Cell::new(false));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let bus_ref = Rc::clone(&bus);
        let target = Rc::clone(&victim);
        bus.subscribe(EventName::Completion, move |_| {
            if let Some(sub) = target.borrow().as_ref() {
                bus_ref.unsubscribe(sub);
            }
            Ok(())
        });

        let flag = Rc::clone(&second_ran);
        let sub = bus.subscribe(EventName::Completion, move |_| {
            flag.set(true);
            Ok(())
        });
        *victim.borrow_mut() = Some(sub);

        bus.publish(CompletionSignal::any());
        assert!(!second_ran.get());
    }

    #[test]
    fn test_reentrant_publish_of_same_name_does_not_recurse() {
        let bus = EventBus::new();
        let calls = Rc::new(Cell::new(0));

        let bus_ref = Rc::clone(&bus);
        let counter = Rc::clone(&calls);
        bus.subscribe(EventName::StatusUpdate, move |_| {
            counter.set(counter.get() + 1);
            let inner = bus_ref.publish(StatusFragment { html: "again".to_string() });
            assert_eq!(inner.failed, 1);
            Ok(())
        });

        let delivery = bus.publish(fragment("x"));
        assert_eq!(delivery.delivered, 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_handler_may_publish_other_events() {
        let bus = EventBus::new();
        let banner = Rc::new(RefCell::new(String::new()));

        let sink = Rc::clone(&banner);
        bus.subscribe_to::<StatusFragment, _>(move |f| {
            *sink.borrow_mut() = f.html.clone();
            Ok(())
        });

        let bus_ref = Rc::clone(&bus);
        bus.subscribe_to::<CompletionSignal, _>(move |_| {
            bus_ref.publish(StatusFragment { html: "saved".to_string() });
            Ok(())
        });

        bus.publish(CompletionSignal::any());
        assert_eq!(*banner.borrow(), "saved");
    }
}
