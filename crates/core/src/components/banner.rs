use crate::bus::{EventBus, Subscription};
use crate::domain::events::StatusFragment;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Shows whatever fragment the last status-update event carried
pub struct StatusBanner {
    bus: Rc<EventBus>,
    content: Rc<RefCell<String>>,
    subscription: Subscription,
}

impl StatusBanner {
    pub fn mount(bus: Rc<EventBus>, initial: impl Into<String>) -> Self {
        let content = Rc::new(RefCell::new(initial.into()));

        let target = Rc::clone(&content);
        let subscription = bus.subscribe_to::<StatusFragment, _>(move |fragment| {
            debug!("Status banner replaced ({} bytes)", fragment.html.len());
            *target.borrow_mut() = fragment.html.clone();
            Ok(())
        });

        Self {
            bus,
            content,
            subscription,
        }
    }

    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }
}

impl Drop for StatusBanner {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.subscription);
    }
}
