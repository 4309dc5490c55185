use crate::bus::EventBus;
use crate::domain::events::RedirectRequest;
use crate::domain::filter::QueryString;
use crate::ports::Location;
use std::rc::Rc;
use tracing::debug;

/// Turns a filter selection into a navigation request on the bus.
/// Navigation itself is left to whoever listens for the request.
pub struct FilterRedirect {
    bus: Rc<EventBus>,
    location: Rc<dyn Location>,
}

impl FilterRedirect {
    pub fn new(bus: Rc<EventBus>, location: Rc<dyn Location>) -> Self {
        Self { bus, location }
    }

    /// Set `key` to `value` (or drop it for `all`) in the current query and
    /// request a redirect to the result, which is also returned
    pub fn apply(&self, key: &str, value: &str) -> String {
        let mut query = QueryString::parse(&self.location.search());
        query.apply(key, value);

        let query = query.to_string();
        debug!("Filter {}={} -> redirect to {}", key, value, query);
        self.bus.publish(RedirectRequest {
            query: query.clone(),
        });
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FixedLocation(RefCell<String>);

    impl Location for FixedLocation {
        fn search(&self) -> String {
            self.0.borrow().clone()
        }
    }

    fn setup(search: &str) -> (Rc<EventBus>, Rc<FixedLocation>, Rc<RefCell<Vec<String>>>) {
        let bus = EventBus::new();
        let location = Rc::new(FixedLocation(RefCell::new(search.to_string())));
        let requests = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&requests);
        bus.subscribe_to::<RedirectRequest, _>(move |request| {
            sink.borrow_mut().push(request.query.clone());
            Ok(())
        });

        (bus, location, requests)
    }

    #[test]
    fn test_apply_publishes_resulting_query() {
        let (bus, location, requests) = setup("?house=all&year=2024");
        let redirect = FilterRedirect::new(Rc::clone(&bus), location.clone());

        let query = redirect.apply("house", "red");
        assert_eq!(query, "?house=red&year=2024");

        *location.0.borrow_mut() = query;
        redirect.apply("house", "all");

        assert_eq!(
            *requests.borrow(),
            vec!["?house=red&year=2024".to_string(), "?year=2024".to_string()]
        );
    }

    #[test]
    fn test_apply_does_not_navigate() {
        let (bus, location, _) = setup("?year=y7");
        let redirect = FilterRedirect::new(bus, location.clone());

        redirect.apply("year", "y8");
        assert_eq!(location.search(), "?year=y7");
    }
}
