use std::fmt;
use url::form_urlencoded;

/// Filter value that clears a key instead of setting it
pub const ALL_SENTINEL: &str = "all";

/// Ordered query-string pairs of the page location
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string, with or without the leading `?`
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let pairs = form_urlencoded::parse(raw.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the first `key` in place and drop any later duplicates, or
    /// append when `key` is absent
    pub fn set(&mut self, key: &str, value: &str) {
        let mut seen = false;
        self.pairs.retain_mut(|(k, v)| {
            if k != key {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            *v = value.to_string();
            true
        });

        if !seen {
            self.pairs.push((key.to_string(), value.to_string()));
        }
    }

    /// Remove every occurrence of `key`
    pub fn delete(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// Delete `key` on the `all` sentinel, set it otherwise
    pub fn apply(&mut self, key: &str, value: &str) {
        if value == ALL_SENTINEL {
            self.delete(key);
        } else {
            self.set(key, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish();
        write!(f, "?{}", encoded)
    }
}
