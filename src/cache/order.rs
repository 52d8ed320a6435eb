//! Insertion Order Module
//!
//! Tracks key insertion order for FIFO eviction.

use std::collections::VecDeque;

// == Insertion Order ==
/// Tracks insertion order for FIFO eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion (next eviction candidate)
/// - Back = Newest insertion
///
/// Reads never reorder keys; only re-insertion moves a key to the back.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<String>,
}

impl InsertionOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push Newest ==
    /// Records `key` as the newest insertion.
    ///
    /// An existing occurrence is removed first, so an overwrite refreshes the
    /// key's position.
    pub fn push_newest(&mut self, key: &str) {
        self.remove(key);
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    // == Pop Oldest ==
    /// Returns and removes the earliest inserted key.
    ///
    /// Returns None if tracker is empty.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    // == Peek Oldest ==
    /// Returns the earliest inserted key without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.front().map(String::as_str)
    }

    /// Drops every key for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.order.retain(|k| keep(k));
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_new() {
        let order = InsertionOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
        assert_eq!(order.peek_oldest(), None);
    }

    #[test]
    fn test_push_keeps_first_as_oldest() {
        let mut order = InsertionOrder::new();

        order.push_newest("key1");
        order.push_newest("key2");
        order.push_newest("key3");

        assert_eq!(order.len(), 3);
        assert_eq!(order.peek_oldest(), Some("key1"));
    }

    #[test]
    fn test_reinsert_refreshes_position() {
        let mut order = InsertionOrder::new();

        order.push_newest("a");
        order.push_newest("b");
        order.push_newest("c");
        order.push_newest("a");

        assert_eq!(order.len(), 3);
        assert_eq!(order.pop_oldest(), Some("b".to_string()));
        assert_eq!(order.pop_oldest(), Some("c".to_string()));
        assert_eq!(order.pop_oldest(), Some("a".to_string()));
        assert!(order.is_empty());
    }

    #[test]
    fn test_pop_empty() {
        let mut order = InsertionOrder::new();
        assert_eq!(order.pop_oldest(), None);
    }

    #[test]
    fn test_remove() {
        let mut order = InsertionOrder::new();

        order.push_newest("key1");
        order.push_newest("key2");
        order.push_newest("key3");

        order.remove("key2");
        order.remove("nonexistent");

        assert_eq!(order.len(), 2);
        assert!(!order.contains("key2"));
        assert!(order.contains("key1"));
        assert!(order.contains("key3"));
    }

    #[test]
    fn test_retain_and_clear() {
        let mut order = InsertionOrder::new();

        order.push_newest("match:1");
        order.push_newest("profile:1");
        order.push_newest("match:2");

        order.retain(|k| !k.starts_with("match:"));
        assert_eq!(order.len(), 1);
        assert_eq!(order.peek_oldest(), Some("profile:1"));

        order.clear();
        assert!(order.is_empty());
    }
}
