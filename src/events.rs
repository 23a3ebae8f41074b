//! Named build-lifecycle events that extensions raise and observe

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::doctree::Element;

/// Callback receiving the element an event was raised for
pub type Listener = Arc<dyn Fn(&Element) + Send + Sync>;

/// Errors from registering, connecting to or emitting events
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("unknown event name: {0}")]
    Unknown(String),
    #[error("event {0} is already registered")]
    AlreadyRegistered(String),
}

/// Registry of events and their listeners
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: HashMap<String, Vec<Listener>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.listeners.iter().map(|(name, l)| (name, l.len())))
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event(&mut self, name: &str) -> Result<(), EventError> {
        if self.listeners.contains_key(name) {
            return Err(EventError::AlreadyRegistered(name.to_string()));
        }
        self.listeners.insert(name.to_string(), Vec::new());
        Ok(())
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.listeners.contains_key(name)
    }

    pub fn connect(&mut self, name: &str, listener: Listener) -> Result<(), EventError> {
        self.listeners
            .get_mut(name)
            .ok_or_else(|| EventError::Unknown(name.to_string()))?
            .push(listener);
        Ok(())
    }

    /// Call every listener of `name`, in connection order
    pub fn emit(&self, name: &str, node: &Element) -> Result<(), EventError> {
        let listeners = self
            .listeners
            .get(name)
            .ok_or_else(|| EventError::Unknown(name.to_string()))?;
        for listener in listeners {
            listener(node);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::doctree::NodeKind;

    #[test]
    fn test_emit_calls_listeners() {
        let mut bus = EventBus::new();
        bus.add_event("thing-found").unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        bus.connect(
            "thing-found",
            Arc::new(move |_el| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        let el = Element::new(NodeKind::Paragraph);
        bus.emit("thing-found", &el).unwrap();
        bus.emit("thing-found", &el).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_event() {
        let mut bus = EventBus::new();
        let el = Element::new(NodeKind::Paragraph);
        assert_eq!(
            bus.emit("nope", &el),
            Err(EventError::Unknown("nope".to_string()))
        );
        assert!(bus.connect("nope", Arc::new(|_| {})).is_err());
    }

    #[test]
    fn test_duplicate_event() {
        let mut bus = EventBus::new();
        bus.add_event("x").unwrap();
        assert_eq!(
            bus.add_event("x"),
            Err(EventError::AlreadyRegistered("x".to_string()))
        );
    }
}
