use serde::{Deserialize, Serialize};

/// Ordered list of event descriptions produced by a single fetch attempt.
///
/// A result is immutable once produced. When the crew decides more data is
/// needed, a fresh fetch yields a new `EventsResult` that replaces the
/// previous one; partial results are never merged across attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsResult {
    events: Vec<String>,
}

impl EventsResult {
    pub fn new(events: Vec<String>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn into_events(self) -> Vec<String> {
        self.events
    }
}

impl From<Vec<String>> for EventsResult {
    fn from(events: Vec<String>) -> Self {
        Self::new(events)
    }
}
