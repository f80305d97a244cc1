//! Currently active outline entry
//!
//! Exactly one entry is "active" at a time, set by explicit activation
//! events from the rendered outline. Regeneration never touches it, so a
//! selection survives recomputation even when the selected entry no longer
//! exists in the fresh outline.

use std::sync::RwLock;

use crate::heading::Heading;

/// Holds the single active heading.
#[derive(Debug)]
pub struct ActiveEntryTracker {
    current: RwLock<Heading>,
}

impl ActiveEntryTracker {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Heading::placeholder()),
        }
    }

    /// Snapshot of the active entry.
    pub fn get(&self) -> Heading {
        self.current.read().unwrap().clone()
    }

    /// Record an activation. No membership check against the current
    /// outline; a stale activation is accepted as-is.
    pub fn set(&self, heading: Heading) {
        *self.current.write().unwrap() = heading;
    }
}

impl Default for ActiveEntryTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_placeholder() {
        let tracker = ActiveEntryTracker::new();
        assert_eq!(tracker.get(), Heading::placeholder());
    }

    #[test]
    fn test_set_replaces_entry() {
        let tracker = ActiveEntryTracker::new();
        tracker.set(Heading::new("Results", 2));
        assert_eq!(tracker.get(), Heading::new("Results", 2));

        tracker.set(Heading::new("Discussion", 2));
        assert_eq!(tracker.get(), Heading::new("Discussion", 2));
    }
}
