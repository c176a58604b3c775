//! Append-only record of completed spins.

use crate::config::Item;

/// One completed spin: a snapshot of the winning item, the host-supplied
/// completion timestamp, and the spin ordinal.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub result: Item,
    pub timestamp: f64,
    pub ordinal: u32,
}

/// Spin log owned by one wheel instance. Unbounded by default; an optional
/// capacity evicts the oldest entry on overflow.
#[derive(Debug, Default)]
pub struct HistoryTracker {
    entries: Vec<HistoryEntry>,
    capacity: Option<usize>,
}

impl HistoryTracker {
    pub fn new(capacity: Option<usize>) -> HistoryTracker {
        HistoryTracker { entries: Vec::new(), capacity }
    }

    pub fn add(&mut self, result: Item, timestamp: f64, ordinal: u32) {
        self.entries.push(HistoryEntry { result, timestamp, ordinal });
        if let Some(cap) = self.capacity {
            while self.entries.len() > cap {
                self.entries.remove(0);
            }
        }
    }

    /// Order-preserving defensive copy.
    pub fn all(&self) -> Vec<HistoryEntry> {
        self.entries.clone()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_arrival_order() {
        let mut h = HistoryTracker::new(None);
        h.add(Item::new("a", "#111"), 1.0, 1);
        h.add(Item::new("b", "#222"), 2.0, 2);
        let all = h.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].result.name, "a");
        assert_eq!(all[1].ordinal, 2);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut h = HistoryTracker::new(Some(2));
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            h.add(Item::new(name, "#000"), i as f64, i as u32 + 1);
        }
        let all = h.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].result.name, "b");
        assert_eq!(all[1].result.name, "c");
    }

    #[test]
    fn clear_empties_the_log() {
        let mut h = HistoryTracker::new(None);
        h.add(Item::new("a", "#111"), 1.0, 1);
        h.clear();
        assert!(h.is_empty());
    }
}
