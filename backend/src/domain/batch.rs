//! Session-scoped running list for the batch ("several volumes") flow.
//!
//! A convenience view, not a source of truth: a crash or logout loses the
//! list while the underlying record log keeps every entry.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::scan::ScanCode;

/// One line of the on-screen batch list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    /// Position within the current batch, starting at 1.
    pub sequence: u64,
    /// First scanned code.
    #[schema(value_type = String)]
    pub transport: ScanCode,
    /// Second scanned code.
    #[schema(value_type = String)]
    pub order: ScanCode,
    /// Whether the item went through the override path.
    pub divergent: bool,
}

/// In-memory tracker for the current batch.
///
/// Sequence numbers increase monotonically within a batch and are never
/// reused; a reset clears the items and the counter, so the next batch
/// numbers from 1 again.
#[derive(Debug, Default)]
pub struct BatchTracker {
    items: Vec<BatchItem>,
    next_sequence: u64,
}

impl BatchTracker {
    /// Start with an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item and return its sequence number.
    pub fn add(&mut self, transport: ScanCode, order: ScanCode, divergent: bool) -> u64 {
        self.next_sequence += 1;
        let sequence = self.next_sequence;
        self.items.push(BatchItem {
            sequence,
            transport,
            order,
            divergent,
        });
        sequence
    }

    /// Clear the items and the sequence counter.
    pub fn reset(&mut self) {
        self.items.clear();
        self.next_sequence = 0;
    }

    /// The most recent `limit` items, oldest first.
    pub fn items(&self, limit: usize) -> &[BatchItem] {
        let start = self.items.len().saturating_sub(limit);
        self.items.get(start..).unwrap_or_default()
    }

    /// Number of items in the current batch.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    fn code(raw: &str) -> ScanCode {
        ScanCode::sanitize(raw)
    }

    #[test]
    fn sequences_start_at_one_and_increase() {
        let mut tracker = BatchTracker::new();
        assert_eq!(tracker.add(code("A1"), code("A1"), false), 1);
        assert_eq!(tracker.add(code("B2"), code("B2"), false), 2);
        assert_eq!(tracker.add(code("C3"), code("D4"), true), 3);
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn reset_clears_items_and_counter() {
        let mut tracker = BatchTracker::new();
        let _ = tracker.add(code("A1"), code("A1"), false);
        let _ = tracker.add(code("B2"), code("B2"), false);
        tracker.reset();
        assert!(tracker.is_empty());
        assert_eq!(tracker.add(code("C3"), code("C3"), false), 1);
    }

    #[test]
    fn items_returns_the_most_recent_window_in_order() {
        let mut tracker = BatchTracker::new();
        for i in 1..=5 {
            let c = code(&format!("V{i}"));
            let _ = tracker.add(c.clone(), c, false);
        }
        let window = tracker.items(2);
        let sequences: Vec<u64> = window.iter().map(|item| item.sequence).collect();
        assert_eq!(sequences, vec![4, 5]);
    }

    #[test]
    fn items_with_a_large_limit_returns_everything() {
        let mut tracker = BatchTracker::new();
        let _ = tracker.add(code("A1"), code("A1"), false);
        assert_eq!(tracker.items(200).len(), 1);
    }

    #[test]
    fn divergent_flag_is_preserved() {
        let mut tracker = BatchTracker::new();
        let _ = tracker.add(code("AAA"), code("BBB"), true);
        let window = tracker.items(10);
        assert!(window.first().expect("one item").divergent);
    }
}
