//! Sequence classification
//!
//! A sequence is one pipeline traversal, e.g. dequeue → fill → queue →
//! compose → present. Whether an event closes its sequence is decided by a
//! static table of terminator sets keyed by event code:
//!
//! - no entry: the event is mid-sequence
//! - empty set: the event always ends the sequence
//! - non-empty set: the event ends the sequence only if the next matching
//!   event in the same series is in the set, or if no event follows
//!
//! The default table mirrors [`arcscope_common::EventKind::terminators`] and is
//! part of the contract with the trace producer.

#![allow(clippy::cast_possible_wrap)]

use arcscope_common::EventKind;
use std::collections::HashMap;

use crate::series::{Direction, EventSeries};

/// Terminator sets keyed by event code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminatorTable {
    entries: HashMap<u32, Vec<u32>>,
}

impl TerminatorTable {
    /// A table in which nothing ends a sequence
    #[must_use]
    pub fn empty() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Add or replace the terminator set of `code`
    #[must_use]
    pub fn with_entry(mut self, code: u32, terminators: &[u32]) -> Self {
        self.entries.insert(code, terminators.to_vec());
        self
    }

    /// Terminator set of `code`, if it has an entry
    #[must_use]
    pub fn terminators(&self, code: u32) -> Option<&[u32]> {
        self.entries.get(&code).map(Vec::as_slice)
    }
}

impl Default for TerminatorTable {
    fn default() -> Self {
        let entries = EventKind::ALL
            .iter()
            .filter_map(|kind| {
                kind.terminators()
                    .map(|set| (kind.code(), set.iter().map(|k| k.code()).collect()))
            })
            .collect();
        Self { entries }
    }
}

/// Decides where sequences end within a series
#[derive(Debug, Clone, Default)]
pub struct SequenceClassifier {
    table: TerminatorTable,
}

impl SequenceClassifier {
    #[must_use]
    pub fn new(table: TerminatorTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &TerminatorTable {
        &self.table
    }

    /// Whether the event at `index` closes its sequence.
    #[must_use]
    pub fn is_sequence_end(&self, series: &EventSeries, index: usize) -> bool {
        let Some(terminators) = self.table.terminators(series.event(index).code()) else {
            return false;
        };
        if terminators.is_empty() {
            return true;
        }
        // A trailing open sequence counts as ended.
        series
            .next_matching_index(index as isize, Direction::Forward)
            .map_or(true, |next| terminators.contains(&series.event(next).code()))
    }

    /// First event of the non-idle sequence containing `index`.
    ///
    /// Walks backward while the previous matching event does not end a
    /// sequence.
    #[must_use]
    pub fn sequence_start(&self, series: &EventSeries, index: usize) -> usize {
        let mut start = index;
        while let Some(prev) = series.next_matching_index(start as isize, Direction::Backward) {
            if self.is_sequence_end(series, prev) {
                break;
            }
            start = prev;
        }
        start
    }

    /// Matching indices from `start` up to and including the first sequence end.
    #[must_use]
    pub fn sequence_from(&self, series: &EventSeries, start: usize) -> Vec<usize> {
        let mut indices = Vec::new();
        for index in series.matching_from(Some(start)) {
            indices.push(index);
            if self.is_sequence_end(series, index) {
                break;
            }
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace_model::Event;
    use std::sync::Arc;

    fn series(kinds: &[EventKind], range: (u32, u32)) -> EventSeries {
        let events: Vec<Event> =
            kinds.iter().enumerate().map(|(i, &k)| Event::new(k, i as i64 * 10)).collect();
        EventSeries::with_range(Arc::from(events), range)
    }

    #[test]
    fn test_default_table_matches_contract() {
        let table = TerminatorTable::default();
        assert_eq!(table.terminators(0), Some(&[][..]));
        assert_eq!(table.terminators(103), Some(&[][..]));
        assert_eq!(table.terminators(504), Some(&[500, 501][..]));
        assert_eq!(table.terminators(100), None);
    }

    #[test]
    fn test_empty_set_always_ends() {
        let classifier = SequenceClassifier::default();
        let s = series(
            &[EventKind::BufferQueueQueueDone, EventKind::BufferQueueDequeueStart],
            (100, 106),
        );
        assert!(classifier.is_sequence_end(&s, 0));
    }

    #[test]
    fn test_absent_entry_never_ends() {
        let classifier = SequenceClassifier::default();
        let s = series(&[EventKind::BufferQueueDequeueStart], (100, 106));
        // Even as the last event.
        assert!(!classifier.is_sequence_end(&s, 0));
    }

    #[test]
    fn test_successor_set_depends_on_next_matching() {
        let classifier = SequenceClassifier::default();
        let s = series(
            &[
                EventKind::ChromeOsSwapDone,
                EventKind::ChromeOsPresentationDone,
                EventKind::ChromeOsSwapDone,
                EventKind::IdleIn, // filtered out
                EventKind::ChromeOsDraw,
                EventKind::ChromeOsSwapDone,
            ],
            (500, 505),
        );
        assert!(!classifier.is_sequence_end(&s, 0), "followed by presentation done");
        assert!(classifier.is_sequence_end(&s, 2), "next matching is a draw");
        assert!(classifier.is_sequence_end(&s, 5), "nothing follows");
    }

    #[test]
    fn test_custom_table() {
        let classifier = SequenceClassifier::new(TerminatorTable::empty().with_entry(101, &[]));
        let s = series(&[EventKind::BufferQueueDequeueDone, EventKind::BufferQueueQueueDone], (100, 106));
        assert!(classifier.is_sequence_end(&s, 0));
        assert!(!classifier.is_sequence_end(&s, 1));
    }

    #[test]
    fn test_sequence_start_and_walk() {
        let classifier = SequenceClassifier::default();
        let s = series(
            &[
                EventKind::BufferQueueDequeueStart,
                EventKind::BufferQueueDequeueDone,
                EventKind::BufferQueueQueueDone,
                EventKind::BufferQueueDequeueStart,
                EventKind::BufferQueueDequeueDone,
                EventKind::BufferQueueQueueStart,
                EventKind::BufferQueueQueueDone,
                EventKind::BufferQueueDequeueStart,
            ],
            (100, 106),
        );
        assert_eq!(classifier.sequence_start(&s, 5), 3);
        assert_eq!(classifier.sequence_start(&s, 1), 0);
        assert_eq!(classifier.sequence_from(&s, 3), vec![3, 4, 5, 6]);
        // Open trailing sequence runs to the end.
        assert_eq!(classifier.sequence_from(&s, 7), vec![7]);
    }
}
