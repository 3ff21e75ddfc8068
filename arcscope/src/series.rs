//! Filtered, binary-searchable view over one event list
//!
//! An [`EventSeries`] references a time-ascending event slice shared with the
//! model and an inclusive `[type_min, type_max]` code filter. The only
//! primitive that understands the filter is [`EventSeries::next_matching_index`];
//! every other query is built on it.
//!
//! # Query Semantics
//!
//! ```text
//! events:   A(10)  x(15)  B(20)  C(30)        x = filtered out
//! nearest_index(16)     -> B
//! first_at_or_after(21) -> C
//! last_at_or_before(21) -> B
//! ```

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use std::sync::Arc;

use crate::domain::Micros;
use crate::trace_model::Event;

/// Scan direction for [`EventSeries::next_matching_index`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn step(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Immutable filtered view over a shared event list
#[derive(Debug, Clone)]
pub struct EventSeries {
    events: Arc<[Event]>,
    type_min: u32,
    type_max: u32,
}

impl EventSeries {
    /// Wrap `events` with an inclusive type range.
    ///
    /// `events` must be time-ascending; the model loader guarantees this.
    #[must_use]
    pub fn new(events: Arc<[Event]>, type_min: u32, type_max: u32) -> Self {
        Self { events, type_min, type_max }
    }

    /// Wrap `events` with a `(min, max)` range constant from `arcscope_common`.
    #[must_use]
    pub fn with_range(events: Arc<[Event]>, range: (u32, u32)) -> Self {
        Self::new(events, range.0, range.1)
    }

    /// All events, including those filtered out
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Event at a raw index returned by one of the queries.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn event(&self, index: usize) -> &Event {
        &self.events[index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn type_range(&self) -> (u32, u32) {
        (self.type_min, self.type_max)
    }

    /// Whether `event` passes the type filter
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        (self.type_min..=self.type_max).contains(&event.code())
    }

    /// True when both series view the same underlying list
    #[must_use]
    pub fn shares_events(&self, other: &EventSeries) -> bool {
        Arc::ptr_eq(&self.events, &other.events)
    }

    /// Next matching index strictly after (or before) `from`.
    ///
    /// `from` may be `-1` (before the first event) or `len()` (after the last)
    /// to start a scan from either end.
    #[must_use]
    pub fn next_matching_index(&self, from: isize, direction: Direction) -> Option<usize> {
        let len = self.events.len() as isize;
        let step = direction.step();
        let mut index = from + step;
        while (0..len).contains(&index) {
            if self.matches(&self.events[index as usize]) {
                return Some(index as usize);
            }
            index += step;
        }
        None
    }

    /// Index of the matching event closest in time to `timestamp`.
    ///
    /// Ties go to the earlier event: a timestamp exactly halfway between two
    /// matching events returns the one before it (`diff_before <= diff_after`).
    #[must_use]
    pub fn nearest_index(&self, timestamp: Micros) -> Option<usize> {
        // First raw position at or after the timestamp brackets the search.
        let split = self.events.partition_point(|e| e.timestamp < timestamp) as isize;
        let before = self.next_matching_index(split, Direction::Backward);
        let after = self.next_matching_index(split - 1, Direction::Forward);

        match (before, after) {
            (Some(b), Some(a)) => {
                let diff_before = timestamp - self.events[b].timestamp;
                let diff_after = self.events[a].timestamp - timestamp;
                if diff_before <= diff_after {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (before, after) => before.or(after),
        }
    }

    /// First matching event with `timestamp >= timestamp`
    #[must_use]
    pub fn first_at_or_after(&self, timestamp: Micros) -> Option<usize> {
        let index = self.nearest_index(timestamp)?;
        if self.events[index].timestamp < timestamp {
            self.next_matching_index(index as isize, Direction::Forward)
        } else {
            Some(index)
        }
    }

    /// Last matching event with `timestamp <= timestamp`
    #[must_use]
    pub fn last_at_or_before(&self, timestamp: Micros) -> Option<usize> {
        let index = self.nearest_index(timestamp)?;
        if self.events[index].timestamp > timestamp {
            self.next_matching_index(index as isize, Direction::Backward)
        } else {
            Some(index)
        }
    }

    /// Matching indices starting at `start`, moving forward
    pub fn matching_from(&self, start: Option<usize>) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(start, move |&i| {
            self.next_matching_index(i as isize, Direction::Forward)
        })
    }

    /// Matching indices with timestamps inside `[min, max]`
    pub fn window_indices(&self, min: Micros, max: Micros) -> impl Iterator<Item = usize> + '_ {
        self.matching_from(self.first_at_or_after(min))
            .take_while(move |&i| self.events[i].timestamp <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcscope_common::EventKind;

    fn series(events: &[(EventKind, Micros)], range: (u32, u32)) -> EventSeries {
        let events: Vec<Event> = events.iter().map(|&(k, t)| Event::new(k, t)).collect();
        EventSeries::with_range(Arc::from(events), range)
    }

    /// Filtered: 100@0, 101@10, 103@30, 100@50 (IdleIn events in between are filtered out)
    fn mixed() -> EventSeries {
        series(
            &[
                (EventKind::BufferQueueDequeueStart, 0),
                (EventKind::IdleIn, 5),
                (EventKind::BufferQueueDequeueDone, 10),
                (EventKind::IdleIn, 20),
                (EventKind::BufferQueueQueueDone, 30),
                (EventKind::IdleIn, 40),
                (EventKind::BufferQueueDequeueStart, 50),
            ],
            (100, 103),
        )
    }

    #[test]
    fn test_empty_series() {
        let s = series(&[], (0, 10_000));
        assert_eq!(s.nearest_index(5), None);
        assert_eq!(s.first_at_or_after(5), None);
        assert_eq!(s.last_at_or_before(5), None);
        assert_eq!(s.next_matching_index(-1, Direction::Forward), None);
    }

    #[test]
    fn test_no_matching_events_behaves_as_empty() {
        let s = series(&[(EventKind::IdleIn, 0), (EventKind::IdleOut, 10)], (100, 103));
        assert_eq!(s.nearest_index(5), None);
    }

    #[test]
    fn test_single_element_always_nearest() {
        let s = series(&[(EventKind::ChromeOsDraw, 100)], (500, 505));
        assert_eq!(s.nearest_index(-1_000_000), Some(0));
        assert_eq!(s.nearest_index(100), Some(0));
        assert_eq!(s.nearest_index(1_000_000), Some(0));
    }

    #[test]
    fn test_next_matching_from_sentinels() {
        let s = mixed();
        assert_eq!(s.next_matching_index(-1, Direction::Forward), Some(0));
        assert_eq!(s.next_matching_index(s.len() as isize, Direction::Backward), Some(6));
        assert_eq!(s.next_matching_index(0, Direction::Forward), Some(2));
        assert_eq!(s.next_matching_index(4, Direction::Backward), Some(2));
        assert_eq!(s.next_matching_index(6, Direction::Forward), None);
        assert_eq!(s.next_matching_index(0, Direction::Backward), None);
    }

    #[test]
    fn test_nearest_skips_filtered_events() {
        let s = mixed();
        // IdleIn at 20 is closest in raw terms but filtered out.
        assert_eq!(s.nearest_index(21), Some(4));
        assert_eq!(s.nearest_index(19), Some(2));
    }

    #[test]
    fn test_nearest_tie_prefers_earlier() {
        let s = mixed();
        // 20 is 10 away from both 10 and 30.
        assert_eq!(s.nearest_index(20), Some(2));
    }

    #[test]
    fn test_first_and_last_around_timestamp() {
        let s = mixed();
        assert_eq!(s.first_at_or_after(11), Some(4));
        assert_eq!(s.first_at_or_after(10), Some(2));
        assert_eq!(s.last_at_or_before(29), Some(2));
        assert_eq!(s.last_at_or_before(30), Some(4));
        assert_eq!(s.first_at_or_after(51), None);
        assert_eq!(s.last_at_or_before(-1), None);
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let s = mixed();
        for t in -20..80 {
            let found = s.nearest_index(t).unwrap();
            assert!(s.matches(s.event(found)));
            let best = (0..s.len())
                .filter(|&i| s.matches(s.event(i)))
                .map(|i| (s.event(i).timestamp - t).abs())
                .min()
                .unwrap();
            assert_eq!((s.event(found).timestamp - t).abs(), best, "t={t}");
        }
    }

    #[test]
    fn test_first_then_last_does_not_move_forward() {
        let s = mixed();
        for t in -20..80 {
            if let Some(first) = s.first_at_or_after(t) {
                assert!(s.event(first).timestamp >= t);
                let back = s.last_at_or_before(s.event(first).timestamp).unwrap();
                assert!(back <= first, "t={t}");
            }
        }
    }

    #[test]
    fn test_window_indices() {
        let s = mixed();
        let inside: Vec<usize> = s.window_indices(5, 30).collect();
        assert_eq!(inside, vec![2, 4]);
        assert_eq!(s.window_indices(60, 100).count(), 0);
    }

    #[test]
    fn test_shares_events() {
        let s = mixed();
        let same = EventSeries::new(Arc::clone(&s.events), 0, 0);
        assert!(s.shares_events(&same));
        assert!(!s.shares_events(&mixed()));
    }
}
