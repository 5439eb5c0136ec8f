//! Per-property availability calendars.
//!
//! A calendar is logically a sparse set of open day indices. It is packed as
//! a map from word index to a 64-day bit word, so point queries and updates
//! touch one word and storage stays proportional to the days actually
//! opened. Days never touched are closed.

use nest_core::DayIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const WORD_BITS: i64 = 64;

const fn word_and_bit(day: DayIndex) -> (i64, u32) {
    (day.div_euclid(WORD_BITS), day.rem_euclid(WORD_BITS) as u32)
}

/// Day-level open/closed calendar for one property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityCalendar {
    words: HashMap<i64, u64>,
}

impl AvailabilityCalendar {
    /// Create a calendar with every day closed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the given day is open for booking.
    #[must_use]
    pub fn is_open(&self, day: DayIndex) -> bool {
        let (word, bit) = word_and_bit(day);
        self.words
            .get(&word)
            .is_some_and(|bits| bits & (1u64 << bit) != 0)
    }

    /// Set every day in `[start, end)` to `open`.
    ///
    /// Idempotent: re-setting a day to its current value succeeds and
    /// changes nothing. An empty or inverted range is a no-op; callers
    /// validate ordering before delegating here.
    pub fn set_range(&mut self, start: DayIndex, end: DayIndex, open: bool) {
        for day in start..end {
            self.set_day(day, open);
        }
    }

    /// One boolean per day in `[start, end)`, in order.
    #[must_use]
    pub fn query_range(&self, start: DayIndex, end: DayIndex) -> Vec<bool> {
        (start..end).map(|day| self.is_open(day)).collect()
    }

    /// Whether every day in `[start, end)` is open.
    ///
    /// Returns the first closed day on failure.
    pub(crate) fn first_closed(&self, start: DayIndex, end: DayIndex) -> Option<DayIndex> {
        (start..end).find(|&day| !self.is_open(day))
    }

    fn set_day(&mut self, day: DayIndex, open: bool) {
        let (word, bit) = word_and_bit(day);
        if open {
            *self.words.entry(word).or_insert(0) |= 1u64 << bit;
        } else if let Some(bits) = self.words.get_mut(&word) {
            *bits &= !(1u64 << bit);
            // Drop emptied words so storage tracks the open set
            if *bits == 0 {
                self.words.remove(&word);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn days_default_to_closed() {
        let calendar = AvailabilityCalendar::new();
        assert!(!calendar.is_open(0));
        assert!(!calendar.is_open(1_000_000));
        assert!(!calendar.is_open(-50));
    }

    #[test]
    fn set_range_opens_exactly_the_half_open_range() {
        let mut calendar = AvailabilityCalendar::new();
        calendar.set_range(10, 15, true);

        assert!(!calendar.is_open(9));
        for day in 10..15 {
            assert!(calendar.is_open(day), "day {day} should be open");
        }
        assert!(!calendar.is_open(15));
    }

    #[test]
    fn set_range_closes_again() {
        let mut calendar = AvailabilityCalendar::new();
        calendar.set_range(10, 20, true);
        calendar.set_range(12, 14, false);

        assert_eq!(
            calendar.query_range(10, 16),
            vec![true, true, false, false, true, true]
        );
    }

    #[test]
    fn set_range_is_idempotent() {
        let mut calendar = AvailabilityCalendar::new();
        calendar.set_range(5, 8, true);
        let snapshot = calendar.clone();

        calendar.set_range(5, 8, true);
        assert_eq!(calendar, snapshot);

        calendar.set_range(100, 110, false);
        assert_eq!(calendar, snapshot);
    }

    #[test]
    fn inverted_range_is_a_no_op() {
        let mut calendar = AvailabilityCalendar::new();
        calendar.set_range(20, 10, true);
        assert_eq!(calendar, AvailabilityCalendar::new());
    }

    #[test]
    fn ranges_spanning_word_boundaries() {
        let mut calendar = AvailabilityCalendar::new();
        // 60..70 crosses the word boundary at day 64
        calendar.set_range(60, 70, true);

        for day in 60..70 {
            assert!(calendar.is_open(day), "day {day} should be open");
        }
        assert!(!calendar.is_open(59));
        assert!(!calendar.is_open(70));
    }

    #[test]
    fn negative_day_indices_work() {
        let mut calendar = AvailabilityCalendar::new();
        calendar.set_range(-5, 3, true);

        assert_eq!(calendar.query_range(-6, 4).iter().filter(|b| **b).count(), 8);
        assert!(!calendar.is_open(-6));
        assert!(calendar.is_open(-1));
        assert!(!calendar.is_open(3));
    }

    #[test]
    fn first_closed_finds_the_gap() {
        let mut calendar = AvailabilityCalendar::new();
        calendar.set_range(10, 15, true);
        calendar.set_range(12, 13, false);

        assert_eq!(calendar.first_closed(10, 15), Some(12));
        assert_eq!(calendar.first_closed(10, 12), None);
        assert_eq!(calendar.first_closed(13, 15), None);
    }

    #[test]
    fn closing_everything_frees_storage() {
        let mut calendar = AvailabilityCalendar::new();
        calendar.set_range(0, 200, true);
        calendar.set_range(0, 200, false);

        assert_eq!(calendar, AvailabilityCalendar::new());
    }

    #[test]
    fn query_range_length_matches_day_count() {
        let mut calendar = AvailabilityCalendar::new();
        calendar.set_range(3, 5, true);

        let range = calendar.query_range(0, 10);
        assert_eq!(range.len(), 10);
        assert_eq!(range, vec![
            false, false, false, true, true, false, false, false, false, false
        ]);
    }

    proptest! {
        /// A day's final state is the last write covering it, regardless of
        /// how earlier writes overlapped.
        #[test]
        fn last_write_wins(
            writes in prop::collection::vec((0i64..200, 0i64..200, any::<bool>()), 0..24),
            probe in 0i64..200,
        ) {
            let mut calendar = AvailabilityCalendar::new();
            for &(a, b, open) in &writes {
                calendar.set_range(a, b, open);
            }

            let expected = writes
                .iter()
                .rev()
                .find(|&&(a, b, _)| a <= probe && probe < b)
                .is_some_and(|&(_, _, open)| open);
            prop_assert_eq!(calendar.is_open(probe), expected);
        }

        /// Untouched days stay closed no matter what happens elsewhere.
        #[test]
        fn untouched_days_stay_closed(
            writes in prop::collection::vec((0i64..100, 0i64..100, any::<bool>()), 0..16),
            probe in 100i64..500,
        ) {
            let mut calendar = AvailabilityCalendar::new();
            for &(a, b, open) in &writes {
                calendar.set_range(a, b, open);
            }
            prop_assert!(!calendar.is_open(probe));
        }
    }
}
