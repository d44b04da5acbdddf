// Time slot value type
//
// A reservation occupies a half-open [start, end) window on a single
// calendar day. All conflict checks in the crate reduce to the overlap
// predicate defined here.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

/// Error returned when a time slot is constructed with a non-positive range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("end time {end} must be after start time {start}")]
pub struct InvalidInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// A date plus a half-open [start, end) time-of-day window
///
/// Immutable by construction: `new` is the only way to obtain a value and
/// rejects `end <= start`, so every `TimeSlot` in the system has a
/// positive duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    /// Create a time slot, rejecting empty or inverted ranges
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self, InvalidInterval> {
        if end <= start {
            return Err(InvalidInterval { start, end });
        }
        Ok(Self { date, start, end })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Whether two slots occupy overlapping time on the same day
    ///
    /// Half-open semantics: a slot ending at 20:00 does not overlap one
    /// starting at 20:00, so back-to-back bookings are legal. Slots on
    /// different dates never overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.date == other.date && self.start < other.end && other.start < self.end
    }

    /// Slot length in whole minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(start: (u32, u32), end: (u32, u32)) -> TimeSlot {
        TimeSlot::new(date(), time(start.0, start.1), time(end.0, end.1)).unwrap()
    }

    #[test]
    fn test_rejects_inverted_range() {
        let result = TimeSlot::new(date(), time(20, 0), time(18, 0));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_range() {
        let result = TimeSlot::new(date(), time(18, 0), time(18, 0));
        assert!(result.is_err());
    }

    #[test]
    fn test_contained_slot_overlaps() {
        assert!(slot((18, 0), (20, 0)).overlaps(&slot((18, 30), (19, 30))));
    }

    #[test]
    fn test_partial_overlap() {
        assert!(slot((18, 0), (20, 0)).overlaps(&slot((19, 0), (21, 0))));
        assert!(slot((19, 0), (21, 0)).overlaps(&slot((18, 0), (20, 0))));
    }

    #[test]
    fn test_touching_endpoints_do_not_overlap() {
        assert!(!slot((18, 0), (20, 0)).overlaps(&slot((20, 0), (22, 0))));
        assert!(!slot((20, 0), (22, 0)).overlaps(&slot((18, 0), (20, 0))));
    }

    #[test]
    fn test_disjoint_slots_do_not_overlap() {
        assert!(!slot((10, 0), (11, 0)).overlaps(&slot((14, 0), (15, 0))));
    }

    #[test]
    fn test_different_dates_never_overlap() {
        let other_date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let a = slot((18, 0), (20, 0));
        let b = TimeSlot::new(other_date, time(18, 0), time(20, 0)).unwrap();
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_duration_minutes() {
        assert_eq!(slot((10, 0), (11, 30)).duration_minutes(), 90);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn minute_strategy() -> impl Strategy<Value = NaiveTime> {
        (0u32..1439).prop_map(|m| NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap())
    }

    fn slot_strategy() -> impl Strategy<Value = TimeSlot> {
        (minute_strategy(), minute_strategy())
            .prop_filter("start must precede end", |(a, b)| a != b)
            .prop_map(|(a, b)| {
                let (start, end) = if a < b { (a, b) } else { (b, a) };
                TimeSlot::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), start, end).unwrap()
            })
    }

    /// Overlap is symmetric
    #[test]
    fn prop_overlap_is_symmetric() {
        proptest!(|(a in slot_strategy(), b in slot_strategy())| {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        });
    }

    /// Every slot overlaps itself
    #[test]
    fn prop_overlap_is_reflexive() {
        proptest!(|(a in slot_strategy())| {
            prop_assert!(a.overlaps(&a));
        });
    }

    /// Overlap agrees with the half-open interval definition
    #[test]
    fn prop_overlap_matches_definition() {
        proptest!(|(a in slot_strategy(), b in slot_strategy())| {
            let expected = a.start() < b.end() && b.start() < a.end();
            prop_assert_eq!(a.overlaps(&b), expected);
        });
    }

    /// Adjacent slots sharing a boundary never overlap
    #[test]
    fn prop_adjacent_slots_never_overlap() {
        proptest!(|(a in slot_strategy(), extent in 1u32..120)| {
            let date = a.date();
            let boundary = a.end();
            let end_minutes =
                chrono::Timelike::hour(&boundary) * 60 + chrono::Timelike::minute(&boundary);
            let later = (end_minutes + extent).min(1439);
            if later > end_minutes {
                let next = TimeSlot::new(
                    date,
                    boundary,
                    NaiveTime::from_hms_opt(later / 60, later % 60, 0).unwrap(),
                )
                .unwrap();
                prop_assert!(!a.overlaps(&next));
            }
        });
    }
}
