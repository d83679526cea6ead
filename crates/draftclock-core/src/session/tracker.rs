use chrono::{DateTime, Utc};

/// High-water-mark bookkeeping behind the stall clock.
///
/// Only growth past the previous peak counts as productive: deleting text and
/// retyping it back up to the old peak earns nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StallTracker {
    high_water_mark: usize,
    last_productive: DateTime<Utc>,
}

impl StallTracker {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            high_water_mark: 0,
            last_productive: now,
        }
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    pub fn last_productive(&self) -> DateTime<Utc> {
        self.last_productive
    }

    /// Record the surface length seen at `now`. Returns true when it was
    /// productive (beyond the previous peak).
    pub fn observe(&mut self, len: usize, now: DateTime<Utc>) -> bool {
        if len <= self.high_water_mark {
            return false;
        }
        self.last_productive = self.last_productive.max(now);
        self.high_water_mark = len;
        true
    }

    /// Seconds of stalling left. The `+ 1` absorbs the 1 s tick granularity.
    pub fn remaining_grace(&self, grace_seconds: u32, now: DateTime<Utc>) -> i64 {
        let idle = (now - self.last_productive).num_seconds();
        i64::from(grace_seconds) - idle + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(secs)
    }

    #[test]
    fn grace_counts_down_without_progress() {
        let tracker = StallTracker::new(at(0));
        assert_eq!(tracker.remaining_grace(5, at(0)), 6);
        assert_eq!(tracker.remaining_grace(5, at(1)), 5);
        assert_eq!(tracker.remaining_grace(5, at(6)), 0);
    }

    #[test]
    fn productive_edit_resets_grace() {
        let mut tracker = StallTracker::new(at(0));
        assert!(tracker.observe(3, at(4)));
        assert_eq!(tracker.remaining_grace(5, at(4)), 6);
    }

    #[test]
    fn exceeding_old_peak_by_one_counts() {
        let mut tracker = StallTracker::new(at(0));
        tracker.observe(10, at(1));
        assert!(!tracker.observe(4, at(2)));
        assert!(!tracker.observe(10, at(3)));
        assert_eq!(tracker.last_productive(), at(1));
        assert!(tracker.observe(11, at(4)));
        assert_eq!(tracker.last_productive(), at(4));
    }

    proptest! {
        #[test]
        fn insert_only_edits_always_count(steps in prop::collection::vec(1usize..20, 1..40)) {
            let mut tracker = StallTracker::new(at(0));
            let mut len = 0;
            for (i, grow) in steps.iter().enumerate() {
                len += grow;
                let now = at(i as i64 + 1);
                prop_assert!(tracker.observe(len, now));
                prop_assert_eq!(tracker.last_productive(), now);
            }
            prop_assert_eq!(tracker.high_water_mark(), len);
        }

        #[test]
        fn retyping_up_to_old_peak_earns_nothing(
            peak in 1usize..500,
            cut in 1usize..500,
            retyped in prop::collection::vec(0usize..500, 1..20),
        ) {
            let cut = cut.min(peak);
            let mut tracker = StallTracker::new(at(0));
            tracker.observe(peak, at(1));
            tracker.observe(peak - cut, at(2));
            for (i, len) in retyped.iter().enumerate() {
                tracker.observe((*len).min(peak), at(i as i64 + 3));
            }
            prop_assert_eq!(tracker.last_productive(), at(1));
            prop_assert_eq!(tracker.high_water_mark(), peak);
        }

        #[test]
        fn high_water_mark_never_decreases(lens in prop::collection::vec(0usize..1000, 1..60)) {
            let mut tracker = StallTracker::new(at(0));
            let mut prev = 0;
            for (i, len) in lens.iter().enumerate() {
                tracker.observe(*len, at(i as i64));
                prop_assert!(tracker.high_water_mark() >= prev);
                prev = tracker.high_water_mark();
            }
            prop_assert_eq!(prev, lens.iter().copied().max().unwrap_or(0));
        }
    }
}
