//! Half-open interval arithmetic used by the lease rules.

use chrono::{DateTime, Utc};

/// Returns true when `[a_start, a_end)` and `[b_start, b_end)` share at least
/// one instant. Abutting ranges (`a_end == b_start`) do not overlap.
pub fn overlaps<T: PartialOrd>(a_start: &T, a_end: &T, b_start: &T, b_end: &T) -> bool {
    a_start < b_end && b_start < a_end
}

/// A lease period `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LeaseWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// An empty or inverted window cannot hold a tenancy.
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    pub fn overlaps(&self, other: &LeaseWindow) -> bool {
        overlaps(&self.start, &self.end, &other.start, &other.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn window(from: (i32, u32, u32), to: (i32, u32, u32)) -> LeaseWindow {
        LeaseWindow::new(day(from.0, from.1, from.2), day(to.0, to.1, to.2))
    }

    #[test]
    fn test_partial_overlap_is_detected_both_ways() {
        let existing = window((2024, 1, 1), (2024, 6, 1));
        let candidate = window((2024, 3, 1), (2024, 9, 1));

        assert!(existing.overlaps(&candidate));
        assert!(candidate.overlaps(&existing));
    }

    #[test]
    fn test_abutting_windows_do_not_overlap() {
        let existing = window((2024, 1, 1), (2024, 6, 1));
        let next = window((2024, 6, 1), (2024, 12, 1));
        let previous = window((2023, 6, 1), (2024, 1, 1));

        assert!(!existing.overlaps(&next));
        assert!(!next.overlaps(&existing));
        assert!(!existing.overlaps(&previous));
    }

    #[test]
    fn test_containment_counts_as_overlap() {
        let year = window((2024, 1, 1), (2025, 1, 1));
        let march = window((2024, 3, 1), (2024, 4, 1));

        assert!(year.overlaps(&march));
        assert!(march.overlaps(&year));
        assert!(year.overlaps(&year));
    }

    #[test]
    fn test_overlap_matches_definition_on_integers() {
        // Small exhaustive sweep over valid half-open ranges in [0, 6)
        for a_start in 0..6 {
            for a_end in (a_start + 1)..=6 {
                for b_start in 0..6 {
                    for b_end in (b_start + 1)..=6 {
                        let shares_point = (a_start..a_end).any(|p| (b_start..b_end).contains(&p));
                        assert_eq!(
                            overlaps(&a_start, &a_end, &b_start, &b_end),
                            shares_point,
                            "[{a_start},{a_end}) vs [{b_start},{b_end})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_window_validity() {
        assert!(window((2024, 1, 1), (2024, 1, 2)).is_valid());
        assert!(!window((2024, 1, 1), (2024, 1, 1)).is_valid());
        assert!(!window((2024, 2, 1), (2024, 1, 1)).is_valid());
    }
}
