//! Unit tests for the temporal module
//!
//! Tests cover CoverageWindow construction and extension, plus the
//! fixed and system clocks.

use chrono::{Duration, TimeZone, Utc};
use core_kernel::temporal::{add_months, TemporalError};
use core_kernel::{Clock, CoverageWindow, FixedClock, SystemClock};

mod coverage_window {
    use super::*;

    mod creation {
        use super::*;

        #[test]
        fn test_new_creates_window() {
            let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
            let end = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
            let window = CoverageWindow::new(start, end).unwrap();

            assert_eq!(window.start, start);
            assert_eq!(window.end, end);
        }

        #[test]
        fn test_new_fails_when_start_after_end() {
            let start = Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap();
            let end = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

            assert!(matches!(
                CoverageWindow::new(start, end),
                Err(TemporalError::InvalidWindow { .. })
            ));
        }
    }

    mod containment {
        use super::*;

        #[test]
        fn test_has_ended_only_after_end() {
            let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
            let end = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
            let window = CoverageWindow::new(start, end).unwrap();

            assert!(!window.has_ended(end));
            assert!(window.has_ended(end + Duration::milliseconds(1)));
        }
    }

    mod extension {
        use super::*;

        #[test]
        fn test_extend_one_month() {
            let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
            let end = Utc.with_ymd_and_hms(2025, 3, 15, 10, 0, 0).unwrap();
            let window = CoverageWindow::new(start, end).unwrap();

            let extended = window.extend_months(1).unwrap();
            assert_eq!(extended.end, Utc.with_ymd_and_hms(2025, 4, 15, 10, 0, 0).unwrap());
        }

        #[test]
        fn test_extend_across_leap_february() {
            let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
            assert_eq!(
                add_months(end, 1).unwrap(),
                Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
            );
        }

        #[test]
        fn test_extend_twelve_months() {
            let end = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
            assert_eq!(
                add_months(end, 12).unwrap(),
                Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap()
            );
        }
    }
}

mod clocks {
    use super::*;

    #[test]
    fn test_fixed_clock_is_stable_until_moved() {
        let at = Utc.with_ymd_and_hms(2025, 5, 5, 5, 5, 5).unwrap();
        let clock = FixedClock::new(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);

        let later = at + Duration::days(31);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn test_fixed_clock_can_move_backwards() {
        let at = Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0).unwrap();
        let clock = FixedClock::new(at);
        clock.advance(Duration::hours(-1));
        assert_eq!(clock.now(), at - Duration::hours(1));
    }

    #[test]
    fn test_system_clock_tracks_wall_time() {
        let before = Utc::now();
        let now = SystemClock.now();
        assert!(now >= before);
    }
}
