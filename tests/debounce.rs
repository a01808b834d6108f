// tests/debounce.rs

use std::time::{Duration, Instant};

use proptest::prelude::*;
use relaunch::watch::Debouncer;

#[test]
fn first_event_is_always_accepted() {
    let mut debouncer = Debouncer::new(Duration::from_secs(60));
    assert!(debouncer.accept(Instant::now()));
}

#[test]
fn events_inside_window_are_coalesced() {
    let t = Duration::from_millis(200);
    let t0 = Instant::now();
    let mut debouncer = Debouncer::new(t);

    assert!(debouncer.accept(t0));
    assert!(!debouncer.accept(t0 + t / 2));
    assert!(debouncer.accept(t0 + t));
    assert!(debouncer.accept(t0 + 2 * t));
}

#[test]
fn rejected_events_do_not_move_the_window() {
    let t = Duration::from_millis(100);
    let t0 = Instant::now();
    let mut debouncer = Debouncer::new(t);

    assert!(debouncer.accept(t0));
    assert!(!debouncer.accept(t0 + Duration::from_millis(60)));
    assert!(!debouncer.accept(t0 + Duration::from_millis(90)));
    assert!(debouncer.accept(t0 + Duration::from_millis(100)));
}

#[test]
fn zero_threshold_accepts_everything() {
    let t0 = Instant::now();
    let mut debouncer = Debouncer::new(Duration::ZERO);
    assert!(debouncer.accept(t0));
    assert!(debouncer.accept(t0));
    assert!(debouncer.accept(t0 + Duration::from_nanos(1)));
}

#[test]
fn earlier_timestamp_is_coalesced() {
    let t0 = Instant::now() + Duration::from_secs(1);
    let mut debouncer = Debouncer::new(Duration::from_millis(10));
    assert!(debouncer.accept(t0));
    assert!(!debouncer.accept(t0 - Duration::from_millis(500)));
}

proptest! {
    #[test]
    fn accepted_events_are_at_least_threshold_apart(
        threshold_ms in 1u64..500,
        offsets in proptest::collection::vec(0u64..5_000, 1..40)
    ) {
        let mut offsets = offsets;
        offsets.sort_unstable();
        let t0 = Instant::now();
        let threshold = Duration::from_millis(threshold_ms);
        let mut debouncer = Debouncer::new(threshold);

        let accepted: Vec<u64> = offsets
            .iter()
            .copied()
            .filter(|ms| debouncer.accept(t0 + Duration::from_millis(*ms)))
            .collect();

        prop_assert_eq!(accepted.first().copied(), offsets.first().copied());
        for pair in accepted.windows(2) {
            prop_assert!(pair[1] - pair[0] >= threshold_ms);
        }
    }
}
