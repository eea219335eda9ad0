//! Tests for half-open interval math and interval subtraction.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use slot_engine::interval::{subtract_intervals, Interval};

/// Helper: an interval between two UTC wall-clock times on 2026-03-02.
fn iv(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> Interval {
    Interval::new(at(start_hour, start_min), at(end_hour, end_min)).unwrap()
}

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
}

// ── Construction ────────────────────────────────────────────────────────────

#[test]
fn zero_length_interval_is_rejected() {
    assert!(Interval::new(at(10, 0), at(10, 0)).is_none());
}

#[test]
fn inverted_interval_is_rejected() {
    assert!(Interval::new(at(11, 0), at(10, 0)).is_none());
}

#[test]
fn duration_in_minutes() {
    assert_eq!(iv(10, 0, 11, 30).duration_minutes(), 90);
}

#[test]
fn business_day_spans_local_midnight_to_midnight() {
    let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let day = Interval::day(date, &chrono_tz::Asia::Kolkata);

    // IST is UTC+05:30, so local midnight is 18:30 UTC the previous day.
    assert_eq!(day.start(), Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap());
    assert_eq!(day.end(), Utc.with_ymd_and_hms(2026, 3, 2, 18, 30, 0).unwrap());
    assert_eq!(day.duration_minutes(), 1440);
}

#[test]
fn business_day_follows_dst_spring_forward() {
    // 2026-03-08 is the US spring-forward day: 23 hours long.
    let date = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
    let day = Interval::day(date, &chrono_tz::America::New_York);
    assert_eq!(day.duration_minutes(), 23 * 60);
}

// ── Overlap ─────────────────────────────────────────────────────────────────

#[test]
fn overlapping_intervals_detected_both_ways() {
    let a = iv(9, 0, 10, 0);
    let b = iv(9, 30, 10, 30);
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
}

#[test]
fn adjacent_intervals_do_not_overlap() {
    let a = iv(9, 0, 10, 0);
    let b = iv(10, 0, 11, 0);
    assert!(!a.overlaps(&b));
    assert!(!b.overlaps(&a));
}

#[test]
fn interval_overlaps_itself() {
    let a = iv(9, 0, 9, 1);
    assert!(a.overlaps(&a));
}

#[test]
fn contained_interval_overlaps_container() {
    let outer = iv(9, 0, 17, 0);
    let inner = iv(12, 0, 12, 40);
    assert!(outer.overlaps(&inner));
    assert!(outer.covers(&inner));
    assert!(!inner.covers(&outer));
}

#[test]
fn inflate_widens_both_ends() {
    let busy = iv(12, 0, 12, 40).inflate(20);
    assert_eq!(busy.start(), at(11, 40));
    assert_eq!(busy.end(), at(13, 0));
}

#[test]
fn buffer_boundary_is_exclusive() {
    // A candidate ending exactly `buffer` minutes before a busy block is fine;
    // one ending a minute later is not.
    let busy = iv(12, 0, 12, 40).inflate(20);
    assert!(!iv(11, 20, 11, 40).overlaps(&busy));
    assert!(iv(11, 21, 11, 41).overlaps(&busy));
    // Same on the trailing side.
    assert!(!iv(13, 0, 13, 20).overlaps(&busy));
    assert!(iv(12, 59, 13, 19).overlaps(&busy));
}

#[test]
fn clip_to_window() {
    let window = iv(0, 0, 12, 0);
    assert_eq!(iv(11, 0, 13, 0).clip(&window), Some(iv(11, 0, 12, 0)));
    assert_eq!(iv(12, 0, 13, 0).clip(&window), None);
}

// ── Subtraction ─────────────────────────────────────────────────────────────

#[test]
fn subtract_nothing_returns_base() {
    let base = iv(10, 0, 15, 0);
    assert_eq!(subtract_intervals(&base, &[]), vec![base]);
}

#[test]
fn subtract_middle_block_leaves_two_pieces() {
    let base = iv(10, 0, 15, 0);
    let pieces = subtract_intervals(&base, &[iv(12, 0, 13, 0)]);
    assert_eq!(pieces, vec![iv(10, 0, 12, 0), iv(13, 0, 15, 0)]);
}

#[test]
fn subtract_covering_block_leaves_nothing() {
    let base = iv(10, 0, 15, 0);
    assert!(subtract_intervals(&base, &[iv(9, 0, 16, 0)]).is_empty());
}

#[test]
fn subtract_block_abutting_start_emits_no_empty_piece() {
    let base = iv(10, 0, 15, 0);
    let pieces = subtract_intervals(&base, &[iv(10, 0, 11, 0)]);
    assert_eq!(pieces, vec![iv(11, 0, 15, 0)]);
}

#[test]
fn subtract_block_abutting_end_emits_no_empty_piece() {
    let base = iv(10, 0, 15, 0);
    let pieces = subtract_intervals(&base, &[iv(14, 0, 15, 0)]);
    assert_eq!(pieces, vec![iv(10, 0, 14, 0)]);
}

#[test]
fn subtract_unsorted_overlapping_removals() {
    let base = iv(10, 0, 15, 0);
    let removals = [
        iv(14, 0, 16, 0),
        iv(11, 0, 11, 30),
        iv(9, 0, 10, 30),
        iv(11, 15, 12, 0),
    ];
    let pieces = subtract_intervals(&base, &removals);
    assert_eq!(pieces, vec![iv(10, 30, 11, 0), iv(12, 0, 14, 0)]);
}

#[test]
fn subtract_ignores_removals_outside_base() {
    let base = iv(10, 0, 12, 0);
    let pieces = subtract_intervals(&base, &[iv(8, 0, 9, 0), iv(13, 0, 14, 0)]);
    assert_eq!(pieces, vec![base]);
}
