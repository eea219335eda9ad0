//! Tests for availability window reconciliation, update and delete checks.

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use slot_engine::classifier::{classify_events, AvailabilityBlock, AvailabilityKind, BusyBlock, TimestampPolicy};
use slot_engine::event::{CalendarEvent, EventTime, Transparency};
use slot_engine::reconcile::{
    check_delete, check_update, reconcile_window, DeleteVerdict, ProposedWindow, Reconciliation,
};
use slot_engine::EngineError;

const TZ: Tz = chrono_tz::Asia::Kolkata;

// ── Helpers ─────────────────────────────────────────────────────────────────

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn hm(raw: &str) -> NaiveTime {
    NaiveTime::parse_from_str(raw, "%H:%M").unwrap()
}

fn timed(id: &str, summary: &str, start: &str, end: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        summary: Some(summary.to_string()),
        description: None,
        start: EventTime {
            date_time: Some(format!("2026-03-02T{start}:00+05:30")),
            date: None,
        },
        end: EventTime {
            date_time: Some(format!("2026-03-02T{end}:00+05:30")),
            date: None,
        },
        transparency: Transparency::Opaque,
    }
}

fn windows(events: &[CalendarEvent]) -> Vec<AvailabilityBlock> {
    classify_events(day(), events, &TZ, TimestampPolicy::Skip).availability
}

fn busy(events: &[CalendarEvent]) -> Vec<BusyBlock> {
    classify_events(day(), events, &TZ, TimestampPolicy::Skip).busy
}

fn propose(start: &str, end: &str) -> ProposedWindow {
    ProposedWindow::from_local(day(), hm(start), hm(end), AvailabilityKind::Regular, &TZ).unwrap()
}

/// Proposed segments as `(start, end)` HH:MM pairs.
fn segments(result: &Reconciliation) -> Vec<(String, String)> {
    match result {
        Reconciliation::Accepted => panic!("expected a conflict"),
        Reconciliation::Conflict(report) => report
            .proposed_segments
            .iter()
            .map(|s| {
                (
                    s.start_time.format("%H:%M").to_string(),
                    s.end_time.format("%H:%M").to_string(),
                )
            })
            .collect(),
    }
}

fn pair(start: &str, end: &str) -> (String, String) {
    (start.to_string(), end.to_string())
}

// ── Accept ──────────────────────────────────────────────────────────────────

#[test]
fn no_existing_windows_is_accepted() {
    let result = reconcile_window(&propose("10:00", "15:00"), &[], &TZ);
    assert_eq!(result, Reconciliation::Accepted);
}

#[test]
fn disjoint_window_is_accepted() {
    let existing = windows(&[timed("a", "REGULAR_TIMING", "16:00", "18:00")]);
    assert!(reconcile_window(&propose("10:00", "15:00"), &existing, &TZ).is_accepted());
}

#[test]
fn abutting_window_is_accepted() {
    let existing = windows(&[
        timed("a", "REGULAR_TIMING", "08:00", "10:00"),
        timed("b", "EMERGENCY_TIMING", "15:00", "16:00"),
    ]);
    assert!(reconcile_window(&propose("10:00", "15:00"), &existing, &TZ).is_accepted());
}

#[test]
fn busy_events_do_not_count_as_existing_windows() {
    // Only availability windows are passed; a client booking is not one.
    let existing = windows(&[timed("bk", "BOOKED: Asha", "12:00", "12:40")]);
    assert!(existing.is_empty());
    assert!(reconcile_window(&propose("10:00", "15:00"), &existing, &TZ).is_accepted());
}

// ── Conflict ────────────────────────────────────────────────────────────────

#[test]
fn single_overlap_splits_the_proposal() {
    let existing = windows(&[timed("a", "REGULAR_TIMING", "12:00", "13:00")]);

    let result = reconcile_window(&propose("10:00", "15:00"), &existing, &TZ);

    let Reconciliation::Conflict(report) = &result else {
        panic!("expected a conflict");
    };
    assert_eq!(report.overlaps, vec!["REGULAR_TIMING: 12:00 - 13:00".to_string()]);
    assert_eq!(segments(&result), vec![pair("10:00", "12:00"), pair("13:00", "15:00")]);
}

#[test]
fn covering_window_leaves_no_segments() {
    let existing = windows(&[timed("a", "REGULAR_TIMING", "09:00", "16:00")]);

    let result = reconcile_window(&propose("10:00", "15:00"), &existing, &TZ);

    assert!(!result.is_accepted());
    assert!(segments(&result).is_empty());
}

#[test]
fn identical_window_leaves_no_segments() {
    let existing = windows(&[timed("a", "REGULAR_TIMING", "10:00", "15:00")]);

    let result = reconcile_window(&propose("10:00", "15:00"), &existing, &TZ);

    assert!(segments(&result).is_empty());
}

#[test]
fn overlap_sharing_the_start_emits_no_empty_segment() {
    let existing = windows(&[timed("a", "REGULAR_TIMING", "10:00", "11:00")]);

    let result = reconcile_window(&propose("10:00", "15:00"), &existing, &TZ);

    assert_eq!(segments(&result), vec![pair("11:00", "15:00")]);
}

#[test]
fn overlap_sharing_the_end_emits_no_empty_segment() {
    let existing = windows(&[timed("a", "REGULAR_TIMING", "14:00", "15:00")]);

    let result = reconcile_window(&propose("10:00", "15:00"), &existing, &TZ);

    assert_eq!(segments(&result), vec![pair("10:00", "14:00")]);
}

#[test]
fn many_overlaps_of_both_kinds() {
    let existing = windows(&[
        timed("d", "EMERGENCY_TIMING", "14:00", "16:00"),
        timed("a", "REGULAR_TIMING", "09:00", "10:30"),
        timed("c", "REGULAR_TIMING", "11:30", "12:00"),
        timed("b", "EMERGENCY_TIMING", "11:00", "11:30"),
        timed("x", "REGULAR_TIMING", "17:00", "18:00"),
    ]);

    let result = reconcile_window(&propose("10:00", "15:00"), &existing, &TZ);

    let Reconciliation::Conflict(report) = &result else {
        panic!("expected a conflict");
    };
    assert_eq!(
        report.overlaps,
        vec![
            "REGULAR_TIMING: 09:00 - 10:30".to_string(),
            "EMERGENCY_TIMING: 11:00 - 11:30".to_string(),
            "REGULAR_TIMING: 11:30 - 12:00".to_string(),
            "EMERGENCY_TIMING: 14:00 - 16:00".to_string(),
        ]
    );
    assert_eq!(segments(&result), vec![pair("10:30", "11:00"), pair("12:00", "14:00")]);
}

#[test]
fn overlaps_are_described_in_business_time_even_for_utc_events() {
    let utc = CalendarEvent {
        start: EventTime {
            date_time: Some("2026-03-02T06:30:00Z".to_string()),
            date: None,
        },
        end: EventTime {
            date_time: Some("2026-03-02T07:30:00Z".to_string()),
            date: None,
        },
        ..timed("a", "REGULAR_TIMING", "00:00", "00:00")
    };

    let result = reconcile_window(&propose("10:00", "15:00"), &windows(&[utc]), &TZ);

    let Reconciliation::Conflict(report) = &result else {
        panic!("expected a conflict");
    };
    assert_eq!(report.overlaps, vec!["REGULAR_TIMING: 12:00 - 13:00".to_string()]);
}

#[test]
fn conflict_serializes_with_status_tag() {
    let existing = windows(&[timed("a", "REGULAR_TIMING", "12:00", "13:00")]);

    let result = reconcile_window(&propose("10:00", "15:00"), &existing, &TZ);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["status"], "conflict");
    assert_eq!(json["proposed_segments"][0]["start_time"], "10:00");
    assert_eq!(json["proposed_segments"][1]["end_time"], "15:00");
    assert!(json["proposed_segments"][0].get("interval").is_none());
}

// ── Proposed window ─────────────────────────────────────────────────────────

#[test]
fn inverted_proposal_is_rejected() {
    let err = ProposedWindow::from_local(day(), hm("15:00"), hm("10:00"), AvailabilityKind::Regular, &TZ)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidWindow(_)));
}

#[test]
fn proposal_event_carries_the_kind_marker() {
    let window =
        ProposedWindow::from_local(day(), hm("20:00"), hm("22:00"), AvailabilityKind::Emergency, &TZ).unwrap();
    let event = window.to_event();
    assert_eq!(event.summary, "EMERGENCY_TIMING");
    assert_eq!((event.end - event.start).num_minutes(), 120);
}

#[test]
fn proposal_may_end_at_midnight() {
    let window =
        ProposedWindow::from_local(day(), hm("20:00"), hm("00:00"), AvailabilityKind::Emergency, &TZ).unwrap();

    let event = window.to_event();
    assert_eq!((event.end - event.start).num_minutes(), 240);
    assert_eq!(slot_engine::time::parse_hhmm("24:00"), Some(hm("00:00")));
}

// ── End of day ──────────────────────────────────────────────────────────────

#[test]
fn all_day_window_overlap_reads_until_24_00() {
    let all_day = CalendarEvent {
        start: EventTime::all_day(day()),
        end: EventTime::all_day(day().succ_opt().unwrap()),
        ..timed("a", "REGULAR_TIMING", "00:00", "00:00")
    };

    let result = reconcile_window(&propose("10:00", "15:00"), &windows(&[all_day]), &TZ);

    let Reconciliation::Conflict(report) = &result else {
        panic!("expected a conflict");
    };
    assert_eq!(report.overlaps, vec!["REGULAR_TIMING: 00:00 - 24:00".to_string()]);
    assert!(report.proposed_segments.is_empty());
}

#[test]
fn segment_running_to_midnight_serializes_as_24_00() {
    let existing = windows(&[timed("a", "EMERGENCY_TIMING", "21:00", "22:00")]);
    let proposed =
        ProposedWindow::from_local(day(), hm("20:00"), hm("00:00"), AvailabilityKind::Regular, &TZ).unwrap();

    let result = reconcile_window(&proposed, &existing, &TZ);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["proposed_segments"][0]["end_time"], "21:00");
    assert_eq!(json["proposed_segments"][1]["start_time"], "22:00");
    assert_eq!(json["proposed_segments"][1]["end_time"], "24:00");
}

// ── Update ──────────────────────────────────────────────────────────────────

#[test]
fn update_ignores_the_window_being_changed() {
    let existing = windows(&[
        timed("self", "REGULAR_TIMING", "10:00", "12:00"),
        timed("other", "REGULAR_TIMING", "15:00", "16:00"),
    ]);

    let result = check_update("self", &propose("10:00", "13:00"), &existing, &TZ);

    assert!(result.is_accepted());
}

#[test]
fn update_still_conflicts_with_other_windows() {
    let existing = windows(&[
        timed("self", "REGULAR_TIMING", "10:00", "12:00"),
        timed("other", "EMERGENCY_TIMING", "13:00", "14:00"),
    ]);

    let result = check_update("self", &propose("10:00", "14:30"), &existing, &TZ);

    assert_eq!(segments(&result), vec![pair("10:00", "13:00"), pair("14:00", "14:30")]);
}

// ── Delete ──────────────────────────────────────────────────────────────────

#[test]
fn delete_is_blocked_by_a_booking_inside_the_window() {
    let events = [
        timed("w", "REGULAR_TIMING", "10:00", "12:00"),
        timed("bk", "BOOKED: Asha (live-20)", "10:40", "11:00"),
    ];
    let window = &windows(&events)[0];

    let verdict = check_delete(window, &busy(&events));

    assert_eq!(
        verdict,
        DeleteVerdict::Blocked {
            booking_id: "bk".to_string(),
            label: "BOOKED: Asha (live-20)".to_string(),
        }
    );
}

#[test]
fn delete_is_allowed_when_bookings_only_touch_the_window() {
    let events = [
        timed("w", "REGULAR_TIMING", "10:00", "12:00"),
        timed("before", "BOOKED: Asha", "09:20", "10:00"),
        timed("after", "BOOKED: Ravi", "12:00", "12:40"),
    ];
    let window = &windows(&events)[0];

    assert_eq!(check_delete(window, &busy(&events)), DeleteVerdict::Allowed);
}

#[test]
fn delete_ignores_other_availability_windows() {
    let events = [
        timed("w", "REGULAR_TIMING", "10:00", "12:00"),
        timed("e", "EMERGENCY_TIMING", "11:00", "13:00"),
    ];
    let window = &windows(&events)[0];

    assert_eq!(check_delete(window, &busy(&events)), DeleteVerdict::Allowed);
}
