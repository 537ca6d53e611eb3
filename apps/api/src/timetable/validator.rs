//! Validator — re-checks a stored timetable against every hard constraint,
//! independent of how it was produced.
//!
//! The engine must never emit a violating timetable; this module is the
//! second line of defense against manual edits or stale data, not a crutch
//! the engine is allowed to lean on.
//!
//! Violations are reported grouped by check type in a fixed order, and
//! chronologically within each group, so the output is deterministic.

use std::collections::BTreeMap;

use crate::models::grid::{Slot, Weekday};
use crate::models::timetable::Timetable;
use crate::store::DomainStore;

/// Check categories, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ViolationKind {
    FacultyDoubleBooking,
    SubjectDoubleBooking,
    DailyCapExceeded,
    LabBlockNotContiguous,
    WeeklyHoursMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Violation {
            kind,
            message: message.into(),
        }
    }
}

/// Runs every hard-constraint check against one stored timetable.
/// Empty result means the timetable is valid.
pub fn validate_timetable(timetable: &Timetable, store: &DomainStore) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_faculty_double_booking(timetable, store, &mut violations);
    check_subject_double_booking(timetable, &mut violations);
    check_daily_cap(timetable, &mut violations);
    check_lab_contiguity(timetable, &mut violations);
    check_weekly_hours(timetable, store, &mut violations);
    violations
}

/// A faculty member must not teach two sessions in one slot, whether both
/// sessions are in this timetable or one lives in another department's.
fn check_faculty_double_booking(
    timetable: &Timetable,
    store: &DomainStore,
    violations: &mut Vec<Violation>,
) {
    let mut counts: BTreeMap<(Slot, &str), usize> = BTreeMap::new();
    for session in &timetable.sessions {
        *counts
            .entry((session.slot, session.faculty_name.as_str()))
            .or_default() += 1;
    }

    let outside = store.sessions_outside(&timetable.key());
    for session in &outside {
        if let Some(count) = counts.get_mut(&(session.slot, session.faculty_name.as_str())) {
            *count += 1;
        }
    }

    for ((slot, faculty), count) in counts {
        if count > 1 {
            violations.push(Violation::new(
                ViolationKind::FacultyDoubleBooking,
                format!("faculty '{faculty}' is booked {count} times at {slot}"),
            ));
        }
    }
}

fn check_subject_double_booking(timetable: &Timetable, violations: &mut Vec<Violation>) {
    let mut counts: BTreeMap<(Slot, &str), usize> = BTreeMap::new();
    for session in &timetable.sessions {
        *counts
            .entry((session.slot, session.subject_code.as_str()))
            .or_default() += 1;
    }
    for ((slot, code), count) in counts {
        if count > 1 {
            violations.push(Violation::new(
                ViolationKind::SubjectDoubleBooking,
                format!("subject '{code}' is scheduled {count} times at {slot}"),
            ));
        }
    }
}

fn check_daily_cap(timetable: &Timetable, violations: &mut Vec<Violation>) {
    let cap = timetable.max_sessions_per_day;
    let mut counts: BTreeMap<(Weekday, &str), u32> = BTreeMap::new();
    for session in &timetable.sessions {
        *counts
            .entry((session.slot.day, session.subject_code.as_str()))
            .or_default() += 1;
    }
    for ((day, code), count) in counts {
        if count > cap {
            violations.push(Violation::new(
                ViolationKind::DailyCapExceeded,
                format!("subject '{code}' has {count} sessions on {day} (cap {cap})"),
            ));
        }
    }
}

/// Lab sessions of a subject must pair up into contiguous same-day doubles.
fn check_lab_contiguity(timetable: &Timetable, violations: &mut Vec<Violation>) {
    let mut lab_slots: BTreeMap<&str, Vec<Slot>> = BTreeMap::new();
    for session in &timetable.sessions {
        if session.is_lab_block {
            lab_slots
                .entry(session.subject_code.as_str())
                .or_default()
                .push(session.slot);
        }
    }

    // (first offending slot, code, message) so the group sorts chronologically.
    let mut found: Vec<(usize, String, String)> = Vec::new();
    for (code, mut slots) in lab_slots {
        slots.sort();
        if slots.len() % 2 != 0 {
            found.push((
                slots[0].ordinal(),
                code.to_string(),
                format!("subject '{code}' has an unpaired lab session at {}", slots[0]),
            ));
            continue;
        }
        for pair in slots.chunks(2) {
            if pair[0].next_in_day() != Some(pair[1]) {
                found.push((
                    pair[0].ordinal(),
                    code.to_string(),
                    format!(
                        "subject '{code}' lab sessions at {} and {} are not contiguous",
                        pair[0], pair[1]
                    ),
                ));
            }
        }
    }

    found.sort();
    violations.extend(
        found
            .into_iter()
            .map(|(_, _, message)| Violation::new(ViolationKind::LabBlockNotContiguous, message)),
    );
}

/// Each subject's session count must equal its `hoursPerWeek` in the store.
fn check_weekly_hours(timetable: &Timetable, store: &DomainStore, violations: &mut Vec<Violation>) {
    let mut counts: BTreeMap<&str, (usize, Slot)> = BTreeMap::new();
    for session in &timetable.sessions {
        let entry = counts
            .entry(session.subject_code.as_str())
            .or_insert((0, session.slot));
        entry.0 += 1;
        entry.1 = entry.1.min(session.slot);
    }

    let mut found: Vec<(usize, String)> = Vec::new();
    for (code, (count, first_slot)) in counts {
        match store.get_subject(code) {
            Some(subject) => {
                let required = subject.hours_per_week.max(0) as usize;
                if count != required {
                    found.push((
                        first_slot.ordinal(),
                        format!(
                            "subject '{code}' has {count} weekly sessions, expected {required}"
                        ),
                    ));
                }
            }
            None => {
                found.push((
                    first_slot.ordinal(),
                    format!("subject '{code}' is scheduled but not found in store"),
                ));
            }
        }
    }

    found.sort();
    violations.extend(
        found
            .into_iter()
            .map(|(_, message)| Violation::new(ViolationKind::WeeklyHoursMismatch, message)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grid::Period;
    use crate::models::subject::Subject;
    use crate::models::timetable::Session;
    use chrono::Utc;

    fn make_subject(code: &str, faculty: &str, hours: i32, lab: bool) -> Subject {
        Subject {
            code: code.to_string(),
            name: format!("Subject {code}"),
            department: "CSE".to_string(),
            faculty: faculty.to_string(),
            alternate_faculty: None,
            hours_per_week: hours,
            lab_required: lab,
            available: true,
        }
    }

    fn make_session(code: &str, faculty: &str, day: Weekday, period: Period, lab: bool) -> Session {
        Session {
            subject_code: code.to_string(),
            faculty_name: faculty.to_string(),
            slot: Slot::new(day, period),
            is_lab_block: lab,
        }
    }

    fn make_timetable(sessions: Vec<Session>) -> Timetable {
        Timetable {
            department: "CSE".to_string(),
            semester: "5".to_string(),
            sessions,
            max_sessions_per_day: 2,
            generated_at: Utc::now(),
        }
    }

    fn store_with(subjects: &[Subject]) -> DomainStore {
        let store = DomainStore::new();
        for s in subjects {
            store.upsert_subject(s.clone());
        }
        store
    }

    #[test]
    fn test_clean_timetable_has_no_violations() {
        let store = store_with(&[make_subject("CS101", "Dr. Rao", 2, false)]);
        let timetable = make_timetable(vec![
            make_session("CS101", "Dr. Rao", Weekday::Monday, Period::First, false),
            make_session("CS101", "Dr. Rao", Weekday::Tuesday, Period::First, false),
        ]);
        assert!(validate_timetable(&timetable, &store).is_empty());
    }

    #[test]
    fn test_faculty_double_booking_detected() {
        let store = store_with(&[
            make_subject("CS101", "Dr. Rao", 1, false),
            make_subject("CS102", "Dr. Rao", 1, false),
        ]);
        let timetable = make_timetable(vec![
            make_session("CS101", "Dr. Rao", Weekday::Monday, Period::First, false),
            make_session("CS102", "Dr. Rao", Weekday::Monday, Period::First, false),
        ]);
        let violations = validate_timetable(&timetable, &store);
        // The shared slot also counts as subject-level clean, so exactly one
        // faculty violation plus a subject-double check pass.
        assert_eq!(violations[0].kind, ViolationKind::FacultyDoubleBooking);
        assert!(violations[0].message.contains("Dr. Rao"));
    }

    #[test]
    fn test_cross_timetable_double_booking_detected() {
        let store = store_with(&[make_subject("CS101", "Dr. Rao", 1, false)]);
        store.put_timetable(Timetable {
            department: "ECE".to_string(),
            semester: "3".to_string(),
            sessions: vec![make_session(
                "EC201",
                "Dr. Rao",
                Weekday::Monday,
                Period::First,
                false,
            )],
            max_sessions_per_day: 2,
            generated_at: Utc::now(),
        });

        let timetable = make_timetable(vec![make_session(
            "CS101",
            "Dr. Rao",
            Weekday::Monday,
            Period::First,
            false,
        )]);
        let violations = validate_timetable(&timetable, &store);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::FacultyDoubleBooking);
    }

    #[test]
    fn test_subject_double_booking_detected() {
        let store = store_with(&[make_subject("CS101", "Dr. Rao", 2, false)]);
        // Same subject twice in one slot under different faculty names, so
        // only the subject-level check fires.
        let timetable = make_timetable(vec![
            make_session("CS101", "Dr. Rao", Weekday::Monday, Period::First, false),
            make_session("CS101", "Dr. Iyer", Weekday::Monday, Period::First, false),
        ]);
        let violations = validate_timetable(&timetable, &store);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::SubjectDoubleBooking);
    }

    #[test]
    fn test_daily_cap_detected() {
        let store = store_with(&[make_subject("CS101", "Dr. Rao", 3, false)]);
        let timetable = make_timetable(vec![
            make_session("CS101", "Dr. Rao", Weekday::Monday, Period::First, false),
            make_session("CS101", "Dr. Rao", Weekday::Monday, Period::Third, false),
            make_session("CS101", "Dr. Rao", Weekday::Monday, Period::Fifth, false),
        ]);
        let violations = validate_timetable(&timetable, &store);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::DailyCapExceeded);
        assert!(violations[0].message.contains("3 sessions on Monday"));
    }

    #[test]
    fn test_non_contiguous_lab_detected() {
        let store = store_with(&[make_subject("CS102", "Dr. Iyer", 2, true)]);
        let timetable = make_timetable(vec![
            make_session("CS102", "Dr. Iyer", Weekday::Monday, Period::First, true),
            make_session("CS102", "Dr. Iyer", Weekday::Monday, Period::Third, true),
        ]);
        let violations = validate_timetable(&timetable, &store);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::LabBlockNotContiguous);
        assert!(violations[0].message.contains("not contiguous"));
    }

    #[test]
    fn test_unpaired_lab_session_detected() {
        let store = store_with(&[make_subject("CS102", "Dr. Iyer", 1, true)]);
        let timetable = make_timetable(vec![make_session(
            "CS102",
            "Dr. Iyer",
            Weekday::Monday,
            Period::First,
            true,
        )]);
        let violations = validate_timetable(&timetable, &store);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::LabBlockNotContiguous);
        assert!(violations[0].message.contains("unpaired"));
    }

    #[test]
    fn test_hours_mismatch_detected() {
        let store = store_with(&[make_subject("CS101", "Dr. Rao", 4, false)]);
        let timetable = make_timetable(vec![make_session(
            "CS101",
            "Dr. Rao",
            Weekday::Monday,
            Period::First,
            false,
        )]);
        let violations = validate_timetable(&timetable, &store);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::WeeklyHoursMismatch);
        assert!(violations[0].message.contains("1 weekly sessions, expected 4"));
    }

    #[test]
    fn test_unknown_subject_reported() {
        let store = DomainStore::new();
        let timetable = make_timetable(vec![make_session(
            "GHOST",
            "Dr. Rao",
            Weekday::Monday,
            Period::First,
            false,
        )]);
        let violations = validate_timetable(&timetable, &store);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::WeeklyHoursMismatch);
        assert!(violations[0].message.contains("not found in store"));
    }

    #[test]
    fn test_violation_groups_keep_fixed_order() {
        let store = store_with(&[
            make_subject("CS101", "Dr. Rao", 5, false),
            make_subject("CS102", "Dr. Rao", 2, true),
        ]);
        let timetable = make_timetable(vec![
            // Faculty double-booked with CS102 at Friday first period.
            make_session("CS101", "Dr. Rao", Weekday::Friday, Period::First, false),
            make_session("CS102", "Dr. Rao", Weekday::Friday, Period::First, true),
            // Unpaired lab (CS102 has just the one lab session) and an
            // hours mismatch for CS101 (1 of 5 sessions placed).
        ]);
        let violations = validate_timetable(&timetable, &store);
        let kinds: Vec<ViolationKind> = violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::FacultyDoubleBooking,
                ViolationKind::LabBlockNotContiguous,
                ViolationKind::WeeklyHoursMismatch,
                ViolationKind::WeeklyHoursMismatch,
            ]
        );
    }
}
