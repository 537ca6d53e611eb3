//! Constraint Model — translates a generation request into a formal
//! constraint set over the week grid.
//!
//! All structural impossibilities are rejected here with `InvalidRequest`,
//! before any search starts. Every problem found is reported in one message
//! rather than failing on the first.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::grid::{Period, Slot, Weekday, DAYS_PER_WEEK, SLOTS_PER_WEEK};
use crate::models::subject::Subject;
use crate::models::timetable::TimetableKey;
use crate::store::DomainStore;

// ────────────────────────────────────────────────────────────────────────────
// Request / constraint types
// ────────────────────────────────────────────────────────────────────────────

/// Body of `POST /api/timetable/generate`. The subject list selects which
/// store records to schedule; the store remains the source of truth for the
/// subject fields themselves.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub department: String,
    pub semester: String,
    pub subjects: Vec<Subject>,
    pub max_sessions_per_day: u32,
    #[serde(default)]
    pub desired_free_periods: u32,
}

impl GenerateRequest {
    pub fn key(&self) -> TimetableKey {
        TimetableKey::new(self.department.clone(), self.semester.clone())
    }
}

/// How many grid sessions one subject requires, split by block shape.
/// A lab subject takes one contiguous double block plus singles for the
/// remaining hours; totals always equal `hoursPerWeek`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectDemand {
    pub code: String,
    pub name: String,
    /// Effective scheduling faculty: primary when available, alternate otherwise.
    pub faculty: String,
    pub lab_blocks: usize,
    pub single_sessions: usize,
    pub total_sessions: usize,
}

/// A faculty member's preferred slot sets, unioned from the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferredSlots {
    pub days: BTreeSet<Weekday>,
    pub periods: BTreeSet<Period>,
}

impl PreferredSlots {
    /// Soft-preference hits for a slot: one point for a preferred day,
    /// one for a preferred period.
    pub fn score(&self, slot: Slot) -> u32 {
        u32::from(self.days.contains(&slot.day)) + u32::from(self.periods.contains(&slot.period))
    }
}

/// The formal constraint set the engine solves: grid dimensions are the
/// process-wide constants, everything else is per-request.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    pub demands: Vec<SubjectDemand>,
    /// Preferred slot sets by faculty name (soft).
    pub preferred: BTreeMap<String, PreferredSlots>,
    /// Slots a faculty member already teaches in *other* stored timetables
    /// (hard — cross-timetable double-booking is forbidden).
    pub blocked: BTreeMap<String, BTreeSet<Slot>>,
    pub max_sessions_per_day: u32,
    /// Clamped to what the grid can actually leave free (soft target).
    pub desired_free_periods: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Construction
// ────────────────────────────────────────────────────────────────────────────

/// Builds the constraint set for a request, reading subjects, preferences,
/// and other timetables' sessions from the store.
pub fn build_constraint_set(
    request: &GenerateRequest,
    store: &DomainStore,
) -> Result<ConstraintSet, AppError> {
    let mut problems: Vec<String> = Vec::new();
    let mut demands: Vec<SubjectDemand> = Vec::new();
    let mut seen_codes: BTreeSet<String> = BTreeSet::new();

    if request.subjects.is_empty() {
        problems.push("subjects list is required".to_string());
    }
    if request.max_sessions_per_day == 0 {
        problems.push("maxSessionsPerDay must be positive".to_string());
    }

    for requested in &request.subjects {
        if !seen_codes.insert(requested.code.clone()) {
            problems.push(format!("subject '{}' selected twice", requested.code));
            continue;
        }

        let Some(subject) = store.get_subject(&requested.code) else {
            problems.push(format!("subject '{}' not found in store", requested.code));
            continue;
        };

        if subject.hours_per_week <= 0 {
            problems.push(format!(
                "subject '{}' has non-positive hoursPerWeek ({})",
                subject.code, subject.hours_per_week
            ));
            continue;
        }
        let hours = subject.hours_per_week as usize;

        if subject.lab_required && hours < 2 {
            problems.push(format!(
                "lab subject '{}' needs at least 2 hoursPerWeek for its double block",
                subject.code
            ));
            continue;
        }
        if subject.lab_required && request.max_sessions_per_day < 2 {
            problems.push(format!(
                "lab subject '{}' cannot fit a double block under maxSessionsPerDay = {}",
                subject.code, request.max_sessions_per_day
            ));
            continue;
        }
        if (request.max_sessions_per_day as usize) * DAYS_PER_WEEK < hours {
            problems.push(format!(
                "subject '{}' needs {} sessions but the cap allows at most {} per week",
                subject.code,
                hours,
                request.max_sessions_per_day as usize * DAYS_PER_WEEK
            ));
            continue;
        }

        let Some(faculty) = subject.scheduling_faculty() else {
            problems.push(format!(
                "subject '{}' is unavailable and has no alternate faculty",
                subject.code
            ));
            continue;
        };

        let lab_blocks = usize::from(subject.lab_required);
        demands.push(SubjectDemand {
            code: subject.code.clone(),
            name: subject.name.clone(),
            faculty: faculty.to_string(),
            lab_blocks,
            single_sessions: hours - 2 * lab_blocks,
            total_sessions: hours,
        });
    }

    let total_sessions: usize = demands.iter().map(|d| d.total_sessions).sum();
    if total_sessions > SLOTS_PER_WEEK {
        problems.push(format!(
            "requested {total_sessions} weekly sessions exceed the {SLOTS_PER_WEEK}-slot grid"
        ));
    }

    if !problems.is_empty() {
        return Err(AppError::InvalidRequest(problems.join("; ")));
    }

    // Soft preferences, unioned per faculty from the stored record.
    let mut preferred = BTreeMap::new();
    for demand in &demands {
        if let Some(pref) = store.get_preference(&demand.faculty) {
            let slots = preferred
                .entry(demand.faculty.clone())
                .or_insert_with(PreferredSlots::default);
            slots.days.extend(pref.preferred_days.iter().copied());
            slots.periods.extend(pref.preferred_time.iter().copied());
        }
    }

    // Hard blocks: slots these faculty members already teach elsewhere.
    let faculties: BTreeSet<&str> = demands.iter().map(|d| d.faculty.as_str()).collect();
    let mut blocked: BTreeMap<String, BTreeSet<Slot>> = BTreeMap::new();
    for session in store.sessions_outside(&request.key()) {
        if faculties.contains(session.faculty_name.as_str()) {
            blocked
                .entry(session.faculty_name.clone())
                .or_default()
                .insert(session.slot);
        }
    }

    let free_capacity = (SLOTS_PER_WEEK - total_sessions) as u32;
    let desired_free_periods = request.desired_free_periods.min(free_capacity);

    Ok(ConstraintSet {
        demands,
        preferred,
        blocked,
        max_sessions_per_day: request.max_sessions_per_day,
        desired_free_periods,
    })
}
