//! Sessions, timetables, and the (department, semester) key.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::grid::Slot;

/// One scheduled teaching session: a subject taught by a faculty member in
/// a single grid slot. A lab occupies two contiguous sessions, both flagged
/// `is_lab_block`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub subject_code: String,
    pub faculty_name: String,
    pub slot: Slot,
    pub is_lab_block: bool,
}

/// Store key for the one current timetable of a department/semester pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimetableKey {
    pub department: String,
    pub semester: String,
}

impl TimetableKey {
    pub fn new(department: impl Into<String>, semester: impl Into<String>) -> Self {
        TimetableKey {
            department: department.into(),
            semester: semester.into(),
        }
    }
}

impl fmt::Display for TimetableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.department, self.semester)
    }
}

/// A generated weekly timetable. Sessions are kept in chronological slot
/// order. `max_sessions_per_day` is the cap the generation ran under, kept
/// so the validator can re-check it without the original request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub department: String,
    pub semester: String,
    pub sessions: Vec<Session>,
    pub max_sessions_per_day: u32,
    pub generated_at: DateTime<Utc>,
}

impl Timetable {
    pub fn key(&self) -> TimetableKey {
        TimetableKey::new(self.department.clone(), self.semester.clone())
    }

    /// Slots of the week with no session — free periods.
    pub fn free_slot_count(&self) -> usize {
        crate::models::grid::SLOTS_PER_WEEK.saturating_sub(self.sessions.len())
    }
}
