//! Domain Store — keyed in-memory storage for subjects, faculty preferences,
//! and generated timetables.
//!
//! Pure data access, no scheduling logic. The store replaces the original
//! system's process-wide singleton timetable with an explicit map keyed by
//! (department, semester), plus a per-key generation lock so two concurrent
//! generations for the same key cannot interleave. Requests targeting
//! different keys never block each other.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::{Mutex as GenerationMutex, OwnedMutexGuard};
use tracing::info;

use crate::errors::AppError;
use crate::models::preference::FacultyPreference;
use crate::models::subject::Subject;
use crate::models::timetable::{Session, Timetable, TimetableKey};

/// Held for the duration of one generation run; dropping it releases the
/// per-key lock. Acquired with `try_lock`, so a concurrent generation for
/// the same key fails fast with `Busy` instead of queueing.
pub struct GenerationPermit {
    _guard: OwnedMutexGuard<()>,
}

#[derive(Default)]
pub struct DomainStore {
    subjects: RwLock<BTreeMap<String, Subject>>,
    preferences: RwLock<BTreeMap<String, FacultyPreference>>,
    timetables: RwLock<HashMap<TimetableKey, Timetable>>,
    generation_locks: Mutex<HashMap<TimetableKey, Arc<GenerationMutex<()>>>>,
}

impl DomainStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Subjects ────────────────────────────────────────────────────────────

    /// Inserts or replaces a subject, keyed by code. Last write wins.
    pub fn upsert_subject(&self, subject: Subject) {
        let mut subjects = self.subjects.write().unwrap_or_else(PoisonError::into_inner);
        subjects.insert(subject.code.clone(), subject);
    }

    pub fn get_subject(&self, code: &str) -> Option<Subject> {
        let subjects = self.subjects.read().unwrap_or_else(PoisonError::into_inner);
        subjects.get(code).cloned()
    }

    /// All subjects in code order.
    pub fn list_subjects(&self) -> Vec<Subject> {
        let subjects = self.subjects.read().unwrap_or_else(PoisonError::into_inner);
        subjects.values().cloned().collect()
    }

    pub fn subjects_by_department(&self, department: &str) -> Vec<Subject> {
        let subjects = self.subjects.read().unwrap_or_else(PoisonError::into_inner);
        subjects
            .values()
            .filter(|s| s.department == department)
            .cloned()
            .collect()
    }

    pub fn remove_subject(&self, code: &str) -> Option<Subject> {
        let mut subjects = self.subjects.write().unwrap_or_else(PoisonError::into_inner);
        subjects.remove(code)
    }

    /// Marks every subject taught by `faculty` as (un)available and records
    /// the replacement teacher. When `rewrite_timetables` is set, sessions
    /// already stored under the old name are relabeled to the replacement.
    /// Returns the number of subjects touched.
    pub fn set_faculty_availability(
        &self,
        faculty: &str,
        available: bool,
        replacement: Option<&str>,
        rewrite_timetables: bool,
    ) -> usize {
        let mut touched = 0;
        {
            let mut subjects = self.subjects.write().unwrap_or_else(PoisonError::into_inner);
            for subject in subjects.values_mut().filter(|s| s.faculty == faculty) {
                subject.available = available;
                if let Some(new_name) = replacement {
                    subject.alternate_faculty = Some(new_name.to_string());
                }
                touched += 1;
            }
        }

        if rewrite_timetables {
            if let Some(new_name) = replacement {
                let mut timetables = self
                    .timetables
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                for timetable in timetables.values_mut() {
                    for session in timetable
                        .sessions
                        .iter_mut()
                        .filter(|s| s.faculty_name == faculty)
                    {
                        session.faculty_name = new_name.to_string();
                    }
                }
            }
        }

        info!(faculty, available, touched, "faculty availability updated");
        touched
    }

    // ── Faculty preferences ─────────────────────────────────────────────────

    /// Stores a preference record, keyed by faculty name. A re-submission
    /// replaces the previous record (last write wins).
    pub fn put_preference(&self, preference: FacultyPreference) {
        let mut prefs = self
            .preferences
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        prefs.insert(preference.faculty.clone(), preference);
    }

    pub fn get_preference(&self, faculty: &str) -> Option<FacultyPreference> {
        let prefs = self
            .preferences
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        prefs.get(faculty).cloned()
    }

    /// All preferences in faculty-name order.
    pub fn list_preferences(&self) -> Vec<FacultyPreference> {
        let prefs = self
            .preferences
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        prefs.values().cloned().collect()
    }

    // ── Timetables ──────────────────────────────────────────────────────────

    /// Atomically replaces the current timetable for its key, without any
    /// cross-timetable checks. Generation results go through
    /// `commit_timetable` instead.
    pub fn put_timetable(&self, timetable: Timetable) {
        let key = timetable.key();
        let mut timetables = self
            .timetables
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        timetables.insert(key, timetable);
    }

    /// Commits a generation result. The solver reads other timetables'
    /// sessions before it starts, but a concurrent generation for a
    /// *different* key may commit in between; re-checking faculty slots
    /// under the write lock closes that window. On conflict nothing is
    /// written and the caller gets `Busy` — a retry re-reads the store and
    /// sees the winner's placements as blocked slots.
    pub fn commit_timetable(&self, timetable: Timetable) -> Result<(), AppError> {
        let key = timetable.key();
        let mut timetables = self
            .timetables
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let conflict = timetable.sessions.iter().any(|session| {
            timetables.iter().any(|(other_key, other)| {
                *other_key != key
                    && other.sessions.iter().any(|o| {
                        o.slot == session.slot && o.faculty_name == session.faculty_name
                    })
            })
        });
        if conflict {
            return Err(AppError::Busy);
        }

        timetables.insert(key, timetable);
        Ok(())
    }

    pub fn get_timetable(&self, key: &TimetableKey) -> Option<Timetable> {
        let timetables = self
            .timetables
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        timetables.get(key).cloned()
    }

    pub fn timetable_keys(&self) -> Vec<TimetableKey> {
        let timetables = self
            .timetables
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<TimetableKey> = timetables.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Sessions from every stored timetable except the one being
    /// regenerated. The constraint model turns these into faculty blocked
    /// slots, so a faculty member is never double-booked across timetables.
    pub fn sessions_outside(&self, excluded: &TimetableKey) -> Vec<Session> {
        let timetables = self
            .timetables
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut sessions: Vec<Session> = timetables
            .iter()
            .filter(|(key, _)| *key != excluded)
            .flat_map(|(_, t)| t.sessions.iter().cloned())
            .collect();
        sessions.sort_by_key(|s| (s.slot, s.subject_code.clone()));
        sessions
    }

    /// Resolves which timetable a validate/export/get request targets.
    /// An explicit key always wins; with exactly one timetable stored the
    /// key may be omitted.
    pub fn resolve_key(
        &self,
        department: Option<String>,
        semester: Option<String>,
    ) -> Result<TimetableKey, AppError> {
        if let (Some(department), Some(semester)) = (department.clone(), semester.clone()) {
            return Ok(TimetableKey::new(department, semester));
        }
        if department.is_some() != semester.is_some() {
            return Err(AppError::InvalidRequest(
                "department and semester must be provided together".to_string(),
            ));
        }

        let mut keys = self.timetable_keys();
        match keys.len() {
            0 => Err(AppError::EmptyTimetable(
                "no timetable has been generated".to_string(),
            )),
            1 => Ok(keys.remove(0)),
            _ => Err(AppError::InvalidRequest(
                "multiple timetables exist; department and semester are required".to_string(),
            )),
        }
    }

    // ── Generation locking ──────────────────────────────────────────────────

    /// Claims the generation lock for a key, failing fast with `Busy` when a
    /// generation for the same key is already in flight. Locks for distinct
    /// keys are independent.
    pub fn begin_generation(&self, key: &TimetableKey) -> Result<GenerationPermit, AppError> {
        let lock = {
            let mut locks = self
                .generation_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            // An entry only the map still references has no live permit;
            // drop it so the map does not grow with every key ever seen.
            locks.retain(|k, lock| k == key || Arc::strong_count(lock) > 1);
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(GenerationMutex::new(())))
                .clone()
        };

        let guard = lock.try_lock_owned().map_err(|_| AppError::Busy)?;
        Ok(GenerationPermit { _guard: guard })
    }

    #[cfg(test)]
    fn generation_lock_count(&self) -> usize {
        self.generation_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
