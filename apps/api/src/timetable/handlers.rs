//! HTTP handlers for timetable generation, validation, download, and the
//! teacher-availability update.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::models::timetable::Timetable;
use crate::state::AppState;
use crate::timetable::constraints::{build_constraint_set, GenerateRequest};
use crate::timetable::engine::solve;
use crate::timetable::exporter::{export, ExportFormat};
use crate::timetable::validator::{validate_timetable, Violation};

/// Optional key selector shared by validate/download/get. With a single
/// stored timetable both fields may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct KeySelector {
    pub department: Option<String>,
    pub semester: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<String>>,
}

/// POST /api/timetable/generate
///
/// Claims the per-key generation lock (fail-fast `Busy` on contention),
/// builds the constraint set, runs the search, and commits the result —
/// re-checked against other keys' timetables under the store lock, so a
/// concurrent generation elsewhere cannot sneak in a faculty double-booking.
/// A failed search leaves the previous timetable intact.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<Timetable>, AppError> {
    let key = request.key();
    let _permit = state.store.begin_generation(&key)?;

    let constraints = build_constraint_set(&request, &state.store)?;
    info!(
        key = %key,
        subjects = constraints.demands.len(),
        desired_free_periods = constraints.desired_free_periods,
        "starting timetable generation"
    );

    let sessions = solve(&constraints, &state.solver)?;
    let timetable = Timetable {
        department: request.department,
        semester: request.semester,
        sessions,
        max_sessions_per_day: request.max_sessions_per_day,
        generated_at: Utc::now(),
    };

    info!(
        key = %key,
        sessions = timetable.sessions.len(),
        free_periods = timetable.free_slot_count(),
        "timetable generated"
    );
    state.store.commit_timetable(timetable.clone())?;
    Ok(Json(timetable))
}

/// POST /api/timetable/validate
///
/// Re-checks the stored timetable against every hard constraint. The body
/// may be `{}`; an explicit department/semester pair disambiguates when
/// several timetables exist.
pub async fn handle_validate(
    State(state): State<AppState>,
    body: Option<Json<KeySelector>>,
) -> Result<Json<ValidateResponse>, AppError> {
    let Json(selector) = body.unwrap_or_default();
    let key = state
        .store
        .resolve_key(selector.department, selector.semester)?;
    let timetable = state
        .store
        .get_timetable(&key)
        .ok_or_else(|| AppError::EmptyTimetable(key.to_string()))?;

    let violations = validate_timetable(&timetable, &state.store);
    if violations.is_empty() {
        Ok(Json(ValidateResponse {
            status: "valid",
            message: "Timetable is valid and meets all requirements".to_string(),
            violations: None,
        }))
    } else {
        Ok(Json(ValidateResponse {
            status: "invalid",
            message: "Timetable validation failed".to_string(),
            violations: Some(violations.into_iter().map(|v: Violation| v.message).collect()),
        }))
    }
}

/// GET /api/timetable
pub async fn handle_get_timetable(
    State(state): State<AppState>,
    Query(selector): Query<KeySelector>,
) -> Result<Json<Timetable>, AppError> {
    let key = state
        .store
        .resolve_key(selector.department, selector.semester)?;
    let timetable = state
        .store
        .get_timetable(&key)
        .ok_or_else(|| AppError::EmptyTimetable(key.to_string()))?;
    Ok(Json(timetable))
}

/// GET /api/timetable/download/:format
pub async fn handle_download(
    State(state): State<AppState>,
    Path(format): Path<String>,
    Query(selector): Query<KeySelector>,
) -> Result<Response, AppError> {
    let format = ExportFormat::parse(&format)?;
    let key = state
        .store
        .resolve_key(selector.department, selector.semester)?;
    let timetable = state
        .store
        .get_timetable(&key)
        .ok_or_else(|| AppError::EmptyTimetable(key.to_string()))?;

    let body = export(&timetable, format);
    let headers = [
        (header::CONTENT_TYPE, format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", format.file_name()),
        ),
    ];
    Ok((headers, body).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeacherParams {
    pub teacher: String,
    pub available: bool,
    #[serde(default)]
    pub new_teacher: Option<String>,
    #[serde(default)]
    pub update_old_timetable: bool,
}

/// POST /api/timetable/updateTeacher
///
/// Marks every subject of a teacher (un)available, records the replacement,
/// and optionally relabels sessions in already-stored timetables.
pub async fn handle_update_teacher(
    State(state): State<AppState>,
    Query(params): Query<UpdateTeacherParams>,
) -> Result<Json<Value>, AppError> {
    if params.teacher.trim().is_empty() {
        return Err(AppError::InvalidRequest("teacher name is required".to_string()));
    }
    if !params.available && params.new_teacher.is_none() {
        return Err(AppError::InvalidRequest(
            "newTeacher is required when marking a teacher unavailable".to_string(),
        ));
    }

    let touched = state.store.set_faculty_availability(
        &params.teacher,
        params.available,
        params.new_teacher.as_deref(),
        params.update_old_timetable,
    );
    if touched == 0 {
        return Err(AppError::NotFound(format!(
            "no subjects taught by '{}'",
            params.teacher
        )));
    }

    Ok(Json(json!({
        "status": "success",
        "message": format!("Teacher update processed for {}", params.teacher),
        "subjectsUpdated": touched
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::subject::Subject;
    use crate::store::DomainStore;
    use crate::timetable::engine::SolverConfig;
    use std::sync::Arc;

    fn make_state() -> AppState {
        AppState {
            store: Arc::new(DomainStore::new()),
            solver: SolverConfig::default(),
            config: Config {
                port: 0,
                rust_log: "info".to_string(),
                solver_max_backtracks: 10_000,
                solver_timeout_ms: 2_000,
            },
        }
    }

    fn make_subject(code: &str, hours: i32, lab: bool) -> Subject {
        Subject {
            code: code.to_string(),
            name: format!("Subject {code}"),
            department: "CSE".to_string(),
            faculty: format!("Faculty {code}"),
            alternate_faculty: None,
            hours_per_week: hours,
            lab_required: lab,
            available: true,
        }
    }

    fn make_request(subjects: Vec<Subject>) -> GenerateRequest {
        GenerateRequest {
            department: "CSE".to_string(),
            semester: "5".to_string(),
            subjects,
            max_sessions_per_day: 2,
            desired_free_periods: 9,
        }
    }

    #[tokio::test]
    async fn test_generate_stores_and_returns_timetable() {
        let state = make_state();
        let subjects = vec![make_subject("CS101", 3, false), make_subject("CS102", 4, true)];
        for s in &subjects {
            state.store.upsert_subject(s.clone());
        }

        let Json(timetable) =
            handle_generate(State(state.clone()), Json(make_request(subjects)))
                .await
                .unwrap();
        assert_eq!(timetable.sessions.len(), 7);

        let stored = state
            .store
            .get_timetable(&timetable.key())
            .expect("generation should commit the timetable");
        assert_eq!(stored.sessions, timetable.sessions);
    }

    #[tokio::test]
    async fn test_fresh_generation_validates_as_valid() {
        let state = make_state();
        let subjects = vec![make_subject("CS101", 3, false), make_subject("CS102", 4, true)];
        for s in &subjects {
            state.store.upsert_subject(s.clone());
        }
        handle_generate(State(state.clone()), Json(make_request(subjects)))
            .await
            .unwrap();

        let Json(response) = handle_validate(State(state), None).await.unwrap();
        assert_eq!(response.status, "valid");
        assert!(response.violations.is_none());
    }

    #[tokio::test]
    async fn test_validate_without_timetable_is_empty_timetable() {
        let state = make_state();
        let err = handle_validate(State(state), None).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyTimetable(_)));
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_previous_timetable() {
        let state = make_state();
        state.store.upsert_subject(make_subject("CS101", 3, false));
        handle_generate(
            State(state.clone()),
            Json(make_request(vec![make_subject("CS101", 3, false)])),
        )
        .await
        .unwrap();

        // Second request references a subject the store does not know.
        let err = handle_generate(
            State(state.clone()),
            Json(make_request(vec![make_subject("GHOST", 3, false)])),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));

        let stored = state
            .store
            .get_timetable(&crate::models::timetable::TimetableKey::new("CSE", "5"))
            .unwrap();
        assert_eq!(
            stored.sessions.iter().filter(|s| s.subject_code == "CS101").count(),
            3,
            "failed generation must not touch the stored timetable"
        );
    }

    #[tokio::test]
    async fn test_same_key_generation_in_flight_gets_busy() {
        let state = make_state();
        state.store.upsert_subject(make_subject("CS101", 3, false));
        let key = crate::models::timetable::TimetableKey::new("CSE", "5");

        // Simulate an in-flight generation holding the key's lock.
        let permit = state.store.begin_generation(&key).unwrap();
        let err = handle_generate(
            State(state.clone()),
            Json(make_request(vec![make_subject("CS101", 3, false)])),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Busy));
        assert!(state.store.get_timetable(&key).is_none());

        // Once the lock is released the same request goes through.
        drop(permit);
        handle_generate(
            State(state.clone()),
            Json(make_request(vec![make_subject("CS101", 3, false)])),
        )
        .await
        .unwrap();
        assert!(state.store.get_timetable(&key).is_some());
    }

    #[tokio::test]
    async fn test_update_teacher_requires_replacement_when_unavailable() {
        let state = make_state();
        state.store.upsert_subject(make_subject("CS101", 3, false));

        let err = handle_update_teacher(
            State(state),
            Query(UpdateTeacherParams {
                teacher: "Faculty CS101".to_string(),
                available: false,
                new_teacher: None,
                update_old_timetable: false,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_download_unknown_format_rejected() {
        let state = make_state();
        let err = handle_download(
            State(state),
            Path("pdf".to_string()),
            Query(KeySelector::default()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }
}
