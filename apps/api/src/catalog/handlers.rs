//! HTTP handlers for the subject and faculty-preference stores.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::models::preference::FacultyPreference;
use crate::models::subject::Subject;
use crate::state::AppState;

fn check_subject(subject: &Subject) -> Result<(), AppError> {
    let mut problems = Vec::new();
    if subject.code.trim().is_empty() {
        problems.push("subject code is required");
    }
    if subject.name.trim().is_empty() {
        problems.push("subject name is required");
    }
    if subject.faculty.trim().is_empty() {
        problems.push("faculty is required");
    }
    if subject.hours_per_week <= 0 {
        problems.push("hoursPerWeek must be positive");
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(problems.join("; ")))
    }
}

/// GET /api/subjects
pub async fn handle_list_subjects(State(state): State<AppState>) -> Json<Vec<Subject>> {
    Json(state.store.list_subjects())
}

/// POST /api/subjects
pub async fn handle_create_subject(
    State(state): State<AppState>,
    Json(subject): Json<Subject>,
) -> Result<Json<Value>, AppError> {
    check_subject(&subject)?;
    info!(code = %subject.code, "subject upserted");
    state.store.upsert_subject(subject);
    Ok(Json(json!({
        "status": "success",
        "message": "Subject saved successfully"
    })))
}

/// GET /api/subjects/:code
pub async fn handle_get_subject(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Subject>, AppError> {
    state
        .store
        .get_subject(&code)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Subject '{code}' not found")))
}

/// GET /api/subjects/department/:department
pub async fn handle_subjects_by_department(
    State(state): State<AppState>,
    Path(department): Path<String>,
) -> Json<Vec<Subject>> {
    Json(state.store.subjects_by_department(&department))
}

/// PUT /api/subjects/:code
pub async fn handle_update_subject(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(mut subject): Json<Subject>,
) -> Result<Json<Subject>, AppError> {
    if state.store.get_subject(&code).is_none() {
        return Err(AppError::NotFound(format!("Subject '{code}' not found")));
    }
    // The path segment names the record being replaced.
    subject.code = code;
    check_subject(&subject)?;
    state.store.upsert_subject(subject.clone());
    Ok(Json(subject))
}

/// DELETE /api/subjects/:code
pub async fn handle_delete_subject(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .store
        .remove_subject(&code)
        .ok_or_else(|| AppError::NotFound(format!("Subject '{code}' not found")))?;
    Ok(Json(json!({
        "status": "success",
        "message": "Subject deleted successfully"
    })))
}

/// POST /api/faculty/preferences
pub async fn handle_add_preference(
    State(state): State<AppState>,
    Json(preference): Json<FacultyPreference>,
) -> Result<Json<Value>, AppError> {
    if preference.faculty.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Faculty name is required".to_string(),
        ));
    }
    if preference.preferred_days.is_empty() {
        return Err(AppError::InvalidRequest(
            "At least one preferred day is required".to_string(),
        ));
    }
    if preference.preferred_time.is_empty() {
        return Err(AppError::InvalidRequest(
            "At least one preferred time slot is required".to_string(),
        ));
    }

    info!(faculty = %preference.faculty, "faculty preference stored");
    state.store.put_preference(preference.clone());
    Ok(Json(json!({
        "status": "success",
        "message": "Faculty preference added successfully",
        "data": preference
    })))
}

/// GET /api/faculty/preferences/:faculty
pub async fn handle_get_preference(
    State(state): State<AppState>,
    Path(faculty): Path<String>,
) -> Result<Json<FacultyPreference>, AppError> {
    state
        .store
        .get_preference(&faculty)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No preference stored for '{faculty}'")))
}

/// GET /api/faculty/preferences
pub async fn handle_list_preferences(
    State(state): State<AppState>,
) -> Json<Vec<FacultyPreference>> {
    Json(state.store.list_preferences())
}
