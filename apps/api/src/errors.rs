use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or structurally impossible input — the caller's fault,
    /// reported before any search starts.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The search exhausted its backtracking budget or deadline without
    /// fully placing every subject. Carries what could not be placed.
    #[error("Timetable generation infeasible: could not place {}", unplaced.join(", "))]
    Infeasible {
        unplaced: Vec<String>,
        placed_sessions: usize,
    },

    /// Another generation holds the key's lock, or a concurrent generation
    /// for another key committed conflicting faculty slots first.
    /// Safe to retry after backoff.
    #[error("A conflicting timetable generation is in flight")]
    Busy,

    /// Validate/export requested but no timetable has been generated for
    /// the key yet.
    #[error("No timetable generated yet: {0}")]
    EmptyTimetable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            AppError::Infeasible { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INFEASIBLE",
                self.to_string(),
            ),
            AppError::Busy => (StatusCode::CONFLICT, "BUSY", self.to_string()),
            AppError::EmptyTimetable(msg) => {
                (StatusCode::NOT_FOUND, "EMPTY_TIMETABLE", msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error_body = json!({
            "code": code,
            "message": message
        });

        // Infeasible responses carry the partial diagnostic so the caller
        // can see which subjects did not fit.
        if let AppError::Infeasible {
            unplaced,
            placed_sessions,
        } = &self
        {
            error_body["unplacedSubjects"] = json!(unplaced);
            error_body["placedSessions"] = json!(placed_sessions);
        }

        let body = Json(json!({ "error": error_body }));
        (status, body).into_response()
    }
}
