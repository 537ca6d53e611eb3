pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::catalog::handlers as catalog;
use crate::state::AppState;
use crate::timetable::handlers as timetable;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Subjects
        .route(
            "/api/subjects",
            get(catalog::handle_list_subjects).post(catalog::handle_create_subject),
        )
        .route(
            "/api/subjects/department/:department",
            get(catalog::handle_subjects_by_department),
        )
        .route(
            "/api/subjects/:code",
            get(catalog::handle_get_subject)
                .put(catalog::handle_update_subject)
                .delete(catalog::handle_delete_subject),
        )
        // Faculty preferences
        .route(
            "/api/faculty/preferences",
            get(catalog::handle_list_preferences).post(catalog::handle_add_preference),
        )
        .route(
            "/api/faculty/preferences/:faculty",
            get(catalog::handle_get_preference),
        )
        // Timetable
        .route("/api/timetable", get(timetable::handle_get_timetable))
        .route("/api/timetable/generate", post(timetable::handle_generate))
        .route("/api/timetable/validate", post(timetable::handle_validate))
        .route(
            "/api/timetable/download/:format",
            get(timetable::handle_download),
        )
        .route(
            "/api/timetable/updateTeacher",
            post(timetable::handle_update_teacher),
        )
        .with_state(state)
}
