use std::sync::Arc;

use crate::config::Config;
use crate::store::DomainStore;
use crate::timetable::engine::SolverConfig;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DomainStore>,
    /// Backtrack budget and wall-clock deadline for the search.
    pub solver: SolverConfig,
    pub config: Config,
}
