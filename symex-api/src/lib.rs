//! symex-api library - experiment data-collection HTTP service
//!
//! Receives trial-by-trial results, demographics, and preference judgments
//! from the browser-based experiment runner and persists them to SQLite.

use axum::Router;
use sqlx::SqlitePool;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
///
/// All endpoints are open access: the experiment runner is an internal
/// research tool, and the CORS allow-list applied in `main` is the only
/// boundary.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/health", get(api::health))
        .route("/api/complete-experiment/", post(api::complete_experiment))
        .route("/api/participants/", post(api::create_participant))
        .route("/api/participants/list/", get(api::list_participants))
        .route("/api/participants/:participant_id/", get(api::get_participant))
        .route("/api/trials/", post(api::create_trial))
        .route("/api/trials/:participant_id/", get(api::list_trials))
        .route("/api/preference/", post(api::create_preference))
        .route("/api/preference/:participant_id/", get(api::get_preference))
        .route("/api/submit-symbol-preferences/", post(api::submit_symbol_preferences))
        .route("/api/symbol-preferences/:participant_id/", get(api::list_symbol_preferences))
        .route("/api/preference-summary/", get(api::preference_summary))
        .with_state(state)
}
