//! HTTP API handlers for symex-api

pub mod error;
pub mod experiment;
pub mod health;
pub mod participants;
pub mod preferences;
pub mod symbol_preferences;
pub mod trials;

pub use error::ApiError;
pub use experiment::complete_experiment;
pub use health::health;
pub use participants::{create_participant, get_participant, list_participants};
pub use preferences::{create_preference, get_preference};
pub use symbol_preferences::{list_symbol_preferences, preference_summary, submit_symbol_preferences};
pub use trials::{create_trial, list_trials};

use sqlx::SqlitePool;
use symex_common::db::participants as participant_store;
use symex_common::models::Participant;

/// Resolve a public participant code or fail with the canonical 404 body.
pub(crate) async fn resolve_participant(
    db: &SqlitePool,
    code: &str,
) -> Result<Participant, ApiError> {
    participant_store::get_by_code(db, code)
        .await?
        .ok_or_else(|| ApiError::not_found("Participant not found"))
}
