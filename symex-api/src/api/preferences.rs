//! Legacy whole-session preference endpoints.
//!
//! Superseded by the per-word symbol preferences; kept for older client
//! versions that still submit a single overall judgment.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use symex_common::db::preferences;
use symex_common::models::{ChoiceType, NewPreference, Preference};

use crate::api::{resolve_participant, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePreferenceRequest {
    participant_id: Option<String>,
    easier_to_understand: ChoiceType,
    preference: ChoiceType,
    #[serde(default)]
    reason: String,
}

/// POST /api/preference/
pub async fn create_preference(
    State(state): State<AppState>,
    payload: Result<Json<CreatePreferenceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let Some(code) = req.participant_id else {
        return Err(ApiError::invalid("participant_id is required"));
    };
    let participant = resolve_participant(&state.db, &code).await?;

    let preference = preferences::insert_preference(
        &state.db,
        participant.id,
        &NewPreference {
            easier_to_understand: req.easier_to_understand,
            preference: req.preference,
            reason: req.reason,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(preference)))
}

/// GET /api/preference/:participant_id/
///
/// Both a missing participant and a participant without a stored judgment
/// report the same not-found body.
pub async fn get_preference(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> Result<Json<Preference>, ApiError> {
    let participant = symex_common::db::participants::get_by_code(&state.db, &participant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Data not found"))?;

    let preference = preferences::get_preference(&state.db, participant.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Data not found"))?;

    Ok(Json(preference))
}
