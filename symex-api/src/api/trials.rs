//! Single-trial endpoints.
//!
//! The normal flow saves all trials at once through the completion endpoint;
//! these exist for incremental saving by older client builds. Unlike the
//! bulk path, this one persists the presented-symbol list it is given.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use symex_common::db::trials;
use symex_common::models::{NewTrial, SymbolType, TrialResponse};

use crate::api::{resolve_participant, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTrialRequest {
    participant_id: Option<String>,
    trial_number: i64,
    #[serde(default)]
    is_practice: bool,
    target_word: String,
    symbol_type: SymbolType,
    block_type: Option<String>,
    #[serde(default)]
    presented_symbols: Vec<String>,
    selected_symbol: String,
    is_correct: bool,
    reaction_time: i64,
    #[serde(default)]
    error_count: i64,
}

/// POST /api/trials/
pub async fn create_trial(
    State(state): State<AppState>,
    payload: Result<Json<CreateTrialRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let Some(code) = req.participant_id else {
        return Err(ApiError::invalid("participant_id is required"));
    };
    if req.trial_number <= 0 {
        return Err(ApiError::invalid("trial_number must be positive"));
    }
    if req.reaction_time < 0 {
        return Err(ApiError::invalid("reaction_time must be non-negative"));
    }

    let participant = resolve_participant(&state.db, &code).await?;

    let block_type = req
        .block_type
        .unwrap_or_else(|| req.symbol_type.as_str().to_string());

    let new_trial = NewTrial {
        trial_number: req.trial_number,
        is_practice: req.is_practice,
        target_word: req.target_word,
        symbol_type: req.symbol_type,
        block_type,
        presented_symbols: req.presented_symbols,
        selected_symbol: req.selected_symbol,
        is_correct: req.is_correct,
        reaction_time: req.reaction_time,
        error_count: req.error_count,
    };

    let mut conn = state.db.acquire().await?;
    let trial = trials::insert_trial(&mut conn, participant.id, &new_trial).await?;

    Ok((StatusCode::CREATED, Json(trial)))
}

/// GET /api/trials/:participant_id/
pub async fn list_trials(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> Result<Json<Vec<TrialResponse>>, ApiError> {
    let participant = resolve_participant(&state.db, &participant_id).await?;
    let trials = trials::list_for_participant(&state.db, participant.id).await?;
    Ok(Json(trials))
}
