//! Participant CRUD endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use symex_common::db::participants;
use symex_common::models::{BlockOrder, Gender, NewParticipant, Participant, Vision};

use crate::api::{resolve_participant, ApiError};
use crate::AppState;

/// Direct-creation payload; unlike the completion path, consent is taken
/// from the payload rather than implied.
#[derive(Debug, Deserialize)]
pub struct CreateParticipantRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    phone_last4: String,
    #[serde(default)]
    age: i64,
    #[serde(default = "default_gender")]
    gender: Gender,
    #[serde(default = "default_vision")]
    vision: Vision,
    #[serde(default)]
    education: String,
    #[serde(default)]
    has_aac_experience: bool,
    #[serde(default)]
    has_aac_education: bool,
    #[serde(default)]
    consent_agreed: bool,
    #[serde(default = "default_block_order")]
    block_order: BlockOrder,
}

fn default_gender() -> Gender {
    Gender::Male
}

fn default_vision() -> Vision {
    Vision::Normal
}

fn default_block_order() -> BlockOrder {
    BlockOrder::AiFirst
}

/// POST /api/participants/
pub async fn create_participant(
    State(state): State<AppState>,
    payload: Result<Json<CreateParticipantRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let participant = participants::create_participant(
        &state.db,
        &NewParticipant {
            name: req.name,
            phone_last4: req.phone_last4,
            age: req.age,
            gender: req.gender,
            education: req.education,
            vision: req.vision,
            has_aac_experience: req.has_aac_experience,
            has_aac_education: req.has_aac_education,
            consent_agreed: req.consent_agreed,
            block_order: req.block_order,
            started_at: Utc::now(),
            completed_at: None,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(participant)))
}

/// GET /api/participants/list/
pub async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    let all = participants::list_all(&state.db).await?;
    Ok(Json(all))
}

/// GET /api/participants/:participant_id/
pub async fn get_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> Result<Json<Participant>, ApiError> {
    let participant = resolve_participant(&state.db, &participant_id).await?;
    Ok(Json(participant))
}
