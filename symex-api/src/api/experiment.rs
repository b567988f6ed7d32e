//! Experiment-completion endpoint: the one atomic multi-table write.
//!
//! The front end submits the whole session in a single payload once the
//! participant finishes; demographics, practice trials, and main trials are
//! persisted in one transaction so a dropped connection or constraint
//! failure leaves no half-saved session behind.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use symex_common::db::{participants, trials};
use symex_common::models::{BlockOrder, Gender, NewParticipant, NewTrial, SymbolType, Vision};

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CompleteExperimentRequest {
    demographic: Option<Demographic>,
    start_time: Option<String>,
    end_time: Option<String>,
    #[serde(default)]
    practice_results: Vec<TrialResult>,
    #[serde(default)]
    trial_results: Vec<TrialResult>,
}

/// Demographic block. Defaults mirror what older front-end builds omitted.
#[derive(Debug, Deserialize)]
pub struct Demographic {
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

/// One trial as the runner reports it. The runner does not send the
/// presented-symbol set here; the stored list is empty for completion saves.
#[derive(Debug, Deserialize)]
pub struct TrialResult {
    #[serde(default)]
    target_word: String,
    symbol_type: SymbolType,
    #[serde(default)]
    selected_symbol: String,
    #[serde(default)]
    is_correct: bool,
    #[serde(default)]
    reaction_time: i64,
    #[serde(default)]
    error_count: i64,
}

impl TrialResult {
    fn to_new_trial(&self, trial_number: i64, is_practice: bool) -> NewTrial {
        NewTrial {
            trial_number,
            is_practice,
            target_word: self.target_word.clone(),
            symbol_type: self.symbol_type,
            block_type: self.symbol_type.as_str().to_string(),
            presented_symbols: vec![],
            selected_symbol: self.selected_symbol.clone(),
            is_correct: self.is_correct,
            reaction_time: self.reaction_time,
            error_count: self.error_count,
        }
    }
}

/// POST /api/complete-experiment/
pub async fn complete_experiment(
    State(state): State<AppState>,
    payload: Result<Json<CompleteExperimentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let Some(demographic) = req.demographic else {
        return Err(ApiError::invalid("demographic data is required"));
    };

    // Session timestamps come from the front end; an absent or unparseable
    // start falls back to now, an absent end stays open.
    let started_at = req
        .start_time
        .as_deref()
        .and_then(parse_client_timestamp)
        .unwrap_or_else(Utc::now);
    let completed_at = req.end_time.as_deref().and_then(parse_client_timestamp);

    info!(
        "Completing experiment: {} practice trials, {} main trials",
        req.practice_results.len(),
        req.trial_results.len()
    );

    let new_participant = NewParticipant {
        name: demographic.name,
        phone_last4: demographic.phone_last4,
        age: demographic.age,
        gender: demographic.gender,
        education: demographic.education,
        vision: demographic.vision,
        has_aac_experience: demographic.has_aac_experience,
        has_aac_education: demographic.has_aac_education,
        // Reaching completion implies consent was given at session start
        consent_agreed: true,
        block_order: demographic.block_order,
        started_at,
        completed_at,
    };

    let mut tx = state.db.begin().await?;

    let code = participants::next_participant_id(&mut tx).await?;
    let participant = participants::insert_participant(&mut tx, &code, &new_participant).await?;

    for (idx, trial) in req.practice_results.iter().enumerate() {
        trials::insert_trial(
            &mut tx,
            participant.id,
            &trial.to_new_trial(idx as i64 + 1, true),
        )
        .await?;
    }

    for (idx, trial) in req.trial_results.iter().enumerate() {
        trials::insert_trial(
            &mut tx,
            participant.id,
            &trial.to_new_trial(idx as i64 + 1, false),
        )
        .await?;
    }

    tx.commit().await?;

    info!("Saved completed session for {}", participant.participant_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Experiment completed successfully",
            "participant_id": participant.participant_id,
        })),
    ))
}

fn parse_client_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
