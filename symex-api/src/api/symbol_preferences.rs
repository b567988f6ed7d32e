//! Per-word symbol-preference endpoints: submission, listing, and the
//! aggregate summary used by the researchers' dashboard.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use symex_common::db::preferences;
use symex_common::models::{ChoiceType, NewSymbolPreference, PreferenceChoice, SymbolSide};
use symex_common::vocab::VOCABULARY;

use crate::api::{resolve_participant, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    participant_id: Option<String>,
    #[serde(default)]
    preferences: Vec<NewSymbolPreference>,
}

#[derive(Debug, Serialize)]
struct SymbolPreferenceEntry {
    target_word: String,
    ai_position: SymbolSide,
    chosen: PreferenceChoice,
    chosen_type: ChoiceType,
    created_at: DateTime<Utc>,
}

/// POST /api/submit-symbol-preferences/
///
/// Exactly one judgment per vocabulary word; a resubmission replaces the
/// participant's whole set. The chosen/chosen_type mapping is computed
/// client-side and stored verbatim.
pub async fn submit_symbol_preferences(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let Some(code) = req.participant_id else {
        return Err(ApiError::invalid("participant_id is required"));
    };
    if req.preferences.len() != VOCABULARY.len() {
        return Err(ApiError::invalid(format!(
            "preferences for all {} vocabulary words are required",
            VOCABULARY.len()
        )));
    }

    let participant = resolve_participant(&state.db, &code).await?;

    let created =
        preferences::replace_symbol_preferences(&state.db, participant.id, &req.preferences)
            .await?;

    let summary: Vec<_> = created
        .iter()
        .map(|p| {
            json!({
                "target_word": p.target_word,
                "chosen_type": p.chosen_type,
            })
        })
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Symbol preferences saved successfully",
            "participant_id": participant.participant_id,
            "count": created.len(),
            "preferences": summary,
        })),
    ))
}

/// GET /api/symbol-preferences/:participant_id/
pub async fn list_symbol_preferences(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let participant = resolve_participant(&state.db, &participant_id).await?;

    let stored = preferences::list_symbol_preferences(&state.db, participant.id).await?;
    let entries: Vec<SymbolPreferenceEntry> = stored
        .into_iter()
        .map(|p| SymbolPreferenceEntry {
            target_word: p.target_word,
            ai_position: p.ai_position,
            chosen: p.chosen,
            chosen_type: p.chosen_type,
            created_at: p.created_at,
        })
        .collect();

    Ok(Json(json!({
        "participant_id": participant.participant_id,
        "count": entries.len(),
        "preferences": entries,
    })))
}

#[derive(Debug, Default, Serialize)]
pub struct WordStats {
    ai: i64,
    kaac: i64,
    similar: i64,
    total: i64,
}

#[derive(Debug, Serialize)]
pub struct OverallStats {
    ai: i64,
    kaac: i64,
    similar: i64,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    total_responses: i64,
    total_participants: i64,
    overall_stats: OverallStats,
    word_stats: BTreeMap<String, WordStats>,
}

/// GET /api/preference-summary/
///
/// Word-level statistics iterate the fixed vocabulary; rows with words
/// outside it still count toward `total_responses` but never get a word row.
pub async fn preference_summary(
    State(state): State<AppState>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let counts = preferences::choice_type_counts(&state.db).await?;

    let mut word_stats: BTreeMap<String, WordStats> = VOCABULARY
        .iter()
        .map(|word| (word.to_string(), WordStats::default()))
        .collect();
    let mut overall = OverallStats {
        ai: 0,
        kaac: 0,
        similar: 0,
    };

    for (word, choice_type, count) in counts {
        match choice_type {
            ChoiceType::Ai => overall.ai += count,
            ChoiceType::Kaac => overall.kaac += count,
            ChoiceType::Similar => overall.similar += count,
        }
        if let Some(stats) = word_stats.get_mut(&word) {
            match choice_type {
                ChoiceType::Ai => stats.ai += count,
                ChoiceType::Kaac => stats.kaac += count,
                ChoiceType::Similar => stats.similar += count,
            }
            stats.total += count;
        }
    }

    Ok(Json(SummaryResponse {
        total_responses: preferences::count_symbol_preferences(&state.db).await?,
        total_participants: preferences::count_participants_with_preferences(&state.db).await?,
        overall_stats: overall,
        word_stats,
    }))
}
