//! Preference stores: the legacy whole-session judgment and the per-word
//! symbol preferences it was superseded by.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::{
    ChoiceType, NewPreference, NewSymbolPreference, Preference, SymbolPreference,
};
use crate::Result;

// ---------------------------------------------------------------------------
// Legacy preferences
// ---------------------------------------------------------------------------

pub async fn insert_preference(
    pool: &SqlitePool,
    participant_rowid: i64,
    new: &NewPreference,
) -> Result<Preference> {
    let created_at = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO preferences (participant_id, easier_to_understand, preference, reason, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(participant_rowid)
    .bind(new.easier_to_understand.as_str())
    .bind(new.preference.as_str())
    .bind(&new.reason)
    .bind(created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(Preference {
        id: result.last_insert_rowid(),
        participant_id: participant_rowid,
        easier_to_understand: new.easier_to_understand,
        preference: new.preference,
        reason: new.reason.clone(),
        created_at,
    })
}

/// At most one row per participant by convention; the earliest wins if older
/// clients ever submitted twice.
pub async fn get_preference(
    pool: &SqlitePool,
    participant_rowid: i64,
) -> Result<Option<Preference>> {
    let row = sqlx::query("SELECT * FROM preferences WHERE participant_id = ? ORDER BY id LIMIT 1")
        .bind(participant_rowid)
        .fetch_optional(pool)
        .await?;

    row.map(|r| preference_from_row(&r)).transpose()
}

/// Export-only bulk read, newest first.
pub async fn list_all_preferences(pool: &SqlitePool) -> Result<Vec<Preference>> {
    let rows = sqlx::query("SELECT * FROM preferences ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await?;

    rows.iter().map(preference_from_row).collect()
}

fn preference_from_row(row: &SqliteRow) -> Result<Preference> {
    let easier: String = row.try_get("easier_to_understand")?;
    let preference: String = row.try_get("preference")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Preference {
        id: row.try_get("id")?,
        participant_id: row.try_get("participant_id")?,
        easier_to_understand: easier.parse()?,
        preference: preference.parse()?,
        reason: row.try_get("reason")?,
        created_at: super::parse_timestamp(&created_at)?,
    })
}

// ---------------------------------------------------------------------------
// Per-word symbol preferences
// ---------------------------------------------------------------------------

/// Replace a participant's symbol preferences wholesale.
///
/// Delete and the 7 inserts run in one transaction: a resubmission either
/// fully replaces the old set or leaves it untouched. The UNIQUE
/// (participant, word) constraint holds throughout.
pub async fn replace_symbol_preferences(
    pool: &SqlitePool,
    participant_rowid: i64,
    entries: &[NewSymbolPreference],
) -> Result<Vec<SymbolPreference>> {
    let created_at = Utc::now();
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM symbol_preferences WHERE participant_id = ?")
        .bind(participant_rowid)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted > 0 {
        tracing::warn!(
            "Replaced {} existing symbol preferences for participant {}",
            deleted,
            participant_rowid
        );
    }

    let mut created = Vec::with_capacity(entries.len());
    for entry in entries {
        let result = sqlx::query(
            r#"
            INSERT INTO symbol_preferences (participant_id, target_word, ai_position, chosen, chosen_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(participant_rowid)
        .bind(&entry.target_word)
        .bind(entry.ai_position.as_str())
        .bind(entry.chosen.as_str())
        .bind(entry.chosen_type.as_str())
        .bind(created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        created.push(SymbolPreference {
            id: result.last_insert_rowid(),
            participant_id: participant_rowid,
            target_word: entry.target_word.clone(),
            ai_position: entry.ai_position,
            chosen: entry.chosen,
            chosen_type: entry.chosen_type,
            created_at,
        });
    }

    tx.commit().await?;
    Ok(created)
}

/// One participant's word preferences, in word order.
pub async fn list_symbol_preferences(
    pool: &SqlitePool,
    participant_rowid: i64,
) -> Result<Vec<SymbolPreference>> {
    let rows = sqlx::query(
        "SELECT * FROM symbol_preferences WHERE participant_id = ? ORDER BY target_word",
    )
    .bind(participant_rowid)
    .fetch_all(pool)
    .await?;

    rows.iter().map(symbol_preference_from_row).collect()
}

/// Export-only bulk read.
pub async fn list_all_symbol_preferences(pool: &SqlitePool) -> Result<Vec<SymbolPreference>> {
    let rows =
        sqlx::query("SELECT * FROM symbol_preferences ORDER BY participant_id, target_word")
            .fetch_all(pool)
            .await?;

    rows.iter().map(symbol_preference_from_row).collect()
}

/// (word, choice type, count) over the whole table, one grouped query.
pub async fn choice_type_counts(pool: &SqlitePool) -> Result<Vec<(String, ChoiceType, i64)>> {
    let rows = sqlx::query(
        "SELECT target_word, chosen_type, COUNT(*) AS n FROM symbol_preferences GROUP BY target_word, chosen_type",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let word: String = row.try_get("target_word")?;
            let chosen_type: String = row.try_get("chosen_type")?;
            let count: i64 = row.try_get("n")?;
            Ok((word, chosen_type.parse()?, count))
        })
        .collect()
}

/// Total stored judgments.
pub async fn count_symbol_preferences(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM symbol_preferences")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Distinct participants who submitted at least one judgment.
pub async fn count_participants_with_preferences(pool: &SqlitePool) -> Result<i64> {
    let count =
        sqlx::query_scalar("SELECT COUNT(DISTINCT participant_id) FROM symbol_preferences")
            .fetch_one(pool)
            .await?;
    Ok(count)
}

fn symbol_preference_from_row(row: &SqliteRow) -> Result<SymbolPreference> {
    let ai_position: String = row.try_get("ai_position")?;
    let chosen: String = row.try_get("chosen")?;
    let chosen_type: String = row.try_get("chosen_type")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(SymbolPreference {
        id: row.try_get("id")?,
        participant_id: row.try_get("participant_id")?,
        target_word: row.try_get("target_word")?,
        ai_position: ai_position.parse()?,
        chosen: chosen.parse()?,
        chosen_type: chosen_type.parse()?,
        created_at: super::parse_timestamp(&created_at)?,
    })
}
