//! Trial-response store.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::models::{NewTrial, TrialResponse};
use crate::{Error, Result};

/// Insert one trial row. `responded_at` is server-set at insert time.
///
/// Takes a connection so the completion handler can run many inserts inside
/// one transaction; single-trial creation passes a pooled connection the
/// same way.
pub async fn insert_trial(
    conn: &mut SqliteConnection,
    participant_rowid: i64,
    new: &NewTrial,
) -> Result<TrialResponse> {
    let responded_at = Utc::now();
    let presented = serde_json::to_string(&new.presented_symbols)
        .map_err(|e| Error::Internal(format!("failed to serialize presented symbols: {}", e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO trial_responses (
            participant_id, trial_number, is_practice, target_word, symbol_type,
            block_type, presented_symbols, selected_symbol, is_correct,
            reaction_time, error_count, responded_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(participant_rowid)
    .bind(new.trial_number)
    .bind(new.is_practice)
    .bind(&new.target_word)
    .bind(new.symbol_type.as_str())
    .bind(&new.block_type)
    .bind(&presented)
    .bind(&new.selected_symbol)
    .bind(new.is_correct)
    .bind(new.reaction_time)
    .bind(new.error_count)
    .bind(responded_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(TrialResponse {
        id: result.last_insert_rowid(),
        participant_id: participant_rowid,
        trial_number: new.trial_number,
        is_practice: new.is_practice,
        target_word: new.target_word.clone(),
        symbol_type: new.symbol_type,
        block_type: new.block_type.clone(),
        presented_symbols: new.presented_symbols.clone(),
        selected_symbol: new.selected_symbol.clone(),
        is_correct: new.is_correct,
        reaction_time: new.reaction_time,
        error_count: new.error_count,
        responded_at,
    })
}

/// All trials for one participant, practice and main, in trial order.
pub async fn list_for_participant(
    pool: &SqlitePool,
    participant_rowid: i64,
) -> Result<Vec<TrialResponse>> {
    let rows = sqlx::query(
        "SELECT * FROM trial_responses WHERE participant_id = ? ORDER BY is_practice DESC, trial_number, id",
    )
    .bind(participant_rowid)
    .fetch_all(pool)
    .await?;

    rows.iter().map(trial_from_row).collect()
}

/// Every main-block trial in the data set, grouped by participant.
/// Export-only bulk read.
pub async fn list_all_main_trials(pool: &SqlitePool) -> Result<Vec<TrialResponse>> {
    let rows = sqlx::query(
        "SELECT * FROM trial_responses WHERE is_practice = 0 ORDER BY participant_id, trial_number, id",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(trial_from_row).collect()
}

fn trial_from_row(row: &SqliteRow) -> Result<TrialResponse> {
    let symbol_type: String = row.try_get("symbol_type")?;
    let presented: String = row.try_get("presented_symbols")?;
    let responded_at: String = row.try_get("responded_at")?;

    Ok(TrialResponse {
        id: row.try_get("id")?,
        participant_id: row.try_get("participant_id")?,
        trial_number: row.try_get("trial_number")?,
        is_practice: row.try_get("is_practice")?,
        target_word: row.try_get("target_word")?,
        symbol_type: symbol_type.parse()?,
        block_type: row.try_get("block_type")?,
        presented_symbols: serde_json::from_str(&presented)
            .map_err(|e| Error::Internal(format!("bad presented_symbols in database: {}", e)))?,
        selected_symbol: row.try_get("selected_symbol")?,
        is_correct: row.try_get("is_correct")?,
        reaction_time: row.try_get("reaction_time")?,
        error_count: row.try_get("error_count")?,
        responded_at: super::parse_timestamp(&responded_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::participants;
    use crate::models::{BlockOrder, Gender, NewParticipant, SymbolType, Vision};

    async fn setup() -> (SqlitePool, i64, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::init_database(&dir.path().join("t.db"))
            .await
            .unwrap();
        let participant = participants::create_participant(
            &pool,
            &NewParticipant {
                name: "t".to_string(),
                phone_last4: "0000".to_string(),
                age: 30,
                gender: Gender::Male,
                education: String::new(),
                vision: Vision::Normal,
                has_aac_experience: false,
                has_aac_education: false,
                consent_agreed: true,
                block_order: BlockOrder::KaacFirst,
                started_at: Utc::now(),
                completed_at: None,
            },
        )
        .await
        .unwrap();
        (pool, participant.id, dir)
    }

    fn trial(number: i64, practice: bool) -> NewTrial {
        NewTrial {
            trial_number: number,
            is_practice: practice,
            target_word: "좋아요".to_string(),
            symbol_type: SymbolType::Ai,
            block_type: "ai".to_string(),
            presented_symbols: vec![],
            selected_symbol: "x".to_string(),
            is_correct: true,
            reaction_time: 500,
            error_count: 0,
        }
    }

    #[tokio::test]
    async fn insert_and_list_round_trip() {
        let (pool, participant_id, _dir) = setup().await;

        let mut conn = pool.acquire().await.unwrap();
        insert_trial(&mut conn, participant_id, &trial(1, true))
            .await
            .unwrap();
        insert_trial(&mut conn, participant_id, &trial(1, false))
            .await
            .unwrap();
        insert_trial(&mut conn, participant_id, &trial(2, false))
            .await
            .unwrap();
        drop(conn);

        let trials = list_for_participant(&pool, participant_id).await.unwrap();
        assert_eq!(trials.len(), 3);
        assert!(trials[0].is_practice);
        assert_eq!(trials[1].trial_number, 1);
        assert!(!trials[1].is_practice);
        assert_eq!(trials[1].reaction_time, 500);
        assert!(trials[1].presented_symbols.is_empty());

        let main = list_all_main_trials(&pool).await.unwrap();
        assert_eq!(main.len(), 2);
    }

    #[tokio::test]
    async fn negative_reaction_time_is_rejected_by_schema() {
        let (pool, participant_id, _dir) = setup().await;

        let mut bad = trial(1, false);
        bad.reaction_time = -10;

        let mut conn = pool.acquire().await.unwrap();
        let result = insert_trial(&mut conn, participant_id, &bad).await;
        assert!(result.is_err());
    }
}
