//! Participant store: identifier allocation, inserts, lookups.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::models::{NewParticipant, Participant};
use crate::Result;

/// Allocate the next participant code (`P0001`, `P0002`, ...).
///
/// Must run inside the same transaction as the insert that uses the code:
/// the allocation reads the current maximum suffix, and the UNIQUE
/// constraint on `participant_id` rejects the loser of any remaining race.
pub async fn next_participant_id(conn: &mut SqliteConnection) -> Result<String> {
    let max_suffix: Option<i64> = sqlx::query_scalar(
        "SELECT MAX(CAST(substr(participant_id, 2) AS INTEGER)) FROM participants",
    )
    .fetch_one(&mut *conn)
    .await?;

    Ok(format!("P{:04}", max_suffix.unwrap_or(0) + 1))
}

/// Insert a participant row under an already-allocated code. Returns the
/// full record as stored.
pub async fn insert_participant(
    conn: &mut SqliteConnection,
    participant_id: &str,
    new: &NewParticipant,
) -> Result<Participant> {
    let result = sqlx::query(
        r#"
        INSERT INTO participants (
            participant_id, name, phone_last4, age, gender, education, vision,
            has_aac_experience, has_aac_education, consent_agreed, block_order,
            started_at, completed_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(participant_id)
    .bind(&new.name)
    .bind(&new.phone_last4)
    .bind(new.age)
    .bind(new.gender.as_str())
    .bind(&new.education)
    .bind(new.vision.as_str())
    .bind(new.has_aac_experience)
    .bind(new.has_aac_education)
    .bind(new.consent_agreed)
    .bind(new.block_order.as_i64())
    .bind(new.started_at.to_rfc3339())
    .bind(new.completed_at.map(|dt| dt.to_rfc3339()))
    .execute(&mut *conn)
    .await?;

    Ok(Participant {
        id: result.last_insert_rowid(),
        participant_id: participant_id.to_string(),
        name: new.name.clone(),
        phone_last4: new.phone_last4.clone(),
        age: new.age,
        gender: new.gender,
        education: new.education.clone(),
        vision: new.vision,
        has_aac_experience: new.has_aac_experience,
        has_aac_education: new.has_aac_education,
        consent_agreed: new.consent_agreed,
        block_order: new.block_order,
        started_at: new.started_at,
        completed_at: new.completed_at,
    })
}

/// Allocate a code and insert in one transaction (the direct-creation path).
pub async fn create_participant(pool: &SqlitePool, new: &NewParticipant) -> Result<Participant> {
    let mut tx = pool.begin().await?;
    let participant_id = next_participant_id(&mut tx).await?;
    let participant = insert_participant(&mut tx, &participant_id, new).await?;
    tx.commit().await?;
    Ok(participant)
}

/// Look up a participant by public code.
pub async fn get_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Participant>> {
    let row = sqlx::query("SELECT * FROM participants WHERE participant_id = ?")
        .bind(code)
        .fetch_optional(pool)
        .await?;

    row.map(|r| participant_from_row(&r)).transpose()
}

/// All participants, newest session first.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Participant>> {
    let rows = sqlx::query("SELECT * FROM participants ORDER BY started_at DESC, id DESC")
        .fetch_all(pool)
        .await?;

    rows.iter().map(participant_from_row).collect()
}

fn participant_from_row(row: &SqliteRow) -> Result<Participant> {
    let gender: String = row.try_get("gender")?;
    let vision: String = row.try_get("vision")?;
    let block_order: i64 = row.try_get("block_order")?;
    let started_at: String = row.try_get("started_at")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;

    Ok(Participant {
        id: row.try_get("id")?,
        participant_id: row.try_get("participant_id")?,
        name: row.try_get("name")?,
        phone_last4: row.try_get("phone_last4")?,
        age: row.try_get("age")?,
        gender: gender.parse()?,
        education: row.try_get("education")?,
        vision: vision.parse()?,
        has_aac_experience: row.try_get("has_aac_experience")?,
        has_aac_education: row.try_get("has_aac_education")?,
        consent_agreed: row.try_get("consent_agreed")?,
        block_order: block_order.try_into()?,
        started_at: super::parse_timestamp(&started_at)?,
        completed_at: completed_at
            .map(|s| super::parse_timestamp(&s))
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockOrder, Gender, Vision};
    use chrono::Utc;

    fn sample(name: &str) -> NewParticipant {
        NewParticipant {
            name: name.to_string(),
            phone_last4: "1234".to_string(),
            age: 29,
            gender: Gender::Female,
            education: "BA".to_string(),
            vision: Vision::Normal,
            has_aac_experience: false,
            has_aac_education: true,
            consent_agreed: true,
            block_order: BlockOrder::AiFirst,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    async fn test_pool() -> (SqlitePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = super::super::init_database(&dir.path().join("t.db"))
            .await
            .unwrap();
        (pool, dir)
    }

    #[tokio::test]
    async fn codes_are_sequential_and_zero_padded() {
        let (pool, _dir) = test_pool().await;

        let first = create_participant(&pool, &sample("a")).await.unwrap();
        let second = create_participant(&pool, &sample("b")).await.unwrap();

        assert_eq!(first.participant_id, "P0001");
        assert_eq!(second.participant_id, "P0002");
    }

    #[tokio::test]
    async fn lookup_round_trips_typed_fields() {
        let (pool, _dir) = test_pool().await;
        let created = create_participant(&pool, &sample("lookup")).await.unwrap();

        let found = get_by_code(&pool, &created.participant_id)
            .await
            .unwrap()
            .expect("participant should exist");

        assert_eq!(found.name, "lookup");
        assert_eq!(found.gender, Gender::Female);
        assert_eq!(found.block_order, BlockOrder::AiFirst);
        assert!(found.completed_at.is_none());

        assert!(get_by_code(&pool, "P9999").await.unwrap().is_none());
    }
}
