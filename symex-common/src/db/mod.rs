//! Database initialization and access layer.
//!
//! The schema is created idempotently on startup; there is no separate
//! migration tooling. All timestamps are stored as RFC 3339 TEXT.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod participants;
pub mod preferences;
pub mod trials;

/// How long a connection waits on a held write lock before giving up.
/// Matches the 30 s the original deployment tolerated.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Initialize database connection pool and create tables if needed.
///
/// Foreign keys, WAL journaling, and the busy timeout are applied per
/// connection so every pooled handle behaves the same.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_participants_table(&pool).await?;
    create_trial_responses_table(&pool).await?;
    create_preferences_table(&pool).await?;
    create_symbol_preferences_table(&pool).await?;

    Ok(pool)
}

/// Connect to an existing database in read-only mode.
///
/// Used by the export job, which must never write.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::Config(format!(
            "Database not found: {}. Run symex-api first to initialize it.",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .read_only(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

async fn create_participants_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS participants (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            participant_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            phone_last4 TEXT NOT NULL,
            age INTEGER NOT NULL,
            gender TEXT NOT NULL CHECK (gender IN ('male', 'female')),
            education TEXT NOT NULL DEFAULT '',
            vision TEXT NOT NULL CHECK (vision IN ('normal', 'corrected')),
            has_aac_experience INTEGER NOT NULL DEFAULT 0,
            has_aac_education INTEGER NOT NULL DEFAULT 0,
            consent_agreed INTEGER NOT NULL DEFAULT 0,
            block_order INTEGER NOT NULL CHECK (block_order IN (1, 2)),
            started_at TEXT NOT NULL,
            completed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_participants_started ON participants(started_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_trial_responses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trial_responses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            participant_id INTEGER NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
            trial_number INTEGER NOT NULL CHECK (trial_number > 0),
            is_practice INTEGER NOT NULL DEFAULT 0,
            target_word TEXT NOT NULL,
            symbol_type TEXT NOT NULL CHECK (symbol_type IN ('ai', 'kaac')),
            block_type TEXT NOT NULL,
            presented_symbols TEXT NOT NULL DEFAULT '[]',
            selected_symbol TEXT NOT NULL,
            is_correct INTEGER NOT NULL,
            reaction_time INTEGER NOT NULL CHECK (reaction_time >= 0),
            error_count INTEGER NOT NULL DEFAULT 0,
            responded_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_trials_participant ON trial_responses(participant_id, trial_number)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trials_symbol_type ON trial_responses(symbol_type)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_preferences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS preferences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            participant_id INTEGER NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
            easier_to_understand TEXT NOT NULL CHECK (easier_to_understand IN ('ai', 'kaac', 'similar')),
            preference TEXT NOT NULL CHECK (preference IN ('ai', 'kaac', 'similar')),
            reason TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_symbol_preferences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS symbol_preferences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            participant_id INTEGER NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
            target_word TEXT NOT NULL,
            ai_position TEXT NOT NULL CHECK (ai_position IN ('left', 'right')),
            chosen TEXT NOT NULL CHECK (chosen IN ('left', 'right', 'similar')),
            chosen_type TEXT NOT NULL CHECK (chosen_type IN ('ai', 'kaac', 'similar')),
            created_at TEXT NOT NULL,
            UNIQUE (participant_id, target_word)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_symbol_prefs_chosen_type ON symbol_preferences(chosen_type)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Parse an RFC 3339 timestamp read back from the database.
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("bad timestamp '{}' in database: {}", s, e)))
}
