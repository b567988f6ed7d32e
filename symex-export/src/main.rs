//! symex-export - batch export of all experiment data to an Excel workbook
//!
//! Standalone, run-to-completion process. Connects read-only, so it can run
//! while the collection service is live.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;

use symex_common::config;

mod report;
mod stats;

/// Command-line arguments for symex-export
#[derive(Parser, Debug)]
#[command(name = "symex-export")]
#[command(about = "Export AAC experiment data to a multi-sheet Excel workbook")]
#[command(version)]
struct Args {
    /// Root folder holding the experiment database
    #[arg(short, long, env = "SYMEX_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Database file (overrides the root-folder default)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Directory the workbook is written into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "symex_export=info".into()),
        )
        .init();

    let args = Args::parse();

    let db_path = args.db_path.unwrap_or_else(|| {
        let root_folder =
            config::resolve_root_folder(args.root_folder.as_deref(), "SYMEX_ROOT_FOLDER");
        config::database_path(&root_folder)
    });
    info!("Database path: {}", db_path.display());

    let pool = symex_common::db::connect_readonly(&db_path)
        .await
        .context("Failed to open database read-only")?;

    let data = report::load_all(&pool)
        .await
        .context("Failed to read experiment data")?;

    info!(
        "Exporting {} participants, {} main trials, {} legacy preferences, {} word preferences",
        data.participants.len(),
        data.main_trials.len(),
        data.legacy_preferences.len(),
        data.symbol_preferences.len()
    );

    let path = report::export_all(&data, &args.output_dir, Utc::now())?;
    info!("Workbook written: {}", path.display());

    Ok(())
}
