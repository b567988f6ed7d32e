//! Workbook assembly: denormalized, human-labeled tables for analysis.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Workbook, Worksheet};
use sqlx::SqlitePool;
use tracing::info;

use symex_common::db::{participants, preferences, trials};
use symex_common::models::{ChoiceType, Participant, Preference, SymbolPreference, SymbolType, TrialResponse};
use symex_common::vocab::VOCABULARY;

use crate::stats;

/// Everything the workbook needs, read in one pass.
pub struct ExportData {
    pub participants: Vec<Participant>,
    pub main_trials: Vec<TrialResponse>,
    pub legacy_preferences: Vec<Preference>,
    pub symbol_preferences: Vec<SymbolPreference>,
    pub word_counts: Vec<(String, ChoiceType, i64)>,
}

pub async fn load_all(pool: &SqlitePool) -> Result<ExportData> {
    Ok(ExportData {
        participants: participants::list_all(pool).await?,
        main_trials: trials::list_all_main_trials(pool).await?,
        legacy_preferences: preferences::list_all_preferences(pool).await?,
        symbol_preferences: preferences::list_all_symbol_preferences(pool).await?,
        word_counts: preferences::choice_type_counts(pool).await?,
    })
}

/// Write the workbook into `output_dir`, named with the generation
/// timestamp. Returns the written path.
pub fn export_all(
    data: &ExportData,
    output_dir: &Path,
    generated_at: DateTime<Utc>,
) -> Result<PathBuf> {
    let filename = format!(
        "experiment_data_{}.xlsx",
        generated_at.format("%Y%m%d_%H%M%S")
    );
    let path = output_dir.join(filename);

    let mut workbook = build_workbook(data)?;
    workbook
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

fn build_workbook(data: &ExportData) -> Result<Workbook> {
    let mut workbook = Workbook::new();

    let by_id: HashMap<i64, &Participant> =
        data.participants.iter().map(|p| (p.id, p)).collect();

    write_participants_sheet(workbook.add_worksheet(), data)?;
    write_main_trials_sheet(workbook.add_worksheet(), data, &by_id)?;

    if !data.legacy_preferences.is_empty() {
        write_legacy_preferences_sheet(workbook.add_worksheet(), data, &by_id)?;
    }
    if !data.symbol_preferences.is_empty() {
        write_word_preferences_sheet(workbook.add_worksheet(), data, &by_id)?;
    }

    let word_rows = word_stat_rows(&data.word_counts);
    if !word_rows.is_empty() {
        write_word_stats_sheet(workbook.add_worksheet(), &word_rows)?;
    }

    write_summary_sheet(workbook.add_worksheet(), data)?;

    Ok(workbook)
}

fn write_header(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write(0, col as u16, *header)?;
    }
    Ok(())
}

fn flag(value: bool) -> &'static str {
    if value {
        "O"
    } else {
        "X"
    }
}

fn write_participants_sheet(sheet: &mut Worksheet, data: &ExportData) -> Result<()> {
    sheet.set_name("Participants")?;
    write_header(
        sheet,
        &[
            "Participant ID",
            "Name",
            "Phone Last 4",
            "Age",
            "Gender",
            "Education",
            "Vision",
            "AAC Experience",
            "AAC Education",
            "Block Order",
            "Duration (min)",
        ],
    )?;

    for (i, p) in data.participants.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write(row, 0, &p.participant_id)?;
        sheet.write(row, 1, &p.name)?;
        sheet.write(row, 2, &p.phone_last4)?;
        sheet.write(row, 3, p.age)?;
        sheet.write(row, 4, p.gender.label())?;
        sheet.write(row, 5, &p.education)?;
        sheet.write(row, 6, p.vision.label())?;
        sheet.write(row, 7, flag(p.has_aac_experience))?;
        sheet.write(row, 8, flag(p.has_aac_education))?;
        sheet.write(row, 9, p.block_order.label())?;
        if let Some(duration) = stats::duration_minutes(p.started_at, p.completed_at) {
            sheet.write(row, 10, duration)?;
        }
    }

    info!("Participants sheet: {} rows", data.participants.len());
    Ok(())
}

fn write_main_trials_sheet(
    sheet: &mut Worksheet,
    data: &ExportData,
    by_id: &HashMap<i64, &Participant>,
) -> Result<()> {
    sheet.set_name("Main Trials")?;
    write_header(
        sheet,
        &[
            "Participant ID",
            "Name",
            "Trial #",
            "Target Word",
            "Symbol Type",
            "Block Type",
            "Selected Symbol",
            "Result",
            "Reaction Time (ms)",
            "Error Count",
        ],
    )?;

    for (i, t) in data.main_trials.iter().enumerate() {
        let row = i as u32 + 1;
        if let Some(p) = by_id.get(&t.participant_id) {
            sheet.write(row, 0, &p.participant_id)?;
            sheet.write(row, 1, &p.name)?;
        }
        sheet.write(row, 2, t.trial_number)?;
        sheet.write(row, 3, &t.target_word)?;
        sheet.write(row, 4, t.symbol_type.label())?;
        sheet.write(row, 5, &t.block_type)?;
        sheet.write(row, 6, &t.selected_symbol)?;
        sheet.write(row, 7, if t.is_correct { "correct" } else { "incorrect" })?;
        sheet.write(row, 8, t.reaction_time)?;
        sheet.write(row, 9, t.error_count)?;
    }

    info!("Main Trials sheet: {} rows", data.main_trials.len());
    Ok(())
}

fn write_legacy_preferences_sheet(
    sheet: &mut Worksheet,
    data: &ExportData,
    by_id: &HashMap<i64, &Participant>,
) -> Result<()> {
    sheet.set_name("Legacy Preferences")?;
    write_header(
        sheet,
        &["Participant ID", "Name", "Easier To Understand", "Preferred", "Reason"],
    )?;

    for (i, pref) in data.legacy_preferences.iter().enumerate() {
        let row = i as u32 + 1;
        if let Some(p) = by_id.get(&pref.participant_id) {
            sheet.write(row, 0, &p.participant_id)?;
            sheet.write(row, 1, &p.name)?;
        }
        sheet.write(row, 2, pref.easier_to_understand.label())?;
        sheet.write(row, 3, pref.preference.label())?;
        sheet.write(row, 4, &pref.reason)?;
    }

    info!("Legacy Preferences sheet: {} rows", data.legacy_preferences.len());
    Ok(())
}

fn write_word_preferences_sheet(
    sheet: &mut Worksheet,
    data: &ExportData,
    by_id: &HashMap<i64, &Participant>,
) -> Result<()> {
    sheet.set_name("Word Preferences")?;
    write_header(
        sheet,
        &["Participant ID", "Name", "Target Word", "AI Position", "Chosen", "Choice Type"],
    )?;

    for (i, sp) in data.symbol_preferences.iter().enumerate() {
        let row = i as u32 + 1;
        if let Some(p) = by_id.get(&sp.participant_id) {
            sheet.write(row, 0, &p.participant_id)?;
            sheet.write(row, 1, &p.name)?;
        }
        sheet.write(row, 2, &sp.target_word)?;
        sheet.write(row, 3, sp.ai_position.label())?;
        sheet.write(row, 4, sp.chosen.as_str())?;
        sheet.write(row, 5, sp.chosen_type.label())?;
    }

    info!("Word Preferences sheet: {} rows", data.symbol_preferences.len());
    Ok(())
}

struct WordStatRow {
    word: &'static str,
    ai: i64,
    kaac: i64,
    similar: i64,
    total: i64,
    ai_pct: f64,
    kaac_pct: f64,
    similar_pct: f64,
}

/// Per-word rows in vocabulary order; words nobody has judged yet are
/// dropped rather than rendered as zero-over-zero.
fn word_stat_rows(word_counts: &[(String, ChoiceType, i64)]) -> Vec<WordStatRow> {
    VOCABULARY
        .iter()
        .copied()
        .filter_map(|word| {
            let mut ai = 0;
            let mut kaac = 0;
            let mut similar = 0;
            for (w, choice_type, count) in word_counts {
                if w.as_str() == word {
                    match choice_type {
                        ChoiceType::Ai => ai += count,
                        ChoiceType::Kaac => kaac += count,
                        ChoiceType::Similar => similar += count,
                    }
                }
            }
            let total = ai + kaac + similar;
            Some(WordStatRow {
                word,
                ai,
                kaac,
                similar,
                total,
                ai_pct: stats::percentage(ai, total)?,
                kaac_pct: stats::percentage(kaac, total)?,
                similar_pct: stats::percentage(similar, total)?,
            })
        })
        .collect()
}

fn write_word_stats_sheet(sheet: &mut Worksheet, rows: &[WordStatRow]) -> Result<()> {
    sheet.set_name("Word Stats")?;
    write_header(
        sheet,
        &["Word", "AI", "KAAC", "Similar", "Total", "AI %", "KAAC %", "Similar %"],
    )?;

    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write(row, 0, r.word)?;
        sheet.write(row, 1, r.ai)?;
        sheet.write(row, 2, r.kaac)?;
        sheet.write(row, 3, r.similar)?;
        sheet.write(row, 4, r.total)?;
        sheet.write(row, 5, r.ai_pct)?;
        sheet.write(row, 6, r.kaac_pct)?;
        sheet.write(row, 7, r.similar_pct)?;
    }

    info!("Word Stats sheet: {} rows", rows.len());
    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, data: &ExportData) -> Result<()> {
    sheet.set_name("Summary")?;
    write_header(
        sheet,
        &[
            "Participant ID",
            "Name",
            "Age",
            "Gender",
            "Block Order",
            "Duration (min)",
            "Accuracy %",
            "Mean RT (ms)",
            "AI Accuracy %",
            "AI Mean RT",
            "KAAC Accuracy %",
            "KAAC Mean RT",
            "Easier (legacy)",
            "Preferred (legacy)",
            "AI Choices",
            "KAAC Choices",
            "Similar Choices",
        ],
    )?;

    let mut trials_by_participant: HashMap<i64, Vec<&TrialResponse>> = HashMap::new();
    for t in &data.main_trials {
        trials_by_participant.entry(t.participant_id).or_default().push(t);
    }

    // Earliest legacy judgment per participant, consistent with the API
    let mut legacy_by_participant: HashMap<i64, &Preference> = HashMap::new();
    for pref in &data.legacy_preferences {
        legacy_by_participant
            .entry(pref.participant_id)
            .and_modify(|existing| {
                if pref.id < existing.id {
                    *existing = pref;
                }
            })
            .or_insert(pref);
    }

    let mut choice_counts: HashMap<(i64, ChoiceType), i64> = HashMap::new();
    for sp in &data.symbol_preferences {
        *choice_counts.entry((sp.participant_id, sp.chosen_type)).or_default() += 1;
    }

    let mut row: u32 = 1;
    for p in &data.participants {
        // No main-block trials: nothing to summarize for this participant
        let Some(trials) = trials_by_participant.get(&p.id) else {
            continue;
        };

        let correct = trials.iter().filter(|t| t.is_correct).count();
        let all_times: Vec<i64> = trials.iter().map(|t| t.reaction_time).collect();

        let split = |symbol_type: SymbolType| {
            let subset: Vec<&&TrialResponse> = trials
                .iter()
                .filter(|t| t.symbol_type == symbol_type)
                .collect();
            let correct = subset.iter().filter(|t| t.is_correct).count();
            let times: Vec<i64> = subset.iter().map(|t| t.reaction_time).collect();
            (
                stats::accuracy_pct(correct, subset.len()).unwrap_or(0.0),
                stats::mean_reaction_time(&times).unwrap_or(0.0),
            )
        };
        let (ai_accuracy, ai_rt) = split(SymbolType::Ai);
        let (kaac_accuracy, kaac_rt) = split(SymbolType::Kaac);

        sheet.write(row, 0, &p.participant_id)?;
        sheet.write(row, 1, &p.name)?;
        sheet.write(row, 2, p.age)?;
        sheet.write(row, 3, p.gender.label())?;
        sheet.write(row, 4, p.block_order.label())?;
        if let Some(duration) = stats::duration_minutes(p.started_at, p.completed_at) {
            sheet.write(row, 5, duration)?;
        }
        if let Some(accuracy) = stats::accuracy_pct(correct, trials.len()) {
            sheet.write(row, 6, accuracy)?;
        }
        if let Some(mean_rt) = stats::mean_reaction_time(&all_times) {
            sheet.write(row, 7, mean_rt)?;
        }
        sheet.write(row, 8, ai_accuracy)?;
        sheet.write(row, 9, ai_rt)?;
        sheet.write(row, 10, kaac_accuracy)?;
        sheet.write(row, 11, kaac_rt)?;
        if let Some(legacy) = legacy_by_participant.get(&p.id) {
            sheet.write(row, 12, legacy.easier_to_understand.label())?;
            sheet.write(row, 13, legacy.preference.label())?;
        }
        sheet.write(row, 14, *choice_counts.get(&(p.id, ChoiceType::Ai)).unwrap_or(&0))?;
        sheet.write(row, 15, *choice_counts.get(&(p.id, ChoiceType::Kaac)).unwrap_or(&0))?;
        sheet.write(row, 16, *choice_counts.get(&(p.id, ChoiceType::Similar)).unwrap_or(&0))?;

        row += 1;
    }

    info!("Summary sheet: {} rows", row - 1);
    Ok(())
}
