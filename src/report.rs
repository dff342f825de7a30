use std::fmt::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Result, TrackerError};
use crate::models::Dataset;
use crate::score::compute_day_score;
use crate::store::NoteStore;

#[derive(Debug)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    /// Computed on every listing; a fault is kept rather than a made-up score.
    pub score: Result<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub symptom: String,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub date: NaiveDate,
    pub lines: Vec<ReportLine>,
    pub score: f64,
    pub actions: Vec<String>,
    pub note_path: PathBuf,
}

/// Every recorded day, newest first.
pub fn list_days(dataset: &Dataset) -> Vec<HistoryEntry> {
    dataset
        .days
        .values()
        .rev()
        .map(|day| HistoryEntry {
            date: day.date,
            score: compute_day_score(day, &dataset.symptoms),
        })
        .collect()
}

pub fn build_report(dataset: &Dataset, notes: &NoteStore, date: NaiveDate) -> Result<DayReport> {
    let day = dataset
        .day(date)
        .filter(|day| !day.readings.is_empty())
        .ok_or(TrackerError::NoSubmission(date))?;

    let score = compute_day_score(day, &dataset.symptoms)?;

    let mut lines = Vec::with_capacity(day.readings.len());
    for reading in day.readings.values() {
        let symptom = dataset
            .symptom(&reading.symptom_id)
            .ok_or_else(|| TrackerError::UnknownSymptom(reading.symptom_id.clone()))?;
        lines.push(ReportLine {
            symptom: symptom.name.clone(),
            value: reading.value,
        });
    }
    lines.sort_by(|a, b| a.symptom.cmp(&b.symptom));

    let actions = dataset
        .actions_for(score)
        .into_iter()
        .map(|action| action.name.clone())
        .collect();

    Ok(DayReport {
        date,
        lines,
        score,
        actions,
        note_path: notes.note_path(date),
    })
}

pub fn render_report(report: &DayReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Symptom Report for {}", report.date);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Submissions");
    for line in &report.lines {
        let _ = writeln!(output, "- {}: {}", line.symptom, line.value);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Overall score: {:.1}", report.score);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Suggested Actions");
    if report.actions.is_empty() {
        let _ = writeln!(output, "No suggested actions for this score.");
    } else {
        for action in &report.actions {
            let _ = writeln!(output, "- {action}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Daily note: {}", report.note_path.display());

    output
}

pub fn render_history(entries: &[HistoryEntry]) -> String {
    let mut output = String::new();

    if entries.is_empty() {
        let _ = writeln!(output, "You don't have any days recorded.");
        return output;
    }

    for (index, entry) in entries.iter().enumerate() {
        match &entry.score {
            Ok(score) => {
                let _ = writeln!(output, "{:>3}. {}  score {:.1}", index + 1, entry.date, score);
            }
            Err(err) => {
                let _ = writeln!(output, "{:>3}. {}  ({err})", index + 1, entry.date);
            }
        }
    }

    output
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    date: NaiveDate,
    symptom_id: &'a str,
    symptom_name: &'a str,
    value: u8,
}

/// Writes every reading as a CSV row, oldest day first.
pub fn export_csv<W: std::io::Write>(dataset: &Dataset, out: W) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    let mut written = 0usize;

    for day in dataset.days.values() {
        let mut rows: Vec<ExportRow> = day
            .readings
            .values()
            .map(|reading| ExportRow {
                date: day.date,
                symptom_id: &reading.symptom_id,
                symptom_name: dataset
                    .symptom(&reading.symptom_id)
                    .map(|symptom| symptom.name.as_str())
                    .unwrap_or(""),
                value: reading.value,
            })
            .collect();
        rows.sort_by(|a, b| a.symptom_name.cmp(b.symptom_name));

        for row in rows {
            writer.serialize(row)?;
            written += 1;
        }
    }

    writer.flush()?;
    Ok(written)
}
