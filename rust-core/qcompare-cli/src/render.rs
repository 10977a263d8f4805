// SPDX-License-Identifier: PMPL-1.0-or-later
//!
//! Report rendering.
//!
//! Supports three output modes:
//! - **Terminal**: colored per-type sections followed by a `comfy-table` summary.
//! - **Files**: one text file per report type in a dated folder.
//! - **JSON**: a single pretty-printed document for pipeline consumption.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use qcompare_engine::{ComparisonReport, ReportOutcome, ReportStatus};

const SEPARATOR: &str = "==================";
const FILE_SEPARATOR: &str = "***************************";

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Terminal,
    Files,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Terminal => write!(f, "terminal"),
            OutputFormat::Files => write!(f, "files"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "files" => Ok(OutputFormat::Files),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "Unknown output '{other}'. Valid outputs: terminal, files, json"
            )),
        }
    }
}

/// Context printed alongside the reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub generated_at: DateTime<Utc>,
    pub old: String,
    pub new: String,
}

/// Render every outcome as terminal text, then the summary table.
pub fn render_terminal(outcomes: &[ReportOutcome], run: &RunInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} {} {}\n",
        "Comparing".bold(),
        run.old.cyan(),
        "against".bold(),
        run.new.cyan()
    ));

    for outcome in outcomes {
        out.push_str(&format!("{SEPARATOR}\n"));
        out.push_str(&format!("{} {}\n", "Report for:".bold(), outcome.kind.label().bold()));

        match &outcome.status {
            ReportStatus::Available { report } => write_terminal_report(&mut out, report),
            ReportStatus::Unavailable { reason } => {
                let line = format!("report unavailable: {reason}");
                out.push_str(&format!("{}\n", line.red().bold()));
            }
        }
    }

    out.push_str(&format!("{SEPARATOR}\n"));
    out.push_str(&format!("{}\n", summary_table(outcomes)));
    out
}

fn write_terminal_report(out: &mut String, report: &ComparisonReport) {
    out.push_str(&format!("Records OK: {}\n", report.same_count().to_string().green()));

    if report.missing().is_empty() {
        out.push_str("Records missing in new QRadar: 0\n");
    } else {
        out.push_str(&format!(
            "Records missing in new QRadar: {}\n",
            report.missing().len().to_string().red()
        ));
        for label in report.missing() {
            out.push_str(&format!("  {}\n", label.red()));
        }
    }

    if report.different().is_empty() {
        out.push_str("Records different in new QRadar: 0\n");
    } else {
        out.push_str(&format!(
            "Records different in new QRadar: {}\n",
            report.different().len().to_string().yellow()
        ));
        for record in report.different() {
            out.push_str(&format!("  {}\n", record.label.yellow()));
            for delta in &record.fields {
                out.push_str(&format!("    Element: {}\n", delta.field.bold()));
                out.push_str(&format!("    Old Value: {}\n", delta.old_value));
                out.push_str(&format!("    New Value: {}\n", delta.new_value));
            }
        }
    }

    if !report.ambiguous().is_empty() {
        out.push_str(&format!(
            "{}\n",
            "Matched against the first of several records in new QRadar:".dimmed()
        ));
        for label in report.ambiguous() {
            out.push_str(&format!("  {}\n", label.dimmed()));
        }
    }
}

/// One row per requested report type.
pub fn summary_table(outcomes: &[ReportOutcome]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Report"),
        Cell::new("Old"),
        Cell::new("New"),
        Cell::new("OK"),
        Cell::new("Missing"),
        Cell::new("Different"),
        Cell::new("Ambiguous"),
    ]);

    for outcome in outcomes {
        let label = Cell::new(outcome.kind.label());
        match outcome.report() {
            Some(report) => {
                let missing = Cell::new(report.missing().len());
                let different = Cell::new(report.different().len());
                table.add_row(vec![
                    label,
                    Cell::new(report.old_count()),
                    Cell::new(report.new_count()),
                    Cell::new(report.same_count()),
                    if report.missing().is_empty() {
                        missing
                    } else {
                        missing.fg(Color::Red)
                    },
                    if report.different().is_empty() {
                        different
                    } else {
                        different.fg(Color::Yellow)
                    },
                    Cell::new(report.ambiguous().len()),
                ]);
            }
            None => {
                table.add_row(vec![
                    label,
                    Cell::new("unavailable").fg(Color::Red),
                ]);
            }
        }
    }

    table
}

/// Text of one report file.
pub fn report_file_text(outcome: &ReportOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!("Report for: {}\n", outcome.kind.label()));

    let report = match &outcome.status {
        ReportStatus::Available { report } => report,
        ReportStatus::Unavailable { reason } => {
            out.push_str(&format!("report unavailable: {reason}\n"));
            return out;
        }
    };

    out.push_str(&format!("Records OK: {}\n", report.same_count()));
    out.push('\n');
    if report.missing().is_empty() {
        out.push_str("Records missing in new QRadar: 0\n");
        out.push_str(&format!("{FILE_SEPARATOR}\n"));
    } else {
        out.push_str("Records missing in new QRadar:\n");
        out.push_str(&format!("{FILE_SEPARATOR}\n"));
        for label in report.missing() {
            out.push_str(&format!("{label}\n"));
        }
    }

    out.push('\n');
    if report.different().is_empty() {
        out.push_str("Records different in new QRadar: 0\n");
        out.push_str(&format!("{FILE_SEPARATOR}\n"));
    } else {
        out.push_str("Records different in new QRadar:\n");
        out.push_str(&format!("{FILE_SEPARATOR}\n"));
        for record in report.different() {
            out.push_str(&format!("{}\n", record.label));
            for delta in &record.fields {
                out.push_str(&format!("Element: {}\n", delta.field));
                out.push_str(&format!("Old Value: {}\n", delta.old_value));
                out.push_str(&format!("New Value: {}\n", delta.new_value));
            }
            out.push('\n');
        }
    }
    out
}

/// `qradar_compare_report_DD_MM_YYYY`
pub fn report_folder_name(date: NaiveDate) -> String {
    format!("qradar_compare_report_{}", date.format("%d_%m_%Y"))
}

/// Write one `<Report>.txt` per outcome into a dated folder below `root`.
pub fn write_files(outcomes: &[ReportOutcome], root: &Path, date: NaiveDate) -> anyhow::Result<PathBuf> {
    let folder = root.join(report_folder_name(date));
    fs::create_dir_all(&folder)
        .with_context(|| format!("creating report folder {}", folder.display()))?;

    for outcome in outcomes {
        let path = folder.join(format!("{}.txt", outcome.kind.label()));
        fs::write(&path, report_file_text(outcome))
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "report written");
    }
    Ok(folder)
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(flatten)]
    run: &'a RunInfo,
    reports: &'a [ReportOutcome],
}

/// Pretty-print all outcomes as one JSON document.
pub fn render_json(outcomes: &[ReportOutcome], run: &RunInfo) -> anyhow::Result<String> {
    serde_json::to_string_pretty(&JsonDocument {
        run,
        reports: outcomes,
    })
    .context("serializing reports")
}
