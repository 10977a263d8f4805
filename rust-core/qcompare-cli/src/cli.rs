// SPDX-License-Identifier: PMPL-1.0-or-later
//! Command-line arguments.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use qcompare_engine::{ReportKind, UnresolvedPolicy};

use crate::render::OutputFormat;

/// Version string, pulled from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log line encoding on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// qcompare: report configuration missing or drifted between two QRadar consoles.
#[derive(Parser, Debug, Default)]
#[command(
    name = "qcompare",
    version = VERSION,
    about = "Compare the configuration of an old and a new QRadar console"
)]
pub struct Cli {
    /// Old (reference) console URL or host.
    #[arg(long, env = "QCOMPARE_OLD_URL")]
    pub old_url: Option<String>,

    /// Security token for the old console.
    #[arg(long, env = "QCOMPARE_OLD_TOKEN", hide_env_values = true)]
    pub old_token: Option<String>,

    /// New (target) console URL or host.
    #[arg(long, env = "QCOMPARE_NEW_URL")]
    pub new_url: Option<String>,

    /// Security token for the new console.
    #[arg(long, env = "QCOMPARE_NEW_TOKEN", hide_env_values = true)]
    pub new_token: Option<String>,

    /// Read the old side from a JSON snapshot instead of a console.
    #[arg(long, value_name = "FILE", conflicts_with = "old_url")]
    pub old_snapshot: Option<PathBuf>,

    /// Read the new side from a JSON snapshot instead of a console.
    #[arg(long, value_name = "FILE", conflicts_with = "new_url")]
    pub new_snapshot: Option<PathBuf>,

    /// Report types to run (repeatable or comma separated). Default: all.
    #[arg(short, long = "report", value_name = "TYPE", value_delimiter = ',')]
    pub reports: Vec<ReportKind>,

    /// Where reports go: terminal, files or json.
    #[arg(short, long)]
    pub output: Option<OutputFormat>,

    /// Parent directory of the dated report folder (files output).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(short, long, value_name = "FILE", env = "QCOMPARE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip TLS certificate verification on both consoles.
    #[arg(long)]
    pub insecure: bool,

    /// Rendering of ids that resolve to nothing: empty or sentinel.
    #[arg(long, value_name = "POLICY")]
    pub unresolved: Option<UnresolvedPolicy>,

    /// Fetch collections in pages of this many records.
    #[arg(long, value_name = "N")]
    pub page_size: Option<usize>,

    /// Per-request timeout in seconds (default: wait indefinitely).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Debug-level logging (RUST_LOG still wins).
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Print the available report types and exit.
    #[arg(long)]
    pub list_reports: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_reports_accept_lists_and_labels() {
        let cli = Cli::try_parse_from([
            "qcompare",
            "--report",
            "tenants,log-sources",
            "-r",
            "QIDs",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(
            cli.reports,
            vec![ReportKind::Tenants, ReportKind::LogSources, ReportKind::Qids]
        );
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_unknown_report_rejected() {
        assert!(Cli::try_parse_from(["qcompare", "--report", "offenses"]).is_err());
    }

    #[test]
    fn test_snapshot_conflicts_with_url() {
        let result = Cli::try_parse_from([
            "qcompare",
            "--old-url",
            "old.example.com",
            "--old-snapshot",
            "old.json",
        ]);
        assert!(result.is_err());
    }
}
