// SPDX-License-Identifier: PMPL-1.0-or-later
//!
//! qcompare: compare the configuration of two QRadar consoles.
//!
//! Reads every requested configuration collection from an old and a new
//! console (or from JSON snapshots of them), reconciles them per entity
//! type and reports records that are missing or drifted in the new one.
//!
//! Exit status is 0 when every requested report was produced, 2 when at
//! least one report type was unavailable, and 1 on configuration errors.

mod cli;
mod config;
mod logging;
mod render;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use qcompare_engine::{ReportKind, Reconciler};
use qcompare_source::{ConfigSource, InMemorySource};
use qradar_client::{ClientOptions, QRadarClient};

use cli::Cli;
use config::{CompareConfig, InstanceConfig};
use render::{OutputFormat, RunInfo};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    if cli.list_reports {
        for kind in ReportKind::ALL {
            println!("{:<20} {}", kind.slug(), kind.label());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = match &cli.config {
        Some(path) => CompareConfig::load(path)?,
        None => CompareConfig::default(),
    }
    .apply(&cli);

    let options = config.client_options();
    let old = open_source("old", &config.old, cli.old_snapshot.as_deref(), &options)?;
    let new = open_source("new", &config.new, cli.new_snapshot.as_deref(), &options)?;

    let run = RunInfo {
        generated_at: Utc::now(),
        old: old.describe(),
        new: new.describe(),
    };

    let reconciler = Reconciler::new(old, new, config.engine_config());
    let outcomes = reconciler.run(&config.report_kinds()).await;

    match config.output {
        OutputFormat::Terminal => print!("{}", render::render_terminal(&outcomes, &run)),
        OutputFormat::Files => {
            let folder =
                render::write_files(&outcomes, &config.output_dir, run.generated_at.date_naive())?;
            println!("{}", render::summary_table(&outcomes));
            println!("Reports written to {}", folder.display());
        }
        OutputFormat::Json => println!("{}", render::render_json(&outcomes, &run)?),
    }

    let unavailable = outcomes.iter().filter(|o| !o.is_available()).count();
    if unavailable > 0 {
        tracing::warn!(unavailable, "some reports could not be produced");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

/// Console client or snapshot reader for one side of the comparison.
fn open_source(
    side: &str,
    instance: &InstanceConfig,
    snapshot: Option<&Path>,
    options: &ClientOptions,
) -> anyhow::Result<Arc<dyn ConfigSource>> {
    if let Some(path) = snapshot {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {side} snapshot {}", path.display()))?;
        let document = serde_json::from_str(&text)
            .with_context(|| format!("parsing {side} snapshot {}", path.display()))?;
        let source = InMemorySource::from_document(path.display().to_string(), document)
            .with_context(|| format!("loading {side} snapshot {}", path.display()))?;
        return Ok(Arc::new(source));
    }

    let (Some(url), Some(token)) = (instance.url.as_deref(), instance.token.as_deref()) else {
        bail!(
            "the {side} console needs a URL and a token (--{side}-url/--{side}-token, \
             QCOMPARE_{}_URL/QCOMPARE_{}_TOKEN, or the config file), or --{side}-snapshot",
            side.to_uppercase(),
            side.to_uppercase()
        );
    };

    let client = QRadarClient::with_options(url, token, options.clone())
        .with_context(|| format!("configuring the {side} console client"))?;
    tracing::debug!(side, console = %client.base_url(), "console client ready");
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_source() {
        let path = std::env::temp_dir().join(format!("qcompare-snapshot-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"tenant": [{"id": 1, "name": "Acme", "deleted": false}]}"#).unwrap();

        let source = open_source("old", &InstanceConfig::default(), Some(&path), &ClientOptions::default())
            .unwrap();
        assert_eq!(source.describe(), path.display().to_string());

        let reconciler = Reconciler::new(Arc::clone(&source), source, Default::default());
        let outcomes = reconciler.run(&[ReportKind::Tenants]).await;
        let report = outcomes[0].report().unwrap();
        assert_eq!(report.same_count(), 1);
        assert!(report.is_clean());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_credentials_named() {
        let instance = InstanceConfig {
            url: Some("new.example.com".into()),
            token: None,
        };
        let err = open_source("new", &instance, None, &ClientOptions::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("QCOMPARE_NEW_TOKEN"));
    }

    #[test]
    fn test_bad_snapshot_rejected() {
        let path = std::env::temp_dir().join(format!("qcompare-bad-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"tenants": []}"#).unwrap();

        let err = open_source("old", &InstanceConfig::default(), Some(&path), &ClientOptions::default())
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("unknown collection 'tenants'"));

        std::fs::remove_file(&path).unwrap();
    }
}
