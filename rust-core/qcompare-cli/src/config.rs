// SPDX-License-Identifier: PMPL-1.0-or-later
//! Run configuration.
//!
//! Values are layered: command line and environment first, then the JSON
//! configuration file, then built-in defaults.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use qcompare_engine::{EngineConfig, ReportKind, UnresolvedPolicy};
use qradar_client::ClientOptions;

use crate::cli::Cli;
use crate::render::OutputFormat;

/// Connection details for one console.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub url: Option<String>,
    pub token: Option<String>,
}

/// Everything a comparison run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub old: InstanceConfig,
    pub new: InstanceConfig,
    /// Per-request timeout in seconds. Unset means no timeout.
    pub timeout_secs: Option<u64>,
    pub verify_tls: bool,
    pub unresolved: UnresolvedPolicy,
    pub page_size: Option<usize>,
    /// Empty means every report type.
    pub reports: Vec<ReportKind>,
    pub output: OutputFormat,
    pub output_dir: PathBuf,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            old: InstanceConfig::default(),
            new: InstanceConfig::default(),
            timeout_secs: None,
            verify_tls: true,
            unresolved: UnresolvedPolicy::default(),
            page_size: None,
            reports: Vec::new(),
            output: OutputFormat::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl CompareConfig {
    /// Read a configuration file. Missing keys take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Overlay command-line and environment values.
    pub fn apply(mut self, cli: &Cli) -> Self {
        if cli.old_url.is_some() {
            self.old.url = cli.old_url.clone();
        }
        if cli.old_token.is_some() {
            self.old.token = cli.old_token.clone();
        }
        if cli.new_url.is_some() {
            self.new.url = cli.new_url.clone();
        }
        if cli.new_token.is_some() {
            self.new.token = cli.new_token.clone();
        }
        if cli.timeout.is_some() {
            self.timeout_secs = cli.timeout;
        }
        if cli.insecure {
            self.verify_tls = false;
        }
        if let Some(policy) = cli.unresolved {
            self.unresolved = policy;
        }
        if cli.page_size.is_some() {
            self.page_size = cli.page_size;
        }
        if !cli.reports.is_empty() {
            self.reports = cli.reports.clone();
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        self
    }

    /// Requested report types, defaulting to all of them.
    pub fn report_kinds(&self) -> Vec<ReportKind> {
        if self.reports.is_empty() {
            ReportKind::ALL.to_vec()
        } else {
            self.reports.clone()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            unresolved: self.unresolved,
            page_size: self.page_size,
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: self.timeout_secs.map(Duration::from_secs),
            accept_invalid_certs: !self.verify_tls,
            ..ClientOptions::default()
        }
    }
}
