// SPDX-License-Identifier: PMPL-1.0-or-later
//! qcompare reconciliation engine
//!
//! Answers one question for two independently administered instances: for
//! every configured object in the old instance, does an equivalent object
//! exist in the new one, and are its fields identical?
//!
//! The pipeline per entity type:
//!
//! 1. [`lookup`] builds `id -> name` maps for every referenced collection.
//! 2. [`denormalize`] fetches raw records and swaps foreign-key ids for
//!    resolved names, producing a [`Snapshot`].
//! 3. [`reconcile()`] pairs old and new records by natural key and diffs the
//!    tracked fields of each pair into a [`ComparisonReport`].
//! 4. [`finalize`] orders per-type outcomes the way they were requested.
//!
//! [`Reconciler`] runs one worker per requested entity type in parallel.

pub mod config;
pub mod denormalize;
pub mod diff;
pub mod lookup;
pub mod orchestrator;
pub mod reconcile;
pub mod report;
pub mod resolved;
pub mod rule_definition;

mod fields;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use qcompare_source::SourceError;

pub use config::{EngineConfig, UnresolvedPolicy};
pub use denormalize::denormalize;
pub use lookup::{build_lookup, LookupKind, LookupMap};
pub use orchestrator::Reconciler;
pub use reconcile::reconcile;
pub use report::{
    finalize, ComparisonReport, FieldDelta, RecordDelta, ReportBuilder, ReportOutcome,
    ReportStatus,
};
pub use resolved::Snapshot;
pub use rule_definition::RuleDefinition;

/// Engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("snapshot kind mismatch: expected {expected}, got {found}")]
    SnapshotMismatch { expected: ReportKind, found: ReportKind },

    #[error("worker for {kind} did not complete: {reason}")]
    WorkerFailed { kind: ReportKind, reason: String },
}

/// Crate-level result alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Entity types that can be compared across instances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    Tenants,
    Domains,
    LogSources,
    LogSourceGroups,
    Rules,
    RuleGroups,
    NetworkHierarchy,
    DsmMappings,
    Qids,
    CustomProperties,
}

impl ReportKind {
    /// Every kind, in the order a full report runs them.
    pub const ALL: [ReportKind; 10] = [
        ReportKind::Tenants,
        ReportKind::Domains,
        ReportKind::LogSources,
        ReportKind::LogSourceGroups,
        ReportKind::Rules,
        ReportKind::RuleGroups,
        ReportKind::NetworkHierarchy,
        ReportKind::DsmMappings,
        ReportKind::Qids,
        ReportKind::CustomProperties,
    ];

    /// Human-readable label used in report headings and file names.
    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Tenants => "Tenants",
            ReportKind::Domains => "Domains",
            ReportKind::LogSources => "Log Sources",
            ReportKind::LogSourceGroups => "Log Source Groups",
            ReportKind::Rules => "Rules",
            ReportKind::RuleGroups => "Rule Groups",
            ReportKind::NetworkHierarchy => "Network Hierarchy",
            ReportKind::DsmMappings => "DSM Mappings",
            ReportKind::Qids => "QIDs",
            ReportKind::CustomProperties => "Custom Properties",
        }
    }

    /// Stable command-line slug.
    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::Tenants => "tenants",
            ReportKind::Domains => "domains",
            ReportKind::LogSources => "log-sources",
            ReportKind::LogSourceGroups => "log-source-groups",
            ReportKind::Rules => "rules",
            ReportKind::RuleGroups => "rule-groups",
            ReportKind::NetworkHierarchy => "network-hierarchy",
            ReportKind::DsmMappings => "dsm-mappings",
            ReportKind::Qids => "qids",
            ReportKind::CustomProperties => "custom-properties",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == wanted || kind.label().to_lowercase() == wanted)
            .ok_or_else(|| {
                let valid: Vec<_> = ReportKind::ALL.iter().map(|k| k.slug()).collect();
                format!("Unknown report '{s}'. Valid reports: {}", valid.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_kind_parse() {
        assert_eq!("log-sources".parse::<ReportKind>(), Ok(ReportKind::LogSources));
        assert_eq!("Log Sources".parse::<ReportKind>(), Ok(ReportKind::LogSources));
        assert_eq!(" QIDs ".parse::<ReportKind>(), Ok(ReportKind::Qids));
        assert!("offenses".parse::<ReportKind>().unwrap_err().contains("tenants"));
    }

    #[test]
    fn test_slugs_unique() {
        let mut slugs: Vec<_> = ReportKind::ALL.iter().map(|k| k.slug()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), ReportKind::ALL.len());
    }
}
