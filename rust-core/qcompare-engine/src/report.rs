// SPDX-License-Identifier: PMPL-1.0-or-later
//! Comparison reports
//!
//! A [`ComparisonReport`] is created empty by a [`ReportBuilder`], populated
//! while the old snapshot is walked, and frozen by [`ReportBuilder::finish`].
//! Every string in a report is display-ready.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{EngineError, ReportKind};

/// One field whose value differs between a matched pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDelta {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

impl FieldDelta {
    pub fn new(
        field: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

/// A matched pair with at least one differing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDelta {
    pub label: String,
    pub fields: Vec<FieldDelta>,
}

/// Result of comparing one entity type across two instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
    kind: ReportKind,
    same_count: usize,
    old_count: usize,
    new_count: usize,
    missing: Vec<String>,
    different: Vec<RecordDelta>,
    ambiguous: Vec<String>,
}

impl ComparisonReport {
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    /// Matched pairs with no differing field.
    pub fn same_count(&self) -> usize {
        self.same_count
    }

    /// Records in the old snapshot.
    pub fn old_count(&self) -> usize {
        self.old_count
    }

    /// Records in the new snapshot.
    pub fn new_count(&self) -> usize {
        self.new_count
    }

    /// Identity labels of old records with no counterpart, in snapshot order.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// Matched pairs that drifted, in snapshot order.
    pub fn different(&self) -> &[RecordDelta] {
        &self.different
    }

    /// Old records whose natural key matched more than one new record.
    /// The first candidate was used for the comparison.
    pub fn ambiguous(&self) -> &[String] {
        &self.ambiguous
    }

    /// True when nothing is missing and nothing drifted.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.different.is_empty()
    }
}

/// Incrementally populates a [`ComparisonReport`].
#[derive(Debug)]
pub struct ReportBuilder {
    report: ComparisonReport,
}

impl ReportBuilder {
    pub fn new(kind: ReportKind) -> Self {
        Self {
            report: ComparisonReport {
                kind,
                same_count: 0,
                old_count: 0,
                new_count: 0,
                missing: Vec::new(),
                different: Vec::new(),
                ambiguous: Vec::new(),
            },
        }
    }

    pub fn snapshot_sizes(mut self, old_count: usize, new_count: usize) -> Self {
        self.report.old_count = old_count;
        self.report.new_count = new_count;
        self
    }

    pub fn missing(&mut self, label: String) {
        self.report.missing.push(label);
    }

    pub fn ambiguous(&mut self, label: String) {
        self.report.ambiguous.push(label);
    }

    /// Record a matched pair: identical when `fields` is empty, drifted otherwise.
    pub fn matched(&mut self, label: String, fields: Vec<FieldDelta>) {
        if fields.is_empty() {
            self.report.same_count += 1;
        } else {
            self.report.different.push(RecordDelta { label, fields });
        }
    }

    pub fn finish(self) -> ComparisonReport {
        self.report
    }
}

/// Whether a report could be produced for an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportStatus {
    Available { report: ComparisonReport },
    Unavailable { reason: String },
}

/// The outcome for one requested entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub kind: ReportKind,
    #[serde(flatten)]
    pub status: ReportStatus,
}

impl ReportOutcome {
    pub fn report(&self) -> Option<&ComparisonReport> {
        match &self.status {
            ReportStatus::Available { report } => Some(report),
            ReportStatus::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.report().is_some()
    }
}

/// Collect per-type results into one outcome per requested kind, in request
/// order. A kind requested twice is listed twice. A requested kind without a
/// result is reported unavailable rather than dropped.
pub fn finalize(
    requested: &[ReportKind],
    results: Vec<(ReportKind, Result<ComparisonReport, EngineError>)>,
) -> Vec<ReportOutcome> {
    let by_kind: HashMap<ReportKind, Result<ComparisonReport, EngineError>> =
        results.into_iter().collect();

    requested
        .iter()
        .map(|&kind| {
            let status = match by_kind.get(&kind).cloned() {
                Some(Ok(report)) => ReportStatus::Available { report },
                Some(Err(err)) => ReportStatus::Unavailable {
                    reason: err.to_string(),
                },
                None => ReportStatus::Unavailable {
                    reason: "no result was produced".to_string(),
                },
            };
            ReportOutcome { kind, status }
        })
        .collect()
}
