// SPDX-License-Identifier: PMPL-1.0-or-later
//! Parallel reconciliation
//!
//! One tokio task per requested entity type. Each task builds its own
//! lookups and both snapshots, so tasks share nothing but the read-only
//! sources. A failed or panicking task costs only its own report.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use qcompare_source::ConfigSource;

use crate::config::EngineConfig;
use crate::denormalize::denormalize;
use crate::reconcile::reconcile;
use crate::report::{finalize, ComparisonReport, ReportOutcome};
use crate::{EngineError, ReportKind, Result};

/// Compares two instances.
#[derive(Clone)]
pub struct Reconciler {
    old: Arc<dyn ConfigSource>,
    new: Arc<dyn ConfigSource>,
    config: EngineConfig,
}

impl Reconciler {
    pub fn new(old: Arc<dyn ConfigSource>, new: Arc<dyn ConfigSource>, config: EngineConfig) -> Self {
        Self { old, new, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compare a single entity type on the current task.
    pub async fn reconcile_kind(&self, kind: ReportKind) -> Result<ComparisonReport> {
        compare(self.old.as_ref(), self.new.as_ref(), kind, &self.config).await
    }

    /// Compare every kind in `kinds` in parallel and wait for all of them.
    ///
    /// Outcomes come back in request order, one per requested kind.
    pub async fn run(&self, kinds: &[ReportKind]) -> Vec<ReportOutcome> {
        let mut unique: Vec<ReportKind> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !unique.contains(kind) {
                unique.push(*kind);
            }
        }

        info!(
            old = %self.old.describe(),
            new = %self.new.describe(),
            reports = unique.len(),
            "starting comparison"
        );

        let mut handles = Vec::with_capacity(unique.len());
        for kind in unique {
            let old = Arc::clone(&self.old);
            let new = Arc::clone(&self.new);
            let config = self.config.clone();

            let handle = tokio::spawn(async move {
                compare(old.as_ref(), new.as_ref(), kind, &config).await
            });
            handles.push((kind, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(EngineError::WorkerFailed {
                    kind,
                    reason: e.to_string(),
                }),
            };
            if let Err(err) = &result {
                warn!(%kind, error = %err, "report unavailable");
            }
            results.push((kind, result));
        }

        finalize(kinds, results)
    }
}

/// Snapshot both instances concurrently, then reconcile.
#[instrument(skip(old, new, config))]
async fn compare(
    old: &dyn ConfigSource,
    new: &dyn ConfigSource,
    kind: ReportKind,
    config: &EngineConfig,
) -> Result<ComparisonReport> {
    let (old_snapshot, new_snapshot) = tokio::try_join!(
        denormalize(old, kind, config),
        denormalize(new, kind, config),
    )?;
    reconcile(&old_snapshot, &new_snapshot, kind)
}
