// SPDX-License-Identifier: PMPL-1.0-or-later
//! Matching and diffing of two snapshots
//!
//! Old records are visited in snapshot order, which makes the report order
//! deterministic. A new record is never consumed by a match: two old
//! records with the same natural key both pair with it.

use std::collections::HashMap;
use tracing::{instrument, warn};

use crate::fields::{Indexed, Reconcilable};
use crate::report::{ComparisonReport, ReportBuilder};
use crate::resolved::Snapshot;
use crate::{EngineError, ReportKind, Result};

/// Compare the old snapshot of `kind` against the new one.
#[instrument(skip(old, new), fields(old_records = old.len(), new_records = new.len()))]
pub fn reconcile(old: &Snapshot, new: &Snapshot, kind: ReportKind) -> Result<ComparisonReport> {
    for snapshot in [old, new] {
        if snapshot.kind() != kind {
            return Err(EngineError::SnapshotMismatch {
                expected: kind,
                found: snapshot.kind(),
            });
        }
    }

    let report = match (old, new) {
        (Snapshot::Tenants(old), Snapshot::Tenants(new)) => scan(kind, old, new),
        (Snapshot::Domains(old), Snapshot::Domains(new)) => scan(kind, old, new),
        (Snapshot::LogSources(old), Snapshot::LogSources(new)) => scan(kind, old, new),
        (Snapshot::LogSourceGroups(old), Snapshot::LogSourceGroups(new)) => scan(kind, old, new),
        (Snapshot::Rules(old), Snapshot::Rules(new)) => scan(kind, old, new),
        (Snapshot::RuleGroups(old), Snapshot::RuleGroups(new)) => scan(kind, old, new),
        (Snapshot::NetworkHierarchy(old), Snapshot::NetworkHierarchy(new)) => {
            scan(kind, old, new)
        }
        (Snapshot::CustomProperties(old), Snapshot::CustomProperties(new)) => {
            scan(kind, old, new)
        }
        (Snapshot::DsmMappings(old), Snapshot::DsmMappings(new)) => indexed(kind, old, new),
        (Snapshot::Qids(old), Snapshot::Qids(new)) => indexed(kind, old, new),
        (old, new) => {
            return Err(EngineError::SnapshotMismatch {
                expected: old.kind(),
                found: new.kind(),
            })
        }
    };

    tracing::debug!(
        same = report.same_count(),
        missing = report.missing().len(),
        different = report.different().len(),
        "reconciled"
    );
    Ok(report)
}

/// Linear scan of the new side for the first natural-key match.
fn scan<T: Reconcilable>(kind: ReportKind, old: &[T], new: &[T]) -> ComparisonReport {
    let mut builder = ReportBuilder::new(kind).snapshot_sizes(old.len(), new.len());

    for record in old {
        let mut candidates = new.iter().filter(|candidate| record.same_object(candidate));
        match candidates.next() {
            None => builder.missing(record.label()),
            Some(counterpart) => {
                if candidates.next().is_some() {
                    note_ambiguous(&mut builder, kind, record.label());
                }
                builder.matched(record.label(), record.diff(counterpart));
            }
        }
    }

    builder.finish()
}

/// Keyed lookup of the new side. The first record wins on a duplicate key,
/// which matches what [`scan`] would pick.
fn indexed<T: Indexed>(kind: ReportKind, old: &[T], new: &[T]) -> ComparisonReport {
    let mut builder = ReportBuilder::new(kind).snapshot_sizes(old.len(), new.len());

    let mut index: HashMap<String, (&T, usize)> = HashMap::with_capacity(new.len());
    for record in new {
        index
            .entry(record.index_key())
            .and_modify(|(_, candidates)| *candidates += 1)
            .or_insert((record, 1));
    }

    for record in old {
        match index.get(&record.index_key()) {
            None => builder.missing(record.label()),
            Some((counterpart, candidates)) => {
                if *candidates > 1 {
                    note_ambiguous(&mut builder, kind, record.label());
                }
                builder.matched(record.label(), record.diff(counterpart));
            }
        }
    }

    builder.finish()
}

fn note_ambiguous(builder: &mut ReportBuilder, kind: ReportKind, label: String) {
    warn!(%kind, %label, "natural key matches more than one record in the new instance; using the first");
    builder.ambiguous(label);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::FieldDelta;
    use crate::resolved::{ResolvedQid, ResolvedTenant};

    fn tenant(name: &str, description: &str) -> ResolvedTenant {
        ResolvedTenant {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    fn qid(name: &str, severity: i64) -> ResolvedQid {
        ResolvedQid {
            name: name.into(),
            severity: Some(severity),
            ..Default::default()
        }
    }

    #[test]
    fn test_kind_mismatch() {
        let old = Snapshot::Tenants(vec![]);
        let new = Snapshot::Domains(vec![]);
        assert_eq!(
            reconcile(&old, &new, ReportKind::Tenants),
            Err(EngineError::SnapshotMismatch {
                expected: ReportKind::Tenants,
                found: ReportKind::Domains,
            })
        );
    }

    #[test]
    fn test_duplicate_key_first_wins_and_is_flagged() {
        let old = Snapshot::Tenants(vec![tenant("Acme", "a")]);
        let new = Snapshot::Tenants(vec![tenant("Acme", "a"), tenant("Acme", "b")]);

        let report = reconcile(&old, &new, ReportKind::Tenants).unwrap();
        assert_eq!(report.same_count(), 1);
        assert_eq!(report.ambiguous(), ["Name: Acme".to_string()]);
    }

    #[test]
    fn test_new_record_can_match_twice() {
        let old = Snapshot::Tenants(vec![tenant("Acme", "a"), tenant("Acme", "a")]);
        let new = Snapshot::Tenants(vec![tenant("Acme", "a")]);

        let report = reconcile(&old, &new, ReportKind::Tenants).unwrap();
        assert_eq!(report.same_count(), 2);
        assert!(report.missing().is_empty());
    }

    #[test]
    fn test_indexed_kind() {
        let old = Snapshot::Qids(vec![qid("Deny", 5), qid("Allow", 1), qid("Drop", 3)]);
        let new = Snapshot::Qids(vec![qid("Allow", 1), qid("Deny", 7)]);

        let report = reconcile(&old, &new, ReportKind::Qids).unwrap();
        assert_eq!(report.same_count(), 1);
        assert_eq!(report.missing(), ["Drop".to_string()]);
        assert_eq!(report.different()[0].label, "Deny");
        assert_eq!(
            report.different()[0].fields,
            vec![FieldDelta::new("Severity", "5", "7")]
        );
    }
}
