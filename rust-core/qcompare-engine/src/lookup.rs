// SPDX-License-Identifier: PMPL-1.0-or-later
//! Lookup resolution
//!
//! Builds `id -> natural-key name` maps for the referenceable collections of
//! one instance. A map is built once, before any record that refers to it is
//! resolved, and is read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::instrument;

use qcompare_source::{Collection, ConfigSource, FetchQuery, NamedRecord, SourceError};

use crate::config::{EngineConfig, UnresolvedPolicy};
use crate::denormalize::fetch_paged;

/// Entity types that other records refer to by numeric id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Tenant,
    Domain,
    LogSource,
    LogSourceGroup,
    LogSourceExtension,
    LogSourceType,
    LowLevelCategory,
    Qid,
    Rule,
    BuildingBlock,
}

impl LookupKind {
    pub const ALL: [LookupKind; 10] = [
        LookupKind::Tenant,
        LookupKind::Domain,
        LookupKind::LogSource,
        LookupKind::LogSourceGroup,
        LookupKind::LogSourceExtension,
        LookupKind::LogSourceType,
        LookupKind::LowLevelCategory,
        LookupKind::Qid,
        LookupKind::Rule,
        LookupKind::BuildingBlock,
    ];

    /// The collection the names are read from.
    pub fn collection(self) -> Collection {
        match self {
            LookupKind::Tenant => Collection::Tenant,
            LookupKind::Domain => Collection::Domain,
            LookupKind::LogSource => Collection::LogSource,
            LookupKind::LogSourceGroup => Collection::LogSourceGroup,
            LookupKind::LogSourceExtension => Collection::LogSourceExtension,
            LookupKind::LogSourceType => Collection::LogSourceType,
            LookupKind::LowLevelCategory => Collection::LowLevelCategory,
            LookupKind::Qid => Collection::Qid,
            LookupKind::Rule => Collection::Rule,
            LookupKind::BuildingBlock => Collection::BuildingBlock,
        }
    }

    /// Identifier + name projection, restricted to live records where the
    /// platform soft-deletes.
    pub fn query(self) -> FetchQuery {
        match self {
            LookupKind::Tenant => FetchQuery::minimal().with_filter(FetchQuery::NOT_DELETED),
            _ => FetchQuery::minimal(),
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.collection(), f)
    }
}

/// `id -> name` side table for one collection of one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupMap {
    kind: LookupKind,
    names: HashMap<i64, String>,
    policy: UnresolvedPolicy,
}

impl LookupMap {
    /// Build a map from named records. The first record wins on duplicate ids;
    /// records without an id are skipped.
    pub fn from_records<'a, I>(kind: LookupKind, records: I, policy: UnresolvedPolicy) -> Self
    where
        I: IntoIterator<Item = (Option<i64>, Option<&'a str>)>,
    {
        let mut names = HashMap::new();
        for (id, name) in records {
            if let Some(id) = id {
                names
                    .entry(id)
                    .or_insert_with(|| name.unwrap_or_default().to_string());
            }
        }
        Self {
            kind,
            names,
            policy,
        }
    }

    pub fn kind(&self) -> LookupKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name for `id`, if the instance has one.
    pub fn get(&self, id: i64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Name for `id`, or the unresolved placeholder.
    ///
    /// A dangling reference never fails resolution: it shows up downstream
    /// as a visibly different value instead.
    pub fn resolve(&self, id: i64) -> String {
        match self.names.get(&id) {
            Some(name) => name.clone(),
            None => {
                tracing::trace!(kind = %self.kind, id, "unresolved reference");
                self.policy.placeholder(id)
            }
        }
    }

    /// Like [`LookupMap::resolve`]; an absent reference resolves to `""`.
    pub fn resolve_opt(&self, id: Option<i64>) -> String {
        id.map(|id| self.resolve(id)).unwrap_or_default()
    }

    /// Resolve every member of a collection-valued reference into its
    /// canonical (sorted) form. Unresolved members keep their slot as a
    /// placeholder so the element count is preserved.
    pub fn resolve_all(&self, ids: &[i64]) -> Vec<String> {
        let mut names: Vec<String> = ids.iter().map(|id| self.resolve(*id)).collect();
        names.sort();
        names
    }
}

/// Fetch the identifier + name projection of `kind` and build its map.
///
/// Fails fast: a partial lookup would silently produce wrong names.
#[instrument(skip(source, config), fields(source = %source.describe()))]
pub async fn build_lookup(
    source: &dyn ConfigSource,
    kind: LookupKind,
    config: &EngineConfig,
) -> Result<LookupMap, SourceError> {
    let records: Vec<NamedRecord> =
        fetch_paged(source, kind.collection(), &kind.query(), config.page_size).await?;

    let map = LookupMap::from_records(
        kind,
        records.iter().map(|r| (r.id, r.name.as_deref())),
        config.unresolved,
    );
    tracing::debug!(entries = map.len(), "lookup built");
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcompare_source::InMemorySource;
    use serde_json::json;

    fn groups() -> LookupMap {
        LookupMap::from_records(
            LookupKind::LogSourceGroup,
            vec![(Some(1), Some("Other")), (Some(5), Some("Firewalls")), (None, Some("orphan"))],
            UnresolvedPolicy::Empty,
        )
    }

    #[test]
    fn test_resolve_known_and_missing() {
        let map = groups();
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve(5), "Firewalls");
        assert_eq!(map.resolve(99), "");
        assert_eq!(map.resolve_opt(None), "");
    }

    #[test]
    fn test_resolve_all_sorted_with_placeholders() {
        let map = groups();
        assert_eq!(map.resolve_all(&[5, 99, 1]), vec!["", "Firewalls", "Other"]);
    }

    #[test]
    fn test_sentinel_policy() {
        let map = LookupMap::from_records(
            LookupKind::Tenant,
            Vec::<(Option<i64>, Option<&str>)>::new(),
            UnresolvedPolicy::Sentinel,
        );
        assert_eq!(map.resolve(7), "unknown:7");
    }

    #[test]
    fn test_first_duplicate_id_wins() {
        let map = LookupMap::from_records(
            LookupKind::Rule,
            vec![(Some(1), Some("first")), (Some(1), Some("second"))],
            UnresolvedPolicy::Empty,
        );
        assert_eq!(map.get(1), Some("first"));
    }

    #[tokio::test]
    async fn test_build_lookup_skips_deleted_tenants() {
        let source = InMemorySource::new().with_raw(
            Collection::Tenant,
            vec![
                json!({"id": 1, "name": "Acme", "deleted": false}),
                json!({"id": 2, "name": "Old", "deleted": true}),
            ],
        );
        let map = build_lookup(&source, LookupKind::Tenant, &EngineConfig::default())
            .await
            .unwrap();
        assert_eq!(map.get(1), Some("Acme"));
        assert_eq!(map.get(2), None);
    }

    #[tokio::test]
    async fn test_build_lookup_propagates_failure() {
        let source = InMemorySource::new().failing(Collection::LogSourceType);
        let err = build_lookup(&source, LookupKind::LogSourceType, &EngineConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.collection(), Collection::LogSourceType);
    }
}
