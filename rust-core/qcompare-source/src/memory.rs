// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-memory [`ConfigSource`].
//!
//! Serves collections from JSON values held in memory. Used by tests and by
//! offline comparison of exported snapshot documents:
//!
//! ```json
//! { "tenant": [ {"id": 1, "name": "Acme"} ], "log_source_type": [ ... ] }
//! ```
//!
//! Filters compare a field's JSON text with the requested value. A field
//! the record leaves out counts as `false`, so snapshot records without a
//! `deleted` key survive the `deleted=false` filter.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::error::{Result, SourceError};
use crate::{Collection, ConfigSource, FetchQuery};

/// A [`ConfigSource`] backed by in-memory JSON records.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    name: String,
    collections: BTreeMap<Collection, Vec<Value>>,
    failing: BTreeSet<Collection>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self {
            name: "in-memory".to_string(),
            ..Self::default()
        }
    }

    /// Name reported by [`ConfigSource::describe`].
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add raw JSON records to `collection`.
    pub fn with_raw(mut self, collection: Collection, records: Vec<Value>) -> Self {
        self.collections.entry(collection).or_default().extend(records);
        self
    }

    /// Make every fetch of `collection` fail.
    pub fn failing(mut self, collection: Collection) -> Self {
        self.failing.insert(collection);
        self
    }

    /// Build a source from a snapshot document keyed by [`Collection::key`].
    ///
    /// Unknown keys are rejected so a typo cannot silently empty a collection.
    pub fn from_document(
        name: impl Into<String>,
        document: Value,
    ) -> std::result::Result<Self, SnapshotError> {
        let Value::Object(map) = document else {
            return Err(SnapshotError::NotAnObject);
        };

        let mut source = Self::new().named(name);
        for (key, value) in map {
            let collection =
                Collection::from_key(&key).ok_or(SnapshotError::UnknownCollection(key))?;
            let Value::Array(records) = value else {
                return Err(SnapshotError::NotAnArray(collection));
            };
            source = source.with_raw(collection, records);
        }
        Ok(source)
    }
}

/// A snapshot document could not be turned into an [`InMemorySource`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot document must be a JSON object")]
    NotAnObject,

    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("collection {0} must be a JSON array")]
    NotAnArray(Collection),
}

#[async_trait]
impl ConfigSource for InMemorySource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn fetch_raw(&self, collection: Collection, query: &FetchQuery) -> Result<Vec<Value>> {
        if self.failing.contains(&collection) {
            return Err(SourceError::unavailable(collection, "injected failure"));
        }

        let conditions = match query.filter.as_deref() {
            Some(filter) => parse_filter(filter).map_err(|e| SourceError::unavailable(collection, e))?,
            None => Vec::new(),
        };
        let fields = query.field_list();

        let matching = self
            .collections
            .get(&collection)
            .into_iter()
            .flatten()
            .filter(|record| conditions.iter().all(|(field, want)| field_matches(record, field, want)));

        let (offset, limit) = match query.page {
            Some(page) => (page.offset, page.limit),
            None => (0, usize::MAX),
        };

        Ok(matching
            .skip(offset)
            .take(limit)
            .map(|record| project(record, fields.as_deref()))
            .collect())
    }
}

/// Parse `a=1 and b=x` into `[("a", "1"), ("b", "x")]`.
fn parse_filter(filter: &str) -> std::result::Result<Vec<(String, String)>, String> {
    filter
        .split(" and ")
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(|clause| {
            let (field, value) = clause
                .split_once('=')
                .ok_or_else(|| format!("unsupported filter clause '{clause}'"))?;
            Ok((
                field.trim().to_string(),
                value.trim().trim_matches('"').to_string(),
            ))
        })
        .collect()
}

/// An absent or null field reads as `false`, so `deleted=false` keeps
/// records that never carried the flag.
fn field_matches(record: &Value, field: &str, want: &str) -> bool {
    match record.get(field) {
        Some(Value::String(s)) => s == want,
        Some(Value::Null) | None => want == "false",
        Some(other) => other.to_string() == want,
    }
}

fn project(record: &Value, fields: Option<&[&str]>) -> Value {
    match (fields, record) {
        (Some(fields), Value::Object(map)) => Value::Object(
            map.iter()
                .filter(|(key, _)| fields.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        _ => record.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Page;
    use serde_json::json;

    fn tenants() -> InMemorySource {
        InMemorySource::new().with_raw(
            Collection::Tenant,
            vec![
                json!({"id": 1, "name": "Acme", "deleted": false, "event_rate_limit": 10}),
                json!({"id": 2, "name": "Gone", "deleted": true}),
                json!({"id": 3, "name": "Beta", "deleted": false}),
            ],
        )
    }

    #[tokio::test]
    async fn test_filter_excludes_deleted() {
        let query = FetchQuery::all().with_filter(FetchQuery::NOT_DELETED);
        let records = tenants().fetch_raw(Collection::Tenant, &query).await.unwrap();
        let names: Vec<_> = records.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Acme", "Beta"]);
    }

    #[tokio::test]
    async fn test_absent_flag_reads_as_false() {
        let source = InMemorySource::new().with_raw(
            Collection::Domain,
            vec![
                json!({"id": 1, "name": "Finance"}),
                json!({"id": 2, "name": "Retired", "deleted": true}),
                json!({"id": 3, "name": "Lab", "deleted": null}),
            ],
        );

        let query = FetchQuery::all().with_filter(FetchQuery::NOT_DELETED);
        let records = source.fetch_raw(Collection::Domain, &query).await.unwrap();
        let names: Vec<_> = records.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Finance", "Lab"]);

        let custom = FetchQuery::all().with_filter(FetchQuery::CUSTOM_EVENTS);
        assert!(source.fetch_raw(Collection::Domain, &custom).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_projection_keeps_only_requested_fields() {
        let records = tenants()
            .fetch_raw(Collection::Tenant, &FetchQuery::minimal())
            .await
            .unwrap();
        assert_eq!(records[0], json!({"id": 1, "name": "Acme"}));
    }

    #[tokio::test]
    async fn test_paging() {
        let query = FetchQuery::all().with_page(Page::new(1, 5));
        let records = tenants().fetch_raw(Collection::Tenant, &query).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], 2);
    }

    #[tokio::test]
    async fn test_missing_collection_is_empty() {
        let records = tenants()
            .fetch_raw(Collection::Rule, &FetchQuery::all())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let source = tenants().failing(Collection::Tenant);
        let err = source
            .fetch_raw(Collection::Tenant, &FetchQuery::all())
            .await
            .unwrap_err();
        assert_eq!(err.collection(), Collection::Tenant);
    }

    #[test]
    fn test_from_document_rejects_unknown_collection() {
        let err = InMemorySource::from_document("old", json!({"tenants": []})).unwrap_err();
        assert!(err.to_string().contains("unknown collection"));

        let source = InMemorySource::from_document("old", json!({"tenant": [{"id": 1}]})).unwrap();
        assert_eq!(source.describe(), "old");
    }
}
