// SPDX-License-Identifier: PMPL-1.0-or-later
//! qcompare data source
//!
//! The read-only seam between the reconciliation engine and one monitoring
//! instance. Every collection the engine reads is named by [`Collection`];
//! a [`ConfigSource`] answers a [`FetchQuery`] against one collection with
//! raw JSON records, and [`fetch`] decodes those into the typed records in
//! [`records`].
//!
//! Numeric identifiers in these records are instance-local. They are only
//! ever used to resolve names inside the instance they came from.

pub mod error;
pub mod memory;
pub mod records;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use error::{Result, SourceError};
pub use memory::{InMemorySource, SnapshotError};
pub use records::{
    Domain, DsmMapping, LogSource, LogSourceGroup, NamedRecord, NetworkHierarchy,
    PropertyExpression, Qid, RuleGroup, RuleWithData, Tenant,
};

/// Every raw collection the engine reads from an instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Tenant,
    Domain,
    LogSource,
    LogSourceGroup,
    LogSourceExtension,
    LogSourceType,
    LowLevelCategory,
    Qid,
    DsmMapping,
    Rule,
    BuildingBlock,
    RuleWithData,
    RuleGroup,
    NetworkHierarchy,
    PropertyExpression,
}

impl Collection {
    /// All collections, in a stable order.
    pub const ALL: [Collection; 15] = [
        Collection::Tenant,
        Collection::Domain,
        Collection::LogSource,
        Collection::LogSourceGroup,
        Collection::LogSourceExtension,
        Collection::LogSourceType,
        Collection::LowLevelCategory,
        Collection::Qid,
        Collection::DsmMapping,
        Collection::Rule,
        Collection::BuildingBlock,
        Collection::RuleWithData,
        Collection::RuleGroup,
        Collection::NetworkHierarchy,
        Collection::PropertyExpression,
    ];

    /// REST endpoint path below `/api/`.
    pub fn endpoint(self) -> &'static str {
        match self {
            Collection::Tenant => "config/access/tenant_management/tenants",
            Collection::Domain => "config/domain_management/domains",
            Collection::LogSource => "config/event_sources/log_source_management/log_sources",
            Collection::LogSourceGroup => {
                "config/event_sources/log_source_management/log_source_groups"
            }
            Collection::LogSourceExtension => {
                "config/event_sources/log_source_management/log_source_extensions"
            }
            Collection::LogSourceType => {
                "config/event_sources/log_source_management/log_source_types"
            }
            Collection::LowLevelCategory => "data_classification/low_level_categories",
            Collection::Qid => "data_classification/qid_records",
            Collection::DsmMapping => "data_classification/dsm_event_mappings",
            Collection::Rule => "analytics/rules",
            Collection::BuildingBlock => "analytics/building_blocks",
            Collection::RuleWithData => "analytics/rules_with_data",
            Collection::RuleGroup => "analytics/rule_groups",
            Collection::NetworkHierarchy => "config/network_hierarchy/networks",
            Collection::PropertyExpression => {
                "config/event_sources/custom_properties/property_expressions"
            }
        }
    }

    /// Key used for this collection in snapshot documents.
    pub fn key(self) -> &'static str {
        match self {
            Collection::Tenant => "tenant",
            Collection::Domain => "domain",
            Collection::LogSource => "log_source",
            Collection::LogSourceGroup => "log_source_group",
            Collection::LogSourceExtension => "log_source_extension",
            Collection::LogSourceType => "log_source_type",
            Collection::LowLevelCategory => "low_level_category",
            Collection::Qid => "qid",
            Collection::DsmMapping => "dsm_mapping",
            Collection::Rule => "rule",
            Collection::BuildingBlock => "building_block",
            Collection::RuleWithData => "rule_with_data",
            Collection::RuleGroup => "rule_group",
            Collection::NetworkHierarchy => "network_hierarchy",
            Collection::PropertyExpression => "property_expression",
        }
    }

    /// Reverse of [`Collection::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        Collection::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A window into a collection: `limit` records starting at `offset`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Inclusive index of the last item in this page, if the page is non-empty.
    pub fn last_index(&self) -> Option<usize> {
        if self.limit == 0 {
            None
        } else {
            Some(self.offset + self.limit - 1)
        }
    }
}

/// What to fetch from a collection.
///
/// `fields` is a comma separated projection (`None` = every field),
/// `filter` a platform filter expression and `page` an optional window.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchQuery {
    pub fields: Option<String>,
    pub filter: Option<String>,
    pub page: Option<Page>,
}

impl FetchQuery {
    /// Only records that have not been soft-deleted.
    pub const NOT_DELETED: &'static str = "deleted=false";
    /// Only user-defined event mappings.
    pub const CUSTOM_EVENTS: &'static str = "custom_event=true";

    /// Every field of every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// The identifier + name projection used for lookups.
    pub fn minimal() -> Self {
        Self {
            fields: Some("id,name".to_string()),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    /// Requested projection split into field names.
    pub fn field_list(&self) -> Option<Vec<&str>> {
        self.fields.as_deref().map(|fields| {
            fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .collect()
        })
    }
}

/// Read-only access to the collections of one instance.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Short human-readable name of the instance (used in logs).
    fn describe(&self) -> String;

    /// Fetch raw JSON records of `collection` matching `query`.
    async fn fetch_raw(
        &self,
        collection: Collection,
        query: &FetchQuery,
    ) -> Result<Vec<serde_json::Value>>;
}

/// A typed record living in exactly one [`Collection`].
pub trait SourceRecord: DeserializeOwned + Send {
    const COLLECTION: Collection;
}

/// Fetch and decode records of `T`'s collection.
///
/// A record that does not decode fails the whole fetch; a partial
/// collection would silently skew every comparison built on it.
pub async fn fetch<T: SourceRecord>(
    source: &dyn ConfigSource,
    query: &FetchQuery,
) -> Result<Vec<T>> {
    fetch_from::<T>(source, T::COLLECTION, query).await
}

/// Like [`fetch`], but decode `T` from an explicit collection.
///
/// Used for the id + name projection, which is the same shape for every
/// referenceable collection.
pub async fn fetch_from<T: DeserializeOwned + Send>(
    source: &dyn ConfigSource,
    collection: Collection,
    query: &FetchQuery,
) -> Result<Vec<T>> {
    let raw = source.fetch_raw(collection, query).await?;
    tracing::debug!(%collection, count = raw.len(), source = %source.describe(), "fetched records");

    raw.into_iter()
        .map(|value| {
            serde_json::from_value(value)
                .map_err(|e| SourceError::unavailable(collection, format!("decode error: {e}")))
        })
        .collect()
}
