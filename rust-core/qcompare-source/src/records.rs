// SPDX-License-Identifier: PMPL-1.0-or-later
//! Typed raw records, one per collection.
//!
//! Field names follow the platform's JSON. Every field is optional because
//! projections and older platform versions omit fields freely; the engine
//! treats an absent scalar the same as an empty one.

use serde::{Deserialize, Serialize};

use crate::{Collection, SourceRecord};

/// Identifier + name projection shared by every referenceable collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NamedRecord {
    pub id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Tenant {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub event_rate_limit: Option<i64>,
    pub flow_rate_limit: Option<i64>,
    pub deleted: Option<bool>,
}

impl SourceRecord for Tenant {
    const COLLECTION: Collection = Collection::Tenant;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Domain {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub tenant_id: Option<i64>,
    pub log_source_group_ids: Vec<i64>,
    pub deleted: Option<bool>,
}

impl SourceRecord for Domain {
    const COLLECTION: Collection = Collection::Domain;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogSource {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub type_id: Option<i64>,
    pub log_source_extension_id: Option<i64>,
    pub group_ids: Vec<i64>,
    pub enabled: Option<bool>,
    pub credibility: Option<i64>,
    pub store_event_payload: Option<bool>,
    pub coalesce_events: Option<bool>,
}

impl SourceRecord for LogSource {
    const COLLECTION: Collection = Collection::LogSource;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogSourceGroup {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub child_group_ids: Vec<i64>,
}

impl SourceRecord for LogSourceGroup {
    const COLLECTION: Collection = Collection::LogSourceGroup;
}

/// An event identifier (QID) record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Qid {
    pub id: Option<i64>,
    pub qid: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub severity: Option<i64>,
    pub low_level_category_id: Option<i64>,
    pub log_source_type_id: Option<i64>,
}

impl SourceRecord for Qid {
    const COLLECTION: Collection = Collection::Qid;
}

/// Maps a device-specific event id/category to a QID.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DsmMapping {
    pub id: Option<i64>,
    pub log_source_type_id: Option<i64>,
    pub log_source_event_id: Option<String>,
    pub log_source_event_category: Option<String>,
    pub qid_record_id: Option<i64>,
    pub custom_event: Option<bool>,
}

impl SourceRecord for DsmMapping {
    const COLLECTION: Collection = Collection::DsmMapping;
}

/// A rule together with its embedded XML definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuleWithData {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub rule_xml: Option<String>,
}

impl SourceRecord for RuleWithData {
    const COLLECTION: Collection = Collection::RuleWithData;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuleGroup {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    #[serde(rename = "type")]
    pub group_type: Option<String>,
    /// Member rule and building-block ids, as strings.
    pub child_items: Vec<String>,
}

impl SourceRecord for RuleGroup {
    const COLLECTION: Collection = Collection::RuleGroup;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkHierarchy {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub cidr: Option<String>,
    pub group: Option<String>,
    pub domain_id: Option<i64>,
}

impl SourceRecord for NetworkHierarchy {
    const COLLECTION: Collection = Collection::NetworkHierarchy;
}

/// A custom property extraction expression.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PropertyExpression {
    pub id: Option<i64>,
    pub identifier: Option<String>,
    pub regex: Option<String>,
    pub enabled: Option<bool>,
    pub log_source_type_id: Option<i64>,
    pub log_source_id: Option<i64>,
    pub qid: Option<i64>,
    pub low_level_category_id: Option<i64>,
}

impl SourceRecord for PropertyExpression {
    const COLLECTION: Collection = Collection::PropertyExpression;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let source: LogSource = serde_json::from_str(r#"{"id": 7, "name": "fw"}"#).unwrap();
        assert_eq!(source.id, Some(7));
        assert!(source.group_ids.is_empty());
        assert_eq!(source.enabled, None);
    }

    #[test]
    fn test_rule_group_type_field() {
        let group: RuleGroup = serde_json::from_str(
            r#"{"id": 1, "name": "Recon", "type": "RULE_GROUP", "child_items": ["100", "101"]}"#,
        )
        .unwrap();
        assert_eq!(group.group_type.as_deref(), Some("RULE_GROUP"));
        assert_eq!(group.child_items, vec!["100", "101"]);
    }
}
