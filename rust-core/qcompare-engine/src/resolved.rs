// SPDX-License-Identifier: PMPL-1.0-or-later
//! Resolved records
//!
//! A resolved record is a raw record whose foreign-key ids have been
//! replaced by the names they point to in the same instance. Collection
//! valued references are kept sorted so they compare as sets.

use serde::{Deserialize, Serialize};

use crate::rule_definition::RuleDefinition;
use crate::ReportKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTenant {
    pub name: String,
    pub description: String,
    pub event_rate_limit: Option<i64>,
    pub flow_rate_limit: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDomain {
    pub name: String,
    pub description: String,
    pub tenant_name: String,
    pub log_source_group_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLogSource {
    pub name: String,
    pub description: String,
    pub type_name: String,
    pub extension_name: String,
    pub group_names: Vec<String>,
    pub enabled: Option<bool>,
    pub credibility: Option<i64>,
    pub store_event_payload: Option<bool>,
    pub coalesce_events: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLogSourceGroup {
    pub name: String,
    pub description: String,
    /// Kept alongside the name for the root-group matching exception.
    pub parent_id: Option<i64>,
    pub parent_name: String,
    pub child_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRule {
    pub name: String,
    pub definition: RuleDefinition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRuleGroup {
    pub name: String,
    pub description: String,
    pub parent_name: String,
    pub group_type: String,
    /// Member rules and building blocks.
    pub rule_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedNetwork {
    pub name: String,
    pub description: String,
    pub cidr: String,
    pub group: String,
    pub domain_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDsmMapping {
    pub log_source_type_name: String,
    pub event_id: String,
    pub event_category: String,
    pub qid_name: String,
    pub custom: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedQid {
    pub name: String,
    pub description: String,
    pub severity: Option<i64>,
    pub low_level_category_name: String,
    pub log_source_type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCustomProperty {
    pub identifier: String,
    pub regex: String,
    pub enabled: Option<bool>,
    pub log_source_type_name: String,
    pub log_source_name: String,
    pub low_level_category_name: String,
    pub qid_name: String,
}

/// The resolved records of one entity type from one instance, in the order
/// the instance returned them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "kebab-case")]
pub enum Snapshot {
    Tenants(Vec<ResolvedTenant>),
    Domains(Vec<ResolvedDomain>),
    LogSources(Vec<ResolvedLogSource>),
    LogSourceGroups(Vec<ResolvedLogSourceGroup>),
    Rules(Vec<ResolvedRule>),
    RuleGroups(Vec<ResolvedRuleGroup>),
    NetworkHierarchy(Vec<ResolvedNetwork>),
    DsmMappings(Vec<ResolvedDsmMapping>),
    Qids(Vec<ResolvedQid>),
    CustomProperties(Vec<ResolvedCustomProperty>),
}

impl Snapshot {
    pub fn kind(&self) -> ReportKind {
        match self {
            Snapshot::Tenants(_) => ReportKind::Tenants,
            Snapshot::Domains(_) => ReportKind::Domains,
            Snapshot::LogSources(_) => ReportKind::LogSources,
            Snapshot::LogSourceGroups(_) => ReportKind::LogSourceGroups,
            Snapshot::Rules(_) => ReportKind::Rules,
            Snapshot::RuleGroups(_) => ReportKind::RuleGroups,
            Snapshot::NetworkHierarchy(_) => ReportKind::NetworkHierarchy,
            Snapshot::DsmMappings(_) => ReportKind::DsmMappings,
            Snapshot::Qids(_) => ReportKind::Qids,
            Snapshot::CustomProperties(_) => ReportKind::CustomProperties,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Snapshot::Tenants(r) => r.len(),
            Snapshot::Domains(r) => r.len(),
            Snapshot::LogSources(r) => r.len(),
            Snapshot::LogSourceGroups(r) => r.len(),
            Snapshot::Rules(r) => r.len(),
            Snapshot::RuleGroups(r) => r.len(),
            Snapshot::NetworkHierarchy(r) => r.len(),
            Snapshot::DsmMappings(r) => r.len(),
            Snapshot::Qids(r) => r.len(),
            Snapshot::CustomProperties(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
