// SPDX-License-Identifier: PMPL-1.0-or-later
//! Snapshot denormalization
//!
//! Fetches the raw records of one entity type from one instance and replaces
//! every foreign-key id with the name it points to. Lookups are built before
//! the first record is resolved and are not touched afterwards.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use qcompare_source::{
    fetch_from, Collection, ConfigSource, DsmMapping, Domain, FetchQuery, LogSource,
    LogSourceGroup, NetworkHierarchy, Page, PropertyExpression, Qid, RuleGroup, RuleWithData,
    SourceError, SourceRecord, Tenant,
};

use crate::config::{EngineConfig, UnresolvedPolicy};
use crate::lookup::{build_lookup, LookupKind, LookupMap};
use crate::resolved::*;
use crate::rule_definition::RuleDefinition;
use crate::ReportKind;

/// Name the platform shows for network objects that belong to domain `0`.
pub const DEFAULT_DOMAIN: &str = "Default Domain";

/// Fetch a whole collection, page by page when `page_size` is set.
///
/// Paging stops at the first page that is not exactly `limit` long. A source
/// that ignores the page window is detected two ways: a page longer than
/// `limit` is taken as the whole collection, and a later page identical to
/// the first one ends the walk without being kept.
pub(crate) async fn fetch_paged<T: DeserializeOwned + Send>(
    source: &dyn ConfigSource,
    collection: Collection,
    query: &FetchQuery,
    page_size: Option<usize>,
) -> Result<Vec<T>, SourceError> {
    let Some(limit) = page_size.filter(|size| *size > 0) else {
        return fetch_from(source, collection, query).await;
    };

    let mut raw: Vec<Value> = Vec::new();
    let mut first_page: Option<Vec<Value>> = None;
    let mut offset = 0;
    loop {
        let paged = query.clone().with_page(Page::new(offset, limit));
        let batch = source.fetch_raw(collection, &paged).await?;
        let received = batch.len();

        if received > limit {
            warn!(%collection, limit, received, "source ignored the page window");
            raw = batch;
            break;
        }
        if first_page.as_ref() == Some(&batch) {
            warn!(%collection, offset, "source repeated the first page");
            break;
        }
        if offset == 0 {
            first_page = Some(batch.clone());
        }

        raw.extend(batch);
        if received != limit {
            break;
        }
        offset += limit;
    }

    debug!(%collection, count = raw.len(), pages = offset / limit + 1, "fetched paged records");
    raw.into_iter()
        .map(|value| {
            serde_json::from_value(value)
                .map_err(|e| SourceError::unavailable(collection, format!("decode error: {e}")))
        })
        .collect()
}

async fn fetch_all<T: SourceRecord>(
    source: &dyn ConfigSource,
    query: FetchQuery,
    config: &EngineConfig,
) -> Result<Vec<T>, SourceError> {
    fetch_paged(source, T::COLLECTION, &query, config.page_size).await
}

/// Build the resolved snapshot of `kind` for one instance.
///
/// Any failed fetch, lookup or rule document parse fails the whole
/// snapshot. Dangling references do not: they resolve to the configured
/// placeholder.
#[instrument(skip(source, config), fields(source = %source.describe()))]
pub async fn denormalize(
    source: &dyn ConfigSource,
    kind: ReportKind,
    config: &EngineConfig,
) -> Result<Snapshot, SourceError> {
    let snapshot = match kind {
        ReportKind::Tenants => Snapshot::Tenants(tenants(source, config).await?),
        ReportKind::Domains => Snapshot::Domains(domains(source, config).await?),
        ReportKind::LogSources => Snapshot::LogSources(log_sources(source, config).await?),
        ReportKind::LogSourceGroups => {
            Snapshot::LogSourceGroups(log_source_groups(source, config).await?)
        }
        ReportKind::Rules => Snapshot::Rules(rules(source, config).await?),
        ReportKind::RuleGroups => Snapshot::RuleGroups(rule_groups(source, config).await?),
        ReportKind::NetworkHierarchy => {
            Snapshot::NetworkHierarchy(networks(source, config).await?)
        }
        ReportKind::DsmMappings => Snapshot::DsmMappings(dsm_mappings(source, config).await?),
        ReportKind::Qids => Snapshot::Qids(qids(source, config).await?),
        ReportKind::CustomProperties => {
            Snapshot::CustomProperties(custom_properties(source, config).await?)
        }
    };
    tracing::debug!(records = snapshot.len(), "snapshot resolved");
    Ok(snapshot)
}

async fn tenants(
    source: &dyn ConfigSource,
    config: &EngineConfig,
) -> Result<Vec<ResolvedTenant>, SourceError> {
    let records: Vec<Tenant> =
        fetch_all(source, FetchQuery::all().with_filter(FetchQuery::NOT_DELETED), config).await?;

    Ok(records
        .into_iter()
        .map(|tenant| ResolvedTenant {
            name: tenant.name.unwrap_or_default(),
            description: tenant.description.unwrap_or_default(),
            event_rate_limit: tenant.event_rate_limit,
            flow_rate_limit: tenant.flow_rate_limit,
        })
        .collect())
}

async fn domains(
    source: &dyn ConfigSource,
    config: &EngineConfig,
) -> Result<Vec<ResolvedDomain>, SourceError> {
    let (tenants, groups) = tokio::try_join!(
        build_lookup(source, LookupKind::Tenant, config),
        build_lookup(source, LookupKind::LogSourceGroup, config),
    )?;
    let records: Vec<Domain> =
        fetch_all(source, FetchQuery::all().with_filter(FetchQuery::NOT_DELETED), config).await?;

    Ok(records
        .into_iter()
        .map(|domain| ResolvedDomain {
            tenant_name: tenants.resolve_opt(domain.tenant_id),
            log_source_group_names: groups.resolve_all(&domain.log_source_group_ids),
            name: domain.name.unwrap_or_default(),
            description: domain.description.unwrap_or_default(),
        })
        .collect())
}

async fn log_sources(
    source: &dyn ConfigSource,
    config: &EngineConfig,
) -> Result<Vec<ResolvedLogSource>, SourceError> {
    let (types, extensions, groups) = tokio::try_join!(
        build_lookup(source, LookupKind::LogSourceType, config),
        build_lookup(source, LookupKind::LogSourceExtension, config),
        build_lookup(source, LookupKind::LogSourceGroup, config),
    )?;
    let records: Vec<LogSource> = fetch_all(source, FetchQuery::all(), config).await?;

    Ok(records
        .into_iter()
        .map(|log_source| ResolvedLogSource {
            type_name: types.resolve_opt(log_source.type_id),
            extension_name: extensions.resolve_opt(log_source.log_source_extension_id),
            group_names: groups.resolve_all(&log_source.group_ids),
            name: log_source.name.unwrap_or_default(),
            description: log_source.description.unwrap_or_default(),
            enabled: log_source.enabled,
            credibility: log_source.credibility,
            store_event_payload: log_source.store_event_payload,
            coalesce_events: log_source.coalesce_events,
        })
        .collect())
}

async fn log_source_groups(
    source: &dyn ConfigSource,
    config: &EngineConfig,
) -> Result<Vec<ResolvedLogSourceGroup>, SourceError> {
    let records: Vec<LogSourceGroup> = fetch_all(source, FetchQuery::all(), config).await?;

    // Parent and child names come from the same collection.
    let names = LookupMap::from_records(
        LookupKind::LogSourceGroup,
        records.iter().map(|group| (group.id, group.name.as_deref())),
        config.unresolved,
    );

    Ok(records
        .into_iter()
        .map(|group| ResolvedLogSourceGroup {
            parent_name: names.resolve_opt(group.parent_id),
            child_names: names.resolve_all(&group.child_group_ids),
            parent_id: group.parent_id,
            name: group.name.unwrap_or_default(),
            description: group.description.unwrap_or_default(),
        })
        .collect())
}

async fn rules(
    source: &dyn ConfigSource,
    config: &EngineConfig,
) -> Result<Vec<ResolvedRule>, SourceError> {
    let records: Vec<RuleWithData> = fetch_all(source, FetchQuery::all(), config).await?;

    records
        .into_iter()
        .map(|rule| {
            let definition = match rule.rule_xml.as_deref() {
                Some(xml) => RuleDefinition::parse(xml).map_err(|e| {
                    SourceError::unavailable(
                        Collection::RuleWithData,
                        format!(
                            "rule definition of '{}' is invalid: {e}",
                            rule.name.as_deref().unwrap_or_default()
                        ),
                    )
                })?,
                None => RuleDefinition::default(),
            };
            let name = rule
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| definition.name.clone());
            Ok(ResolvedRule { name, definition })
        })
        .collect()
}

async fn rule_groups(
    source: &dyn ConfigSource,
    config: &EngineConfig,
) -> Result<Vec<ResolvedRuleGroup>, SourceError> {
    let (rules, blocks) = tokio::try_join!(
        build_lookup(source, LookupKind::Rule, config),
        build_lookup(source, LookupKind::BuildingBlock, config),
    )?;
    let records: Vec<RuleGroup> = fetch_all(source, FetchQuery::all(), config).await?;

    let mut parents: HashMap<i64, String> = HashMap::new();
    for group in &records {
        if let Some(id) = group.id {
            parents
                .entry(id)
                .or_insert_with(|| group.name.clone().unwrap_or_default());
        }
    }

    Ok(records
        .into_iter()
        .map(|group| {
            let mut rule_names: Vec<String> = group
                .child_items
                .iter()
                .map(|item| rule_group_member(item, &rules, &blocks, config.unresolved))
                .collect();
            rule_names.sort();

            ResolvedRuleGroup {
                parent_name: group
                    .parent_id
                    .map(|id| {
                        parents
                            .get(&id)
                            .cloned()
                            .unwrap_or_else(|| config.unresolved.placeholder(id))
                    })
                    .unwrap_or_default(),
                rule_names,
                name: group.name.unwrap_or_default(),
                description: group.description.unwrap_or_default(),
                group_type: group.group_type.unwrap_or_default(),
            }
        })
        .collect())
}

/// A rule group member id names either a rule or a building block.
fn rule_group_member(
    item: &str,
    rules: &LookupMap,
    blocks: &LookupMap,
    policy: UnresolvedPolicy,
) -> String {
    match item.trim().parse::<i64>() {
        Ok(id) => rules
            .get(id)
            .or_else(|| blocks.get(id))
            .map(str::to_string)
            .unwrap_or_else(|| policy.placeholder(id)),
        Err(_) => policy.placeholder(item),
    }
}

async fn networks(
    source: &dyn ConfigSource,
    config: &EngineConfig,
) -> Result<Vec<ResolvedNetwork>, SourceError> {
    let domains = build_lookup(source, LookupKind::Domain, config).await?;
    let records: Vec<NetworkHierarchy> = fetch_all(source, FetchQuery::all(), config).await?;

    Ok(records
        .into_iter()
        .map(|network| ResolvedNetwork {
            domain_name: match network.domain_id {
                Some(0) => DEFAULT_DOMAIN.to_string(),
                other => domains.resolve_opt(other),
            },
            name: network.name.unwrap_or_default(),
            description: network.description.unwrap_or_default(),
            cidr: network.cidr.unwrap_or_default(),
            group: network.group.unwrap_or_default(),
        })
        .collect())
}

async fn dsm_mappings(
    source: &dyn ConfigSource,
    config: &EngineConfig,
) -> Result<Vec<ResolvedDsmMapping>, SourceError> {
    let (types, qids) = tokio::try_join!(
        build_lookup(source, LookupKind::LogSourceType, config),
        build_lookup(source, LookupKind::Qid, config),
    )?;
    let records: Vec<DsmMapping> =
        fetch_all(source, FetchQuery::all().with_filter(FetchQuery::CUSTOM_EVENTS), config)
            .await?;

    Ok(records
        .into_iter()
        .map(|mapping| ResolvedDsmMapping {
            log_source_type_name: types.resolve_opt(mapping.log_source_type_id),
            qid_name: qids.resolve_opt(mapping.qid_record_id),
            event_id: mapping.log_source_event_id.unwrap_or_default(),
            event_category: mapping.log_source_event_category.unwrap_or_default(),
            custom: mapping.custom_event,
        })
        .collect())
}

async fn qids(
    source: &dyn ConfigSource,
    config: &EngineConfig,
) -> Result<Vec<ResolvedQid>, SourceError> {
    let (categories, types) = tokio::try_join!(
        build_lookup(source, LookupKind::LowLevelCategory, config),
        build_lookup(source, LookupKind::LogSourceType, config),
    )?;
    let records: Vec<Qid> = fetch_all(source, FetchQuery::all(), config).await?;

    Ok(records
        .into_iter()
        .map(|qid| ResolvedQid {
            low_level_category_name: categories.resolve_opt(qid.low_level_category_id),
            log_source_type_name: types.resolve_opt(qid.log_source_type_id),
            name: qid.name.unwrap_or_default(),
            description: qid.description.unwrap_or_default(),
            severity: qid.severity,
        })
        .collect())
}

async fn custom_properties(
    source: &dyn ConfigSource,
    config: &EngineConfig,
) -> Result<Vec<ResolvedCustomProperty>, SourceError> {
    let (types, log_sources, categories, qids) = tokio::try_join!(
        build_lookup(source, LookupKind::LogSourceType, config),
        build_lookup(source, LookupKind::LogSource, config),
        build_lookup(source, LookupKind::LowLevelCategory, config),
        build_lookup(source, LookupKind::Qid, config),
    )?;
    let records: Vec<PropertyExpression> = fetch_all(source, FetchQuery::all(), config).await?;

    Ok(records
        .into_iter()
        .map(|property| ResolvedCustomProperty {
            log_source_type_name: types.resolve_opt(property.log_source_type_id),
            log_source_name: log_sources.resolve_opt(property.log_source_id),
            low_level_category_name: categories.resolve_opt(property.low_level_category_id),
            qid_name: qids.resolve_opt(property.qid),
            identifier: property.identifier.unwrap_or_default(),
            regex: property.regex.unwrap_or_default(),
            enabled: property.enabled,
        })
        .collect())
}
