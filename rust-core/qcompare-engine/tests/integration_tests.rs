// SPDX-License-Identifier: PMPL-1.0-or-later
//! Integration tests for the reconciliation engine
//!
//! Two in-memory instances stand in for the old and new deployments; every
//! test goes through lookup resolution, denormalization and matching.

use serde_json::json;
use std::sync::Arc;

use qcompare_engine::{
    denormalize, reconcile, EngineConfig, FieldDelta, Reconciler, ReportKind, ReportStatus,
    UnresolvedPolicy,
};
use qcompare_source::{Collection, ConfigSource, InMemorySource};

fn reconciler(old: InMemorySource, new: InMemorySource) -> Reconciler {
    Reconciler::new(
        Arc::new(old.named("old")),
        Arc::new(new.named("new")),
        EngineConfig::default(),
    )
}

async fn compare(
    old: &InMemorySource,
    new: &InMemorySource,
    kind: ReportKind,
) -> qcompare_engine::ComparisonReport {
    let config = EngineConfig::default();
    let old_snapshot = denormalize(old, kind, &config).await.unwrap();
    let new_snapshot = denormalize(new, kind, &config).await.unwrap();
    reconcile(&old_snapshot, &new_snapshot, kind).unwrap()
}

/// Tenant rate limit drift is reported as a single field delta
#[tokio::test]
async fn test_tenant_rate_limit_drift() {
    let old = InMemorySource::new().with_raw(
        Collection::Tenant,
        vec![json!({"id": 1, "name": "Acme", "event_rate_limit": 1000, "deleted": false})],
    );
    let new = InMemorySource::new().with_raw(
        Collection::Tenant,
        vec![json!({"id": 3, "name": "Acme", "event_rate_limit": 2000, "deleted": false})],
    );

    let outcomes = reconciler(old, new).run(&[ReportKind::Tenants]).await;
    assert_eq!(outcomes.len(), 1);
    let report = outcomes[0].report().expect("tenants report available");

    assert_eq!(report.same_count(), 0);
    assert!(report.missing().is_empty());
    assert_eq!(report.different().len(), 1);
    assert_eq!(report.different()[0].label, "Name: Acme");
    assert_eq!(
        report.different()[0].fields,
        vec![FieldDelta::new("Event Rate Limit", "1000", "2000")]
    );
}

/// A child of the root group matches on name even when its parent differs
#[tokio::test]
async fn test_log_source_group_root_parent_exception() {
    let old = InMemorySource::new().with_raw(
        Collection::LogSourceGroup,
        vec![
            json!({"id": 1, "name": "Other"}),
            json!({"id": 5, "name": "G1", "parent_id": 1}),
        ],
    );
    let new = InMemorySource::new().with_raw(
        Collection::LogSourceGroup,
        vec![
            json!({"id": 1, "name": "Other"}),
            json!({"id": 2, "name": "SomethingElse"}),
            json!({"id": 7, "name": "G1", "parent_id": 2}),
        ],
    );

    let report = compare(&old, &new, ReportKind::LogSourceGroups).await;
    assert_eq!(report.same_count(), 1);
    assert!(report.missing().is_empty());
    assert_eq!(report.different().len(), 1);

    let delta = &report.different()[0];
    assert_eq!(delta.label, "Group Name: G1 (Parent: Other)");
    assert_eq!(
        delta.fields,
        vec![FieldDelta::new("Parent Group Name", "Other", "SomethingElse")]
    );
}

/// Same domain and name but a different CIDR is a different network
#[tokio::test]
async fn test_network_composite_key() {
    let old = InMemorySource::new().with_raw(
        Collection::NetworkHierarchy,
        vec![json!({"id": 1, "name": "lan", "cidr": "10.0.0.0/8", "group": "Internal", "domain_id": 0})],
    );
    let new = InMemorySource::new().with_raw(
        Collection::NetworkHierarchy,
        vec![json!({"id": 9, "name": "lan", "cidr": "10.1.0.0/16", "group": "Internal", "domain_id": 0})],
    );

    let report = compare(&old, &new, ReportKind::NetworkHierarchy).await;
    assert_eq!(report.same_count(), 0);
    assert!(report.different().is_empty());
    assert_eq!(
        report.missing(),
        ["Name: lan, CIDR: 10.0.0.0/8, Group: Internal, Domain: Default Domain".to_string()]
    );
}

/// A dangling type id surfaces as a field delta, not a failure
#[tokio::test]
async fn test_dangling_reference_is_a_delta() {
    let types = vec![json!({"id": 7, "name": "Syslog"})];
    let old = InMemorySource::new()
        .with_raw(Collection::LogSourceType, types.clone())
        .with_raw(Collection::LogSource, vec![json!({"id": 1, "name": "fw01", "type_id": 7})]);
    let new = InMemorySource::new()
        .with_raw(Collection::LogSourceType, types)
        .with_raw(Collection::LogSource, vec![json!({"id": 4, "name": "fw01", "type_id": 99})]);

    let report = compare(&old, &new, ReportKind::LogSources).await;
    assert_eq!(
        report.different()[0].fields,
        vec![FieldDelta::new("Type Name", "Syslog", "")]
    );
}

/// With the sentinel policy two different dangling ids stay distinguishable
#[tokio::test]
async fn test_sentinel_policy_separates_dangling_ids() {
    let old = InMemorySource::new()
        .with_raw(Collection::LogSource, vec![json!({"id": 1, "name": "fw01", "type_id": 5})]);
    let new = InMemorySource::new()
        .with_raw(Collection::LogSource, vec![json!({"id": 1, "name": "fw01", "type_id": 6})]);

    let empty = compare(&old, &new, ReportKind::LogSources).await;
    assert_eq!(empty.same_count(), 1);

    let config = EngineConfig {
        unresolved: UnresolvedPolicy::Sentinel,
        ..EngineConfig::default()
    };
    let old_snapshot = denormalize(&old, ReportKind::LogSources, &config).await.unwrap();
    let new_snapshot = denormalize(&new, ReportKind::LogSources, &config).await.unwrap();
    let sentinel = reconcile(&old_snapshot, &new_snapshot, ReportKind::LogSources).unwrap();
    assert_eq!(
        sentinel.different()[0].fields,
        vec![FieldDelta::new("Type Name", "unknown:5", "unknown:6")]
    );
}

/// Set-valued fields report only the members unique to each side
#[tokio::test]
async fn test_set_field_symmetric_difference() {
    let groups = vec![
        json!({"id": 1, "name": "A"}),
        json!({"id": 2, "name": "B"}),
        json!({"id": 3, "name": "C"}),
        json!({"id": 4, "name": "D"}),
    ];
    let old = InMemorySource::new()
        .with_raw(Collection::LogSourceGroup, groups.clone())
        .with_raw(
            Collection::Domain,
            vec![json!({"id": 1, "name": "Branch", "log_source_group_ids": [3, 1, 2], "deleted": false})],
        );
    let new = InMemorySource::new()
        .with_raw(Collection::LogSourceGroup, groups)
        .with_raw(
            Collection::Domain,
            vec![json!({"id": 1, "name": "Branch", "log_source_group_ids": [2, 4, 3], "deleted": false})],
        );

    let report = compare(&old, &new, ReportKind::Domains).await;
    assert_eq!(
        report.different()[0].fields,
        vec![FieldDelta::new("Log Source Group Names", "A", "D")]
    );
}

/// A record absent from the new instance is listed exactly once
#[tokio::test]
async fn test_missing_detection() {
    let old = InMemorySource::new().with_raw(
        Collection::PropertyExpression,
        vec![
            json!({"id": 1, "identifier": "UserName", "regex": "user=(\\S+)"}),
            json!({"id": 2, "identifier": "SrcPort", "regex": "sport=(\\d+)"}),
        ],
    );
    let new = InMemorySource::new().with_raw(
        Collection::PropertyExpression,
        vec![json!({"id": 8, "identifier": "SrcPort", "regex": "sport=(\\d+)"})],
    );

    let report = compare(&old, &new, ReportKind::CustomProperties).await;
    assert_eq!(report.same_count(), 1);
    assert_eq!(report.old_count(), 2);
    assert_eq!(report.new_count(), 1);
    assert_eq!(report.missing(), ["Identifier: UserName (user=(\\S+))".to_string()]);
}

/// Rule drift compares conditions and referenced building blocks
#[tokio::test]
async fn test_rule_building_block_drift() {
    let rule = |blocks: &str| {
        format!(
            r#"<rule id="1"><name>Recon</name><testDefinitions>
                 <test name="com.q1labs.semsources.cre.tests.RuleMatch_Test" uid="0">
                   <parameter id="1"><userSelection>0</userSelection></parameter>
                   <parameter id="2"><userSelection>{blocks}</userSelection></parameter>
                 </test>
               </testDefinitions></rule>"#
        )
    };
    let old = InMemorySource::new().with_raw(
        Collection::RuleWithData,
        vec![json!({"id": 1, "name": "Recon", "rule_xml": rule("BB:A, BB:B")})],
    );
    let new = InMemorySource::new().with_raw(
        Collection::RuleWithData,
        vec![json!({"id": 2, "name": "Recon", "rule_xml": rule("BB:A")})],
    );

    let report = compare(&old, &new, ReportKind::Rules).await;
    assert_eq!(report.different()[0].label, "Rule Name: Recon");
    assert_eq!(
        report.different()[0].fields,
        vec![FieldDelta::new("Number of Building Blocks", "2", "1")]
    );
}

/// A failing collection costs only the reports that depend on it
#[tokio::test]
async fn test_failure_isolation() {
    let tenants = vec![json!({"id": 1, "name": "Acme", "deleted": false})];
    let old = InMemorySource::new().with_raw(Collection::Tenant, tenants.clone());
    let new = InMemorySource::new()
        .with_raw(Collection::Tenant, tenants)
        .failing(Collection::Domain);

    let outcomes = reconciler(old, new)
        .run(&[ReportKind::Domains, ReportKind::Tenants])
        .await;

    assert_eq!(outcomes[0].kind, ReportKind::Domains);
    match &outcomes[0].status {
        ReportStatus::Unavailable { reason } => assert!(reason.contains("injected failure")),
        other => panic!("expected unavailable, got {other:?}"),
    }
    assert_eq!(outcomes[1].kind, ReportKind::Tenants);
    assert_eq!(outcomes[1].report().map(|r| r.same_count()), Some(1));
}

/// QIDs and DSM mappings are matched through a keyed index
#[tokio::test]
async fn test_qids_and_dsm_mappings() {
    let shared = |source: InMemorySource| {
        source
            .with_raw(Collection::LogSourceType, vec![json!({"id": 7, "name": "Cisco ASA"})])
            .with_raw(Collection::LowLevelCategory, vec![json!({"id": 3, "name": "Firewall Deny"})])
    };
    let old = shared(InMemorySource::new())
        .with_raw(
            Collection::Qid,
            vec![
                json!({"id": 50, "name": "Deny", "severity": 5, "low_level_category_id": 3, "log_source_type_id": 7}),
                json!({"id": 51, "name": "Reject", "severity": 4}),
            ],
        )
        .with_raw(
            Collection::DsmMapping,
            vec![json!({"id": 1, "log_source_type_id": 7, "qid_record_id": 50,
                        "log_source_event_id": "106023", "log_source_event_category": "deny",
                        "custom_event": true})],
        );
    let new = shared(InMemorySource::new())
        .with_raw(
            Collection::Qid,
            vec![json!({"id": 90, "name": "Deny", "severity": 6, "low_level_category_id": 3, "log_source_type_id": 7})],
        )
        .with_raw(
            Collection::DsmMapping,
            vec![json!({"id": 4, "log_source_type_id": 7, "qid_record_id": 90,
                        "log_source_event_id": "106023", "log_source_event_category": "deny",
                        "custom_event": true})],
        );

    let qids = compare(&old, &new, ReportKind::Qids).await;
    assert_eq!(qids.missing(), ["Reject".to_string()]);
    assert_eq!(
        qids.different()[0].fields,
        vec![FieldDelta::new("Severity", "5", "6")]
    );

    let mappings = compare(&old, &new, ReportKind::DsmMappings).await;
    assert_eq!(mappings.same_count(), 1);
    assert!(mappings.is_clean());
}

/// Snapshot documents load into sources the engine can compare
#[tokio::test]
async fn test_snapshot_documents() {
    let document = json!({
        "tenant": [{"id": 1, "name": "Acme", "deleted": false}],
        "rule_group": [{"id": 1, "name": "Recon", "child_items": []}]
    });
    let old = InMemorySource::from_document("old.json", document.clone()).unwrap();
    let new = InMemorySource::from_document("new.json", document).unwrap();
    assert_eq!(old.describe(), "old.json");

    let outcomes = reconciler(old, new)
        .run(&[ReportKind::Tenants, ReportKind::RuleGroups])
        .await;
    assert!(outcomes.iter().all(|o| o.report().is_some_and(|r| r.is_clean())));
}
