// SPDX-License-Identifier: PMPL-1.0-or-later
//! Natural keys, identity labels and tracked fields per entity type

use crate::diff::FieldDiffer;
use crate::report::FieldDelta;
use crate::resolved::*;

/// Parent id the platform reserves for the root log source group.
pub(crate) const ROOT_GROUP_ID: i64 = 1;

/// A resolved record that can be paired with its counterpart in another
/// instance and diffed against it.
pub(crate) trait Reconcilable {
    /// Human-readable identity used in missing and drift listings.
    fn label(&self) -> String;

    /// Natural-key predicate, evaluated as `old.same_object(new)`.
    fn same_object(&self, new: &Self) -> bool;

    /// Tracked-field deltas, evaluated as `old.diff(new)`.
    fn diff(&self, new: &Self) -> Vec<FieldDelta>;
}

/// A [`Reconcilable`] whose natural key is a single composite string, so
/// the new side can be indexed instead of scanned.
pub(crate) trait Indexed: Reconcilable {
    fn index_key(&self) -> String;
}

fn show<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

impl Reconcilable for ResolvedTenant {
    fn label(&self) -> String {
        format!("Name: {}", self.name)
    }

    fn same_object(&self, new: &Self) -> bool {
        self.name == new.name
    }

    fn diff(&self, new: &Self) -> Vec<FieldDelta> {
        FieldDiffer::new()
            .scalar("Description", &self.description, &new.description)
            .scalar(
                "Event Rate Limit",
                show(&self.event_rate_limit),
                show(&new.event_rate_limit),
            )
            .scalar(
                "Flow Rate Limit",
                show(&self.flow_rate_limit),
                show(&new.flow_rate_limit),
            )
            .finish()
    }
}

impl Reconcilable for ResolvedDomain {
    fn label(&self) -> String {
        format!("Name: {} ({})", self.name, self.description)
    }

    fn same_object(&self, new: &Self) -> bool {
        self.name == new.name
    }

    fn diff(&self, new: &Self) -> Vec<FieldDelta> {
        FieldDiffer::new()
            .scalar("Description", &self.description, &new.description)
            .scalar("Tenant Name", &self.tenant_name, &new.tenant_name)
            .set(
                "Log Source Group Names",
                &self.log_source_group_names,
                &new.log_source_group_names,
            )
            .finish()
    }
}

impl Reconcilable for ResolvedLogSource {
    fn label(&self) -> String {
        format!("Name: {}", self.name)
    }

    fn same_object(&self, new: &Self) -> bool {
        self.name == new.name
    }

    fn diff(&self, new: &Self) -> Vec<FieldDelta> {
        FieldDiffer::new()
            .scalar("Description", &self.description, &new.description)
            .scalar("Type Name", &self.type_name, &new.type_name)
            .scalar("Extension Name", &self.extension_name, &new.extension_name)
            .set("Log Source Group Names", &self.group_names, &new.group_names)
            .scalar("Enabled", show(&self.enabled), show(&new.enabled))
            .scalar("Credibility", show(&self.credibility), show(&new.credibility))
            .scalar(
                "Store Event Payload",
                show(&self.store_event_payload),
                show(&new.store_event_payload),
            )
            .scalar(
                "Coalesce Events",
                show(&self.coalesce_events),
                show(&new.coalesce_events),
            )
            .finish()
    }
}

impl Reconcilable for ResolvedLogSourceGroup {
    fn label(&self) -> String {
        format!("Group Name: {} (Parent: {})", self.name, self.parent_name)
    }

    /// The root group's parent name does not resolve reliably across
    /// instances, so children of the root match on name alone.
    fn same_object(&self, new: &Self) -> bool {
        self.name == new.name
            && (self.parent_name == new.parent_name || self.parent_id == Some(ROOT_GROUP_ID))
    }

    fn diff(&self, new: &Self) -> Vec<FieldDelta> {
        FieldDiffer::new()
            .scalar("Description", &self.description, &new.description)
            .scalar("Parent Group Name", &self.parent_name, &new.parent_name)
            .set("Child Group Names", &self.child_names, &new.child_names)
            .finish()
    }
}

impl Reconcilable for ResolvedRule {
    fn label(&self) -> String {
        format!("Rule Name: {}", self.name)
    }

    fn same_object(&self, new: &Self) -> bool {
        self.name == new.name
    }

    fn diff(&self, new: &Self) -> Vec<FieldDelta> {
        self.definition.compare(&new.definition)
    }
}

impl Reconcilable for ResolvedRuleGroup {
    fn label(&self) -> String {
        format!("Name: {} (Parent Name: {})", self.name, self.parent_name)
    }

    fn same_object(&self, new: &Self) -> bool {
        self.name == new.name
    }

    fn diff(&self, new: &Self) -> Vec<FieldDelta> {
        FieldDiffer::new()
            .scalar("Description", &self.description, &new.description)
            .scalar("Parent Name", &self.parent_name, &new.parent_name)
            .scalar("Type", &self.group_type, &new.group_type)
            .set("Associated Rules", &self.rule_names, &new.rule_names)
            .finish()
    }
}

impl Reconcilable for ResolvedNetwork {
    fn label(&self) -> String {
        format!(
            "Name: {}, CIDR: {}, Group: {}, Domain: {}",
            self.name, self.cidr, self.group, self.domain_name
        )
    }

    fn same_object(&self, new: &Self) -> bool {
        self.domain_name == new.domain_name && self.name == new.name && self.cidr == new.cidr
    }

    fn diff(&self, new: &Self) -> Vec<FieldDelta> {
        FieldDiffer::new()
            .scalar("Description", &self.description, &new.description)
            .scalar("Group", &self.group, &new.group)
            .finish()
    }
}

/// Presence only; a mapping has no tracked fields.
impl Reconcilable for ResolvedDsmMapping {
    fn label(&self) -> String {
        format!(
            "Log Source Type: {}, Log Source Event ID: {}, Log Source Event Category: {}, QID Name: {}, Is Custom Mapping: {}",
            self.log_source_type_name,
            self.event_id,
            self.event_category,
            self.qid_name,
            self.custom.unwrap_or_default()
        )
    }

    fn same_object(&self, new: &Self) -> bool {
        self.index_key() == new.index_key()
    }

    fn diff(&self, _new: &Self) -> Vec<FieldDelta> {
        Vec::new()
    }
}

impl Indexed for ResolvedDsmMapping {
    fn index_key(&self) -> String {
        [
            self.log_source_type_name.as_str(),
            self.qid_name.as_str(),
            self.event_category.as_str(),
            self.event_id.as_str(),
        ]
        .join("\u{1f}")
    }
}

impl Reconcilable for ResolvedQid {
    fn label(&self) -> String {
        self.name.clone()
    }

    fn same_object(&self, new: &Self) -> bool {
        self.name == new.name
    }

    fn diff(&self, new: &Self) -> Vec<FieldDelta> {
        FieldDiffer::new()
            .scalar(
                "Low Level Category Name",
                &self.low_level_category_name,
                &new.low_level_category_name,
            )
            .scalar(
                "Log Source Type Name",
                &self.log_source_type_name,
                &new.log_source_type_name,
            )
            .scalar("Severity", show(&self.severity), show(&new.severity))
            .scalar("Description", &self.description, &new.description)
            .finish()
    }
}

impl Indexed for ResolvedQid {
    fn index_key(&self) -> String {
        self.name.clone()
    }
}

impl Reconcilable for ResolvedCustomProperty {
    fn label(&self) -> String {
        format!("Identifier: {} ({})", self.identifier, self.regex)
    }

    fn same_object(&self, new: &Self) -> bool {
        self.identifier == new.identifier
    }

    fn diff(&self, new: &Self) -> Vec<FieldDelta> {
        FieldDiffer::new()
            .scalar(
                "Log Source Type",
                &self.log_source_type_name,
                &new.log_source_type_name,
            )
            .scalar("Log Source", &self.log_source_name, &new.log_source_name)
            .scalar(
                "Low Level Category",
                &self.low_level_category_name,
                &new.low_level_category_name,
            )
            .scalar("QID", &self.qid_name, &new.qid_name)
            .scalar("Regex", &self.regex, &new.regex)
            .scalar("Enabled", show(&self.enabled), show(&new.enabled))
            .finish()
    }
}
