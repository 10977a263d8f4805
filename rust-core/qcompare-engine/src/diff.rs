// SPDX-License-Identifier: PMPL-1.0-or-later
//! Field comparison for matched record pairs

use std::cmp::Ordering;

use crate::report::FieldDelta;

/// Rendering of an empty member inside a set-valued field delta, so an
/// unresolved reference stays visible in the joined list.
pub const EMPTY_MEMBER: &str = "<unresolved>";

/// Compare a scalar field. Values are compared in their display form, so
/// `1000` and `"1000"` are equal.
pub fn compare_scalar(field: &str, old: &str, new: &str) -> Option<FieldDelta> {
    (old != new).then(|| FieldDelta::new(field, old, new))
}

/// Members present on one side only, as `(old_only, new_only)`.
///
/// Both inputs must be sorted. Duplicates are counted: `[a, a]` against
/// `[a]` leaves one `a` on the old side.
pub fn symmetric_difference<'a>(
    old: &'a [String],
    new: &'a [String],
) -> (Vec<&'a str>, Vec<&'a str>) {
    let mut old_only = Vec::new();
    let mut new_only = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < old.len() && j < new.len() {
        match old[i].cmp(&new[j]) {
            Ordering::Less => {
                old_only.push(old[i].as_str());
                i += 1;
            }
            Ordering::Greater => {
                new_only.push(new[j].as_str());
                j += 1;
            }
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    old_only.extend(old[i..].iter().map(String::as_str));
    new_only.extend(new[j..].iter().map(String::as_str));

    (old_only, new_only)
}

/// Compare a set-valued field given in canonical (sorted) form. On
/// inequality the delta carries only the members unique to each side.
pub fn compare_set(field: &str, old: &[String], new: &[String]) -> Option<FieldDelta> {
    if old == new {
        return None;
    }
    let (old_only, new_only) = symmetric_difference(old, new);
    Some(FieldDelta::new(field, join(&old_only), join(&new_only)))
}

fn join(members: &[&str]) -> String {
    members
        .iter()
        .map(|m| if m.is_empty() { EMPTY_MEMBER } else { *m })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Collects the deltas of one matched pair in field-table order.
#[derive(Debug, Default)]
pub struct FieldDiffer {
    deltas: Vec<FieldDelta>,
}

impl FieldDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, field: &str, old: impl ToString, new: impl ToString) -> Self {
        self.deltas
            .extend(compare_scalar(field, &old.to_string(), &new.to_string()));
        self
    }

    pub fn set(mut self, field: &str, old: &[String], new: &[String]) -> Self {
        self.deltas.extend(compare_set(field, old, new));
        self
    }

    pub fn finish(self) -> Vec<FieldDelta> {
        self.deltas
    }
}
