// SPDX-License-Identifier: PMPL-1.0-or-later
//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a foreign-key id with no lookup entry is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// The empty string. Two different dangling ids compare equal.
    #[default]
    Empty,
    /// `unknown:<id>`, so distinct dangling ids stay distinguishable.
    Sentinel,
}

impl UnresolvedPolicy {
    /// Placeholder name for an id that is not in the lookup map.
    pub fn placeholder(self, id: impl fmt::Display) -> String {
        match self {
            UnresolvedPolicy::Empty => String::new(),
            UnresolvedPolicy::Sentinel => format!("unknown:{id}"),
        }
    }
}

impl std::str::FromStr for UnresolvedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "empty" => Ok(UnresolvedPolicy::Empty),
            "sentinel" => Ok(UnresolvedPolicy::Sentinel),
            other => Err(format!(
                "Unknown unresolved policy '{other}'. Valid policies: empty, sentinel"
            )),
        }
    }
}

/// Configuration for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rendering of dangling references.
    pub unresolved: UnresolvedPolicy,
    /// Fetch collections in pages of this many records (`None` = one request).
    pub page_size: Option<usize>,
}
