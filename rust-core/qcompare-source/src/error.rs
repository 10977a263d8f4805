// SPDX-License-Identifier: PMPL-1.0-or-later
//! Source error type.

use thiserror::Error;

use crate::Collection;

/// A fetch against one instance failed.
///
/// Transport, authentication and decoding failures all land here: the
/// reconciliation engine cannot act differently on any of them, it only
/// needs to abort the entity type that depended on the fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("source unavailable while fetching {collection}: {reason}")]
    Unavailable {
        collection: Collection,
        reason: String,
    },
}

impl SourceError {
    /// Build an [`SourceError::Unavailable`] for `collection`.
    pub fn unavailable(collection: Collection, reason: impl Into<String>) -> Self {
        SourceError::Unavailable {
            collection,
            reason: reason.into(),
        }
    }

    /// The collection whose fetch failed.
    pub fn collection(&self) -> Collection {
        match self {
            SourceError::Unavailable { collection, .. } => *collection,
        }
    }
}

/// Crate-level result alias using [`SourceError`].
pub type Result<T> = std::result::Result<T, SourceError>;
