// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Configuration collection reads.
//!
//! Every collection the comparison needs is a plain list endpoint that
//! accepts a `fields` projection, a `filter` expression and an item range.

use serde_json::Value;

use qcompare_source::{Collection, FetchQuery, SourceRecord};

use crate::client::QRadarClient;
use crate::error::Result;

impl QRadarClient {
    /// Fetch raw JSON records of `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`](crate::error::ClientError::Unauthorized)
    /// when the token lacks the capability for this collection.
    pub async fn fetch_collection(
        &self,
        collection: Collection,
        query: &FetchQuery,
    ) -> Result<Vec<Value>> {
        if query.page.is_some_and(|page| page.limit == 0) {
            return Ok(Vec::new());
        }

        let mut params: Vec<(&str, &str)> = Vec::with_capacity(2);
        if let Some(fields) = query.fields.as_deref() {
            params.push(("fields", fields));
        }
        if let Some(filter) = query.filter.as_deref() {
            params.push(("filter", filter));
        }

        self.get(collection.endpoint(), &params, query.page).await
    }

    /// Fetch and decode the records of `T`'s collection.
    pub async fn fetch_records<T: SourceRecord>(&self, query: &FetchQuery) -> Result<Vec<T>> {
        let raw = self.fetch_collection(T::COLLECTION, query).await?;
        raw.into_iter()
            .map(|value| serde_json::from_value(value).map_err(Into::into))
            .collect()
    }
}
