// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! [`ConfigSource`] over a live console.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use qcompare_source::{Collection, ConfigSource, FetchQuery, SourceError};

use crate::client::QRadarClient;

#[async_trait]
impl ConfigSource for QRadarClient {
    fn describe(&self) -> String {
        self.base_url()
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| self.base_url().to_string())
    }

    /// Transport, auth and decode failures all become
    /// [`SourceError::Unavailable`]; the engine cannot act on the difference.
    #[instrument(skip(self, query), fields(console = %self.describe()))]
    async fn fetch_raw(
        &self,
        collection: Collection,
        query: &FetchQuery,
    ) -> qcompare_source::Result<Vec<Value>> {
        self.fetch_collection(collection, query).await.map_err(|e| {
            tracing::warn!(%collection, error = %e, "fetch failed");
            SourceError::unavailable(collection, e.to_string())
        })
    }
}
