// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Wire types of the QRadar REST API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// API version pinned through the `Version` header unless overridden.
pub const DEFAULT_API_VERSION: &str = "14.0";

/// Error body returned by the platform with non-2xx responses.
///
/// ```json
/// {"http_response": {"code": 401, "message": "..."}, "code": 10,
///  "message": "No SEC header present in request.", "description": "..."}
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    /// Platform-specific error code.
    pub code: Option<i64>,
    /// Short human-readable message.
    pub message: Option<String>,
    /// Longer explanation, sometimes the only text present.
    pub description: Option<String>,
}

impl ErrorResponse {
    /// The most specific non-empty text in the body.
    pub fn text(&self) -> Option<&str> {
        [self.message.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
    }
}

/// Connection options for a [`QRadarClient`](crate::client::QRadarClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Per-request timeout. `None` waits as long as the console takes.
    pub timeout: Option<Duration>,
    /// Skip TLS certificate verification (self-signed consoles).
    pub accept_invalid_certs: bool,
    /// Value of the `Version` header.
    pub api_version: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            accept_invalid_certs: false,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}
