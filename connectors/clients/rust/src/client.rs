// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! QRadar client configuration, authentication, and HTTP transport layer.
//!
//! [`QRadarClient`] owns the console URL, the HTTP client and the security
//! token. Collection reads are defined in [`crate::collections`]; this module
//! only knows how to issue an authenticated GET and interpret the response.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RANGE};
use serde::de::DeserializeOwned;
use url::Url;

use qcompare_source::Page;

use crate::error::{ClientError, Result};
use crate::types::{ClientOptions, ErrorResponse};

/// Header carrying the authorized-service / user security token.
const SEC_HEADER: &str = "SEC";
/// Header pinning the REST API version.
const VERSION_HEADER: &str = "Version";

/// Read-only client for one QRadar console.
///
/// # Examples
///
/// ```rust,no_run
/// use qradar_client::client::QRadarClient;
///
/// # fn main() -> qradar_client::error::Result<()> {
/// let client = QRadarClient::new("console.example.com", "5a1f...")?;
/// assert_eq!(client.base_url().as_str(), "https://console.example.com/");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QRadarClient {
    /// Normalised console URL, always ending in `/`.
    base_url: Url,
    /// Underlying `reqwest` HTTP client (connection-pooled, TLS-capable).
    http: reqwest::Client,
    options: ClientOptions,
}

impl std::fmt::Debug for QRadarClient {
    // The token lives in the default headers and must not end up in logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QRadarClient")
            .field("base_url", &self.base_url.as_str())
            .field("options", &self.options)
            .finish()
    }
}

impl QRadarClient {
    /// Create a client with default [`ClientOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] if `base_url` cannot be parsed or
    /// `token` is empty or not a valid header value.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        Self::with_options(base_url, token, ClientOptions::default())
    }

    /// Create a client with explicit connection options.
    pub fn with_options(base_url: &str, token: &str, options: ClientOptions) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;

        if token.trim().is_empty() {
            return Err(ClientError::Validation(
                "Security token must not be empty".to_string(),
            ));
        }
        let mut token = HeaderValue::from_str(token.trim())
            .map_err(|e| ClientError::Validation(format!("Invalid security token: {e}")))?;
        token.set_sensitive(true);

        let version = HeaderValue::from_str(&options.api_version)
            .map_err(|e| ClientError::Validation(format!("Invalid API version: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(SEC_HEADER, token);
        headers.insert(VERSION_HEADER, version);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(options.accept_invalid_certs);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::Network)?;

        Ok(Self {
            base_url,
            http,
            options,
        })
    }

    /// The normalised console URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    // -- Internal HTTP helpers ----------------------------------------------

    /// Full URL of an API endpoint, e.g. `analytics/rules`.
    pub(crate) fn url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(&format!("api/{}", endpoint.trim_start_matches('/')))
            .map_err(|e| ClientError::Validation(format!("Invalid endpoint '{endpoint}': {e}")))
    }

    /// Perform a GET request and deserialize the JSON response body.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        page: Option<Page>,
    ) -> Result<T> {
        let url = self.url(endpoint)?;
        let mut request = self.http.get(url).query(params);
        if let Some(range) = page.as_ref().and_then(range_header) {
            request = request.header(RANGE, range);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        self.handle_response(response).await
    }

    // -- Response handling --------------------------------------------------

    fn transport_error(&self, error: reqwest::Error) -> ClientError {
        if error.is_timeout() {
            let millis = self.options.timeout.map_or(0, |t| t.as_millis() as u64);
            ClientError::Timeout(millis)
        } else {
            ClientError::Network(error)
        }
    }

    /// Deserialize a successful response or extract an error from the body.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(ClientError::Serialization)
        } else {
            Err(classify_error(status.as_u16(), &body))
        }
    }
}

/// Accept `host`, `host:port` or a full URL; default to HTTPS and make sure
/// the path ends in `/` so endpoint joins append instead of replace.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ClientError::Validation("Base URL must not be empty".to_string()));
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    let mut url = Url::parse(&with_scheme)
        .map_err(|e| ClientError::Validation(format!("Invalid base URL '{raw}': {e}")))?;

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// `Range: items=<first>-<last>` for a page; `None` for an empty page.
fn range_header(page: &Page) -> Option<String> {
    page.last_index()
        .map(|last| format!("items={}-{}", page.offset, last))
}

/// Turn a non-2xx response into the appropriate [`ClientError`] variant.
fn classify_error(status: u16, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|err| err.text().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {status}"));

    match status {
        404 => ClientError::NotFound(message),
        401 | 403 => ClientError::Unauthorized(message),
        _ => ClientError::Server { status, message },
    }
}
