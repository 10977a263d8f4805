// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Error types for the QRadar client.
//!
//! All fallible operations in this crate return [`Result<T>`], an alias for
//! `std::result::Result<T, ClientError>`. The engine never sees these
//! variants: the [`ConfigSource`](qcompare_source::ConfigSource) impl
//! collapses them into a single unavailable condition.

use thiserror::Error;

/// Error type for QRadar client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The requested endpoint does not exist on this platform version.
    #[error("Endpoint not found: {0}")]
    NotFound(String),

    /// The security token was rejected or lacks the required capability.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An underlying HTTP / network transport error from `reqwest`.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The platform returned an HTTP error status.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the platform's error body, or the bare status.
        message: String,
    },

    /// Client-side validation failed before any request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request exceeded the configured timeout.
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

/// Crate-level result alias using [`ClientError`].
pub type Result<T> = std::result::Result<T, ClientError>;
