// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! # QRadar REST client
//!
//! A read-only client for the configuration collections of one QRadar
//! console, and the [`ConfigSource`](qcompare_source::ConfigSource) the
//! comparison engine reads through.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qcompare_source::{FetchQuery, Tenant};
//! use qradar_client::client::QRadarClient;
//!
//! #[tokio::main]
//! async fn main() -> qradar_client::error::Result<()> {
//!     let client = QRadarClient::new("console.example.com", "5a1f...")?;
//!     let query = FetchQuery::all().with_filter(FetchQuery::NOT_DELETED);
//!     let tenants: Vec<Tenant> = client.fetch_records(&query).await?;
//!     println!("{} tenants", tenants.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`client`]: Connection options, authentication, and HTTP transport.
//! - [`collections`]: Projection, filter and range reads of one collection.
//! - [`types`]: Wire types (error body) and client options.
//! - [`error`]: Error types and the crate-level `Result` alias.

pub mod client;
pub mod collections;
pub mod error;
pub mod source;
pub mod types;

pub use client::QRadarClient;
pub use error::{ClientError, Result};
pub use types::ClientOptions;
