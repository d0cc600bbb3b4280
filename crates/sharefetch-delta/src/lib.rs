//! # Delta Sharing client
//!
//! This crate provides the Delta Sharing implementation of the
//! [`SharingClient`](sharefetch_core::SharingClient) trait.
//!
//! ```rust,ignore
//! use sharefetch_core::SharingClient;
//! use sharefetch_delta::DeltaSharingClient;
//!
//! let client = DeltaSharingClient::connect("config.share").await?;
//! for table in client.list_all_tables().await? {
//!     println!("{}", table.qualified_name());
//! }
//! ```
//!
//! ## Scope
//!
//! - Bearer-token profiles (`shareCredentialsVersion` 1)
//! - Share and table listing with paging
//! - Full table loads from parquet data files, partition columns included
//!
//! Change data feed, time travel and predicate pushdown are not supported.

pub use client::{ClientOptions, DeltaSharingClient};
pub use profile::SharingProfile;

mod client;
pub mod profile;
pub mod protocol;
pub mod reader;
