//! Sharing client trait
//!
//! This module defines the `SharingClient` trait, the seam between the
//! extraction pipeline and whatever actually talks to the sharing endpoint.
//! The pipeline only ever needs three things from a client:
//! - List the shares visible to the credential
//! - List every table across those shares
//! - Load one table, addressed by its composite locator
//!
//! The REST implementation lives in `sharefetch-delta`; tests use in-memory
//! implementations.

use crate::{Result, Share, TableData, TableLocator, TableRef};
use async_trait::async_trait;

/// The operations a data-sharing backend must provide
///
/// Implementations hold no mutable state beyond their connection handle, so a
/// single client is shared (behind `Arc`) by every concurrent table fetch.
#[async_trait]
pub trait SharingClient: Send + Sync {
    /// Lists all shares visible to the configured credential
    ///
    /// # Errors
    ///
    /// - `Connection` if the endpoint is unreachable or rejects the profile
    async fn list_shares(&self) -> Result<Vec<Share>>;

    /// Lists every table across all visible shares, in endpoint order
    ///
    /// # Errors
    ///
    /// - `Connection` if the endpoint is unreachable or rejects the profile
    async fn list_all_tables(&self) -> Result<Vec<TableRef>>;

    /// Loads the full contents of the addressed table into memory
    ///
    /// A table without rows is returned as `TableData` with zero rows, not
    /// as an error.
    ///
    /// # Errors
    ///
    /// - `Fetch` for network errors, malformed responses or access denial
    async fn load_table(&self, locator: &TableLocator) -> Result<TableData>;
}
