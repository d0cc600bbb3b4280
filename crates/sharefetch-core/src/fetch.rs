//! Table fetcher
//!
//! Loads one table through a [`SharingClient`] and classifies the result.
//! Errors never escape `fetch_table`: they come back as
//! [`FetchOutcome::Failed`] so one table cannot take down its siblings.

use tracing::{debug, info, warn};

use crate::{Error, SharingClient, TableData, TableLocator, TableRef};

/// Result of fetching a single table
#[derive(Debug)]
pub enum FetchOutcome {
    /// The table has at least one row
    Loaded(TableData),

    /// The table exists but has no rows
    Empty,

    /// Loading failed; the error is kept for reporting
    Failed(Error),
}

/// Fetches the full contents of `table`
///
/// The table is addressed as `<config_path>#<share_name>.<schema>.<name>`.
pub async fn fetch_table(
    client: &dyn SharingClient,
    table: &TableRef,
    config_path: &str,
    share_name: &str,
) -> FetchOutcome {
    let locator = TableLocator::new(config_path, share_name, table);
    debug!(table = %table, locator = %locator, "Loading table");

    match client.load_table(&locator).await {
        Ok(data) if data.is_empty() => {
            info!(table = %table, "Table is empty");
            FetchOutcome::Empty
        }
        Ok(data) => {
            info!(table = %table, rows = data.num_rows(), "Table loaded");
            FetchOutcome::Loaded(data)
        }
        Err(e) => {
            warn!(table = %table, error = %e, "Failed to load table");
            FetchOutcome::Failed(e)
        }
    }
}
