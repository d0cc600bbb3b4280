//! # sharefetch core library
//!
//! Types and pipeline stages for extracting tables from a data share into
//! CSV files. The crate knows nothing about HTTP: it talks to the endpoint
//! through the [`SharingClient`] trait, implemented in `sharefetch-delta`.
//!
//! ## Key Components
//!
//! - **SharingClient**: list shares, list tables, load one table
//! - **Table filter**: regex selection over the catalog
//! - **Fetcher**: loads one table and classifies it as loaded / empty / failed
//! - **CSV writer**: `<output_dir>/<schema>.<name>.csv`
//! - **ExtractionJob**: the batch orchestrator tying the stages together
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use sharefetch_core::prelude::*;
//!
//! let job = ExtractionJob::init(client, JobConfig::new(config_path)).await?;
//! let report = job.run(Arc::new(NoopReporter)).await?;
//! ```

pub use batch::{
    BatchReport, BatchReporter, ExtractionJob, JobConfig, NoopReporter, Strategy, TableReport,
    TableStatus,
};
pub use client::SharingClient;
pub use csv_writer::{csv_path, write_csv, DEFAULT_OUTPUT_DIR};
pub use error::{Error, Result};
pub use fetch::{fetch_table, FetchOutcome};
pub use filter::{filter_tables, TableFilter, DEFAULT_TABLE_PATTERN};
pub use types::{Share, TableData, TableLocator, TableRef};

pub mod batch;
mod client;
pub mod csv_writer;
mod error;
pub mod fetch;
pub mod filter;
mod types;

/// Commonly used imports: `use sharefetch_core::prelude::*`
pub mod prelude {
    pub use crate::batch::{BatchReporter, ExtractionJob, JobConfig, NoopReporter, Strategy};
    pub use crate::client::SharingClient;
    pub use crate::error::{Error, Result};
    pub use crate::types::{Share, TableData, TableLocator, TableRef};
}
