//! CLI command implementations

pub mod extract;
pub mod list;

use anyhow::{Context, Result};
use sharefetch_core::Error;
use sharefetch_delta::{ClientOptions, DeltaSharingClient};
use std::sync::Arc;

use crate::config::CliConfig;

/// Profile path the client was created from
pub fn profile_path(config: &CliConfig) -> Result<&str> {
    config.sharing.profile.as_deref().ok_or_else(|| {
        Error::connection("no sharing profile configured (set CONFIG_PATH or --profile)").into()
    })
}

/// HTTP settings from the `sharing` section
pub fn client_options(config: &CliConfig) -> ClientOptions {
    ClientOptions {
        timeout: config.sharing.timeout(),
        page_size: config.sharing.page_size,
    }
}

/// Create the sharing client from config
pub async fn connect(config: &CliConfig) -> Result<Arc<DeltaSharingClient>> {
    let profile = profile_path(config)?;
    let options = client_options(config);

    let client = DeltaSharingClient::connect_with(profile, options)
        .await
        .with_context(|| format!("Failed to connect using profile {}", profile))?;
    Ok(Arc::new(client))
}
