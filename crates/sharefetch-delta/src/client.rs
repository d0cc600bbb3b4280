//! Delta Sharing REST client
//!
//! Implements [`SharingClient`] on top of the Delta Sharing protocol:
//! - `GET  /shares`
//! - `GET  /shares/{share}/all-tables`
//! - `POST /shares/{share}/schemas/{schema}/tables/{table}/query`
//!
//! Listing calls follow `nextPageToken` until the server stops returning one.
//! A table load runs the query, downloads every data file it references
//! (pre-signed URLs, no credentials attached) and decodes them into Arrow.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use sharefetch_core::{Error, Result, Share, SharingClient, TableData, TableLocator, TableRef};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::profile::SharingProfile;
use crate::protocol::{parse_schema_string, ListPage, QueryResponse, ShareItem, TableItem};
use crate::reader::{decode_parquet, project_batch};

const USER_AGENT: &str = concat!("sharefetch/", env!("CARGO_PKG_VERSION"));

/// Longest server message kept in an error
const MAX_ERROR_BODY: usize = 512;

/// Tunables for the HTTP layer
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,

    /// `maxResults` sent with listing requests; `None` lets the server choose
    pub page_size: Option<u32>,
}

/// Delta Sharing client bound to one profile
#[derive(Debug)]
pub struct DeltaSharingClient {
    /// Path or URL the profile was read from
    profile_source: String,
    profile: SharingProfile,
    http: reqwest::Client,
    page_size: Option<u32>,
}

impl DeltaSharingClient {
    /// Reads the profile at `config_path` and prepares the HTTP client
    ///
    /// # Errors
    ///
    /// - `Connection` if the profile is missing, unreadable or invalid
    pub async fn connect(config_path: &str) -> Result<Self> {
        Self::connect_with(config_path, ClientOptions::default()).await
    }

    pub async fn connect_with(config_path: &str, options: ClientOptions) -> Result<Self> {
        let http = build_http_client(&options)?;
        let profile = SharingProfile::load(config_path, &http).await?;
        Ok(Self::with_http(config_path, profile, http, options.page_size))
    }

    fn with_http(
        profile_source: impl Into<String>,
        profile: SharingProfile,
        http: reqwest::Client,
        page_size: Option<u32>,
    ) -> Self {
        if profile.is_expired(chrono::Utc::now()) {
            warn!(
                endpoint = %profile.endpoint,
                expiration = ?profile.expiration_time,
                "Sharing profile token has expired"
            );
        }
        Self {
            profile_source: profile_source.into(),
            profile,
            http,
            page_size,
        }
    }

    pub fn profile(&self) -> &SharingProfile {
        &self.profile
    }

    fn request(&self, profile: &SharingProfile, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", profile.endpoint, path);
        self.http
            .request(method, url)
            .bearer_auth(profile.token())
            .header(reqwest::header::USER_AGENT, USER_AGENT)
    }

    /// GETs every page of a listing endpoint
    async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(size) = self.page_size {
                query.push(("maxResults", size.to_string()));
            }
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .request(&self.profile, Method::GET, path)
                .query(&query)
                .send()
                .await
                .map_err(|e| Error::connection(format!("GET {path} failed: {e}")))?;
            let response = check_status(response, "GET", path)
                .await
                .map_err(Error::Connection)?;
            let page: ListPage<T> = response
                .json()
                .await
                .map_err(|e| Error::connection(format!("Invalid response from {path}: {e}")))?;

            page_token = page.next_token().map(str::to_string);
            items.extend(page.items);
            if page_token.is_none() {
                return Ok(items);
            }
        }
    }

    async fn list_tables_in_share(&self, share: &str) -> Result<Vec<TableRef>> {
        let items: Vec<TableItem> = self
            .list_all(&format!("/shares/{}/all-tables", encode(share)))
            .await?;
        Ok(items.into_iter().map(TableRef::from).collect())
    }

    async fn query_table(
        &self,
        profile: &SharingProfile,
        locator: &TableLocator,
    ) -> Result<QueryResponse> {
        let path = format!(
            "/shares/{}/schemas/{}/tables/{}/query",
            encode(&locator.share),
            encode(&locator.schema),
            encode(&locator.table)
        );

        let response = self
            .request(profile, Method::POST, &path)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Error::fetch(format!("POST {path} failed: {e}")))?;
        let response = check_status(response, "POST", &path)
            .await
            .map_err(Error::Fetch)?;
        let body = response
            .text()
            .await
            .map_err(|e| Error::fetch(format!("Failed to read response from {path}: {e}")))?;

        QueryResponse::parse(&body)
    }

    async fn download(&self, url: &str) -> Result<bytes::Bytes> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(format!("Failed to download data file: {e}")))?;
        let response = check_status(response, "GET", "<data file>")
            .await
            .map_err(Error::Fetch)?;
        response
            .bytes()
            .await
            .map_err(|e| Error::fetch(format!("Failed to read data file: {e}")))
    }
}

#[async_trait]
impl SharingClient for DeltaSharingClient {
    async fn list_shares(&self) -> Result<Vec<Share>> {
        let items: Vec<ShareItem> = self.list_all("/shares").await?;
        Ok(items.into_iter().map(Share::from).collect())
    }

    async fn list_all_tables(&self) -> Result<Vec<TableRef>> {
        let mut tables = Vec::new();
        for share in self.list_shares().await? {
            let in_share = self.list_tables_in_share(&share.name).await?;
            debug!(share = %share.name, tables = in_share.len(), "Listed share tables");
            tables.extend(in_share);
        }
        Ok(tables)
    }

    async fn load_table(&self, locator: &TableLocator) -> Result<TableData> {
        // Locators are self-contained; one pointing at another profile is honored
        let foreign_profile;
        let profile = if locator.profile == self.profile_source {
            &self.profile
        } else {
            foreign_profile = SharingProfile::load(&locator.profile, &self.http)
                .await
                .map_err(|e| Error::fetch(e.to_string()))?;
            &foreign_profile
        };

        let response = self.query_table(profile, locator).await?;
        let fields = parse_schema_string(&response.metadata.schema_string)?;
        let columns: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
        debug!(
            table = %locator,
            files = response.files.len(),
            partitions = ?response.metadata.partition_columns,
            "Query returned"
        );

        let fields = Arc::new(fields);
        let mut batches = Vec::new();
        for file in response.files {
            let data = self.download(&file.url).await?;
            let fields = Arc::clone(&fields);
            // Parquet decoding is CPU-bound; keep it off the async workers
            let decoded = tokio::task::spawn_blocking(move || {
                decode_parquet(data)?
                    .iter()
                    .map(|batch| project_batch(batch, &fields, &file.partition_values))
                    .collect::<Result<Vec<_>>>()
            })
            .await
            .map_err(|e| Error::fetch(format!("Decoding task failed: {e}")))??;
            batches.extend(decoded);
        }

        Ok(TableData::new(columns, batches))
    }
}

fn build_http_client(options: &ClientOptions) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| Error::connection(format!("Failed to create HTTP client: {e}")))
}

/// Passes 2xx responses through; otherwise returns a message with status and body
async fn check_status(
    response: Response,
    method: &str,
    path: &str,
) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(format!("{method} {path} returned {status}: {}", body.trim()))
}
