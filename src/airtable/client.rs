use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;

use super::models::{
    ListRecordsResponse, PatchRequest, Record, SchemaResponse, TableSchema, UpdatePayload,
};
use super::store::{RecordStore, MAX_RECORDS_PER_WRITE};

pub const DEFAULT_API_URL: &str = "https://api.airtable.com";
const PAGE_SIZE: &str = "100";

fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

/// Airtable REST client scoped to a single base.
///
/// Endpoints used:
/// - GET /v0/meta/bases/{base}/tables - table and field schema
/// - GET /v0/{base}/{table} - paged record listing (`view`, `offset`)
/// - PATCH /v0/{base}/{table} - update up to 10 records
#[derive(Debug, Clone)]
pub struct AirtableClient {
    api_url: String,
    base_id: String,
    api_key: String,
    typecast: bool,
    http: Client,
}

impl AirtableClient {
    pub fn new(
        api_url: Option<&str>,
        base_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let api_url = api_url
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        let http = Client::builder()
            .user_agent(concat!("catalog-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(30)))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_url,
            base_id: base_id.into(),
            api_key: api_key.into(),
            typecast: true,
            http,
        })
    }

    /// Whether PATCH requests ask Airtable to coerce values (and create
    /// missing multi-select options).
    pub fn with_typecast(mut self, typecast: bool) -> Self {
        self.typecast = typecast;
        self
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/v0/{}/{}",
            self.api_url,
            self.base_id,
            urlencoding::encode(table)
        )
    }

    async fn error_body(resp: reqwest::Response) -> String {
        truncate_for_log(resp.text().await.unwrap_or_default(), 2000)
    }

    pub async fn fetch_tables(&self) -> Result<Vec<TableSchema>> {
        let url = format!("{}/v0/meta/bases/{}/tables", self.api_url, self.base_id);
        let resp = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .with_context(|| format!("schema request failed url={url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = Self::error_body(resp).await;
            return Err(anyhow!("schema fetch failed: {status} url={url} body={body}"));
        }
        let parsed: SchemaResponse = resp.json().await.context("invalid schema response")?;
        debug!(tables = parsed.tables.len(), "fetched base schema");
        Ok(parsed.tables)
    }

    pub async fn list_records(&self, table: &str, view: Option<&str>) -> Result<Vec<Record>> {
        let url = self.table_url(table);
        let mut out = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = vec![("pageSize", PAGE_SIZE)];
            if let Some(v) = view {
                query.push(("view", v));
            }
            if let Some(o) = offset.as_deref() {
                query.push(("offset", o));
            }

            let resp = self
                .authorized(self.http.get(&url))
                .query(&query)
                .send()
                .await
                .with_context(|| format!("list request failed table={table}"))?;
            let status = resp.status();
            if !status.is_success() {
                let body = Self::error_body(resp).await;
                return Err(anyhow!(
                    "list records failed: {status} table={table} body={body}"
                ));
            }

            let page: ListRecordsResponse =
                resp.json().await.context("invalid list response")?;
            debug!(table, page_records = page.records.len(), "fetched page");
            out.extend(page.records);

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        Ok(out)
    }

    pub async fn update_records(&self, table: &str, records: &[UpdatePayload]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        if records.len() > MAX_RECORDS_PER_WRITE {
            bail!(
                "refusing to write {} records in one call (max {MAX_RECORDS_PER_WRITE})",
                records.len()
            );
        }

        let url = self.table_url(table);
        let body = PatchRequest {
            records,
            typecast: self.typecast,
        };
        let resp = self
            .authorized(self.http.patch(&url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("update request failed table={table}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = Self::error_body(resp).await;
            return Err(anyhow!(
                "update records failed: {status} table={table} body={body}"
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for AirtableClient {
    async fn fetch_tables(&self) -> Result<Vec<TableSchema>> {
        AirtableClient::fetch_tables(self).await
    }

    async fn list_records(&self, table: &str, view: Option<&str>) -> Result<Vec<Record>> {
        AirtableClient::list_records(self, table, view).await
    }

    async fn update_records(&self, table: &str, records: &[UpdatePayload]) -> Result<()> {
        AirtableClient::update_records(self, table, records).await
    }
}
