//! Explicit run configuration. Environment lookup happens only in
//! [`SyncConfig::from_env`]; everything downstream takes the struct.

use anyhow::{Context, Result};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::airtable::{AirtableClient, MAX_RECORDS_PER_WRITE};
use crate::sync::reconcile::{ReconcileOptions, UnmatchedSelectPolicy};
use crate::sync::throttle::{FixedDelay, RateLimited, Throttle};
use crate::util::env::{env_flag, env_opt, env_parse, env_parse_opt, env_req, preflight_check};

pub const DEFAULT_SPT_TABLE: &str = "Sellable Product Table";
pub const DEFAULT_MTB_TABLE: &str = "Prices/purchase/sell";
pub const DEFAULT_BATCH_VIEW: &str = "Batch Update";
pub const DEFAULT_BATCH_DELAY_MS: u64 = 250;

const REQUIRED_ENV: [&str; 3] = ["AIRTABLE_API_KEY", "AIRTABLE_BASE_ID", "SYNC_PASSWORD"];
const LOGGED_ENV: [&str; 15] = [
    "AIRTABLE_API_URL",
    "AIRTABLE_TIMEOUT_SECS",
    "AIRTABLE_BASE_ID",
    "AIRTABLE_API_KEY",
    "SPT_TABLE_NAME",
    "MTB_TABLE_NAME",
    "SPT_BATCH_VIEW",
    "SYNC_PASSWORD",
    "SYNC_BATCH_SIZE",
    "SYNC_BATCH_DELAY_MS",
    "SYNC_RATE_PER_SEC",
    "SYNC_UNMATCHED_SELECT",
    "SYNC_TYPECAST",
    "SYNC_IMAGE_PREFIX",
    "SYNC_DEDUP_ALLERGENS",
];

#[derive(Clone)]
pub struct AirtableConfig {
    pub api_url: Option<String>,
    pub base_id: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub typecast: bool,
}

impl AirtableConfig {
    pub fn client(&self) -> Result<AirtableClient> {
        Ok(AirtableClient::new(
            self.api_url.as_deref(),
            self.base_id.clone(),
            self.api_key.clone(),
            Some(self.timeout_secs),
        )?
        .with_typecast(self.typecast))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleConfig {
    Fixed(Duration),
    PerSecond(NonZeroU32),
}

impl ThrottleConfig {
    pub fn build(self) -> Box<dyn Throttle> {
        match self {
            ThrottleConfig::Fixed(d) => Box::new(FixedDelay(d)),
            ThrottleConfig::PerSecond(n) => Box::new(RateLimited::per_second(n)),
        }
    }
}

#[derive(Clone)]
pub struct SyncConfig {
    pub airtable: AirtableConfig,
    pub spt_table: String,
    pub mtb_table: String,
    pub batch_view: String,
    pub shared_secret: String,
    /// Records per PATCH call, 1..=10.
    pub batch_size: usize,
    pub throttle: ThrottleConfig,
    pub reconcile: ReconcileOptions,
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("api_url", &self.airtable.api_url)
            .field("base_id", &self.airtable.base_id)
            .field("spt_table", &self.spt_table)
            .field("mtb_table", &self.mtb_table)
            .field("batch_view", &self.batch_view)
            .field("batch_size", &self.batch_size)
            .field("throttle", &self.throttle)
            .field("reconcile", &self.reconcile)
            .finish_non_exhaustive()
    }
}

impl SyncConfig {
    /// Defaults for everything except credentials.
    pub fn new(
        base_id: impl Into<String>,
        api_key: impl Into<String>,
        shared_secret: impl Into<String>,
    ) -> Self {
        Self {
            airtable: AirtableConfig {
                api_url: None,
                base_id: base_id.into(),
                api_key: api_key.into(),
                timeout_secs: 30,
                typecast: true,
            },
            spt_table: DEFAULT_SPT_TABLE.to_string(),
            mtb_table: DEFAULT_MTB_TABLE.to_string(),
            batch_view: DEFAULT_BATCH_VIEW.to_string(),
            shared_secret: shared_secret.into(),
            batch_size: MAX_RECORDS_PER_WRITE,
            throttle: ThrottleConfig::Fixed(Duration::from_millis(DEFAULT_BATCH_DELAY_MS)),
            reconcile: ReconcileOptions::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        preflight_check("catalog-sync", &REQUIRED_ENV, &LOGGED_ENV)?;

        let mut cfg = Self::new(
            env_req("AIRTABLE_BASE_ID")?,
            env_req("AIRTABLE_API_KEY")?,
            env_req("SYNC_PASSWORD")?,
        );
        cfg.airtable.api_url = env_opt("AIRTABLE_API_URL");
        cfg.airtable.timeout_secs = env_parse("AIRTABLE_TIMEOUT_SECS", 30u64);
        cfg.airtable.typecast = env_flag("SYNC_TYPECAST", true);

        if let Some(v) = env_opt("SPT_TABLE_NAME") {
            cfg.spt_table = v;
        }
        if let Some(v) = env_opt("MTB_TABLE_NAME") {
            cfg.mtb_table = v;
        }
        if let Some(v) = env_opt("SPT_BATCH_VIEW") {
            cfg.batch_view = v;
        }

        cfg.batch_size = clamp_batch_size(env_parse("SYNC_BATCH_SIZE", MAX_RECORDS_PER_WRITE));
        cfg.throttle = match env_parse_opt::<u32>("SYNC_RATE_PER_SEC").and_then(NonZeroU32::new) {
            Some(rate) => ThrottleConfig::PerSecond(rate),
            None => ThrottleConfig::Fixed(Duration::from_millis(env_parse(
                "SYNC_BATCH_DELAY_MS",
                DEFAULT_BATCH_DELAY_MS,
            ))),
        };

        if let Some(v) = env_opt("SYNC_UNMATCHED_SELECT") {
            cfg.reconcile.unmatched_select = v
                .parse::<UnmatchedSelectPolicy>()
                .context("invalid SYNC_UNMATCHED_SELECT")?;
        }
        if let Some(v) = env_opt("SYNC_IMAGE_PREFIX") {
            cfg.reconcile.image_prefix = v;
        }
        cfg.reconcile.dedup_allergens = env_flag("SYNC_DEDUP_ALLERGENS", false);

        Ok(cfg)
    }
}

pub fn clamp_batch_size(requested: usize) -> usize {
    requested.clamp(1, MAX_RECORDS_PER_WRITE)
}
