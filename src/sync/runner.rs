use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use super::error::SyncError;
use super::options::OptionMap;
use super::reconcile::{index_masters, Reconciler};
use super::run_log::RunLog;
use super::throttle::Throttle;
use crate::airtable::{RecordStore, UpdatePayload};
use crate::config::{clamp_batch_size, SyncConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Unauthorized,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Write,
    /// Reconcile only; payloads are returned instead of written.
    DryRun,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub source_records: usize,
    pub master_records: usize,
    pub payloads: usize,
    pub skipped: usize,
    pub batches_written: usize,
    pub records_written: usize,
}

/// Outcome of one run, returned to the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub status: SyncStatus,
    pub message: String,
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    pub stats: SyncStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payloads: Option<Vec<UpdatePayload>>,
}

impl SyncReport {
    fn failure(
        status: SyncStatus,
        message: &str,
        err: &SyncError,
        log: RunLog,
        stats: SyncStats,
    ) -> Self {
        Self {
            status,
            message: message.to_string(),
            logs: log.into_lines(),
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
            stats,
            payloads: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }
}

fn secrets_match(given: &str, expected: &str) -> bool {
    if expected.is_empty() || given.len() != expected.len() {
        return false;
    }
    given
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Runs the end-to-end sync: schema → option map, product view + master
/// table → payloads → batched writes.
pub struct SyncRunner {
    store: Arc<dyn RecordStore>,
    config: SyncConfig,
    throttle: Box<dyn Throttle>,
}

impl SyncRunner {
    pub fn new(store: Arc<dyn RecordStore>, config: SyncConfig) -> Self {
        let throttle = config.throttle.build();
        Self {
            store,
            config,
            throttle,
        }
    }

    /// Runner backed by the real Airtable client.
    pub fn from_config(config: SyncConfig) -> anyhow::Result<Self> {
        let client = config.airtable.client()?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn with_throttle(mut self, throttle: Box<dyn Throttle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn authorize(&self, secret: &str) -> Result<(), SyncError> {
        if secrets_match(secret, &self.config.shared_secret) {
            Ok(())
        } else {
            Err(SyncError::Unauthorized)
        }
    }

    pub async fn run(&self, secret: &str) -> SyncReport {
        self.run_with(secret, RunMode::Write).await
    }

    pub async fn preview(&self, secret: &str) -> SyncReport {
        self.run_with(secret, RunMode::DryRun).await
    }

    pub async fn run_with(&self, secret: &str, mode: RunMode) -> SyncReport {
        let mut log = RunLog::new();
        let mut stats = SyncStats::default();

        if let Err(err) = self.authorize(secret) {
            log.error(err.to_string());
            return SyncReport::failure(SyncStatus::Unauthorized, "Unauthorized", &err, log, stats);
        }

        let started = Instant::now();
        log.info(match mode {
            RunMode::Write => "Sync started",
            RunMode::DryRun => "Dry run started",
        });

        match self.execute(mode, &mut log, &mut stats).await {
            Ok(payloads) => {
                let message = match mode {
                    RunMode::Write => format!(
                        "Sync completed: {} records updated in {} batches",
                        stats.records_written, stats.batches_written
                    ),
                    RunMode::DryRun => {
                        format!("Dry run completed: {} payloads prepared", stats.payloads)
                    }
                };
                log.info(format!(
                    "{message} ({} ms)",
                    started.elapsed().as_millis()
                ));
                SyncReport {
                    status: SyncStatus::Success,
                    message,
                    logs: log.into_lines(),
                    error: None,
                    error_kind: None,
                    stats,
                    payloads: (mode == RunMode::DryRun).then_some(payloads),
                }
            }
            Err(err) => {
                log.error(format!("Sync failed: {err}"));
                SyncReport::failure(SyncStatus::Failed, "Sync failed", &err, log, stats)
            }
        }
    }

    /// Fetch the schema and build the option map for the product table.
    pub async fn load_options(&self) -> Result<OptionMap, SyncError> {
        let tables = self
            .store
            .fetch_tables()
            .await
            .map_err(|e| SyncError::SchemaFetch(format!("{e:#}")))?;
        OptionMap::from_schema(&tables, &self.config.spt_table)
    }

    async fn execute(
        &self,
        mode: RunMode,
        log: &mut RunLog,
        stats: &mut SyncStats,
    ) -> Result<Vec<UpdatePayload>, SyncError> {
        let cfg = &self.config;

        log.info(format!("Fetching select options for '{}'", cfg.spt_table));
        let options = self.load_options().await?;
        log.info(format!(
            "Loaded {} choices across {} select fields",
            options.choice_count(),
            options.field_count()
        ));

        let sources = self
            .store
            .list_records(&cfg.spt_table, Some(cfg.batch_view.as_str()))
            .await
            .map_err(|e| SyncError::source_fetch(&cfg.spt_table, &e))?;
        stats.source_records = sources.len();
        log.info(format!(
            "Fetched {} records from view '{}'",
            sources.len(),
            cfg.batch_view
        ));

        let master_rows = self
            .store
            .list_records(&cfg.mtb_table, None)
            .await
            .map_err(|e| SyncError::source_fetch(&cfg.mtb_table, &e))?;
        let (masters, summary) = index_masters(master_rows);
        stats.master_records = masters.len();
        log.info(format!(
            "Indexed {} master records from '{}'",
            masters.len(),
            cfg.mtb_table
        ));
        if summary.unkeyed > 0 {
            log.warn(format!("{} master records have no baseProductId", summary.unkeyed));
        }
        if !summary.duplicate_keys.is_empty() {
            log.warn(format!(
                "{} duplicate baseProductId keys in master table (last row wins): {}",
                summary.duplicate_keys.len(),
                summary.duplicate_keys.join(", ")
            ));
        }

        let reconciler = Reconciler::new(&options, &cfg.reconcile);
        let mut payloads = Vec::with_capacity(sources.len());
        for record in &sources {
            match reconciler.reconcile(record, &masters) {
                Ok(payload) => payloads.push(payload),
                Err(reason) => {
                    stats.skipped += 1;
                    log.warn(format!("Skipping {}: {reason}", record.id));
                }
            }
        }
        stats.payloads = payloads.len();
        log.info(format!(
            "Prepared {} updates ({} skipped)",
            payloads.len(),
            stats.skipped
        ));

        if mode == RunMode::Write {
            self.write_batches(&payloads, log, stats).await?;
        }
        Ok(payloads)
    }

    async fn write_batches(
        &self,
        payloads: &[UpdatePayload],
        log: &mut RunLog,
        stats: &mut SyncStats,
    ) -> Result<(), SyncError> {
        let size = clamp_batch_size(self.config.batch_size);
        let total = payloads.len().div_ceil(size);
        if total > 1 {
            log.info(format!(
                "Writing {} batches of up to {size} ({})",
                total,
                self.throttle.describe()
            ));
        }

        for (i, chunk) in payloads.chunks(size).enumerate() {
            if i == 0 {
                self.throttle.begin();
            } else {
                self.throttle.wait().await;
            }
            self.store
                .update_records(&self.config.spt_table, chunk)
                .await
                .map_err(|e| SyncError::WriteBatch {
                    batch: i + 1,
                    total,
                    written: stats.records_written,
                    message: format!("{e:#}"),
                })?;
            stats.batches_written += 1;
            stats.records_written += chunk.len();
            log.info(format!(
                "Batch {}/{} written ({} records)",
                i + 1,
                total,
                chunk.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airtable::models::{SchemaResponse, TableSchema};
    use crate::airtable::Record;
    use crate::sync::throttle::NoDelay;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const SECRET: &str = "open-sesame";

    #[derive(Default)]
    struct FakeStore {
        tables: Vec<TableSchema>,
        products: Vec<Record>,
        masters: Vec<Record>,
        fail_schema: bool,
        fail_list_for: Option<String>,
        fail_write_at: Option<usize>,
        calls: Mutex<Vec<String>>,
        writes: Mutex<Vec<Vec<String>>>,
    }

    impl FakeStore {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn write_sizes(&self) -> Vec<usize> {
            self.writes.lock().unwrap().iter().map(Vec::len).collect()
        }
    }

    #[async_trait]
    impl RecordStore for FakeStore {
        async fn fetch_tables(&self) -> Result<Vec<TableSchema>> {
            self.calls.lock().unwrap().push("schema".into());
            if self.fail_schema {
                return Err(anyhow!("schema fetch failed: 401"));
            }
            Ok(self.tables.clone())
        }

        async fn list_records(&self, table: &str, view: Option<&str>) -> Result<Vec<Record>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("list:{table}:{}", view.unwrap_or("-")));
            if self.fail_list_for.as_deref() == Some(table) {
                return Err(anyhow!("list records failed: 500"));
            }
            Ok(if table == "Sellable Product Table" {
                self.products.clone()
            } else {
                self.masters.clone()
            })
        }

        async fn update_records(&self, _table: &str, records: &[UpdatePayload]) -> Result<()> {
            let mut writes = self.writes.lock().unwrap();
            if self.fail_write_at == Some(writes.len() + 1) {
                return Err(anyhow!("update records failed: 422"));
            }
            writes.push(records.iter().map(|r| r.id.clone()).collect());
            Ok(())
        }
    }

    fn schema() -> Vec<TableSchema> {
        let body = json!({"tables": [
            {"id": "tblS", "name": "Sellable Product Table", "fields": [
                {"id": "f1", "name": "packageSize", "type": "singleSelect",
                 "options": {"choices": [{"id": "selBag450", "name": "450g Bag"}]}},
                {"id": "f2", "name": "category", "type": "singleSelect",
                 "options": {"choices": [{"id": "selWhole", "name": "Whole Nuts"}]}}
            ]},
            {"id": "tblM", "name": "Prices/purchase/sell", "fields": []}
        ]});
        serde_json::from_value::<SchemaResponse>(body).unwrap().tables
    }

    fn store_with(products: usize) -> FakeStore {
        FakeStore {
            tables: schema(),
            products: (0..products)
                .map(|i| {
                    Record::new(
                        format!("rec{i:02}"),
                        json!({
                            "internalName": format!("Product {i}-z450"),
                            "baseProductId": ["BP-1"]
                        }),
                    )
                })
                .collect(),
            masters: vec![Record::new(
                "recM1",
                json!({"baseProductId": "BP-1", "Verkoop 450g (€/kg)": 12.5}),
            )],
            ..FakeStore::default()
        }
    }

    #[derive(Default)]
    struct Pauses {
        begins: AtomicUsize,
        waits: AtomicUsize,
    }

    struct CountingThrottle(Arc<Pauses>);

    #[async_trait]
    impl Throttle for CountingThrottle {
        fn begin(&self) {
            self.0.begins.fetch_add(1, Ordering::SeqCst);
        }

        async fn wait(&self) {
            self.0.waits.fetch_add(1, Ordering::SeqCst);
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    async fn count_pauses(products: usize) -> (usize, usize) {
        let pauses = Arc::new(Pauses::default());
        let report = SyncRunner::new(
            Arc::new(store_with(products)),
            SyncConfig::new("appX", "patY", SECRET),
        )
        .with_throttle(Box::new(CountingThrottle(pauses.clone())))
        .run(SECRET)
        .await;
        assert!(report.is_success(), "{:?}", report.logs);
        (
            pauses.begins.load(Ordering::SeqCst),
            pauses.waits.load(Ordering::SeqCst),
        )
    }

    fn runner(store: Arc<FakeStore>) -> SyncRunner {
        SyncRunner::new(store, SyncConfig::new("appX", "patY", SECRET))
            .with_throttle(Box::new(NoDelay))
    }

    #[tokio::test]
    async fn rejects_bad_secret_before_any_remote_call() {
        let store = Arc::new(store_with(3));
        let r = runner(store.clone());
        for bad in ["", "open-sesam", "OPEN-SESAME"] {
            let report = r.run(bad).await;
            assert_eq!(report.status, SyncStatus::Unauthorized);
            assert_eq!(report.error_kind.as_deref(), Some("unauthorized"));
        }
        assert!(store.calls().is_empty());
        assert!(store.write_sizes().is_empty());
    }

    #[tokio::test]
    async fn empty_configured_secret_rejects_everything() {
        let store = Arc::new(store_with(1));
        let r = SyncRunner::new(store.clone(), SyncConfig::new("appX", "patY", ""))
            .with_throttle(Box::new(NoDelay));
        assert_eq!(r.run("").await.status, SyncStatus::Unauthorized);
    }

    #[tokio::test]
    async fn writes_23_payloads_in_batches_of_10_10_3() {
        let store = Arc::new(store_with(23));
        let report = runner(store.clone()).run(SECRET).await;

        assert!(report.is_success(), "{:?}", report.logs);
        assert_eq!(store.write_sizes(), vec![10, 10, 3]);
        assert_eq!(report.stats.batches_written, 3);
        assert_eq!(report.stats.records_written, 23);
        assert_eq!(report.stats.payloads, 23);
        assert!(report.payloads.is_none());
        assert_eq!(
            store.calls(),
            vec![
                "schema",
                "list:Sellable Product Table:Batch Update",
                "list:Prices/purchase/sell:-",
            ]
        );
    }

    #[tokio::test]
    async fn throttle_pauses_between_batches_only() {
        assert_eq!(count_pauses(23).await, (1, 2));
        assert_eq!(count_pauses(10).await, (1, 0));
        assert_eq!(count_pauses(1).await, (1, 0));
        assert_eq!(count_pauses(0).await, (0, 0));
    }

    #[tokio::test]
    async fn dry_run_never_touches_the_throttle() {
        let pauses = Arc::new(Pauses::default());
        let report = runner(Arc::new(store_with(23)))
            .with_throttle(Box::new(CountingThrottle(pauses.clone())))
            .preview(SECRET)
            .await;
        assert!(report.is_success());
        assert_eq!(pauses.begins.load(Ordering::SeqCst), 0);
        assert_eq!(pauses.waits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_master_keys_are_logged_as_warning() {
        let mut store = store_with(1);
        store.masters.push(Record::new(
            "recM2",
            json!({"baseProductId": "BP-1", "Verkoop 450g (€/kg)": 14.0}),
        ));
        let report = runner(Arc::new(store)).preview(SECRET).await;

        assert!(report.is_success());
        assert_eq!(report.stats.master_records, 1);
        assert!(report
            .logs
            .iter()
            .any(|l| l.starts_with("WARN: 1 duplicate baseProductId") && l.contains("BP-1")));
        let payloads = report.payloads.unwrap();
        assert_eq!(payloads[0].get("sellingPrice"), Some(&json!(14.0)));
    }

    #[tokio::test]
    async fn smaller_configured_batch_size_is_respected() {
        let store = Arc::new(store_with(7));
        let mut cfg = SyncConfig::new("appX", "patY", SECRET);
        cfg.batch_size = 3;
        let report = SyncRunner::new(store.clone(), cfg)
            .with_throttle(Box::new(NoDelay))
            .run(SECRET)
            .await;
        assert!(report.is_success());
        assert_eq!(store.write_sizes(), vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn master_lookup_miss_skips_record_without_aborting() {
        let mut store = store_with(2);
        store.products.push(Record::new(
            "recLost",
            json!({"internalName": "Lost-z450", "baseProductId": "BP-404"}),
        ));
        let store = Arc::new(store);
        let report = runner(store.clone()).run(SECRET).await;

        assert!(report.is_success());
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.records_written, 2);
        assert_eq!(store.write_sizes(), vec![2]);
        assert!(report
            .logs
            .iter()
            .any(|l| l.contains("recLost") && l.contains("BP-404")));
    }

    #[tokio::test]
    async fn dry_run_returns_payloads_without_writing() {
        let store = Arc::new(store_with(1));
        let report = runner(store.clone()).preview(SECRET).await;

        assert!(report.is_success());
        assert!(store.write_sizes().is_empty());
        let payloads = report.payloads.expect("dry run returns payloads");
        assert_eq!(payloads.len(), 1);
        let p = &payloads[0];
        assert_eq!(p.get("packageSize"), Some(&json!({"id": "selBag450"})));
        assert_eq!(p.get("sellingPrice"), Some(&json!(12.5)));
        assert_eq!(p.get("weightGrams"), Some(&json!(600)));
        assert_eq!(p.get("category"), Some(&json!({"id": "selWhole"})));
    }

    #[tokio::test]
    async fn schema_failure_aborts_without_writes() {
        let store = Arc::new(FakeStore {
            fail_schema: true,
            ..store_with(3)
        });
        let report = runner(store.clone()).run(SECRET).await;

        assert_eq!(report.status, SyncStatus::Failed);
        assert_eq!(report.error_kind.as_deref(), Some("schema_fetch"));
        assert_eq!(store.calls(), vec!["schema"]);
        assert!(store.write_sizes().is_empty());
        assert!(report.logs.last().unwrap().starts_with("ERROR: Sync failed"));
    }

    #[tokio::test]
    async fn missing_product_table_in_schema_is_reported() {
        let mut store = store_with(3);
        store.tables.retain(|t| t.name != "Sellable Product Table");
        let store = Arc::new(store);
        let report = runner(store.clone()).run(SECRET).await;
        assert_eq!(report.error_kind.as_deref(), Some("table_not_found"));
        assert!(report.error.unwrap().contains("Sellable Product Table"));
        assert_eq!(store.calls(), vec!["schema"]);
    }

    #[tokio::test]
    async fn master_fetch_failure_aborts_before_writes() {
        let store = Arc::new(FakeStore {
            fail_list_for: Some("Prices/purchase/sell".into()),
            ..store_with(3)
        });
        let report = runner(store.clone()).run(SECRET).await;
        assert_eq!(report.error_kind.as_deref(), Some("source_fetch"));
        assert!(report.error.unwrap().contains("Prices/purchase/sell"));
        assert!(store.write_sizes().is_empty());
    }

    #[tokio::test]
    async fn failed_batch_stops_remaining_batches_and_keeps_earlier_ones() {
        let store = Arc::new(FakeStore {
            fail_write_at: Some(2),
            ..store_with(25)
        });
        let report = runner(store.clone()).run(SECRET).await;

        assert_eq!(report.status, SyncStatus::Failed);
        assert_eq!(report.error_kind.as_deref(), Some("write_batch"));
        assert_eq!(store.write_sizes(), vec![10]);
        assert_eq!(report.stats.records_written, 10);
        let err = report.error.unwrap();
        assert!(err.contains("batch 2/3"), "{err}");
        assert!(report.logs.iter().any(|l| l == "Batch 1/3 written (10 records)"));
        assert!(report.logs.last().unwrap().contains("422"));
    }

    #[tokio::test]
    async fn load_options_uses_product_table() {
        let store = Arc::new(store_with(0));
        let options = runner(store).load_options().await.unwrap();
        assert_eq!(options.field_count(), 2);
    }

    #[test]
    fn secret_comparison() {
        assert!(secrets_match("abc", "abc"));
        assert!(!secrets_match("abd", "abc"));
        assert!(!secrets_match("ab", "abc"));
        assert!(!secrets_match("", ""));
    }
}
