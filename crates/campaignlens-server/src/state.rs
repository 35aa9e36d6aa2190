use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use campaignlens_core::config::Config;
use campaignlens_core::generator::{generate_seeded, GeneratorConfig};
use campaignlens_core::record::MetricRecord;
use campaignlens_core::source::{DataSource, LiveFeed, RecordStore};
use campaignlens_duckdb::DuckDbBackend;

use crate::live_feed::HttpLiveFeed;
use crate::loader::{load_dataset, Dataset};

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Kept concretely for `/health`; reads and writes go through `store`.
    pub db: Arc<DuckDbBackend>,

    pub store: Arc<dyn RecordStore>,

    /// `None` when no live feed URL is configured.
    pub live_feed: Option<Arc<dyn LiveFeed>>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// Loaded datasets per source, valid for `config.cache_ttl()`.
    ///
    /// Cleared whenever the store is rewritten (seed, import).
    dataset_cache: Arc<RwLock<HashMap<DataSource, Dataset>>>,

    /// Serialises cache misses so concurrent requests do not all hit the
    /// live API at once. Store rewrites hold it too, so a load that began
    /// before a rewrite cannot cache its rows after the invalidation.
    load_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Construct a new `AppState` wrapping the given backend and config.
    ///
    /// The live feed client is built from `config.live_feed`; a bad URL is
    /// logged and leaves the live source unavailable.
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let live_feed = config
            .live_feed
            .clone()
            .and_then(|cfg| match HttpLiveFeed::new(cfg) {
                Ok(feed) => Some(Arc::new(feed) as Arc<dyn LiveFeed>),
                Err(e) => {
                    warn!(error = %e, "Live feed disabled");
                    None
                }
            });
        let db = Arc::new(db);
        Self {
            store: db.clone(),
            db,
            live_feed,
            config: Arc::new(config),
            dataset_cache: Arc::new(RwLock::new(HashMap::new())),
            load_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Replace the live feed, e.g. with a stub in tests.
    pub fn with_live_feed(mut self, feed: Arc<dyn LiveFeed>) -> Self {
        self.live_feed = Some(feed);
        self
    }

    /// Read and write records through `store` instead of the DuckDB backend.
    /// `/health` still pings the backend.
    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = store;
        self
    }

    /// Rows for `source`, from cache when fresh.
    pub async fn dataset(&self, source: DataSource) -> Dataset {
        if let Some(hit) = self.cached(source).await {
            return hit;
        }

        let _guard = self.load_lock.lock().await;
        if let Some(hit) = self.cached(source).await {
            return hit;
        }

        let dataset = load_dataset(self.store.as_ref(), self.live_feed.as_deref(), source).await;
        self.dataset_cache
            .write()
            .await
            .insert(source, dataset.clone());
        dataset
    }

    async fn cached(&self, source: DataSource) -> Option<Dataset> {
        let ttl = chrono::Duration::from_std(self.config.cache_ttl()).ok()?;
        let cache = self.dataset_cache.read().await;
        cache
            .get(&source)
            .filter(|d| Utc::now() - d.loaded_at < ttl)
            .cloned()
    }

    pub async fn invalidate_datasets(&self) {
        self.dataset_cache.write().await.clear();
    }

    /// Overwrite the store with `days` of synthetic rows ending yesterday.
    pub async fn reseed(&self, days: u32, seed: u64) -> anyhow::Result<usize> {
        let today = Utc::now().date_naive();
        let records = generate_seeded(&GeneratorConfig::ending(today, days), seed);
        let _guard = self.load_lock.lock().await;
        self.store.replace_records(&records).await?;
        self.invalidate_datasets().await;
        info!(rows = records.len(), days, "Store reseeded with synthetic data");
        Ok(records.len())
    }

    /// Populate an empty store on startup when `seed_on_empty` is set.
    pub async fn seed_if_empty(&self) -> anyhow::Result<()> {
        if !self.config.seed_on_empty || self.store.count_records().await? > 0 {
            return Ok(());
        }
        self.reseed(self.config.seed_days, rand::random()).await?;
        Ok(())
    }

    /// Write imported rows, replacing or appending.
    pub async fn store_imported(
        &self,
        records: &[MetricRecord],
        replace: bool,
    ) -> anyhow::Result<()> {
        let _guard = self.load_lock.lock().await;
        if replace {
            self.store.replace_records(records).await?;
        } else {
            self.store.append_records(records).await?;
        }
        self.invalidate_datasets().await;
        Ok(())
    }
}
