//! Station service
//!
//! Ties storage, the item index and the dispatcher together. The service is
//! the only writer of the index: fetch + rebuild runs serialized (exactly
//! one in flight), and a configuration change is handled as an event by
//! swapping the stored config and rebuilding from scratch.

use crate::core::StationConfig;
use crate::dispatch::{BatchReport, LabelDispatcher, LabelJob};
use crate::index::ItemIndex;
use crate::storage::{ItemStore, StoreResult};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};

/// Application engine shared between the UI boundary and workers
pub struct StationService {
    store: Arc<dyn ItemStore>,
    index: ItemIndex,
    config: RwLock<StationConfig>,
    /// Serializes fetch + rebuild cycles
    reload_lock: Mutex<()>,
}

impl StationService {
    pub fn new(store: Arc<dyn ItemStore>, config: StationConfig) -> Self {
        Self {
            store,
            index: ItemIndex::new(),
            config: RwLock::new(config),
            reload_lock: Mutex::new(()),
        }
    }

    /// The shared item index (clone is cheap, it is a handle)
    pub fn index(&self) -> ItemIndex {
        self.index.clone()
    }

    /// Current configuration value
    pub async fn config(&self) -> StationConfig {
        self.config.read().await.clone()
    }

    /// Fetch the item set and rebuild the index wholesale
    ///
    /// Concurrent callers queue up; readers keep serving the old snapshot
    /// until the new one publishes.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> StoreResult<usize> {
        let _guard = self.reload_lock.lock().await;
        let (location, sort_key) = {
            let config = self.config.read().await;
            (config.location.clone(), config.sort_key)
        };

        let records = self.store.fetch_items(&location).await?;
        let count = records.len();
        self.index.rebuild(records, sort_key).await;

        info!(count, %location, "Reload complete");
        Ok(count)
    }

    /// React to a configuration change: swap the value, then refetch and
    /// rebuild so sort order, location filter and transport all take effect
    pub async fn apply_config(&self, new_config: StationConfig) -> StoreResult<usize> {
        {
            let mut config = self.config.write().await;
            *config = new_config;
        }
        info!("Configuration changed, rebuilding index");
        self.reload().await
    }

    /// Render and dispatch one label job per selected item over the
    /// configured transport
    pub async fn print_selection(&self, jobs: Vec<LabelJob>) -> BatchReport {
        let config = self.config().await;
        let dispatcher = LabelDispatcher::from_config(&config);
        let report = dispatcher.dispatch(&config.transport, &jobs).await;
        info!(summary = %report.summary(), "Print batch finished");
        report
    }
}
