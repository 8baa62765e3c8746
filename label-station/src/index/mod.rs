//! Item index
//!
//! Holds the full fetched item set in sort order behind an atomically
//! replaceable snapshot. Readers take the current snapshot (an `Arc` clone
//! under a short read lock) and run their lookup outside the lock, so a
//! rebuild never blocks a search and a search never observes a partially
//! sorted sequence.

use shared::{ItemRecord, SearchField, SortKey};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// One published generation of the index
///
/// `items` is sorted ascending by the lower-cased `sort_key` field; the sort
/// is stable, so records sharing a key keep their fetch order.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    items: Vec<ItemRecord>,
    sort_key: SortKey,
}

impl IndexSnapshot {
    /// Build a snapshot by sorting `records` on the case-folded key
    pub fn build(mut records: Vec<ItemRecord>, sort_key: SortKey) -> Self {
        records.sort_by_cached_key(|item| sort_key.folded(item));
        Self {
            items: records,
            sort_key,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    /// All records whose sort-key field case-insensitively equals `target`
    ///
    /// Lower-bound/upper-bound pair of binary searches: duplicate keys (one
    /// item code with several UOM rows, say) come back as the whole
    /// contiguous run, in index order.
    pub fn exact_lookup(&self, target: &str) -> Vec<ItemRecord> {
        let target = target.trim().to_lowercase();
        if target.is_empty() {
            return Vec::new();
        }

        let key = self.sort_key;
        let lower = self
            .items
            .partition_point(|item| key.folded(item).as_str() < target.as_str());
        let upper = self
            .items
            .partition_point(|item| key.folded(item).as_str() <= target.as_str());

        self.items[lower..upper].to_vec()
    }

    /// Records containing every whitespace-split keyword of `query` as a
    /// case-insensitive substring of the selected field
    ///
    /// Linear scan - this cannot use the sort order. Result preserves index
    /// order. An empty query matches everything.
    pub fn substring_filter(&self, query: &str, field: SearchField) -> Vec<ItemRecord> {
        let keywords: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();

        self.items
            .iter()
            .filter(|item| {
                keywords.iter().all(|keyword| match field {
                    SearchField::Description => {
                        item.description.to_lowercase().contains(keyword)
                    }
                    SearchField::CodeOrDescription => {
                        item.item_code.to_lowercase().contains(keyword)
                            || item.description.to_lowercase().contains(keyword)
                    }
                })
            })
            .cloned()
            .collect()
    }

    /// First `limit` records in sort order (empty-query display path)
    pub fn prefix_view(&self, limit: usize) -> Vec<ItemRecord> {
        self.items.iter().take(limit).cloned().collect()
    }
}

/// Shared, atomically replaceable item index
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    inner: Arc<RwLock<Arc<IndexSnapshot>>>,
}

impl ItemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire index with `records` sorted by `sort_key`
    ///
    /// The new snapshot is built off-lock and published with one pointer
    /// swap; concurrent readers see either the old or the new generation.
    pub async fn rebuild(&self, records: Vec<ItemRecord>, sort_key: SortKey) {
        let snapshot = Arc::new(IndexSnapshot::build(records, sort_key));
        let count = snapshot.len();
        *self.inner.write().await = snapshot;
        info!(count, ?sort_key, "Item index rebuilt");
    }

    /// Current published snapshot
    pub async fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&*self.inner.read().await)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// See [`IndexSnapshot::exact_lookup`]
    pub async fn exact_lookup(&self, target: &str) -> Vec<ItemRecord> {
        self.snapshot().await.exact_lookup(target)
    }

    /// See [`IndexSnapshot::substring_filter`]
    pub async fn substring_filter(&self, query: &str, field: SearchField) -> Vec<ItemRecord> {
        self.snapshot().await.substring_filter(query, field)
    }

    /// See [`IndexSnapshot::prefix_view`]
    pub async fn prefix_view(&self, limit: usize) -> Vec<ItemRecord> {
        self.snapshot().await.prefix_view(limit)
    }
}
