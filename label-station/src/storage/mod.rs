//! Item storage
//!
//! The engine reads items through the narrow [`ItemStore`] trait; the
//! bundled implementation runs the priced-item query against SQLite. Rows
//! come out of the UOM table joined to the item master and the per-location
//! price plan, with the barcode/location/price fallbacks applied in SQL and
//! re-applied by [`shared::RawItemRow::normalize`] on the way in.

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{ItemRecord, RawItemRow};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use thiserror::Error;
use tracing::{info, instrument};

/// Storage error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Query interface the engine fetches items through
///
/// Invoked only from background tasks; a fetch can take network + query
/// latency and must never run on the interactive path.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Fetch every priced item row for `location`
    async fn fetch_items(&self, location: &str) -> StoreResult<Vec<ItemRecord>>;
}

/// Priced item row as selected from the database
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    item_code: String,
    description: Option<String>,
    uom: Option<String>,
    default_unit_price: Option<f64>,
    cost: Option<f64>,
    barcode: Option<String>,
    location: Option<String>,
    location_price: Option<f64>,
}

impl ItemRow {
    fn into_record(self) -> ItemRecord {
        RawItemRow {
            item_code: self.item_code,
            description: self.description,
            unit_of_measure: self.uom,
            default_unit_price: self.default_unit_price.and_then(Decimal::from_f64_retain),
            cost: self.cost.and_then(Decimal::from_f64_retain),
            barcode: self.barcode,
            location: self.location,
            location_price: self.location_price.and_then(Decimal::from_f64_retain),
        }
        .normalize()
    }
}

const FETCH_ITEMS_SQL: &str = r#"
SELECT
    u.item_code,
    i.description,
    u.uom,
    u.price AS default_unit_price,
    u.cost,
    COALESCE(NULLIF(u.barcode, ''), u.item_code) AS barcode,
    COALESCE(p.location, 'HQ') AS location,
    COALESCE(p.price, u.price) AS location_price
FROM item_uom u
LEFT JOIN item i ON i.item_code = u.item_code
LEFT JOIN pos_price_plan p ON p.item_code = u.item_code AND p.location = ?
ORDER BY u.item_code, u.uom
"#;

/// SQLite-backed item store
#[derive(Clone)]
pub struct SqliteItemStore {
    pool: SqlitePool,
}

impl SqliteItemStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the database named in the configuration
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    #[instrument(skip(self))]
    async fn fetch_items(&self, location: &str) -> StoreResult<Vec<ItemRecord>> {
        let rows: Vec<ItemRow> = sqlx::query_as(FETCH_ITEMS_SQL)
            .bind(location)
            .fetch_all(&self.pool)
            .await?;

        let items: Vec<ItemRecord> = rows.into_iter().map(ItemRow::into_record).collect();
        info!(count = items.len(), location, "Fetched items");
        Ok(items)
    }
}
