//! Item Record Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Location assigned to items with no price-plan row
pub const DEFAULT_LOCATION: &str = "HQ";

/// One priced item row, immutable for the lifetime of a fetch cycle
///
/// Rows come out of the UOM table, so one item code may appear several
/// times (one row per unit of measure). `barcode` and `location` are
/// guaranteed non-empty after [`RawItemRow::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item_code: String,
    pub description: String,
    pub unit_of_measure: Option<String>,
    pub default_unit_price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub barcode: String,
    pub location: String,
    pub location_price: Option<Decimal>,
}

impl ItemRecord {
    /// Location price formatted for the label, e.g. `"RM 12.50"`
    ///
    /// Falls back to the default unit price, then to zero — the label must
    /// always carry a price line.
    pub fn display_price(&self, currency: &str) -> String {
        let price = self
            .location_price
            .or(self.default_unit_price)
            .unwrap_or_default();
        format!("{} {:.2}", currency, price)
    }

    /// Unit cost formatted for display, masked when costs are hidden
    pub fn display_cost(&self, currency: &str, hide_cost: bool) -> String {
        if hide_cost {
            return "***".to_string();
        }
        format!("{} {:.2}", currency, self.cost.unwrap_or_default())
    }
}

/// Item row as fetched from storage, before load-time normalization
#[derive(Debug, Clone, Default)]
pub struct RawItemRow {
    pub item_code: String,
    pub description: Option<String>,
    pub unit_of_measure: Option<String>,
    pub default_unit_price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub barcode: Option<String>,
    pub location: Option<String>,
    pub location_price: Option<Decimal>,
}

impl RawItemRow {
    /// Apply the load-time fallbacks: empty/NULL barcode becomes the item
    /// code, missing location becomes [`DEFAULT_LOCATION`], missing location
    /// price becomes the default unit price.
    pub fn normalize(self) -> ItemRecord {
        let barcode = match self.barcode {
            Some(b) if !b.is_empty() => b,
            _ => self.item_code.clone(),
        };
        let location = match self.location {
            Some(l) if !l.is_empty() => l,
            _ => DEFAULT_LOCATION.to_string(),
        };
        ItemRecord {
            item_code: self.item_code,
            description: self.description.unwrap_or_default(),
            unit_of_measure: self.unit_of_measure,
            default_unit_price: self.default_unit_price,
            cost: self.cost,
            barcode,
            location,
            location_price: self.location_price.or(self.default_unit_price),
        }
    }
}

/// Field the item index is ordered by
///
/// The sort comparator and every lookup comparator fold through
/// [`SortKey::folded`] so binary search stays consistent with the ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Barcode,
    Description,
}

impl SortKey {
    /// The record field this key orders by
    pub fn value<'a>(&self, item: &'a ItemRecord) -> &'a str {
        match self {
            SortKey::Barcode => &item.barcode,
            SortKey::Description => &item.description,
        }
    }

    /// Case-folded key value used for both sorting and lookup
    pub fn folded(&self, item: &ItemRecord) -> String {
        self.value(item).to_lowercase()
    }
}
