//! Station configuration
//!
//! Loaded from a JSON file (the successor of the old `barcode.json`) and
//! passed by value into index rebuilds and dispatcher construction. The
//! engine never reads configuration through a global; a changed file is an
//! event the caller reacts to by reloading and handing the new value in.

use serde::{Deserialize, Serialize};
use shared::SortKey;
use std::path::Path;
use tag_printer::LabelLanguage;
use thiserror::Error;

/// Configuration load errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    NotFound(String),

    #[error("Error parsing the configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport the rendered label is delivered over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    /// USB bulk write to a device addressed by vendor/product id
    Usb {
        vendor_id: u16,
        product_id: u16,
        /// Bulk OUT endpoint address, e.g. 0x01
        endpoint: u8,
    },
    /// Raw TCP socket ("wireless mode"), address as `host:port`
    Network { address: String },
    /// OS print spooler, by logical printer name
    Spooler { printer_name: String },
}

/// Full station configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationConfig {
    /// Database connection string for the item store
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Location filter passed to the item query
    #[serde(default = "default_location")]
    pub location: String,

    /// Company name printed on every label
    pub company_name: String,

    /// Field the item index is sorted (and binary-searched) by
    #[serde(default)]
    pub sort_key: SortKey,

    /// Hard cap on rows handed to the display boundary
    #[serde(default = "default_display_cap")]
    pub display_cap: usize,

    /// Keystroke debounce before a search fires, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Mask unit costs in display output
    #[serde(default)]
    pub hide_cost: bool,

    /// Currency prefix for formatted prices
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Label command language (selects the clear sequence and the built-in
    /// template)
    #[serde(default)]
    pub language: LabelLanguage,

    /// Custom label template body; falls back to the language's built-in
    /// template when absent
    #[serde(default)]
    pub template: Option<String>,

    /// Where rendered labels are sent
    pub transport: TransportConfig,
}

fn default_database_url() -> String {
    "sqlite://items.db".to_string()
}

fn default_location() -> String {
    shared::models::item::DEFAULT_LOCATION.to_string()
}

fn default_display_cap() -> usize {
    100
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_currency() -> String {
    "RM".to_string()
}

impl StationConfig {
    /// Load the configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Label template body: the configured one, or the language default
    pub fn template_body(&self) -> &str {
        self.template
            .as_deref()
            .unwrap_or_else(|| self.language.default_template())
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            location: default_location(),
            company_name: String::new(),
            sort_key: SortKey::default(),
            display_cap: default_display_cap(),
            debounce_ms: default_debounce_ms(),
            hide_cost: false,
            currency: default_currency(),
            language: LabelLanguage::default(),
            template: None,
            transport: TransportConfig::Network {
                address: "192.168.1.100:9100".to_string(),
            },
        }
    }
}
