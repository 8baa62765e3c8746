//! # tag-printer
//!
//! Barcode label printer library - low-level label delivery only.
//!
//! ## Scope
//!
//! This crate handles HOW a rendered label reaches a printer:
//! - `{{key}}` template placeholder substitution
//! - Label command language selection (TPSL / ZPL clear sequences)
//! - USB bulk transport (libusb, vendor/product id addressing)
//! - Network transport (raw TCP with reachability probes)
//! - OS spooler transport (Windows raw print jobs, optional)
//!
//! Business logic (WHAT to print: item lookup, batch iteration, placeholder
//! values) stays in application code - see the `label-station` crate.
//!
//! ## Example
//!
//! ```ignore
//! use std::collections::HashMap;
//! use tag_printer::{LabelLanguage, NetworkPrinter, Printer, render};
//!
//! let values = HashMap::from([
//!     ("barcode_value".to_string(), "955001".to_string()),
//!     ("copies".to_string(), "2".to_string()),
//! ]);
//! let label = render(LabelLanguage::Tpsl.default_template(), &values);
//!
//! let printer = NetworkPrinter::from_addr("192.168.1.100:9100")?;
//! printer
//!     .send_job(
//!         LabelLanguage::Tpsl.clear_sequence().as_bytes(),
//!         label.text.as_bytes(),
//!     )
//!     .await?;
//! ```

mod error;
mod language;
mod printer;
mod template;
mod usb;

// Re-exports
pub use error::{PrintError, PrintResult};
pub use language::LabelLanguage;
pub use printer::{NetworkPrinter, Printer};
pub use template::{Rendered, render};
pub use usb::UsbPrinter;

#[cfg(windows)]
pub use printer::SpoolerPrinter;
