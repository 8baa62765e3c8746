//! Label dispatch
//!
//! Turns selected item records into rendered Label Jobs and sends them over
//! the configured transport, one connect/clear/payload/disconnect session
//! per item. The copy count is embedded in the rendered payload (the
//! template's `{{copies}}` directive), not expressed as repeated sends.
//!
//! A batch is fail-fast: the first transport failure aborts the remaining
//! items. Labels already sent to a physical device cannot be un-sent, so
//! prior successes stand and the report says exactly how far the batch got.

use crate::core::{StationConfig, TransportConfig};
use shared::ItemRecord;
use std::collections::HashMap;
use tag_printer::{LabelLanguage, PrintError, Printer, Rendered, UsbPrinter, render};
use tracing::{error, info, warn};

/// One printable unit derived from one selected item
#[derive(Debug, Clone)]
pub struct LabelJob {
    pub item: ItemRecord,
    pub copies: u32,
}

impl LabelJob {
    pub fn new(item: ItemRecord, copies: u32) -> Self {
        Self {
            item,
            // A label job always prints at least one copy.
            copies: copies.max(1),
        }
    }
}

/// Where and why a batch stopped
#[derive(Debug)]
pub struct BatchFailure {
    /// 1-based position of the failing item in the batch
    pub position: usize,
    pub barcode: String,
    pub reason: PrintError,
}

/// Outcome of one print action
#[derive(Debug)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failure: Option<BatchFailure>,
    /// Unix millis when the batch finished or aborted
    pub finished_at: i64,
}

impl BatchReport {
    /// True only when every selected item was dispatched
    pub fn all_sent(&self) -> bool {
        self.failure.is_none() && self.succeeded == self.total
    }

    /// Human-readable summary for the notification boundary
    pub fn summary(&self) -> String {
        match &self.failure {
            None => format!(
                "All {} selected items have been sent to the printer",
                self.total
            ),
            Some(f) => format!(
                "{} of {} sent, then failed on item {} ({}): {}",
                self.succeeded, self.total, f.position, f.barcode, f.reason
            ),
        }
    }
}

/// Renders and dispatches label batches
///
/// Built from the configuration at print time; a configuration change means
/// building a new dispatcher, never mutating one in place.
#[derive(Debug, Clone)]
pub struct LabelDispatcher {
    company_name: String,
    currency: String,
    language: LabelLanguage,
    template: String,
}

impl LabelDispatcher {
    pub fn from_config(config: &StationConfig) -> Self {
        Self {
            company_name: config.company_name.clone(),
            currency: config.currency.clone(),
            language: config.language,
            template: config.template_body().to_string(),
        }
    }

    /// Placeholder values for one job
    ///
    /// Keys match the template contract: `companyName`, `description`,
    /// `barcode_value`, `unit_price_integer`, `copies`.
    fn placeholder_values(&self, job: &LabelJob) -> HashMap<String, String> {
        HashMap::from([
            ("companyName".to_string(), self.company_name.clone()),
            ("description".to_string(), job.item.description.clone()),
            ("barcode_value".to_string(), job.item.barcode.clone()),
            (
                "unit_price_integer".to_string(),
                job.item.display_price(&self.currency),
            ),
            ("copies".to_string(), job.copies.to_string()),
        ])
    }

    /// Render one job's payload; missing placeholders stay literal and are
    /// logged, never fatal
    pub fn render_job(&self, job: &LabelJob) -> Rendered {
        let rendered = render(&self.template, &self.placeholder_values(job));
        for key in &rendered.missing {
            warn!(
                barcode = %job.item.barcode,
                placeholder = %key,
                "Missing placeholder left literal in label"
            );
        }
        rendered
    }

    /// Send a batch through an already-constructed printer
    pub async fn dispatch_batch<P: Printer>(&self, printer: &P, jobs: &[LabelJob]) -> BatchReport {
        let clear = self.language.clear_sequence().as_bytes();
        let mut succeeded = 0;

        for (i, job) in jobs.iter().enumerate() {
            let rendered = self.render_job(job);
            match printer.send_job(clear, rendered.text.as_bytes()).await {
                Ok(()) => {
                    info!(
                        barcode = %job.item.barcode,
                        copies = job.copies,
                        "Label sent"
                    );
                    succeeded += 1;
                }
                Err(reason) => {
                    error!(
                        barcode = %job.item.barcode,
                        position = i + 1,
                        error = %reason,
                        "Label dispatch failed, aborting batch"
                    );
                    return BatchReport {
                        total: jobs.len(),
                        succeeded,
                        failure: Some(BatchFailure {
                            position: i + 1,
                            barcode: job.item.barcode.clone(),
                            reason,
                        }),
                        finished_at: shared::now_millis(),
                    };
                }
            }
        }

        BatchReport {
            total: jobs.len(),
            succeeded,
            failure: None,
            finished_at: shared::now_millis(),
        }
    }

    /// Send a batch over the configured transport
    pub async fn dispatch(&self, transport: &TransportConfig, jobs: &[LabelJob]) -> BatchReport {
        match transport {
            TransportConfig::Usb {
                vendor_id,
                product_id,
                endpoint,
            } => {
                let printer = UsbPrinter::new(*vendor_id, *product_id, *endpoint);
                self.dispatch_batch(&printer, jobs).await
            }
            TransportConfig::Network { address } => {
                match tag_printer::NetworkPrinter::from_addr(address) {
                    Ok(printer) => self.dispatch_batch(&printer, jobs).await,
                    // Address validation fails the batch before anything is
                    // attempted.
                    Err(reason) => BatchReport {
                        total: jobs.len(),
                        succeeded: 0,
                        failure: Some(BatchFailure {
                            position: 1,
                            barcode: jobs
                                .first()
                                .map(|j| j.item.barcode.clone())
                                .unwrap_or_default(),
                            reason,
                        }),
                        finished_at: shared::now_millis(),
                    },
                }
            }
            #[cfg(windows)]
            TransportConfig::Spooler { printer_name } => {
                let printer = tag_printer::SpoolerPrinter::new(printer_name);
                self.dispatch_batch(&printer, jobs).await
            }
            #[cfg(not(windows))]
            TransportConfig::Spooler { .. } => BatchReport {
                total: jobs.len(),
                succeeded: 0,
                failure: Some(BatchFailure {
                    position: 1,
                    barcode: jobs
                        .first()
                        .map(|j| j.item.barcode.clone())
                        .unwrap_or_default(),
                    reason: PrintError::Unsupported("spooler"),
                }),
                finished_at: shared::now_millis(),
            },
        }
    }
}
