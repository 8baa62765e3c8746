//! Error types for the printer library

use thiserror::Error;

/// Printer error types, classified per transport
///
/// Every variant carries enough context for a user-facing message; the
/// dispatcher reports these verbatim instead of a generic failure.
#[derive(Debug, Error)]
pub enum PrintError {
    /// No USB device matched the configured vendor/product id
    #[error("Printer not found (vendor {vendor_id:#06x}, product {product_id:#06x})")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// USB device found but could not be configured or claimed
    #[error("USB printer configuration failed: {0}")]
    UsbConfig(String),

    /// Bulk write to the USB endpoint failed
    #[error("USB write failed: {0}")]
    UsbIo(String),

    /// Configured network address did not parse as host:port
    #[error("Invalid printer address: {0}")]
    InvalidAddress(String),

    /// Reachability probe got no echo reply from the host
    #[error("Host unreachable: {0}")]
    HostUnreachable(String),

    /// Host answered the ping but the printer port is not accepting
    #[error("Port {port} on {host} is not open")]
    PortClosed { host: String, port: u16 },

    /// Network connection error after the probes passed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Spooler printer reports offline or unavailable
    #[error("Printer offline: {0}")]
    Offline(String),

    /// Spool job could not be started or written
    #[error("Spool job failed: {0}")]
    SpoolFailed(String),

    /// Timeout waiting for the printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport not available on this platform
    #[error("{0} printing is not supported on this platform")]
    Unsupported(&'static str),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
