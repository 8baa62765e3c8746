//! Printer adapters for delivering rendered label payloads
//!
//! Supports:
//! - Network printers (raw TCP, "wireless mode")
//! - Windows spooler printers (via Win32 raw print jobs)
//!
//! USB bulk transport lives in [`crate::usb`].

use crate::error::{PrintError, PrintResult};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Trait for printer adapters
///
/// One call to [`Printer::send_job`] is one label job:
/// connect, send the clear sequence, send the payload, disconnect.
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Deliver one label job (clear sequence followed by payload)
    async fn send_job(&self, clear: &[u8], payload: &[u8]) -> PrintResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// Network label printer (raw TCP)
///
/// Most thermal label printers accept raw command payloads on port 9100.
/// Before the send connection is opened the target is probed twice: an ICMP
/// echo (host reachable at all?) and a TCP connect probe (port open?), so
/// the two failure modes surface as distinct diagnoses.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    connect_timeout: Duration,
    ping_deadline: Duration,
}

impl NetworkPrinter {
    /// Create a new network printer
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        Self::from_addr(&format!("{}:{}", host, port))
    }

    /// Create from a socket address string (e.g. `"192.168.1.100:9100"`)
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidAddress(addr.to_string()))?;

        Ok(Self {
            addr,
            connect_timeout: Duration::from_secs(3),
            ping_deadline: Duration::from_secs(1),
        })
    }

    /// Set the TCP connect/probe timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// ICMP reachability probe
    ///
    /// A probe that cannot be set up (no raw-socket privilege) is skipped
    /// with a warning - it is inconclusive, not a failure.
    async fn probe_host(&self) -> PrintResult<()> {
        const PING_PAYLOAD: [u8; 8] = [0; 8];

        let ip = self.addr.ip();
        match tokio::time::timeout(self.ping_deadline, surge_ping::ping(ip, &PING_PAYLOAD)).await {
            Ok(Ok((_reply, rtt))) => {
                debug!(%ip, ?rtt, "Ping reply received");
                Ok(())
            }
            Ok(Err(surge_ping::SurgeError::IOError(e)))
                if e.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                warn!(%ip, "ICMP socket unavailable, skipping reachability probe");
                Ok(())
            }
            Ok(Err(e)) => Err(PrintError::HostUnreachable(format!("{}: {}", ip, e))),
            Err(_) => Err(PrintError::HostUnreachable(format!(
                "no echo reply from {}",
                ip
            ))),
        }
    }

    /// TCP connect probe against the printer port
    async fn probe_port(&self) -> PrintResult<()> {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(_probe)) => Ok(()),
            Ok(Err(_)) | Err(_) => Err(PrintError::PortClosed {
                host: self.addr.ip().to_string(),
                port: self.addr.port(),
            }),
        }
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(clear, payload), fields(addr = %self.addr, payload_len = payload.len()))]
    async fn send_job(&self, clear: &[u8], payload: &[u8]) -> PrintResult<()> {
        self.probe_host().await?;
        self.probe_port().await?;

        info!("Connecting to printer");
        let mut stream =
            tokio::time::timeout(self.connect_timeout, TcpStream::connect(self.addr))
                .await
                .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
                .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr, e)))?;

        stream.write_all(clear).await?;
        stream.write_all(payload).await?;
        stream.flush().await?;
        stream.shutdown().await?;

        info!(bytes = clear.len() + payload.len(), "Label job sent");
        Ok(())
    }

    #[instrument(fields(addr = %self.addr))]
    async fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);

        match tokio::time::timeout(check_timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(_)) => {
                debug!("Printer online");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

/// Windows spooler printer
///
/// Opens a named logical printer and writes the label payload as a RAW
/// document. The printer handle is closed on every exit path.
#[cfg(windows)]
pub struct SpoolerPrinter {
    name: String,
}

#[cfg(windows)]
impl SpoolerPrinter {
    /// Create a spooler printer targeting a named logical printer
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Get the printer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Query the spooler for the printer's offline status
    pub fn check_online(name: &str) -> PrintResult<bool> {
        use windows::Win32::Graphics::Printing::{
            ClosePrinter, GetPrinterW, OpenPrinterW, PRINTER_HANDLE, PRINTER_INFO_6,
            PRINTER_STATUS_OFFLINE,
        };
        use windows::core::PCWSTR;

        let name_w = to_wide(name);

        unsafe {
            let mut handle: PRINTER_HANDLE = PRINTER_HANDLE::default();
            OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None)
                .map_err(|_| PrintError::Offline(name.to_string()))?;

            let mut needed: u32 = 0;
            let _ = GetPrinterW(handle, 6, None, &mut needed);

            let mut online = true;
            if needed > 0 {
                let mut buf: Vec<u8> = vec![0; needed as usize];
                if GetPrinterW(handle, 6, Some(buf.as_mut_slice()), &mut needed).is_ok() {
                    let info = *(buf.as_ptr() as *const PRINTER_INFO_6);
                    online = (info.dwStatus & PRINTER_STATUS_OFFLINE) == 0;
                }
            }

            let _ = ClosePrinter(handle);
            Ok(online)
        }
    }

    /// Send the clear sequence and payload as one RAW spool document
    fn send_sync(&self, clear: &[u8], payload: &[u8]) -> PrintResult<()> {
        use core::ffi::c_void;
        use windows::Win32::Graphics::Printing::{
            ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, OpenPrinterW,
            PRINTER_HANDLE, StartDocPrinterW, StartPagePrinter, WritePrinter,
        };
        use windows::core::{PCWSTR, PWSTR};

        if !Self::check_online(&self.name).unwrap_or(true) {
            return Err(PrintError::Offline(self.name.clone()));
        }

        let name_w = to_wide(&self.name);
        let doc_name_w = to_wide("Label Job");
        let datatype_w = to_wide("RAW");

        unsafe {
            let mut handle: PRINTER_HANDLE = PRINTER_HANDLE::default();
            OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None)
                .map_err(|_| PrintError::SpoolFailed("OpenPrinterW failed".to_string()))?;

            let doc_info = DOC_INFO_1W {
                pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
                pOutputFile: PWSTR::null(),
                pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
            };

            if StartDocPrinterW(handle, 1, &doc_info as *const DOC_INFO_1W) == 0 {
                let _ = ClosePrinter(handle);
                return Err(PrintError::SpoolFailed("StartDocPrinter failed".to_string()));
            }

            if !StartPagePrinter(handle).as_bool() {
                let _ = EndDocPrinter(handle);
                let _ = ClosePrinter(handle);
                return Err(PrintError::SpoolFailed(
                    "StartPagePrinter failed".to_string(),
                ));
            }

            let mut result = Ok(());
            for chunk in [clear, payload] {
                let mut written: u32 = 0;
                let ok = WritePrinter(
                    handle,
                    chunk.as_ptr() as *const c_void,
                    chunk.len() as u32,
                    &mut written,
                );
                if !ok.as_bool() || written != chunk.len() as u32 {
                    result = Err(PrintError::SpoolFailed("WritePrinter failed".to_string()));
                    break;
                }
            }

            let _ = EndPagePrinter(handle);
            let _ = EndDocPrinter(handle);
            let _ = ClosePrinter(handle);

            result
        }
    }
}

#[cfg(windows)]
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(windows)]
impl Printer for SpoolerPrinter {
    async fn send_job(&self, clear: &[u8], payload: &[u8]) -> PrintResult<()> {
        // Spooler calls are synchronous, run in a blocking task
        let printer = SpoolerPrinter {
            name: self.name.clone(),
        };
        let clear = clear.to_vec();
        let payload = payload.to_vec();

        tokio::task::spawn_blocking(move || printer.send_sync(&clear, &payload))
            .await
            .map_err(|e| PrintError::SpoolFailed(format!("Task join failed: {}", e)))?
    }

    async fn is_online(&self) -> bool {
        Self::check_online(&self.name).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_printer_new() {
        let printer = NetworkPrinter::new("192.168.1.100", 9100).unwrap();
        assert_eq!(printer.addr().port(), 9100);
    }

    #[test]
    fn test_network_printer_from_addr() {
        let printer = NetworkPrinter::from_addr("192.168.1.100:9100").unwrap();
        assert_eq!(printer.addr().port(), 9100);
    }

    #[test]
    fn test_invalid_addr() {
        let result = NetworkPrinter::from_addr("not-an-address");
        assert!(matches!(result, Err(PrintError::InvalidAddress(_))));
    }

    #[test]
    fn test_missing_port_is_invalid() {
        let result = NetworkPrinter::from_addr("192.168.1.100");
        assert!(matches!(result, Err(PrintError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_port_probe_classifies_closed_port() {
        // Bind then drop to get a port with (almost certainly) no listener.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let printer = NetworkPrinter::new("127.0.0.1", port).unwrap();
        let result = printer.probe_port().await;
        assert!(matches!(result, Err(PrintError::PortClosed { .. })));
    }

    #[tokio::test]
    async fn test_port_probe_passes_on_listening_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let printer = NetworkPrinter::new("127.0.0.1", port).unwrap();
        assert!(printer.probe_port().await.is_ok());
        assert!(printer.is_online().await);
    }
}
