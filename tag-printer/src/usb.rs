//! USB bulk transport for label printers
//!
//! Addresses the device by vendor/product id (the same identifiers the
//! original generic-driver setups use), claims the printer interface and
//! writes the label payload to a bulk OUT endpoint. The claimed interface
//! is released on every exit path: a leaked claim blocks all later jobs.

use crate::error::{PrintError, PrintResult};
use crate::printer::Printer;
use rusb::{DeviceHandle, GlobalContext};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Interface claimed on the printer device
const PRINTER_INTERFACE: u8 = 0;

/// Minimal surface of an open USB device handle
///
/// Lets the claim/write/release lifecycle be exercised without hardware.
trait RawUsbDevice {
    fn set_active_configuration(&mut self, config: u8) -> rusb::Result<()>;
    fn claim_interface(&mut self, iface: u8) -> rusb::Result<()>;
    fn release_interface(&mut self, iface: u8) -> rusb::Result<()>;
    fn write_bulk(&self, endpoint: u8, data: &[u8], timeout: Duration) -> rusb::Result<usize>;
}

impl RawUsbDevice for DeviceHandle<GlobalContext> {
    fn set_active_configuration(&mut self, config: u8) -> rusb::Result<()> {
        DeviceHandle::set_active_configuration(self, config)
    }

    fn claim_interface(&mut self, iface: u8) -> rusb::Result<()> {
        DeviceHandle::claim_interface(self, iface)
    }

    fn release_interface(&mut self, iface: u8) -> rusb::Result<()> {
        DeviceHandle::release_interface(self, iface)
    }

    fn write_bulk(&self, endpoint: u8, data: &[u8], timeout: Duration) -> rusb::Result<usize> {
        DeviceHandle::write_bulk(self, endpoint, data, timeout)
    }
}

/// Claimed printer interface with unconditional release
///
/// Construction performs configure + claim; a failure at either step hands
/// the handle straight back to its destructor without any write having
/// happened. Drop releases the interface exactly once.
struct ClaimGuard<D: RawUsbDevice> {
    device: D,
    interface: u8,
}

impl<D: RawUsbDevice> ClaimGuard<D> {
    fn claim(mut device: D, interface: u8) -> PrintResult<Self> {
        device
            .set_active_configuration(1)
            .map_err(|e| PrintError::UsbConfig(format!("set_configuration: {}", e)))?;
        device
            .claim_interface(interface)
            .map_err(|e| PrintError::UsbConfig(format!("claim interface {}: {}", interface, e)))?;
        Ok(Self { device, interface })
    }

    fn write(&self, endpoint: u8, data: &[u8], timeout: Duration) -> PrintResult<()> {
        let written = self
            .device
            .write_bulk(endpoint, data, timeout)
            .map_err(|e| PrintError::UsbIo(e.to_string()))?;
        if written != data.len() {
            return Err(PrintError::UsbIo(format!(
                "incomplete write: {} of {} bytes",
                written,
                data.len()
            )));
        }
        Ok(())
    }
}

impl<D: RawUsbDevice> Drop for ClaimGuard<D> {
    fn drop(&mut self) {
        if let Err(e) = self.device.release_interface(self.interface) {
            warn!(error = %e, "Failed to release USB interface");
        }
    }
}

/// USB label printer
#[derive(Debug, Clone, Copy)]
pub struct UsbPrinter {
    vendor_id: u16,
    product_id: u16,
    endpoint: u8,
    write_timeout: Duration,
}

impl UsbPrinter {
    /// Create a printer addressed by vendor/product id writing to a bulk
    /// OUT endpoint (e.g. `0x01`)
    pub fn new(vendor_id: u16, product_id: u16, endpoint: u8) -> Self {
        Self {
            vendor_id,
            product_id,
            endpoint,
            write_timeout: Duration::from_secs(5),
        }
    }

    /// Set the bulk write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    fn send_sync(&self, clear: &[u8], payload: &[u8]) -> PrintResult<()> {
        let mut handle = rusb::open_device_with_vid_pid(self.vendor_id, self.product_id).ok_or(
            PrintError::DeviceNotFound {
                vendor_id: self.vendor_id,
                product_id: self.product_id,
            },
        )?;

        // Linux attaches usblp to printers; detach transparently where the
        // platform supports it.
        if let Err(e) = handle.set_auto_detach_kernel_driver(true)
            && e != rusb::Error::NotSupported
        {
            debug!(error = %e, "auto-detach kernel driver not applied");
        }

        let device = ClaimGuard::claim(handle, PRINTER_INTERFACE)?;
        device.write(self.endpoint, clear, self.write_timeout)?;
        device.write(self.endpoint, payload, self.write_timeout)?;
        Ok(())
    }

    fn is_connected_sync(&self) -> bool {
        let Ok(devices) = rusb::devices() else {
            return false;
        };
        devices.iter().any(|device| {
            device
                .device_descriptor()
                .map(|d| d.vendor_id() == self.vendor_id && d.product_id() == self.product_id)
                .unwrap_or(false)
        })
    }
}

impl Printer for UsbPrinter {
    #[instrument(skip(clear, payload), fields(
        vendor_id = self.vendor_id,
        product_id = self.product_id,
        payload_len = payload.len(),
    ))]
    async fn send_job(&self, clear: &[u8], payload: &[u8]) -> PrintResult<()> {
        // libusb calls are synchronous, run in a blocking task
        let printer = *self;
        let clear = clear.to_vec();
        let payload = payload.to_vec();

        tokio::task::spawn_blocking(move || printer.send_sync(&clear, &payload))
            .await
            .map_err(|e| PrintError::UsbIo(format!("Task join failed: {}", e)))??;

        info!("Label job sent");
        Ok(())
    }

    async fn is_online(&self) -> bool {
        let printer = *self;
        tokio::task::spawn_blocking(move || printer.is_connected_sync())
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct DeviceLog {
        claims: u32,
        releases: u32,
        disposals: u32,
        writes: Vec<Vec<u8>>,
    }

    struct MockDevice {
        log: Rc<RefCell<DeviceLog>>,
        fail_claim: bool,
        fail_write: bool,
    }

    impl MockDevice {
        fn new(log: Rc<RefCell<DeviceLog>>) -> Self {
            Self {
                log,
                fail_claim: false,
                fail_write: false,
            }
        }
    }

    impl RawUsbDevice for MockDevice {
        fn set_active_configuration(&mut self, _config: u8) -> rusb::Result<()> {
            Ok(())
        }

        fn claim_interface(&mut self, _iface: u8) -> rusb::Result<()> {
            if self.fail_claim {
                return Err(rusb::Error::Busy);
            }
            self.log.borrow_mut().claims += 1;
            Ok(())
        }

        fn release_interface(&mut self, _iface: u8) -> rusb::Result<()> {
            self.log.borrow_mut().releases += 1;
            Ok(())
        }

        fn write_bulk(
            &self,
            _endpoint: u8,
            data: &[u8],
            _timeout: Duration,
        ) -> rusb::Result<usize> {
            if self.fail_write {
                return Err(rusb::Error::Pipe);
            }
            self.log.borrow_mut().writes.push(data.to_vec());
            Ok(data.len())
        }
    }

    impl Drop for MockDevice {
        fn drop(&mut self) {
            self.log.borrow_mut().disposals += 1;
        }
    }

    #[test]
    fn test_claim_failure_disposes_handle_without_write() {
        let log = Rc::new(RefCell::new(DeviceLog::default()));
        let mut device = MockDevice::new(Rc::clone(&log));
        device.fail_claim = true;

        let result = ClaimGuard::claim(device, PRINTER_INTERFACE);
        assert!(matches!(result, Err(PrintError::UsbConfig(_))));

        let log = log.borrow();
        assert_eq!(log.disposals, 1, "handle released exactly once");
        assert_eq!(log.releases, 0, "never-claimed interface not released");
        assert!(log.writes.is_empty(), "failed claim must never be written to");
    }

    #[test]
    fn test_write_failure_still_releases_interface() {
        let log = Rc::new(RefCell::new(DeviceLog::default()));
        let mut device = MockDevice::new(Rc::clone(&log));
        device.fail_write = true;

        let guard = ClaimGuard::claim(device, PRINTER_INTERFACE).unwrap();
        let result = guard.write(0x01, b"CLS", Duration::from_secs(1));
        assert!(matches!(result, Err(PrintError::UsbIo(_))));
        drop(guard);

        let log = log.borrow();
        assert_eq!(log.claims, 1);
        assert_eq!(log.releases, 1, "interface released despite write failure");
        assert_eq!(log.disposals, 1);
    }

    #[test]
    fn test_clear_written_before_payload() {
        let log = Rc::new(RefCell::new(DeviceLog::default()));
        let device = MockDevice::new(Rc::clone(&log));

        let guard = ClaimGuard::claim(device, PRINTER_INTERFACE).unwrap();
        guard.write(0x01, b"CLS", Duration::from_secs(1)).unwrap();
        guard
            .write(0x01, b"PRINT 1\nEOP", Duration::from_secs(1))
            .unwrap();
        drop(guard);

        let log = log.borrow();
        assert_eq!(log.writes.len(), 2);
        assert_eq!(log.writes[0], b"CLS");
        assert_eq!(log.writes[1], b"PRINT 1\nEOP");
        assert_eq!(log.releases, 1);
    }
}
