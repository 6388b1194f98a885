//! Block device discovery
//!
//! Walks every firmware handle implementing the block-I/O capability and
//! collects the boot candidates into the session's device list. Only
//! logical-partition handles with media present qualify; optical boot-image
//! views are skipped (optical boot is a documented limitation of this
//! stage).

use crate::firmware::DeviceEnumerator;
use crate::log_info;

use super::error::DeviceError;
use super::{DeviceList, Drive};

/// What one discovery pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Drives appended to the device list by this pass.
    pub drives_added: usize,
    /// At least one drive's identifier has not been disambiguated yet.
    /// Non-fatal; the identity resolver runs as a later whole-list pass.
    pub identifier_missing: bool,
}

/// Owns the per-boot-session discovery state: the "already populated" guard
/// and the running drive-id counter.
pub struct DiscoverySession {
    populated: bool,
    next_drive_id: u8,
}

impl DiscoverySession {
    pub const fn new() -> Self {
        Self {
            populated: false,
            next_drive_id: 1,
        }
    }

    /// Enumerate all block-capable firmware handles and append every boot
    /// candidate to `devices`.
    ///
    /// Idempotent within a session: a second invocation reports success
    /// without re-enumerating. Fails with [`DeviceError::NotFound`] when the
    /// firmware exposes no block-I/O handles at all - fatal for the boot
    /// stage, but the policy decision belongs to the caller.
    pub fn add_block_devices<E: DeviceEnumerator>(
        &mut self,
        enumerator: &mut E,
        devices: &mut DeviceList<E::Io>,
    ) -> Result<DiscoveryReport, DeviceError> {
        if self.populated {
            return Ok(DiscoveryReport::default());
        }

        let handle_count = enumerator.handle_count()?;
        log_info!("enumerating block I/O handles");

        let mut report = DiscoveryReport::default();

        for index in 0..handle_count {
            let info = match enumerator.describe(index) {
                Some(info) => info,
                None => continue,
            };

            // A logical partition of optical-media subtype is a view of an
            // El Torito boot image, not the disk itself.
            if info.optical_boot_image {
                log_info!("skipping optical boot-image handle");
                continue;
            }

            // This pass wants boot-candidate volumes, not raw whole-disk
            // handles.
            if !info.logical_partition {
                continue;
            }

            let io = match enumerator.open(index) {
                Some(io) => io,
                None => continue,
            };

            let mut drive = match Drive::new(self.next_drive_id, &info, io) {
                Ok(drive) => drive,
                // Not a candidate (no media, bad geometry) - not an error.
                Err(_) => continue,
            };

            if !drive.fill_identifier() {
                report.identifier_missing = true;
            }

            if devices.push(drive).is_err() {
                log_info!("device list full, ignoring remaining handles");
                break;
            }

            self.next_drive_id += 1;
            report.drives_added += 1;
        }

        self.populated = true;
        Ok(report)
    }
}
