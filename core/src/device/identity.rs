//! Disk identity records
//!
//! A [`DiskIdentifier`] is the loader's best effort at naming the physical
//! medium behind a drive without trusting any out-of-band metadata: a size
//! snapshot plus a small set of content checksums sampled at known offsets.
//! The kernel later re-samples the same offsets to find the volume it was
//! booted from.

/// Number of checksum slots carried per identifier.
pub const CHECKSUM_CAPACITY: usize = 5;

/// Serialized size of a [`DiskIdentifier`] in the kernel handoff record.
pub const DISK_IDENTIFIER_BYTES: usize = 4 + 4 + 8 + CHECKSUM_CAPACITY * 12;

/// Transport bus the device sits on.
///
/// Firmware does not expose bus-specific identifiers this early in boot, so
/// discovery only ever produces `Unknown` today.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    Ata = 0,
    Scsi = 1,
    Usb = 2,
    Unknown = 3,
}

/// Device class behind the bus.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Ata = 0,
    Atapi = 1,
    Scsi = 2,
    Unknown = 3,
}

/// One content sample: the checksum of a probe block read at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSum {
    /// Byte offset the probe block was read from.
    pub offset: u64,
    /// Wrapping u32 word sum of the (zero-padded) probe block.
    pub sum: u32,
}

/// Identity record of one drive.
///
/// The checksum slots are a fixed-capacity ring: the resolver overwrites the
/// oldest sample once all slots are populated. Unpopulated slots are `None`
/// rather than a sentinel offset.
#[derive(Debug, Clone, Copy)]
pub struct DiskIdentifier {
    pub bus_type: BusType,
    pub device_type: DeviceType,
    /// Drive byte size at identity-computation time.
    pub reported_size: u64,
    pub check_sums: [Option<CheckSum>; CHECKSUM_CAPACITY],
}

impl DiskIdentifier {
    /// Minimal record for a device firmware tells us nothing about: tags
    /// unknown, size snapshot taken, no probes run yet.
    pub const fn unknown(reported_size: u64) -> Self {
        Self {
            bus_type: BusType::Unknown,
            device_type: DeviceType::Unknown,
            reported_size,
            check_sums: [None; CHECKSUM_CAPACITY],
        }
    }

    /// Whether this identity is already specific enough to skip content
    /// disambiguation. Only non-`Unknown` device types qualify.
    pub fn is_resolved(&self) -> bool {
        self.device_type != DeviceType::Unknown
    }

    /// Store a sample into `slot`, overwriting older evidence.
    pub fn record_check_sum(&mut self, slot: usize, offset: u64, sum: u32) {
        self.check_sums[slot] = Some(CheckSum { offset, sum });
    }

    /// Compare the checksum evidence of two identifiers.
    ///
    /// Probe offsets are shared across drives within a resolution round, so
    /// only the sum of each populated slot is compared. Two identifiers with
    /// no populated slots compare equal — no evidence distinguishes them.
    pub fn check_sums_match(&self, other: &Self) -> bool {
        for slot in 0..CHECKSUM_CAPACITY {
            match (self.check_sums[slot], other.check_sums[slot]) {
                (None, None) => {}
                (Some(a), Some(b)) => {
                    if a.sum != b.sum {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        true
    }

    /// Fixed-layout little-endian serialization for the kernel handoff.
    ///
    /// Layout: bus tag u32, device tag u32, reported size u64, then
    /// [`CHECKSUM_CAPACITY`] pairs of (offset i64, sum u32). Unpopulated
    /// slots serialize as offset −1, sum 0.
    pub fn to_bytes(&self) -> [u8; DISK_IDENTIFIER_BYTES] {
        let mut out = [0u8; DISK_IDENTIFIER_BYTES];
        out[0..4].copy_from_slice(&(self.bus_type as u32).to_le_bytes());
        out[4..8].copy_from_slice(&(self.device_type as u32).to_le_bytes());
        out[8..16].copy_from_slice(&self.reported_size.to_le_bytes());

        let mut pos = 16;
        for slot in &self.check_sums {
            let (offset, sum) = match slot {
                Some(cs) => (cs.offset as i64, cs.sum),
                None => (-1i64, 0),
            };
            out[pos..pos + 8].copy_from_slice(&offset.to_le_bytes());
            out[pos + 8..pos + 12].copy_from_slice(&sum.to_le_bytes());
            pos += 12;
        }

        out
    }
}
