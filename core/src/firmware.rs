//! Firmware service facade
//!
//! Capability traits for the platform services the boot stage consumes:
//! block I/O, handle enumeration, page/pool memory, and a monotonic clock.
//! The core never talks to firmware directly; the bootloader provides one
//! implementation of each trait per firmware backend, and the test suite
//! provides in-memory mocks.

use core::fmt;

use gpt_disk_types::Lba;

use crate::device::error::DeviceError;

/// Raw firmware status carried out of a failed service call.
///
/// Status words are opaque to the core; they only matter for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareError(pub usize);

impl fmt::Display for FirmwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "firmware status {}", self.0)
    }
}

/// One block-capable device, as exposed by firmware.
///
/// Reads are whole-block only: `buffer.len()` must be a multiple of
/// `block_size()`. A read may return fewer bytes than requested at the end
/// of the medium; callers that need a full buffer pad the remainder
/// themselves.
pub trait BlockIo {
    type Error: fmt::Debug;

    /// Bytes per addressable block. Firmware reporting 0 makes the device
    /// unusable and is rejected during discovery.
    fn block_size(&self) -> u32;

    /// Index of the last addressable block.
    fn last_block(&self) -> u64;

    /// Read whole blocks starting at `lba` into `buffer`.
    ///
    /// Returns the number of bytes actually read.
    fn read_blocks(&mut self, lba: Lba, buffer: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Media facts firmware reports for one block-I/O handle, used to decide
/// whether the handle is a boot candidate before opening it.
#[derive(Debug, Clone, Copy)]
pub struct BlockHandleInfo {
    /// A medium is currently present in the device.
    pub media_present: bool,
    /// The handle is a partition view, not a raw whole-disk handle.
    pub logical_partition: bool,
    /// The terminal device-path node describes CD-ROM media: the handle is
    /// a boot-image view of an optical medium, not a distinct disk.
    pub optical_boot_image: bool,
    /// Bytes per block.
    pub block_size: u32,
    /// Index of the last addressable block.
    pub last_block: u64,
}

/// Enumerates the firmware handles that implement the block-I/O capability.
///
/// Handles are addressed by index within one enumeration pass; the set is
/// stable for the lifetime of the enumerator.
pub trait DeviceEnumerator {
    type Io: BlockIo;

    /// Number of block-capable handles the firmware exposes.
    ///
    /// Fails with [`DeviceError::NotFound`] when there are none at all.
    fn handle_count(&mut self) -> Result<usize, DeviceError>;

    /// Describe handle `index`. `None` when the handle does not resolve its
    /// device-path or block-I/O capability (such handles are skipped).
    fn describe(&mut self, index: usize) -> Option<BlockHandleInfo>;

    /// Open the block-I/O capability on handle `index`.
    fn open(&mut self, index: usize) -> Option<Self::Io>;
}

/// Page-granular and pool memory services of the platform firmware.
pub trait MemoryServices {
    /// Allocate `pages` contiguous pages, returning the physical base.
    fn allocate_pages(&mut self, pages: usize) -> Result<u64, FirmwareError>;

    /// Return `pages` pages starting at `base` to the firmware.
    fn free_pages(&mut self, base: u64, pages: usize) -> Result<(), FirmwareError>;

    /// Allocate `size` bytes of pool memory.
    fn allocate_pool(&mut self, size: usize) -> Result<u64, FirmwareError>;

    /// Release a pool allocation. The firmware tracks the size internally;
    /// `addr` must come from [`MemoryServices::allocate_pool`].
    fn free_pool(&mut self, addr: u64) -> Result<(), FirmwareError>;
}

/// Monotonic time source.
///
/// Only used as an entropy hint by the identity resolver once its structured
/// probe offsets are exhausted, so the unit does not matter — ticks of any
/// monotonic counter do. Injectable so the probe sequence is deterministic
/// under test.
pub trait MonotonicClock {
    fn now(&mut self) -> u64;
}
