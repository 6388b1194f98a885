// Block device abstraction - drives and the boot-time device list

pub mod discover;
pub mod error;
pub mod identity;
pub mod resolver;

use gpt_disk_types::Lba;

use crate::firmware::{BlockHandleInfo, BlockIo};
use error::DeviceError;
use identity::DiskIdentifier;

/// Maximum number of boot-candidate devices tracked per session.
pub const MAX_BLOCK_DEVICES: usize = 16;

/// One discovered block-capable device.
///
/// Owns its firmware backend handle exclusively; created once per firmware
/// handle during discovery and never recreated.
pub struct Drive<Io: BlockIo> {
    id: u8,
    block_size: u32,
    byte_size: u64,
    identity: DiskIdentifier,
    io: Io,
}

impl<Io: BlockIo> Drive<Io> {
    /// Construct a drive from an opened block-I/O capability.
    ///
    /// Absent media or unusable geometry is not an error condition, just
    /// "not a boot candidate" - the caller discards and moves on.
    pub fn new(id: u8, info: &BlockHandleInfo, io: Io) -> Result<Self, DeviceError> {
        if !info.media_present || info.block_size == 0 {
            return Err(DeviceError::NoMedia);
        }

        let byte_size = (info.last_block + 1).saturating_mul(info.block_size as u64);
        if byte_size == 0 {
            return Err(DeviceError::NoMedia);
        }

        Ok(Self {
            id,
            block_size: info.block_size,
            byte_size,
            identity: DiskIdentifier::unknown(byte_size),
            io,
        })
    }

    /// Session-unique drive number, assigned in discovery order from 1.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Bytes per addressable block.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Total drive size in bytes.
    pub fn size(&self) -> u64 {
        self.byte_size
    }

    pub fn identity(&self) -> &DiskIdentifier {
        &self.identity
    }

    pub fn identity_mut(&mut self) -> &mut DiskIdentifier {
        &mut self.identity
    }

    /// Initialize the identity record: unknown tags, size snapshot, all
    /// probe slots unpopulated.
    ///
    /// Returns false - a record without probes never counts as an
    /// established identifier. Disambiguation requires comparing all
    /// candidates together and runs as a later pass over the whole list.
    pub fn fill_identifier(&mut self) -> bool {
        self.identity = DiskIdentifier::unknown(self.byte_size);
        false
    }

    /// Read `buffer.len()` bytes at `byte_offset`.
    ///
    /// Both the offset and the buffer length must be exact multiples of the
    /// block size; anything else is a caller bug and fails with
    /// [`DeviceError::Unaligned`] before any firmware call. No partial-block
    /// assembly, no rounding. Returns the number of bytes read, which may be
    /// short at the end of the medium.
    pub fn read_at(&mut self, byte_offset: u64, buffer: &mut [u8]) -> Result<usize, DeviceError> {
        let block_size = self.block_size as u64;
        if byte_offset % block_size != 0 || buffer.len() as u64 % block_size != 0 {
            return Err(DeviceError::Unaligned);
        }

        self.io
            .read_blocks(Lba(byte_offset / block_size), buffer)
            .map_err(|_| DeviceError::Io)
    }

    /// Writing is not available this early in boot.
    pub fn write_at(&mut self, _byte_offset: u64, _buffer: &[u8]) -> Result<usize, DeviceError> {
        Err(DeviceError::Unsupported)
    }
}

/// Ordered list of discovered drives, insertion order = discovery order.
///
/// Append-only during discovery; the identity resolver mutates elements in
/// place and never reorders or removes.
pub struct DeviceList<Io: BlockIo> {
    drives: [Option<Drive<Io>>; MAX_BLOCK_DEVICES],
    count: usize,
}

impl<Io: BlockIo> DeviceList<Io> {
    pub fn new() -> Self {
        Self {
            drives: core::array::from_fn(|_| None),
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, index: usize) -> Option<&Drive<Io>> {
        if index < self.count {
            self.drives[index].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Drive<Io>> {
        if index < self.count {
            self.drives[index].as_mut()
        } else {
            None
        }
    }

    /// Append a drive to the list.
    pub fn push(&mut self, drive: Drive<Io>) -> Result<(), DeviceError> {
        if self.count >= MAX_BLOCK_DEVICES {
            return Err(DeviceError::TooManyDevices);
        }

        self.drives[self.count] = Some(drive);
        self.count += 1;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drive<Io>> {
        self.drives[..self.count].iter().filter_map(Option::as_ref)
    }
}
