//! Common test utilities: in-memory block devices and mock firmware

// Each integration test binary compiles its own copy of this module and
// uses a different subset of it.
#![allow(dead_code)]

use gpt_disk_types::Lba;
use vesper_core::device::error::DeviceError;
use vesper_core::firmware::{
    BlockHandleInfo, BlockIo, DeviceEnumerator, FirmwareError, MemoryServices, MonotonicClock,
};
use vesper_core::heap::PAGE_SIZE;

/// In-memory block device for testing.
///
/// The backing data does not have to be a whole number of blocks; a read
/// that runs past the end of the data returns a short count, like real
/// firmware at the end of a medium.
#[derive(Debug, Clone)]
pub struct MemoryBlockDevice {
    pub data: Vec<u8>,
    pub block_size: u32,
    pub reads: usize,
}

impl MemoryBlockDevice {
    pub fn new(data: Vec<u8>, block_size: u32) -> Self {
        Self {
            data,
            block_size,
            reads: 0,
        }
    }

    pub fn last_block(&self) -> u64 {
        let blocks = (self.data.len() as u64).div_ceil(self.block_size as u64);
        blocks.saturating_sub(1)
    }

    /// Media description a firmware handle would report for this device.
    pub fn handle_info(&self) -> BlockHandleInfo {
        BlockHandleInfo {
            media_present: true,
            logical_partition: true,
            optical_boot_image: false,
            block_size: self.block_size,
            last_block: self.last_block(),
        }
    }
}

impl BlockIo for MemoryBlockDevice {
    type Error = ();

    fn block_size(&self) -> u32 {
        self.block_size
    }

    fn last_block(&self) -> u64 {
        MemoryBlockDevice::last_block(self)
    }

    fn read_blocks(&mut self, lba: Lba, buffer: &mut [u8]) -> Result<usize, ()> {
        self.reads += 1;

        let start = lba.0 as usize * self.block_size as usize;
        if start >= self.data.len() {
            return Err(());
        }

        let available = self.data.len() - start;
        let count = buffer.len().min(available);
        buffer[..count].copy_from_slice(&self.data[start..start + count]);
        Ok(count)
    }
}

/// One firmware handle as the mock enumerator presents it.
#[derive(Debug, Clone)]
pub struct MockHandle {
    pub info: BlockHandleInfo,
    pub data: Vec<u8>,
    /// `describe` fails when false (no resolvable device path).
    pub describable: bool,
    /// `open` fails when false.
    pub openable: bool,
}

impl MockHandle {
    /// A plain bootable partition handle over `data`.
    pub fn partition(data: Vec<u8>, block_size: u32) -> Self {
        let device = MemoryBlockDevice::new(data.clone(), block_size);
        Self {
            info: device.handle_info(),
            data,
            describable: true,
            openable: true,
        }
    }
}

/// Mock firmware handle database.
pub struct MockEnumerator {
    pub handles: Vec<MockHandle>,
}

impl MockEnumerator {
    pub fn new(handles: Vec<MockHandle>) -> Self {
        Self { handles }
    }
}

impl DeviceEnumerator for MockEnumerator {
    type Io = MemoryBlockDevice;

    fn handle_count(&mut self) -> Result<usize, DeviceError> {
        if self.handles.is_empty() {
            return Err(DeviceError::NotFound);
        }
        Ok(self.handles.len())
    }

    fn describe(&mut self, index: usize) -> Option<BlockHandleInfo> {
        let handle = self.handles.get(index)?;
        if !handle.describable {
            return None;
        }
        Some(handle.info)
    }

    fn open(&mut self, index: usize) -> Option<MemoryBlockDevice> {
        let handle = self.handles.get(index)?;
        if !handle.openable {
            return None;
        }
        Some(MemoryBlockDevice::new(
            handle.data.clone(),
            handle.info.block_size,
        ))
    }
}

/// Mock firmware memory services with a per-request page budget.
///
/// Page allocations succeed only for requests of at most `page_budget`
/// pages, which is how the real allocator looks to a shrinking request loop.
pub struct MockMemory {
    pub page_budget: usize,
    pub next_base: u64,
    pub page_allocs: Vec<(u64, usize)>,
    pub freed_pages: Vec<(u64, usize)>,
    pub pool_allocs: Vec<u64>,
    pub freed_pool: Vec<u64>,
    pub pool_exhausted: bool,
}

impl MockMemory {
    pub fn with_page_budget(page_budget: usize) -> Self {
        Self {
            page_budget,
            next_base: 0x10_0000,
            page_allocs: Vec::new(),
            freed_pages: Vec::new(),
            pool_allocs: Vec::new(),
            freed_pool: Vec::new(),
            pool_exhausted: false,
        }
    }
}

impl MemoryServices for MockMemory {
    fn allocate_pages(&mut self, pages: usize) -> Result<u64, FirmwareError> {
        if pages == 0 || pages > self.page_budget {
            return Err(FirmwareError(9));
        }
        let base = self.next_base;
        self.next_base += (pages * PAGE_SIZE) as u64;
        self.page_allocs.push((base, pages));
        Ok(base)
    }

    fn free_pages(&mut self, base: u64, pages: usize) -> Result<(), FirmwareError> {
        self.freed_pages.push((base, pages));
        Ok(())
    }

    fn allocate_pool(&mut self, size: usize) -> Result<u64, FirmwareError> {
        if self.pool_exhausted {
            return Err(FirmwareError(9));
        }
        let addr = self.next_base;
        self.next_base += size.max(8) as u64;
        self.pool_allocs.push(addr);
        Ok(addr)
    }

    fn free_pool(&mut self, addr: u64) -> Result<(), FirmwareError> {
        self.freed_pool.push(addr);
        Ok(())
    }
}

/// Clock that always reads the same tick.
pub struct FixedClock(pub u64);

impl MonotonicClock for FixedClock {
    fn now(&mut self) -> u64 {
        self.0
    }
}

/// Clock that advances by one tick per reading.
pub struct SteppingClock(pub u64);

impl MonotonicClock for SteppingClock {
    fn now(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}
