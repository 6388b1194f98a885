//! Boot heap bootstrap
//!
//! Claims a contiguous page range from the firmware allocator for the
//! loader's own heap, shrinking the request until the firmware accepts it,
//! and exposes the firmware pool for small allocations needed before or
//! beside the heap. The firmware's available capacity is unknown in
//! advance; the one guarantee the loader needs is that it never runs with
//! no usable memory without noticing.

use crate::firmware::MemoryServices;
use crate::log_info;

/// Page size (4KB).
pub const PAGE_SIZE: usize = 4096;

/// Largest page count ever requested for the boot heap (256 MB).
pub const HEAP_PAGE_CEILING: usize = 0x10000;

/// Convert bytes to pages (rounded up).
#[inline]
pub const fn bytes_to_pages(bytes: usize) -> usize {
    (bytes + PAGE_SIZE - 1) / PAGE_SIZE
}

/// Convert pages to bytes.
#[inline]
pub const fn pages_to_bytes(pages: usize) -> usize {
    pages * PAGE_SIZE
}

/// Errors that can occur while bootstrapping loader memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// Firmware allocator exhausted at the minimum acceptable request
    OutOfMemory,
    /// Heap manager misuse: double init, release without init, or a
    /// release address that does not match the granted region
    InvalidState,
}

impl HeapError {
    /// Get a human-readable description of the error
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "firmware allocator exhausted",
            Self::InvalidState => "heap manager misuse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeapState {
    Uninitialized,
    Active,
    Released,
}

/// Bounds of the claimed heap region.
///
/// The granted size is not necessarily the requested size; all arithmetic
/// downstream must use these bounds, never the original request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapRegion {
    pub base: u64,
    pub top: u64,
}

impl HeapRegion {
    pub fn size(&self) -> usize {
        (self.top - self.base) as usize
    }
}

/// Owns the boot heap region for one boot-stage invocation.
///
/// Exactly one region is ever held: `Uninitialized -> Active` on a
/// successful [`HeapManager::init_heap`], `Active -> Released` on
/// [`HeapManager::release_heap`]. Any other transition is a usage error.
pub struct HeapManager {
    state: HeapState,
    base: u64,
    pages: usize,
}

impl HeapManager {
    pub const fn new() -> Self {
        Self {
            state: HeapState::Uninitialized,
            base: 0,
            pages: 0,
        }
    }

    /// Claim a page-granular region of at least one page.
    ///
    /// Starts from `requested_size` clamped to [`HEAP_PAGE_CEILING`] and
    /// halves the request on every firmware refusal. Once the request falls
    /// below one page the firmware is genuinely out of memory and the boot
    /// stage cannot continue.
    pub fn init_heap<M: MemoryServices>(
        &mut self,
        firmware: &mut M,
        requested_size: usize,
    ) -> Result<HeapRegion, HeapError> {
        if self.state != HeapState::Uninitialized {
            return Err(HeapError::InvalidState);
        }

        let mut pages = bytes_to_pages(requested_size).min(HEAP_PAGE_CEILING);

        while pages > 0 {
            match firmware.allocate_pages(pages) {
                Ok(base) => {
                    self.state = HeapState::Active;
                    self.base = base;
                    self.pages = pages;
                    log_info!("boot heap claimed");
                    return Ok(HeapRegion {
                        base,
                        top: base + pages_to_bytes(pages) as u64,
                    });
                }
                Err(_) => pages /= 2,
            }
        }

        log_info!("firmware refused even a one-page heap");
        Err(HeapError::OutOfMemory)
    }

    /// Return the whole heap region to the firmware.
    ///
    /// `base` must be the exact address [`HeapManager::init_heap`] returned;
    /// a mismatch (or a release while no region is held) fails without
    /// touching firmware.
    pub fn release_heap<M: MemoryServices>(
        &mut self,
        firmware: &mut M,
        base: u64,
    ) -> Result<(), HeapError> {
        if self.state != HeapState::Active || base != self.base {
            return Err(HeapError::InvalidState);
        }

        // Nothing actionable remains if the firmware refuses a free this
        // late in the stage.
        let _ = firmware.free_pages(self.base, self.pages);
        self.state = HeapState::Released;
        Ok(())
    }
}

/// Allocate `size` bytes of firmware pool memory, independent of the bump
/// heap. Pool exhaustion is local: the caller may simply skip whatever the
/// allocation was for.
pub fn allocate_region<M: MemoryServices>(
    firmware: &mut M,
    size: usize,
) -> Result<u64, HeapError> {
    firmware.allocate_pool(size).map_err(|_| HeapError::OutOfMemory)
}

/// Release a region obtained from [`allocate_region`]. The firmware tracks
/// the allocation size internally.
pub fn free_region<M: MemoryServices>(firmware: &mut M, addr: u64) {
    let _ = firmware.free_pool(addr);
}
