//! Loader global allocator
//!
//! The boot heap claimed from firmware backs a linked-list allocator so the
//! rest of the boot stage can use `alloc`. Nothing allocates before
//! [`init`]; allocations made before the heap exists must go through the
//! firmware pool instead.

use linked_list_allocator::LockedHeap;
use vesper_core::heap::HeapRegion;

#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Hand the claimed heap region to the global allocator.
///
/// # Safety
/// `region` must be the exclusively owned, otherwise unused range returned
/// by `HeapManager::init_heap`, and `init` must be called at most once.
pub unsafe fn init(region: &HeapRegion) {
    ALLOCATOR.lock().init(region.base as *mut u8, region.size());
}
