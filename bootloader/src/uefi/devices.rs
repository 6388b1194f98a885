//! UEFI block device enumeration
//!
//! Implements the core facade's `DeviceEnumerator` over the firmware handle
//! database, and wraps each opened Block I/O protocol in a `BlockIo`
//! adapter. The handle buffer lives in pool memory because enumeration can
//! run before the loader heap exists.

use core::fmt;

use gpt_disk_types::Lba;
use vesper_core::device::error::DeviceError;
use vesper_core::firmware::{BlockHandleInfo, BlockIo, DeviceEnumerator};

use super::block_io::{BlockIoProtocol, EFI_BLOCK_IO_PROTOCOL_GUID};
use super::device_path::{terminal_node, DevicePathNode, EFI_DEVICE_PATH_PROTOCOL_GUID};
use super::memory::{EFI_LOADER_DATA, EFI_SUCCESS};
use crate::BootServices;

/// Error type for UEFI block I/O operations
#[derive(Debug, Clone, Copy)]
pub struct UefiBlockIoError(pub usize);

impl fmt::Display for UefiBlockIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UEFI BlockIo error: {}", self.0)
    }
}

/// Wrapper around a Block I/O protocol implementing the core `BlockIo` seam.
pub struct UefiBlockIo {
    protocol: *mut BlockIoProtocol,
    media_id: u32,
    block_size: u32,
    last_block: u64,
}

impl UefiBlockIo {
    /// # Safety
    /// The protocol pointer must stay valid for the lifetime of this wrapper.
    pub unsafe fn new(protocol: *mut BlockIoProtocol) -> Self {
        let media = &*(*protocol).media;
        Self {
            protocol,
            media_id: media.media_id,
            block_size: media.block_size,
            last_block: media.last_block,
        }
    }
}

impl BlockIo for UefiBlockIo {
    type Error = UefiBlockIoError;

    fn block_size(&self) -> u32 {
        self.block_size
    }

    fn last_block(&self) -> u64 {
        self.last_block
    }

    fn read_blocks(&mut self, lba: Lba, buffer: &mut [u8]) -> Result<usize, UefiBlockIoError> {
        // SAFETY: protocol pointer is valid (guaranteed by constructor).
        let status = unsafe {
            ((*self.protocol).read_blocks)(
                self.protocol,
                self.media_id,
                lba.0,
                buffer.len(),
                buffer.as_mut_ptr(),
            )
        };

        if status != EFI_SUCCESS {
            return Err(UefiBlockIoError(status));
        }

        // Firmware reads fully or fails; short counts only exist for
        // in-memory backends.
        Ok(buffer.len())
    }
}

/// Search type for `locate_handle`: all handles supporting a protocol.
const BY_PROTOCOL: usize = 2;

/// Enumerates every handle carrying the Block I/O protocol.
pub struct UefiDeviceEnumerator<'a> {
    boot_services: &'a BootServices,
    handles: *const *mut (),
    count: usize,
}

impl<'a> UefiDeviceEnumerator<'a> {
    /// Snapshot the firmware's block-I/O handle database.
    pub fn new(boot_services: &'a BootServices) -> Result<Self, DeviceError> {
        // First call sizes the buffer, second call fills it.
        let mut buffer_size: usize = 0;
        let _ = (boot_services.locate_handle)(
            BY_PROTOCOL,
            &EFI_BLOCK_IO_PROTOCOL_GUID,
            core::ptr::null(),
            &mut buffer_size,
            core::ptr::null_mut(),
        );

        if buffer_size == 0 {
            return Err(DeviceError::NotFound);
        }

        let mut handle_buffer: *mut u8 = core::ptr::null_mut();
        let status =
            (boot_services.allocate_pool)(EFI_LOADER_DATA, buffer_size, &mut handle_buffer);
        if status != EFI_SUCCESS {
            return Err(DeviceError::NotFound);
        }

        let status = (boot_services.locate_handle)(
            BY_PROTOCOL,
            &EFI_BLOCK_IO_PROTOCOL_GUID,
            core::ptr::null(),
            &mut buffer_size,
            handle_buffer as *mut *mut (),
        );
        if status != EFI_SUCCESS {
            let _ = (boot_services.free_pool)(handle_buffer);
            return Err(DeviceError::NotFound);
        }

        Ok(Self {
            boot_services,
            handles: handle_buffer as *const *mut (),
            count: buffer_size / core::mem::size_of::<*mut ()>(),
        })
    }

    fn handle(&self, index: usize) -> Option<*mut ()> {
        if index >= self.count {
            return None;
        }
        // SAFETY: index is within the firmware-filled handle array.
        Some(unsafe { *self.handles.add(index) })
    }

    fn open_protocol(&self, handle: *mut (), guid: &[u8; 16]) -> Option<*mut ()> {
        let mut interface: *mut () = core::ptr::null_mut();
        let status = (self.boot_services.handle_protocol)(handle, guid, &mut interface);
        if status != EFI_SUCCESS || interface.is_null() {
            return None;
        }
        Some(interface)
    }
}

impl DeviceEnumerator for UefiDeviceEnumerator<'_> {
    type Io = UefiBlockIo;

    fn handle_count(&mut self) -> Result<usize, DeviceError> {
        if self.count == 0 {
            return Err(DeviceError::NotFound);
        }
        Ok(self.count)
    }

    fn describe(&mut self, index: usize) -> Option<BlockHandleInfo> {
        let handle = self.handle(index)?;

        let path =
            self.open_protocol(handle, &EFI_DEVICE_PATH_PROTOCOL_GUID)? as *const DevicePathNode;
        // SAFETY: firmware owns the path for the lifetime of the handle.
        let optical_boot_image = unsafe { (*terminal_node(path)).is_cdrom_media() };

        let block_io =
            self.open_protocol(handle, &EFI_BLOCK_IO_PROTOCOL_GUID)? as *const BlockIoProtocol;
        // SAFETY: protocol and media pointers come from the firmware.
        let media = unsafe { &*(*block_io).media };

        Some(BlockHandleInfo {
            media_present: media.media_present,
            logical_partition: media.logical_partition,
            optical_boot_image,
            block_size: media.block_size,
            last_block: media.last_block,
        })
    }

    fn open(&mut self, index: usize) -> Option<UefiBlockIo> {
        let handle = self.handle(index)?;
        let block_io =
            self.open_protocol(handle, &EFI_BLOCK_IO_PROTOCOL_GUID)? as *mut BlockIoProtocol;
        // SAFETY: the protocol outlives the boot stage; firmware owns it.
        Some(unsafe { UefiBlockIo::new(block_io) })
    }
}

impl Drop for UefiDeviceEnumerator<'_> {
    fn drop(&mut self) {
        let _ = (self.boot_services.free_pool)(self.handles as *mut u8);
    }
}
