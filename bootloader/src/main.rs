//! Vesper UEFI Boot Stage
//!
//! Runs before any kernel driver exists. The stage claims a loader heap
//! from boot services, enumerates every block device the firmware exposes,
//! resolves a content-derived identity for each boot candidate, and records
//! which drive the kernel should consider its boot source.

#![no_std]
#![no_main]
#![allow(dead_code)]

use core::panic::PanicInfo;

use vesper_core::device::discover::DiscoverySession;
use vesper_core::device::resolver::find_unique_check_sums;
use vesper_core::device::DeviceList;
use vesper_core::handoff::BootHandoff;
use vesper_core::heap::HeapManager;

mod allocator;
mod console;
mod uefi;

use console::{println, SimpleTextOutputProtocol};
use uefi::devices::UefiDeviceEnumerator;
use uefi::memory::{UefiClock, UefiMemoryServices};

/// Heap the loader asks for up front; firmware may grant less.
const LOADER_HEAP_SIZE: usize = 16 * 1024 * 1024;

/// EFI_LOAD_ERROR - hands control back so firmware tries the next boot option.
const EFI_LOAD_ERROR: usize = (1 << (usize::BITS - 1)) | 1;

#[repr(C)]
pub struct SystemTable {
    _header: [u8; 24],
    _firmware_vendor: *const u16,
    _firmware_revision: u32,
    _console_in_handle: *const (),
    _con_in: *const (),
    _console_out_handle: *const (),
    con_out: *mut SimpleTextOutputProtocol,
    _stderr_handle: *const (),
    _stderr: *const (),
    _runtime_services: *const (),
    boot_services: *const BootServices,
    _number_of_table_entries: usize,
    _configuration_table: *const (),
}

#[repr(C)]
pub struct BootServices {
    _header: [u8; 24],
    // Task Priority Services
    _raise_tpl: usize,
    _restore_tpl: usize,
    // Memory Services (order per UEFI spec)
    pub allocate_pages: extern "efiapi" fn(
        allocate_type: usize,
        memory_type: usize,
        pages: usize,
        memory: *mut u64,
    ) -> usize,
    pub free_pages: extern "efiapi" fn(memory: u64, pages: usize) -> usize,
    _get_memory_map: usize,
    pub allocate_pool:
        extern "efiapi" fn(pool_type: usize, size: usize, buffer: *mut *mut u8) -> usize,
    pub free_pool: extern "efiapi" fn(buffer: *mut u8) -> usize,
    // Event & Timer Services
    _create_event: usize,
    _set_timer: usize,
    _wait_for_event: usize,
    _signal_event: usize,
    _close_event: usize,
    _check_event: usize,
    // Protocol Handler Services
    _install_protocol_interface: usize,
    _reinstall_protocol_interface: usize,
    _uninstall_protocol_interface: usize,
    pub handle_protocol: extern "efiapi" fn(
        handle: *mut (),
        protocol: *const [u8; 16],
        interface: *mut *mut (),
    ) -> usize,
    _reserved: usize,
    _register_protocol_notify: usize,
    pub locate_handle: extern "efiapi" fn(
        search_type: usize,
        protocol: *const [u8; 16],
        search_key: *const (),
        buffer_size: *mut usize,
        buffer: *mut *mut (),
    ) -> usize,
    _locate_device_path: usize,
    _install_configuration_table: usize,
    // Image Services
    _load_image: usize,
    _start_image: usize,
    _exit: usize,
    _unload_image: usize,
    pub exit_boot_services: extern "efiapi" fn(image_handle: *mut (), map_key: usize) -> usize,
    // Miscellaneous Services
    pub get_next_monotonic_count: extern "efiapi" fn(count: *mut u64) -> usize,
    /// Stall for microseconds
    pub stall: extern "efiapi" fn(microseconds: usize) -> usize,
    /// Disable/set watchdog timer (timeout in seconds, 0 = disable)
    pub set_watchdog_timer: extern "efiapi" fn(
        timeout: usize,
        watchdog_code: u64,
        data_size: usize,
        watchdog_data: *const u16,
    ) -> usize,
}

#[no_mangle]
pub extern "efiapi" fn efi_main(_image_handle: *mut (), system_table: *const ()) -> usize {
    let (st, bs) = unsafe {
        let st = &*(system_table as *const SystemTable);
        (st, &*st.boot_services)
    };

    console::init(st.con_out);

    // Firmware arms a watchdog before handing over; a slow disk scan must
    // not trip it.
    (bs.set_watchdog_timer)(0, 0, 0, core::ptr::null());

    println!("vesper boot stage");

    // Memory first: everything after this may allocate.
    let mut memory = UefiMemoryServices::new(bs);
    let mut heap_manager = HeapManager::new();
    let region = match heap_manager.init_heap(&mut memory, LOADER_HEAP_SIZE) {
        Ok(region) => region,
        Err(err) => {
            println!("heap: {}", err.as_str());
            return EFI_LOAD_ERROR;
        }
    };
    println!(
        "heap: base {:#x}, top {:#x} ({} KB)",
        region.base,
        region.top,
        region.size() / 1024
    );
    unsafe { allocator::init(&region) };

    // Collect the boot candidates.
    let mut devices = DeviceList::new();
    let mut session = DiscoverySession::new();

    let report = {
        let mut enumerator = match UefiDeviceEnumerator::new(bs) {
            Ok(enumerator) => enumerator,
            Err(err) => {
                println!("devices: {}", err.as_str());
                return EFI_LOAD_ERROR;
            }
        };

        match session.add_block_devices(&mut enumerator, &mut devices) {
            Ok(report) => report,
            Err(err) => {
                println!("devices: {}", err.as_str());
                return EFI_LOAD_ERROR;
            }
        }
    };
    println!("found {} boot candidates", report.drives_added);

    if devices.is_empty() {
        println!("no usable boot device");
        return EFI_LOAD_ERROR;
    }

    // Make the candidates tell each other apart.
    let mut clock = UefiClock::new(bs);
    if find_unique_check_sums(&mut devices, &mut clock).is_err() {
        println!("could not make drives unique, might boot from the wrong disk");
    }

    for drive in devices.iter() {
        println!(
            "drive {}: {} KB, block size {}",
            drive.id(),
            drive.size() / 1024,
            drive.block_size()
        );
    }

    // Boot-volume search belongs to the next stage; until it lands the
    // first candidate stands in as the boot source.
    if let Some(drive) = devices.get(0) {
        let handoff = BootHandoff::for_drive(drive);
        println!("boot drive number {}", handoff.boot_drive_number);
        // TODO: mount the boot volume on this drive and load the kernel image.
    }

    vesper_core::logger::for_each_log(|message| println!("[boot] {}", message));

    loop {
        (bs.stall)(1_000_000);
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    println!("loader panic: {}", info);
    loop {
        core::hint::spin_loop();
    }
}
