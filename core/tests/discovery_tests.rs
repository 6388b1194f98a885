//! Device discovery tests

mod common;

use common::{MemoryBlockDevice, MockEnumerator, MockHandle};
use vesper_core::device::discover::{DiscoveryReport, DiscoverySession};
use vesper_core::device::error::DeviceError;
use vesper_core::device::DeviceList;

fn block_data(len: usize, fill: u8) -> Vec<u8> {
    vec![fill; len]
}

#[test]
fn no_handles_is_fatal_not_found() {
    let mut enumerator = MockEnumerator::new(Vec::new());
    let mut devices: DeviceList<MemoryBlockDevice> = DeviceList::new();
    let mut session = DiscoverySession::new();

    let result = session.add_block_devices(&mut enumerator, &mut devices);
    assert_eq!(result, Err(DeviceError::NotFound));
    assert!(devices.is_empty());
}

#[test]
fn discovers_partition_handles_in_order() {
    let mut enumerator = MockEnumerator::new(vec![
        MockHandle::partition(block_data(4096, 0xaa), 512),
        MockHandle::partition(block_data(8192, 0xbb), 512),
    ]);
    let mut devices = DeviceList::new();
    let mut session = DiscoverySession::new();

    let report = session
        .add_block_devices(&mut enumerator, &mut devices)
        .expect("discovery should succeed");

    assert_eq!(report.drives_added, 2);
    assert!(report.identifier_missing);
    assert_eq!(devices.len(), 2);

    // Drive ids follow discovery order, starting at 1.
    assert_eq!(devices.get(0).unwrap().id(), 1);
    assert_eq!(devices.get(1).unwrap().id(), 2);
    assert_eq!(devices.get(0).unwrap().size(), 4096);
    assert_eq!(devices.get(1).unwrap().size(), 8192);
}

#[test]
fn whole_disk_handles_are_filtered() {
    let mut whole_disk = MockHandle::partition(block_data(4096, 1), 512);
    whole_disk.info.logical_partition = false;

    let mut enumerator = MockEnumerator::new(vec![
        whole_disk,
        MockHandle::partition(block_data(4096, 2), 512),
    ]);
    let mut devices = DeviceList::new();
    let mut session = DiscoverySession::new();

    let report = session
        .add_block_devices(&mut enumerator, &mut devices)
        .unwrap();

    assert_eq!(report.drives_added, 1);
    assert_eq!(devices.len(), 1);
    assert_eq!(devices.get(0).unwrap().id(), 1);
}

#[test]
fn absent_media_never_produces_a_drive() {
    let mut ejected = MockHandle::partition(block_data(4096, 1), 512);
    ejected.info.media_present = false;

    let mut enumerator = MockEnumerator::new(vec![ejected]);
    let mut devices = DeviceList::new();
    let mut session = DiscoverySession::new();

    let report = session
        .add_block_devices(&mut enumerator, &mut devices)
        .unwrap();

    assert_eq!(report.drives_added, 0);
    assert!(!report.identifier_missing);
    assert!(devices.is_empty());
}

#[test]
fn optical_boot_images_are_skipped() {
    let mut el_torito = MockHandle::partition(block_data(4096, 1), 2048);
    el_torito.info.optical_boot_image = true;

    let mut enumerator = MockEnumerator::new(vec![
        el_torito,
        MockHandle::partition(block_data(4096, 2), 512),
    ]);
    let mut devices = DeviceList::new();
    let mut session = DiscoverySession::new();

    let report = session
        .add_block_devices(&mut enumerator, &mut devices)
        .unwrap();

    assert_eq!(report.drives_added, 1);
    assert_eq!(devices.get(0).unwrap().block_size(), 512);
}

#[test]
fn unresolvable_handles_are_skipped_not_fatal() {
    let mut no_path = MockHandle::partition(block_data(4096, 1), 512);
    no_path.describable = false;
    let mut no_open = MockHandle::partition(block_data(4096, 2), 512);
    no_open.openable = false;

    let mut enumerator = MockEnumerator::new(vec![
        no_path,
        no_open,
        MockHandle::partition(block_data(4096, 3), 512),
    ]);
    let mut devices = DeviceList::new();
    let mut session = DiscoverySession::new();

    let report = session
        .add_block_devices(&mut enumerator, &mut devices)
        .unwrap();

    assert_eq!(report.drives_added, 1);
    assert_eq!(devices.len(), 1);
}

#[test]
fn discovery_is_idempotent_within_a_session() {
    let mut enumerator = MockEnumerator::new(vec![MockHandle::partition(
        block_data(4096, 0xcc),
        512,
    )]);
    let mut devices = DeviceList::new();
    let mut session = DiscoverySession::new();

    let first = session
        .add_block_devices(&mut enumerator, &mut devices)
        .unwrap();
    assert_eq!(first.drives_added, 1);

    let second = session
        .add_block_devices(&mut enumerator, &mut devices)
        .unwrap();
    assert_eq!(second, DiscoveryReport::default());
    assert_eq!(devices.len(), 1);
}

#[test]
fn fresh_identity_has_size_snapshot_and_no_probes() {
    let mut enumerator = MockEnumerator::new(vec![MockHandle::partition(
        block_data(8192, 0),
        512,
    )]);
    let mut devices = DeviceList::new();
    let mut session = DiscoverySession::new();

    session
        .add_block_devices(&mut enumerator, &mut devices)
        .unwrap();

    let identity = devices.get(0).unwrap().identity();
    assert!(!identity.is_resolved());
    assert_eq!(identity.reported_size, 8192);
    assert!(identity.check_sums.iter().all(Option::is_none));
}
