// UEFI firmware backend for the vesper-core facade traits

pub mod block_io;
pub mod device_path;
pub mod devices;
pub mod memory;
