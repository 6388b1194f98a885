//! Vesper Core Library
//!
//! Platform-independent boot-stage logic: block-device discovery, disk
//! identity resolution, and the loader's boot heap. Firmware services are
//! consumed through the traits in [`firmware`]; one backend per platform
//! lives in the bootloader crate.
//!
//! Designed to be no_std compatible.

#![no_std]
#![allow(clippy::new_without_default)]

pub mod device;
pub mod firmware;
pub mod handoff;
pub mod heap;
pub mod logger;
