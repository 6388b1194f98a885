//! Device and identity error types
//!
//! Error enums for block-device discovery and access. Follows the same
//! pattern as the heap module's `HeapError`.

/// Errors that can occur while discovering or accessing block devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// Firmware exposes no block-capable handles at all
    NotFound,
    /// Read requested at a non-block-aligned offset or length
    Unaligned,
    /// Operation not available at this boot stage
    Unsupported,
    /// No medium present, or the reported geometry is unusable
    NoMedia,
    /// Block I/O firmware call failed
    Io,
    /// Device list capacity exhausted
    TooManyDevices,
}

impl DeviceError {
    /// Get a human-readable description of the error
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "no block I/O handles found",
            Self::Unaligned => "unaligned block access",
            Self::Unsupported => "operation not supported at boot stage",
            Self::NoMedia => "no media present",
            Self::Io => "block I/O call failed",
            Self::TooManyDevices => "device list full",
        }
    }
}

/// Outcome of an identity resolution pass that could not finish cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    /// Round budget exhausted with at least two drives still
    /// indistinguishable. Warning-level: boot continues with the
    /// best-available identifiers.
    Ambiguous,
}

impl IdentityError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ambiguous => "drives could not be told apart",
        }
    }
}
