//! # Boot Errors

use boot_mmap::{CapacityError, MapLayoutError};
use boot_params::ProtocolVersion;

/// The embedded kernel cannot be booted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ImageError {
    #[error("Linux kernel not found")]
    KernelNotFound,
    #[error("kernel image is only {len} bytes long")]
    Truncated { len: usize },
    #[error("this is not a Linux kernel, signature is {found:#010x}")]
    BadSignature { found: u32 },
    #[error("kernel image has no protected-mode payload")]
    EmptyPayload,
    #[error("boot protocol {0} is too old, at least 2.02 is required")]
    ProtocolTooOld(ProtocolVersion),
    #[error("Linux kernels that load at 0x10000 are unsupported")]
    NotLoadedHigh,
}

/// A required firmware table is missing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DiscoveryError {
    #[error("no ACPI table found")]
    RsdpNotFound,
}

/// Any condition that stops the boot attempt.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum BootError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    MemoryMap(#[from] MapLayoutError),
}

/// Non-fatal conditions raised while building the zero page.
///
/// Each one is also logged as a warning when it occurs.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Advisories {
    /// No initial ramdisk was supplied; the ramdisk fields stay zero.
    pub missing_ramdisk: bool,
    /// Firmware descriptors whose type was reported as reserved.
    pub unrecognized_descriptors: usize,
}

impl Advisories {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.missing_ramdisk && self.unrecognized_descriptors == 0
    }
}
