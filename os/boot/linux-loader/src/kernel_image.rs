//! # bzImage Header Validation

use crate::error::ImageError;
use boot_params::layout::{
    HDRS_MAGIC, HDRS_OFFSET, HEADER_JUMP_OFFSET, KERNEL_VERSION_BASE, KERNEL_VERSION_MAX_LEN,
    MIN_PROTOCOL_VERSION, SECTOR_SIZE, SETUP_HEADER_OFFSET, SETUP_SECTS_OFFSET,
};
use boot_params::{ProtocolVersion, SetupHeader};
use core::ptr::read_unaligned;

/// `setup_sects == 0` means four sectors on old kernels.
const DEFAULT_SETUP_SECTS: usize = 4;

/// A validated kernel image borrowed from the payload store.
#[derive(Debug, Clone, Copy)]
pub struct KernelImage<'a> {
    bytes: &'a [u8],
    header: SetupHeader,
    setup_size: usize,
}

impl<'a> KernelImage<'a> {
    /// Checks the setup header of `bytes`.
    ///
    /// # Errors
    /// * [`ImageError::Truncated`] if the image ends before the `HdrS` signature.
    /// * [`ImageError::BadSignature`] if `HdrS` is missing.
    /// * [`ImageError::EmptyPayload`] if nothing follows the real-mode setup code.
    /// * [`ImageError::ProtocolTooOld`] for boot protocols older than 2.02.
    /// * [`ImageError::NotLoadedHigh`] if the kernel does not load at 1 MiB.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ImageError> {
        if bytes.len() < HDRS_OFFSET + 4 {
            return Err(ImageError::Truncated { len: bytes.len() });
        }

        let magic = u32::from_le_bytes([
            bytes[HDRS_OFFSET],
            bytes[HDRS_OFFSET + 1],
            bytes[HDRS_OFFSET + 2],
            bytes[HDRS_OFFSET + 3],
        ]);
        if magic != HDRS_MAGIC {
            return Err(ImageError::BadSignature { found: magic });
        }

        let setup_sects = match usize::from(bytes[SETUP_SECTS_OFFSET]) {
            0 => DEFAULT_SETUP_SECTS,
            n => n,
        };
        let setup_size = (setup_sects + 1) * SECTOR_SIZE;
        if bytes.len() <= setup_size {
            return Err(ImageError::EmptyPayload);
        }

        let header = read_setup_header(bytes);

        let version = header.protocol_version();
        if version < MIN_PROTOCOL_VERSION {
            return Err(ImageError::ProtocolTooOld(version));
        }
        if !header.load_flags().loaded_high() {
            return Err(ImageError::NotLoadedHigh);
        }

        Ok(Self {
            bytes,
            header,
            setup_size,
        })
    }

    /// The kernel's own setup header.
    #[must_use]
    pub const fn header(&self) -> &SetupHeader {
        &self.header
    }

    #[must_use]
    pub const fn protocol_version(&self) -> ProtocolVersion {
        self.header.protocol_version()
    }

    /// Size of the boot sector plus the real-mode setup code.
    #[must_use]
    pub const fn setup_size(&self) -> usize {
        self.setup_size
    }

    /// The protected-mode kernel that gets relocated to 1 MiB.
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[self.setup_size..]
    }

    /// The NUL-terminated version string the header points at, if any.
    #[must_use]
    pub fn version_string(&self) -> Option<&'a str> {
        let offset = self.header.kernel_version;
        if offset == 0 {
            return None;
        }
        let start = KERNEL_VERSION_BASE + usize::from(offset);
        let window = self.bytes.get(start..)?;
        let window = &window[..window.len().min(KERNEL_VERSION_MAX_LEN)];
        let len = window.iter().position(|&b| b == 0).unwrap_or(window.len());
        core::str::from_utf8(&window[..len]).ok()
    }
}

/// Reads the header the kernel declares, zero-filling anything beyond it.
///
/// The header ends at `0x202 + bytes[0x201]`; older kernels declare a shorter one.
fn read_setup_header(bytes: &[u8]) -> SetupHeader {
    let declared = HDRS_OFFSET + usize::from(bytes[HEADER_JUMP_OFFSET]) - SETUP_HEADER_OFFSET;
    let available = bytes.len() - SETUP_HEADER_OFFSET;
    let len = declared.min(available).min(SetupHeader::SIZE);

    let mut raw = [0u8; SetupHeader::SIZE];
    raw[..len].copy_from_slice(&bytes[SETUP_HEADER_OFFSET..SETUP_HEADER_OFFSET + len]);

    // SAFETY: `raw` is exactly `SetupHeader::SIZE` bytes and every bit pattern is valid.
    unsafe { read_unaligned(raw.as_ptr().cast::<SetupHeader>()) }
}
