//! # Physical Layout and Protocol Constants

use crate::setup_header::ProtocolVersion;

/// Where the protected-mode kernel payload is copied to and entered.
///
/// This is an architectural assumption of the protocol variant we implement
/// (a kernel with `LOADED_HIGH` set), not a tunable.
pub const KERNEL_LOAD_ADDRESS: u64 = 0x0010_0000; // 1 MiB

/// Start of the legacy video/BIOS hole (640 KiB).
pub const LOW_MEMORY_HOLE_START: u64 = 0x000A_0000;

/// End of the legacy video/BIOS hole (1 MiB), exclusive.
pub const LOW_MEMORY_HOLE_END: u64 = 0x0010_0000;

/// Offset of the setup header within both the kernel image and the zero page.
pub const SETUP_HEADER_OFFSET: usize = 0x1F1;

/// Offset of the `HdrS` signature within the kernel image.
pub const HDRS_OFFSET: usize = 0x202;

/// The `HdrS` signature, read little-endian.
pub const HDRS_MAGIC: u32 = u32::from_le_bytes(*b"HdrS");

/// Offset of the `setup_sects` byte within the kernel image.
pub const SETUP_SECTS_OFFSET: usize = 0x1F1;

/// Offset of the jump instruction's displacement byte; the header ends at `0x202 + disp`.
pub const HEADER_JUMP_OFFSET: usize = 0x201;

/// `kernel_version` is relative to this base.
pub const KERNEL_VERSION_BASE: usize = 0x200;

/// Longest kernel version string we are willing to print.
pub const KERNEL_VERSION_MAX_LEN: usize = 128;

/// Real-mode sector size.
pub const SECTOR_SIZE: usize = 512;

/// Capacity of the zero page's legacy memory map.
pub const E820_MAX_ENTRIES_ZEROPAGE: usize = 128;

/// Size of the zero page.
pub const BOOT_PARAMS_SIZE: usize = 0x1000;

/// Oldest protocol revision with a `cmd_line_ptr` field.
pub const MIN_PROTOCOL_VERSION: ProtocolVersion = ProtocolVersion::new(2, 2);

/// `type_of_loader` value for a loader without an assigned ID.
pub const TYPE_OF_LOADER_UNDEFINED: u8 = 0xFF;

/// `vid_mode` value meaning "normal", i.e. keep the current mode.
pub const VID_MODE_NORMAL: u16 = 0xFFFF;

/// `efi_loader_signature` for a 32-bit EFI loader.
pub const EFI32_LOADER_SIGNATURE: [u8; 4] = *b"EL32";

/// `efi_loader_signature` for a 64-bit EFI loader.
pub const EFI64_LOADER_SIGNATURE: [u8; 4] = *b"EL64";

/// Physical base of the descriptor table region primed before handoff.
pub const GDT_BASE: u32 = 0x0009_4000;

/// Size in bytes of the descriptor table region that is cleared before priming.
pub const GDT_REGION_SIZE: u16 = 0x800;

const _: () = {
    assert!(HDRS_MAGIC == 0x5372_6448);
    assert!(LOW_MEMORY_HOLE_START < LOW_MEMORY_HOLE_END);
    assert!(KERNEL_LOAD_ADDRESS == LOW_MEMORY_HOLE_END);
    assert!(E820_MAX_ENTRIES_ZEROPAGE <= u8::MAX as usize);
};
