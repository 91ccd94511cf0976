//! # Kernel Setup Header
//!
//! The setup header lives at offset `0x1F1` of a bzImage and is mirrored at the
//! same offset of the zero page. A loader copies the kernel's own header into
//! the zero page and then overwrites the fields it is responsible for.

use bitfield_struct::bitfield;
use core::fmt;
use core::mem::{offset_of, size_of};

/// The setup header, as of boot protocol 2.15.
///
/// Field offsets in the comments are relative to the start of the kernel image.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetupHeader {
    pub setup_sects: u8,            // 0x1f1
    pub root_flags: u16,            // 0x1f2
    pub syssize: u32,               // 0x1f4
    pub ram_size: u16,              // 0x1f8
    pub vid_mode: u16,              // 0x1fa
    pub root_dev: u16,              // 0x1fc
    pub boot_flag: u16,             // 0x1fe
    pub jump: u16,                  // 0x200
    pub header: u32,                // 0x202, "HdrS"
    pub version: u16,               // 0x206
    pub realmode_swtch: u32,        // 0x208
    pub start_sys_seg: u16,         // 0x20c
    pub kernel_version: u16,        // 0x20e
    pub type_of_loader: u8,         // 0x210
    pub loadflags: u8,              // 0x211
    pub setup_move_size: u16,       // 0x212
    pub code32_start: u32,          // 0x214
    pub ramdisk_image: u32,         // 0x218
    pub ramdisk_size: u32,          // 0x21c
    pub bootsect_kludge: u32,       // 0x220
    pub heap_end_ptr: u16,          // 0x224
    pub ext_loader_ver: u8,         // 0x226
    pub ext_loader_type: u8,        // 0x227
    pub cmd_line_ptr: u32,          // 0x228
    pub initrd_addr_max: u32,       // 0x22c
    pub kernel_alignment: u32,      // 0x230
    pub relocatable_kernel: u8,     // 0x234
    pub min_alignment: u8,          // 0x235
    pub xloadflags: u16,            // 0x236
    pub cmdline_size: u32,          // 0x238
    pub hardware_subarch: u32,      // 0x23c
    pub hardware_subarch_data: u64, // 0x240
    pub payload_offset: u32,        // 0x248
    pub payload_length: u32,        // 0x24c
    pub setup_data: u64,            // 0x250
    pub pref_address: u64,          // 0x258
    pub init_size: u32,             // 0x260
    pub handover_offset: u32,       // 0x264
    pub kernel_info_offset: u32,    // 0x268
}

impl SetupHeader {
    /// Size of the structure; the last byte is at image offset `0x26b`.
    pub const SIZE: usize = size_of::<Self>();

    #[must_use]
    pub const fn load_flags(&self) -> LoadFlags {
        LoadFlags::from_bits(self.loadflags)
    }

    pub const fn set_load_flags(&mut self, flags: LoadFlags) {
        self.loadflags = flags.into_bits();
    }

    #[must_use]
    pub const fn protocol_version(&self) -> ProtocolVersion {
        ProtocolVersion::from_raw(self.version)
    }
}

/// `loadflags` (offset `0x211`).
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct LoadFlags {
    /// Bit 0: the protected-mode code is loaded at `0x100000`.
    pub loaded_high: bool,
    /// Bit 1: set by the kernel when KASLR is in effect.
    pub kaslr: bool,
    #[bits(3)]
    __: u8,
    /// Bit 5: suppress early kernel messages.
    pub quiet: bool,
    /// Bit 6: do not reload segment registers in the 32-bit entry point.
    pub keep_segments: bool,
    /// Bit 7: `heap_end_ptr` is valid.
    pub can_use_heap: bool,
}

/// Boot protocol revision, encoded as `major << 8 | minor` in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    #[must_use]
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        let [minor, major] = raw.to_le_bytes();
        Self { major, minor }
    }

    #[must_use]
    pub const fn to_raw(self) -> u16 {
        u16::from_le_bytes([self.minor, self.major])
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

const _: () = {
    assert!(SetupHeader::SIZE == 0x26c - 0x1f1);
    assert!(offset_of!(SetupHeader, header) == 0x202 - 0x1f1);
    assert!(offset_of!(SetupHeader, type_of_loader) == 0x210 - 0x1f1);
    assert!(offset_of!(SetupHeader, loadflags) == 0x211 - 0x1f1);
    assert!(offset_of!(SetupHeader, ramdisk_image) == 0x218 - 0x1f1);
    assert!(offset_of!(SetupHeader, cmd_line_ptr) == 0x228 - 0x1f1);
    assert!(offset_of!(SetupHeader, pref_address) == 0x258 - 0x1f1);
    assert!(size_of::<LoadFlags>() == 1);
};
