//! # The Boot Parameter Block ("zero page")

use crate::e820::E820Entry;
use crate::efi_info::EfiInfo;
use crate::layout::{BOOT_PARAMS_SIZE, E820_MAX_ENTRIES_ZEROPAGE, SETUP_HEADER_OFFSET};
use crate::screen_info::ScreenInfo;
use crate::setup_header::SetupHeader;
use core::mem::{offset_of, size_of};

const EDD_MBR_SIG_MAX: usize = 16;
const EDDMAXNR: usize = 6;
const EDD_INFO_SIZE: usize = 82;

/// The zero page handed to the kernel in `esi`.
///
/// Obsolete and BIOS-only sub-structures (APM, IST, EDD, EDID, ...) are kept as
/// opaque byte arrays; a loader only ever leaves them zeroed.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct BootParams {
    pub screen_info: ScreenInfo,                          // 0x000
    pub apm_bios_info: [u8; 0x14],                        // 0x040
    _pad2: [u8; 4],                                       // 0x054
    pub tboot_addr: u64,                                  // 0x058
    pub ist_info: [u8; 0x10],                             // 0x060
    pub acpi_rsdp_addr: u64,                              // 0x070
    _pad3: [u8; 8],                                       // 0x078
    pub hd0_info: [u8; 16],                               // 0x080
    pub hd1_info: [u8; 16],                               // 0x090
    pub sys_desc_table: [u8; 16],                         // 0x0a0
    pub olpc_ofw_header: [u8; 16],                        // 0x0b0
    pub ext_ramdisk_image: u32,                           // 0x0c0
    pub ext_ramdisk_size: u32,                            // 0x0c4
    pub ext_cmd_line_ptr: u32,                            // 0x0c8
    _pad4: [u8; 116],                                     // 0x0cc
    pub edid_info: [u8; 128],                             // 0x140
    pub efi_info: EfiInfo,                                // 0x1c0
    pub alt_mem_k: u32,                                   // 0x1e0
    pub scratch: u32,                                     // 0x1e4
    pub e820_entries: u8,                                 // 0x1e8
    pub eddbuf_entries: u8,                               // 0x1e9
    pub edd_mbr_sig_buf_entries: u8,                      // 0x1ea
    pub kbd_status: u8,                                   // 0x1eb
    pub secure_boot: u8,                                  // 0x1ec
    _pad5: [u8; 2],                                       // 0x1ed
    pub sentinel: u8,                                     // 0x1ef
    _pad6: [u8; 1],                                       // 0x1f0
    pub hdr: SetupHeader,                                 // 0x1f1
    _pad7: [u8; 0x290 - 0x1f1 - SetupHeader::SIZE],       // 0x26c
    pub edd_mbr_sig_buffer: [u32; EDD_MBR_SIG_MAX],       // 0x290
    pub e820_table: [E820Entry; E820_MAX_ENTRIES_ZEROPAGE], // 0x2d0
    _pad8: [u8; 48],                                      // 0xcd0
    pub eddbuf: [u8; EDDMAXNR * EDD_INFO_SIZE],           // 0xd00
    _pad9: [u8; 276],                                     // 0xeec
}

impl BootParams {
    /// An all-zero block.
    ///
    /// The kernel treats any nonzero field as present data, so a block must
    /// start out zeroed before a loader populates it.
    #[must_use]
    #[allow(unsafe_code)]
    pub const fn zeroed() -> Self {
        // SAFETY: `BootParams` consists solely of integers and integer arrays,
        // for which the all-zero bit pattern is valid.
        unsafe { core::mem::zeroed() }
    }

    /// The populated prefix of the legacy memory map.
    #[must_use]
    pub fn e820_map(&self) -> &[E820Entry] {
        let len = usize::from(self.e820_entries).min(E820_MAX_ENTRIES_ZEROPAGE);
        &self.e820_table[..len]
    }

    /// The full ramdisk address, combining `hdr.ramdisk_image` and `ext_ramdisk_image`.
    #[must_use]
    pub const fn ramdisk_image(&self) -> u64 {
        ((self.ext_ramdisk_image as u64) << 32) | self.hdr.ramdisk_image as u64
    }

    /// The full ramdisk size, combining `hdr.ramdisk_size` and `ext_ramdisk_size`.
    #[must_use]
    pub const fn ramdisk_size(&self) -> u64 {
        ((self.ext_ramdisk_size as u64) << 32) | self.hdr.ramdisk_size as u64
    }

    /// The full command line address, combining `hdr.cmd_line_ptr` and `ext_cmd_line_ptr`.
    #[must_use]
    pub const fn cmd_line_ptr(&self) -> u64 {
        ((self.ext_cmd_line_ptr as u64) << 32) | self.hdr.cmd_line_ptr as u64
    }
}

impl Default for BootParams {
    fn default() -> Self {
        Self::zeroed()
    }
}

const _: () = {
    assert!(size_of::<BootParams>() == BOOT_PARAMS_SIZE);
    assert!(offset_of!(BootParams, apm_bios_info) == 0x040);
    assert!(offset_of!(BootParams, acpi_rsdp_addr) == 0x070);
    assert!(offset_of!(BootParams, ext_ramdisk_image) == 0x0c0);
    assert!(offset_of!(BootParams, ext_cmd_line_ptr) == 0x0c8);
    assert!(offset_of!(BootParams, edid_info) == 0x140);
    assert!(offset_of!(BootParams, efi_info) == 0x1c0);
    assert!(offset_of!(BootParams, e820_entries) == 0x1e8);
    assert!(offset_of!(BootParams, sentinel) == 0x1ef);
    assert!(offset_of!(BootParams, hdr) == SETUP_HEADER_OFFSET);
    assert!(offset_of!(BootParams, edd_mbr_sig_buffer) == 0x290);
    assert!(offset_of!(BootParams, e820_table) == 0x2d0);
    assert!(offset_of!(BootParams, eddbuf) == 0xd00);
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e820::E820Type;

    #[test]
    fn zeroed_block_has_no_memory_map() {
        let bp = BootParams::zeroed();
        assert!(bp.e820_map().is_empty());
        assert_eq!(bp.ramdisk_image(), 0);
        assert_eq!(bp.cmd_line_ptr(), 0);
        assert_eq!(bp.hdr, SetupHeader::default());
    }

    #[test]
    fn e820_map_is_bounded_by_entry_count() {
        let mut bp = BootParams::zeroed();
        bp.e820_table[0] = E820Entry::new(0, 0x9_f000, E820Type::Ram);
        bp.e820_table[1] = E820Entry::new(0x10_0000, 0x100_0000, E820Type::Ram);
        bp.e820_entries = 1;
        assert_eq!(bp.e820_map(), &[E820Entry::new(0, 0x9_f000, E820Type::Ram)]);

        bp.e820_entries = u8::MAX;
        assert_eq!(bp.e820_map().len(), E820_MAX_ENTRIES_ZEROPAGE);
    }

    #[test]
    fn split_pointers_are_recombined() {
        let mut bp = BootParams::zeroed();
        bp.hdr.ramdisk_image = 0x8000_0000;
        bp.ext_ramdisk_image = 0x2;
        bp.hdr.cmd_line_ptr = 0x1234;
        assert_eq!(bp.ramdisk_image(), 0x2_8000_0000);
        assert_eq!(bp.cmd_line_ptr(), 0x1234);
    }
}
