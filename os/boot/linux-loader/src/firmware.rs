//! # Firmware Boot Environment
//!
//! The primary loader enters us with a pointer to its boot-argument block
//! ([`MachBootArgs`]). Everything the zero page needs from the firmware is
//! gathered from it into a [`FirmwareEnvironment`].

use crate::error::BootError;
use crate::rsdp::{ConfigTables, TableLayout};
use boot_mmap::EfiMemoryMap;
use core::ffi::CStr;

/// Segment holding the embedded payloads.
pub const TEXT_SEGMENT: &str = "__TEXT";
/// Section holding the bzImage.
pub const KERNEL_SECTION: &str = "__vmlinuz";
/// Section holding the initial ramdisk.
pub const INITRD_SECTION: &str = "__initrd";

/// Name-based lookup of payloads embedded in the loader image.
pub trait PayloadStore {
    /// The contents of `segment,section`, if present.
    fn section(&self, segment: &str, section: &str) -> Option<&[u8]>;

    fn kernel(&self) -> Option<&[u8]> {
        self.section(TEXT_SEGMENT, KERNEL_SECTION)
            .filter(|bytes| !bytes.is_empty())
    }

    fn initrd(&self) -> Option<&[u8]> {
        self.section(TEXT_SEGMENT, INITRD_SECTION)
            .filter(|bytes| !bytes.is_empty())
    }
}

/// The active graphics mode.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct VideoMode {
    pub base: u64,
    /// Bytes per scan line.
    pub pitch: u32,
    /// Reported width in pixels; not always reliable.
    pub width: u32,
    pub height: u32,
    /// Bits per pixel.
    pub depth: u32,
}

/// What the firmware tells us about the machine.
#[derive(Debug, Copy, Clone)]
pub struct FirmwareEnvironment<'a> {
    /// Handed to the kernel by address, not copied.
    pub command_line: &'a CStr,
    pub system_table: u64,
    pub memory_map: EfiMemoryMap<'a>,
    pub video: VideoMode,
    pub config_tables: ConfigTables<'a>,
}

/// Video block of [`MachBootArgs`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MachVideo {
    pub base_address: u32,
    pub display_mode: u32,
    pub pitch: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

pub const MACH_COMMAND_LINE_LEN: usize = 1024;

/// Boot-argument block of the primary (Mach-O) loader, EFI32 flavour.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct MachBootArgs {
    pub revision: u16,
    pub version: u16,
    pub command_line: [u8; MACH_COMMAND_LINE_LEN],
    pub efi_memory_map: u32,
    pub efi_memory_map_size: u32,
    pub efi_memory_descriptor_size: u32,
    pub efi_memory_descriptor_version: u32,
    pub video: MachVideo,
    pub device_tree: u32,
    pub device_tree_length: u32,
    pub kernel_address: u32,
    pub kernel_size: u32,
    pub efi_runtime_services_page_start: u32,
    pub efi_runtime_services_page_count: u32,
    pub efi_system_table: u32,
    pub efi_mode: u8,
    pub _reserved1: [u8; 3],
    pub _reserved2: [u32; 7],
}

impl MachBootArgs {
    /// The NUL-terminated command line, or an empty one if it is not terminated.
    #[must_use]
    pub fn command_line(&self) -> &CStr {
        CStr::from_bytes_until_nul(&self.command_line).unwrap_or_default()
    }

    #[must_use]
    pub const fn video_mode(&self) -> VideoMode {
        VideoMode {
            base: self.video.base_address as u64,
            pitch: self.video.pitch,
            width: self.video.width,
            height: self.video.height,
            depth: self.video.depth,
        }
    }

    /// Collects the firmware environment the block points at.
    ///
    /// # Errors
    /// Fails if the memory map stride is too small for a descriptor.
    ///
    /// # Safety
    /// The memory map, the EFI system table and its configuration table must
    /// be identity-mapped, readable and stay unmodified for the lifetime of `self`.
    pub unsafe fn environment(&self) -> Result<FirmwareEnvironment<'_>, BootError> {
        let memory_map = unsafe {
            EfiMemoryMap::from_raw(
                self.efi_memory_map as usize as *const u8,
                self.efi_memory_map_size as usize,
                self.efi_memory_descriptor_size as usize,
                self.efi_memory_descriptor_version,
            )?
        };

        let system_table = self.efi_system_table as usize as *const u8;
        // SAFETY: upheld by the caller.
        let header = unsafe { core::slice::from_raw_parts(system_table, EFI32_SYSTEM_TABLE_SIZE) };
        let (count, tables) = config_table_location(header);
        let config_tables =
            unsafe { ConfigTables::from_raw(tables as usize as *const u8, count, TableLayout::Efi32) };

        Ok(FirmwareEnvironment {
            command_line: self.command_line(),
            system_table: u64::from(self.efi_system_table),
            memory_map,
            video: self.video_mode(),
            config_tables,
        })
    }
}

/// Size of a 32-bit EFI system table.
const EFI32_SYSTEM_TABLE_SIZE: usize = 0x48;
const NR_TABLES_OFFSET: usize = 0x40;
const TABLES_OFFSET: usize = 0x44;

/// Number of configuration table entries and their address, from a 32-bit EFI
/// system table.
fn config_table_location(system_table: &[u8]) -> (usize, u32) {
    let read = |off: usize| {
        u32::from_le_bytes([
            system_table[off],
            system_table[off + 1],
            system_table[off + 2],
            system_table[off + 3],
        ])
    };
    (read(NR_TABLES_OFFSET) as usize, read(TABLES_OFFSET))
}

const _: () = {
    assert!(core::mem::size_of::<MachVideo>() == 24);
    assert!(core::mem::offset_of!(MachBootArgs, efi_memory_map) == 0x404);
    assert!(core::mem::offset_of!(MachBootArgs, video) == 0x414);
    assert!(core::mem::offset_of!(MachBootArgs, efi_system_table) == 0x444);
    assert!(core::mem::offset_of!(MachBootArgs, efi_mode) == 0x448);
};
