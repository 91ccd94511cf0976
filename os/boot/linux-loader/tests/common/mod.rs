#![allow(dead_code)]

use boot_mmap::{EfiMemoryMap, PAGE_SIZE};
use boot_params::BootParams;
use linux_loader::gdt::DescriptorTablePointer;
use linux_loader::rsdp::{ACPI_GUID, ACPI2_GUID, ConfigTables, TableLayout};
use linux_loader::{Commit, EntryState, FirmwareEnvironment, PayloadStore, PhysicalMemory, VideoMode};
use std::collections::BTreeMap;
use std::ffi::CStr;
use uefi::boot::MemoryType;
use uefi::{Guid, guid};

pub const STRIDE: usize = 48;
pub const SYSTEM_TABLE: u64 = 0x7FE0_1000;
pub const RSDP_V1: u32 = 0x000E_0000;
pub const RSDP_V2: u32 = 0x7FEF_E014;
pub const COMMAND_LINE: &CStr = c"root=/dev/sda1 console=tty0 -v";

const SMBIOS_GUID: Guid = guid!("eb9d2d31-2d88-11d3-9a16-0090273fc14d");

/// Physical memory that only remembers what was written to it.
#[derive(Default)]
pub struct FakeMemory {
    bytes: BTreeMap<u64, u8>,
}

impl FakeMemory {
    pub fn is_untouched(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_written(&self, addr: u64) -> bool {
        self.bytes.contains_key(&addr)
    }

    /// Unwritten bytes read as `None`.
    pub fn read(&self, addr: u64, len: usize) -> Vec<Option<u8>> {
        (addr..addr + len as u64)
            .map(|a| self.bytes.get(&a).copied())
            .collect()
    }
}

impl PhysicalMemory for FakeMemory {
    fn copy_to(&mut self, dst: u64, src: &[u8]) {
        for (a, &b) in (dst..).zip(src) {
            self.bytes.insert(a, b);
        }
    }

    fn fill(&mut self, dst: u64, len: usize, value: u8) {
        for a in dst..dst + len as u64 {
            self.bytes.insert(a, value);
        }
    }
}

/// What the kernel would have found at entry.
pub struct Entered {
    pub boot_params: BootParams,
    pub boot_params_addr: usize,
    pub kernel_entry: u32,
    pub gdt: DescriptorTablePointer,
    pub idt: DescriptorTablePointer,
}

#[derive(Default)]
pub struct RecordingCommit {
    pub commits: usize,
}

impl Commit for RecordingCommit {
    type Outcome = Entered;

    fn commit(&mut self, state: &EntryState<'_>) -> Entered {
        self.commits += 1;
        Entered {
            boot_params: *state.boot_params,
            boot_params_addr: std::ptr::from_ref(state.boot_params) as usize,
            kernel_entry: state.kernel_entry,
            gdt: state.gdt,
            idt: state.idt,
        }
    }
}

pub struct Payloads {
    pub kernel: Option<Vec<u8>>,
    pub initrd: Option<Vec<u8>>,
}

impl PayloadStore for Payloads {
    fn section(&self, segment: &str, section: &str) -> Option<&[u8]> {
        match (segment, section) {
            ("__TEXT", "__vmlinuz") => self.kernel.as_deref(),
            ("__TEXT", "__initrd") => self.initrd.as_deref(),
            _ => None,
        }
    }
}

pub const KERNEL_VERSION: &str = "6.1.0-atv (builder@host) #1 SMP";

/// A minimal bzImage: protocol 2.15, loads high, quiet flag set.
pub fn bzimage(setup_sects: u8, payload_len: usize) -> Vec<u8> {
    let setup_size = (usize::from(setup_sects) + 1) * 512;
    let mut k = vec![0u8; setup_size + payload_len];
    k[0x1F1] = setup_sects;
    k[0x1FE..0x200].copy_from_slice(&0xAA55u16.to_le_bytes());
    k[0x200] = 0xEB;
    k[0x201] = 0x6A;
    k[0x202..0x206].copy_from_slice(b"HdrS");
    k[0x206..0x208].copy_from_slice(&0x020Fu16.to_le_bytes());
    k[0x20E..0x210].copy_from_slice(&0x0120u16.to_le_bytes());
    k[0x211] = 0b0010_0001;
    k[0x214..0x218].copy_from_slice(&0x0010_0000u32.to_le_bytes());
    k[0x238..0x23C].copy_from_slice(&2048u32.to_le_bytes());
    k[0x320..0x320 + KERNEL_VERSION.len()].copy_from_slice(KERNEL_VERSION.as_bytes());
    for (i, b) in k[setup_size..].iter_mut().enumerate() {
        *b = (i % 251) as u8;
    }
    k
}

pub fn memory_map(regions: &[(MemoryType, u64, u64)]) -> Vec<u8> {
    let mut raw = Vec::new();
    for &(ty, start, end) in regions {
        let mut desc = [0u8; STRIDE];
        desc[0..4].copy_from_slice(&ty.0.to_le_bytes());
        desc[8..16].copy_from_slice(&start.to_le_bytes());
        desc[24..32].copy_from_slice(&((end - start) / PAGE_SIZE).to_le_bytes());
        raw.extend_from_slice(&desc);
    }
    raw
}

pub fn default_regions() -> Vec<(MemoryType, u64, u64)> {
    vec![
        (MemoryType::CONVENTIONAL, 0x0, 0x9_F000),
        (MemoryType::RESERVED, 0x9_F000, 0xA_0000),
        (MemoryType::LOADER_DATA, 0xC_0000, 0x20_0000),
        (MemoryType::CONVENTIONAL, 0x20_0000, 0x7F0_0000),
        (MemoryType::ACPI_RECLAIM, 0x7F0_0000, 0x7F1_0000),
        (MemoryType::ACPI_NON_VOLATILE, 0x7F1_0000, 0x7F2_0000),
        (MemoryType::MMIO, 0xFEC0_0000, 0xFEC0_1000),
    ]
}

pub fn config_tables(entries: &[(Guid, u32)]) -> Vec<u8> {
    let mut raw = Vec::new();
    for (guid, addr) in entries {
        raw.extend_from_slice(&guid.to_bytes());
        raw.extend_from_slice(&addr.to_le_bytes());
    }
    raw
}

pub fn default_tables() -> Vec<(Guid, u32)> {
    vec![
        (SMBIOS_GUID, 0x7FED_0000),
        (ACPI_GUID, RSDP_V1),
        (ACPI2_GUID, RSDP_V2),
    ]
}

pub const VIDEO: VideoMode = VideoMode {
    base: 0x4000_0000,
    pitch: 5120,
    width: 1279,
    height: 720,
    depth: 32,
};

/// Owns the raw firmware buffers an environment borrows from.
pub struct Firmware {
    pub memory_map: Vec<u8>,
    pub config_tables: Vec<u8>,
}

impl Firmware {
    pub fn new(regions: &[(MemoryType, u64, u64)], tables: &[(Guid, u32)]) -> Self {
        Self {
            memory_map: memory_map(regions),
            config_tables: config_tables(tables),
        }
    }

    pub fn standard() -> Self {
        Self::new(&default_regions(), &default_tables())
    }

    pub fn env(&self) -> FirmwareEnvironment<'_> {
        FirmwareEnvironment {
            command_line: COMMAND_LINE,
            system_table: SYSTEM_TABLE,
            memory_map: EfiMemoryMap::new(&self.memory_map, STRIDE, 1).expect("valid stride"),
            video: VIDEO,
            config_tables: ConfigTables::new(&self.config_tables, TableLayout::Efi32),
        }
    }
}
