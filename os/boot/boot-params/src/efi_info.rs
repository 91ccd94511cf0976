//! # Firmware (EFI) Section

use core::mem::size_of;

/// `efi_info` at offset `0x1c0` of the zero page.
///
/// Pointers are split into a low and a high half; a 32-bit firmware leaves the
/// `*_hi` fields zero.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EfiInfo {
    pub efi_loader_signature: u32,
    pub efi_systab: u32,
    pub efi_memdesc_size: u32,
    pub efi_memdesc_version: u32,
    pub efi_memmap: u32,
    pub efi_memmap_size: u32,
    pub efi_systab_hi: u32,
    pub efi_memmap_hi: u32,
}

impl EfiInfo {
    #[must_use]
    pub const fn loader_signature(&self) -> [u8; 4] {
        self.efi_loader_signature.to_le_bytes()
    }

    pub const fn set_loader_signature(&mut self, signature: [u8; 4]) {
        self.efi_loader_signature = u32::from_le_bytes(signature);
    }

    #[must_use]
    pub const fn system_table(&self) -> u64 {
        ((self.efi_systab_hi as u64) << 32) | self.efi_systab as u64
    }

    #[must_use]
    pub const fn memory_map(&self) -> u64 {
        ((self.efi_memmap_hi as u64) << 32) | self.efi_memmap as u64
    }
}

const _: () = {
    assert!(size_of::<EfiInfo>() == 0x20);
};
