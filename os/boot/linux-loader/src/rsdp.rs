//! # Root/Extended System Description Pointer

use crate::error::DiscoveryError;
use log::info;
use uefi::{Guid, guid};

pub const ACPI_GUID: Guid = guid!("eb9d2d30-2d88-11d3-9a16-0090273fc14d");
pub const ACPI2_GUID: Guid = guid!("8868e871-e4f1-11d3-bc22-0080c73c8881");

/// Pointer width of the firmware that produced the configuration table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TableLayout {
    /// 16-byte GUID followed by a 32-bit pointer.
    Efi32,
    /// 16-byte GUID followed by a 64-bit pointer.
    Efi64,
}

impl TableLayout {
    #[must_use]
    pub const fn entry_size(self) -> usize {
        match self {
            Self::Efi32 => 20,
            Self::Efi64 => 24,
        }
    }
}

/// The firmware's configuration table: an array of `(GUID, pointer)` pairs.
#[derive(Debug, Copy, Clone)]
pub struct ConfigTables<'a> {
    bytes: &'a [u8],
    layout: TableLayout,
}

impl<'a> ConfigTables<'a> {
    /// A trailing partial entry is ignored.
    #[must_use]
    pub const fn new(bytes: &'a [u8], layout: TableLayout) -> Self {
        Self { bytes, layout }
    }

    /// # Safety
    /// `ptr` must point to `count` readable entries of the given layout that
    /// stay unmodified for `'a`.
    #[must_use]
    pub unsafe fn from_raw(ptr: *const u8, count: usize, layout: TableLayout) -> Self {
        let len = count.saturating_mul(layout.entry_size());
        // SAFETY: upheld by the caller.
        let bytes = unsafe { core::slice::from_raw_parts(ptr, len) };
        Self::new(bytes, layout)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len() / self.layout.entry_size()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(vendor GUID, table address)` pairs in firmware order.
    pub fn iter(&self) -> impl Iterator<Item = (Guid, u64)> + use<'a> {
        let layout = self.layout;
        self.bytes
            .chunks_exact(layout.entry_size())
            .map(move |entry| decode(entry, layout))
    }
}

fn decode(entry: &[u8], layout: TableLayout) -> (Guid, u64) {
    let mut guid = [0u8; 16];
    guid.copy_from_slice(&entry[..16]);
    let address = match layout {
        TableLayout::Efi32 => {
            u64::from(u32::from_le_bytes([entry[16], entry[17], entry[18], entry[19]]))
        }
        TableLayout::Efi64 => u64::from_le_bytes([
            entry[16], entry[17], entry[18], entry[19], entry[20], entry[21], entry[22], entry[23],
        ]),
    };
    (Guid::from_bytes(guid), address)
}

/// Returns the physical address of the RSDP, preferring ACPI 2.0 over ACPI 1.0.
///
/// # Errors
/// [`DiscoveryError::RsdpNotFound`] if neither table is present.
pub fn find_rsdp(tables: &ConfigTables<'_>) -> Result<u64, DiscoveryError> {
    let lookup = |wanted: Guid| {
        tables
            .iter()
            .find(|&(guid, address)| guid == wanted && address != 0)
            .map(|(_, address)| address)
    };

    if let Some(address) = lookup(ACPI2_GUID) {
        info!("Using ACPI 2.0 found at {address:#x}");
        return Ok(address);
    }
    if let Some(address) = lookup(ACPI_GUID) {
        info!("Using ACPI 1.0 found at {address:#x}");
        return Ok(address);
    }
    Err(DiscoveryError::RsdpNotFound)
}
