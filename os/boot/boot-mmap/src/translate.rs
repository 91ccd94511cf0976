//! # Descriptor classification and translation

use crate::efi_map::FirmwareMemoryDescriptor;
use crate::table::{CapacityError, E820Table};
use boot_params::layout::{LOW_MEMORY_HOLE_END, LOW_MEMORY_HOLE_START};
use boot_params::{E820Entry, E820Type};
use log::{debug, warn};
use uefi::boot::MemoryType;

/// What becomes of a firmware descriptor in the legacy table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Disposition {
    AcpiReclaim,
    Reserved,
    /// Usable RAM, subject to the low-memory hole fix-up.
    Usable,
    AcpiNvs,
    /// A type without a legacy counterpart; emitted as reserved.
    Unrecognized,
}

impl Disposition {
    #[must_use]
    pub fn classify(ty: MemoryType) -> Self {
        match ty {
            MemoryType::ACPI_RECLAIM => Self::AcpiReclaim,
            MemoryType::RUNTIME_SERVICES_CODE
            | MemoryType::RUNTIME_SERVICES_DATA
            | MemoryType::RESERVED
            | MemoryType::MMIO
            | MemoryType::MMIO_PORT_SPACE
            | MemoryType::UNUSABLE
            | MemoryType::PAL_CODE => Self::Reserved,
            MemoryType::LOADER_CODE
            | MemoryType::LOADER_DATA
            | MemoryType::BOOT_SERVICES_CODE
            | MemoryType::BOOT_SERVICES_DATA
            | MemoryType::CONVENTIONAL => Self::Usable,
            MemoryType::ACPI_NON_VOLATILE => Self::AcpiNvs,
            _ => Self::Unrecognized,
        }
    }

    #[must_use]
    pub const fn e820_type(self) -> E820Type {
        match self {
            Self::AcpiReclaim => E820Type::Acpi,
            Self::Reserved | Self::Unrecognized => E820Type::Reserved,
            Self::Usable => E820Type::Ram,
            Self::AcpiNvs => E820Type::Nvs,
        }
    }
}

/// Outcome of a successful [`translate`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Translation {
    /// Number of populated table entries.
    pub entries: usize,
    /// Number of descriptors whose type had no legacy counterpart.
    pub unrecognized: usize,
}

/// Translates firmware descriptors into the legacy table held in `storage`.
///
/// # Errors
/// Returns [`CapacityError`] as soon as a region needs an entry beyond the end
/// of `storage`. Entries written up to that point are left in place.
pub fn translate<I>(descriptors: I, storage: &mut [E820Entry]) -> Result<Translation, CapacityError>
where
    I: IntoIterator<Item = FirmwareMemoryDescriptor>,
{
    let mut table = E820Table::new(storage);
    let mut unrecognized = 0;

    for desc in descriptors {
        let (start, end) = (desc.phys_start, desc.end());
        let disposition = Disposition::classify(desc.ty);
        match disposition {
            Disposition::Usable => add_usable(&mut table, start, end)?,
            Disposition::Unrecognized => {
                warn!(
                    "Unexpected memory type {:?} at {start:#x}..{end:#x}, treating as reserved",
                    desc.ty
                );
                unrecognized += 1;
                table.push(start, end - start, disposition.e820_type())?;
            }
            _ => table.push(start, end - start, disposition.e820_type())?,
        }
    }

    Ok(Translation {
        entries: table.len(),
        unrecognized,
    })
}

/// Adds usable RAM, cutting out the legacy video/BIOS hole.
fn add_usable(table: &mut E820Table<'_>, mut start: u64, end: u64) -> Result<(), CapacityError> {
    if start < LOW_MEMORY_HOLE_END && end > LOW_MEMORY_HOLE_START {
        if start < LOW_MEMORY_HOLE_START {
            table.push(start, LOW_MEMORY_HOLE_START - start, E820Type::Ram)?;
        }
        if end <= LOW_MEMORY_HOLE_END {
            return Ok(());
        }
        start = LOW_MEMORY_HOLE_END;
    }
    table.push(start, end - start, E820Type::Ram)
}

/// Dumps the table at debug level, one line per region.
pub fn log_e820_table(entries: &[E820Entry]) {
    for entry in entries {
        debug!("E820 Map: {entry}");
    }
}
