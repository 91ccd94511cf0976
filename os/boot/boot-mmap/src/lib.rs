//! # Firmware to Legacy Memory Map Translation
//!
//! Converts the memory map reported by EFI firmware into the coarser legacy
//! (E820) table that the x86 Linux boot protocol expects in the zero page.
//!
//! ## Overview
//!
//! Firmware reports physical memory as a sequence of descriptors, each carrying
//! a [`MemoryType`](uefi::boot::MemoryType), a physical start address and a page
//! count. The descriptors are laid out with a firmware-chosen *stride* that may
//! be larger than the nominal 40-byte descriptor, so the map is read as raw
//! bytes through [`EfiMemoryMap`] rather than as a typed array.
//!
//! ```text
//! EFI memory map (stride = desc_size)          legacy table (20-byte entries)
//!
//! ┌──────────┬─────┬───────┬─────────┐        ┌──────────┬────────┬──────┐
//! │ type u32 │ ... │ phys  │ pages   │ ─────► │ addr     │ size   │ type │
//! ├──────────┴─────┴───────┴─────────┤        ├──────────┼────────┼──────┤
//! │ (stride padding)                 │        │ ...      │        │      │
//! └──────────────────────────────────┘        └──────────┴────────┴──────┘
//! ```
//!
//! ## Translation rules
//!
//! * Each descriptor is classified into one [`Disposition`]. Types that have
//!   no legacy counterpart are reported as reserved and logged.
//! * Usable memory overlapping the legacy video/BIOS hole (`0xA0000..0x100000`)
//!   is split: the part below 640 KiB is kept, the part inside the hole is
//!   dropped, and anything above 1 MiB continues as a separate region.
//! * A region that starts exactly where the previously emitted region ends
//!   and has the same type is merged into it.
//! * The table has a fixed capacity; running out is a [`CapacityError`].
//!
//! Output order follows firmware order; the table is never sorted.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod efi_map;
mod table;
mod translate;

pub use efi_map::{
    EFI_MEMORY_DESCRIPTOR_SIZE, EfiMemoryMap, FirmwareMemoryDescriptor, MapLayoutError, PAGE_SIZE,
};
pub use table::{CapacityError, E820Table};
pub use translate::{Disposition, Translation, log_e820_table, translate};
