//! # Legacy (E820) Memory Map Entries

use core::fmt;
use core::mem::size_of;

/// Region type of an [`E820Entry`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum E820Type {
    /// Usable RAM.
    Ram = 1,
    /// Reserved, do not touch.
    Reserved = 2,
    /// ACPI tables; reclaimable once the OS has parsed them.
    Acpi = 3,
    /// ACPI non-volatile storage; must be preserved across sleep states.
    Nvs = 4,
    /// Known-bad memory.
    Unusable = 5,
    /// Persistent memory.
    Pmem = 7,
}

impl E820Type {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            1 => Self::Ram,
            2 => Self::Reserved,
            3 => Self::Acpi,
            4 => Self::Nvs,
            5 => Self::Unusable,
            7 => Self::Pmem,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for E820Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ram => "usable",
            Self::Reserved => "reserved",
            Self::Acpi => "ACPI data",
            Self::Nvs => "ACPI NVS",
            Self::Unusable => "unusable",
            Self::Pmem => "persistent",
        })
    }
}

/// One entry of the zero page's `e820_table`.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct E820Entry {
    pub addr: u64,
    pub size: u64,
    pub typ: u32,
}

impl E820Entry {
    pub const ZERO: Self = Self {
        addr: 0,
        size: 0,
        typ: 0,
    };

    #[must_use]
    pub const fn new(addr: u64, size: u64, typ: E820Type) -> Self {
        Self {
            addr,
            size,
            typ: typ.as_raw(),
        }
    }

    /// Exclusive end address, saturating at the top of the address space.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.addr.saturating_add(self.size)
    }

    #[must_use]
    pub const fn kind(&self) -> Option<E820Type> {
        E820Type::from_raw(self.typ)
    }
}

impl fmt::Display for E820Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = (self.addr, self.end());
        write!(f, "{start:#018x} - {end:#018x} ")?;
        match self.kind() {
            Some(kind) => write!(f, "({kind})"),
            None => {
                let raw = self.typ;
                write!(f, "type {raw}")
            }
        }
    }
}

const _: () = {
    assert!(size_of::<E820Entry>() == 20);
};
