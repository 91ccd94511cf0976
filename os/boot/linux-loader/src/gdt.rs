//! # Descriptor Tables for the 32-bit Kernel Entry
//!
//! The 32-bit boot protocol requires flat 4 GiB code and data segments at
//! selectors `0x10` and `0x18`. Kernels of the 2.5 era used `0x60`/`0x68`
//! instead, so those slots carry the same descriptors.
//!
//! Index | Selector | Meaning
//! ------|----------|--------
//! 0     | 0x00     | Null
//! 1     | 0x08     | Unused
//! 2     | 0x10     | Flat code, `__BOOT_CS`
//! 3     | 0x18     | Flat data, `__BOOT_DS`
//! 4-11  | 0x20-0x58| Unused
//! 12    | 0x60     | Flat code, 2.5.x `__KERNEL_CS`
//! 13    | 0x68     | Flat data, 2.5.x `__KERNEL_DS`

use bitfield_struct::bitfield;
use boot_params::layout::{GDT_BASE, GDT_REGION_SIZE};
use core::mem::size_of;

/// A legacy code/data segment descriptor.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct SegmentDescriptor {
    pub limit_lo: u16, // [15:0]
    pub base_lo: u16,  // [31:16]
    pub base_mid: u8,  // [39:32]
    #[bits(4)]
    pub typ: u8, // [43:40]
    pub s: bool,       // [44] code/data
    #[bits(2)]
    pub dpl: u8, // [46:45]
    pub p: bool,       // [47]
    #[bits(4)]
    pub limit_hi: u8, // [51:48]
    pub avl: bool,     // [52]
    pub l: bool,       // [53]
    pub db: bool,      // [54] 32-bit default operand size
    pub g: bool,       // [55] 4 KiB granularity
    pub base_hi: u8,   // [63:56]
}

impl SegmentDescriptor {
    const TYPE_CODE_EXEC_READ: u8 = 0b1010;
    const TYPE_DATA_READ_WRITE: u8 = 0b0010;

    /// Base 0, limit 4 GiB, ring 0, 32-bit.
    const fn flat(typ: u8) -> Self {
        Self::new()
            .with_limit_lo(0xFFFF)
            .with_typ(typ)
            .with_s(true)
            .with_dpl(0)
            .with_p(true)
            .with_limit_hi(0xF)
            .with_db(true)
            .with_g(true)
    }

    #[must_use]
    pub const fn flat_code() -> Self {
        Self::flat(Self::TYPE_CODE_EXEC_READ)
    }

    #[must_use]
    pub const fn flat_data() -> Self {
        Self::flat(Self::TYPE_DATA_READ_WRITE)
    }
}

pub const BOOT_CS: u16 = 0x10;
pub const BOOT_DS: u16 = 0x18;
pub const LEGACY_KERNEL_CS: u16 = 0x60;
pub const LEGACY_KERNEL_DS: u16 = 0x68;

/// The table written to [`GDT_BASE`] before the jump.
pub struct LinuxGdt;

impl LinuxGdt {
    pub const ENTRIES: usize = 14;
    pub const SIZE: usize = Self::ENTRIES * size_of::<u64>();

    #[must_use]
    pub const fn entries() -> [SegmentDescriptor; Self::ENTRIES] {
        let mut gdt = [SegmentDescriptor::new(); Self::ENTRIES];
        gdt[(BOOT_CS >> 3) as usize] = SegmentDescriptor::flat_code();
        gdt[(BOOT_DS >> 3) as usize] = SegmentDescriptor::flat_data();
        gdt[(LEGACY_KERNEL_CS >> 3) as usize] = SegmentDescriptor::flat_code();
        gdt[(LEGACY_KERNEL_DS >> 3) as usize] = SegmentDescriptor::flat_data();
        gdt
    }

    /// The table in memory order.
    #[must_use]
    pub const fn to_bytes() -> [u8; Self::SIZE] {
        let entries = Self::entries();
        let mut out = [0u8; Self::SIZE];
        let mut i = 0;
        while i < Self::ENTRIES {
            let raw = entries[i].into_bits().to_le_bytes();
            let mut j = 0;
            while j < raw.len() {
                out[i * 8 + j] = raw[j];
                j += 1;
            }
            i += 1;
        }
        out
    }

    /// `lgdt` operand for the region at [`GDT_BASE`].
    #[must_use]
    pub const fn pointer() -> DescriptorTablePointer {
        DescriptorTablePointer {
            limit: GDT_REGION_SIZE - 1,
            base: GDT_BASE,
        }
    }
}

/// Operand of `lgdt`/`lidt` in 32-bit mode.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorTablePointer {
    /// Size of the table minus one, in bytes.
    pub limit: u16,
    pub base: u32,
}

impl DescriptorTablePointer {
    /// The empty IDT: no interrupt may be taken until the kernel installs its own.
    pub const EMPTY: Self = Self { limit: 0, base: 0 };
}

const _: () = {
    assert!(size_of::<DescriptorTablePointer>() == 6);
    assert!(LinuxGdt::SIZE <= GDT_REGION_SIZE as usize);
    assert!(SegmentDescriptor::flat_code().into_bits() == 0x00CF_9A00_0000_FFFF);
    assert!(SegmentDescriptor::flat_data().into_bits() == 0x00CF_9200_0000_FFFF);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_protocol_slots_are_populated() {
        let entries = LinuxGdt::entries();
        for (i, desc) in entries.iter().enumerate() {
            let expected = match i {
                2 | 12 => 0x00CF_9A00_0000_FFFF,
                3 | 13 => 0x00CF_9200_0000_FFFF,
                _ => 0,
            };
            assert_eq!(desc.into_bits(), expected, "entry {i}");
        }
    }

    #[test]
    fn bytes_are_little_endian_descriptors() {
        let bytes = LinuxGdt::to_bytes();
        assert_eq!(bytes.len(), 112);
        assert_eq!(&bytes[0x10..0x18], &[0xFF, 0xFF, 0, 0, 0, 0x9A, 0xCF, 0]);
        assert_eq!(&bytes[0x68..0x70], &[0xFF, 0xFF, 0, 0, 0, 0x92, 0xCF, 0]);
        assert!(bytes[0x20..0x60].iter().all(|&b| b == 0));
    }

    #[test]
    fn pointer_covers_the_whole_region() {
        let ptr = LinuxGdt::pointer();
        let (limit, base) = (ptr.limit, ptr.base);
        assert_eq!(limit, 0x7FF);
        assert_eq!(base, 0x9_4000);
    }
}
