//! # Stride-based view of the firmware memory map

use uefi::boot::MemoryType;

/// Firmware page size; descriptor page counts are in these units.
pub const PAGE_SIZE: u64 = 4096;

/// Size of the descriptor fields we decode. Firmware strides are at least this large.
pub const EFI_MEMORY_DESCRIPTOR_SIZE: usize = 40;

const TYPE_OFFSET: usize = 0;
const PHYS_START_OFFSET: usize = 8;
const PAGE_COUNT_OFFSET: usize = 24;

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum MapLayoutError {
    #[error("descriptor stride {0} is smaller than a memory descriptor")]
    StrideTooSmall(usize),
}

/// One decoded firmware memory descriptor.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FirmwareMemoryDescriptor {
    pub ty: MemoryType,
    pub phys_start: u64,
    pub page_count: u64,
}

impl FirmwareMemoryDescriptor {
    #[must_use]
    pub const fn new(ty: MemoryType, phys_start: u64, page_count: u64) -> Self {
        Self {
            ty,
            phys_start,
            page_count,
        }
    }

    /// Region length in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.page_count.saturating_mul(PAGE_SIZE)
    }

    /// Exclusive end address.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.phys_start.saturating_add(self.size())
    }
}

/// A borrowed firmware memory map.
///
/// The descriptor count is `bytes.len() / desc_size`; a trailing partial
/// descriptor is ignored.
#[derive(Debug, Copy, Clone)]
pub struct EfiMemoryMap<'a> {
    bytes: &'a [u8],
    desc_size: usize,
    desc_version: u32,
}

impl<'a> EfiMemoryMap<'a> {
    /// Wraps a raw memory map buffer.
    ///
    /// # Errors
    /// Fails if `desc_size` cannot hold a descriptor.
    pub const fn new(
        bytes: &'a [u8],
        desc_size: usize,
        desc_version: u32,
    ) -> Result<Self, MapLayoutError> {
        if desc_size < EFI_MEMORY_DESCRIPTOR_SIZE {
            return Err(MapLayoutError::StrideTooSmall(desc_size));
        }
        Ok(Self {
            bytes,
            desc_size,
            desc_version,
        })
    }

    /// Wraps the memory map the firmware left at `ptr`.
    ///
    /// # Errors
    /// Fails if `desc_size` cannot hold a descriptor.
    ///
    /// # Safety
    /// `ptr..ptr + map_size` must be readable and stay unmodified for `'a`.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw(
        ptr: *const u8,
        map_size: usize,
        desc_size: usize,
        desc_version: u32,
    ) -> Result<Self, MapLayoutError> {
        // SAFETY: upheld by the caller.
        let bytes = unsafe { core::slice::from_raw_parts(ptr, map_size) };
        Self::new(bytes, desc_size, desc_version)
    }

    /// Total size of the map in bytes, as reported by the firmware.
    #[must_use]
    pub const fn map_size(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn desc_size(&self) -> usize {
        self.desc_size
    }

    #[must_use]
    pub const fn desc_version(&self) -> u32 {
        self.desc_version
    }

    /// Start of the underlying buffer.
    #[must_use]
    pub const fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len() / self.desc_size
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptors in firmware order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = FirmwareMemoryDescriptor> + use<'a> {
        self.bytes.chunks_exact(self.desc_size).map(decode)
    }
}

impl<'a> IntoIterator for &EfiMemoryMap<'a> {
    type Item = FirmwareMemoryDescriptor;
    type IntoIter = core::iter::Map<
        core::slice::ChunksExact<'a, u8>,
        fn(&'a [u8]) -> FirmwareMemoryDescriptor,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.bytes
            .chunks_exact(self.desc_size)
            .map(decode as fn(&'a [u8]) -> FirmwareMemoryDescriptor)
    }
}

/// `desc` is at least [`EFI_MEMORY_DESCRIPTOR_SIZE`] bytes long.
fn decode(desc: &[u8]) -> FirmwareMemoryDescriptor {
    FirmwareMemoryDescriptor {
        ty: MemoryType(read_u32_le(desc, TYPE_OFFSET)),
        phys_start: read_u64_le(desc, PHYS_START_OFFSET),
        page_count: read_u64_le(desc, PAGE_COUNT_OFFSET),
    }
}

#[inline]
fn read_u32_le(buf: &[u8], off: usize) -> u32 {
    let s = &buf[off..off + 4];
    u32::from_le_bytes([s[0], s[1], s[2], s[3]])
}

#[inline]
fn read_u64_le(buf: &[u8], off: usize) -> u64 {
    let s = &buf[off..off + 8];
    u64::from_le_bytes([s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(stride: usize, ty: MemoryType, phys: u64, pages: u64) -> Vec<u8> {
        let mut raw = vec![0xAA; stride];
        raw[0..4].copy_from_slice(&ty.0.to_le_bytes());
        raw[4..8].fill(0);
        raw[8..16].copy_from_slice(&phys.to_le_bytes());
        raw[16..24].copy_from_slice(&0u64.to_le_bytes());
        raw[24..32].copy_from_slice(&pages.to_le_bytes());
        raw
    }

    #[test]
    fn walks_descriptors_by_stride() {
        let mut raw = descriptor(48, MemoryType::CONVENTIONAL, 0x1000, 8);
        raw.extend(descriptor(48, MemoryType::ACPI_RECLAIM, 0x10_0000, 1));
        raw.extend([0u8; 20]);

        let map = EfiMemoryMap::new(&raw, 48, 1).expect("valid stride");
        assert_eq!(map.len(), 2);
        let descs: Vec<_> = map.iter().collect();
        assert_eq!(
            descs,
            [
                FirmwareMemoryDescriptor::new(MemoryType::CONVENTIONAL, 0x1000, 8),
                FirmwareMemoryDescriptor::new(MemoryType::ACPI_RECLAIM, 0x10_0000, 1),
            ]
        );
        assert_eq!(descs[0].end(), 0x9000);
        assert_eq!((&map).into_iter().count(), 2);
    }

    #[test]
    fn rejects_short_stride() {
        assert_eq!(
            EfiMemoryMap::new(&[], 32, 1).err(),
            Some(MapLayoutError::StrideTooSmall(32))
        );
    }

    #[test]
    fn size_saturates() {
        let d = FirmwareMemoryDescriptor::new(MemoryType::CONVENTIONAL, u64::MAX - 1, u64::MAX);
        assert_eq!(d.size(), u64::MAX);
        assert_eq!(d.end(), u64::MAX);
    }
}
