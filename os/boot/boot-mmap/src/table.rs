//! # Coalescing legacy table builder

use boot_params::{E820Entry, E820Type};

/// The legacy table is full and the region could not be merged into the last entry.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("legacy memory map is full ({capacity} entries), cannot add {region}")]
pub struct CapacityError {
    pub capacity: usize,
    pub region: E820Entry,
}

/// Append-only view over caller-provided entry storage.
///
/// The storage is usually the zero page's own `e820_table`, so the table is
/// built in place and never copied.
pub struct E820Table<'t> {
    storage: &'t mut [E820Entry],
    len: usize,
}

impl<'t> E820Table<'t> {
    pub const fn new(storage: &'t mut [E820Entry]) -> Self {
        Self { storage, len: 0 }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.storage.len()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn as_slice(&self) -> &[E820Entry] {
        &self.storage[..self.len]
    }

    /// Adds `[addr, addr + size)` with the given type.
    ///
    /// Extends the last entry instead when it has the same type and ends
    /// exactly at `addr`. Empty regions are ignored.
    ///
    /// # Errors
    /// Returns [`CapacityError`] when a new entry is needed and none is left.
    pub fn push(&mut self, addr: u64, size: u64, kind: E820Type) -> Result<(), CapacityError> {
        if size == 0 {
            return Ok(());
        }

        if let Some(last) = self.len.checked_sub(1).map(|i| &mut self.storage[i]) {
            let (typ, end) = (last.typ, last.end());
            if typ == kind.as_raw() && end == addr {
                last.size = last.size.saturating_add(size);
                return Ok(());
            }
        }

        let region = E820Entry::new(addr, size, kind);
        let Some(slot) = self.storage.get_mut(self.len) else {
            return Err(CapacityError {
                capacity: self.storage.len(),
                region,
            });
        };
        *slot = region;
        self.len += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_only_with_last_entry() {
        let mut storage = [E820Entry::ZERO; 4];
        let mut table = E820Table::new(&mut storage);
        table.push(0x0, 0x1000, E820Type::Ram).unwrap();
        table.push(0x1000, 0x1000, E820Type::Ram).unwrap();
        table.push(0x3000, 0x1000, E820Type::Ram).unwrap();
        table.push(0x4000, 0x1000, E820Type::Reserved).unwrap();
        // Adjacent to the first entry, but not to the last.
        table.push(0x2000, 0x1000, E820Type::Ram).unwrap();

        assert_eq!(
            table.as_slice(),
            &[
                E820Entry::new(0x0, 0x2000, E820Type::Ram),
                E820Entry::new(0x3000, 0x1000, E820Type::Ram),
                E820Entry::new(0x4000, 0x1000, E820Type::Reserved),
                E820Entry::new(0x2000, 0x1000, E820Type::Ram),
            ]
        );
    }

    #[test]
    fn full_table_still_accepts_merges() {
        let mut storage = [E820Entry::ZERO; 1];
        let mut table = E820Table::new(&mut storage);
        table.push(0x0, 0x1000, E820Type::Ram).unwrap();
        table.push(0x1000, 0x1000, E820Type::Ram).unwrap();

        let err = table.push(0x8000, 0x1000, E820Type::Ram).unwrap_err();
        assert_eq!(err.capacity, 1);
        assert_eq!(err.region, E820Entry::new(0x8000, 0x1000, E820Type::Ram));
        assert_eq!(table.len(), 1);
        assert_eq!(table.as_slice()[0], E820Entry::new(0x0, 0x2000, E820Type::Ram));
    }

    #[test]
    fn ignores_empty_regions() {
        let mut storage = [E820Entry::ZERO; 1];
        let mut table = E820Table::new(&mut storage);
        table.push(0x5000, 0, E820Type::Acpi).unwrap();
        assert!(table.is_empty());
    }
}
