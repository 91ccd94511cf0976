//! # Physical Memory Access
//!
//! The sequencer writes to fixed physical addresses (the kernel load address and
//! the descriptor table region). Those writes go through [`PhysicalMemory`] so
//! that everything up to the final jump can run against a fake in tests.

/// Write access to physical memory.
pub trait PhysicalMemory {
    /// Copies `src` to `dst..dst + src.len()`.
    fn copy_to(&mut self, dst: u64, src: &[u8]);

    /// Sets `dst..dst + len` to `value`.
    fn fill(&mut self, dst: u64, len: usize, value: u8);
}

/// Physical memory as seen by the loader itself: flat 32-bit protected mode
/// without paging, so physical and linear addresses coincide.
pub struct IdentityMapped {
    _private: (),
}

impl IdentityMapped {
    /// # Safety
    /// Physical addresses must be identity-mapped and every range written
    /// through this handle must be RAM that nothing else uses.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl PhysicalMemory for IdentityMapped {
    #[allow(clippy::cast_possible_truncation)]
    fn copy_to(&mut self, dst: u64, src: &[u8]) {
        let dst = dst as usize as *mut u8;
        // SAFETY: see `IdentityMapped::new`. The payload may overlap its destination.
        unsafe { core::ptr::copy(src.as_ptr(), dst, src.len()) }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn fill(&mut self, dst: u64, len: usize, value: u8) {
        let dst = dst as usize as *mut u8;
        // SAFETY: see `IdentityMapped::new`.
        unsafe { core::ptr::write_bytes(dst, value, len) }
    }
}
