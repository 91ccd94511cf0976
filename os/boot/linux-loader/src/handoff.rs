//! # Control Transfer
//!
//! Entering the kernel is a single irreversible step. It is isolated behind
//! [`Commit`] so that the rest of the sequence stays ordinary, testable code.
//!
//! Register contract of the 32-bit boot protocol at entry:
//!
//! ```text
//! eflags.IF = 0       interrupts disabled
//! IDTR      = {0, 0}
//! GDTR      = flat table with __BOOT_CS/__BOOT_DS (0x10/0x18)
//! esi       = &boot_params
//! ecx       = kernel entry (code32_start)
//! ebx       = 0
//! ```

use crate::gdt::DescriptorTablePointer;
use boot_params::BootParams;

/// Everything the kernel finds in registers and descriptor tables at entry.
#[derive(Clone, Copy)]
pub struct EntryState<'a> {
    pub boot_params: &'a BootParams,
    pub kernel_entry: u32,
    pub gdt: DescriptorTablePointer,
    pub idt: DescriptorTablePointer,
}

/// The final transfer of control.
///
/// Precondition: the kernel is relocated, the zero page is fully built and the
/// descriptor table region is primed. A real implementation does not return.
pub trait Commit {
    type Outcome;

    fn commit(&mut self, state: &EntryState<'_>) -> Self::Outcome;
}

/// Jumps into a relocated 32-bit Linux kernel.
#[cfg(target_arch = "x86")]
pub struct LinuxEntry {
    _private: (),
}

#[cfg(target_arch = "x86")]
impl LinuxEntry {
    /// # Safety
    /// Must run in 32-bit protected mode with paging off, and only after the
    /// kernel has been relocated and its descriptor table region primed.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(target_arch = "x86")]
impl Commit for LinuxEntry {
    type Outcome = core::convert::Infallible;

    #[allow(clippy::cast_possible_truncation)]
    fn commit(&mut self, state: &EntryState<'_>) -> Self::Outcome {
        let boot_params = core::ptr::from_ref(state.boot_params) as usize as u32;
        // SAFETY: guaranteed by `LinuxEntry::new` and the `Commit` precondition.
        unsafe { enter_kernel(boot_params, state.kernel_entry, &state.gdt, &state.idt) }
    }
}

#[cfg(target_arch = "x86")]
unsafe fn enter_kernel(
    boot_params: u32,
    kernel_entry: u32,
    gdt: &DescriptorTablePointer,
    idt: &DescriptorTablePointer,
) -> ! {
    log::info!("Handing off to the kernel at {kernel_entry:#x}");
    unsafe {
        core::arch::asm!(
            "cli",
            "lidt   [{idt}]",
            "lgdt   [{gdt}]",
            // esi is reserved by the compiler on x86, so it cannot be an operand.
            "mov    esi, {bp}",
            "xor    ebx, ebx",
            "jmp    ecx",
            idt = in(reg) core::ptr::from_ref(idt),
            gdt = in(reg) core::ptr::from_ref(gdt),
            bp = in(reg) boot_params,
            in("ecx") kernel_entry,
            options(noreturn)
        )
    }
}

/// Stops this CPU for good.
pub fn halt() -> ! {
    loop {
        park();
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn park() {
    // SAFETY: masks interrupts and waits; never touches memory.
    unsafe {
        core::arch::asm!("cli", "hlt", options(nomem, nostack));
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn park() {
    core::hint::spin_loop();
}
