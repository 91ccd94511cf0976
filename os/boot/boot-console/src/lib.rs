//! # Debug Port Console
//!
//! Byte-oriented diagnostic output for the loader, usable before and after the
//! firmware's own console services are gone.
//!
//! ## Output Mechanism
//! ```text
//! log::info!() / console_trace!()
//!     ↓
//! ConsoleLogger (log::Log) / console_fmt::console_write
//!     ↓
//! DebugPort (fmt::Write)
//!     ↓
//! out dx, al → 0x402 (QEMU -debugcon) or 0x3F8 (COM1)
//! ```
//!
//! The target port is configured once by [`ConsoleLogger::init`]. Until then,
//! and whenever the `enabled` feature is off, all output is discarded.
//!
//! ## Verbosity
//!
//! Warnings and errors are always emitted. Everything else is only emitted when
//! the loader runs in verbose mode, i.e. when the command line carries a
//! standalone `-v` (see [`Verbosity::from_command_line`]).
//!
//! ## Usage
//! ```rust,no_run
//! use boot_console::{ConsoleLogger, QEMU_DEBUG_PORT, Verbosity};
//!
//! let verbosity = Verbosity::from_command_line(b"console=ttyS0 -v");
//! ConsoleLogger::init(QEMU_DEBUG_PORT, verbosity).expect("logger installed once");
//! log::info!("Loader started");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::{ConsoleLogger, Verbosity};

/// QEMU's debug console port (`-debugcon`).
pub const QEMU_DEBUG_PORT: u16 = 0x402;

/// Data register of the first legacy serial port.
pub const COM1_PORT: u16 = 0x3F8;

#[cfg(feature = "enabled")]
#[doc(hidden)]
pub mod console_fmt {
    use core::fmt::{self, Write};
    use core::sync::atomic::{AtomicU16, Ordering};

    /// Port `0` means "not configured"; nothing is written.
    static PORT: AtomicU16 = AtomicU16::new(0);

    pub fn set_port(port: u16) {
        PORT.store(port, Ordering::Relaxed);
    }

    #[must_use]
    pub fn port() -> u16 {
        PORT.load(Ordering::Relaxed)
    }

    /// An output-only I/O port.
    pub struct DebugPort(u16);

    impl DebugPort {
        #[must_use]
        pub const fn new(port: u16) -> Self {
            Self(port)
        }

        #[allow(clippy::inline_always)]
        #[inline(always)]
        pub fn write_byte(&self, b: u8) {
            unsafe { outb(self.0, b) }
        }
    }

    impl Write for DebugPort {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for b in s.bytes() {
                self.write_byte(b);
            }
            Ok(())
        }
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    #[allow(clippy::inline_always)]
    #[inline(always)]
    unsafe fn outb(port: u16, val: u8) {
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") port,
                in("al") val,
                options(nomem, nostack, preserves_flags)
            );
        }
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    #[allow(clippy::inline_always)]
    #[inline(always)]
    const unsafe fn outb(_port: u16, _val: u8) {}

    #[doc(hidden)]
    pub fn console_write(args: fmt::Arguments) {
        let port = port();
        if port == 0 {
            return;
        }
        // Best-effort output.
        let _ = fmt::write(&mut DebugPort::new(port), args);
    }
}

#[cfg(not(feature = "enabled"))]
#[doc(hidden)]
pub mod console_fmt {
    use core::fmt;

    pub const fn set_port(_port: u16) {}

    #[must_use]
    pub const fn port() -> u16 {
        0
    }

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn console_write(_: fmt::Arguments) {}
}

/// Raw, unfiltered output to the configured debug port.
#[macro_export]
macro_rules! console_trace {
    ($($arg:tt)*) => {{
        $crate::console_fmt::console_write(core::format_args!($($arg)*));
    }};
}
