//! # Orchestration

use crate::error::{BootError, ImageError};
use crate::firmware::{FirmwareEnvironment, PayloadStore};
use crate::handoff::Commit;
use crate::phys_mem::PhysicalMemory;
use crate::sequencer::Handoff;
use boot_params::BootParams;

/// Boots the kernel found in `payloads`.
///
/// Returns the commit's outcome; with a real [`Commit`] this only ever
/// returns on error.
///
/// # Errors
/// Every fatal condition, before anything was committed.
pub fn boot_linux<P, M, C>(
    env: &FirmwareEnvironment<'_>,
    payloads: &P,
    params: &mut BootParams,
    mem: &mut M,
    commit: &mut C,
) -> Result<C::Outcome, BootError>
where
    P: PayloadStore + ?Sized,
    M: PhysicalMemory,
    C: Commit,
{
    let kernel = payloads.kernel().ok_or(ImageError::KernelNotFound)?;
    let ramdisk = payloads.initrd();

    let built = Handoff::new(kernel)
        .validate()?
        .relocate(mem)
        .build_parameters(params, env, ramdisk)?;
    Ok(built.hand_off(mem, commit))
}

#[cfg(target_arch = "x86")]
pub use self::x86::start;

#[cfg(target_arch = "x86")]
mod x86 {
    use super::boot_linux;
    use crate::error::BootError;
    use crate::firmware::{MachBootArgs, PayloadStore};
    use crate::handoff::{LinuxEntry, halt};
    use crate::phys_mem::IdentityMapped;
    use boot_console::{ConsoleLogger, Verbosity};
    use boot_params::BootParams;
    use log::{error, info};

    #[cfg(feature = "qemu")]
    const LOG_PORT: u16 = boot_console::QEMU_DEBUG_PORT;
    #[cfg(not(feature = "qemu"))]
    const LOG_PORT: u16 = boot_console::COM1_PORT;

    /// Entry from the primary loader.
    ///
    /// # Safety
    /// Must be called once, in 32-bit protected mode with paging off, with the
    /// boot-argument block the primary loader passed in.
    pub unsafe fn start<P: PayloadStore + ?Sized>(boot_args: &MachBootArgs, payloads: &P) -> ! {
        let command_line = boot_args.command_line();
        let verbosity = Verbosity::from_command_line(command_line.to_bytes());
        // A logger installed by the caller takes precedence.
        let _ = ConsoleLogger::init(LOG_PORT, verbosity);

        if verbosity == Verbosity::Verbose {
            info!("Booting in verbose mode");
        }
        info!(
            "{} version {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );
        info!(
            "Command line arguments: {}",
            command_line.to_str().unwrap_or("<not UTF-8>")
        );

        let env = match unsafe { boot_args.environment() } {
            Ok(env) => env,
            Err(err) => fatal(&err),
        };

        info!("Starting Linux...");
        let mut params = BootParams::zeroed();
        let mut mem = unsafe { IdentityMapped::new() };
        let mut commit = unsafe { LinuxEntry::new() };
        match boot_linux(&env, payloads, &mut params, &mut mem, &mut commit) {
            Ok(never) => match never {},
            Err(err) => fatal(&err),
        }
    }

    fn fatal(err: &BootError) -> ! {
        error!("{err}");
        halt()
    }
}
