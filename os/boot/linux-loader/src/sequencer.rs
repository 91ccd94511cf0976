//! # Handoff Sequencer
//!
//! A single forward pass from a raw kernel image to the jump into it, encoded
//! as a typestate so that no step can be skipped or repeated:
//!
//! ```text
//! Unvalidated ──validate──► Validated ──relocate──► Relocated
//!                                                      │
//!                                            build_parameters
//!                                                      ▼
//!                          (commit) ◄──hand_off── ParametersBuilt
//! ```
//!
//! Every transition consumes the previous state. Validation and parameter
//! building are the only fallible steps; both fail before anything is
//! committed.

use crate::error::{Advisories, BootError, ImageError};
use crate::firmware::FirmwareEnvironment;
use crate::gdt::{DescriptorTablePointer, LinuxGdt};
use crate::handoff::{Commit, EntryState};
use crate::kernel_image::KernelImage;
use crate::phys_mem::PhysicalMemory;
use crate::rsdp::find_rsdp;
use crate::tracing::trace_boot_params;
use boot_mmap::{log_e820_table, translate};
use boot_params::layout::{
    EFI32_LOADER_SIGNATURE, GDT_BASE, GDT_REGION_SIZE, KERNEL_LOAD_ADDRESS,
    TYPE_OF_LOADER_UNDEFINED, VID_MODE_NORMAL,
};
use boot_params::screen_info::{VIDEO_FLAGS_NOCURSOR, VIDEO_TYPE_EFI};
use boot_params::{BootParams, ScreenInfo, VideoCapabilities};
use log::{debug, info, warn};

pub struct Unvalidated<'a> {
    image: &'a [u8],
}

pub struct Validated<'a> {
    image: KernelImage<'a>,
}

pub struct Relocated<'a> {
    image: KernelImage<'a>,
}

pub struct ParametersBuilt<'p> {
    params: &'p mut BootParams,
    advisories: Advisories,
}

/// The boot sequence in state `S`.
pub struct Handoff<S> {
    state: S,
}

impl<'a> Handoff<Unvalidated<'a>> {
    #[must_use]
    pub const fn new(image: &'a [u8]) -> Self {
        Self {
            state: Unvalidated { image },
        }
    }

    /// Checks the kernel's setup header.
    ///
    /// # Errors
    /// Any [`ImageError`] found in the header.
    pub fn validate(self) -> Result<Handoff<Validated<'a>>, ImageError> {
        let image = KernelImage::parse(self.state.image)?;
        info!("Loading Linux with boot protocol {}", image.protocol_version());
        if let Some(version) = image.version_string() {
            info!("Linux kernel version {version}");
        }
        Ok(Handoff {
            state: Validated { image },
        })
    }
}

impl<'a> Handoff<Validated<'a>> {
    #[must_use]
    pub const fn image(&self) -> &KernelImage<'a> {
        &self.state.image
    }

    /// Copies the protected-mode payload to [`KERNEL_LOAD_ADDRESS`].
    pub fn relocate<M: PhysicalMemory>(self, mem: &mut M) -> Handoff<Relocated<'a>> {
        let payload = self.state.image.payload();
        info!(
            "Copying Linux kernel ({} bytes) to {KERNEL_LOAD_ADDRESS:#x}",
            payload.len()
        );
        mem.copy_to(KERNEL_LOAD_ADDRESS, payload);
        Handoff {
            state: Relocated {
                image: self.state.image,
            },
        }
    }
}

impl<'a> Handoff<Relocated<'a>> {
    /// Fills `params` from scratch.
    ///
    /// # Errors
    /// [`BootError::Discovery`] without an ACPI RSDP, [`BootError::Capacity`]
    /// if the memory map does not fit the zero page.
    pub fn build_parameters<'p>(
        self,
        params: &'p mut BootParams,
        env: &FirmwareEnvironment<'_>,
        ramdisk: Option<&[u8]>,
    ) -> Result<Handoff<ParametersBuilt<'p>>, BootError> {
        let mut advisories = Advisories::default();

        *params = BootParams::zeroed();

        params.hdr = *self.state.image.header();
        let (cmd_line_lo, cmd_line_hi) = split(address_of(env.command_line.as_ptr().cast()));
        params.hdr.cmd_line_ptr = cmd_line_lo;
        params.ext_cmd_line_ptr = cmd_line_hi;
        params.hdr.vid_mode = VID_MODE_NORMAL;
        params.hdr.type_of_loader = TYPE_OF_LOADER_UNDEFINED;
        let flags = params.hdr.load_flags().with_quiet(false);
        params.hdr.set_load_flags(flags);

        match ramdisk.filter(|r| !r.is_empty()) {
            Some(ramdisk) => {
                let addr = address_of(ramdisk.as_ptr());
                info!(
                    "Setting up initial ramdisk at {addr:#x} ({} bytes)",
                    ramdisk.len()
                );
                let (image_lo, image_hi) = split(addr);
                let (size_lo, size_hi) = split(ramdisk.len() as u64);
                params.hdr.ramdisk_image = image_lo;
                params.hdr.ramdisk_size = size_lo;
                params.ext_ramdisk_image = image_hi;
                params.ext_ramdisk_size = size_hi;
            }
            None => {
                warn!("No initial ramdisk found, Linux may panic");
                advisories.missing_ramdisk = true;
            }
        }

        params.screen_info = screen_info(env);
        params.acpi_rsdp_addr = find_rsdp(&env.config_tables)?;

        let (systab_lo, systab_hi) = split(env.system_table);
        let (memmap_lo, memmap_hi) = split(address_of(env.memory_map.as_ptr()));
        params.efi_info.set_loader_signature(EFI32_LOADER_SIGNATURE);
        params.efi_info.efi_systab = systab_lo;
        params.efi_info.efi_systab_hi = systab_hi;
        params.efi_info.efi_memmap = memmap_lo;
        params.efi_info.efi_memmap_hi = memmap_hi;
        params.efi_info.efi_memmap_size = saturate_u32(env.memory_map.map_size() as u64);
        params.efi_info.efi_memdesc_size = saturate_u32(env.memory_map.desc_size() as u64);
        params.efi_info.efi_memdesc_version = env.memory_map.desc_version();

        let translation = translate(&env.memory_map, &mut params.e820_table)?;
        params.e820_entries = u8::try_from(translation.entries).unwrap_or(u8::MAX);
        advisories.unrecognized_descriptors = translation.unrecognized;
        log_e820_table(params.e820_map());

        Ok(Handoff {
            state: ParametersBuilt { params, advisories },
        })
    }
}

impl Handoff<ParametersBuilt<'_>> {
    #[must_use]
    pub const fn advisories(&self) -> Advisories {
        self.state.advisories
    }

    #[must_use]
    pub const fn boot_params(&self) -> &BootParams {
        &*self.state.params
    }

    /// Primes the descriptor table region and commits.
    ///
    /// With a real [`Commit`] this does not return.
    pub fn hand_off<M, C>(self, mem: &mut M, commit: &mut C) -> C::Outcome
    where
        M: PhysicalMemory,
        C: Commit,
    {
        let params: &BootParams = &*self.state.params;
        trace_boot_params(params);

        debug!("Priming descriptor tables at {GDT_BASE:#x}");
        mem.fill(u64::from(GDT_BASE), usize::from(GDT_REGION_SIZE), 0);
        mem.copy_to(u64::from(GDT_BASE), &LinuxGdt::to_bytes());

        let state = EntryState {
            boot_params: params,
            kernel_entry: saturate_u32(KERNEL_LOAD_ADDRESS),
            gdt: LinuxGdt::pointer(),
            idt: DescriptorTablePointer::EMPTY,
        };
        commit.commit(&state)
    }
}

/// Frame buffer description for a 32 bpp linear frame buffer.
fn screen_info(env: &FirmwareEnvironment<'_>) -> ScreenInfo {
    let video = env.video;
    let (base_lo, base_hi) = split(video.base);
    ScreenInfo {
        capabilities: VideoCapabilities::new()
            .with_base_64bit(true)
            .with_skip_quirks(true)
            .into_bits(),
        flags: VIDEO_FLAGS_NOCURSOR,
        lfb_base: base_lo,
        ext_lfb_base: base_hi,
        lfb_size: video.pitch.saturating_mul(video.height),
        // The reported width is not always right; the pitch is.
        lfb_width: saturate_u16(video.pitch / 4),
        lfb_height: saturate_u16(video.height),
        lfb_depth: saturate_u16(video.depth),
        lfb_linelength: saturate_u16(video.pitch),
        red_size: 8,
        red_pos: 16,
        green_size: 8,
        green_pos: 8,
        blue_size: 8,
        blue_pos: 0,
        orig_video_is_vga: VIDEO_TYPE_EFI,
        ..ScreenInfo::default()
    }
}

/// Splits an address into the low half and the protocol's `ext_`/`_hi` half.
#[allow(clippy::cast_possible_truncation)]
const fn split(value: u64) -> (u32, u32) {
    (value as u32, (value >> 32) as u32)
}

fn address_of(ptr: *const u8) -> u64 {
    ptr.addr() as u64
}

fn saturate_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn saturate_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
