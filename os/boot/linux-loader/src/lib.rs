//! # 32-bit Linux Loader
//!
//! Boots an embedded bzImage on EFI32 machines whose primary loader only
//! knows how to start Mach-O images. The loader translates the EFI boot
//! environment into the zero page of the legacy x86 Linux boot protocol and
//! jumps to the kernel in 32-bit protected mode.
//!
//! ## Boot Flow
//!
//! ```text
//! primary loader ──► start(MachBootArgs, payloads)
//!                       │ logger, banner, FirmwareEnvironment
//!                       ▼
//!                    boot_linux
//!                       │
//!   Handoff::new(__TEXT,__vmlinuz)
//!     .validate()          HdrS, protocol ≥ 2.02, LOADED_HIGH
//!     .relocate()          payload ──► 0x100000
//!     .build_parameters()  zero page: header, ramdisk, screen_info,
//!                          RSDP, efi_info ("EL32"), E820 map
//!     .hand_off()          GDT ──► 0x94000, lidt/lgdt,
//!                          esi = &boot_params, ecx = 0x100000, ebx = 0
//! ```
//!
//! ## Errors
//!
//! Every fatal condition surfaces as a [`BootError`] before anything is
//! committed. `entry::start` logs it and halts the CPU. Non-fatal
//! conditions (no ramdisk, unknown memory types) are collected in
//! [`Advisories`] and logged as warnings.
//!
//! ## Testing
//!
//! Physical memory ([`PhysicalMemory`]) and the final jump ([`Commit`]) are
//! traits, so everything up to and including the handoff runs on the host
//! against fakes. Only `handoff::LinuxEntry` and [`phys_mem::IdentityMapped`]
//! touch the machine.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod entry;
pub mod error;
pub mod firmware;
pub mod gdt;
pub mod handoff;
pub mod kernel_image;
pub mod phys_mem;
pub mod rsdp;
pub mod sequencer;
pub mod tracing;

pub use entry::boot_linux;
pub use error::{Advisories, BootError, DiscoveryError, ImageError};
pub use firmware::{FirmwareEnvironment, MachBootArgs, PayloadStore, VideoMode};
pub use handoff::{Commit, EntryState};
pub use kernel_image::KernelImage;
pub use phys_mem::PhysicalMemory;
pub use sequencer::Handoff;
