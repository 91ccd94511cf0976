//! # Legacy x86 Linux Boot Protocol Data Model
//!
//! This crate defines the byte-exact structures a loader hands to a Linux
//! kernel through the legacy x86 boot protocol, together with the fixed
//! physical layout constants that protocol assumes. It is the shared vocabulary
//! between the memory map translator (`boot-mmap`) and the handoff sequencer
//! (`linux-loader`).
//!
//! ## Overview
//!
//! The kernel expects a single 4 KiB block, the *zero page*, whose layout is
//! defined by `arch/x86/include/uapi/asm/bootparam.h`. Every field lives at a
//! documented byte offset, so all structures here are `#[repr(C, packed)]` and
//! their sizes and offsets are checked at compile time.
//!
//! ```text
//! Boot Parameter Block (zero page), 0x1000 bytes:
//!
//! 0x000 ┌───────────────────────────────┐
//!       │ screen_info                   │ frame buffer description
//! 0x070 ├───────────────────────────────┤
//!       │ acpi_rsdp_addr                │
//! 0x0c0 ├───────────────────────────────┤
//!       │ ext_ramdisk_* / ext_cmd_line  │ upper 32 bits of pointers
//! 0x1c0 ├───────────────────────────────┤
//!       │ efi_info                      │ firmware tables, "EL32"
//! 0x1e8 ├───────────────────────────────┤
//!       │ e820_entries                  │
//! 0x1f1 ├───────────────────────────────┤
//!       │ hdr (setup header)            │ copied from the kernel image
//! 0x2d0 ├───────────────────────────────┤
//!       │ e820_table[128]               │ legacy memory map
//! 0xd00 ├───────────────────────────────┤
//!       │ eddbuf                        │
//! 0x1000└───────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! * [`layout`]: physical addresses and protocol constants (load address,
//!   low-memory hole, descriptor table region, signatures).
//! * [`setup_header`]: the kernel's own setup header and its load flags.
//! * [`screen_info`]: the linear frame buffer description.
//! * [`efi_info`]: the firmware (EFI) section.
//! * [`e820`]: legacy memory map entries and their types.
//! * [`zero_page`]: the aggregate [`BootParams`] block.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod e820;
pub mod efi_info;
pub mod layout;
pub mod screen_info;
pub mod setup_header;
pub mod zero_page;

pub use e820::{E820Entry, E820Type};
pub use efi_info::EfiInfo;
pub use screen_info::{ScreenInfo, VideoCapabilities};
pub use setup_header::{LoadFlags, ProtocolVersion, SetupHeader};
pub use zero_page::BootParams;
