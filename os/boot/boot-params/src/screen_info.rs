//! # Frame Buffer Description

use bitfield_struct::bitfield;
use core::mem::{offset_of, size_of};

/// Display type for an EFI graphics (GOP/UGA) linear frame buffer.
pub const VIDEO_TYPE_EFI: u8 = 0x70;

/// `flags`: the video mode has no hardware cursor.
pub const VIDEO_FLAGS_NOCURSOR: u8 = 1 << 0;

/// `screen_info` at offset `0x000` of the zero page.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenInfo {
    pub orig_x: u8,             // 0x00
    pub orig_y: u8,             // 0x01
    pub ext_mem_k: u16,         // 0x02
    pub orig_video_page: u16,   // 0x04
    pub orig_video_mode: u8,    // 0x06
    pub orig_video_cols: u8,    // 0x07
    pub flags: u8,              // 0x08
    pub unused2: u8,            // 0x09
    pub orig_video_ega_bx: u16, // 0x0a
    pub unused3: u16,           // 0x0c
    pub orig_video_lines: u8,   // 0x0e
    pub orig_video_is_vga: u8,  // 0x0f
    pub orig_video_points: u16, // 0x10
    pub lfb_width: u16,         // 0x12
    pub lfb_height: u16,        // 0x14
    pub lfb_depth: u16,         // 0x16
    pub lfb_base: u32,          // 0x18
    pub lfb_size: u32,          // 0x1c
    pub cl_magic: u16,          // 0x20
    pub cl_offset: u16,         // 0x22
    pub lfb_linelength: u16,    // 0x24
    pub red_size: u8,           // 0x26
    pub red_pos: u8,            // 0x27
    pub green_size: u8,         // 0x28
    pub green_pos: u8,          // 0x29
    pub blue_size: u8,          // 0x2a
    pub blue_pos: u8,           // 0x2b
    pub rsvd_size: u8,          // 0x2c
    pub rsvd_pos: u8,           // 0x2d
    pub vesapm_seg: u16,        // 0x2e
    pub vesapm_off: u16,        // 0x30
    pub pages: u16,             // 0x32
    pub vesa_attributes: u16,   // 0x34
    pub capabilities: u32,      // 0x36
    pub ext_lfb_base: u32,      // 0x3a
    pub _reserved: [u8; 2],     // 0x3e
}

impl ScreenInfo {
    #[must_use]
    pub const fn video_capabilities(&self) -> VideoCapabilities {
        VideoCapabilities::from_bits(self.capabilities)
    }

    /// The full frame buffer base, including `ext_lfb_base` when the
    /// 64-bit capability is advertised.
    #[must_use]
    pub const fn frame_buffer_base(&self) -> u64 {
        let low = self.lfb_base as u64;
        if self.video_capabilities().base_64bit() {
            ((self.ext_lfb_base as u64) << 32) | low
        } else {
            low
        }
    }
}

/// `capabilities` (offset `0x36`).
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct VideoCapabilities {
    /// Bit 0: skip the kernel's frame buffer quirk detection.
    pub skip_quirks: bool,
    /// Bit 1: `ext_lfb_base` carries the upper 32 bits of the base.
    pub base_64bit: bool,
    #[bits(30)]
    __: u32,
}

const _: () = {
    assert!(size_of::<ScreenInfo>() == 0x40);
    assert!(offset_of!(ScreenInfo, orig_video_is_vga) == 0x0f);
    assert!(offset_of!(ScreenInfo, lfb_base) == 0x18);
    assert!(offset_of!(ScreenInfo, lfb_linelength) == 0x24);
    assert!(offset_of!(ScreenInfo, capabilities) == 0x36);
    assert!(offset_of!(ScreenInfo, ext_lfb_base) == 0x3a);
};
