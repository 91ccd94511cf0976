//! # Trace output

use boot_console::console_trace;
use boot_params::BootParams;

/// Dumps the fields the kernel reads first. Only emitted at debug verbosity.
pub fn trace_boot_params(bp: &BootParams) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }

    let hdr = bp.hdr;
    let si = bp.screen_info;
    let efi = bp.efi_info;
    let (version, loadflags, cmd_line_ptr, ramdisk_image, ramdisk_size) = (
        hdr.protocol_version(),
        hdr.loadflags,
        bp.cmd_line_ptr(),
        bp.ramdisk_image(),
        bp.ramdisk_size(),
    );
    let (rsdp, e820_entries) = (bp.acpi_rsdp_addr, bp.e820_entries);

    console_trace!("Boot params at {:#010x}:\n", core::ptr::from_ref(bp) as usize);
    console_trace!(
        "  protocol = {version}, loadflags = {loadflags:#04x}, cmdline = {cmd_line_ptr:#x}\n"
    );
    console_trace!("  ramdisk = {ramdisk_image:#x}, size = {ramdisk_size}\n");
    console_trace!(
        "  FB base = {:#x}, size = {}, {}x{}x{}, line = {}\n",
        si.frame_buffer_base(),
        { si.lfb_size },
        { si.lfb_width },
        { si.lfb_height },
        { si.lfb_depth },
        { si.lfb_linelength }
    );
    console_trace!(
        "  EFI sig = {:?}, systab = {:#x}, memmap = {:#x}, size = {}, desc size = {}, desc ver = {}\n",
        core::str::from_utf8(&efi.loader_signature()).unwrap_or("?"),
        efi.system_table(),
        efi.memory_map(),
        { efi.efi_memmap_size },
        { efi.efi_memdesc_size },
        { efi.efi_memdesc_version }
    );
    console_trace!("  RSDP = {rsdp:#x}, E820 entries = {e820_entries}\n");
}
