mod common;

use boot_params::layout::{GDT_BASE, GDT_REGION_SIZE, KERNEL_LOAD_ADDRESS};
use boot_params::{BootParams, E820Entry, E820Type};
use common::{
    Firmware, FakeMemory, Payloads, RecordingCommit, COMMAND_LINE, RSDP_V1, RSDP_V2,
    SYSTEM_TABLE, bzimage, default_regions, default_tables,
};
use linux_loader::gdt::{DescriptorTablePointer, LinuxGdt};
use linux_loader::{BootError, DiscoveryError, Handoff, ImageError, boot_linux};
use uefi::boot::MemoryType;

const SETUP_SECTS: u8 = 4;
const PAYLOAD_LEN: usize = 4096 + 37;

fn payloads() -> Payloads {
    Payloads {
        kernel: Some(bzimage(SETUP_SECTS, PAYLOAD_LEN)),
        initrd: Some(vec![0x5A; 3 * 4096 + 1]),
    }
}

fn payload_of(kernel: &[u8]) -> Vec<Option<u8>> {
    let setup_size = (usize::from(SETUP_SECTS) + 1) * 512;
    kernel[setup_size..].iter().copied().map(Some).collect()
}

#[test]
fn boots_with_complete_environment() {
    let firmware = Firmware::standard();
    let env = firmware.env();
    let payloads = payloads();
    let mut params = BootParams::zeroed();
    let mut mem = FakeMemory::default();
    let mut commit = RecordingCommit::default();

    let entered = boot_linux(&env, &payloads, &mut params, &mut mem, &mut commit)
        .expect("boot should succeed");
    assert_eq!(commit.commits, 1);

    // Registers at entry.
    assert_eq!(entered.kernel_entry, 0x0010_0000);
    assert_eq!(entered.boot_params_addr, std::ptr::from_ref(&params) as usize);
    assert_eq!(
        entered.gdt,
        DescriptorTablePointer {
            limit: GDT_REGION_SIZE - 1,
            base: GDT_BASE
        }
    );
    assert_eq!(entered.idt, DescriptorTablePointer::EMPTY);

    // Payload at 1 MiB, descriptor table primed.
    let kernel = payloads.kernel.as_deref().unwrap();
    assert_eq!(
        mem.read(KERNEL_LOAD_ADDRESS, PAYLOAD_LEN),
        payload_of(kernel)
    );
    let region = mem.read(u64::from(GDT_BASE), usize::from(GDT_REGION_SIZE));
    let gdt: Vec<Option<u8>> = LinuxGdt::to_bytes().into_iter().map(Some).collect();
    assert_eq!(region[..LinuxGdt::SIZE], gdt[..]);
    assert!(region[LinuxGdt::SIZE..].iter().all(|b| *b == Some(0)));
    assert!(!mem.is_written(u64::from(GDT_BASE) + u64::from(GDT_REGION_SIZE)));

    let bp = entered.boot_params;
    let hdr = bp.hdr;

    // Header copied from the image, then adapted.
    assert_eq!({ hdr.header }, u32::from_le_bytes(*b"HdrS"));
    assert_eq!({ hdr.version }, 0x020F);
    assert_eq!({ hdr.setup_sects }, SETUP_SECTS);
    assert_eq!({ hdr.cmdline_size }, 2048);
    assert_eq!({ hdr.vid_mode }, 0xFFFF);
    assert_eq!({ hdr.type_of_loader }, 0xFF);
    assert!(hdr.load_flags().loaded_high());
    assert!(!hdr.load_flags().quiet());

    assert_eq!(bp.cmd_line_ptr(), COMMAND_LINE.as_ptr() as u64);
    let initrd = payloads.initrd.as_deref().unwrap();
    assert_eq!(bp.ramdisk_image(), initrd.as_ptr() as u64);
    assert_eq!(bp.ramdisk_size(), initrd.len() as u64);

    // Frame buffer.
    let si = bp.screen_info;
    assert_eq!({ si.orig_video_is_vga }, 0x70);
    assert_eq!({ si.flags }, 1);
    assert_eq!(si.frame_buffer_base(), 0x4000_0000);
    assert!(si.video_capabilities().base_64bit());
    assert!(si.video_capabilities().skip_quirks());
    assert_eq!({ si.lfb_width }, 1280);
    assert_eq!({ si.lfb_height }, 720);
    assert_eq!({ si.lfb_depth }, 32);
    assert_eq!({ si.lfb_linelength }, 5120);
    assert_eq!({ si.lfb_size }, 5120 * 720);
    assert_eq!(
        ({ si.red_size }, { si.red_pos }),
        (8, 16)
    );
    assert_eq!(
        ({ si.green_size }, { si.green_pos }),
        (8, 8)
    );
    assert_eq!(({ si.blue_size }, { si.blue_pos }), (8, 0));

    assert_eq!({ bp.acpi_rsdp_addr }, u64::from(RSDP_V2));

    let efi = bp.efi_info;
    assert_eq!(&efi.loader_signature(), b"EL32");
    assert_eq!(efi.system_table(), SYSTEM_TABLE);
    assert_eq!(efi.memory_map(), firmware.memory_map.as_ptr() as u64);
    assert_eq!({ efi.efi_memmap_size }, firmware.memory_map.len() as u32);
    assert_eq!({ efi.efi_memdesc_size }, 48);
    assert_eq!({ efi.efi_memdesc_version }, 1);

    assert_eq!({ bp.e820_entries }, 6);
    assert_eq!(
        bp.e820_map(),
        &[
            E820Entry::new(0, 0x9_F000, E820Type::Ram),
            E820Entry::new(0x9_F000, 0x1000, E820Type::Reserved),
            E820Entry::new(0x10_0000, 0x7E0_0000, E820Type::Ram),
            E820Entry::new(0x7F0_0000, 0x1_0000, E820Type::Acpi),
            E820Entry::new(0x7F1_0000, 0x1_0000, E820Type::Nvs),
            E820Entry::new(0xFEC0_0000, 0x1000, E820Type::Reserved),
        ]
    );
}

#[test]
fn stale_parameters_are_cleared() {
    let firmware = Firmware::standard();
    let mut params = BootParams::zeroed();
    params.tboot_addr = 0xDEAD_BEEF;
    params.sentinel = 0xFF;
    params.e820_table[127] = E820Entry::new(0x1234_0000, 0x1000, E820Type::Unusable);

    let entered = boot_linux(
        &firmware.env(),
        &payloads(),
        &mut params,
        &mut FakeMemory::default(),
        &mut RecordingCommit::default(),
    )
    .expect("boot should succeed");

    let bp = entered.boot_params;
    assert_eq!({ bp.tboot_addr }, 0);
    assert_eq!({ bp.sentinel }, 0);
    assert_eq!(bp.e820_table[127], E820Entry::ZERO);
}

#[test]
fn legacy_rsdp_is_used_without_acpi2() {
    let firmware = Firmware::new(&default_regions(), &default_tables()[..2]);
    let entered = boot_linux(
        &firmware.env(),
        &payloads(),
        &mut BootParams::zeroed(),
        &mut FakeMemory::default(),
        &mut RecordingCommit::default(),
    )
    .expect("boot should succeed");
    assert_eq!({ entered.boot_params.acpi_rsdp_addr }, u64::from(RSDP_V1));
}

#[test]
fn bad_signature_never_touches_memory() {
    let mut kernel = bzimage(SETUP_SECTS, PAYLOAD_LEN);
    kernel[0x202..0x206].copy_from_slice(b"HdrX");
    let payloads = Payloads {
        kernel: Some(kernel),
        initrd: None,
    };
    let firmware = Firmware::standard();
    let mut mem = FakeMemory::default();
    let mut commit = RecordingCommit::default();

    let err = boot_linux(
        &firmware.env(),
        &payloads,
        &mut BootParams::zeroed(),
        &mut mem,
        &mut commit,
    )
    .err()
    .expect("boot should fail");

    assert_eq!(
        err,
        BootError::Image(ImageError::BadSignature {
            found: u32::from_le_bytes(*b"HdrX")
        })
    );
    assert!(mem.is_untouched());
    assert_eq!(commit.commits, 0);
}

#[test]
fn kernel_loading_low_is_rejected_before_relocation() {
    let mut kernel = bzimage(SETUP_SECTS, PAYLOAD_LEN);
    kernel[0x211] = 0;
    let payloads = Payloads {
        kernel: Some(kernel),
        initrd: None,
    };
    let firmware = Firmware::standard();
    let mut mem = FakeMemory::default();

    let err = boot_linux(
        &firmware.env(),
        &payloads,
        &mut BootParams::zeroed(),
        &mut mem,
        &mut RecordingCommit::default(),
    )
    .err()
    .expect("boot should fail");

    assert_eq!(err, BootError::Image(ImageError::NotLoadedHigh));
    assert!(mem.is_untouched());
}

#[test]
fn missing_kernel_is_fatal() {
    let payloads = Payloads {
        kernel: None,
        initrd: Some(vec![1; 16]),
    };
    let firmware = Firmware::standard();
    let mut mem = FakeMemory::default();

    let err = boot_linux(
        &firmware.env(),
        &payloads,
        &mut BootParams::zeroed(),
        &mut mem,
        &mut RecordingCommit::default(),
    )
    .err()
    .expect("boot should fail");

    assert_eq!(err, BootError::Image(ImageError::KernelNotFound));
    assert!(mem.is_untouched());
}

#[test]
fn empty_kernel_section_counts_as_missing() {
    let payloads = Payloads {
        kernel: Some(Vec::new()),
        initrd: None,
    };
    let err = boot_linux(
        &Firmware::standard().env(),
        &payloads,
        &mut BootParams::zeroed(),
        &mut FakeMemory::default(),
        &mut RecordingCommit::default(),
    )
    .err()
    .expect("boot should fail");
    assert_eq!(err, BootError::Image(ImageError::KernelNotFound));
}

#[test]
fn missing_ramdisk_is_an_advisory() {
    let kernel = bzimage(SETUP_SECTS, PAYLOAD_LEN);
    let firmware = Firmware::standard();
    let env = firmware.env();
    let mut params = BootParams::zeroed();
    let mut mem = FakeMemory::default();
    let mut commit = RecordingCommit::default();

    let built = Handoff::new(&kernel)
        .validate()
        .expect("valid image")
        .relocate(&mut mem)
        .build_parameters(&mut params, &env, None)
        .expect("parameters");

    let advisories = built.advisories();
    assert!(advisories.missing_ramdisk);
    assert_eq!(advisories.unrecognized_descriptors, 0);
    assert_eq!(built.boot_params().ramdisk_image(), 0);
    assert_eq!(built.boot_params().ramdisk_size(), 0);

    let entered = built.hand_off(&mut mem, &mut commit);
    assert_eq!(commit.commits, 1);
    assert_eq!(entered.kernel_entry, 0x0010_0000);
}

#[test]
fn unrecognized_memory_is_reported_and_reserved() {
    let mut regions = default_regions();
    regions.push((MemoryType::PERSISTENT_MEMORY, 0x1_0000_0000, 0x1_0010_0000));
    let firmware = Firmware::new(&regions, &default_tables());
    let kernel = bzimage(SETUP_SECTS, PAYLOAD_LEN);
    let initrd = [7u8; 64];
    let mut params = BootParams::zeroed();

    let built = Handoff::new(&kernel)
        .validate()
        .expect("valid image")
        .relocate(&mut FakeMemory::default())
        .build_parameters(&mut params, &firmware.env(), Some(&initrd[..]))
        .expect("parameters");

    assert_eq!(built.advisories().unrecognized_descriptors, 1);
    assert!(!built.advisories().missing_ramdisk);
    assert_eq!(
        built.boot_params().e820_map().last(),
        Some(&E820Entry::new(
            0x1_0000_0000,
            0x10_0000,
            E820Type::Reserved
        ))
    );
}

#[test]
fn missing_rsdp_is_fatal() {
    let firmware = Firmware::new(&default_regions(), &default_tables()[..1]);
    let mut mem = FakeMemory::default();
    let mut commit = RecordingCommit::default();

    let err = boot_linux(
        &firmware.env(),
        &payloads(),
        &mut BootParams::zeroed(),
        &mut mem,
        &mut commit,
    )
    .err()
    .expect("boot should fail");

    assert_eq!(err, BootError::Discovery(DiscoveryError::RsdpNotFound));
    assert_eq!(commit.commits, 0);
    assert!(!mem.is_written(u64::from(GDT_BASE)));
}

#[test]
fn oversized_memory_map_stops_before_handoff() {
    let mut regions = default_regions();
    for i in 0..129u64 {
        let ty = if i % 2 == 0 {
            MemoryType::CONVENTIONAL
        } else {
            MemoryType::RESERVED
        };
        let start = 0x1000_0000 + i * 0x1000;
        regions.push((ty, start, start + 0x1000));
    }
    let firmware = Firmware::new(&regions, &default_tables());
    let mut mem = FakeMemory::default();
    let mut commit = RecordingCommit::default();

    let err = boot_linux(
        &firmware.env(),
        &payloads(),
        &mut BootParams::zeroed(),
        &mut mem,
        &mut commit,
    )
    .err()
    .expect("boot should fail");

    let BootError::Capacity(capacity) = err else {
        panic!("expected a capacity error, got {err:?}");
    };
    assert_eq!(capacity.capacity, 128);
    assert_eq!(commit.commits, 0);
    assert!(!mem.is_written(u64::from(GDT_BASE)));
}
