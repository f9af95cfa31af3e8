use boot_info::config::{BOOT_INFO_MAX_ADDR, BOOT_LOADER_NAME};
use boot_info::{
    BootInfoBuilder, BootInfoError, ConfigTableEntry, DescriptorTable, FramebufferMode,
    FramebufferType, MemoryMapError, Page, PageAllocator, PageFrame, PixelLayout, RegionType,
    RsdpHandoff,
};

#[derive(Debug, thiserror::Error)]
#[error("no boot pages left")]
struct OutOfPages;

/// Hands out leaked, dirtied pages at made-up physical addresses.
struct FakePages {
    next: u64,
    remaining: usize,
    limits: Vec<u64>,
}

impl FakePages {
    fn new(remaining: usize) -> Self {
        Self::at(0x1000, remaining)
    }

    fn at(next: u64, remaining: usize) -> Self {
        Self {
            next,
            remaining,
            limits: Vec::new(),
        }
    }
}

impl PageAllocator for FakePages {
    type Error = OutOfPages;

    fn allocate_page(&mut self, max_addr: u64) -> Result<PageFrame, Self::Error> {
        self.limits.push(max_addr);
        if self.remaining == 0 {
            return Err(OutOfPages);
        }
        self.remaining -= 1;

        let page = Box::leak(Box::new(Page::ZERO));
        page.0.fill(0xa5);
        let frame = PageFrame::new(self.next, page);
        self.next += 0x1000;
        Ok(frame)
    }
}

const ACPI2: [u8; 16] = *b"acpi-2.0-rsdp-id";
const SMBIOS: [u8; 16] = *b"smbios-entry-pt!";

fn config_table(acpi: u64) -> Vec<ConfigTableEntry> {
    vec![
        ConfigTableEntry {
            token: SMBIOS,
            address: 0x7f00_0000,
        },
        ConfigTableEntry {
            token: ACPI2,
            address: acpi,
        },
    ]
}

fn framebuffer(layout: PixelLayout) -> FramebufferMode {
    FramebufferMode {
        address: 0x8000_0000,
        stride: 1088,
        width: 1080,
        height: 720,
        layout,
    }
}

fn descriptors(descs: &[(u32, u64, u64)]) -> Vec<u8> {
    let mut bytes = vec![0u8; descs.len() * 40];
    for (chunk, &(kind, start, pages)) in bytes.chunks_exact_mut(40).zip(descs) {
        chunk[0..4].copy_from_slice(&kind.to_le_bytes());
        chunk[8..16].copy_from_slice(&start.to_le_bytes());
        chunk[24..32].copy_from_slice(&pages.to_le_bytes());
    }
    bytes
}

#[test]
fn new_record_is_zeroed() {
    let mut pages = FakePages::new(1);
    let builder = BootInfoBuilder::new(&mut pages).unwrap();
    assert_eq!(builder.phys(), 0x1000);
    assert_eq!(builder.flags().into_bits(), 0);

    let handoff = builder.finish();
    assert_eq!(handoff.info.flags.into_bits(), 0);
    assert_eq!(handoff.info.acpi_rsdp, 0);
    assert_eq!(handoff.info.framebuffer_addr, 0);
    assert!(handoff.memory_map.is_empty());
    assert!(handoff.module.is_none());
    assert_eq!(pages.limits, [BOOT_INFO_MAX_ADDR]);
}

#[test]
fn full_record() {
    let mut pages = FakePages::new(8);
    let mut builder = BootInfoBuilder::new(&mut pages).unwrap();

    builder
        .set_framebuffer(&framebuffer(PixelLayout::Bgr))
        .unwrap();
    builder.set_ramdisk(0x0100_0000, 0x20_0000).unwrap();
    builder.set_boot_loader_name().unwrap();
    let rsdp = builder
        .set_acpi_rsdp(config_table(0x7fb7_e014), &ACPI2)
        .unwrap();
    assert_eq!(rsdp, RsdpHandoff::Published(0x7fb7_e014));

    let slot = builder.memory_map_slot().unwrap();
    let slot_phys = slot.phys();
    assert_eq!(slot.capacity(), 4096 / 24);

    let raw = descriptors(&[(7, 0, 1), (7, 0x1000, 1), (0, 0x2000, 1)]);
    let table = DescriptorTable::new(&raw, 40).unwrap();
    let summary = builder.set_memory_map(slot, &table).unwrap();
    assert_eq!(summary.entries, 2);

    let handoff = builder.finish();
    let info = handoff.info;
    let flags = info.flags;
    assert!(flags.framebuffer_info());
    assert!(flags.mods());
    assert!(flags.boot_loader_name());
    assert!(flags.mem_map());
    assert!(flags.memory());
    assert!(!flags.apm_table());
    assert_eq!(flags.into_bits(), 0x1249);

    assert_eq!(info.mem_lower, 0);
    assert_eq!(info.mem_upper, 8);
    assert_eq!(info.mmap_addr, slot_phys);
    assert_eq!(info.mmap_length, 48);
    assert_eq!(handoff.memory_map.len(), 2);
    let (first, second) = (handoff.memory_map[0], handoff.memory_map[1]);
    assert_eq!(first.region_type(), Some(RegionType::Available));
    assert_eq!(second.end(), 0x3000);

    assert_eq!(info.mods_count, 1);
    let module = handoff.module.unwrap();
    assert_eq!(module.mod_start, 0x0100_0000);
    assert_eq!(module.mod_end, 0x0120_0000);
    assert_eq!(module.cmdline, 0);

    assert_eq!(handoff.loader_name, Some(BOOT_LOADER_NAME));
    assert_eq!(info.acpi_rsdp, 0x7fb7_e014);

    // Record, module list, name and memory map each got their own page.
    let mut addrs = [
        handoff.phys,
        info.mods_addr,
        info.boot_loader_name,
        info.mmap_addr,
    ];
    addrs.sort_unstable();
    assert_eq!(addrs, [0x1000, 0x2000, 0x3000, 0x4000]);
    assert!(pages.limits.iter().all(|&max| max == BOOT_INFO_MAX_ADDR));
}

#[test]
fn framebuffer_channel_layouts() {
    let cases = [
        (PixelLayout::Bgr, (16, 8, 0)),
        (PixelLayout::Rgb, (0, 8, 16)),
        (
            PixelLayout::Bitmask {
                red: 0xff00_0000,
                green: 0x00ff_0000,
                blue: 0x0000_ff00,
                reserved: 0xff,
            },
            (24, 16, 8),
        ),
    ];

    for (layout, (red, green, blue)) in cases {
        let mut pages = FakePages::new(1);
        let mut builder = BootInfoBuilder::new(&mut pages).unwrap();
        builder.set_framebuffer(&framebuffer(layout)).unwrap();
        let info = builder.finish().info;

        assert_eq!(info.framebuffer_addr, 0x8000_0000);
        assert_eq!(info.framebuffer_pitch, 1088 * 4);
        assert_eq!(info.framebuffer_width, 1080);
        assert_eq!(info.framebuffer_height, 720);
        assert_eq!(info.framebuffer_bpp, 32);
        assert_eq!(info.framebuffer_type, FramebufferType::Rgb as u8);
        let rgb = info.framebuffer_rgb;
        assert_eq!(rgb.red_field_position, red, "{layout:?}");
        assert_eq!(rgb.green_field_position, green, "{layout:?}");
        assert_eq!(rgb.blue_field_position, blue, "{layout:?}");
        assert_eq!(rgb.red_mask_size, 8);
        assert_eq!(rgb.blue_mask_size, 8);
    }
}

#[test]
fn blt_only_framebuffer_is_rejected() {
    let mut pages = FakePages::new(1);
    let mut builder = BootInfoBuilder::new(&mut pages).unwrap();
    let err = builder
        .set_framebuffer(&framebuffer(PixelLayout::BltOnly))
        .unwrap_err();
    assert!(matches!(
        err,
        BootInfoError::UnsupportedPixelLayout(PixelLayout::BltOnly)
    ));
    assert!(err.is_fatal());

    let info = builder.finish().info;
    assert!(!info.flags.framebuffer_info());
    assert_eq!(info.framebuffer_addr, 0);
}

#[test]
fn acpi_requires_boot_loader_name() {
    let mut pages = FakePages::new(2);
    let mut builder = BootInfoBuilder::new(&mut pages).unwrap();
    let err = builder
        .set_acpi_rsdp(config_table(0x1000), &ACPI2)
        .unwrap_err();
    assert!(matches!(err, BootInfoError::MissingPrerequisite { .. }));

    builder.set_boot_loader_name().unwrap();
    assert_eq!(
        builder.set_acpi_rsdp(config_table(0x1000), &ACPI2).unwrap(),
        RsdpHandoff::Published(0x1000)
    );
}

#[test]
fn missing_acpi_table_is_recoverable() {
    let mut pages = FakePages::new(2);
    let mut builder = BootInfoBuilder::new(&mut pages).unwrap();
    builder.set_boot_loader_name().unwrap();

    let only_smbios = config_table(0).into_iter().filter(|e| e.token != ACPI2);
    let err = builder.set_acpi_rsdp(only_smbios, &ACPI2).unwrap_err();
    assert!(matches!(err, BootInfoError::AcpiTableNotFound));
    assert!(!err.is_fatal());
    assert_eq!(builder.finish().info.acpi_rsdp, 0);
}

#[test]
fn acpi_above_4_gib_is_not_published() {
    let mut pages = FakePages::new(2);
    let mut builder = BootInfoBuilder::new(&mut pages).unwrap();
    builder.set_boot_loader_name().unwrap();

    assert_eq!(
        builder
            .set_acpi_rsdp(config_table(0x1_0000_0000), &ACPI2)
            .unwrap(),
        RsdpHandoff::OutOf32BitRange(0x1_0000_0000)
    );
    assert_eq!(builder.finish().info.acpi_rsdp, 0);
}

#[test]
fn ramdisk_must_end_below_4_gib() {
    let mut pages = FakePages::new(2);
    let mut builder = BootInfoBuilder::new(&mut pages).unwrap();
    let err = builder.set_ramdisk(0xffff_f000, 0x2000).unwrap_err();
    assert!(matches!(
        err,
        BootInfoError::AddressTooHigh {
            what: "ramdisk",
            addr: 0x1_0000_1000,
        }
    ));
    assert!(!builder.flags().mods());
}

#[test]
fn page_allocation_failure_is_fatal() {
    let mut pages = FakePages::new(0);
    let err = BootInfoBuilder::new(&mut pages).err().unwrap();
    assert!(matches!(err, BootInfoError::PageAllocation { .. }));
    assert!(err.is_fatal());

    let mut pages = FakePages::new(1);
    let mut builder = BootInfoBuilder::new(&mut pages).unwrap();
    let err = builder.set_boot_loader_name().unwrap_err();
    assert!(matches!(
        err,
        BootInfoError::PageAllocation {
            what: "boot loader name",
            ..
        }
    ));
    assert!(err.is_fatal());
    assert!(!builder.flags().boot_loader_name());
}

#[test]
fn page_above_ceiling_is_rejected() {
    let mut pages = FakePages::at(BOOT_INFO_MAX_ADDR, 1);
    let err = BootInfoBuilder::new(&mut pages).err().unwrap();
    assert!(matches!(
        err,
        BootInfoError::AddressTooHigh {
            addr: BOOT_INFO_MAX_ADDR,
            ..
        }
    ));
}

#[test]
fn failed_translation_leaves_map_unpublished() {
    let mut pages = FakePages::new(2);
    let mut builder = BootInfoBuilder::new(&mut pages).unwrap();

    let raw = descriptors(&[(7, 0x2000, 1), (7, 0x1000, 1)]);
    let table = DescriptorTable::new(&raw, 40).unwrap();
    let err = builder.set_memory_map_now(&table).unwrap_err();
    assert!(matches!(
        err,
        BootInfoError::MemoryMap(MemoryMapError::Unordered { .. })
    ));

    let info = builder.finish().info;
    assert!(!info.flags.mem_map());
    assert!(!info.flags.memory());
    assert_eq!(info.mmap_length, 0);
}

#[test]
fn memory_flag_requires_available_memory() {
    let mut pages = FakePages::new(2);
    let mut builder = BootInfoBuilder::new(&mut pages).unwrap();

    let raw = descriptors(&[(0, 0, 1), (11, 0x1000, 1)]);
    let table = DescriptorTable::new(&raw, 40).unwrap();
    builder.set_memory_map_now(&table).unwrap();

    let info = builder.finish().info;
    assert!(info.flags.mem_map());
    assert!(!info.flags.memory());
    assert_eq!(info.mmap_length, 24);
}
