//! # Multiboot Information Record
//!
//! Bit-exact layouts of the structures a Multiboot (v1) kernel reads at hand-off.
//! All pointers are 32-bit physical addresses.

use crate::region::RegionType;
use bitfield_struct::bitfield;
use core::mem::offset_of;

/// `flags` word of [`MultibootInfo`]: which optional fields are valid.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct InfoFlags {
    /// `mem_lower` / `mem_upper` (bit 0).
    pub memory: bool,
    /// `boot_device` (bit 1).
    pub boot_device: bool,
    /// `cmdline` (bit 2).
    pub cmdline: bool,
    /// `mods_count` / `mods_addr` (bit 3).
    pub mods: bool,
    /// a.out symbol table (bit 4).
    pub aout_syms: bool,
    /// ELF section headers (bit 5).
    pub elf_shdr: bool,
    /// `mmap_length` / `mmap_addr` (bit 6).
    pub mem_map: bool,
    /// `drives_length` / `drives_addr` (bit 7).
    pub drive_info: bool,
    /// `config_table` (bit 8).
    pub config_table: bool,
    /// `boot_loader_name` (bit 9).
    pub boot_loader_name: bool,
    /// APM table (bit 10). Never set by this loader.
    pub apm_table: bool,
    /// VBE fields (bit 11).
    pub vbe_info: bool,
    /// Framebuffer fields (bit 12).
    pub framebuffer_info: bool,
    #[bits(19)]
    __: u32,
}

/// `framebuffer_type` values.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FramebufferType {
    Indexed = 0,
    Rgb = 1,
    EgaText = 2,
}

/// Channel layout of an RGB framebuffer (`framebuffer_type == 1`).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RgbFieldLayout {
    pub red_field_position: u8,
    pub red_mask_size: u8,
    pub green_field_position: u8,
    pub green_mask_size: u8,
    pub blue_field_position: u8,
    pub blue_mask_size: u8,
}

/// The Multiboot information structure.
#[repr(C)]
#[derive(Debug)]
pub struct MultibootInfo {
    pub flags: InfoFlags,
    /// Lowest start of available memory, in KiB.
    pub mem_lower: u32,
    /// Highest end of available memory, in KiB.
    pub mem_upper: u32,
    pub boot_device: u32,
    pub cmdline: u32,
    pub mods_count: u32,
    pub mods_addr: u32,
    /// a.out or ELF symbol information; unused.
    pub syms: [u32; 4],
    /// Length of the memory map in bytes.
    pub mmap_length: u32,
    pub mmap_addr: u32,
    pub drives_length: u32,
    pub drives_addr: u32,
    pub config_table: u32,
    pub boot_loader_name: u32,
    /// Physical address of the ACPI 2.0 RSDP, or 0.
    ///
    /// Multiboot v1 has no ACPI field; the RSDP travels in the APM table slot.
    /// [`InfoFlags::apm_table`] stays clear so generic kernels ignore the slot.
    /// It is only meaningful together with
    /// [`BOOT_LOADER_NAME`](crate::config::BOOT_LOADER_NAME).
    pub acpi_rsdp: u32,
    pub vbe_control_info: u32,
    pub vbe_mode_info: u32,
    pub vbe_mode: u16,
    pub vbe_interface_seg: u16,
    pub vbe_interface_off: u16,
    pub vbe_interface_len: u16,
    pub framebuffer_addr: u64,
    /// Bytes per scanline.
    pub framebuffer_pitch: u32,
    pub framebuffer_width: u32,
    pub framebuffer_height: u32,
    pub framebuffer_bpp: u8,
    pub framebuffer_type: u8,
    pub framebuffer_rgb: RgbFieldLayout,
}

/// One entry of the memory map.
///
/// `size` counts the bytes following it, so a kernel walks the map with
/// `entry + size + 4`.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MmapEntry {
    pub size: u32,
    pub addr: u64,
    pub len: u64,
    pub kind: u32,
}

impl MmapEntry {
    /// Bytes following the `size` field.
    #[allow(clippy::cast_possible_truncation)]
    pub const SIZE_FIELD: u32 = (size_of::<Self>() - size_of::<u32>()) as u32;

    #[must_use]
    pub const fn new(start: u64, end: u64, kind: RegionType) -> Self {
        Self {
            size: Self::SIZE_FIELD,
            addr: start,
            len: end - start,
            kind: kind as u32,
        }
    }

    #[must_use]
    pub const fn start(&self) -> u64 {
        self.addr
    }

    #[must_use]
    pub const fn end(&self) -> u64 {
        self.addr + self.len
    }

    #[must_use]
    pub const fn region_type(&self) -> Option<RegionType> {
        RegionType::from_raw(self.kind)
    }
}

/// One boot module (the ramdisk).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModuleEntry {
    pub mod_start: u32,
    /// Exclusive end address.
    pub mod_end: u32,
    /// Module command line; unused.
    pub cmdline: u32,
    pub reserved: u32,
}

const _: () = {
    assert!(size_of::<InfoFlags>() == 4);
    assert!(size_of::<MmapEntry>() == 24);
    assert!(MmapEntry::SIZE_FIELD == 20);
    assert!(size_of::<ModuleEntry>() == 16);

    assert!(offset_of!(MultibootInfo, flags) == 0);
    assert!(offset_of!(MultibootInfo, mem_lower) == 4);
    assert!(offset_of!(MultibootInfo, mem_upper) == 8);
    assert!(offset_of!(MultibootInfo, boot_device) == 12);
    assert!(offset_of!(MultibootInfo, cmdline) == 16);
    assert!(offset_of!(MultibootInfo, mods_count) == 20);
    assert!(offset_of!(MultibootInfo, mods_addr) == 24);
    assert!(offset_of!(MultibootInfo, syms) == 28);
    assert!(offset_of!(MultibootInfo, mmap_length) == 44);
    assert!(offset_of!(MultibootInfo, mmap_addr) == 48);
    assert!(offset_of!(MultibootInfo, drives_length) == 52);
    assert!(offset_of!(MultibootInfo, drives_addr) == 56);
    assert!(offset_of!(MultibootInfo, config_table) == 60);
    assert!(offset_of!(MultibootInfo, boot_loader_name) == 64);
    assert!(offset_of!(MultibootInfo, acpi_rsdp) == 68);
    assert!(offset_of!(MultibootInfo, vbe_control_info) == 72);
    assert!(offset_of!(MultibootInfo, vbe_mode_info) == 76);
    assert!(offset_of!(MultibootInfo, vbe_mode) == 80);
    assert!(offset_of!(MultibootInfo, vbe_interface_seg) == 82);
    assert!(offset_of!(MultibootInfo, vbe_interface_off) == 84);
    assert!(offset_of!(MultibootInfo, vbe_interface_len) == 86);
    assert!(offset_of!(MultibootInfo, framebuffer_addr) == 88);
    assert!(offset_of!(MultibootInfo, framebuffer_pitch) == 96);
    assert!(offset_of!(MultibootInfo, framebuffer_width) == 100);
    assert!(offset_of!(MultibootInfo, framebuffer_height) == 104);
    assert!(offset_of!(MultibootInfo, framebuffer_bpp) == 108);
    assert!(offset_of!(MultibootInfo, framebuffer_type) == 109);
    assert!(offset_of!(MultibootInfo, framebuffer_rgb) == 110);

    assert!(offset_of!(MmapEntry, addr) == 4);
    assert!(offset_of!(MmapEntry, len) == 12);
    assert!(offset_of!(MmapEntry, kind) == 20);
};
