//! # Multiboot Boot Information
//!
//! Builds the Multiboot (v1) information record a kernel receives in `EBX`
//! from what UEFI firmware reports: the memory map, the active framebuffer,
//! the ramdisk, the boot loader identity and the ACPI RSDP.
//!
//! The crate never allocates on its own. Every piece of the record lives in a
//! page obtained through [`PageAllocator`], which the loader implements with
//! `AllocatePages`; the host tests implement it over leaked boxes.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod builder;
pub mod config;
mod framebuffer;
mod memory_map;
mod page;
mod record;
mod region;

pub use builder::{
    BootInfoBuilder, BootInfoError, BootInfoHandoff, ConfigTableEntry, MemoryMapSlot, RsdpHandoff,
};
pub use framebuffer::{FramebufferMode, PixelLayout};
pub use memory_map::{
    DescriptorTable, FirmwareDescriptor, MIN_DESCRIPTOR_SIZE, MemoryBounds, MemoryMapError,
    MemoryMapSummary, translate_memory_map,
};
pub use page::{Page, PageAllocator, PageFrame};
pub use record::{
    FramebufferType, InfoFlags, MmapEntry, ModuleEntry, MultibootInfo, RgbFieldLayout,
};
pub use region::{FirmwareMemoryType, RegionType};
