//! # UEFI Memory Map Hand-Over
//!
//! The memory map is only final once boot services are gone. The page it is
//! translated into is reserved beforehand through
//! [`BootInfoBuilder::memory_map_slot`].

use crate::error::LoaderError;
use crate::logger::UefiLogger;
use crate::pages::UefiPageAllocator;
use boot_info::{BootInfoBuilder, DescriptorTable, MemoryMapSlot, MemoryMapSummary};
use log::info;
use uefi::boot;
use uefi::mem::memory_map::{MemoryMap, MemoryMapMut, MemoryMapOwned};

/// Exit boot services and return the final memory map, sorted by address.
///
/// From here on only the QEMU debug console is available for output.
pub fn exit_boot_services(logger: &UefiLogger) -> MemoryMapOwned {
    info!("Exiting boot services ...");
    logger.exit_boot_services();

    // SAFETY: No protocol or boot services allocation is used past this point;
    // everything the kernel needs lives in pages that stay allocated.
    let mut map = unsafe { boot::exit_boot_services(None) };
    map.sort();

    info!("Boot services exited, we're now flying by instruments.");
    map
}

/// Translate `map` into `slot` and publish it.
pub fn publish(
    builder: &mut BootInfoBuilder<UefiPageAllocator>,
    slot: MemoryMapSlot,
    map: &MemoryMapOwned,
) -> Result<MemoryMapSummary, LoaderError> {
    let meta = map.meta();
    let buffer = map.buffer();
    let bytes = &buffer[..meta.map_size.min(buffer.len())];

    let table = DescriptorTable::new(bytes, meta.desc_size)?;
    let summary = builder.set_memory_map(slot, &table)?;

    match summary.bounds {
        Some(bounds) => info!(
            "Memory map: {} regions, available {} KiB .. {} KiB",
            summary.entries, bounds.lower_kb, bounds.upper_kb
        ),
        None => info!("Memory map: {} regions, none available", summary.entries),
    }
    Ok(summary)
}
