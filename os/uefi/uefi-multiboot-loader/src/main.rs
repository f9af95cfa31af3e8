//! # UEFI Multiboot Loader
//!
//! A UEFI application that boots a Multiboot (v1) kernel: it loads the kernel
//! and its ramdisk from the EFI system partition, picks a graphics mode,
//! describes the machine in a Multiboot information record and enters the
//! kernel in 32-bit protected mode.
//!
//! ## Boot Sequence
//!
//! ```text
//! UEFI Firmware
//!         ↓
//! ┌─────────────────────────────────────────────┐
//! │         UEFI Multiboot Loader               │
//! ├─────────────────────────────────────────────┤
//! │  1. Load KERNEL.ELF, place PT_LOAD segments │
//! │  2. Load RAMDISK.IMG below 4 GiB            │
//! │  3. Rank GOP modes, select and set one      │
//! │  4. Assemble boot information               │
//! │     • framebuffer                           │
//! │     • ramdisk module                        │
//! │     • boot loader name                      │
//! │     • ACPI RSDP                             │
//! │     • memory map page (reserved)            │
//! │  5. Exit boot services                      │
//! │  6. Translate the final memory map          │
//! │  7. Leave long mode, jump to the kernel     │
//! └─────────────────────────────────────────────┘
//!         ↓
//! Kernel (EAX = 0x2BADB002, EBX = &multiboot_info)
//! ```
//!
//! Every page the kernel receives a pointer to is allocated from firmware
//! below 4 GiB; the record and its small payloads within the first 64 KiB.
//! The loader itself has no heap.
//!
//! ## Debugging
//!
//! With the `qemu` feature, all log output is mirrored to QEMU's debug
//! console (`-debugcon file:debug.log`), which keeps working after boot
//! services are gone. The final record is dumped there right before the jump.

#![no_std]
#![no_main]
#![allow(unsafe_code)]

mod acpi;
mod config;
mod console;
mod elf;
mod error;
mod file_system;
mod gop;
mod handoff;
mod logger;
mod memory_map;
mod pages;
mod tracing;

use crate::config::{KERNEL_PATH, RAMDISK_PATH};
use crate::console::UefiConsole;
use crate::elf::loader::{ElfLoaderError, load_segments};
use crate::elf::parser::ElfImage;
use crate::error::LoaderError;
use crate::file_system::load_file;
use crate::handoff::{Trampoline, halt};
use crate::logger::UefiLogger;
use crate::pages::UefiPageAllocator;
use boot_info::{BootInfoBuilder, BootInfoError, MemoryMapSlot, RsdpHandoff};
use log::{info, warn};
use uefi::prelude::*;

/// Everything prepared while boot services were still available.
struct Prepared {
    entry: u32,
    builder: BootInfoBuilder<UefiPageAllocator>,
    memory_map: MemoryMapSlot,
    trampoline: Trampoline,
}

#[entry]
fn efi_main() -> Status {
    let Ok(logger) = UefiLogger::init() else {
        return Status::ABORTED;
    };

    info!("UEFI Multiboot loader reporting to QEMU");

    match prepare() {
        Ok(prepared) => boot(logger, prepared),
        Err(e) => {
            e.report();
            e.into()
        }
    }
}

fn prepare() -> Result<Prepared, LoaderError> {
    info!("Loading kernel {KERNEL_PATH} ...");
    let image = load_file(KERNEL_PATH).map_err(|source| LoaderError::File {
        what: "kernel",
        source,
    })?;
    let entry = ElfImage::parse(image.bytes())
        .map_err(ElfLoaderError::from)
        .and_then(|elf| load_segments(&elf));
    image.free();
    let entry = entry?;
    info!("Kernel loaded, entry at {entry:#010x}");

    info!("Loading ramdisk {RAMDISK_PATH} ...");
    let ramdisk = load_file(RAMDISK_PATH).map_err(|source| LoaderError::File {
        what: "ramdisk",
        source,
    })?;

    let mut console = UefiConsole;
    let mut gop = gop::open()?;
    let mode = gop::choose_mode(&gop, &mut console)?;
    let framebuffer = gop::apply_mode(&mut gop, mode)?;

    let mut builder = BootInfoBuilder::new(UefiPageAllocator)?;
    match builder.set_framebuffer(&framebuffer) {
        Ok(()) => {}
        Err(BootInfoError::UnsupportedPixelLayout(layout)) => {
            warn!("Booting without a framebuffer: {layout:?} has no linear framebuffer");
        }
        Err(e) => return Err(e.into()),
    }

    builder.set_ramdisk(ramdisk.phys(), ramdisk.len() as u64)?;
    builder.set_boot_loader_name()?;

    match acpi::publish_rsdp(&mut builder) {
        Ok(RsdpHandoff::Published(addr)) => info!("ACPI RSDP at {addr:#x}"),
        Ok(RsdpHandoff::OutOf32BitRange(_)) => {}
        Err(e) if !e.is_fatal() => warn!("{e}"),
        Err(e) => return Err(e.into()),
    }

    let memory_map = builder.memory_map_slot()?;
    let trampoline = Trampoline::install().map_err(LoaderError::Trampoline)?;

    Ok(Prepared {
        entry,
        builder,
        memory_map,
        trampoline,
    })
}

fn boot(logger: &UefiLogger, prepared: Prepared) -> ! {
    let Prepared {
        entry,
        mut builder,
        memory_map,
        trampoline,
    } = prepared;

    let map = memory_map::exit_boot_services(logger);
    if let Err(e) = memory_map::publish(&mut builder, memory_map, &map) {
        // Nothing to return to.
        e.report();
        halt();
    }

    let handoff = builder.finish();
    tracing::trace_boot_info(&handoff, entry);

    info!("Jumping to the kernel. Ciao Kakao ...");
    // SAFETY: Boot services are gone, the kernel segments and the record
    // live in pages that were never freed.
    unsafe { trampoline.enter(entry, handoff.phys) }
}
