//! # Trace output

use boot_info::{BootInfoHandoff, FramebufferType};
use boot_qemu::qemu_trace;

pub fn trace_boot_info(handoff: &BootInfoHandoff, entry: u32) {
    let info = handoff.info;

    qemu_trace!("Multiboot info at {:#010x}", handoff.phys);
    qemu_trace!(", flags = {:#06x}", info.flags.into_bits());
    qemu_trace!(", kernel entry = {entry:#010x}\n");

    if info.flags.memory() {
        qemu_trace!(
            "   mem_lower = {} KiB, mem_upper = {} KiB\n",
            info.mem_lower,
            info.mem_upper
        );
    }

    if info.flags.mem_map() {
        qemu_trace!(
            " MMAP addr = {:#010x}, MMAP len = {}\n",
            info.mmap_addr,
            info.mmap_length
        );
        for entry in handoff.memory_map {
            let kind = entry.kind;
            qemu_trace!(
                "   {:#014x} .. {:#014x} type {kind}\n",
                entry.start(),
                entry.end()
            );
        }
    }

    if let Some(module) = handoff.module {
        qemu_trace!(
            "  ramdisk = {:#010x} .. {:#010x}\n",
            module.mod_start,
            module.mod_end
        );
    }

    if let Some(name) = handoff.loader_name {
        qemu_trace!("   loader = {name:?}");
        qemu_trace!(", rsdp addr = {:#010x}\n", info.acpi_rsdp);
    }

    if info.flags.framebuffer_info() {
        let rgb = info.framebuffer_rgb;
        qemu_trace!("   FB ptr = {:#018x}", info.framebuffer_addr);
        qemu_trace!(", FB width = {}", info.framebuffer_width);
        qemu_trace!(", FB height = {}", info.framebuffer_height);
        qemu_trace!(", FB pitch = {}", info.framebuffer_pitch);
        qemu_trace!(", FB bpp = {}", info.framebuffer_bpp);
        if info.framebuffer_type == FramebufferType::Rgb as u8 {
            qemu_trace!(
                ", R {}/{} G {}/{} B {}/{}",
                rgb.red_field_position,
                rgb.red_mask_size,
                rgb.green_field_position,
                rgb.green_mask_size,
                rgb.blue_field_position,
                rgb.blue_mask_size
            );
        }
        qemu_trace!("\n");
    }
}
