//! # Boot Stage Constants

use core::ffi::CStr;

/// Size of one firmware page.
pub const PAGE_SIZE: usize = 4096;

/// Highest physical address of any page holding boot information.
///
/// Multiboot only carries 32-bit pointers. Keeping the record and its payload
/// pages in the first 64 KiB also keeps them clear of where kernels are loaded.
pub const BOOT_INFO_MAX_ADDR: u64 = 64 * 1024;

/// Identity string published to the kernel.
///
/// The kernel relies on it to know that the APM table slot carries the ACPI
/// RSDP instead; see [`MultibootInfo::acpi_rsdp`](crate::MultibootInfo::acpi_rsdp).
pub const BOOT_LOADER_NAME: &CStr = c"UEFI_MULTIBOOT";

/// Value passed in `EAX` when jumping to a Multiboot kernel.
pub const MULTIBOOT_BOOTLOADER_MAGIC: u32 = 0x2BAD_B002;

const _: () = {
    assert!(BOOT_LOADER_NAME.to_bytes_with_nul().len() <= PAGE_SIZE);
    assert!(BOOT_INFO_MAX_ADDR <= u32::MAX as u64);
};
