//! # Multiboot Hand-Off
//!
//! UEFI runs the loader in 64-bit long mode with paging enabled. A Multiboot
//! kernel is entered in 32-bit protected mode with paging disabled:
//!
//! ```text
//! long mode (loader)
//!     ↓ lgdt, far return to a 32-bit code segment
//! compatibility mode (trampoline page below 4 GiB, identity mapped)
//!     ↓ CR0.PG = 0, EFER.LME = 0, CR4.PAE = 0
//! protected mode
//!     ↓ EAX = 0x2BADB002, EBX = boot information
//! kernel entry
//! ```
//!
//! The trampoline is position independent except for its GDT pointer, which
//! is patched after the code was copied into its page.

use crate::pages::allocate_low_pages;
use boot_info::config::{MULTIBOOT_BOOTLOADER_MAGIC, PAGE_SIZE};
use core::ptr::{self, NonNull};
use uefi::boot::MemoryType;

/// Offset of the base address within a GDT pointer.
const GDTR_BASE_OFFSET: usize = 2;

core::arch::global_asm!(
    ".balign 16",
    ".global multiboot_trampoline_start",
    "multiboot_trampoline_start:",
    ".code64",
    // rdi = kernel entry, rsi = boot information, rdx = trampoline base
    "cli",
    ".set multiboot_trampoline_gdtr_offset, multiboot_trampoline_gdtr - multiboot_trampoline_start",
    "lgdt [rdx + multiboot_trampoline_gdtr_offset]",
    "lea rax, [rip + 2f]",
    "push 0x08",
    "push rax",
    "retfq",
    ".code32",
    "2:",
    "mov ax, 0x10",
    "mov ds, ax",
    "mov es, ax",
    "mov fs, ax",
    "mov gs, ax",
    "mov ss, ax",
    "mov eax, cr0",
    "and eax, 0x7fffffff",
    "mov cr0, eax",
    "mov ecx, 0xc0000080",
    "rdmsr",
    "and eax, 0xfffffeff",
    "wrmsr",
    "mov eax, cr4",
    "and eax, 0xffffffdf",
    "mov cr4, eax",
    "mov eax, {magic}",
    "mov ebx, esi",
    "jmp edi",
    ".balign 8",
    ".global multiboot_trampoline_gdt",
    "multiboot_trampoline_gdt:",
    ".quad 0",
    // 0x08: flat 32-bit code
    ".quad 0x00cf9a000000ffff",
    // 0x10: flat 32-bit data
    ".quad 0x00cf92000000ffff",
    ".global multiboot_trampoline_gdtr",
    "multiboot_trampoline_gdtr:",
    ".word 3 * 8 - 1",
    ".quad 0",
    ".global multiboot_trampoline_end",
    "multiboot_trampoline_end:",
    ".code64",
    magic = const MULTIBOOT_BOOTLOADER_MAGIC,
);

#[allow(non_upper_case_globals)]
unsafe extern "C" {
    safe static multiboot_trampoline_start: u8;
    safe static multiboot_trampoline_gdt: u8;
    safe static multiboot_trampoline_gdtr: u8;
    safe static multiboot_trampoline_end: u8;
}

/// The trampoline, copied to a page below 4 GiB.
pub struct Trampoline {
    base: NonNull<u8>,
}

impl Trampoline {
    /// Copy the trampoline into its own page. Requires boot services.
    pub fn install() -> uefi::Result<Self> {
        let start = (&raw const multiboot_trampoline_start).addr();
        let gdt = (&raw const multiboot_trampoline_gdt).addr() - start;
        let gdtr = (&raw const multiboot_trampoline_gdtr).addr() - start;
        let len = (&raw const multiboot_trampoline_end).addr() - start;
        debug_assert!(len <= PAGE_SIZE);

        let base = allocate_low_pages(1, MemoryType::LOADER_CODE)?;

        // SAFETY: The page is fresh and at least `len` bytes large; the source is
        // our own code. `gdtr + 2 + 8 <= len` by the layout above.
        unsafe {
            ptr::copy_nonoverlapping(&raw const multiboot_trampoline_start, base.as_ptr(), len);
            let gdt_base = base.as_ptr() as u64 + gdt as u64;
            base.as_ptr()
                .add(gdtr + GDTR_BASE_OFFSET)
                .cast::<u64>()
                .write_unaligned(gdt_base);
        }

        Ok(Self { base })
    }

    /// Leave long mode and jump to `entry`.
    ///
    /// # Safety
    /// Boot services must have been exited, the kernel must be loaded at
    /// `entry` and `boot_info` must point to the finished record.
    pub unsafe fn enter(self, entry: u32, boot_info: u32) -> ! {
        unsafe {
            core::arch::asm!(
                "jmp rax",
                in("rax") self.base.as_ptr(),
                in("rdi") u64::from(entry),
                in("rsi") u64::from(boot_info),
                in("rdx") self.base.as_ptr(),
                options(noreturn)
            )
        }
    }
}

/// Stop the CPU for good.
pub fn halt() -> ! {
    loop {
        // SAFETY: Only stops this CPU.
        unsafe {
            core::arch::asm!("cli", "hlt", options(nomem, nostack));
        }
    }
}
