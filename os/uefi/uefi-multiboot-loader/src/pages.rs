//! # Firmware Page Allocation

use crate::config::MAX_32BIT_ADDR;
use boot_info::{Page, PageAllocator, PageFrame};
use core::ptr::NonNull;
use uefi::boot::{self, AllocateType, MemoryType};

/// [`PageAllocator`] on top of `AllocatePages(AllocateMaxAddress)`.
pub struct UefiPageAllocator;

impl PageAllocator for UefiPageAllocator {
    type Error = uefi::Error;

    fn allocate_page(&mut self, max_addr: u64) -> Result<PageFrame, Self::Error> {
        let ptr = boot::allocate_pages(
            AllocateType::MaxAddress(max_addr),
            MemoryType::LOADER_DATA,
            1,
        )?;

        // SAFETY: A fresh, page aligned page we own forever; memory is identity mapped.
        let page = unsafe { &mut *ptr.as_ptr().cast::<Page>() };
        Ok(PageFrame::new(ptr.as_ptr() as u64, page))
    }
}

/// Allocate `count` contiguous pages that end below 4 GiB.
pub fn allocate_low_pages(count: usize, memory_type: MemoryType) -> uefi::Result<NonNull<u8>> {
    boot::allocate_pages(AllocateType::MaxAddress(MAX_32BIT_ADDR), memory_type, count)
}
