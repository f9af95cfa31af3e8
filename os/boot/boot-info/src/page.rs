//! # Firmware-Granted Pages
#![allow(unsafe_code)]

use crate::config::PAGE_SIZE;
use crate::record::{MmapEntry, ModuleEntry, MultibootInfo};
use core::ptr;

/// One 4 KiB page of identity-mapped memory.
#[repr(C, align(4096))]
pub struct Page(pub [u8; PAGE_SIZE]);

impl Page {
    pub const ZERO: Self = Self([0; PAGE_SIZE]);
}

/// A page handed out by a [`PageAllocator`], together with its physical address.
///
/// The page is never freed: ownership passes to the kernel at hand-off.
pub struct PageFrame {
    phys: u64,
    page: &'static mut Page,
}

impl PageFrame {
    /// Wrap an allocated page.
    ///
    /// `phys` must be the physical address of `page`; before `ExitBootServices`
    /// UEFI identity-maps all memory, so it is simply the pointer value.
    #[must_use]
    pub const fn new(phys: u64, page: &'static mut Page) -> Self {
        Self { phys, page }
    }

    #[must_use]
    pub const fn phys(&self) -> u64 {
        self.phys
    }

    /// Zero the page and view it as the record type `T`.
    pub(crate) fn into_zeroed<T: Zeroable>(self) -> &'static mut T {
        const { assert!(size_of::<T>() <= PAGE_SIZE && align_of::<T>() <= PAGE_SIZE) };
        self.page.0.fill(0);
        // SAFETY: The page is exclusively owned, large and aligned enough for `T`,
        // and all-zero bytes are a valid `T` (see `Zeroable`).
        unsafe { &mut *ptr::from_mut(self.page).cast::<T>() }
    }

    /// Zero the page and view it as an array of as many `T` as fit.
    pub(crate) fn into_zeroed_slice<T: Zeroable>(self) -> &'static mut [T] {
        const { assert!(size_of::<T>() > 0 && align_of::<T>() <= PAGE_SIZE) };
        self.page.0.fill(0);
        let len = PAGE_SIZE / size_of::<T>();
        // SAFETY: As in `into_zeroed`; `len` elements fit into the page.
        unsafe { core::slice::from_raw_parts_mut(ptr::from_mut(self.page).cast::<T>(), len) }
    }

    pub(crate) fn into_zeroed_bytes(self) -> &'static mut [u8; PAGE_SIZE] {
        let page = self.page;
        page.0.fill(0);
        &mut page.0
    }
}

/// Allocates single pages from firmware.
pub trait PageAllocator {
    type Error: core::error::Error + 'static;

    /// Allocate one page whose physical address is at most `max_addr`.
    ///
    /// The contents are unspecified; callers zero the page.
    ///
    /// # Errors
    /// Allocator specific, e.g. no free page below `max_addr`.
    fn allocate_page(&mut self, max_addr: u64) -> Result<PageFrame, Self::Error>;
}

impl<A: PageAllocator + ?Sized> PageAllocator for &mut A {
    type Error = A::Error;

    fn allocate_page(&mut self, max_addr: u64) -> Result<PageFrame, Self::Error> {
        (**self).allocate_page(max_addr)
    }
}

/// Types for which the all-zero byte pattern is a valid value.
///
/// # Safety
/// Implementors must be plain data: no references, no drop glue, no niches at zero.
pub unsafe trait Zeroable {}

// SAFETY: Integers and integer aggregates only.
unsafe impl Zeroable for MultibootInfo {}
// SAFETY: Integers only.
unsafe impl Zeroable for MmapEntry {}
// SAFETY: Integers only.
unsafe impl Zeroable for ModuleEntry {}
