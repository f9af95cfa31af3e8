//! # ELF Segment Loader

use crate::elf::parser::{ElfImage, ElfParseError};
use boot_info::config::PAGE_SIZE;
use core::ptr;
use log::debug;
use uefi::Status;
use uefi::boot::{self, AllocateType, MemoryType};

#[derive(Debug, thiserror::Error)]
pub enum ElfLoaderError {
    #[error(transparent)]
    Parse(#[from] ElfParseError),
    #[error("segment at {0:#x} wraps around the 32-bit address space")]
    PointerArithmetic(u32),
    #[error("segment file size exceeds its memory size or the image")]
    ElfSizeMismatch,
    #[error("failed to allocate the pages at {addr:#x} for a segment")]
    PhysicalAllocationFailed {
        addr: u64,
        #[source]
        source: uefi::Error,
    },
    #[error("the image has no loadable segment")]
    NoSegments,
}

impl From<ElfLoaderError> for Status {
    fn from(value: ElfLoaderError) -> Self {
        match value {
            ElfLoaderError::PhysicalAllocationFailed { .. } => Self::OUT_OF_RESOURCES,
            ElfLoaderError::Parse(_) | ElfLoaderError::NoSegments => Self::LOAD_ERROR,
            ElfLoaderError::PointerArithmetic(_) | ElfLoaderError::ElfSizeMismatch => {
                Self::BAD_BUFFER_SIZE
            }
        }
    }
}

/// Copy all `PT_LOAD` segments of `image` to their physical addresses.
///
/// Returns the entry point.
#[allow(clippy::cast_possible_truncation)]
pub fn load_segments(image: &ElfImage<'_>) -> Result<u32, ElfLoaderError> {
    let bytes = image.bytes();
    let mut loaded = 0usize;

    for seg in image.segments() {
        if seg.memsz == 0 {
            continue;
        }
        if seg.filesz > seg.memsz {
            return Err(ElfLoaderError::ElfSizeMismatch);
        }

        let phys_start = u64::from(seg.paddr);
        let phys_end = seg
            .paddr
            .checked_add(seg.memsz)
            .ok_or(ElfLoaderError::PointerArithmetic(seg.paddr))?;

        let file_start = seg.offset as usize;
        let file_end = file_start
            .checked_add(seg.filesz as usize)
            .ok_or(ElfLoaderError::ElfSizeMismatch)?;
        if file_end > bytes.len() {
            return Err(ElfLoaderError::ElfSizeMismatch);
        }

        let page_mask = PAGE_SIZE as u64 - 1;
        let alloc_start = phys_start & !page_mask;
        let alloc_end = (u64::from(phys_end) + page_mask) & !page_mask;
        let pages = ((alloc_end - alloc_start) / PAGE_SIZE as u64) as usize;

        let mem_type = if seg.flags.execute() {
            MemoryType::LOADER_CODE
        } else {
            MemoryType::LOADER_DATA
        };

        let base = boot::allocate_pages(AllocateType::Address(alloc_start), mem_type, pages)
            .map_err(|source| ElfLoaderError::PhysicalAllocationFailed {
                addr: alloc_start,
                source,
            })?;

        // SAFETY: The pages at `alloc_start` were just allocated, are identity
        // mapped and cover `phys_start..phys_end`. The source range was bounds checked.
        unsafe {
            let dst = base.as_ptr().add((phys_start - alloc_start) as usize);
            ptr::write_bytes(dst, 0, seg.memsz as usize);
            ptr::copy_nonoverlapping(bytes.as_ptr().add(file_start), dst, seg.filesz as usize);
        }

        debug!(
            "Segment {phys_start:#010x}..{phys_end:#010x} ({} bytes from file, {}{}{})",
            seg.filesz,
            if seg.flags.read() { 'r' } else { '-' },
            if seg.flags.write() { 'w' } else { '-' },
            if seg.flags.execute() { 'x' } else { '-' },
        );
        loaded += 1;
    }

    if loaded == 0 {
        return Err(ElfLoaderError::NoSegments);
    }
    Ok(image.entry)
}
