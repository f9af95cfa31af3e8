use crate::pages::allocate_low_pages;
use boot_info::config::PAGE_SIZE;
use core::ptr::NonNull;
use log::debug;
use uefi::boot::{self, MemoryType};
use uefi::proto::media::file::{File, FileAttribute, FileMode, RegularFile};
use uefi::{CStr16, Status};

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("failed to open the boot volume")]
    Volume(#[source] uefi::Error),
    #[error("failed to open the file")]
    Open(#[source] uefi::Error),
    #[error("not a regular file")]
    NotAFile,
    #[error("failed to determine the file size")]
    Size(#[source] uefi::Error),
    #[error("the file is too large")]
    TooLarge,
    #[error("the file is empty")]
    Empty,
    #[error("failed to allocate {0} pages below 4 GiB")]
    Allocation(usize, #[source] uefi::Error),
    #[error("failed to read the file")]
    Read(#[source] uefi::Error),
    #[error("read {read} bytes, expected {expected}")]
    ShortRead { read: usize, expected: usize },
}

impl From<FileError> for Status {
    fn from(value: FileError) -> Self {
        match value {
            FileError::Volume(e) | FileError::Open(e) | FileError::Size(e) | FileError::Read(e) => {
                e.status()
            }
            FileError::Allocation(..) => Self::OUT_OF_RESOURCES,
            FileError::NotAFile | FileError::Empty => Self::LOAD_ERROR,
            FileError::TooLarge => Self::BAD_BUFFER_SIZE,
            FileError::ShortRead { .. } => Self::END_OF_FILE,
        }
    }
}

/// A file read into firmware pages below 4 GiB.
pub struct LoadedFile {
    base: NonNull<u8>,
    len: usize,
}

impl LoadedFile {
    pub fn phys(&self) -> u64 {
        self.base.as_ptr() as u64
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn bytes(&self) -> &[u8] {
        // SAFETY: `base` points to at least `len` initialized bytes we own.
        unsafe { core::slice::from_raw_parts(self.base.as_ptr(), self.len) }
    }

    const fn pages(&self) -> usize {
        self.len.div_ceil(PAGE_SIZE)
    }

    /// Return the pages to the firmware.
    pub fn free(self) {
        // SAFETY: The pages were allocated by `load_file` and are not referenced any more.
        if let Err(e) = unsafe { boot::free_pages(self.base, self.pages()) } {
            debug!("Failed to free {} pages: {e:?}", self.pages());
        }
    }
}

/// Load a file from the volume the loader was started from.
///
/// # Errors
/// A [`FileError`] naming the failing step.
pub fn load_file(path: &CStr16) -> Result<LoadedFile, FileError> {
    let mut sfs = boot::get_image_file_system(boot::image_handle()).map_err(FileError::Volume)?;
    let mut volume = sfs.open_volume().map_err(FileError::Volume)?;

    let handle = volume
        .open(path, FileMode::Read, FileAttribute::empty())
        .map_err(FileError::Open)?;
    let mut file = handle.into_regular_file().ok_or(FileError::NotAFile)?;

    file.set_position(RegularFile::END_OF_FILE)
        .map_err(FileError::Size)?;
    let size = file.get_position().map_err(FileError::Size)?;
    file.set_position(0).map_err(FileError::Size)?;

    let len = usize::try_from(size).map_err(|_| FileError::TooLarge)?;
    if len == 0 {
        return Err(FileError::Empty);
    }

    let pages = len.div_ceil(PAGE_SIZE);
    let base = allocate_low_pages(pages, MemoryType::LOADER_DATA)
        .map_err(|e| FileError::Allocation(pages, e))?;
    let loaded = LoadedFile { base, len };

    // SAFETY: `pages` fresh pages hold at least `len` bytes.
    let buf = unsafe { core::slice::from_raw_parts_mut(base.as_ptr(), len) };
    let read = match file.read(buf) {
        Ok(read) => read,
        Err(e) => {
            loaded.free();
            return Err(FileError::Read(uefi::Error::from(e.status())));
        }
    };

    if read != len {
        loaded.free();
        return Err(FileError::ShortRead {
            read,
            expected: len,
        });
    }

    debug!("Loaded {path} ({len} bytes) at {:#x}", loaded.phys());
    Ok(loaded)
}
