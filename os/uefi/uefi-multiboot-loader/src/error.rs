use crate::elf::loader::ElfLoaderError;
use crate::file_system::FileError;
use crate::gop::GopError;
use boot_info::{BootInfoError, MemoryMapError};
use log::error;
use uefi::Status;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to load the {what}")]
    File {
        what: &'static str,
        #[source]
        source: FileError,
    },
    #[error("failed to load the kernel image")]
    Kernel(#[from] ElfLoaderError),
    #[error("failed to set up the video mode")]
    Video(#[from] GopError),
    #[error("failed to assemble the boot information")]
    BootInfo(#[from] BootInfoError<uefi::Error>),
    #[error("the firmware memory map is unusable")]
    MemoryMap(#[from] MemoryMapError),
    #[error("failed to install the hand-off trampoline")]
    Trampoline(#[source] uefi::Error),
}

impl LoaderError {
    /// Log the error and its causes.
    pub fn report(&self) {
        error!("{self}");
        let mut source = core::error::Error::source(self);
        while let Some(cause) = source {
            error!("  caused by: {cause}");
            source = cause.source();
        }
    }
}

impl From<LoaderError> for Status {
    fn from(value: LoaderError) -> Self {
        match value {
            LoaderError::File { source, .. } => source.into(),
            LoaderError::Kernel(e) => e.into(),
            LoaderError::Video(e) => e.into(),
            LoaderError::BootInfo(BootInfoError::PageAllocation { source, .. })
            | LoaderError::Trampoline(source) => source.status(),
            LoaderError::BootInfo(BootInfoError::MemoryMap(_)) | LoaderError::MemoryMap(_) => {
                Self::BUFFER_TOO_SMALL
            }
            LoaderError::BootInfo(BootInfoError::AcpiTableNotFound) => Self::NOT_FOUND,
            LoaderError::BootInfo(_) => Self::UNSUPPORTED,
        }
    }
}
