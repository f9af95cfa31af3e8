//! # Loader Configuration

use boot_video::SelectorConfig;
use log::LevelFilter;
use uefi::{CStr16, cstr16};

/// Kernel image on the EFI system partition.
pub const KERNEL_PATH: &CStr16 = cstr16!("\\EFI\\BOOT\\KERNEL.ELF");

/// Initial ramdisk, handed to the kernel as the only boot module.
pub const RAMDISK_PATH: &CStr16 = cstr16!("\\EFI\\BOOT\\RAMDISK.IMG");

pub const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

/// Print the ranked video modes on the firmware console.
pub const SHOW_MODES: bool = true;

/// Prompt for a video mode instead of taking the default.
pub const INTERACTIVE_MODE_SELECTION: bool = cfg!(feature = "interactive");

/// Capacity of the ranked mode table, including the slot reserved for the
/// largest mode.
pub const MAX_LISTED_MODES: usize = 16;

pub const VIDEO: SelectorConfig = SelectorConfig::DEFAULT;

/// Everything the kernel must reach after hand-off is placed below 4 GiB.
pub const MAX_32BIT_ADDR: u64 = u32::MAX as u64;
