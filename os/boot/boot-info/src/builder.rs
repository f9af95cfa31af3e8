//! # Boot Information Assembly
//!
//! [`BootInfoBuilder`] owns the Multiboot record and publishes one facet at a
//! time. Every facet that needs backing storage gets its own zeroed page at or
//! below [`BOOT_INFO_MAX_ADDR`].
//!
//! Intended calling order:
//!
//! ```text
//! new → set_framebuffer → set_ramdisk → set_boot_loader_name → set_acpi_rsdp
//!     → memory_map_slot → (exit boot services) → set_memory_map → finish
//! ```
//!
//! Only `set_boot_loader_name` before `set_acpi_rsdp` is enforced; the kernel
//! identifies the RSDP slot by the loader name.

use crate::config::{BOOT_INFO_MAX_ADDR, BOOT_LOADER_NAME, PAGE_SIZE};
use crate::framebuffer::{FramebufferMode, PixelLayout};
use crate::memory_map::{DescriptorTable, MemoryMapError, MemoryMapSummary, translate_memory_map};
use crate::page::{PageAllocator, PageFrame};
use crate::record::{FramebufferType, InfoFlags, MmapEntry, ModuleEntry, MultibootInfo};
use core::ffi::CStr;
use log::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum BootInfoError<E: core::error::Error + 'static> {
    #[error("failed to allocate a boot information page for the {what}")]
    PageAllocation {
        what: &'static str,
        #[source]
        source: E,
    },
    #[error("the {what} at {addr:#x} is out of reach of a 32-bit kernel")]
    AddressTooHigh { what: &'static str, addr: u64 },
    #[error("pixel layout {0:?} has no usable linear framebuffer")]
    UnsupportedPixelLayout(PixelLayout),
    #[error("framebuffer stride of {0} pixels does not fit a 32-bit pitch")]
    FramebufferGeometry(u32),
    #[error(transparent)]
    MemoryMap(#[from] MemoryMapError),
    #[error("the {facet} can only be published after the {requires}")]
    MissingPrerequisite {
        facet: &'static str,
        requires: &'static str,
    },
    #[error("no ACPI 2.0 RSDP in the firmware configuration table")]
    AcpiTableNotFound,
}

impl<E: core::error::Error + 'static> BootInfoError<E> {
    /// Whether booting cannot continue.
    ///
    /// A missing RSDP only means the kernel has to find ACPI on its own.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::AcpiTableNotFound)
    }
}

/// One entry of the firmware configuration table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConfigTableEntry {
    /// Vendor GUID in its in-memory byte order.
    pub token: [u8; 16],
    pub address: u64,
}

/// Outcome of a successful RSDP lookup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RsdpHandoff {
    /// The address was stored in the record.
    Published(u64),
    /// Found, but the 32-bit slot cannot hold it; the record is unchanged.
    OutOf32BitRange(u64),
}

/// A page reserved for the memory map.
///
/// Obtained while boot services still exist, so that filling it in afterwards
/// does not need the allocator.
pub struct MemoryMapSlot {
    phys: u32,
    entries: &'static mut [MmapEntry],
}

impl MemoryMapSlot {
    #[must_use]
    pub const fn phys(&self) -> u32 {
        self.phys
    }

    /// Number of entries the page holds.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.entries.len()
    }
}

/// The finished record and the payload it points to.
#[derive(Debug)]
pub struct BootInfoHandoff {
    pub info: &'static MultibootInfo,
    /// Physical address of `info`, passed to the kernel in `EBX`.
    pub phys: u32,
    pub memory_map: &'static [MmapEntry],
    pub module: Option<&'static ModuleEntry>,
    pub loader_name: Option<&'static CStr>,
}

pub struct BootInfoBuilder<A: PageAllocator> {
    allocator: A,
    info: &'static mut MultibootInfo,
    phys: u32,
    memory_map: &'static [MmapEntry],
    module: Option<&'static ModuleEntry>,
    loader_name: Option<&'static CStr>,
}

impl<A: PageAllocator> BootInfoBuilder<A> {
    /// Allocate the zeroed record.
    ///
    /// # Errors
    /// [`BootInfoError::PageAllocation`] or [`BootInfoError::AddressTooHigh`].
    pub fn new(mut allocator: A) -> Result<Self, BootInfoError<A::Error>> {
        let (phys, frame) = allocate(&mut allocator, "boot information record")?;
        debug!("Boot information record at {phys:#x}");
        Ok(Self {
            allocator,
            info: frame.into_zeroed(),
            phys,
            memory_map: &[],
            module: None,
            loader_name: None,
        })
    }

    /// Physical address of the record.
    #[must_use]
    pub const fn phys(&self) -> u32 {
        self.phys
    }

    #[must_use]
    pub const fn flags(&self) -> InfoFlags {
        self.info.flags
    }

    /// Publish the linear framebuffer of the active graphics mode.
    ///
    /// # Errors
    /// [`BootInfoError::UnsupportedPixelLayout`] if the mode has no linear
    /// framebuffer, [`BootInfoError::FramebufferGeometry`] if the pitch overflows.
    /// The record is unchanged on error.
    pub fn set_framebuffer(
        &mut self,
        mode: &FramebufferMode,
    ) -> Result<(), BootInfoError<A::Error>> {
        let Some(rgb) = mode.layout.rgb_fields() else {
            warn!(
                "Not publishing a framebuffer: unsupported pixel layout {:?}",
                mode.layout
            );
            return Err(BootInfoError::UnsupportedPixelLayout(mode.layout));
        };
        let pitch = mode
            .pitch()
            .ok_or(BootInfoError::FramebufferGeometry(mode.stride))?;

        let info = &mut *self.info;
        info.framebuffer_addr = mode.address;
        info.framebuffer_pitch = pitch;
        info.framebuffer_width = mode.width;
        info.framebuffer_height = mode.height;
        info.framebuffer_bpp = FramebufferMode::BPP;
        info.framebuffer_type = FramebufferType::Rgb as u8;
        info.framebuffer_rgb = rgb;
        info.flags.set_framebuffer_info(true);

        debug!(
            "Framebuffer {}x{} at {:#x}, pitch {pitch}",
            mode.width, mode.height, mode.address
        );
        Ok(())
    }

    /// Publish the ramdisk as the only boot module.
    ///
    /// # Errors
    /// [`BootInfoError::AddressTooHigh`] if the image does not end below 4 GiB,
    /// or a page allocation error.
    pub fn set_ramdisk(&mut self, start: u64, size: u64) -> Result<(), BootInfoError<A::Error>> {
        let Some(end) = start.checked_add(size) else {
            return Err(BootInfoError::AddressTooHigh {
                what: "ramdisk",
                addr: start,
            });
        };
        let (Ok(mod_start), Ok(mod_end)) = (u32::try_from(start), u32::try_from(end)) else {
            return Err(BootInfoError::AddressTooHigh {
                what: "ramdisk",
                addr: end,
            });
        };

        let (phys, frame) = allocate(&mut self.allocator, "module list")?;
        let module: &'static mut ModuleEntry = frame.into_zeroed();
        module.mod_start = mod_start;
        module.mod_end = mod_end;

        self.info.mods_addr = phys;
        self.info.mods_count = 1;
        self.info.flags.set_mods(true);
        self.module = Some(module);

        debug!("Ramdisk {mod_start:#x}..{mod_end:#x}, module list at {phys:#x}");
        Ok(())
    }

    /// Publish [`BOOT_LOADER_NAME`].
    ///
    /// # Errors
    /// A page allocation error.
    pub fn set_boot_loader_name(&mut self) -> Result<(), BootInfoError<A::Error>> {
        let (phys, frame) = allocate(&mut self.allocator, "boot loader name")?;
        let bytes = frame.into_zeroed_bytes();
        let name = BOOT_LOADER_NAME.to_bytes_with_nul();
        bytes[..name.len()].copy_from_slice(name);

        self.info.boot_loader_name = phys;
        self.info.flags.set_boot_loader_name(true);
        let bytes: &'static [u8] = bytes;
        self.loader_name = CStr::from_bytes_until_nul(bytes).ok();

        debug!("Boot loader name at {phys:#x}");
        Ok(())
    }

    /// Look up the configuration table entry for `token` and publish its address
    /// as the ACPI RSDP.
    ///
    /// # Errors
    /// * [`BootInfoError::MissingPrerequisite`] unless the boot loader name was
    ///   published first.
    /// * [`BootInfoError::AcpiTableNotFound`] if no entry matches; not fatal.
    pub fn set_acpi_rsdp<I>(
        &mut self,
        entries: I,
        token: &[u8; 16],
    ) -> Result<RsdpHandoff, BootInfoError<A::Error>>
    where
        I: IntoIterator<Item = ConfigTableEntry>,
    {
        if !self.info.flags.boot_loader_name() {
            return Err(BootInfoError::MissingPrerequisite {
                facet: "ACPI RSDP",
                requires: "boot loader name",
            });
        }

        let address = entries
            .into_iter()
            .find(|entry| entry.token == *token)
            .map(|entry| entry.address)
            .ok_or(BootInfoError::AcpiTableNotFound)?;

        let Ok(rsdp) = u32::try_from(address) else {
            warn!("ACPI RSDP at {address:#x} is above 4 GiB and cannot be handed to the kernel");
            return Ok(RsdpHandoff::OutOf32BitRange(address));
        };

        self.info.acpi_rsdp = rsdp;
        debug!("ACPI RSDP at {rsdp:#x}");
        Ok(RsdpHandoff::Published(address))
    }

    /// Reserve the page the memory map will be written to.
    ///
    /// # Errors
    /// A page allocation error.
    pub fn memory_map_slot(&mut self) -> Result<MemoryMapSlot, BootInfoError<A::Error>> {
        let (phys, frame) = allocate(&mut self.allocator, "memory map")?;
        Ok(MemoryMapSlot {
            phys,
            entries: frame.into_zeroed_slice(),
        })
    }

    /// Translate `table` into `slot` and publish it.
    ///
    /// `mem_lower` and `mem_upper` are only published if the map had available memory.
    ///
    /// # Errors
    /// [`BootInfoError::MemoryMap`]; the record is unchanged on error.
    pub fn set_memory_map(
        &mut self,
        slot: MemoryMapSlot,
        table: &DescriptorTable<'_>,
    ) -> Result<MemoryMapSummary, BootInfoError<A::Error>> {
        let MemoryMapSlot { phys, entries } = slot;
        let summary = translate_memory_map(table, entries)?;

        let info = &mut *self.info;
        info.mmap_addr = phys;
        let length = summary.entries * size_of::<MmapEntry>();
        info.mmap_length = u32::try_from(length).unwrap_or(u32::MAX);
        info.flags.set_mem_map(true);

        if let Some(bounds) = summary.bounds {
            info.mem_lower = bounds.lower_kb;
            info.mem_upper = bounds.upper_kb;
            info.flags.set_memory(true);
        }

        let entries: &'static [MmapEntry] = entries;
        self.memory_map = &entries[..summary.entries];

        debug!(
            "Memory map: {} regions at {phys:#x}, {} descriptors in",
            summary.entries,
            table.len()
        );
        Ok(summary)
    }

    /// [`memory_map_slot`](Self::memory_map_slot) and
    /// [`set_memory_map`](Self::set_memory_map) in one step.
    ///
    /// # Errors
    /// As both.
    pub fn set_memory_map_now(
        &mut self,
        table: &DescriptorTable<'_>,
    ) -> Result<MemoryMapSummary, BootInfoError<A::Error>> {
        let slot = self.memory_map_slot()?;
        self.set_memory_map(slot, table)
    }

    /// Freeze the record.
    #[must_use]
    pub fn finish(self) -> BootInfoHandoff {
        BootInfoHandoff {
            info: self.info,
            phys: self.phys,
            memory_map: self.memory_map,
            module: self.module,
            loader_name: self.loader_name,
        }
    }
}

fn allocate<A: PageAllocator>(
    allocator: &mut A,
    what: &'static str,
) -> Result<(u32, PageFrame), BootInfoError<A::Error>> {
    let frame = allocator
        .allocate_page(BOOT_INFO_MAX_ADDR)
        .map_err(|source| BootInfoError::PageAllocation { what, source })?;

    let addr = frame.phys();
    match u32::try_from(addr) {
        Ok(phys) if addr + PAGE_SIZE as u64 <= BOOT_INFO_MAX_ADDR => Ok((phys, frame)),
        _ => Err(BootInfoError::AddressTooHigh { what, addr }),
    }
}
