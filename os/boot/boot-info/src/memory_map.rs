//! # UEFI Memory Map Translation
//!
//! Converts the firmware's memory descriptor array into Multiboot memory map
//! entries. Descriptors are classified with [`RegionType::from_firmware`] and
//! neighbors of the same type are merged:
//!
//! ```text
//! firmware:  [0x0000 +1 pg Conventional][0x1000 +1 pg BootServicesData][0x2000 +1 pg MMIO]
//! multiboot: [0x0000 .. 0x2000 Available                               ][0x2000 .. 0x3000 Reserved]
//! ```
//!
//! A gap between two descriptors always starts a new entry.

use crate::config::PAGE_SIZE;
use crate::record::MmapEntry;
use crate::region::{FirmwareMemoryType, RegionType};
use log::trace;

/// Size of the fields of `EFI_MEMORY_DESCRIPTOR` read by the translator.
///
/// Firmware may use a larger stride; the extra bytes are skipped.
pub const MIN_DESCRIPTOR_SIZE: usize = 40;

const TYPE_OFFSET: usize = 0;
const PHYSICAL_START_OFFSET: usize = 8;
const NUMBER_OF_PAGES_OFFSET: usize = 24;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryMapError {
    #[error("memory descriptor size {0} is below the minimum of 40 bytes")]
    DescriptorTooSmall(usize),
    #[error("memory descriptor at {start:#x} starts before the previous end {previous_end:#x}")]
    Unordered { start: u64, previous_end: u64 },
    #[error("memory descriptor at {0:#x} extends past the end of the address space")]
    AddressOverflow(u64),
    #[error("memory map holds more than {0} merged regions")]
    OutputFull(usize),
}

/// One decoded firmware descriptor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FirmwareDescriptor {
    pub kind: FirmwareMemoryType,
    pub phys_start: u64,
    pub page_count: u64,
}

impl FirmwareDescriptor {
    /// Exclusive end address.
    #[must_use]
    pub fn end(&self) -> Option<u64> {
        self.page_count
            .checked_mul(PAGE_SIZE as u64)
            .and_then(|len| self.phys_start.checked_add(len))
    }
}

/// A view of the raw descriptor array with its runtime stride.
#[derive(Copy, Clone, Debug)]
pub struct DescriptorTable<'a> {
    bytes: &'a [u8],
    desc_size: usize,
}

impl<'a> DescriptorTable<'a> {
    /// # Errors
    /// Fails if `desc_size` cannot hold an `EFI_MEMORY_DESCRIPTOR`.
    pub const fn new(bytes: &'a [u8], desc_size: usize) -> Result<Self, MemoryMapError> {
        if desc_size < MIN_DESCRIPTOR_SIZE {
            return Err(MemoryMapError::DescriptorTooSmall(desc_size));
        }
        Ok(Self { bytes, desc_size })
    }

    #[must_use]
    pub const fn desc_size(&self) -> usize {
        self.desc_size
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len() / self.desc_size
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptors in firmware order. A trailing partial descriptor is ignored.
    pub fn iter(&self) -> impl Iterator<Item = FirmwareDescriptor> + use<'a> {
        self.bytes
            .chunks_exact(self.desc_size)
            .map(|raw| FirmwareDescriptor {
                kind: FirmwareMemoryType(read_u32(raw, TYPE_OFFSET)),
                phys_start: read_u64(raw, PHYSICAL_START_OFFSET),
                page_count: read_u64(raw, NUMBER_OF_PAGES_OFFSET),
            })
    }
}

fn read_u32(raw: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&raw[at..at + 4]);
    u32::from_le_bytes(b)
}

fn read_u64(raw: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&raw[at..at + 8]);
    u64::from_le_bytes(b)
}

/// Extent of available memory, in KiB.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MemoryBounds {
    /// Lowest start address of any available region.
    pub lower_kb: u32,
    /// Highest end address of any available region.
    pub upper_kb: u32,
}

impl MemoryBounds {
    fn include(bounds: Option<Self>, start: u64, end: u64) -> Self {
        let lower_kb = to_kb(start);
        let upper_kb = to_kb(end);
        bounds.map_or(Self { lower_kb, upper_kb }, |b| Self {
            lower_kb: b.lower_kb.min(lower_kb),
            upper_kb: b.upper_kb.max(upper_kb),
        })
    }
}

fn to_kb(addr: u64) -> u32 {
    u32::try_from(addr / 1024).unwrap_or(u32::MAX)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MemoryMapSummary {
    /// Number of entries written.
    pub entries: usize,
    /// `None` if no region was available.
    pub bounds: Option<MemoryBounds>,
}

#[derive(Copy, Clone)]
struct Region {
    kind: RegionType,
    start: u64,
    end: u64,
}

struct Output<'o> {
    entries: &'o mut [MmapEntry],
    len: usize,
    bounds: Option<MemoryBounds>,
}

impl Output<'_> {
    fn flush(&mut self, region: Region) -> Result<(), MemoryMapError> {
        let slot = self
            .entries
            .get_mut(self.len)
            .ok_or(MemoryMapError::OutputFull(self.len))?;

        if region.kind == RegionType::Available {
            self.bounds = Some(MemoryBounds::include(self.bounds, region.start, region.end));
        }

        trace!(
            "Region {:#014x}..{:#014x} {:?}",
            region.start, region.end, region.kind
        );
        *slot = MmapEntry::new(region.start, region.end, region.kind);
        self.len += 1;
        Ok(())
    }
}

/// Merge and classify `table` into `out`.
///
/// Descriptors must be sorted by start address and must not overlap.
///
/// # Errors
/// * [`MemoryMapError::Unordered`] if a descriptor starts before the previous one ended.
/// * [`MemoryMapError::AddressOverflow`] if a descriptor wraps the address space.
/// * [`MemoryMapError::OutputFull`] if more merged regions result than `out` holds.
pub fn translate_memory_map(
    table: &DescriptorTable<'_>,
    out: &mut [MmapEntry],
) -> Result<MemoryMapSummary, MemoryMapError> {
    let mut output = Output {
        entries: out,
        len: 0,
        bounds: None,
    };
    let mut current: Option<Region> = None;
    let mut previous_end: Option<u64> = None;

    for desc in table.iter() {
        let start = desc.phys_start;
        let end = desc.end().ok_or(MemoryMapError::AddressOverflow(start))?;

        if let Some(previous_end) = previous_end
            && start < previous_end
        {
            return Err(MemoryMapError::Unordered {
                start,
                previous_end,
            });
        }
        previous_end = Some(end);

        let kind = RegionType::from_firmware(desc.kind);
        match current.as_mut() {
            Some(region) if region.kind == kind && region.end == start => region.end = end,
            _ => {
                if let Some(region) = current.take() {
                    output.flush(region)?;
                }
                current = Some(Region { kind, start, end });
            }
        }
    }

    if let Some(region) = current {
        output.flush(region)?;
    }

    Ok(MemoryMapSummary {
        entries: output.len,
        bounds: output.bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(descs: &[(u32, u64, u64)], stride: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; descs.len() * stride];
        for (chunk, &(kind, start, pages)) in bytes.chunks_exact_mut(stride).zip(descs) {
            chunk[0..4].copy_from_slice(&kind.to_le_bytes());
            chunk[8..16].copy_from_slice(&start.to_le_bytes());
            // Virtual start is ignored.
            chunk[16..24].copy_from_slice(&0xdead_beefu64.to_le_bytes());
            chunk[24..32].copy_from_slice(&pages.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn decodes_with_wide_stride() {
        let bytes = raw(&[(7, 0x1000, 3), (11, 0xfee0_0000, 1)], 48);
        let table = DescriptorTable::new(&bytes, 48).unwrap();
        let descs: Vec<_> = table.iter().collect();
        assert_eq!(table.len(), 2);
        assert_eq!(descs[0].kind, FirmwareMemoryType::CONVENTIONAL);
        assert_eq!(descs[0].end(), Some(0x4000));
        assert_eq!(descs[1].phys_start, 0xfee0_0000);
    }

    #[test]
    fn rejects_small_stride() {
        assert_eq!(
            DescriptorTable::new(&[], 24).unwrap_err(),
            MemoryMapError::DescriptorTooSmall(24)
        );
    }

    #[test]
    fn trailing_partial_descriptor_is_ignored() {
        let mut bytes = raw(&[(7, 0, 1)], 40);
        bytes.extend_from_slice(&[0xff; 20]);
        let table = DescriptorTable::new(&bytes, 40).unwrap();
        assert_eq!(table.iter().count(), 1);
    }

    #[test]
    fn overflowing_descriptor_is_rejected() {
        let bytes = raw(&[(7, u64::MAX - 0xfff, 2)], 40);
        let table = DescriptorTable::new(&bytes, 40).unwrap();
        let mut out = [MmapEntry::new(0, 0, RegionType::Bad); 4];
        assert_eq!(
            translate_memory_map(&table, &mut out).unwrap_err(),
            MemoryMapError::AddressOverflow(u64::MAX - 0xfff)
        );
    }
}
