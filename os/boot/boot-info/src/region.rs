//! # Memory Region Types

use core::fmt;

/// UEFI `EFI_MEMORY_TYPE` as found in a raw memory descriptor.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FirmwareMemoryType(pub u32);

impl FirmwareMemoryType {
    pub const RESERVED: Self = Self(0);
    pub const LOADER_CODE: Self = Self(1);
    pub const LOADER_DATA: Self = Self(2);
    pub const BOOT_SERVICES_CODE: Self = Self(3);
    pub const BOOT_SERVICES_DATA: Self = Self(4);
    pub const RUNTIME_SERVICES_CODE: Self = Self(5);
    pub const RUNTIME_SERVICES_DATA: Self = Self(6);
    pub const CONVENTIONAL: Self = Self(7);
    pub const UNUSABLE: Self = Self(8);
    pub const ACPI_RECLAIM: Self = Self(9);
    pub const ACPI_NON_VOLATILE: Self = Self(10);
    pub const MMIO: Self = Self(11);
    pub const MMIO_PORT_SPACE: Self = Self(12);
    pub const PAL_CODE: Self = Self(13);
    pub const PERSISTENT_MEMORY: Self = Self(14);
    pub const UNACCEPTED: Self = Self(15);
}

impl fmt::Debug for FirmwareMemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FirmwareMemoryType({})", self.0)
    }
}

/// Multiboot memory map region type.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RegionType {
    Available = 1,
    Reserved = 2,
    AcpiReclaimable = 3,
    Nvs = 4,
    Bad = 5,
}

impl RegionType {
    /// Classify a firmware memory type.
    ///
    /// Memory used by the loader and by boot services becomes available to the
    /// kernel once boot services are gone. Types this table does not know are
    /// reported as bad so the kernel never allocates from them.
    #[must_use]
    pub const fn from_firmware(kind: FirmwareMemoryType) -> Self {
        match kind {
            FirmwareMemoryType::RESERVED
            | FirmwareMemoryType::RUNTIME_SERVICES_CODE
            | FirmwareMemoryType::RUNTIME_SERVICES_DATA
            | FirmwareMemoryType::MMIO
            | FirmwareMemoryType::MMIO_PORT_SPACE
            | FirmwareMemoryType::PAL_CODE => Self::Reserved,

            FirmwareMemoryType::LOADER_CODE
            | FirmwareMemoryType::LOADER_DATA
            | FirmwareMemoryType::BOOT_SERVICES_CODE
            | FirmwareMemoryType::BOOT_SERVICES_DATA
            | FirmwareMemoryType::CONVENTIONAL => Self::Available,

            FirmwareMemoryType::ACPI_RECLAIM => Self::AcpiReclaimable,
            FirmwareMemoryType::ACPI_NON_VOLATILE => Self::Nvs,

            _ => Self::Bad,
        }
    }

    #[must_use]
    pub const fn from_raw(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Available),
            2 => Some(Self::Reserved),
            3 => Some(Self::AcpiReclaimable),
            4 => Some(Self::Nvs),
            5 => Some(Self::Bad),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }
}
