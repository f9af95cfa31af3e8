//! # ACPI Root Pointer

use boot_info::{BootInfoBuilder, BootInfoError, ConfigTableEntry, PageAllocator, RsdpHandoff};
use uefi::system;
use uefi::table::cfg::ACPI2_GUID;

/// The ACPI 2.0 table GUID in its in-memory byte order.
pub const ACPI2_TOKEN: [u8; 16] = ACPI2_GUID.to_bytes();

/// Publish the ACPI 2.0 RSDP from the firmware configuration table.
pub fn publish_rsdp<A: PageAllocator>(
    builder: &mut BootInfoBuilder<A>,
) -> Result<RsdpHandoff, BootInfoError<A::Error>> {
    builder.set_acpi_rsdp(find_acpi2_entry(), &ACPI2_TOKEN)
}

/// Copy the ACPI 2.0 entry out of the configuration table, if there is one.
fn find_acpi2_entry() -> Option<ConfigTableEntry> {
    system::with_config_table(|table| {
        table
            .iter()
            .map(|entry| ConfigTableEntry {
                token: entry.guid.to_bytes(),
                address: entry.address as usize as u64,
            })
            .find(|entry| entry.token == ACPI2_TOKEN)
    })
}
