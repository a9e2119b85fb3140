//! List command implementation

use super::format_size;
use sfboot_core::chip::{manufacturer, FLASH_IDS};

/// List the ID table, optionally filtered by vendor
pub fn list_chips(vendor_filter: Option<&str>) {
    println!("Supported flash chips:");
    println!();
    println!("{:<12} {:<20} {:>10} {:>20}", "Vendor", "Name", "Size", "ID");
    println!("{}", "-".repeat(66));

    for info in FLASH_IDS {
        let vendor = manufacturer::name(info.jedec_mfr());
        if let Some(filter) = vendor_filter {
            if !vendor.to_lowercase().contains(&filter.to_lowercase()) {
                continue;
            }
        }

        let id = info
            .id()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:<12} {:<20} {:>10} {:>20}",
            vendor,
            info.name,
            format_size(info.total_size()),
            id
        );
    }
}
