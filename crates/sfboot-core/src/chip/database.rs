//! Static ID/geometry table
//!
//! Entries are matched in order. Spansion parts sharing a JEDEC id are told
//! apart by their extended id bytes, so the longer entries must stay ahead
//! of any shorter entry with the same prefix.

use super::features::Features;
use super::types::FlashInfo;

const NONE: Features = Features::empty();
const SECT_4K: Features = Features::SECT_4K;
const E_FSR: Features = Features::E_FSR;
const SST_WR: Features = Features::SST_WR;
const WR_QPP: Features = Features::WR_QPP;
const RD_QUAD: Features = Features::RD_QUAD;
const RD_DUAL: Features = Features::RD_DUAL;
const RD_FULL: Features = Features::RD_FULL;

/// Every part the driver can identify
pub static FLASH_IDS: &[FlashInfo] = &[
    // Atmel
    FlashInfo::new("at45db011d", 0x1f2200, 0, 64 * 1024, 4, SECT_4K),
    FlashInfo::new("at45db021d", 0x1f2300, 0, 64 * 1024, 8, SECT_4K),
    FlashInfo::new("at45db041d", 0x1f2400, 0, 64 * 1024, 8, SECT_4K),
    FlashInfo::new("at45db081d", 0x1f2500, 0, 64 * 1024, 16, SECT_4K),
    FlashInfo::new("at45db161d", 0x1f2600, 0, 64 * 1024, 32, SECT_4K),
    FlashInfo::new("at45db321d", 0x1f2700, 0, 64 * 1024, 64, SECT_4K),
    FlashInfo::new("at45db641d", 0x1f2800, 0, 64 * 1024, 128, SECT_4K),
    FlashInfo::new("at25df321a", 0x1f4701, 0, 64 * 1024, 64, SECT_4K),
    FlashInfo::new("at25df321", 0x1f4700, 0, 64 * 1024, 64, SECT_4K),
    FlashInfo::new("at26df081a", 0x1f4501, 0, 64 * 1024, 16, SECT_4K),
    // EON
    FlashInfo::new("en25q32b", 0x1c3016, 0, 64 * 1024, 64, NONE),
    FlashInfo::new("en25q64", 0x1c3017, 0, 64 * 1024, 128, SECT_4K),
    FlashInfo::new("en25q128b", 0x1c3018, 0, 64 * 1024, 256, NONE),
    FlashInfo::new("en25s64", 0x1c3817, 0, 64 * 1024, 128, NONE),
    // GigaDevice
    FlashInfo::new("gd25q64b", 0xc84017, 0, 64 * 1024, 128, SECT_4K),
    FlashInfo::new("gd25lq32", 0xc86016, 0, 64 * 1024, 64, SECT_4K),
    // ISSI
    FlashInfo::new("is25lp032", 0x9d6016, 0, 64 * 1024, 64, NONE),
    FlashInfo::new("is25lp064", 0x9d6017, 0, 64 * 1024, 128, NONE),
    FlashInfo::new("is25lp128", 0x9d6018, 0, 64 * 1024, 256, NONE),
    // Macronix
    FlashInfo::new("mx25l2006e", 0xc22012, 0, 64 * 1024, 4, NONE),
    FlashInfo::new("mx25l4005", 0xc22013, 0, 64 * 1024, 8, NONE),
    FlashInfo::new("mx25l8005", 0xc22014, 0, 64 * 1024, 16, NONE),
    FlashInfo::new("mx25l1605d", 0xc22015, 0, 64 * 1024, 32, NONE),
    FlashInfo::new("mx25l3205d", 0xc22016, 0, 64 * 1024, 64, NONE),
    FlashInfo::new("mx25l6405d", 0xc22017, 0, 64 * 1024, 128, NONE),
    FlashInfo::new("mx25l12805", 0xc22018, 0, 64 * 1024, 256, RD_FULL.union(WR_QPP)),
    FlashInfo::new("mx25l25635f", 0xc22019, 0, 64 * 1024, 512, RD_FULL.union(WR_QPP)),
    FlashInfo::new("mx25l51235f", 0xc2201a, 0, 64 * 1024, 1024, RD_FULL.union(WR_QPP)),
    FlashInfo::new("mx25l12855e", 0xc22618, 0, 64 * 1024, 256, RD_FULL.union(WR_QPP)),
    FlashInfo::new("mx66u51235f", 0xc2253a, 0, 64 * 1024, 1024, RD_FULL.union(WR_QPP)),
    FlashInfo::new("mx66l1g45g", 0xc2201b, 0, 64 * 1024, 2048, RD_FULL.union(WR_QPP)),
    // Spansion
    FlashInfo::new("s25fl008a", 0x010213, 0, 64 * 1024, 16, NONE),
    FlashInfo::new("s25fl016a", 0x010214, 0, 64 * 1024, 32, NONE),
    FlashInfo::new("s25fl032a", 0x010215, 0, 64 * 1024, 64, NONE),
    FlashInfo::new("s25fl064a", 0x010216, 0, 64 * 1024, 128, NONE),
    FlashInfo::new("s25fl116k", 0x014015, 0, 64 * 1024, 128, NONE),
    FlashInfo::new("s25fl164k", 0x014017, 0x0140, 64 * 1024, 128, NONE),
    FlashInfo::new("s25fl128p_256k", 0x012018, 0x0300, 256 * 1024, 64, RD_FULL.union(WR_QPP)),
    FlashInfo::new("s25fl128p_64k", 0x012018, 0x0301, 64 * 1024, 256, RD_FULL.union(WR_QPP)),
    FlashInfo::new("s25fl032p", 0x010215, 0x4d00, 64 * 1024, 64, RD_FULL.union(WR_QPP)),
    FlashInfo::new("s25fl064p", 0x010216, 0x4d00, 64 * 1024, 128, RD_FULL.union(WR_QPP)),
    FlashInfo::new("s25fl128s_256k", 0x012018, 0x4d00, 256 * 1024, 64, RD_FULL.union(WR_QPP)),
    FlashInfo::new("s25fl128s_64k", 0x012018, 0x4d01, 64 * 1024, 256, RD_FULL.union(WR_QPP)),
    FlashInfo::new("s25fl256s_256k", 0x010219, 0x4d00, 256 * 1024, 128, RD_FULL.union(WR_QPP)),
    FlashInfo::new("s25fl256s_64k", 0x010219, 0x4d01, 64 * 1024, 512, RD_FULL.union(WR_QPP)),
    FlashInfo::new6("s25fs256s_64k", 0x010219, 0x4d0181, 64 * 1024, 512, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new6("s25fs512s", 0x010220, 0x4d0081, 128 * 1024, 512, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("s25fl512s_256k", 0x010220, 0x4d00, 256 * 1024, 256, RD_FULL.union(WR_QPP)),
    FlashInfo::new("s25fl512s_64k", 0x010220, 0x4d01, 64 * 1024, 1024, RD_FULL.union(WR_QPP)),
    FlashInfo::new("s25fl512s_512k", 0x010220, 0x4f00, 256 * 1024, 256, RD_FULL.union(WR_QPP)),
    // STMicro / Micron
    FlashInfo::new("m25p10", 0x202011, 0, 32 * 1024, 4, NONE),
    FlashInfo::new("m25p20", 0x202012, 0, 64 * 1024, 4, NONE),
    FlashInfo::new("m25p40", 0x202013, 0, 64 * 1024, 8, NONE),
    FlashInfo::new("m25p80", 0x202014, 0, 64 * 1024, 16, NONE),
    FlashInfo::new("m25p16", 0x202015, 0, 64 * 1024, 32, NONE),
    FlashInfo::new("m25pE16", 0x208015, 0x1000, 64 * 1024, 32, NONE),
    FlashInfo::new("m25pX16", 0x207115, 0x1000, 64 * 1024, 32, RD_QUAD.union(RD_DUAL)),
    FlashInfo::new("m25p32", 0x202016, 0, 64 * 1024, 64, NONE),
    FlashInfo::new("m25p64", 0x202017, 0, 64 * 1024, 128, NONE),
    FlashInfo::new("m25p128", 0x202018, 0, 256 * 1024, 64, NONE),
    FlashInfo::new("m25pX64", 0x207117, 0, 64 * 1024, 128, SECT_4K),
    FlashInfo::new("n25q016a", 0x20bb15, 0, 64 * 1024, 32, SECT_4K),
    FlashInfo::new("n25q32", 0x20ba16, 0, 64 * 1024, 64, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("n25q32a", 0x20bb16, 0, 64 * 1024, 64, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("n25q64", 0x20ba17, 0, 64 * 1024, 128, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("n25q64a", 0x20bb17, 0, 64 * 1024, 128, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("n25q128", 0x20ba18, 0, 64 * 1024, 256, RD_FULL.union(WR_QPP)),
    FlashInfo::new("n25q128a", 0x20bb18, 0, 64 * 1024, 256, RD_FULL.union(WR_QPP)),
    FlashInfo::new("n25q256", 0x20ba19, 0, 64 * 1024, 512, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("n25q256a", 0x20bb19, 0, 64 * 1024, 512, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("n25q512", 0x20ba20, 0, 64 * 1024, 1024, RD_FULL.union(WR_QPP).union(E_FSR).union(SECT_4K)),
    FlashInfo::new("n25q512a", 0x20bb20, 0, 64 * 1024, 1024, RD_FULL.union(WR_QPP).union(E_FSR).union(SECT_4K)),
    FlashInfo::new("n25q1024", 0x20ba21, 0, 64 * 1024, 2048, RD_FULL.union(WR_QPP).union(E_FSR).union(SECT_4K)),
    FlashInfo::new("n25q1024a", 0x20bb21, 0, 64 * 1024, 2048, RD_FULL.union(WR_QPP).union(E_FSR).union(SECT_4K)),
    FlashInfo::new("mt25qu02g", 0x20bb22, 0, 64 * 1024, 4096, RD_FULL.union(WR_QPP).union(E_FSR).union(SECT_4K)),
    FlashInfo::new("mt25ql02g", 0x20ba22, 0, 64 * 1024, 4096, RD_FULL.union(WR_QPP).union(E_FSR).union(SECT_4K)),
    // SST
    FlashInfo::new("sst25vf040b", 0xbf258d, 0, 64 * 1024, 8, SECT_4K.union(SST_WR)),
    FlashInfo::new("sst25vf080b", 0xbf258e, 0, 64 * 1024, 16, SECT_4K.union(SST_WR)),
    FlashInfo::new("sst25vf016b", 0xbf2541, 0, 64 * 1024, 32, SECT_4K.union(SST_WR)),
    FlashInfo::new("sst25vf032b", 0xbf254a, 0, 64 * 1024, 64, SECT_4K.union(SST_WR)),
    FlashInfo::new("sst25vf064c", 0xbf254b, 0, 64 * 1024, 128, SECT_4K),
    FlashInfo::new("sst25wf512", 0xbf2501, 0, 64 * 1024, 1, SECT_4K.union(SST_WR)),
    FlashInfo::new("sst25wf010", 0xbf2502, 0, 64 * 1024, 2, SECT_4K.union(SST_WR)),
    FlashInfo::new("sst25wf020", 0xbf2503, 0, 64 * 1024, 4, SECT_4K.union(SST_WR)),
    FlashInfo::new("sst25wf040", 0xbf2504, 0, 64 * 1024, 8, SECT_4K.union(SST_WR)),
    FlashInfo::new("sst25wf040b", 0x621613, 0, 64 * 1024, 8, SECT_4K),
    FlashInfo::new("sst25wf080", 0xbf2505, 0, 64 * 1024, 16, SECT_4K.union(SST_WR)),
    // Winbond
    FlashInfo::new("w25p80", 0xef2014, 0, 64 * 1024, 16, NONE),
    FlashInfo::new("w25p16", 0xef2015, 0, 64 * 1024, 32, NONE),
    FlashInfo::new("w25p32", 0xef2016, 0, 64 * 1024, 64, NONE),
    FlashInfo::new("w25x40", 0xef3013, 0, 64 * 1024, 8, SECT_4K),
    FlashInfo::new("w25x16", 0xef3015, 0, 64 * 1024, 32, SECT_4K),
    FlashInfo::new("w25x32", 0xef3016, 0, 64 * 1024, 64, SECT_4K),
    FlashInfo::new("w25x64", 0xef3017, 0, 64 * 1024, 128, SECT_4K),
    FlashInfo::new("w25q80bl", 0xef4014, 0, 64 * 1024, 16, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("w25q16cl", 0xef4015, 0, 64 * 1024, 32, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("w25q32bv", 0xef4016, 0, 64 * 1024, 64, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("w25q64cv", 0xef4017, 0, 64 * 1024, 128, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("w25q128bv", 0xef4018, 0, 64 * 1024, 256, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("w25q256", 0xef4019, 0, 64 * 1024, 512, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("w25q80bw", 0xef5014, 0, 64 * 1024, 16, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("w25q16dw", 0xef6015, 0, 64 * 1024, 32, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("w25q32dw", 0xef6016, 0, 64 * 1024, 64, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("w25q64dw", 0xef6017, 0, 64 * 1024, 128, RD_FULL.union(WR_QPP).union(SECT_4K)),
    FlashInfo::new("w25q128fw", 0xef6018, 0, 64 * 1024, 256, RD_FULL.union(WR_QPP).union(SECT_4K)),
];

/// Find the first entry matching a read-ID response
pub fn find_by_id(response: &[u8]) -> Option<&'static FlashInfo> {
    FLASH_IDS.iter().find(|info| info.matches(response))
}

/// Find an entry by part name (case-insensitive)
pub fn find_by_name(name: &str) -> Option<&'static FlashInfo> {
    FLASH_IDS.iter().find(|info| info.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::manufacturer;

    #[test]
    fn test_find_macronix_mx25l12805() {
        let info = find_by_id(&[0xc2, 0x20, 0x18, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(info.name, "mx25l12805");
        assert_eq!(info.sector_size, 65536);
        assert_eq!(info.n_sectors, 256);
        assert_eq!(info.page_size, 256);
        assert_eq!(info.total_size(), 16 * 1024 * 1024);
    }

    #[test]
    fn test_extended_id_selects_variant() {
        let info = find_by_id(&[0x01, 0x20, 0x18, 0x4d, 0x01, 0x80]).unwrap();
        assert_eq!(info.name, "s25fl128s_64k");
        let info = find_by_id(&[0x01, 0x20, 0x18, 0x4d, 0x00, 0x80]).unwrap();
        assert_eq!(info.name, "s25fl128s_256k");
        assert_eq!(info.sector_size, 256 * 1024);
    }

    #[test]
    fn test_first_match_wins() {
        // s25fl256s_64k (5 bytes) precedes s25fs256s_64k (6 bytes)
        let info = find_by_id(&[0x01, 0x02, 0x19, 0x4d, 0x01, 0x81]).unwrap();
        assert_eq!(info.name, "s25fl256s_64k");
    }

    #[test]
    fn test_unknown_id() {
        assert!(find_by_id(&[0xff; 6]).is_none());
        assert!(find_by_id(&[0x00; 6]).is_none());
    }

    #[test]
    fn test_find_by_name() {
        let info = find_by_name("N25Q512A").unwrap();
        assert!(info.flags.contains(Features::E_FSR));
        assert_eq!(info.jedec_mfr(), manufacturer::STMICRO);
        assert!(find_by_name("nonexistent").is_none());
    }

    #[test]
    fn test_table_geometry_invariants() {
        for info in FLASH_IDS {
            assert!(info.id_len == 3 || info.id_len == 5 || info.id_len == 6, "{}", info.name);
            assert!(info.sector_size.is_power_of_two(), "{}", info.name);
            assert!(info.page_size.is_power_of_two(), "{}", info.name);
            assert!(info.n_sectors > 0, "{}", info.name);
        }
    }
}
