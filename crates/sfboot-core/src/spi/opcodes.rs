//! SPI NOR flash opcodes and status bits
//!
//! Only the commands the boot storage stack issues, plus the ones the
//! emulator has to understand to answer them.

// ============================================================================
// Write latch
// ============================================================================

/// Set the write enable latch; precedes every program, erase and register write
pub const WREN: u8 = 0x06;
/// Clear the write enable latch
pub const WRDI: u8 = 0x04;

// ============================================================================
// Registers
// ============================================================================

/// Status register read
pub const RDSR: u8 = 0x05;
/// Flag status register read (Micron/ST parts with `E_FSR`)
pub const RDFSR: u8 = 0x70;
/// Configuration register read (Spansion CR1, Winbond SR2)
pub const RDCR: u8 = 0x35;
/// Status register write; a second byte goes to the configuration register
pub const WRSR: u8 = 0x01;
/// JEDEC identification, answered with up to six ID bytes
pub const RDID: u8 = 0x9F;

// ============================================================================
// Array reads
// ============================================================================

/// Array read without dummy cycles
pub const READ: u8 = 0x03;
/// Fast array read, one dummy byte
pub const FAST_READ: u8 = 0x0B;
/// Fast read, data on two lines
pub const DOR: u8 = 0x3B;
/// Fast read, data on four lines
pub const QOR: u8 = 0x6B;
/// Fast read, address and data on two lines
pub const DIOR: u8 = 0xBB;
/// Fast read, address and data on four lines
pub const QIOR: u8 = 0xEB;

// ============================================================================
// Program and erase
// ============================================================================

/// Program up to one page
pub const PP: u8 = 0x02;
/// Program up to one page, data on four lines
pub const QPP: u8 = 0x32;
/// Erase a 4 KiB sector
pub const SE_20: u8 = 0x20;
/// Erase a table-sized sector (usually 64 KiB)
pub const BE_D8: u8 = 0xD8;

// ============================================================================
// Addressing beyond 16 MiB
// ============================================================================

/// Switch the part to 4-byte addresses
pub const EN4B: u8 = 0xB7;
/// Back to 3-byte addresses
pub const EX4B: u8 = 0xE9;
/// Spansion bank address register read
pub const BRRD: u8 = 0x16;
/// Spansion bank address register write
pub const BRWR: u8 = 0x17;
/// Extended address register read (Micron, Winbond, Macronix)
pub const RDEAR: u8 = 0xC8;
/// Extended address register write
pub const WREAR: u8 = 0xC5;

// ============================================================================
// Register bits
// ============================================================================

/// SR: program or erase in progress
pub const SR_WIP: u8 = 0x01;
/// SR: write enable latch
pub const SR_WEL: u8 = 0x02;
/// SR: Macronix quad enable
pub const SR_QEB_MXIC: u8 = 0x40;
/// CR: Spansion/Winbond quad enable
pub const CR_QEB_WINSPAN: u8 = 0x02;
/// FSR: program/erase controller idle
pub const FSR_PEC: u8 = 0x80;
