//! SPI NOR wire format
//!
//! Opcodes, address encoding and the on-stack command frame that precedes
//! every data phase.

mod address;
mod frame;
pub mod opcodes;

pub use address::AddressWidth;
pub use frame::{CommandFrame, MAX_FRAME_LEN};
pub use opcodes::*;
