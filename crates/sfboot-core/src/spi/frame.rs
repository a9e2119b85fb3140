//! Command frame: opcode, address and dummy bytes

use heapless::Vec;

use super::AddressWidth;

/// Largest frame: opcode, 4 address bytes and up to 3 dummy bytes
pub const MAX_FRAME_LEN: usize = 8;

/// Dummy bytes are clocked out with this value
const DUMMY_BYTE: u8 = 0x00;

/// The bytes sent in the command phase of a flash transaction
///
/// Built on the stack per call and handed to the command layer as a slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: Vec<u8, MAX_FRAME_LEN>,
}

impl CommandFrame {
    /// A frame holding just the opcode (e.g. WREN, RDSR)
    pub fn new(opcode: u8) -> Self {
        let mut bytes = Vec::new();
        // Capacity is never zero, so the first push cannot fail.
        let _ = bytes.push(opcode);
        Self { bytes }
    }

    /// An opcode followed by a big-endian address of the given width
    pub fn with_address(opcode: u8, width: AddressWidth, address: u32) -> Self {
        let mut frame = Self::new(opcode);
        let mut buf = [0u8; 4];
        let n = width.bytes() as usize;
        width.encode(address, &mut buf);
        let _ = frame.bytes.extend_from_slice(&buf[..n]);
        frame
    }

    /// Append `count` dummy bytes, saturating at the frame capacity
    pub fn with_dummy(mut self, count: u8) -> Self {
        for _ in 0..count {
            if self.bytes.push(DUMMY_BYTE).is_err() {
                break;
            }
        }
        self
    }

    /// The opcode byte
    pub fn opcode(&self) -> u8 {
        self.bytes[0]
    }

    /// The complete frame as sent on the wire
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: a frame carries at least its opcode
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
