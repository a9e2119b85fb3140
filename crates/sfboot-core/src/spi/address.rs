//! Address width types

/// Address width for SPI commands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// 3-byte (24-bit) address - supports up to 16 MiB
    ThreeByte,
    /// 4-byte (32-bit) address - supports up to 4 GiB
    FourByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::ThreeByte => 3,
            Self::FourByte => 4,
        }
    }

    /// Encode an address big-endian into `buf`, truncating to the width
    pub fn encode(&self, address: u32, buf: &mut [u8]) {
        let n = self.bytes() as usize;
        let be = address.to_be_bytes();
        buf[..n].copy_from_slice(&be[4 - n..]);
    }
}
