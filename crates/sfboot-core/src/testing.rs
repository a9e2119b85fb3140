//! Transaction-level SPI NOR stand-in for unit tests

use std::collections::VecDeque;
use std::vec::Vec;

use crate::bus::{SpiBus, XferFlags};
use crate::error::{Error, Result};
use crate::spi::opcodes;

/// One recorded `transfer` call
#[derive(Debug, Clone)]
pub struct Transfer {
    pub bitlen: usize,
    pub flags: XferFlags,
    pub out: Vec<u8>,
    pub had_out: bool,
}

/// Byte served for address `addr` by array reads
pub fn pattern(addr: u32) -> u8 {
    (addr ^ (addr >> 8) ^ (addr >> 16)) as u8
}

/// Answers flash commands by opcode and records every transfer
pub struct MockBus {
    pub transfers: Vec<Transfer>,
    /// Fail (without recording) once this many transfers have succeeded
    pub fail_after: Option<usize>,
    pub id: [u8; 6],
    /// RDSR responses; `sr` once drained
    pub status: VecDeque<u8>,
    pub sr: u8,
    pub fsr: u8,
    pub cr: u8,
    pub bank: u8,
    /// WRSR writes do not change SR/CR
    pub wrsr_ignored: bool,
    pub addr_bytes: usize,
    pub max_write: Option<usize>,
    pub delayed_us: u64,
    /// Last stacked-pair selection, `None` if never set
    pub upper: Option<bool>,
    pending: Vec<u8>,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            transfers: Vec::new(),
            fail_after: None,
            // mx25l12805
            id: [0xc2, 0x20, 0x18, 0x00, 0x00, 0x00],
            status: VecDeque::new(),
            sr: 0,
            fsr: opcodes::FSR_PEC,
            cr: 0,
            bank: 0,
            wrsr_ignored: false,
            addr_bytes: 3,
            max_write: None,
            delayed_us: 0,
            upper: None,
            pending: Vec::new(),
        }
    }

    pub fn with_id(id: &[u8]) -> Self {
        let mut bus = Self::new();
        bus.id = [0; 6];
        bus.id[..id.len()].copy_from_slice(id);
        bus
    }

    /// Command-phase bytes of every transaction, in order
    pub fn commands(&self) -> Vec<Vec<u8>> {
        self.transfers
            .iter()
            .filter(|t| t.flags.contains(XferFlags::BEGIN))
            .map(|t| t.out.clone())
            .collect()
    }

    /// Opcodes of every transaction, in order
    pub fn opcodes(&self) -> Vec<u8> {
        self.commands().iter().map(|c| c[0]).collect()
    }

    /// Number of transactions that used `opcode`
    pub fn count(&self, opcode: u8) -> usize {
        self.opcodes().iter().filter(|&&o| o == opcode).count()
    }

    fn address(&self) -> u32 {
        self.pending[1..1 + self.addr_bytes]
            .iter()
            .fold(0u32, |a, &b| (a << 8) | b as u32)
    }

    fn respond(&mut self, din: &mut [u8]) {
        match self.pending[0] {
            opcodes::RDID => {
                for (d, s) in din.iter_mut().zip(self.id.iter()) {
                    *d = *s;
                }
            }
            opcodes::RDSR => din.fill(self.status.pop_front().unwrap_or(self.sr)),
            opcodes::RDFSR => din.fill(self.fsr),
            opcodes::RDCR => din.fill(self.cr),
            opcodes::BRRD | opcodes::RDEAR => din.fill(self.bank),
            opcodes::READ
            | opcodes::FAST_READ
            | opcodes::DOR
            | opcodes::QOR
            | opcodes::DIOR
            | opcodes::QIOR => {
                let base = self.address();
                for (i, d) in din.iter_mut().enumerate() {
                    *d = pattern(base + i as u32);
                }
            }
            _ => din.fill(0xff),
        }
    }

    fn absorb(&mut self, data: &[u8]) {
        match self.pending[0] {
            opcodes::WRSR if !self.wrsr_ignored => {
                self.sr = data[0];
                if let Some(&cr) = data.get(1) {
                    self.cr = cr;
                }
            }
            opcodes::BRWR | opcodes::WREAR => self.bank = data[0],
            _ => {}
        }
    }
}

impl SpiBus for MockBus {
    fn transfer(
        &mut self,
        bitlen: usize,
        dout: Option<&[u8]>,
        din: Option<&mut [u8]>,
        flags: XferFlags,
    ) -> Result<()> {
        if self.fail_after == Some(self.transfers.len()) {
            return Err(Error::SpiTimeout);
        }
        let bytes = bitlen / 8;
        let out: Vec<u8> = dout.map(|d| d[..bytes].to_vec()).unwrap_or_default();

        if flags.contains(XferFlags::BEGIN) {
            self.pending = out.clone();
        } else {
            if let Some(din) = din {
                self.respond(&mut din[..bytes]);
            }
            if dout.is_some() {
                self.absorb(&out);
            }
        }

        self.transfers.push(Transfer {
            bitlen,
            flags,
            out,
            had_out: dout.is_some(),
        });
        Ok(())
    }

    fn max_write_size(&self) -> Option<usize> {
        self.max_write
    }

    fn select_upper(&mut self, upper: bool) {
        self.upper = Some(upper);
    }

    fn delay_us(&mut self, us: u32) {
        self.delayed_us += us as u64;
    }
}
