//! Emulated Xilinx AXI SPI register block

use std::collections::VecDeque;

use sfboot_core::bus::{regs, Registers, Spicr, Spisr};

use crate::nor::NorChip;

/// Depth of the receive FIFO
pub const FIFO_DEPTH: usize = 16;

/// SPICR value after reset
const SPICR_RESET: u32 = Spicr::DFLT_OFF.bits();

/// Register file of the AXI SPI core with one NOR part behind its select lines
#[derive(Debug)]
pub struct XilinxSim {
    chip: NorChip,
    rx: VecDeque<u8>,
    spicr: u32,
    spissr: u32,
    writes: Vec<(usize, u32)>,
    transactions: usize,
    /// RX FIFO reports data forever and never drains
    pub stuck_rx: bool,
    /// Transmitted bytes never produce receive data
    pub silent: bool,
}

impl XilinxSim {
    /// Wire `chip` to the core
    pub fn new(chip: NorChip) -> Self {
        Self {
            chip,
            rx: VecDeque::with_capacity(FIFO_DEPTH),
            spicr: SPICR_RESET,
            spissr: regs::SPISSR_OFF,
            writes: Vec::new(),
            transactions: 0,
            stuck_rx: false,
            silent: false,
        }
    }

    /// The attached part
    pub fn chip(&self) -> &NorChip {
        &self.chip
    }

    /// Mutable access to the attached part
    pub fn chip_mut(&mut self) -> &mut NorChip {
        &mut self.chip
    }

    /// Detach the part
    pub fn into_chip(self) -> NorChip {
        self.chip
    }

    /// Writes to SRR, SPICR and SPISSR in order
    pub fn writes(&self) -> &[(usize, u32)] {
        &self.writes
    }

    /// Number of chip-select assertions so far
    pub fn transactions(&self) -> usize {
        self.transactions
    }

    /// Current SPICR value
    pub fn spicr(&self) -> Spicr {
        Spicr::from_bits_retain(self.spicr)
    }

    fn selected(&self) -> bool {
        self.spissr != regs::SPISSR_OFF
    }

    fn status(&self) -> u32 {
        let mut sr = Spisr::TX_EMPTY;
        if self.rx.is_empty() && !self.stuck_rx {
            sr |= Spisr::RX_EMPTY;
        }
        if self.rx.len() >= FIFO_DEPTH {
            sr |= Spisr::RX_FULL;
        }
        sr.bits()
    }

    fn set_select(&mut self, value: u32) {
        let was = self.selected();
        self.spissr = value;
        match (was, self.selected()) {
            (_, true) => {
                self.transactions += 1;
                self.chip.select();
            }
            (true, false) => self.chip.deselect(),
            (false, false) => {}
        }
    }

    fn shift(&mut self, tx: u8) {
        let rx = if self.selected() {
            self.chip.exchange(tx)
        } else {
            0xff
        };
        if !self.silent && self.rx.len() < FIFO_DEPTH {
            self.rx.push_back(rx);
        }
    }
}

impl Registers for XilinxSim {
    fn read32(&mut self, offset: usize) -> u32 {
        match offset {
            regs::SPISR => self.status(),
            regs::SPIDRR => {
                if self.stuck_rx {
                    0xff
                } else {
                    self.rx.pop_front().map_or(0, u32::from)
                }
            }
            regs::SPICR => self.spicr,
            regs::SPISSR => self.spissr,
            regs::SPIRFOR => self.rx.len().saturating_sub(1) as u32,
            _ => 0,
        }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        match offset {
            regs::SRR => {
                self.writes.push((offset, value));
                if value == regs::SRR_RESET_VALUE {
                    self.chip.deselect();
                    self.spicr = SPICR_RESET;
                    self.spissr = regs::SPISSR_OFF;
                    self.rx.clear();
                }
            }
            regs::SPICR => {
                self.writes.push((offset, value));
                if value & Spicr::RXFIFO_RESET.bits() != 0 {
                    self.rx.clear();
                }
                self.spicr = value & !(Spicr::RXFIFO_RESET | Spicr::TXFIFO_RESET).bits();
            }
            regs::SPISSR => {
                self.writes.push((offset, value));
                self.set_select(value);
            }
            regs::SPIDTR => self.shift(value as u8),
            _ => {}
        }
    }
}
