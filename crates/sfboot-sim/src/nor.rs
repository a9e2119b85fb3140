//! Byte-stream SPI NOR model
//!
//! The chip sees one byte per clocked exchange while it is selected. Read
//! style commands answer from the bytes seen so far; commands that modify
//! the array or a register take effect when the chip is deselected, like a
//! real part latching its command on the rising edge of chip-select.

use sfboot_core::chip::{self, FlashInfo};
use sfboot_core::config::FlashConfig;
use sfboot_core::flash::Geometry;
use sfboot_core::spi::opcodes;

use crate::SimError;

/// Emulated SPI NOR part
#[derive(Debug, Clone)]
pub struct NorChip {
    info: &'static FlashInfo,
    data: Vec<u8>,
    page_size: usize,
    sr: u8,
    cr: u8,
    bank: u8,
    four_byte: bool,
    busy_polls: u32,
    busy: u32,
    selected: bool,
    seen: Vec<u8>,
}

impl NorChip {
    /// An erased part described by `info`
    pub fn new(info: &'static FlashInfo) -> Self {
        let page_size = Geometry::derive(info, &FlashConfig::default()).page_size as usize;
        Self {
            info,
            data: vec![0xff; info.total_size() as usize],
            page_size,
            sr: 0,
            cr: 0,
            bank: 0,
            four_byte: false,
            busy_polls: 0,
            busy: 0,
            selected: false,
            seen: Vec::new(),
        }
    }

    /// An erased part looked up by table name
    pub fn by_name(name: &str) -> Result<Self, SimError> {
        chip::find_by_name(name)
            .map(Self::new)
            .ok_or_else(|| SimError::UnknownChip(name.to_string()))
    }

    /// Copy `image` to the start of the array
    pub fn load(&mut self, image: &[u8]) -> Result<(), SimError> {
        if image.len() > self.data.len() {
            return Err(SimError::ImageTooLarge {
                image: image.len(),
                size: self.data.len(),
            });
        }
        self.data[..image.len()].copy_from_slice(image);
        Ok(())
    }

    /// Table entry this part answers RDID with
    pub fn info(&self) -> &'static FlashInfo {
        self.info
    }

    /// Array contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the part, keeping its contents
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Status polls that report WIP after each program, erase or WRSR
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.busy_polls = polls;
    }

    /// Status register
    pub fn sr(&self) -> u8 {
        self.sr
    }

    /// Configuration register
    pub fn cr(&self) -> u8 {
        self.cr
    }

    /// Bank (extended address) register
    pub fn bank(&self) -> u8 {
        self.bank
    }

    /// Whether EN4B is in effect
    pub fn four_byte(&self) -> bool {
        self.four_byte
    }

    /// Chip-select asserted
    pub fn select(&mut self) {
        if self.selected {
            self.deselect();
        }
        self.selected = true;
        self.seen.clear();
    }

    /// Chip-select released
    pub fn deselect(&mut self) {
        if !self.selected {
            return;
        }
        self.selected = false;
        let seen = core::mem::take(&mut self.seen);
        if let Some((&op, args)) = seen.split_first() {
            self.commit(op, args);
        }
    }

    /// Clock one byte in and return the byte clocked out
    pub fn exchange(&mut self, tx: u8) -> u8 {
        if !self.selected {
            return 0xff;
        }
        let index = self.seen.len();
        self.seen.push(tx);
        if index == 0 {
            return 0xff;
        }

        let op = self.seen[0];
        let n = index - 1;
        match op {
            opcodes::RDID => self.info.id.get(n).copied().unwrap_or(0),
            opcodes::RDSR => self.status(),
            opcodes::RDFSR => {
                if self.busy > 0 {
                    0
                } else {
                    opcodes::FSR_PEC
                }
            }
            opcodes::RDCR => self.cr,
            opcodes::BRRD | opcodes::RDEAR => self.bank,
            opcodes::READ => self.read_byte(n, 0),
            opcodes::FAST_READ | opcodes::DOR | opcodes::QOR | opcodes::DIOR => self.read_byte(n, 1),
            opcodes::QIOR => self.read_byte(n, 2),
            _ => 0xff,
        }
    }

    fn status(&mut self) -> u8 {
        if self.busy > 0 {
            self.busy -= 1;
            self.sr | opcodes::SR_WIP
        } else {
            self.sr
        }
    }

    fn addr_bytes(&self) -> usize {
        if self.four_byte {
            4
        } else {
            3
        }
    }

    fn address(&self, bytes: &[u8]) -> usize {
        let addr = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
        if self.four_byte {
            addr
        } else {
            ((self.bank as usize) << 24) | addr
        }
    }

    fn read_byte(&self, n: usize, dummy: usize) -> u8 {
        let width = self.addr_bytes();
        let start = width + dummy;
        if n < start {
            return 0xff;
        }
        let addr = self.address(&self.seen[1..1 + width]);
        self.data[(addr + n - start) % self.data.len()]
    }

    fn commit(&mut self, op: u8, args: &[u8]) {
        match op {
            opcodes::WREN => self.sr |= opcodes::SR_WEL,
            opcodes::WRDI => self.sr &= !opcodes::SR_WEL,
            opcodes::EN4B => self.four_byte = true,
            opcodes::EX4B => self.four_byte = false,
            opcodes::BRWR | opcodes::WREAR => {
                if let Some(&bank) = args.first() {
                    self.bank = bank;
                }
                self.sr &= !opcodes::SR_WEL;
            }
            opcodes::WRSR => {
                if !self.write_enabled() || args.is_empty() {
                    return;
                }
                self.sr = args[0] & !(opcodes::SR_WIP | opcodes::SR_WEL);
                if let Some(&cr) = args.get(1) {
                    self.cr = cr;
                }
                self.busy = self.busy_polls;
            }
            opcodes::PP | opcodes::QPP => {
                let width = self.addr_bytes();
                if !self.write_enabled() || args.len() <= width {
                    return;
                }
                let addr = self.address(&args[..width]);
                self.program(addr, &args[width..]);
                self.busy = self.busy_polls;
            }
            opcodes::SE_20 | opcodes::BE_D8 => {
                let width = self.addr_bytes();
                if !self.write_enabled() || args.len() < width {
                    return;
                }
                let size = if op == opcodes::SE_20 {
                    4096
                } else {
                    self.info.sector_size as usize
                };
                let addr = self.address(&args[..width]) % self.data.len();
                let start = addr & !(size - 1);
                let end = (start + size).min(self.data.len());
                self.data[start..end].fill(0xff);
                log::trace!("nor: erase {:#x}..{:#x}", start, end);
                self.sr &= !opcodes::SR_WEL;
                self.busy = self.busy_polls;
            }
            _ => {}
        }
    }

    fn write_enabled(&self) -> bool {
        self.sr & opcodes::SR_WEL != 0
    }

    fn program(&mut self, addr: usize, bytes: &[u8]) {
        let page = self.page_size;
        let base = addr & !(page - 1);
        let len = self.data.len();
        for (i, &b) in bytes.iter().enumerate() {
            // Data past the page end wraps to its start
            let a = (base + ((addr + i) & (page - 1))) % len;
            self.data[a] &= b;
        }
        log::trace!("nor: program {:#x}+{:#x}", addr, bytes.len());
        self.sr &= !opcodes::SR_WEL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(chip: &mut NorChip, bytes: &[u8]) -> Vec<u8> {
        chip.select();
        let out = bytes.iter().map(|&b| chip.exchange(b)).collect();
        chip.deselect();
        out
    }

    #[test]
    fn test_rdid() {
        let mut chip = NorChip::by_name("mx25l12805").unwrap();
        let out = run(&mut chip, &[opcodes::RDID, 0xff, 0xff, 0xff]);
        assert_eq!(&out[1..], &[0xc2, 0x20, 0x18]);
    }

    #[test]
    fn test_program_needs_wel_and_wraps() {
        let mut chip = NorChip::by_name("mx25l12805").unwrap();
        run(&mut chip, &[opcodes::PP, 0, 0, 0, 0x00]);
        assert_eq!(chip.data()[0], 0xff);

        run(&mut chip, &[opcodes::WREN]);
        run(&mut chip, &[opcodes::PP, 0, 0, 0xff, 0x11, 0x22]);
        assert_eq!(chip.data()[0xff], 0x11);
        assert_eq!(chip.data()[0x00], 0x22);
        assert_eq!(chip.sr() & opcodes::SR_WEL, 0);
    }

    #[test]
    fn test_erase_and_busy() {
        let mut chip = NorChip::by_name("mx25l12805").unwrap();
        chip.load(&[0u8; 8192]).unwrap();
        chip.set_busy_polls(2);
        run(&mut chip, &[opcodes::WREN]);
        run(&mut chip, &[opcodes::SE_20, 0, 0x10, 0x10]);
        assert!(chip.data()[0x1000..0x2000].iter().all(|&b| b == 0xff));
        assert_eq!(chip.data()[0xfff], 0);

        let sr = run(&mut chip, &[opcodes::RDSR, 0xff, 0xff, 0xff]);
        assert_eq!(&sr[1..], &[opcodes::SR_WIP, opcodes::SR_WIP, 0]);
    }

    #[test]
    fn test_bank_register_reads() {
        let mut chip = NorChip::by_name("s25fl256s_64k").unwrap();
        chip.load(&vec![0x5a; (16 << 20) + 4]).unwrap();
        run(&mut chip, &[opcodes::BRWR, 1]);
        assert_eq!(chip.bank(), 1);
        let out = run(&mut chip, &[opcodes::READ, 0, 0, 0, 0xff, 0xff]);
        assert_eq!(&out[4..], &[0x5a, 0x5a]);
    }

    #[test]
    fn test_image_too_large() {
        let mut chip = NorChip::by_name("m25p16").unwrap();
        let err = chip.load(&vec![0u8; (2 << 20) + 1]).unwrap_err();
        assert!(matches!(err, SimError::ImageTooLarge { .. }));
        assert!(matches!(NorChip::by_name("nope"), Err(SimError::UnknownChip(_))));
    }
}
