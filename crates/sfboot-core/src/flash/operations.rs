//! Status polling, erase, program and raw read

use crate::bus::SpiBus;
use crate::command;
use crate::error::{Error, Result};
use crate::poll::{poll_until, PollBudget, PollOutcome};
use crate::spi::{opcodes, CommandFrame};

use super::{DualFlash, FlashState, Geometry, SpiFlash};

impl<B: SpiBus> SpiFlash<B> {
    /// Read the status register (0x05)
    pub fn read_sr(&mut self) -> Result<u8> {
        self.read_reg(opcodes::RDSR, "status")
    }

    /// Read the flag status register (0x70)
    pub fn read_fsr(&mut self) -> Result<u8> {
        self.read_reg(opcodes::RDFSR, "flag status")
    }

    /// Read the configuration register (0x35)
    pub fn read_cr(&mut self) -> Result<u8> {
        self.read_reg(opcodes::RDCR, "config")
    }

    fn read_reg(&mut self, opcode: u8, what: &str) -> Result<u8> {
        let mut value = [0u8; 1];
        if let Err(e) = command::cmd(&mut self.bus, opcode, &mut value) {
            log::error!("fail to read {} register", what);
            return Err(e);
        }
        Ok(value[0])
    }

    /// Write the status register
    pub fn write_sr(&mut self, sr: u8) -> Result<()> {
        let frame = CommandFrame::new(opcodes::WRSR);
        if let Err(e) = self.write_common(&frame, Some(&[sr])) {
            log::error!("fail to write status register");
            return Err(e);
        }
        Ok(())
    }

    /// Write the configuration register
    ///
    /// The register is reached through a two byte WRSR, so the current status
    /// register value is read first and written back unchanged.
    pub fn write_cr(&mut self, cr: u8) -> Result<()> {
        let sr = self.read_sr()?;
        let frame = CommandFrame::new(opcodes::WRSR);
        if let Err(e) = self.write_common(&frame, Some(&[sr, cr])) {
            log::error!("fail to write config register");
            return Err(e);
        }
        Ok(())
    }

    /// One readiness check: WIP clear and, on FSR parts, PEC set
    pub fn is_ready(&mut self) -> Result<bool> {
        let sr = self.read_sr()?;
        let use_fsr = self.geometry.map_or(false, |g| g.use_fsr);
        let fsr_ready = if use_fsr {
            self.read_fsr()? & opcodes::FSR_PEC != 0
        } else {
            true
        };
        Ok(sr & opcodes::SR_WIP == 0 && fsr_ready)
    }

    /// Poll until the part is idle, at most `timeout_ms * 10` checks 100 µs apart
    ///
    /// A zero timeout performs no check at all and fails immediately.
    pub fn wait_ready(&mut self, timeout_ms: u32) -> Result<()> {
        let outcome = poll_until(
            &mut *self,
            PollBudget::from_millis(timeout_ms),
            |flash| flash.is_ready(),
            |flash, us| flash.bus.delay_us(us),
        )?;

        match outcome {
            PollOutcome::Ready(_) => Ok(()),
            PollOutcome::Exhausted => {
                log::error!("SF: timeout after {} ms", timeout_ms);
                Err(Error::Timeout)
            }
        }
    }

    /// Write-enable, send `frame` with `data`, then wait for completion
    ///
    /// The program timeout applies when a payload is present, the erase
    /// timeout otherwise.
    pub fn write_common(&mut self, frame: &CommandFrame, data: Option<&[u8]>) -> Result<()> {
        let (timeout, what) = match data {
            Some(_) => (self.config.prog_timeout_ms, "program"),
            None => (self.config.erase_timeout_ms, "page erase"),
        };

        if let Err(e) = command::cmd(&mut self.bus, opcodes::WREN, &mut []) {
            log::error!("write enable failed");
            return Err(e);
        }

        if let Err(e) = command::cmd_write(&mut self.bus, frame.as_bytes(), data.unwrap_or(&[])) {
            log::error!("write cmd {:#04x} failed", frame.opcode());
            return Err(e);
        }

        if let Err(e) = self.wait_ready(timeout) {
            log::error!("write {} timed out", what);
            return Err(e);
        }

        self.bus.release_bus();
        Ok(())
    }

    /// Send `frame` and read the response into `data`
    pub fn read_common(&mut self, frame: &CommandFrame, data: &mut [u8]) -> Result<()> {
        if let Err(e) = command::cmd_read(&mut self.bus, frame.as_bytes(), data) {
            log::error!("read cmd {:#04x} failed", frame.opcode());
            return Err(e);
        }
        self.bus.release_bus();
        Ok(())
    }

    /// Read back the bank register, if one is in use
    pub fn read_bar(&mut self) -> Result<Option<u8>> {
        let Some(bank) = self.bank else {
            return Ok(None);
        };
        let mut value = [0u8; 1];
        self.read_common(&CommandFrame::new(bank.read_cmd), &mut value)?;
        Ok(Some(value[0]))
    }

    /// Select the bank holding `addr` and return its index
    ///
    /// The register is only written when the bank changes. Without a bank
    /// register the index is computed but nothing is sent.
    fn write_bar(&mut self, geometry: &Geometry, addr: u32) -> Result<u32> {
        let bank_sel = addr / geometry.bank_span();
        let Some(bank) = self.bank else {
            return Ok(bank_sel);
        };
        if bank_sel == bank.current as u32 {
            return Ok(bank_sel);
        }

        let frame = CommandFrame::new(bank.write_cmd);
        if let Err(e) = self.write_common(&frame, Some(&[bank_sel as u8])) {
            log::error!("fail to write bank register");
            return Err(e);
        }
        if let Some(b) = self.bank.as_mut() {
            b.current = bank_sel as u8;
        }
        Ok(bank_sel)
    }

    /// Map a logical offset onto the address sent to the part
    fn translate(&mut self, geometry: &Geometry, offset: u32) -> u32 {
        match geometry.dual {
            DualFlash::Single => offset,
            DualFlash::Stacked => {
                let half = geometry.size >> 1;
                self.upper_page = offset >= half;
                self.bus.select_upper(self.upper_page);
                if self.upper_page {
                    offset - half
                } else {
                    offset
                }
            }
            DualFlash::Parallel => offset >> geometry.shift,
        }
    }

    fn ready_geometry(&self) -> Result<Geometry> {
        match (self.state, self.geometry) {
            (FlashState::Ready, Some(g)) => Ok(g),
            _ => Err(Error::NotReady),
        }
    }

    fn check_range(geometry: &Geometry, offset: u32, len: usize) -> Result<()> {
        if !geometry.contains(offset, len) {
            log::error!(
                "range {:#x}+{:#x} beyond flash size {:#x}",
                offset,
                len,
                geometry.size
            );
            return Err(Error::AddressOutOfBounds);
        }
        Ok(())
    }

    fn check_lock(&self, offset: u32, len: usize) -> Result<()> {
        if let Some(is_locked) = self.lock_check {
            if is_locked(offset, len as u32) {
                log::error!("offset {:#x} is protected", offset);
                return Err(Error::RegionProtected);
            }
        }
        Ok(())
    }

    /// Erase `len` bytes at `offset`, one erase unit at a time
    ///
    /// Both values must be multiples of the erase size.
    pub fn erase(&mut self, offset: u32, len: usize) -> Result<()> {
        let geometry = self.ready_geometry()?;
        let erase_size = geometry.erase_size;
        if offset % erase_size != 0 || len % erase_size as usize != 0 {
            log::error!("unaligned erase {:#x}+{:#x} (unit {:#x})", offset, len, erase_size);
            return Err(Error::InvalidAlignment);
        }
        Self::check_range(&geometry, offset, len)?;
        self.check_lock(offset, len)?;

        let mut offset = offset;
        let mut remaining = len;
        while remaining > 0 {
            let addr = self.translate(&geometry, offset);
            self.write_bar(&geometry, addr)?;

            let frame = CommandFrame::with_address(geometry.erase_cmd, geometry.addr_width, addr);
            log::debug!("erase {:02x?} ({:#x})", frame.as_bytes(), addr);

            if let Err(e) = self.write_common(&frame, None) {
                log::error!("erase failed at {:#x}", offset);
                return Err(e);
            }

            offset += erase_size;
            remaining -= erase_size as usize;
        }
        Ok(())
    }

    /// Program `data` at `offset`, never crossing a page boundary per command
    pub fn program(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        let geometry = self.ready_geometry()?;
        Self::check_range(&geometry, offset, data.len())?;
        self.check_lock(offset, data.len())?;

        let page_size = geometry.page_size as usize;
        let max_write = self.bus.max_write_size();
        let mut offset = offset;
        let mut actual = 0;
        while actual < data.len() {
            let addr = self.translate(&geometry, offset);
            self.write_bar(&geometry, addr)?;

            let byte_addr = offset as usize % page_size;
            let mut chunk_len = (data.len() - actual).min(page_size - byte_addr);
            if let Some(max) = max_write {
                chunk_len = chunk_len.min(max);
            }

            let frame = CommandFrame::with_address(geometry.write_cmd, geometry.addr_width, addr);
            log::debug!("program {:02x?} chunk_len = {}", frame.as_bytes(), chunk_len);

            if let Err(e) = self.write_common(&frame, Some(&data[actual..actual + chunk_len])) {
                log::error!("write failed at {:#x}", offset);
                return Err(e);
            }

            offset += chunk_len as u32;
            actual += chunk_len;
        }
        Ok(())
    }

    /// Raw read of `buf.len()` bytes at `offset`
    ///
    /// The transfer is split at bank boundaries. If a later chunk fails the
    /// bytes read so far are reported; an error is only returned when nothing
    /// could be read.
    pub fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize> {
        let geometry = self.ready_geometry()?;
        Self::check_range(&geometry, offset, buf.len())?;

        log::debug!(
            "sf read cmd({:#04x} - {}) addr({:#x}) len({:#x})",
            geometry.read_cmd,
            geometry.dummy_bytes,
            offset,
            buf.len()
        );

        let mut done = 0;
        while done < buf.len() {
            let logical = offset + done as u32;
            let addr = self.translate(&geometry, logical);

            let chunk = match self.write_bar(&geometry, addr) {
                Ok(bank) => {
                    let boundary = geometry.bank_span() as u64 * (bank as u64 + 1);
                    let mut remain = boundary - addr as u64;
                    if geometry.dual == DualFlash::Stacked && !self.upper_page {
                        remain = remain.min((geometry.size >> 1) as u64 - addr as u64);
                    }
                    remain.min((buf.len() - done) as u64) as usize
                }
                Err(e) => return Self::partial(done, e),
            };

            let frame = CommandFrame::with_address(geometry.read_cmd, geometry.addr_width, addr)
                .with_dummy(geometry.dummy_bytes);
            if let Err(e) = self.read_common(&frame, &mut buf[done..done + chunk]) {
                return Self::partial(done, e);
            }
            done += chunk;
        }

        log::debug!("{:#x} bytes", done);
        Ok(done)
    }

    fn partial(done: usize, e: Error) -> Result<usize> {
        log::error!("read failed after {:#x} bytes: {}", done, e);
        if done > 0 {
            Ok(done)
        } else {
            Err(e)
        }
    }
}
