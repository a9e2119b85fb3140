//! Part identification and bring-up

use crate::bus::SpiBus;
use crate::chip::{self, manufacturer, FlashInfo, MAX_ID_LEN};
use crate::command;
use crate::error::{Error, Result};
use crate::spi::{opcodes, CommandFrame};

use super::{Addressing, BankRegister, FlashState, Geometry, SpiFlash, BANK_SIZE};

/// Read-ID attempts before giving up
pub const SCAN_ATTEMPTS: u32 = 5;

impl<B: SpiBus> SpiFlash<B> {
    /// Identify the part and prepare it for use
    ///
    /// Issues up to [`SCAN_ATTEMPTS`] read-ID commands. On a match the
    /// write-protect bits are cleared for vendors that power up locked, the
    /// geometry is derived, quad mode is enabled if a quad command was
    /// configured and the high address mode is set up.
    pub fn scan(&mut self) -> Result<Geometry> {
        self.state = FlashState::Scanning;
        self.geometry = None;
        self.bank = None;
        match self.scan_inner() {
            Ok(geometry) => {
                self.state = FlashState::Ready;
                Ok(geometry)
            }
            Err(e) => {
                self.state = FlashState::Uninitialized;
                self.geometry = None;
                self.bank = None;
                Err(e)
            }
        }
    }

    fn scan_inner(&mut self) -> Result<Geometry> {
        let info = (0..SCAN_ATTEMPTS)
            .find_map(|_| self.read_id())
            .ok_or_else(|| {
                log::error!("read id timeout");
                Error::ChipNotFound
            })?;

        log::info!(
            "scan id {:02x} {:04x}: {} {}",
            info.jedec_mfr(),
            info.jedec_id(),
            info.vendor(),
            info.name
        );

        // Flash powers up read-only, so clear BP# bits
        if matches!(
            info.jedec_mfr(),
            manufacturer::ATMEL | manufacturer::MACRONIX | manufacturer::SST
        ) {
            if let Err(e) = self.write_sr(0) {
                log::warn!("failed to clear write protection: {}", e);
            }
        }

        let geometry = Geometry::derive(info, &self.config);
        self.geometry = Some(geometry);

        if self.config.read_cmd.is_quad() || self.config.write_cmd.is_quad() {
            if let Err(e) = self.set_quad_mode(info) {
                log::error!("fail to set QEB for {:02x}", info.jedec_mfr());
                return Err(e);
            }
        }

        self.setup_addressing(info, &geometry)?;

        log::info!(
            "{}: {} KiB, page {} B, erase {} B (cmd {:#04x}), read cmd {:#04x} + {} dummy",
            geometry.name(),
            geometry.size / 1024,
            geometry.page_size,
            geometry.erase_size,
            geometry.erase_cmd,
            geometry.read_cmd,
            geometry.dummy_bytes
        );
        Ok(geometry)
    }

    /// Read the ID bytes and look them up in the table
    ///
    /// Bus errors and unknown responses both yield `None`.
    pub fn read_id(&mut self) -> Option<&'static FlashInfo> {
        let mut id = [0u8; MAX_ID_LEN];
        if let Err(e) = command::cmd(&mut self.bus, opcodes::RDID, &mut id) {
            log::error!("error {} read ID", e);
            return None;
        }

        let info = chip::find_by_id(&id);
        if info.is_none() {
            log::info!("unrecognized id: {:02x}, {:02x}, {:02x}", id[0], id[1], id[2]);
        }
        info
    }

    fn set_quad_mode(&mut self, info: &FlashInfo) -> Result<()> {
        match info.jedec_mfr() {
            manufacturer::MACRONIX => self.macronix_quad_enable(),
            manufacturer::SPANSION | manufacturer::WINBOND => self.spansion_quad_enable(),
            manufacturer::STMICRO => {
                log::debug!("QEB is volatile for {:02x} flash", info.jedec_mfr());
                Ok(())
            }
            mfr => {
                log::error!("no quad enable sequence for {:02x} flash", mfr);
                Err(Error::UnsupportedVendor)
            }
        }
    }

    fn macronix_quad_enable(&mut self) -> Result<()> {
        let sr = self.read_sr()?;
        if sr & opcodes::SR_QEB_MXIC != 0 {
            return Ok(());
        }

        self.write_sr(sr | opcodes::SR_QEB_MXIC)?;

        match self.read_sr() {
            Ok(sr) if sr & opcodes::SR_QEB_MXIC != 0 => Ok(()),
            _ => {
                log::error!("Macronix SR quad bit not set");
                Err(Error::QuadEnableFailed)
            }
        }
    }

    fn spansion_quad_enable(&mut self) -> Result<()> {
        let cr = self.read_cr()?;
        if cr & opcodes::CR_QEB_WINSPAN != 0 {
            return Ok(());
        }

        self.write_cr(cr | opcodes::CR_QEB_WINSPAN)?;

        match self.read_cr() {
            Ok(cr) if cr & opcodes::CR_QEB_WINSPAN != 0 => Ok(()),
            _ => {
                log::error!("Spansion CR quad bit not set");
                Err(Error::QuadEnableFailed)
            }
        }
    }

    /// Prepare access above 16 MiB
    fn setup_addressing(&mut self, info: &FlashInfo, geometry: &Geometry) -> Result<()> {
        if geometry.size <= BANK_SIZE {
            return Ok(());
        }

        match self.config.addressing {
            Addressing::ThreeByte => Ok(()),
            Addressing::FourByte => {
                let frame = CommandFrame::new(opcodes::EN4B);
                command::cmd_write(&mut self.bus, frame.as_bytes(), &[])?;
                self.bus.release_bus();
                Ok(())
            }
            Addressing::BankRegister => {
                let (read_cmd, write_cmd) = if info.jedec_mfr() == manufacturer::SPANSION {
                    (opcodes::BRRD, opcodes::BRWR)
                } else {
                    (opcodes::RDEAR, opcodes::WREAR)
                };

                let mut current = [0u8; 1];
                let frame = CommandFrame::new(read_cmd);
                if let Err(e) = self.read_common(&frame, &mut current) {
                    log::error!("fail to read bank addr register");
                    return Err(e);
                }

                self.bank = Some(BankRegister {
                    read_cmd,
                    write_cmd,
                    current: current[0],
                });
                Ok(())
            }
        }
    }
}
