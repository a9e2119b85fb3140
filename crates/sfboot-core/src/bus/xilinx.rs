//! Xilinx AXI SPI (xps_spi / axi_quad_spi in standard mode) transfer engine
//!
//! The core is configured for 8-bit transfers and manual slave select. Every
//! byte is written to SPIDTR and the matching received byte is collected from
//! SPIDRR before the next one is sent, so the FIFOs never hold more than one
//! element during a transfer.

use bitflags::bitflags;

use super::{Delay, Registers, SpiBus, XferFlags};
use crate::config::SpiConfig;
use crate::error::{Error, Result};
use crate::poll::{poll_until, PollBudget};

/// Register byte offsets within the AXI SPI block
pub mod regs {
    /// Device Global Interrupt Enable Register
    pub const DGIER: usize = 0x1C;
    /// IP Interrupt Status Register
    pub const IPISR: usize = 0x20;
    /// IP Interrupt Enable Register
    pub const IPIER: usize = 0x28;
    /// Software Reset Register
    pub const SRR: usize = 0x40;
    /// SPI Control Register
    pub const SPICR: usize = 0x60;
    /// SPI Status Register
    pub const SPISR: usize = 0x64;
    /// SPI Data Transmit Register
    pub const SPIDTR: usize = 0x68;
    /// SPI Data Receive Register
    pub const SPIDRR: usize = 0x6C;
    /// SPI Slave Select Register
    pub const SPISSR: usize = 0x70;
    /// SPI Transmit FIFO Occupancy Register
    pub const SPITFOR: usize = 0x74;
    /// SPI Receive FIFO Occupancy Register
    pub const SPIRFOR: usize = 0x78;

    /// Value written to SRR to reset the core
    pub const SRR_RESET_VALUE: u32 = 0x0a;
    /// SPISSR value with every slave deselected
    pub const SPISSR_OFF: u32 = 0xffff_ffff;

    /// Slave-select lines in SPISSR
    pub const MAX_CS: u8 = 32;

    /// SPISSR value selecting slave `cs` (active low)
    ///
    /// A `cs` beyond the register width selects nothing.
    pub const fn spissr_act(cs: u8) -> u32 {
        match 1u32.checked_shl(cs as u32) {
            Some(bit) => !bit,
            None => SPISSR_OFF,
        }
    }
}

bitflags! {
    /// SPI Control Register (SPICR)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Spicr: u32 {
        /// Local loopback
        const LOOP           = 1 << 0;
        /// SPI system enable
        const SPE            = 1 << 1;
        /// Master mode
        const MASTER_MODE    = 1 << 2;
        /// Clock polarity
        const CPOL           = 1 << 3;
        /// Clock phase
        const CPHA           = 1 << 4;
        /// Transmit FIFO reset
        const TXFIFO_RESET   = 1 << 5;
        /// Receive FIFO reset
        const RXFIFO_RESET   = 1 << 6;
        /// Manual slave select assertion
        const MANUAL_SS      = 1 << 7;
        /// Master transaction inhibit
        const MASTER_INHIBIT = 1 << 8;
        /// LSB first
        const LSB_FIRST      = 1 << 9;

        /// Value written when the bus is claimed
        const DFLT_ON  = Self::MANUAL_SS.bits() | Self::MASTER_MODE.bits() | Self::SPE.bits();
        /// Value for a parked bus
        const DFLT_OFF = Self::MASTER_INHIBIT.bits() | Self::MANUAL_SS.bits();
    }
}

bitflags! {
    /// SPI Status Register (SPISR)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Spisr: u32 {
        /// Receive FIFO empty
        const RX_EMPTY          = 1 << 0;
        /// Receive FIFO full
        const RX_FULL           = 1 << 1;
        /// Transmit FIFO empty
        const TX_EMPTY          = 1 << 2;
        /// Transmit FIFO full
        const TX_FULL           = 1 << 3;
        /// Mode fault
        const MODF              = 1 << 4;
        /// Slave mode select
        const SLAVE_MODE_SELECT = 1 << 5;
        /// CPOL/CPHA combination not supported
        const CPOL_CPHA_ERR     = 1 << 6;
        /// Slave mode error
        const SLAVE_MODE_ERR    = 1 << 7;
        /// MSB/LSB first error
        const MSB_ERR           = 1 << 8;
        /// Loopback error
        const LOOPBACK_ERR      = 1 << 9;
        /// Command error
        const COMMAND_ERR       = 1 << 10;
    }
}

bitflags! {
    /// SPI clock mode bits, numbered like Linux `spi->mode`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SpiMode: u8 {
        /// Clock phase
        const CPHA      = 0x01;
        /// Clock polarity
        const CPOL      = 0x02;
        /// Least significant bit first
        const LSB_FIRST = 0x08;
    }
}

/// Bits per shift; the core is synthesized for 8-bit transfers
const XFER_BITS: usize = 8;

/// Value shifted out when there is no transmit buffer
const IDLE_VAL: u8 = 0xff;

/// Stale RX reads allowed before a transfer: 16 FIFO entries plus one
pub const RX_DRAIN_BUDGET: u32 = 17;

/// Xilinx AXI SPI engine
pub struct XilinxSpi<R, D> {
    regs: R,
    delay: D,
    freq_hz: u32,
    cs: u8,
    mode: SpiMode,
}

impl<R: Registers, D: Delay> XilinxSpi<R, D> {
    /// Create an engine over `regs`; no register is touched until [`init`](Self::init)
    ///
    /// Fails with `InvalidArgument` when the chip-select has no SPISSR line.
    pub fn new(regs: R, delay: D, config: &SpiConfig) -> Result<Self> {
        if config.cs >= regs::MAX_CS {
            log::error!("chip-select {} out of range", config.cs);
            return Err(Error::InvalidArgument);
        }
        Ok(Self {
            regs,
            delay,
            freq_hz: config.freq_hz,
            cs: config.cs,
            mode: SpiMode::from_bits_truncate(config.mode),
        })
    }

    /// Reset the core, claim the bus and apply the configured clock mode
    pub fn init(&mut self) {
        log::info!("spi init sf");
        self.delay.delay_us(1);
        self.regs.write32(regs::SRR, regs::SRR_RESET_VALUE);
        self.claim_bus();
        self.set_mode(self.mode);
    }

    /// Deselect every slave and enable the core as manual-select master
    pub fn claim_bus(&mut self) {
        self.regs.write32(regs::SPISSR, regs::SPISSR_OFF);
        self.regs.write32(regs::SPICR, Spicr::DFLT_ON.bits());
    }

    /// Set CPOL/CPHA/LSB-first on top of the current control value
    pub fn set_mode(&mut self, mode: SpiMode) {
        let mut spicr = Spicr::from_bits_retain(self.regs.read32(regs::SPICR));
        spicr.set(Spicr::LSB_FIRST, mode.contains(SpiMode::LSB_FIRST));
        spicr.set(Spicr::CPHA, mode.contains(SpiMode::CPHA));
        spicr.set(Spicr::CPOL, mode.contains(SpiMode::CPOL));
        self.regs.write32(regs::SPICR, spicr.bits());
        self.mode = mode;
        log::debug!("xilinx spi mode {:?}, spicr {:#x}", mode, spicr.bits());
    }

    /// Assert the configured chip-select
    pub fn cs_activate(&mut self) {
        self.regs.write32(regs::SPISSR, regs::spissr_act(self.cs));
    }

    /// Release every chip-select
    pub fn cs_deactivate(&mut self) {
        self.regs.write32(regs::SPISSR, regs::SPISSR_OFF);
    }

    /// Per-byte receive poll budget: at least 1 µs, plus one for slow clocks
    pub fn byte_timeout(&self) -> u32 {
        let bit_clock = (XFER_BITS as u32) * 1_000_000;
        if self.freq_hz > bit_clock {
            2
        } else {
            bit_clock / self.freq_hz.max(1) + 1
        }
    }

    /// Current status register
    pub fn status(&mut self) -> Spisr {
        Spisr::from_bits_retain(self.regs.read32(regs::SPISR))
    }

    /// Configured bus clock in Hz
    pub fn freq_hz(&self) -> u32 {
        self.freq_hz
    }

    /// Mutable access to the register block
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// The platform delay
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Tear the engine apart again
    pub fn into_parts(self) -> (R, D) {
        (self.regs, self.delay)
    }

    fn drain_rx(&mut self) -> Result<()> {
        let mut budget = RX_DRAIN_BUDGET;
        while budget > 0 && !self.status().contains(Spisr::RX_EMPTY) {
            self.regs.read32(regs::SPIDRR);
            budget -= 1;
        }
        if budget == 0 {
            log::error!("Rx buffer not empty");
            return Err(Error::RxFifoNotEmpty);
        }
        Ok(())
    }

    fn shift_byte(&mut self, tx: u8, budget: PollBudget) -> Result<u8> {
        log::trace!("spi_xfer: tx:{:02x}", tx);
        self.regs.write32(regs::SPIDTR, tx as u32);

        let outcome = poll_until(
            &mut *self,
            budget,
            |spi| Ok(!spi.status().contains(Spisr::RX_EMPTY)),
            |spi, us| spi.delay.delay_us(us),
        )?;
        if !outcome.is_ready() {
            log::error!("Xfer timeout");
            return Err(Error::SpiTimeout);
        }

        let rx = (self.regs.read32(regs::SPIDRR) & 0xff) as u8;
        log::trace!("spi_xfer: rx:{:02x}", rx);
        Ok(rx)
    }

    fn shift(&mut self, bytes: usize, dout: Option<&[u8]>, mut din: Option<&mut [u8]>) -> Result<()> {
        let budget = PollBudget::new(self.byte_timeout(), 1);
        for i in 0..bytes {
            let tx = dout.map_or(IDLE_VAL, |out| out[i]);
            let rx = self.shift_byte(tx, budget)?;
            if let Some(buf) = din.as_deref_mut() {
                buf[i] = rx;
            }
        }
        Ok(())
    }
}

impl<R: Registers, D: Delay> SpiBus for XilinxSpi<R, D> {
    fn transfer(
        &mut self,
        bitlen: usize,
        dout: Option<&[u8]>,
        din: Option<&mut [u8]>,
        flags: XferFlags,
    ) -> Result<()> {
        let bytes = bitlen / XFER_BITS;
        log::trace!(
            "xilinx_spi_xfer: bitlen {} tx {} rx {} flags {:?}",
            bitlen,
            dout.is_some(),
            din.is_some(),
            flags
        );

        if bitlen == 0 {
            if flags.contains(XferFlags::END) {
                self.cs_deactivate();
            }
            return Ok(());
        }

        let short_out = dout.is_some_and(|b| b.len() < bytes);
        let short_in = din.as_deref().is_some_and(|b| b.len() < bytes);
        if bitlen % XFER_BITS != 0 || short_out || short_in {
            // Never leave the slave selected after a rejected request.
            self.cs_deactivate();
            if bitlen % XFER_BITS != 0 {
                log::error!("Not a multiple of {} bits", XFER_BITS);
                return Err(Error::SpiTransferFailed);
            }
            return Err(Error::BufferTooSmall);
        }

        self.drain_rx()?;

        if flags.contains(XferFlags::BEGIN) {
            self.cs_activate();
        }

        // A mid-transfer timeout leaves chip-select as it is; the caller owns
        // the BEGIN/END pairing and a failed command is never resumed.
        self.shift(bytes, dout, din)?;

        if flags.contains(XferFlags::END) {
            self.cs_deactivate();
        }
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// Loopback register file: every transmitted byte comes back inverted
    #[derive(Default)]
    struct LoopRegs {
        rx: VecDeque<u32>,
        writes: Vec<(usize, u32)>,
        spicr: u32,
        silent: bool,
        stuck: bool,
    }

    impl Registers for LoopRegs {
        fn read32(&mut self, offset: usize) -> u32 {
            match offset {
                regs::SPISR => {
                    if self.rx.is_empty() && !self.stuck {
                        Spisr::RX_EMPTY.bits()
                    } else {
                        0
                    }
                }
                regs::SPIDRR => self.rx.pop_front().unwrap_or(0),
                regs::SPICR => self.spicr,
                _ => 0,
            }
        }

        fn write32(&mut self, offset: usize, value: u32) {
            self.writes.push((offset, value));
            match offset {
                regs::SPIDTR if !self.silent => self.rx.push_back(!value & 0xff),
                regs::SPICR => self.spicr = value,
                _ => {}
            }
        }
    }

    #[derive(Default)]
    struct Ticks(u64);

    impl Delay for Ticks {
        fn delay_us(&mut self, us: u32) {
            self.0 += us as u64;
        }
    }

    fn engine(freq_hz: u32) -> XilinxSpi<LoopRegs, Ticks> {
        let cfg = SpiConfig {
            freq_hz,
            ..SpiConfig::default()
        };
        XilinxSpi::new(LoopRegs::default(), Ticks::default(), &cfg).unwrap()
    }

    fn ss_writes(spi: &mut XilinxSpi<LoopRegs, Ticks>) -> Vec<u32> {
        spi.regs_mut()
            .writes
            .iter()
            .filter(|(o, _)| *o == regs::SPISSR)
            .map(|(_, v)| *v)
            .collect()
    }

    #[test]
    fn test_init_sequence() {
        let mut spi = engine(37_500_000);
        spi.init();
        spi.set_mode(SpiMode::CPOL | SpiMode::CPHA);
        let writes = &spi.regs_mut().writes;
        assert_eq!(writes[0], (regs::SRR, regs::SRR_RESET_VALUE));
        assert_eq!(writes[1], (regs::SPISSR, regs::SPISSR_OFF));
        assert_eq!(writes[2], (regs::SPICR, Spicr::DFLT_ON.bits()));
        let last = writes.last().unwrap();
        assert_eq!(last.0, regs::SPICR);
        assert_eq!(
            last.1,
            (Spicr::DFLT_ON | Spicr::CPOL | Spicr::CPHA).bits()
        );
    }

    #[test]
    fn test_byte_timeout() {
        assert_eq!(engine(37_500_000).byte_timeout(), 2);
        assert_eq!(engine(8_000_000).byte_timeout(), 2);
        assert_eq!(engine(1_000_000).byte_timeout(), 9);
        assert_eq!(engine(100_000).byte_timeout(), 81);
    }

    #[test]
    fn test_transfer_full_duplex() {
        let mut spi = engine(37_500_000);
        let out = [0x9f, 0x00, 0xa5];
        let mut inp = [0u8; 3];
        spi.transfer(24, Some(&out), Some(&mut inp), XferFlags::ONCE)
            .unwrap();
        assert_eq!(inp, [0x60, 0xff, 0x5a]);
        assert_eq!(ss_writes(&mut spi), [regs::spissr_act(0), regs::SPISSR_OFF]);
    }

    #[test]
    fn test_idle_fill_without_tx_buffer() {
        let mut spi = engine(37_500_000);
        let mut inp = [0xaau8; 2];
        spi.transfer(16, None, Some(&mut inp), XferFlags::BEGIN)
            .unwrap();
        assert_eq!(inp, [0x00, 0x00]);
        let tx: Vec<u32> = spi
            .regs_mut()
            .writes
            .iter()
            .filter(|(o, _)| *o == regs::SPIDTR)
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(tx, [0xff, 0xff]);
        // BEGIN only: chip-select stays asserted
        assert_eq!(ss_writes(&mut spi), [regs::spissr_act(0)]);
    }

    #[test]
    fn test_zero_length_only_releases_cs() {
        let mut spi = engine(37_500_000);
        spi.transfer(0, None, None, XferFlags::END).unwrap();
        assert_eq!(ss_writes(&mut spi), [regs::SPISSR_OFF]);
        spi.transfer(0, None, None, XferFlags::BEGIN).unwrap();
        assert_eq!(ss_writes(&mut spi).len(), 1);
    }

    #[test]
    fn test_partial_byte_rejected() {
        let mut spi = engine(37_500_000);
        let out = [0u8; 2];
        let err = spi.transfer(12, Some(&out), None, XferFlags::BEGIN);
        assert_eq!(err, Err(Error::SpiTransferFailed));
        // END is forced and nothing was shifted
        assert_eq!(ss_writes(&mut spi), [regs::SPISSR_OFF]);
        assert!(!spi.regs_mut().writes.iter().any(|(o, _)| *o == regs::SPIDTR));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let mut spi = engine(37_500_000);
        let out = [0u8; 1];
        assert_eq!(
            spi.transfer(16, Some(&out), None, XferFlags::ONCE),
            Err(Error::BufferTooSmall)
        );
    }

    #[test]
    fn test_stale_rx_drained() {
        let mut spi = engine(37_500_000);
        spi.regs_mut().rx.extend([1, 2, 3]);
        let mut inp = [0u8; 1];
        spi.transfer(8, Some(&[0x0f]), Some(&mut inp), XferFlags::ONCE)
            .unwrap();
        assert_eq!(inp, [0xf0]);
    }

    #[test]
    fn test_full_fifo_drains_within_budget() {
        let mut spi = engine(37_500_000);
        spi.regs_mut().rx.extend(0..16);
        let mut inp = [0u8; 1];
        spi.transfer(8, Some(&[0x0f]), Some(&mut inp), XferFlags::ONCE)
            .unwrap();
        assert_eq!(inp, [0xf0]);
    }

    #[test]
    fn test_drain_budget_spent_is_an_error() {
        let mut spi = engine(37_500_000);
        spi.regs_mut().rx.extend(0..17);
        let err = spi.transfer(8, Some(&[0x0f]), None, XferFlags::ONCE);
        // The last read emptied the FIFO, but the budget is gone
        assert!(spi.regs_mut().rx.is_empty());
        assert_eq!(err, Err(Error::RxFifoNotEmpty));
        assert!(ss_writes(&mut spi).is_empty());
    }

    #[test]
    fn test_chip_select_range() {
        let cfg = SpiConfig {
            cs: 31,
            ..SpiConfig::default()
        };
        let mut spi = XilinxSpi::new(LoopRegs::default(), Ticks::default(), &cfg).unwrap();
        spi.cs_activate();
        assert_eq!(ss_writes(&mut spi), [0x7fff_ffff]);

        for cs in [regs::MAX_CS, 40, u8::MAX] {
            let cfg = SpiConfig {
                cs,
                ..SpiConfig::default()
            };
            assert!(matches!(
                XilinxSpi::new(LoopRegs::default(), Ticks::default(), &cfg),
                Err(Error::InvalidArgument)
            ));
            assert_eq!(regs::spissr_act(cs), regs::SPISSR_OFF);
        }
    }

    #[test]
    fn test_stuck_rx_fails_before_cs() {
        let mut spi = engine(37_500_000);
        spi.regs_mut().stuck = true;
        let err = spi.transfer(8, Some(&[0x05]), None, XferFlags::ONCE);
        assert_eq!(err, Err(Error::RxFifoNotEmpty));
        assert!(ss_writes(&mut spi).is_empty());
    }

    #[test]
    fn test_silent_peripheral_times_out() {
        let mut spi = engine(1_000_000);
        spi.regs_mut().silent = true;
        let err = spi.transfer(8, Some(&[0x05]), None, XferFlags::ONCE);
        assert_eq!(err, Err(Error::SpiTimeout));
        let (_, ticks) = spi.into_parts();
        // 9 polls, one microsecond apart
        assert_eq!(ticks.0, 9);
    }
}
