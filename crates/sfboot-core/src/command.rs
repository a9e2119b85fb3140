//! Command layer
//!
//! A flash command is a command phase (opcode, address, dummy bytes) followed
//! by an optional data phase, both under one chip-select assertion. The command
//! phase carries `BEGIN`, plus `END` when there is no data; the data phase
//! always carries `END`. Bus errors are logged and returned unchanged.

use crate::bus::{SpiBus, XferFlags};
use crate::error::Result;

/// Send `cmd`, then exchange `data_len` bytes out of `data_out` and/or into `data_in`
pub fn read_write<B: SpiBus + ?Sized>(
    bus: &mut B,
    cmd: &[u8],
    data_out: Option<&[u8]>,
    data_in: Option<&mut [u8]>,
    data_len: usize,
) -> Result<()> {
    let mut flags = XferFlags::BEGIN;
    if data_len == 0 {
        flags |= XferFlags::END;
    }

    if let Err(e) = bus.transfer(cmd.len() * 8, Some(cmd), None, flags) {
        log::error!("send cmd ({} bytes): {}", cmd.len(), e);
        return Err(e);
    }

    if data_len != 0 {
        if let Err(e) = bus.transfer(data_len * 8, data_out, data_in, XferFlags::END) {
            log::error!("send data {} B: {}", data_len, e);
            return Err(e);
        }
    }
    Ok(())
}

/// Send `cmd` and read `data.len()` bytes of response
pub fn cmd_read<B: SpiBus + ?Sized>(bus: &mut B, cmd: &[u8], data: &mut [u8]) -> Result<()> {
    let len = data.len();
    read_write(bus, cmd, None, Some(data), len)
}

/// Send `cmd` followed by `data`
pub fn cmd_write<B: SpiBus + ?Sized>(bus: &mut B, cmd: &[u8], data: &[u8]) -> Result<()> {
    read_write(bus, cmd, Some(data), None, data.len())
}

/// Send a single-byte opcode and read `response.len()` bytes
pub fn cmd<B: SpiBus + ?Sized>(bus: &mut B, opcode: u8, response: &mut [u8]) -> Result<()> {
    cmd_read(bus, &[opcode], response)
}
