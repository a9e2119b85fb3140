//! `embedded-io` adapter over an open entity

use embedded_io::{ErrorType, Read, Seek, SeekFrom};

use crate::error::{Error, Result};

use super::{DevicePool, Entity, SeekMode};

/// Byte stream view of an entity
///
/// Reads are clamped to the end of the window and return `Ok(0)` there, so
/// the adapter can be handed to anything that consumes `embedded_io::Read`.
pub struct EntityReader<'p, 'a, const N: usize> {
    pool: &'p mut DevicePool<'a, N>,
    entity: &'p Entity,
}

impl<'p, 'a, const N: usize> EntityReader<'p, 'a, N> {
    /// Wrap `entity`, which must be open on `pool`
    pub fn new(pool: &'p mut DevicePool<'a, N>, entity: &'p Entity) -> Self {
        Self { pool, entity }
    }

    /// Cursor within the window
    pub fn position(&self) -> Result<usize> {
        Ok(self.pool.window(self.entity)?.cursor)
    }
}

impl<const N: usize> ErrorType for EntityReader<'_, '_, N> {
    type Error = Error;
}

impl<const N: usize> Read for EntityReader<'_, '_, N> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let window = self.pool.window(self.entity)?;
        let len = buf.len().min(window.size.saturating_sub(window.cursor));
        if len == 0 {
            return Ok(0);
        }
        self.pool.read(self.entity, &mut buf[..len])
    }
}

impl<const N: usize> Seek for EntityReader<'_, '_, N> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let window = self.pool.window(self.entity)?;
        let target = match pos {
            SeekFrom::Start(n) => i64::try_from(n).map_err(|_| Error::InvalidArgument)?,
            SeekFrom::Current(n) => (window.cursor as i64)
                .checked_add(n)
                .ok_or(Error::InvalidArgument)?,
            SeekFrom::End(n) => (window.size as i64)
                .checked_add(n)
                .ok_or(Error::InvalidArgument)?,
        };
        self.pool.seek(self.entity, SeekMode::Set, target)?;
        Ok(target as u64)
    }
}
