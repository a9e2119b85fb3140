//! Fixed-capacity device pool
//!
//! Slots are allocated on `device_open` and freed on `device_close`. A slot
//! is found by the identity of the device spec its backend was built
//! from, so the same physical device can never be bound twice. Handles are
//! owning and cannot be copied: closing consumes them.

use heapless::Vec;

use crate::error::{Error, Result};

use super::{BlockSpec, IoDevice, IoType, SeekMode, SpecKey, Window, MAX_IO_BLOCK_DEVICES, MAX_IO_DEVICES};

struct Slot<'a> {
    key: SpecKey,
    dev: &'a mut dyn IoDevice,
    window: Option<Window>,
}

/// A bound device slot
#[derive(Debug, PartialEq, Eq)]
pub struct DevHandle {
    index: usize,
    key: SpecKey,
}

impl DevHandle {
    /// Slot index
    pub fn index(&self) -> usize {
        self.index
    }
}

/// An open window on a bound device
#[derive(Debug, PartialEq, Eq)]
pub struct Entity {
    index: usize,
    key: SpecKey,
}

/// A refused `device_open`
///
/// Carries the backend back to the caller so it can be bound again once the
/// cause is cleared (connector registered, slot freed).
pub struct Rejected<'a> {
    /// Why the backend was refused
    pub error: Error,
    /// The backend, unbound
    pub dev: &'a mut dyn IoDevice,
}

impl core::fmt::Debug for Rejected<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl From<Rejected<'_>> for Error {
    fn from(rejected: Rejected<'_>) -> Self {
        rejected.error
    }
}

/// Pool of `N` device slots plus the registered connector types
pub struct DevicePool<'a, const N: usize = MAX_IO_BLOCK_DEVICES> {
    slots: [Option<Slot<'a>>; N],
    count: usize,
    registered: Vec<IoType, MAX_IO_DEVICES>,
}

impl<'a, const N: usize> Default for DevicePool<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> DevicePool<'a, N> {
    /// An empty pool with no connectors
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
            count: 0,
            registered: Vec::new(),
        }
    }

    /// Register a connector for `io_type`
    ///
    /// Registering the same type twice is a no-op.
    pub fn register(&mut self, io_type: IoType) -> Result<()> {
        if self.is_registered(io_type) {
            return Ok(());
        }
        self.registered.push(io_type).map_err(|_| {
            log::error!("no room to register {:?}", io_type);
            Error::NoSpace
        })
    }

    /// Whether a connector for `io_type` is registered
    pub fn is_registered(&self, io_type: IoType) -> bool {
        self.registered.contains(&io_type)
    }

    /// Number of bound slots
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when no slot is bound
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Slot index bound to the device spec `key`
    pub fn find(&self, key: SpecKey) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.key == key))
    }

    /// Bind `dev` to a free slot
    ///
    /// On failure the backend is handed back inside [`Rejected`].
    pub fn device_open(
        &mut self,
        dev: &'a mut dyn IoDevice,
    ) -> core::result::Result<DevHandle, Rejected<'a>> {
        let key = match self.admit(&mut *dev) {
            Ok(key) => key,
            Err(error) => return Err(Rejected { error, dev }),
        };
        let Some(index) = self.slots.iter().position(Option::is_none) else {
            log::error!("device pool full ({} slots)", N);
            return Err(Rejected {
                error: Error::NoSpace,
                dev,
            });
        };

        let io_type = dev.io_type();
        self.slots[index] = Some(Slot {
            key,
            dev,
            window: None,
        });
        self.count += 1;
        debug_assert!(self.count <= N);
        log::debug!("{:?} device bound to slot {}", io_type, index);
        Ok(DevHandle { index, key })
    }

    fn admit(&self, dev: &mut dyn IoDevice) -> Result<SpecKey> {
        let io_type = dev.io_type();
        if !self.is_registered(io_type) {
            log::error!("no connector registered for {:?}", io_type);
            return Err(Error::NotRegistered);
        }

        dev.dev_open().map_err(|e| {
            log::error!("{:?} device rejected: {}", io_type, e);
            Error::InvalidArgument
        })?;

        let key = dev.spec_key();
        if self.find(key).is_some() {
            log::error!("{:?} device already bound", io_type);
            return Err(Error::Busy);
        }
        Ok(key)
    }

    /// Release a slot
    pub fn device_close(&mut self, handle: DevHandle) -> Result<()> {
        self.slot_mut(handle.index, handle.key)?;
        if let Some(slot) = self.slots[handle.index].take() {
            slot.dev.dev_close();
        }
        debug_assert!(self.count > 0);
        self.count -= 1;
        Ok(())
    }

    fn slot_mut(&mut self, index: usize, key: SpecKey) -> Result<&mut Slot<'a>> {
        match self.slots.get_mut(index) {
            Some(Some(slot)) if slot.key == key => Ok(slot),
            _ => Err(Error::NotFound),
        }
    }

    fn window_mut(&mut self, entity: &Entity) -> Result<(&mut dyn IoDevice, &mut Window)> {
        let slot = self.slot_mut(entity.index, entity.key)?;
        match slot.window.as_mut() {
            Some(window) => Ok((&mut *slot.dev, window)),
            None => Err(Error::NotFound),
        }
    }

    /// Open a window of the device bound to `handle`
    ///
    /// Offset and length must be multiples of the device page size.
    pub fn open(&mut self, handle: &DevHandle, spec: &BlockSpec) -> Result<Entity> {
        let slot = self.slot_mut(handle.index, handle.key)?;
        let page_size = slot.dev.page_size();
        if !spec.is_aligned(page_size) {
            log::error!(
                "region {:#x}+{:#x} not aligned to {:#x}",
                spec.offset,
                spec.length,
                page_size
            );
            return Err(Error::InvalidArgument);
        }
        if slot.window.is_some() {
            log::error!("slot {} already has an open entity", handle.index);
            return Err(Error::Busy);
        }

        log::info!("open {:#x}+{:#x}", spec.offset, spec.length);
        slot.window = Some(Window::new(spec));
        Ok(Entity {
            index: handle.index,
            key: handle.key,
        })
    }

    /// Move the cursor of `entity`
    ///
    /// The new cursor must stay inside the window; it is left unchanged
    /// otherwise.
    pub fn seek(&mut self, entity: &Entity, mode: SeekMode, offset: i64) -> Result<()> {
        let (_, window) = self.window_mut(entity)?;
        let target = match mode {
            SeekMode::Set => offset,
            SeekMode::Cur => (window.cursor as i64).checked_add(offset).ok_or(Error::InvalidArgument)?,
            SeekMode::End => {
                log::error!("unsupported seek mode {:?}", mode);
                return Err(Error::InvalidArgument);
            }
        };

        if target < 0 || target as u64 >= window.size as u64 {
            log::error!("seek to {:#x} outside window of {:#x}", target, window.size);
            return Err(Error::InvalidArgument);
        }

        log::info!("seek {:?} {:#x} -> {:#x}", mode, offset, target);
        window.cursor = target as usize;
        Ok(())
    }

    /// Read `buf.len()` bytes at the cursor of `entity`
    ///
    /// The length must be non-zero and no larger than the window. It is not
    /// checked against the cursor, so a read starting past the window base
    /// may run beyond the window end into the rest of the device. Use
    /// [`EntityReader`](super::EntityReader) for reads clamped to the window.
    pub fn read(&mut self, entity: &Entity, buf: &mut [u8]) -> Result<usize> {
        let (dev, window) = self.window_mut(entity)?;
        if buf.is_empty() || buf.len() > window.size {
            log::error!("read of {:#x} from window of {:#x}", buf.len(), window.size);
            return Err(Error::InvalidArgument);
        }

        log::info!("read {:#x} at {:#x}", buf.len(), window.position());
        dev.read(window, buf)
    }

    /// Write `buf` at the cursor of `entity`
    pub fn write(&mut self, entity: &Entity, buf: &[u8]) -> Result<usize> {
        let (dev, window) = self.window_mut(entity)?;
        dev.write(window, buf)
    }

    /// Current window of `entity`
    pub fn window(&self, entity: &Entity) -> Result<Window> {
        match self.slots.get(entity.index) {
            Some(Some(slot)) if slot.key == entity.key => slot.window.ok_or(Error::NotFound),
            _ => Err(Error::NotFound),
        }
    }

    /// Close `entity`, leaving its device bound
    pub fn close(&mut self, entity: Entity) -> Result<()> {
        let slot = self.slot_mut(entity.index, entity.key)?;
        if slot.window.take().is_none() {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    /// Verify that `spec` can be opened on `handle`, then close it again
    pub fn check(&mut self, handle: &DevHandle, spec: &BlockSpec) -> Result<()> {
        let entity = self.open(handle, spec)?;
        self.close(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemmapDevice, SfDevSpec, SfDevice, SfOps};
    use std::vec;

    struct PatternOps;

    impl SfOps for PatternOps {
        fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize> {
            for (i, b) in buf.iter_mut().enumerate() {
                *b = (offset as usize + i) as u8;
            }
            Ok(buf.len())
        }

        fn write(&mut self, _offset: u32, buf: &[u8]) -> Result<usize> {
            Ok(buf.len())
        }
    }

    fn sf_spec() -> SfDevSpec {
        SfDevSpec {
            buffer: BlockSpec::new(0x4000_0000, 4096),
            page_size: 2048,
        }
    }

    #[test]
    fn test_open_seek_read_close() {
        let spec = sf_spec();
        let mut scratch = vec![0u8; 4096];
        let mut dev = SfDevice::new(&spec, &mut scratch, PatternOps);
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Sf).unwrap();

        let handle = pool.device_open(&mut dev).unwrap();
        let entity = pool.open(&handle, &BlockSpec::new(0x2000, 0x4000)).unwrap();
        assert_eq!(pool.window(&entity).unwrap().cursor, 0);

        pool.seek(&entity, SeekMode::Set, 0x10).unwrap();
        pool.seek(&entity, SeekMode::Cur, 0x10).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(pool.read(&entity, &mut buf), Ok(4));
        assert_eq!(buf, [0x20, 0x21, 0x22, 0x23]);
        assert_eq!(pool.window(&entity).unwrap().cursor, 0x24);

        pool.close(entity).unwrap();
        pool.device_close(handle).unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_seek_is_repeatable() {
        let spec = sf_spec();
        let mut scratch = vec![0u8; 4096];
        let mut dev = SfDevice::new(&spec, &mut scratch, PatternOps);
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Sf).unwrap();
        let handle = pool.device_open(&mut dev).unwrap();
        let entity = pool.open(&handle, &BlockSpec::new(0, 0x2000)).unwrap();

        let mut first = [0u8; 300];
        let mut second = [0u8; 300];
        pool.seek(&entity, SeekMode::Set, 0x123).unwrap();
        pool.read(&entity, &mut first).unwrap();
        pool.seek(&entity, SeekMode::Set, 0x123).unwrap();
        pool.read(&entity, &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_seek_bounds() {
        let mut mem = [0u8; 4096];
        let mut dev = MemmapDevice::new(&mut mem);
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Memmap).unwrap();
        let handle = pool.device_open(&mut dev).unwrap();
        let entity = pool.open(&handle, &BlockSpec::new(0, 1024)).unwrap();

        pool.seek(&entity, SeekMode::Set, 1023).unwrap();
        let mut one = [0u8; 1];
        assert_eq!(pool.read(&entity, &mut one), Ok(1));

        pool.seek(&entity, SeekMode::Set, 10).unwrap();
        assert_eq!(pool.seek(&entity, SeekMode::Set, 1024), Err(Error::InvalidArgument));
        assert_eq!(pool.seek(&entity, SeekMode::Set, -1), Err(Error::InvalidArgument));
        assert_eq!(pool.seek(&entity, SeekMode::Cur, -11), Err(Error::InvalidArgument));
        assert_eq!(pool.seek(&entity, SeekMode::Cur, 1014), Err(Error::InvalidArgument));
        assert_eq!(pool.seek(&entity, SeekMode::End, 0), Err(Error::InvalidArgument));
        // Failed seeks leave the cursor alone
        assert_eq!(pool.window(&entity).unwrap().cursor, 10);
    }

    #[test]
    fn test_read_length_checks() {
        let mut mem = [0u8; 4096];
        let mut dev = MemmapDevice::new(&mut mem);
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Memmap).unwrap();
        let handle = pool.device_open(&mut dev).unwrap();
        let entity = pool.open(&handle, &BlockSpec::new(0, 16)).unwrap();

        let mut empty = [0u8; 0];
        let mut big = [0u8; 17];
        assert_eq!(pool.read(&entity, &mut empty), Err(Error::InvalidArgument));
        assert_eq!(pool.read(&entity, &mut big), Err(Error::InvalidArgument));
    }

    #[test]
    fn test_read_length_ignores_cursor() {
        let mut mem = [0u8; 64];
        for (i, b) in mem.iter_mut().enumerate() {
            *b = i as u8;
        }
        let mut dev = MemmapDevice::new(&mut mem);
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Memmap).unwrap();
        let handle = pool.device_open(&mut dev).unwrap();
        let entity = pool.open(&handle, &BlockSpec::new(0, 16)).unwrap();

        // A full-window read from the middle carries on past the window end
        pool.seek(&entity, SeekMode::Set, 8).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(pool.read(&entity, &mut buf), Ok(16));
        assert_eq!(buf[0], 8);
        assert_eq!(buf[15], 23);
        assert_eq!(pool.window(&entity).unwrap().cursor, 24);
    }

    #[test]
    fn test_open_rejects_misaligned_and_second_entity() {
        let spec = sf_spec();
        let mut scratch = vec![0u8; 4096];
        let mut dev = SfDevice::new(&spec, &mut scratch, PatternOps);
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Sf).unwrap();
        let handle = pool.device_open(&mut dev).unwrap();

        assert_eq!(
            pool.open(&handle, &BlockSpec::new(100, 2048)),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            pool.open(&handle, &BlockSpec::new(0, 2000)),
            Err(Error::InvalidArgument)
        );

        let entity = pool.open(&handle, &BlockSpec::new(0, 2048)).unwrap();
        assert_eq!(pool.open(&handle, &BlockSpec::new(0, 2048)), Err(Error::Busy));
        pool.close(entity).unwrap();
        pool.check(&handle, &BlockSpec::new(2048, 2048)).unwrap();
    }

    #[test]
    fn test_device_open_failures() {
        let spec = sf_spec();
        let mut scratch_a = vec![0u8; 4096];
        let mut scratch_b = vec![0u8; 4096];
        let mut mem = [0u8; 16];
        let mut a = SfDevice::new(&spec, &mut scratch_a, PatternOps);
        let mut b = SfDevice::new(&spec, &mut scratch_b, PatternOps);
        let mut m = MemmapDevice::new(&mut mem);

        let mut pool: DevicePool<'_, 1> = DevicePool::new();
        let rejected = pool.device_open(&mut a).unwrap_err();
        assert_eq!(rejected.error, Error::NotRegistered);

        pool.register(IoType::Sf).unwrap();
        pool.register(IoType::Memmap).unwrap();
        let handle = pool.device_open(rejected.dev).unwrap();
        assert_eq!(pool.find(SpecKey::of(&spec)), Some(handle.index()));

        // Same device spec, already bound
        assert_eq!(pool.device_open(&mut b).unwrap_err().error, Error::Busy);
        // Single slot taken
        let rejected = pool.device_open(&mut m).unwrap_err();
        assert_eq!(rejected.error, Error::NoSpace);
        assert_eq!(pool.len(), 1);

        // Freeing the slot lets the same backend in
        pool.device_close(handle).unwrap();
        let handle = pool.device_open(rejected.dev).unwrap();
        assert_eq!(handle.index(), 0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_device_open_validates_backend() {
        let spec = SfDevSpec {
            buffer: BlockSpec::new(0x100, 4096),
            page_size: 2048,
        };
        let mut scratch = vec![0u8; 4096];
        let mut dev = SfDevice::new(&spec, &mut scratch, PatternOps);
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Sf).unwrap();
        assert_eq!(pool.device_open(&mut dev).unwrap_err().error, Error::InvalidArgument);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_register_limits() {
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Sf).unwrap();
        pool.register(IoType::Sf).unwrap();
        pool.register(IoType::Memmap).unwrap();
        assert!(pool.is_registered(IoType::Sf));
        assert!(pool.is_registered(IoType::Memmap));
    }

    #[test]
    fn test_stale_handles() {
        let mut mem = [0u8; 64];
        let mut dev = MemmapDevice::new(&mut mem);
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Memmap).unwrap();
        let handle = pool.device_open(&mut dev).unwrap();
        let entity = pool.open(&handle, &BlockSpec::new(0, 32)).unwrap();
        let stale = Entity {
            index: entity.index,
            key: entity.key,
        };
        pool.close(entity).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(pool.read(&stale, &mut buf), Err(Error::NotFound));
        assert_eq!(pool.close(stale), Err(Error::NotFound));

        let stale_handle = DevHandle {
            index: handle.index,
            key: handle.key,
        };
        pool.device_close(handle).unwrap();
        assert_eq!(pool.device_close(stale_handle), Err(Error::NotFound));
    }

    #[test]
    fn test_sf_write_is_noop_through_pool() {
        let spec = sf_spec();
        let mut scratch = vec![0u8; 4096];
        let mut dev = SfDevice::new(&spec, &mut scratch, PatternOps);
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Sf).unwrap();
        let handle = pool.device_open(&mut dev).unwrap();
        let entity = pool.open(&handle, &BlockSpec::new(0, 2048)).unwrap();
        assert_eq!(pool.write(&entity, &[0xaa; 16]), Ok(0));
    }
    #[test]
    fn test_flash_backed_entity_read() {
        use crate::config::FlashConfig;
        use crate::flash::SpiFlash;
        use crate::testing::{pattern, MockBus};

        let mut flash = SpiFlash::new(MockBus::new(), FlashConfig::default());
        flash.scan().unwrap();

        let spec = sf_spec();
        let mut scratch = vec![0u8; 4096];
        let mut dev = SfDevice::new(&spec, &mut scratch, &mut flash);
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Sf).unwrap();
        let handle = pool.device_open(&mut dev).unwrap();
        let entity = pool.open(&handle, &BlockSpec::new(0x8000, 0x4000)).unwrap();

        let mut buf = vec![0u8; 5000];
        assert_eq!(pool.read(&entity, &mut buf), Ok(5000));
        for (i, b) in buf.iter().enumerate() {
            assert_eq!(*b, pattern(0x8000 + i as u32));
        }
        pool.close(entity).unwrap();
        pool.device_close(handle).unwrap();
        drop(pool);

        let reads: std::vec::Vec<_> = flash
            .bus_mut()
            .commands()
            .into_iter()
            .filter(|c| c[0] == crate::spi::opcodes::FAST_READ)
            .collect();
        assert_eq!(reads.len(), 2);
        assert_eq!(&reads[0][1..4], &[0x00, 0x80, 0x00]);
        assert_eq!(&reads[1][1..4], &[0x00, 0x90, 0x00]);
    }
}
