//! Firmware Image Package reader
//!
//! A FIP starts with a 16-byte table-of-contents header followed by 40-byte
//! entries, terminated by an entry whose UUID is all zeroes. Every field is
//! little-endian. The reader works on any `embedded_io` source, which in the
//! boot flow is an [`EntityReader`](crate::io::EntityReader) over the FIP
//! window of the flash.

use embedded_io::{Read, ReadExactError, Seek, SeekFrom};
use heapless::Vec;
use zerocopy::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{Error, Result};

/// ToC header magic
pub const TOC_HEADER_NAME: u32 = 0xAA64_0001;

/// Maximum number of images listed in a ToC
pub const MAX_FIP_ENTRIES: usize = 16;

/// Image type identifier as stored in the ToC
pub type Uuid = [u8; 16];

/// Trusted boot firmware (BL2)
pub const UUID_BL2: Uuid = [
    0x5f, 0xf9, 0xec, 0x0b, 0x4d, 0x22, 0x3e, 0x4d, 0xa5, 0x44, 0xc3, 0x9d, 0x81, 0xc7, 0x3f, 0x0a,
];

/// SCP firmware (SCP_BL2)
pub const UUID_SCP_BL2: Uuid = [
    0x97, 0x66, 0xfd, 0x3d, 0x89, 0xbe, 0xe8, 0x49, 0xae, 0x5d, 0x78, 0xa1, 0x40, 0x60, 0x82, 0x13,
];

/// EL3 runtime firmware (BL31)
pub const UUID_BL31: Uuid = [
    0x47, 0xd4, 0x08, 0x6d, 0x4c, 0xfe, 0x98, 0x46, 0x9b, 0x95, 0x29, 0x50, 0xcb, 0xbd, 0x5a, 0x00,
];

/// Secure payload (BL32)
pub const UUID_BL32: Uuid = [
    0x05, 0xd0, 0xe1, 0x89, 0x53, 0xdc, 0x13, 0x47, 0x8d, 0x2b, 0x50, 0x0a, 0x4b, 0x7a, 0x3e, 0x38,
];

/// Non-trusted firmware (BL33)
pub const UUID_BL33: Uuid = [
    0xd6, 0xd0, 0xee, 0xa7, 0xfc, 0xea, 0xd5, 0x4b, 0x97, 0x82, 0x99, 0x34, 0xf2, 0x34, 0xb6, 0xe4,
];

const KNOWN: &[(Uuid, &str)] = &[
    (UUID_BL2, "BL2"),
    (UUID_SCP_BL2, "SCP_BL2"),
    (UUID_BL31, "BL31"),
    (UUID_BL32, "BL32"),
    (UUID_BL33, "BL33"),
];

/// Short name of a well-known image type
pub fn image_name(uuid: &Uuid) -> Option<&'static str> {
    KNOWN.iter().find(|(u, _)| u == uuid).map(|(_, n)| *n)
}

/// On-flash ToC header
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct TocHeader {
    /// Must be [`TOC_HEADER_NAME`]
    pub name: U32,
    /// Free-form serial number
    pub serial_number: U32,
    /// Header flags
    pub flags: U64,
}

/// On-flash ToC entry
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct TocEntry {
    /// Image type
    pub uuid: Uuid,
    /// Image offset from the start of the package
    pub offset: U64,
    /// Image size in bytes
    pub size: U64,
    /// Entry flags
    pub flags: U64,
}

/// A parsed ToC entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FipEntry {
    /// Image type
    pub uuid: Uuid,
    /// Image offset from the start of the package
    pub offset: u64,
    /// Image size in bytes
    pub size: u64,
    /// Entry flags
    pub flags: u64,
}

impl FipEntry {
    /// Short name of the image type, if well known
    pub fn name(&self) -> Option<&'static str> {
        image_name(&self.uuid)
    }
}

fn read_record<R, T>(src: &mut R) -> Result<T>
where
    R: Read<Error = Error>,
    T: FromBytes + IntoBytes,
{
    let mut record = T::new_zeroed();
    src.read_exact(record.as_mut_bytes()).map_err(|e| match e {
        ReadExactError::UnexpectedEof => {
            log::error!("FIP table of contents truncated");
            Error::InvalidImage
        }
        ReadExactError::Other(e) => e,
    })?;
    Ok(record)
}

/// Parse the table of contents of a package of `len` bytes
pub fn read_toc<R>(src: &mut R, len: u64) -> Result<Vec<FipEntry, MAX_FIP_ENTRIES>>
where
    R: Read<Error = Error> + Seek,
{
    src.seek(SeekFrom::Start(0))?;

    let header: TocHeader = read_record(src)?;
    if header.name.get() != TOC_HEADER_NAME {
        log::error!("bad FIP header name {:#010x}", header.name.get());
        return Err(Error::InvalidImage);
    }

    let mut entries = Vec::new();
    loop {
        let raw: TocEntry = read_record(src)?;
        if raw.uuid == [0; 16] {
            break;
        }

        let entry = FipEntry {
            uuid: raw.uuid,
            offset: raw.offset.get(),
            size: raw.size.get(),
            flags: raw.flags.get(),
        };
        match entry.offset.checked_add(entry.size) {
            Some(end) if end <= len => {}
            _ => {
                log::error!(
                    "FIP entry {:#x}+{:#x} outside package of {:#x}",
                    entry.offset,
                    entry.size,
                    len
                );
                return Err(Error::InvalidImage);
            }
        }

        log::debug!("FIP entry {:?} at {:#x}+{:#x}", entry.name(), entry.offset, entry.size);
        entries.push(entry).map_err(|_| {
            log::error!("more than {} FIP entries", MAX_FIP_ENTRIES);
            Error::NoSpace
        })?;
    }
    Ok(entries)
}

/// Look up the entry for `uuid`
pub fn find<'e>(entries: &'e [FipEntry], uuid: &Uuid) -> Option<&'e FipEntry> {
    entries.iter().find(|e| e.uuid == *uuid)
}

/// Copy the image described by `entry` into `buf`
pub fn read_image<R>(src: &mut R, entry: &FipEntry, buf: &mut [u8]) -> Result<usize>
where
    R: Read<Error = Error> + Seek,
{
    let size = usize::try_from(entry.size).map_err(|_| Error::BufferTooSmall)?;
    if buf.len() < size {
        return Err(Error::BufferTooSmall);
    }
    if size == 0 {
        return Ok(0);
    }
    src.seek(SeekFrom::Start(entry.offset))?;
    src.read_exact(&mut buf[..size]).map_err(|e| match e {
        ReadExactError::UnexpectedEof => Error::InvalidImage,
        ReadExactError::Other(e) => e,
    })?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{BlockSpec, DevicePool, EntityReader, IoType, MemmapDevice};
    use std::vec::Vec as StdVec;

    fn entry(uuid: Uuid, offset: u64, size: u64) -> TocEntry {
        TocEntry {
            uuid,
            offset: U64::new(offset),
            size: U64::new(size),
            flags: U64::new(0),
        }
    }

    /// A package with BL2 at 0x100 and BL31 at 0x200
    fn package() -> StdVec<u8> {
        let header = TocHeader {
            name: U32::new(TOC_HEADER_NAME),
            serial_number: U32::new(0x1234),
            flags: U64::new(0),
        };
        let mut image = StdVec::new();
        image.extend_from_slice(header.as_bytes());
        image.extend_from_slice(entry(UUID_BL2, 0x100, 0x40).as_bytes());
        image.extend_from_slice(entry(UUID_BL31, 0x200, 0x80).as_bytes());
        image.extend_from_slice(entry([0; 16], 0, 0).as_bytes());
        image.resize(0x300, 0);
        image[0x100..0x140].fill(0xb2);
        image[0x200..0x280].fill(0x31);
        image
    }

    fn with_reader<F>(image: &mut [u8], f: F)
    where
        F: FnOnce(&mut EntityReader<'_, '_, 2>, u64),
    {
        let len = image.len();
        let mut dev = MemmapDevice::new(image);
        let mut pool: DevicePool<'_> = DevicePool::new();
        pool.register(IoType::Memmap).unwrap();
        let handle = pool.device_open(&mut dev).unwrap();
        let entity = pool.open(&handle, &BlockSpec::new(0, len)).unwrap();
        let mut reader = EntityReader::new(&mut pool, &entity);
        f(&mut reader, len as u64);
    }

    #[test]
    fn test_layout_sizes() {
        assert_eq!(core::mem::size_of::<TocHeader>(), 16);
        assert_eq!(core::mem::size_of::<TocEntry>(), 40);
    }

    #[test]
    fn test_read_toc_and_images() {
        let mut image = package();
        with_reader(&mut image, |reader, len| {
            let entries = read_toc(reader, len).unwrap();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].name(), Some("BL2"));

            let bl31 = find(&entries, &UUID_BL31).unwrap();
            assert_eq!((bl31.offset, bl31.size), (0x200, 0x80));
            assert!(find(&entries, &UUID_BL33).is_none());

            let mut buf = [0u8; 0x100];
            assert_eq!(read_image(reader, bl31, &mut buf), Ok(0x80));
            assert!(buf[..0x80].iter().all(|&b| b == 0x31));

            let mut small = [0u8; 0x10];
            assert_eq!(read_image(reader, bl31, &mut small), Err(Error::BufferTooSmall));
        });
    }

    #[test]
    fn test_bad_header() {
        let mut image = package();
        image[0] = 0;
        with_reader(&mut image, |reader, len| {
            assert_eq!(read_toc(reader, len), Err(Error::InvalidImage));
        });
    }

    #[test]
    fn test_entry_outside_package() {
        let mut image = package();
        let bad = entry(UUID_BL33, 0x2f0, 0x20);
        image[16 + 40..16 + 80].copy_from_slice(bad.as_bytes());
        with_reader(&mut image, |reader, len| {
            assert_eq!(read_toc(reader, len), Err(Error::InvalidImage));
        });
    }

    #[test]
    fn test_truncated_toc() {
        // Header plus half an entry
        let mut image = package();
        image.truncate(16 + 20);
        with_reader(&mut image, |reader, len| {
            assert_eq!(read_toc(reader, len), Err(Error::InvalidImage));
        });
    }
}
