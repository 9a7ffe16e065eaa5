//! Library archive reader.
//!
//! A library file opens with a table of 4-byte little-endian item offsets.
//! The first non-zero offset marks the end of the table, so the table size
//! itself decides how many items the archive holds. A zero offset is an
//! empty slot. An item runs from its offset to the next non-zero offset,
//! or to the end of the file.

use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use crate::lzw::{self, LzwError};

/// Per-item encoding of an archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Lzw,
}

#[derive(thiserror::Error, Debug)]
pub enum LibError {
    #[error("failed to read library file: {0}")]
    Io(#[from] std::io::Error),
    #[error("file too short for an offset table: {len} bytes")]
    NoDirectory { len: usize },
    #[error("offset table is malformed: first item at 0x{first:X}")]
    BadDirectory { first: u32 },
    #[error("item {index} offset 0x{offset:X} does not fit the file ({len} bytes)")]
    OffsetOutOfFile { index: usize, offset: u32, len: usize },
    #[error("item {index} starts before the item preceding it ends")]
    Overlap { index: usize },
    #[error("no item {index} in a library of {count}")]
    NoSuchItem { index: usize, count: usize },
    #[error("item {index} is an empty slot")]
    EmptyItem { index: usize },
    #[error(transparent)]
    Lzw(#[from] LzwError),
}

/// Guesses whether an item is LZW-compressed. A compressed item opens with
/// a size header and a 9-bit clear code, which pins its first two bytes.
pub fn probe_compression(item: &[u8]) -> Compression {
    if item.len() >= 6 && LittleEndian::read_u32(&item[..4]) > 0 {
        let first = (item[4] as u16) | (((item[5] & 1) as u16) << 8);
        if first == lzw::CLEAR_CODE {
            return Compression::Lzw;
        }
    }
    Compression::None
}

/// An opened library archive. Items decompress lazily on [`LibFile::load`].
pub struct LibFile {
    bytes: Vec<u8>,
    offsets: Vec<u32>,
    compression: Compression,
}

impl LibFile {
    /// Opens an archive, probing the first populated item for compression.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes_probed(bytes)
    }

    /// Opens an archive with a known item encoding.
    pub fn open_with(path: impl AsRef<Path>, compression: Compression) -> Result<Self, LibError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes, compression)
    }

    pub fn from_bytes(bytes: Vec<u8>, compression: Compression) -> Result<Self, LibError> {
        let offsets = parse_offsets(&bytes)?;
        Ok(Self {
            bytes,
            offsets,
            compression,
        })
    }

    pub fn from_bytes_probed(bytes: Vec<u8>) -> Result<Self, LibError> {
        let mut lib = Self::from_bytes(bytes, Compression::None)?;
        let probed = (0..lib.item_count())
            .find_map(|i| lib.raw(i))
            .map(probe_compression)
            .unwrap_or(Compression::None);
        lib.compression = probed;
        Ok(lib)
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn item_count(&self) -> usize {
        self.offsets.len()
    }

    /// True when the slot holds nothing, or does not exist at all.
    pub fn is_empty_item(&self, index: usize) -> bool {
        self.offsets.get(index).is_none_or(|&off| off == 0)
    }

    /// The stored bytes of an item, compressed or not. None for an empty
    /// or out-of-range slot.
    pub fn raw(&self, index: usize) -> Option<&[u8]> {
        let &off = self.offsets.get(index)?;
        if off == 0 {
            return None;
        }
        let len = self.item_len(index);
        self.bytes.get(off as usize..off as usize + len)
    }

    /// Loads an item, decompressing it when the archive calls for it.
    pub fn load(&self, index: usize) -> Result<Vec<u8>, LibError> {
        if index >= self.offsets.len() {
            return Err(LibError::NoSuchItem {
                index,
                count: self.offsets.len(),
            });
        }
        let Some(raw) = self.raw(index) else {
            return Err(LibError::EmptyItem { index });
        };
        match self.compression {
            Compression::None => Ok(raw.to_vec()),
            Compression::Lzw => Ok(lzw::decompress(raw)?),
        }
    }

    fn item_len(&self, index: usize) -> usize {
        let off = self.offsets[index];
        if off == 0 {
            return 0;
        }
        let end = self.offsets[index + 1..]
            .iter()
            .copied()
            .find(|&o| o != 0)
            .unwrap_or(self.bytes.len() as u32);
        (end - off) as usize
    }
}

fn parse_offsets(bytes: &[u8]) -> Result<Vec<u32>, LibError> {
    if bytes.len() < 4 {
        return Err(LibError::NoDirectory { len: bytes.len() });
    }
    let mut offsets = Vec::new();
    let mut table_end: Option<u32> = None;
    let mut pos = 0usize;
    loop {
        if let Some(end) = table_end {
            if pos >= end as usize {
                break;
            }
        }
        if pos + 4 > bytes.len() {
            // a table of nothing but empty slots runs to the end of the file
            break;
        }
        let off = LittleEndian::read_u32(&bytes[pos..pos + 4]);
        if off != 0 && table_end.is_none() {
            if off % 4 != 0 || (off as usize) < pos + 4 || off as usize > bytes.len() {
                return Err(LibError::BadDirectory { first: off });
            }
            table_end = Some(off);
        }
        offsets.push(off);
        pos += 4;
    }

    let table = table_end.unwrap_or(bytes.len() as u32);
    let mut last = table;
    for (i, &off) in offsets.iter().enumerate() {
        if off == 0 {
            continue;
        }
        if off < table || off as usize > bytes.len() {
            return Err(LibError::OffsetOutOfFile {
                index: i,
                offset: off,
                len: bytes.len(),
            });
        }
        if off < last {
            return Err(LibError::Overlap { index: i });
        }
        last = off;
    }
    Ok(offsets)
}
