//! The 9-to-12-bit LZW variant used by the WOU data files.
//!
//! A compressed item starts with a 4-byte little-endian uncompressed size,
//! followed by a stream of variable-width codewords packed least significant
//! bit first. Codeword 0x100 resets the dictionary, 0x101 ends the stream.

use byteorder::{ByteOrder, LittleEndian};

/// Resets the dictionary and drops back to 9-bit codewords.
pub const CLEAR_CODE: u16 = 0x100;
/// Terminates the stream.
pub const END_CODE: u16 = 0x101;

const FIRST_FREE: u16 = 0x102;
const MIN_WIDTH: u32 = 9;
const MAX_WIDTH: u32 = 12;

#[derive(thiserror::Error, Debug)]
pub enum LzwError {
    #[error("item too short for a size header: {len} bytes")]
    MissingHeader { len: usize },
    #[error("codeword runs past the end of the stream at bit {bit}")]
    UnexpectedEof { bit: usize },
    #[error("codeword 0x{code:03X} references an unassigned dictionary slot")]
    BadCode { code: u16 },
}

/// Uncompressed size announced by an item's header.
pub fn decompressed_size(src: &[u8]) -> Result<u32, LzwError> {
    if src.len() < 4 {
        return Err(LzwError::MissingHeader { len: src.len() });
    }
    Ok(LittleEndian::read_u32(&src[..4]))
}

/// Decompress one item, size header included.
pub fn decompress(src: &[u8]) -> Result<Vec<u8>, LzwError> {
    let declared = decompressed_size(src)?;
    decompress_stream(&src[4..], declared)
}

/// Decompress a raw codeword stream. `declared` only sizes the output
/// allocation; the stream's end marker decides where output stops.
pub fn decompress_stream(stream: &[u8], declared: u32) -> Result<Vec<u8>, LzwError> {
    let mut out: Vec<u8> = Vec::with_capacity(declared as usize);
    let mut reader = BitReader::new(stream);

    // Dictionary entries are (prefix codeword, appended byte). Literals
    // 0x00..=0xff are implicit, so slot 0 holds codeword 0x102.
    let mut dict: Vec<(u16, u8)> = Vec::new();
    let mut width = MIN_WIDTH;
    let mut prev: Option<u16> = None;

    loop {
        let code = reader.take(width)?;
        if code == CLEAR_CODE {
            dict.clear();
            width = MIN_WIDTH;
            prev = None;
            continue;
        }
        if code == END_CODE {
            break;
        }

        let next_free = FIRST_FREE as usize + dict.len();
        let start = out.len();
        if (code as usize) < next_free {
            expand(&dict, code, &mut out)?;
        } else if code as usize == next_free {
            // The KwKwK case: the codeword being defined right now. Its
            // expansion is the previous string plus that string's first byte.
            let Some(p) = prev else {
                return Err(LzwError::BadCode { code });
            };
            expand(&dict, p, &mut out)?;
            let first = out[start];
            out.push(first);
        } else {
            return Err(LzwError::BadCode { code });
        }

        if let Some(p) = prev {
            dict.push((p, out[start]));
            // Codeword size grows once the next free slot no longer fits.
            if FIRST_FREE as usize + dict.len() == (1usize << width) && width < MAX_WIDTH {
                width += 1;
            }
        }
        prev = Some(code);
    }

    if out.len() as u32 != declared {
        log::warn!(
            "lzw: item declared {} bytes but expanded to {}",
            declared,
            out.len()
        );
    }
    Ok(out)
}

/// Appends the expansion of `code` to `out` by walking the prefix chain.
fn expand(dict: &[(u16, u8)], code: u16, out: &mut Vec<u8>) -> Result<(), LzwError> {
    let start = out.len();
    let mut c = code;
    loop {
        if c < 0x100 {
            out.push(c as u8);
            break;
        }
        let slot = (c - FIRST_FREE) as usize;
        let Some(&(prefix, byte)) = dict.get(slot) else {
            return Err(LzwError::BadCode { code });
        };
        out.push(byte);
        c = prefix;
    }
    // The chain walks last byte first.
    out[start..].reverse();
    Ok(())
}

struct BitReader<'a> {
    src: &'a [u8],
    bit: usize,
}

impl<'a> BitReader<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self { src, bit: 0 }
    }

    /// Next codeword of `width` bits, least significant bit first.
    fn take(&mut self, width: u32) -> Result<u16, LzwError> {
        let end = self.bit + width as usize;
        if end > self.src.len() * 8 {
            return Err(LzwError::UnexpectedEof { bit: self.bit });
        }
        // A codeword spans at most three bytes at 12 bits plus shift.
        let mut window: u32 = 0;
        for (i, &b) in self.src[self.bit / 8..].iter().take(3).enumerate() {
            window |= (b as u32) << (8 * i);
        }
        let code = (window >> (self.bit % 8)) & ((1 << width) - 1);
        self.bit = end;
        Ok(code as u16)
    }
}
