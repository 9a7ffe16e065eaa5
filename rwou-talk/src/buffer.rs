//! Cursor over one conversation script.

use std::rc::Rc;

/// Random-access view of a loaded talk script.
///
/// The bytes are reference-counted: cloning yields an independent cursor
/// over the same buffer, which is how data-table reads scan ahead without
/// disturbing the active position.
#[derive(Clone, Debug, Default)]
pub struct ScriptBuffer {
    buf: Rc<Vec<u8>>,
    pos: usize,
    source: u32,
    compressed: bool,
}

impl ScriptBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            buf: Rc::new(bytes),
            pos: 0,
            source: 0,
            compressed: false,
        }
    }

    /// Wraps the bytes of a library item, keeping its provenance around.
    pub fn from_item(bytes: Vec<u8>, source: u32, compressed: bool) -> Self {
        Self {
            buf: Rc::new(bytes),
            pos: 0,
            source,
            compressed,
        }
    }

    /// True once the buffer holds script bytes.
    pub fn loaded(&self) -> bool {
        !self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Library item index this script came from.
    pub fn source(&self) -> u32 {
        self.source
    }

    pub fn was_compressed(&self) -> bool {
        self.compressed
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// True when fewer than `ahead + 1` bytes remain at the cursor.
    pub fn overflow(&self, ahead: usize) -> bool {
        self.pos.saturating_add(ahead) >= self.buf.len()
    }

    /// One byte at the cursor, advancing past it. Zero past the end.
    pub fn read(&mut self) -> u32 {
        match self.buf.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                b as u32
            }
            None => 0,
        }
    }

    /// Two bytes little-endian. Zero if they do not fit, with the cursor
    /// pinned to the end.
    pub fn read2(&mut self) -> u32 {
        if self.pos + 2 > self.buf.len() {
            self.pos = self.buf.len();
            return 0;
        }
        let v = u16::from_le_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        v as u32
    }

    /// Four bytes little-endian, same end-of-buffer rule as [`Self::read2`].
    pub fn read4(&mut self) -> u32 {
        if self.pos + 4 > self.buf.len() {
            self.pos = self.buf.len();
            return 0;
        }
        let v = u32::from_le_bytes([
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ]);
        self.pos += 4;
        v
    }

    /// Byte at `skip` bytes past the cursor without moving it.
    pub fn peek(&self, skip: usize) -> u8 {
        self.buf
            .get(self.pos.saturating_add(skip))
            .copied()
            .unwrap_or(0)
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Moves forward without bounds checking; a cursor past the end just
    /// reports overflow.
    pub fn skip(&mut self, bytes: usize) {
        self.pos = self.pos.saturating_add(bytes);
    }

    pub fn seek(&mut self, offset: usize) {
        self.pos = offset;
    }
}
