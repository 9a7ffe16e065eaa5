//! rwou-lib
//!
//! Readers for the library archives the WOU-era games ship their data in
//! (`converse.a`, `converse.b` and friends): a leading table of item
//! offsets followed by the items themselves, each one optionally
//! LZW-compressed.

pub mod lib_file;
pub mod lzw;

pub use lib_file::{probe_compression, Compression, LibError, LibFile};
pub use lzw::{decompress, decompressed_size, LzwError};
