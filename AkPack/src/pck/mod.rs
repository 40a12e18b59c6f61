//! AKPK (.pck) package format
//!
//! A package starts with a small header of section sizes, followed by a
//! folder table, a sound bank table and a sound file table. All integers are
//! `u32`, stored little-endian unless the sentinel at 0x8 says otherwise.

pub mod cursor;
mod reader;
mod types;

pub use cursor::{BinaryCursor, Detour, EndianCursor, PckByteOrder, open_cursor};
pub use reader::{
    PckReader, decode_offset, read_bank_table, read_folder_table, read_header, read_index,
    read_sound_file_table, resolve_endianness,
};
pub use types::*;

/// AKPK magic bytes
pub const MAGIC: [u8; 4] = *b"AKPK";

/// Value at [`SENTINEL_OFFSET`] when the package is little-endian
pub const LITTLE_ENDIAN_SENTINEL: u32 = 1;

/// Offset of the version field that doubles as the endianness sentinel
pub const SENTINEL_OFFSET: u64 = 0x8;

/// Offset of the first header size field
pub const HEADER_SIZES_OFFSET: u64 = 0x4;

/// Embedded file index section tag
pub const TAG_DIDX: [u8; 4] = *b"DIDX";

/// Embedded file data section tag
pub const TAG_DATA: [u8; 4] = *b"DATA";

/// Bank metadata (object hierarchy) section tag
pub const TAG_HIRC: [u8; 4] = *b"HIRC";

/// Size of a DIDX descriptor: id, relative offset, size
pub const DIDX_ENTRY_SIZE: u32 = 12;

/// Size of a section tag plus its size field
pub const SECTION_HEADER_SIZE: u32 = 8;
