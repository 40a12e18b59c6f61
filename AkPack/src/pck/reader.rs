//! AKPK package reader
//!
//! Parsing runs in a fixed order: resolve the byte order, read the header,
//! then the folder, sound bank and sound file tables. Banks are followed into
//! their own embedded header to locate the HIRC region and any DIDX index.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, info};

use super::cursor::{BinaryCursor, Detour, open_cursor};
use super::types::{
    Endianness, FileOrigin, Folder, FolderTable, Header, PckIndex, SoundBank, SoundFile,
    format_id,
};
use super::{
    DIDX_ENTRY_SIZE, HEADER_SIZES_OFFSET, LITTLE_ENDIAN_SENTINEL, MAGIC, SECTION_HEADER_SIZE,
    SENTINEL_OFFSET, TAG_DATA, TAG_DIDX, TAG_HIRC,
};
use crate::error::{Error, Result};

/// Read the index of a `.pck` file on disk.
///
/// Returns `Ok(None)` when the file does not start with the AKPK tag.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read or a table points past its end,
/// or a decode error ([`Error::is_decode_error`]) if the tables are inconsistent.
pub fn read_index<P: AsRef<Path>>(pck_path: P) -> Result<Option<PckIndex>> {
    let pck_path = pck_path.as_ref();
    let file = File::open(pck_path)?;
    PckReader::with_path(BufReader::new(file), pck_path).read_index()
}

/// AKPK package reader
pub struct PckReader<R: Read + Seek> {
    reader: R,
    /// Container name used in output paths
    base_name: String,
}

impl<R: Read + Seek> PckReader<R> {
    /// Create a reader; `base_name` is the container name used in relative paths.
    pub fn new(reader: R, base_name: impl Into<String>) -> Self {
        Self {
            reader,
            base_name: base_name.into(),
        }
    }

    /// Create a reader named after the file stem of `path`.
    pub fn with_path(reader: R, path: impl AsRef<Path>) -> Self {
        let base_name = path
            .as_ref()
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self::new(reader, base_name)
    }

    /// Run the whole parse phase.
    ///
    /// Returns `Ok(None)` when the source is not an AKPK package.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on reads or seeks past the end of the source, or a
    /// decode error if the tables are inconsistent.
    pub fn read_index(mut self) -> Result<Option<PckIndex>> {
        let Some(endianness) = resolve_endianness(&mut self.reader)? else {
            debug!("{}: no AKPK tag, skipping", self.base_name);
            return Ok(None);
        };

        let mut cursor = open_cursor(self.reader, endianness);
        cursor.seek_to(HEADER_SIZES_OFFSET)?;

        let header = read_header(&mut *cursor)?;
        let folders = read_folder_table(&mut *cursor, &header)?;

        let mut files = Vec::new();
        let banks = read_bank_table(&mut *cursor, &folders, &self.base_name, &mut files)?;
        files.extend(read_sound_file_table(&mut *cursor, &folders, &self.base_name)?);

        info!(
            "{}: {} ({} folders, {} banks, {} sound files)",
            self.base_name,
            endianness.as_str(),
            folders.len(),
            banks.len(),
            files.len()
        );

        Ok(Some(PckIndex {
            base_name: self.base_name,
            endianness,
            header,
            folders,
            banks,
            files,
        }))
    }
}

/// Check the AKPK tag and decide the byte order from the sentinel at 0x8.
///
/// Returns `Ok(None)` if the tag does not match (including sources shorter
/// than the tag itself).
///
/// # Errors
///
/// Returns [`Error::Io`] if the source cannot be read.
pub fn resolve_endianness<R: Read + Seek>(reader: &mut R) -> Result<Option<Endianness>> {
    reader.seek(SeekFrom::Start(0))?;

    let mut magic = [0u8; 4];
    match reader.read_exact(&mut magic) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    if magic != MAGIC {
        return Ok(None);
    }

    reader.seek(SeekFrom::Start(SENTINEL_OFFSET))?;
    let sentinel = reader.read_u32::<LittleEndian>()?;

    Ok(Some(if sentinel == LITTLE_ENDIAN_SENTINEL {
        Endianness::Little
    } else {
        Endianness::Big
    }))
}

/// Read the four section sizes, skipping the sentinel and the reserved field.
///
/// The cursor must sit right after the magic tag.
///
/// # Errors
///
/// Returns [`Error::Io`] if the header is truncated.
pub fn read_header<C: BinaryCursor + ?Sized>(cursor: &mut C) -> Result<Header> {
    let header_size = cursor.read_u32()?;
    cursor.skip(4)?; // endianness sentinel
    let folder_list_size = cursor.read_u32()?;
    let bank_table_size = cursor.read_u32()?;
    let sound_table_size = cursor.read_u32()?;
    cursor.skip(4)?; // reserved

    Ok(Header {
        header_size,
        folder_list_size,
        bank_table_size,
        sound_table_size,
    })
}

/// Read the folder table starting at the cursor.
///
/// Names are stored out of line at offsets relative to the table start. The
/// cursor ends at `start + folder_list_size` no matter where the last name
/// ended.
///
/// # Errors
///
/// Returns [`Error::Io`] on truncated data, [`Error::DuplicateFolderId`] or
/// [`Error::InvalidFolderName`] on bad entries.
pub fn read_folder_table<C: BinaryCursor + ?Sized>(
    cursor: &mut C,
    header: &Header,
) -> Result<FolderTable> {
    let start = cursor.position()?;
    let count = cursor.read_u32()?;

    let mut folders = FolderTable::new();
    for _ in 0..count {
        let name_offset = start + u64::from(cursor.read_u32()?);
        let id = cursor.read_u32()?;

        let mut detour = Detour::to(cursor, name_offset)?;
        let name = detour.read_name()?;
        detour.restore()?;

        if !is_safe_folder_name(&name) {
            return Err(Error::InvalidFolderName { id, name });
        }

        debug!("Folder {id}: {name}");
        folders.insert(Folder { id, name })?;
    }

    cursor.seek_to(start + u64::from(header.folder_list_size))?;
    Ok(folders)
}

/// Read the sound bank table starting at the cursor.
///
/// Files listed in a bank's DIDX index are appended to `embedded_files`.
///
/// # Errors
///
/// Returns [`Error::Io`] on truncated data, or a decode error for unknown
/// folders, bad offsets or an unexpected bank layout.
pub fn read_bank_table<C: BinaryCursor + ?Sized>(
    cursor: &mut C,
    folders: &FolderTable,
    base_name: &str,
    embedded_files: &mut Vec<SoundFile>,
) -> Result<Vec<SoundBank>> {
    let count = cursor.read_u32()?;

    let mut banks = Vec::new();
    for _ in 0..count {
        let id = cursor.read_u32()?;
        let multiplier = cursor.read_u32()?;
        let raw_offset = cursor.read_u32()?;
        let folder_id = cursor.read_u32()?;

        let header_offset = decode_offset(id, raw_offset, multiplier)?;
        let id_string = format_id(id);
        let relative_path = PathBuf::from(folders.resolve(id, folder_id)?)
            .join(base_name)
            .join(format!("SoundBank ({id_string})"));

        let mut detour = Detour::to(cursor, u64::from(header_offset))?;
        let layout = read_bank_layout(&mut *detour, id, header_offset)?;
        detour.restore()?;

        debug!(
            "Bank {id_string}: header {:#X}+{}, HIRC {:#X}+{}, {} embedded",
            header_offset,
            layout.header_size,
            layout.hirc_offset,
            layout.hirc_size,
            layout.embedded.len()
        );

        let embedded_count = layout.embedded.len() as u32;
        embedded_files.extend(layout.embedded.into_iter().map(|entry| SoundFile {
            id: entry.id,
            file_offset: entry.offset,
            file_size: entry.size,
            relative_path: relative_path.clone(),
            id_string: format_id(entry.id),
            origin: FileOrigin::Embedded { bank_id: id },
        }));

        banks.push(SoundBank {
            id,
            header_offset,
            header_size: layout.header_size,
            hirc_offset: layout.hirc_offset,
            hirc_size: layout.hirc_size,
            relative_path,
            id_string,
            embedded_files: embedded_count,
        });
    }

    Ok(banks)
}

/// Read the standalone sound file table starting at the cursor.
///
/// Field order differs from the bank table: the size comes before the raw offset.
///
/// # Errors
///
/// Returns [`Error::Io`] on truncated data, or a decode error for unknown
/// folders or bad offsets.
pub fn read_sound_file_table<C: BinaryCursor + ?Sized>(
    cursor: &mut C,
    folders: &FolderTable,
    base_name: &str,
) -> Result<Vec<SoundFile>> {
    let count = cursor.read_u32()?;

    let mut files = Vec::new();
    for _ in 0..count {
        let id = cursor.read_u32()?;
        let multiplier = cursor.read_u32()?;
        let file_size = cursor.read_u32()?;
        let raw_offset = cursor.read_u32()?;
        let folder_id = cursor.read_u32()?;

        let file_offset = decode_offset(id, raw_offset, multiplier)?;
        let relative_path = PathBuf::from(folders.resolve(id, folder_id)?).join(base_name);
        let id_string = format_id(id);

        debug!("Sound file {id_string}: {file_offset:#X}+{file_size}");

        files.push(SoundFile {
            id,
            file_offset,
            file_size,
            relative_path,
            id_string,
            origin: FileOrigin::Standalone,
        });
    }

    Ok(files)
}

/// Turn a stored offset into a byte offset: `raw_offset * multiplier`.
///
/// # Errors
///
/// Returns [`Error::ZeroOffsetMultiplier`] for a multiplier of 0 (the result
/// would address the AKPK tag) and [`Error::OffsetOverflow`] if the product
/// does not fit in 32 bits.
pub fn decode_offset(id: u32, raw_offset: u32, multiplier: u32) -> Result<u32> {
    if multiplier == 0 {
        return Err(Error::ZeroOffsetMultiplier { id });
    }
    raw_offset
        .checked_mul(multiplier)
        .ok_or(Error::OffsetOverflow {
            id,
            context: "offset multiplier",
        })
}

/// A DIDX descriptor with its offset made absolute
struct EmbeddedEntry {
    id: u32,
    offset: u32,
    size: u32,
}

/// What the nested walk through a bank yields
struct BankLayout {
    header_size: u32,
    hirc_offset: u32,
    hirc_size: u32,
    embedded: Vec<EmbeddedEntry>,
}

/// Walk a bank starting at its header tag.
///
/// Layout: header tag, header size, header body, then either
/// `DIDX`/`DATA` followed by `HIRC`, or `HIRC` directly.
fn read_bank_layout<C: BinaryCursor + ?Sized>(
    cursor: &mut C,
    bank_id: u32,
    header_offset: u32,
) -> Result<BankLayout> {
    cursor.skip(4)?; // header tag
    let header_size = add(bank_id, cursor.read_u32()?, SECTION_HEADER_SIZE, "bank header size")?;
    let first_section = add(bank_id, header_offset, header_size, "first bank section")?;
    cursor.seek_to(u64::from(first_section))?;

    let mut embedded = Vec::new();
    let mut tag = cursor.read_tag()?;

    if tag == TAG_DIDX {
        let index_size = cursor.read_u32()?;
        let data_start = add(
            bank_id,
            add(bank_id, first_section, index_size, "DIDX size")?,
            2 * SECTION_HEADER_SIZE,
            "DATA start",
        )?;

        for _ in 0..index_size / DIDX_ENTRY_SIZE {
            let id = cursor.read_u32()?;
            let relative_offset = cursor.read_u32()?;
            let size = cursor.read_u32()?;
            embedded.push(EmbeddedEntry {
                id,
                offset: add(id, relative_offset, data_start, "embedded file offset")?,
                size,
            });
        }

        // DATA tag sits right after the declared index, not after the last whole entry
        let data_tag = u64::from(first_section) + u64::from(SECTION_HEADER_SIZE) + u64::from(index_size);
        cursor.seek_to(data_tag)?;
        expect_tag(bank_id, cursor.read_tag()?, TAG_DATA)?;
        let data_size = cursor.read_u32()?;
        cursor.skip(u64::from(data_size))?;
        tag = cursor.read_tag()?;
    }

    expect_tag(bank_id, tag, TAG_HIRC)?;

    let hirc_offset = u32::try_from(cursor.position()? - 4).map_err(|_| Error::OffsetOverflow {
        id: bank_id,
        context: "HIRC offset",
    })?;
    let hirc_size = add(bank_id, cursor.read_u32()?, SECTION_HEADER_SIZE, "HIRC size")?;

    Ok(BankLayout {
        header_size,
        hirc_offset,
        hirc_size,
        embedded,
    })
}

fn add(id: u32, a: u32, b: u32, context: &'static str) -> Result<u32> {
    a.checked_add(b).ok_or(Error::OffsetOverflow { id, context })
}

fn expect_tag(bank_id: u32, found: [u8; 4], expected: [u8; 4]) -> Result<()> {
    if found == expected {
        return Ok(());
    }
    Err(Error::UnexpectedSection {
        bank_id,
        expected: tag_name(expected),
        found: String::from_utf8_lossy(&found).into_owned(),
    })
}

fn tag_name(tag: [u8; 4]) -> &'static str {
    match &tag {
        b"DIDX" => "DIDX",
        b"DATA" => "DATA",
        b"HIRC" => "HIRC",
        _ => "unknown",
    }
}

/// Folder names become a single output directory component.
fn is_safe_folder_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
