//! Types for AKPK package handling

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// Directory that standalone and embedded `.wem` files are written into
pub const SOUND_FILES_DIR: &str = "SoundFiles";

/// Format an id the way output names use it: `0x` + 8 uppercase hex digits.
#[must_use]
pub fn format_id(id: u32) -> String {
    format!("0x{id:08X}")
}

/// Byte order of a package, fixed once per container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Big-endian packages carry a different audio codec family that the
    /// conversion tools cannot handle.
    #[must_use]
    pub fn uses_alternate_codec(self) -> bool {
        matches!(self, Endianness::Big)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Endianness::Little => "little-endian",
            Endianness::Big => "big-endian",
        }
    }
}

/// Top-level section sizes of a package
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Header {
    pub header_size: u32,
    pub folder_list_size: u32,
    pub bank_table_size: u32,
    pub sound_table_size: u32,
}

/// An entry of the folder table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub id: u32,
    pub name: String,
}

/// Folder id to folder name lookup, immutable once the folder table is read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FolderTable {
    folders: BTreeMap<u32, Folder>,
}

impl FolderTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateFolderId`] if the id is already present.
    pub fn insert(&mut self, folder: Folder) -> Result<()> {
        if let Some(existing) = self.folders.get(&folder.id) {
            return Err(Error::DuplicateFolderId {
                id: folder.id,
                first: existing.name.clone(),
                second: folder.name,
            });
        }
        self.folders.insert(folder.id, folder);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Folder> {
        self.folders.get(&id)
    }

    /// Look up the folder name referenced by a bank or sound file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFolder`] naming `entry_id` if `folder_id` is unknown.
    pub fn resolve(&self, entry_id: u32, folder_id: u32) -> Result<&str> {
        self.folders
            .get(&folder_id)
            .map(|f| f.name.as_str())
            .ok_or(Error::MissingFolder {
                entry_id,
                folder_id,
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Folders in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Folder> {
        self.folders.values()
    }
}

/// A sound bank located inside a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoundBank {
    pub id: u32,
    /// Absolute offset of the bank's embedded header
    pub header_offset: u32,
    /// Size of the embedded header, including its tag and size fields
    pub header_size: u32,
    /// Absolute offset of the HIRC tag
    pub hirc_offset: u32,
    /// Size of the HIRC region, including its tag and size fields
    pub hirc_size: u32,
    /// `{folder}/{container}/SoundBank ({id})`
    pub relative_path: PathBuf,
    pub id_string: String,
    /// Number of `.wem` files listed in the bank's DIDX index
    pub embedded_files: u32,
}

impl SoundBank {
    /// `{root}/{relative_path}/{id}.bnk`
    #[must_use]
    pub fn output_path(&self, root: &Path) -> PathBuf {
        root.join(&self.relative_path)
            .join(format!("{}.bnk", self.id_string))
    }

    /// Length of the extracted `.bnk` file
    #[must_use]
    pub fn output_len(&self) -> u64 {
        u64::from(self.header_size) + u64::from(self.hirc_size)
    }
}

/// Where a sound file was listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileOrigin {
    /// Top-level sound file table
    Standalone,
    /// DIDX index of a sound bank
    Embedded { bank_id: u32 },
}

/// A raw `.wem` audio blob located inside a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoundFile {
    pub id: u32,
    pub file_offset: u32,
    pub file_size: u32,
    /// `{folder}/{container}` for standalone files, the bank's path for embedded ones
    pub relative_path: PathBuf,
    pub id_string: String,
    pub origin: FileOrigin,
}

impl SoundFile {
    /// `{root}/{relative_path}/SoundFiles/{id}.wem`
    #[must_use]
    pub fn output_path(&self, root: &Path) -> PathBuf {
        root.join(&self.relative_path)
            .join(SOUND_FILES_DIR)
            .join(format!("{}.wem", self.id_string))
    }

    #[must_use]
    pub fn is_embedded(&self) -> bool {
        matches!(self.origin, FileOrigin::Embedded { .. })
    }
}

/// Everything the parse phase resolves from one package
#[derive(Debug, Clone, Serialize)]
pub struct PckIndex {
    /// Container file name without extension
    pub base_name: String,
    pub endianness: Endianness,
    pub header: Header,
    pub folders: FolderTable,
    pub banks: Vec<SoundBank>,
    /// Embedded files (in bank order) followed by standalone files
    pub files: Vec<SoundFile>,
}

impl PckIndex {
    #[must_use]
    pub fn uses_alternate_codec(&self) -> bool {
        self.endianness.uses_alternate_codec()
    }

    #[must_use]
    pub fn embedded_file_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_embedded()).count()
    }

    #[must_use]
    pub fn standalone_file_count(&self) -> usize {
        self.files.len() - self.embedded_file_count()
    }
}
