//! Error types for `AkPack`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `AkPack` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations (including seeks or reads past the end
    /// of a container).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A table entry points at a byte range that the container does not hold.
    #[error("entry {id} is truncated: expected {expected} bytes at offset {offset}, got {actual}")]
    TruncatedEntry {
        /// Formatted id of the bank or sound file.
        id: String,
        /// Absolute offset of the range.
        offset: u32,
        /// Declared length of the range.
        expected: u64,
        /// Bytes actually available.
        actual: u64,
    },

    // ==================== Folder Table Errors ====================
    /// A bank or sound file references a folder id that the folder table
    /// does not contain.
    #[error("entry {entry_id:#010X} references unknown folder id {folder_id}")]
    MissingFolder {
        /// Id of the bank or sound file holding the reference.
        entry_id: u32,
        /// The folder id that was looked up.
        folder_id: u32,
    },

    /// The folder table lists the same folder id twice.
    #[error("duplicate folder id {id} ('{first}' and '{second}')")]
    DuplicateFolderId {
        /// The repeated id.
        id: u32,
        /// Name registered first.
        first: String,
        /// Name found for the repeated entry.
        second: String,
    },

    /// A folder name cannot be used as an output directory component.
    #[error("invalid folder name for id {id}: {name:?}")]
    InvalidFolderName {
        /// The folder id.
        id: u32,
        /// The decoded name.
        name: String,
    },

    // ==================== Offset Decoding Errors ====================
    /// An entry stores an offset multiplier of zero.
    #[error("entry {id:#010X} has an offset multiplier of 0")]
    ZeroOffsetMultiplier {
        /// Id of the bank or sound file.
        id: u32,
    },

    /// Offset or size arithmetic does not fit in 32 bits.
    #[error("offset overflow while decoding {context} of entry {id:#010X}")]
    OffsetOverflow {
        /// Id of the bank or sound file.
        id: u32,
        /// Which computation overflowed.
        context: &'static str,
    },

    // ==================== Sound Bank Errors ====================
    /// A bank section tag did not match the expected layout.
    #[error("sound bank {bank_id:#010X}: expected {expected} section, found {found:?}")]
    UnexpectedSection {
        /// Id of the bank being decoded.
        bank_id: u32,
        /// The tag the layout requires at this position.
        expected: &'static str,
        /// The four bytes actually found.
        found: String,
    },

    // ==================== Extraction Errors ====================
    /// The output path exists and is not a directory.
    #[error("output path is not a directory: {}", path.display())]
    InvalidOutputDir {
        /// The offending path.
        path: PathBuf,
    },

    /// A background worker panicked before finishing.
    #[error("{worker} worker panicked")]
    WorkerPanicked {
        /// Name of the worker.
        worker: &'static str,
    },

    // ==================== Conversion Errors ====================
    /// An external conversion tool exited unsuccessfully or could not start.
    #[error("{tool} failed on {}: {message}", path.display())]
    ToolFailed {
        /// Tool name.
        tool: &'static str,
        /// File the tool was run against.
        path: PathBuf,
        /// Exit status or spawn error.
        message: String,
    },

    /// An external conversion tool did not exit within the configured bound.
    #[error("{tool} timed out after {seconds}s on {}", path.display())]
    ToolTimedOut {
        /// Tool name.
        tool: &'static str,
        /// File the tool was run against.
        path: PathBuf,
        /// Timeout in seconds.
        seconds: u64,
    },

    // ==================== File System Errors ====================
    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),
}

impl Error {
    /// Returns true for errors caused by the container's contents rather than
    /// by the file system.
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Error::MissingFolder { .. }
                | Error::DuplicateFolderId { .. }
                | Error::InvalidFolderName { .. }
                | Error::ZeroOffsetMultiplier { .. }
                | Error::OffsetOverflow { .. }
                | Error::UnexpectedSection { .. }
        )
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

/// A specialized Result type for `AkPack` operations.
pub type Result<T> = std::result::Result<T, Error>;
