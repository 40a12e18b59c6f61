//! Progress and result types for extraction

use std::path::PathBuf;

use crate::convert::ConversionReport;
use crate::pck::Endianness;

/// Progress callback type for extraction and conversion
pub type ProgressCallback<'a> = &'a (dyn Fn(&ExtractProgress) + Sync + Send);

/// Progress information during an extraction run
#[derive(Debug, Clone)]
pub struct ExtractProgress {
    /// Current operation phase
    pub phase: ExtractPhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items, 0 while still unknown
    pub total: usize,
    /// Current file being processed (if applicable)
    pub current_file: Option<String>,
}

impl ExtractProgress {
    /// Create a new progress update
    #[must_use]
    pub fn new(phase: ExtractPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
        }
    }

    /// Create a progress update with a file/item name
    #[must_use]
    pub fn with_file(
        phase: ExtractPhase,
        current: usize,
        total: usize,
        file: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: Some(file.into()),
        }
    }

    /// Get the progress percentage (0.0 - 1.0)
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

/// Phase of an extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractPhase {
    /// Parsing the package tables
    ReadingIndex,
    /// Copying sound banks and sound files out of the package
    WritingFiles,
    /// Running the decoder on extracted files
    Decoding,
    /// Running the normalizer on decoded files
    Normalizing,
    /// Operation complete
    Complete,
}

impl ExtractPhase {
    /// Get a human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadingIndex => "Reading package index",
            Self::WritingFiles => "Writing files",
            Self::Decoding => "Decoding",
            Self::Normalizing => "Normalizing",
            Self::Complete => "Complete",
        }
    }
}

/// What an extraction run did for one package
#[derive(Debug, Clone)]
pub struct ExtractionSummary {
    /// The `.pck` file that was read
    pub container: PathBuf,
    pub endianness: Endianness,
    pub banks_extracted: usize,
    /// Embedded and standalone `.wem` files written
    pub files_extracted: usize,
    /// `None` when conversion was disabled or skipped for this package
    pub conversion: Option<ConversionReport>,
}

impl ExtractionSummary {
    /// Returns true if conversion ran and failed for at least one file
    #[must_use]
    pub fn has_conversion_failures(&self) -> bool {
        self.conversion
            .as_ref()
            .is_some_and(|report| !report.is_complete())
    }
}

/// Outcome of processing one input file
#[derive(Debug, Clone)]
pub enum ExtractOutcome {
    /// The file does not start with the AKPK tag; nothing was written
    NotAContainer,
    Extracted(ExtractionSummary),
}
