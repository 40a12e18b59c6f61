#![allow(non_snake_case)]
//! # AkPack
//!
//! A pure-Rust library for unpacking AKPK (`.pck`) audio packages.
//!
//! A package bundles sound banks and raw `.wem` audio files. Extraction
//! writes every bank as a standalone `.bnk` (its embedded header followed by
//! its HIRC region) and every audio file as a `.wem`, laid out by the
//! package's folder table. Extracted `.wem` files can then be converted to
//! `.ogg` with the external `ww2ogg` and `revorb` tools.
//!
//! ## Quick Start
//!
//! ### Reading a Package Index
//!
//! ```no_run
//! use akpack::pck::read_index;
//!
//! if let Some(index) = read_index("Music.pck")? {
//!     println!("{} banks, {} sound files", index.banks.len(), index.files.len());
//! }
//! # Ok::<(), akpack::Error>(())
//! ```
//!
//! ### Extracting a Package
//!
//! ```no_run
//! use akpack::convert::ConversionTools;
//! use akpack::extract::{ExtractOutcome, ExtractionOptions, extract_container};
//!
//! let options = ExtractionOptions::new("output/")
//!     .with_tools(ConversionTools::discover("."));
//!
//! match extract_container("Music.pck", &options)? {
//!     ExtractOutcome::Extracted(summary) => println!("{} files", summary.files_extracted),
//!     ExtractOutcome::NotAContainer => println!("not a package"),
//! }
//! # Ok::<(), akpack::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `akpack` command-line binary

pub mod batch;
pub mod convert;
pub mod error;
pub mod extract;
pub mod pck;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};

    pub use crate::pck::{
        Endianness, FileOrigin, Folder, FolderTable, PckIndex, SoundBank, SoundFile, format_id,
        read_index,
    };

    pub use crate::extract::{
        ExtractOutcome, ExtractPhase, ExtractProgress, ExtractionOptions, ExtractionSummary,
        extract_container, extract_container_with_progress,
    };

    pub use crate::convert::{ConversionFailure, ConversionReport, ConversionTools};

    pub use crate::batch::{BatchResult, PckDiscovery, batch_extract, find_pck_files};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
