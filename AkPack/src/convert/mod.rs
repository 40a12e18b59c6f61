//! `.wem` to `.ogg` conversion through external tools
//!
//! Conversion is a two-stage pipeline: `ww2ogg` decodes each extracted
//! `.wem` with a packed codebook, then `revorb` rewrites the resulting
//! `.ogg` in place. Stage 1 runs several decoders at once; stage 2 runs one
//! `revorb` at a time.

mod pipeline;

use std::path::{Path, PathBuf};

use tracing::debug;

pub(crate) use pipeline::ConversionPipeline;

/// Decoder executable name (without platform suffix)
pub const DECODER_NAME: &str = "ww2ogg";

/// Normalization executable name (without platform suffix)
pub const NORMALIZER_NAME: &str = "revorb";

/// Codebook table passed to the decoder with `--pcb`
pub const CODEBOOK_FILE: &str = "packed_codebooks_aoTuV_603.bin";

/// Extension of the stage-1 output
pub const OGG_EXTENSION: &str = "ogg";

/// Locations of the external conversion tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTools {
    /// `ww2ogg` executable
    pub decoder: PathBuf,
    /// `revorb` executable
    pub normalizer: PathBuf,
    /// `packed_codebooks_aoTuV_603.bin`
    pub codebook: PathBuf,
}

impl ConversionTools {
    #[must_use]
    pub fn new(
        decoder: impl Into<PathBuf>,
        normalizer: impl Into<PathBuf>,
        codebook: impl Into<PathBuf>,
    ) -> Self {
        Self {
            decoder: decoder.into(),
            normalizer: normalizer.into(),
            codebook: codebook.into(),
        }
    }

    /// Look for both executables and the codebook in `dir`.
    ///
    /// Returns `None` unless all three are present.
    #[must_use]
    pub fn discover<P: AsRef<Path>>(dir: P) -> Option<Self> {
        let dir = dir.as_ref();
        let tools = Self::new(
            dir.join(executable_name(DECODER_NAME)),
            dir.join(executable_name(NORMALIZER_NAME)),
            dir.join(CODEBOOK_FILE),
        );

        let missing = tools.missing();
        if missing.is_empty() {
            debug!("Conversion tools found in {}", dir.display());
            Some(tools)
        } else {
            for path in &missing {
                debug!("Conversion tool not found: {}", path.display());
            }
            None
        }
    }

    /// Tool paths that do not exist as files
    #[must_use]
    pub fn missing(&self) -> Vec<&Path> {
        [&self.decoder, &self.normalizer, &self.codebook]
            .into_iter()
            .filter(|p| !p.is_file())
            .map(PathBuf::as_path)
            .collect()
    }
}

/// `name` with the platform's executable suffix (`.exe` on Windows)
#[must_use]
pub fn executable_name(name: &str) -> String {
    format!("{name}{}", std::env::consts::EXE_SUFFIX)
}

/// A file the pipeline could not convert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    /// The extracted `.wem` file
    pub path: PathBuf,
    /// What went wrong
    pub message: String,
}

/// Outcome of the conversion pipeline for one container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// `.ogg` files produced by both stages
    pub converted: Vec<PathBuf>,
    /// Files that failed in either stage
    pub failures: Vec<ConversionFailure>,
}

impl ConversionReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if every queued file was converted
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of files that entered the pipeline
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.converted.len() + self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_requires_all_tools() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConversionTools::discover(dir.path()).is_none());

        std::fs::write(dir.path().join(executable_name(DECODER_NAME)), b"").unwrap();
        std::fs::write(dir.path().join(executable_name(NORMALIZER_NAME)), b"").unwrap();
        assert!(ConversionTools::discover(dir.path()).is_none());

        std::fs::write(dir.path().join(CODEBOOK_FILE), b"").unwrap();
        let tools = ConversionTools::discover(dir.path()).unwrap();
        assert_eq!(tools.codebook, dir.path().join(CODEBOOK_FILE));
        assert!(tools.missing().is_empty());
    }

    #[test]
    fn test_missing_lists_absent_tools() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CODEBOOK_FILE), b"").unwrap();

        let tools = ConversionTools::new(
            dir.path().join("nope-decoder"),
            dir.path().join("nope-normalizer"),
            dir.path().join(CODEBOOK_FILE),
        );
        assert_eq!(tools.missing().len(), 2);
    }

    #[test]
    fn test_report_totals() {
        let mut report = ConversionReport::new();
        assert!(report.is_complete());

        report.converted.push(PathBuf::from("a.ogg"));
        report.failures.push(ConversionFailure {
            path: PathBuf::from("b.wem"),
            message: "exit status: 1".into(),
        });
        assert!(!report.is_complete());
        assert_eq!(report.total_files(), 2);
    }
}
