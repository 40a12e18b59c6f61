//! Batch package extraction
//!
//! Finds `.pck` files under a directory and extracts them one after another
//! into a shared output root. A package that fails is reported and the batch
//! moves on to the next one.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::Error;
use crate::extract::{
    ExtractOutcome, ExtractPhase, ExtractProgress, ExtractionOptions, ProgressCallback,
    extract_container_with_progress,
};

/// Result of a batch extraction
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Number of packages extracted
    pub success_count: usize,
    /// Number of files skipped because they are not AKPK packages
    pub skipped_count: usize,
    /// Number of packages that failed
    pub fail_count: usize,
    /// Messages for each file processed
    pub results: Vec<String>,
}

impl BatchResult {
    fn record_scan_error(&mut self, error: &Error) {
        warn!("Failed to scan: {error}");
        self.fail_count += 1;
        self.results.push(format!("Failed to scan: {error}"));
    }
}

/// Packages found under a directory, plus the entries that could not be read
#[derive(Debug, Default)]
pub struct PckDiscovery {
    /// Sorted paths of the .pck files found
    pub files: Vec<PathBuf>,
    /// Directory entries the walk could not read
    pub errors: Vec<Error>,
}

impl PckDiscovery {
    /// Whether the walk found neither packages nor errors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.errors.is_empty()
    }
}

impl From<Vec<PathBuf>> for PckDiscovery {
    fn from(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            errors: Vec::new(),
        }
    }
}

/// Find all .pck files in a directory recursively
///
/// # Returns
/// The sorted .pck paths found in the directory tree, and an error for
/// every entry that could not be read (such as a dangling symlink).
pub fn find_pck_files<P: AsRef<Path>>(dir: P) -> PckDiscovery {
    let mut discovery = PckDiscovery::default();

    for entry in WalkDir::new(dir).follow_links(true) {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("pck"))
                {
                    discovery.files.push(path.to_path_buf());
                }
            }
            Err(e) => discovery.errors.push(Error::from(e)),
        }
    }

    discovery.files.sort();
    discovery
}

/// Extract packages sequentially
///
/// Walk errors carried by `discovery` count as failures in the result.
///
/// Conversion (when enabled) runs one normalizer at a time across the whole
/// batch, since each package finishes its conversion before the next starts.
///
/// # Arguments
/// * `discovery` - Packages to extract
/// * `source_base` - Base directory of the source (for display paths)
/// * `options` - Extraction options shared by every package
/// * `progress` - Callback for progress updates, called with the batch
///   position before each package and forwarded to the extraction itself
pub fn batch_extract(
    discovery: &PckDiscovery,
    source_base: &Path,
    options: &ExtractionOptions,
    progress: ProgressCallback,
) -> BatchResult {
    let total = discovery.files.len();
    let mut result = BatchResult::default();

    for error in &discovery.errors {
        result.record_scan_error(error);
    }

    for (i, pck_path) in discovery.files.iter().enumerate() {
        let display_path = pck_path
            .strip_prefix(source_base)
            .unwrap_or(pck_path.as_path())
            .to_string_lossy()
            .to_string();

        progress(&ExtractProgress::with_file(
            ExtractPhase::ReadingIndex,
            i + 1,
            total,
            display_path.clone(),
        ));

        let message = match extract_container_with_progress(pck_path, options, progress) {
            Ok(ExtractOutcome::Extracted(summary)) => {
                result.success_count += 1;
                match &summary.conversion {
                    Some(report) if !report.is_complete() => format!(
                        "Extracted: {display_path} ({} of {} conversions failed)",
                        report.failures.len(),
                        report.total_files()
                    ),
                    _ => format!("Extracted: {display_path}"),
                }
            }
            Ok(ExtractOutcome::NotAContainer) => {
                result.skipped_count += 1;
                format!("Skipped {display_path}: not an AKPK package")
            }
            Err(e) => {
                warn!("Failed to extract {display_path}: {e}");
                result.fail_count += 1;
                format!("Failed {display_path}: {e}")
            }
        };
        result.results.push(message);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_pck_files_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Audio").join("English");
        std::fs::create_dir_all(&nested).unwrap();

        std::fs::write(dir.path().join("b.pck"), b"").unwrap();
        std::fs::write(dir.path().join("a.PCK"), b"").unwrap();
        std::fs::write(nested.join("vo.pck"), b"").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("folder.pck")).unwrap();

        let found = find_pck_files(dir.path());
        assert!(found.errors.is_empty());
        assert_eq!(
            found.files,
            vec![
                dir.path().join("Audio").join("English").join("vo.pck"),
                dir.path().join("a.PCK"),
                dir.path().join("b.pck"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("real.pck"), b"").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.pck"), dir.path().join("link.pck")).unwrap();

        let found = find_pck_files(dir.path());
        assert_eq!(found.files, vec![dir.path().join("real.pck")]);
        assert_eq!(found.errors.len(), 1);
        assert!(matches!(found.errors[0], Error::WalkDirError(_)));

        let out = tempfile::tempdir().unwrap();
        let result = batch_extract(&found, dir.path(), &ExtractionOptions::new(out.path()), &|_| {});

        assert_eq!(result.fail_count, 1);
        assert_eq!(result.skipped_count, 1);
        assert_eq!(result.results.len(), 2);
        assert!(result.results[0].starts_with("Failed to scan"));
        assert!(result.results[0].contains("link.pck"), "{}", result.results[0]);
    }
}
