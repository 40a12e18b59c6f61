//! Package extraction
//!
//! An extraction run reads the package index, then starts two workers: the
//! extraction worker writes every bank and sound file, and (when conversion
//! applies) the conversion worker picks up each written `.wem` through a
//! channel. The run returns once both workers have finished.

mod options;
mod scheduler;
mod types;

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use tracing::{info, warn};

use crate::convert::ConversionPipeline;
use crate::error::{Error, Result};
use crate::pck::read_index;

pub use options::{DEFAULT_QUIESCENCE_DELAY, DEFAULT_TOOL_TIMEOUT, ExtractionOptions};
pub use types::{ExtractOutcome, ExtractPhase, ExtractProgress, ExtractionSummary, ProgressCallback};

use scheduler::{ExtractionQueue, ExtractionScheduler};

/// Extract one `.pck` file.
///
/// # Errors
///
/// See [`extract_container_with_progress`].
pub fn extract_container<P: AsRef<Path>>(
    pck_path: P,
    options: &ExtractionOptions,
) -> Result<ExtractOutcome> {
    extract_container_with_progress(pck_path, options, &|_| {})
}

/// Extract one `.pck` file with progress reporting.
///
/// Files that do not start with the AKPK tag are reported as
/// [`ExtractOutcome::NotAContainer`] and leave the output untouched.
/// Conversion failures are collected in the summary's report and do not
/// fail the run.
///
/// # Errors
///
/// Returns an error if the package cannot be read or decoded, the output
/// root is not a directory, or an item cannot be written. Files written
/// before the failure are kept.
pub fn extract_container_with_progress<P: AsRef<Path>>(
    pck_path: P,
    options: &ExtractionOptions,
    progress: ProgressCallback,
) -> Result<ExtractOutcome> {
    let pck_path = pck_path.as_ref();

    progress(&ExtractProgress::with_file(
        ExtractPhase::ReadingIndex,
        0,
        1,
        pck_path.display().to_string(),
    ));

    let Some(index) = read_index(pck_path)? else {
        warn!("Skipping {}: not an AKPK package", pck_path.display());
        return Ok(ExtractOutcome::NotAContainer);
    };

    prepare_output_dir(&options.output_root)?;

    let endianness = index.endianness;
    let tools = options.conversion_tools_for(&index);
    if tools.is_none() && options.convert && options.tools.is_some() {
        info!(
            "{}: {} package uses an unsupported codec, skipping conversion",
            index.base_name,
            endianness.as_str()
        );
    }

    let source = BufReader::new(File::open(pck_path)?);
    let queue = ExtractionQueue::new(index.banks, index.files);
    let (sender, receiver) = match tools {
        Some(_) => {
            let (tx, rx) = mpsc::channel();
            (Some(tx), Some(rx))
        }
        None => (None, None),
    };

    let (extracted, conversion) = thread::scope(|s| {
        let extraction = s.spawn(move || {
            ExtractionScheduler::new(source, &options.output_root, sender).run(queue, progress)
        });

        let conversion = tools.zip(receiver).map(|(tools, receiver)| {
            s.spawn(move || {
                ConversionPipeline::new(
                    tools,
                    options.quiescence_delay,
                    options.tool_timeout,
                    options.max_parallel_decoders,
                )
                .run(receiver, progress)
            })
        });

        let extracted = extraction.join().map_err(|_| Error::WorkerPanicked {
            worker: "extraction",
        });
        let conversion = conversion
            .map(|handle| {
                handle.join().map_err(|_| Error::WorkerPanicked {
                    worker: "conversion",
                })
            })
            .transpose();
        (extracted, conversion)
    });

    let stats = extracted??;
    let conversion = conversion?;

    info!(
        "Extracted {} ({} banks, {} sound files) to {}",
        pck_path.display(),
        stats.banks,
        stats.files,
        options.output_root.display()
    );

    progress(&ExtractProgress::new(ExtractPhase::Complete, 1, 1));

    Ok(ExtractOutcome::Extracted(ExtractionSummary {
        container: pck_path.to_path_buf(),
        endianness,
        banks_extracted: stats.banks,
        files_extracted: stats.files,
        conversion,
    }))
}

/// Create the output root if needed.
///
/// # Errors
///
/// Returns [`Error::InvalidOutputDir`] if the path exists and is not a
/// directory, or [`Error::Io`] if it cannot be created.
pub fn prepare_output_dir(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(Error::InvalidOutputDir {
            path: path.to_path_buf(),
        });
    }
    fs::create_dir_all(path)?;
    Ok(())
}
