//! Extraction worker
//!
//! Copies each sound bank and sound file out of the package, and hands every
//! written `.wem` to the conversion worker when one is listening.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use tracing::{debug, warn};

use super::types::{ExtractPhase, ExtractProgress, ProgressCallback};
use crate::error::{Error, Result};
use crate::pck::{SoundBank, SoundFile};

/// A single item of extraction work
#[derive(Debug)]
pub(crate) enum WorkItem {
    Bank(SoundBank),
    File(SoundFile),
}

/// Pending banks and files, FIFO within each list.
///
/// Items are handed out alternately from the two lists while both have work.
#[derive(Debug, Default)]
pub(crate) struct ExtractionQueue {
    banks: VecDeque<SoundBank>,
    files: VecDeque<SoundFile>,
    prefer_file: bool,
}

impl ExtractionQueue {
    pub(crate) fn new(banks: Vec<SoundBank>, files: Vec<SoundFile>) -> Self {
        Self {
            banks: banks.into(),
            files: files.into(),
            prefer_file: false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.banks.len() + self.files.len()
    }

    /// Take the next item; each item is handed out once.
    pub(crate) fn pop(&mut self) -> Option<WorkItem> {
        let item = if self.prefer_file {
            self.pop_file().or_else(|| self.pop_bank())
        } else {
            self.pop_bank().or_else(|| self.pop_file())
        };
        self.prefer_file = !self.prefer_file;
        item
    }

    fn pop_bank(&mut self) -> Option<WorkItem> {
        self.banks.pop_front().map(WorkItem::Bank)
    }

    fn pop_file(&mut self) -> Option<WorkItem> {
        self.files.pop_front().map(WorkItem::File)
    }
}

/// Counts of what the worker wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SchedulerStats {
    pub(crate) banks: usize,
    pub(crate) files: usize,
}

/// Drains an [`ExtractionQueue`] against one package.
pub(crate) struct ExtractionScheduler<'a, R: Read + Seek> {
    source: R,
    output_root: &'a Path,
    /// Dropped when the queue is drained or the worker fails, which closes the channel
    conversion: Option<Sender<PathBuf>>,
}

impl<'a, R: Read + Seek> ExtractionScheduler<'a, R> {
    pub(crate) fn new(source: R, output_root: &'a Path, conversion: Option<Sender<PathBuf>>) -> Self {
        Self {
            source,
            output_root,
            conversion,
        }
    }

    /// Write every queued item.
    ///
    /// # Errors
    ///
    /// Stops at the first item that cannot be written: [`Error::Io`] for
    /// file system failures, [`Error::TruncatedEntry`] when a range runs past
    /// the end of the package.
    pub(crate) fn run(mut self, mut queue: ExtractionQueue, progress: ProgressCallback) -> Result<SchedulerStats> {
        let total = queue.len();
        let mut stats = SchedulerStats::default();

        while let Some(item) = queue.pop() {
            let current = stats.banks + stats.files + 1;
            match item {
                WorkItem::Bank(bank) => {
                    progress(&ExtractProgress::with_file(
                        ExtractPhase::WritingFiles,
                        current,
                        total,
                        format!("{}.bnk", bank.id_string),
                    ));
                    self.write_bank(&bank)?;
                    stats.banks += 1;
                }
                WorkItem::File(file) => {
                    progress(&ExtractProgress::with_file(
                        ExtractPhase::WritingFiles,
                        current,
                        total,
                        format!("{}.wem", file.id_string),
                    ));
                    let path = self.write_sound_file(&file)?;
                    stats.files += 1;
                    self.enqueue_conversion(path);
                }
            }
        }

        Ok(stats)
    }

    fn write_bank(&mut self, bank: &SoundBank) -> Result<()> {
        let path = bank.output_path(self.output_root);
        let ranges = [
            (bank.header_offset, bank.header_size),
            (bank.hirc_offset, bank.hirc_size),
        ];
        self.write_ranges(&path, &bank.id_string, &ranges)?;
        debug!("Wrote {} ({} bytes)", path.display(), bank.output_len());
        Ok(())
    }

    fn write_sound_file(&mut self, file: &SoundFile) -> Result<PathBuf> {
        let path = file.output_path(self.output_root);
        self.write_ranges(&path, &file.id_string, &[(file.file_offset, file.file_size)])?;
        debug!("Wrote {} ({} bytes)", path.display(), file.file_size);
        Ok(path)
    }

    /// Concatenate `ranges` of the package into `path`, replacing any previous file.
    fn write_ranges(&mut self, path: &Path, id: &str, ranges: &[(u32, u32)]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let result = write_concatenated(&mut self.source, path, id, ranges);
        if result.is_err() {
            // Leave no partial output behind
            let _ = fs::remove_file(path);
        }
        result
    }

    fn enqueue_conversion(&mut self, path: PathBuf) {
        if let Some(sender) = &self.conversion
            && sender.send(path).is_err()
        {
            warn!("Conversion worker stopped early, remaining files will not be converted");
            self.conversion = None;
        }
    }
}

fn write_concatenated<R: Read + Seek>(
    source: &mut R,
    path: &Path,
    id: &str,
    ranges: &[(u32, u32)],
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for &(offset, len) in ranges {
        copy_range(source, &mut writer, id, offset, len)?;
    }
    writer.flush()?;
    Ok(())
}

/// Copy `len` bytes starting at `offset` from `source` into `writer`.
///
/// # Errors
///
/// Returns [`Error::TruncatedEntry`] if the source ends before `len` bytes.
pub(crate) fn copy_range<R: Read + Seek, W: Write>(
    source: &mut R,
    writer: &mut W,
    id: &str,
    offset: u32,
    len: u32,
) -> Result<()> {
    source.seek(SeekFrom::Start(u64::from(offset)))?;
    let expected = u64::from(len);
    let actual = io::copy(&mut Read::take(&mut *source, expected), writer)?;

    if actual != expected {
        return Err(Error::TruncatedEntry {
            id: id.to_string(),
            offset,
            expected,
            actual,
        });
    }
    Ok(())
}
