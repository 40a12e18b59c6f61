//! Two-stage conversion worker

use std::collections::VecDeque;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{
    ConversionFailure, ConversionReport, ConversionTools, DECODER_NAME, NORMALIZER_NAME,
    OGG_EXTENSION,
};
use crate::error::{Error, Result};
use crate::extract::{ExtractPhase, ExtractProgress, ProgressCallback};

/// How often a running tool is checked for exit
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Trailing stderr bytes kept for a failure message
const STDERR_TAIL: usize = 1024;

/// A spawned tool whose stderr is drained by a helper thread, so a chatty
/// tool never blocks on a full pipe.
struct ToolProcess {
    tool: &'static str,
    child: Child,
    stderr: Option<JoinHandle<String>>,
}

impl ToolProcess {
    fn spawn(command: &mut Command, tool: &'static str, path: &Path) -> Result<Self> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::ToolFailed {
                tool,
                path: path.to_path_buf(),
                message: format!("could not start: {e}"),
            })?;

        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                let start = buf.len().saturating_sub(STDERR_TAIL);
                String::from_utf8_lossy(&buf[start..]).trim().to_string()
            })
        });

        Ok(Self {
            tool,
            child,
            stderr,
        })
    }

    /// Block until the tool exits or `timeout` passes; a timed-out tool is killed.
    fn wait(&mut self, path: &Path, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                if status.success() {
                    return Ok(());
                }
                let stderr = self.collect_stderr();
                return Err(Error::ToolFailed {
                    tool: self.tool,
                    path: path.to_path_buf(),
                    message: if stderr.is_empty() {
                        status.to_string()
                    } else {
                        format!("{status}: {stderr}")
                    },
                });
            }

            if Instant::now() >= deadline {
                let _ = self.child.kill();
                let _ = self.child.wait();
                return Err(Error::ToolTimedOut {
                    tool: self.tool,
                    path: path.to_path_buf(),
                    seconds: timeout.as_secs(),
                });
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default()
    }
}

/// A stage-1 decoder that was dispatched for one file
struct DecodeJob {
    wem_path: PathBuf,
    state: DecodeState,
}

enum DecodeState {
    Running(ToolProcess),
    /// Reaped early to keep the number of live decoders bounded
    Finished(std::result::Result<(), String>),
}

/// Conversion worker for one container
pub(crate) struct ConversionPipeline<'a> {
    tools: &'a ConversionTools,
    quiescence_delay: Duration,
    tool_timeout: Duration,
    max_decoders: usize,
}

impl<'a> ConversionPipeline<'a> {
    pub(crate) fn new(
        tools: &'a ConversionTools,
        quiescence_delay: Duration,
        tool_timeout: Duration,
        max_decoders: usize,
    ) -> Self {
        Self {
            tools,
            quiescence_delay,
            tool_timeout,
            max_decoders: max_decoders.max(1),
        }
    }

    /// Drain `queue` until every producer is gone, then normalize.
    ///
    /// Stage 1 starts a decoder per path as soon as it arrives. Once the
    /// queue closes and the quiescence delay has passed, stage 2 walks the
    /// dispatched paths in order, waits for that path's decoder and runs the
    /// normalizer on its output, one file at a time.
    pub(crate) fn run(&self, queue: Receiver<PathBuf>, progress: ProgressCallback) -> ConversionReport {
        let mut report = ConversionReport::new();
        let mut jobs: Vec<DecodeJob> = Vec::new();
        let mut running: VecDeque<usize> = VecDeque::new();

        for wem_path in queue {
            if running.len() >= self.max_decoders
                && let Some(oldest) = running.pop_front()
            {
                self.reap(&mut jobs[oldest]);
            }

            match self.spawn_decoder(&wem_path) {
                Ok(process) => {
                    debug!("Dispatched {DECODER_NAME} for {}", wem_path.display());
                    running.push_back(jobs.len());
                    jobs.push(DecodeJob {
                        wem_path,
                        state: DecodeState::Running(process),
                    });
                    progress(&ExtractProgress::with_file(
                        ExtractPhase::Decoding,
                        jobs.len(),
                        0,
                        file_name(&jobs[jobs.len() - 1].wem_path),
                    ));
                }
                Err(e) => record_failure(&mut report, wem_path, &e),
            }
        }

        if jobs.is_empty() {
            return report;
        }

        // Keep revorb from starting on a file ww2ogg is still writing
        thread::sleep(self.quiescence_delay);

        let total = jobs.len();
        for (i, job) in jobs.into_iter().enumerate() {
            progress(&ExtractProgress::with_file(
                ExtractPhase::Normalizing,
                i + 1,
                total,
                file_name(&job.wem_path),
            ));

            let wem_path = job.wem_path.clone();
            match self.finish(job) {
                Ok(ogg_path) => {
                    info!("Converted {} to ogg", wem_path.display());
                    report.converted.push(ogg_path);
                }
                Err(e) => record_failure(&mut report, wem_path, &e),
            }
        }

        report
    }

    fn spawn_decoder(&self, wem_path: &Path) -> Result<ToolProcess> {
        ToolProcess::spawn(
            Command::new(&self.tools.decoder)
                .arg("--pcb")
                .arg(&self.tools.codebook)
                .arg(wem_path),
            DECODER_NAME,
            wem_path,
        )
    }

    /// Wait for a decoder ahead of stage 2 and keep only its outcome.
    fn reap(&self, job: &mut DecodeJob) {
        if let DecodeState::Running(process) = &mut job.state {
            let outcome = process
                .wait(&job.wem_path, self.tool_timeout)
                .map_err(|e| e.to_string());
            job.state = DecodeState::Finished(outcome);
        }
    }

    /// Stage 2 for one file.
    fn finish(&self, job: DecodeJob) -> Result<PathBuf> {
        let DecodeJob { wem_path, state } = job;

        match state {
            DecodeState::Running(mut process) => {
                process.wait(&wem_path, self.tool_timeout)?;
            }
            DecodeState::Finished(Ok(())) => {}
            DecodeState::Finished(Err(message)) => {
                return Err(Error::ToolFailed {
                    tool: DECODER_NAME,
                    path: wem_path,
                    message,
                });
            }
        }

        let ogg_path = wem_path.with_extension(OGG_EXTENSION);
        ToolProcess::spawn(
            Command::new(&self.tools.normalizer).arg(&ogg_path),
            NORMALIZER_NAME,
            &ogg_path,
        )?
        .wait(&ogg_path, self.tool_timeout)?;

        Ok(ogg_path)
    }
}

fn record_failure(report: &mut ConversionReport, path: PathBuf, error: &Error) {
    warn!("Conversion failed: {error}");
    report.failures.push(ConversionFailure {
        path,
        message: error.to_string(),
    });
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy().to_string(), |n| n.to_string_lossy().to_string())
}
