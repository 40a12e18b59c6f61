//! Extraction options
//!
//! Controls where a package is extracted to and whether the extracted
//! `.wem` files are passed through the conversion tools.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::convert::ConversionTools;
use crate::pck::PckIndex;

/// Default pause between the last decoder dispatch and the first normalizer run
pub const DEFAULT_QUIESCENCE_DELAY: Duration = Duration::from_secs(1);

/// Default bound on a single external tool invocation
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// Options for extracting a package.
///
/// # Example
///
/// ```no_run
/// use akpack::convert::ConversionTools;
/// use akpack::extract::ExtractionOptions;
///
/// let options = ExtractionOptions::new("out")
///     .with_tools(ConversionTools::discover("."))
///     .with_tool_timeout(std::time::Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Directory that relative output paths are joined onto
    pub output_root: PathBuf,

    /// Run the conversion pipeline after extraction
    /// Default: true (only has an effect when `tools` is set)
    pub convert: bool,

    /// External conversion tools. Conversion is skipped when `None`.
    pub tools: Option<ConversionTools>,

    /// Pause after the last decoder is dispatched before normalization starts
    pub quiescence_delay: Duration,

    /// Bound on each wait for an external tool
    pub tool_timeout: Duration,

    /// Maximum number of decoder processes running at once
    pub max_parallel_decoders: usize,
}

impl ExtractionOptions {
    /// Create options with conversion enabled but no tools configured.
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            convert: true,
            tools: None,
            quiescence_delay: DEFAULT_QUIESCENCE_DELAY,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            max_parallel_decoders: thread::available_parallelism().map_or(4, usize::from),
        }
    }

    /// Set the output root.
    #[must_use]
    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    /// Enable or disable the conversion pipeline.
    #[must_use]
    pub fn with_convert(mut self, convert: bool) -> Self {
        self.convert = convert;
        self
    }

    /// Set the conversion tools, usually from [`ConversionTools::discover`].
    #[must_use]
    pub fn with_tools(mut self, tools: Option<ConversionTools>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the pause between the two conversion stages.
    #[must_use]
    pub fn with_quiescence_delay(mut self, delay: Duration) -> Self {
        self.quiescence_delay = delay;
        self
    }

    /// Set the bound on each external tool wait.
    #[must_use]
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Set how many decoders may run at once (at least 1).
    #[must_use]
    pub fn with_max_parallel_decoders(mut self, count: usize) -> Self {
        self.max_parallel_decoders = count.max(1);
        self
    }

    /// Tools to convert `index` with, or `None` if its files must not be converted.
    #[must_use]
    pub fn conversion_tools_for(&self, index: &PckIndex) -> Option<&ConversionTools> {
        if !self.convert || index.uses_alternate_codec() {
            return None;
        }
        self.tools.as_ref()
    }
}
