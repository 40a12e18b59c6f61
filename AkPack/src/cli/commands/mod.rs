use clap::Subcommand;
use std::path::PathBuf;

use crate::extract::DEFAULT_TOOL_TIMEOUT;

pub mod extract;
pub mod list;

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a .pck file, or every .pck file under a directory
    Extract {
        /// Source .pck file or directory
        #[arg(short, long)]
        source: PathBuf,

        /// Output directory
        #[arg(short, long)]
        destination: PathBuf,

        /// Directory holding ww2ogg, revorb and the codebook file
        /// (defaults to the current directory)
        #[arg(long)]
        tools_dir: Option<PathBuf>,

        /// Keep extracted .wem files without converting them
        #[arg(long)]
        no_convert: bool,

        /// Seconds to wait for each conversion tool before giving up
        #[arg(long, default_value_t = DEFAULT_TOOL_TIMEOUT.as_secs())]
        tool_timeout: u64,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the contents of a .pck file
    List {
        /// Source .pck file
        #[arg(short, long)]
        source: PathBuf,

        /// Print the index as JSON
        #[arg(long)]
        json: bool,

        /// Only print the number of folders, banks and sound files
        #[arg(short, long)]
        count: bool,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Extract {
                source,
                destination,
                tools_dir,
                no_convert,
                tool_timeout,
                quiet,
            } => extract::execute(
                source,
                destination,
                tools_dir.as_deref(),
                *no_convert,
                *tool_timeout,
                !*quiet,
            ),
            Commands::List {
                source,
                json,
                count,
            } => list::execute(source, *json, *count),
        }
    }
}
