//! Command-line interface definition for text-filter
//!
//! Provides argument parsing and validation for the text filtering tool.

use crate::output::generate_output_name;
use crate::processor::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_WORD_SIZE};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Path meaning standard input or standard output
pub const STDIO_PATH: &str = "-";

/// Streaming, parallel text filter
///
/// Removes words shorter than a minimum length and optionally strips
/// punctuation. Memory use stays bounded by the chunk size, whatever the
/// size of the input.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "text-filter",
    author = "m0h1nd4",
    version,
    about = "Streaming, parallel filter for short words and punctuation",
    long_about = r#"
╔══════════════════════════════════════════════════════════════════════════════╗
║                            TEXT-FILTER v1.0.0                                ║
║                   Streaming, Parallel Word & Punctuation Filter               ║
╚══════════════════════════════════════════════════════════════════════════════╝

Removes every word shorter than a minimum length and, optionally, every
punctuation character. Input is read in word-aligned chunks and each chunk is
filtered by several workers at once; output order always matches the input.

EXAMPLES:
    # Drop words shorter than 4 characters
    text-filter -i book.txt -m 4

    # Same, and strip punctuation, into a chosen file
    text-filter -i book.txt -o clean.txt -m 4 -p

    # Use 8 workers and print statistics
    text-filter -i corpus.txt -m 3 -t 8 --stats

    # Filter a pipe
    cat book.txt | text-filter -i - -o - -m 5 > out.txt

    # Let the tool guess the input encoding
    text-filter -i legacy.txt -m 4 --encoding auto
"#
)]
pub struct Args {
    /// Input file path ("-" for stdin)
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output file path ("-" for stdout, default: <input>_filtered.<ext>)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Remove words shorter than this many characters
    #[arg(short, long, required = true, value_name = "N")]
    pub min_length: usize,

    /// Remove every character that is neither a word character nor whitespace
    #[arg(short = 'p', long, default_value_t = false)]
    pub remove_punctuation: bool,

    /// Number of worker threads (default: auto-detect)
    #[arg(short = 't', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Characters read per chunk
    #[arg(long, value_name = "CHARS", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Longest run of characters a chunk may be extended by to reach a separator
    #[arg(long, value_name = "CHARS", default_value_t = DEFAULT_MAX_WORD_SIZE)]
    pub max_word_size: usize,

    /// Buffer size for writing output (e.g. "64KB", "8MB")
    #[arg(long, value_name = "SIZE", default_value = "64KB")]
    pub buffer_size: String,

    /// Input encoding: "utf-8", "auto" or any WHATWG label (e.g. "latin1")
    #[arg(long, value_name = "LABEL", default_value = "utf-8")]
    pub encoding: String,

    /// Show line and word statistics
    #[arg(long, default_value_t = false)]
    pub stats: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Verbose mode - detailed logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Parse buffer size string to bytes
    pub fn parse_buffer_size(&self) -> anyhow::Result<usize> {
        parse_size(&self.buffer_size)
    }

    /// Worker threads, defaulting to the number of CPUs
    pub fn worker_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }

    pub fn reads_stdin(&self) -> bool {
        is_stdio(&self.input)
    }

    pub fn writes_stdout(&self) -> bool {
        is_stdio(&self.output_path())
    }

    /// Output path, defaulting to `<stem>_filtered.<ext>` beside the input
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None if self.reads_stdin() => PathBuf::from(STDIO_PATH),
            None => self
                .input
                .with_file_name(generate_output_name(&self.input, "filtered")),
        }
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_PATH
}

/// Parse human-readable size string to bytes
fn parse_size(size_str: &str) -> anyhow::Result<usize> {
    let size_str = size_str.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(num) = size_str.strip_suffix("GB") {
        (num, 1024 * 1024 * 1024)
    } else if let Some(num) = size_str.strip_suffix("MB") {
        (num, 1024 * 1024)
    } else if let Some(num) = size_str.strip_suffix("KB") {
        (num, 1024)
    } else if let Some(num) = size_str.strip_suffix('B') {
        (num, 1)
    } else {
        (size_str.as_str(), 1)
    };

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size format: '{}'", size_str))?;

    Ok(num * multiplier)
}
