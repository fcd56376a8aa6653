//! # Text Filter
//!
//! Streaming, parallel text filter: removes words shorter than a minimum
//! length and, optionally, strips punctuation.
//!
//! ## Features
//!
//! - **Bounded memory**: input is read in chunks that always end on a separator
//! - **Parallel processing**: each chunk is split into word-aligned sub-blocks
//!   and filtered by a fixed pool of workers
//! - **Deterministic output**: results are joined in input order, so any
//!   worker count produces the same bytes
//! - **Encoding handling**: BOM sniffing, explicit labels or automatic detection
//! - **Statistics**: lines, empty lines, words and filtered words per run
//!
//! ## Usage
//!
//! ```bash
//! # Drop words shorter than 4 characters
//! text-filter -i book.txt -m 4
//!
//! # Also strip punctuation, using 8 workers
//! text-filter -i book.txt -o clean.txt -m 4 -p -t 8
//! ```
//!
//! ## Example
//!
//! ```rust
//! use text_filter::processor::{ProcessorConfig, TextProcessor};
//!
//! let config = ProcessorConfig {
//!     worker_count: 4,
//!     ..ProcessorConfig::new(6, false)
//! };
//!
//! let mut processor = TextProcessor::new(config).unwrap();
//! let mut output = Vec::new();
//! processor.process_stream("Hellow, World!".as_bytes(), &mut output).unwrap();
//!
//! assert_eq!(output, b"Hellow, !");
//! ```

pub mod cancel;
pub mod classify;
pub mod cli;
pub mod encoding;
pub mod error;
pub mod output;
pub mod parallel;
pub mod processor;
pub mod progress;
pub mod reader;
pub mod splitter;
pub mod stats;
pub mod transform;

pub use cancel::CancelToken;
pub use cli::Args;
pub use error::{FilterError, Result};
pub use processor::{ProcessorConfig, RunReport, TextProcessor};
pub use stats::TextStats;
