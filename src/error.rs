//! Error types for the filtering engine
//!
//! Every failure aborts the whole run; nothing is retried internally.

use std::io;
use thiserror::Error;

/// Errors produced by the streaming filter
#[derive(Error, Debug)]
pub enum FilterError {
    /// Rejected before any I/O took place
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Read or write failure on the underlying stream or file
    #[error("I/O error while {context}: {source}")]
    Io {
        /// What was being done, including the path when there is one
        context: String,
        #[source]
        source: io::Error,
    },

    /// A run of non-separator characters did not end within the allowed extension
    #[error("word exceeds the maximum size of {max_word_size} characters (starting near character {offset})")]
    WordTooLarge {
        /// Configured extension limit
        max_word_size: usize,
        /// Character offset in the decoded input where the chunk extension started
        offset: u64,
    },

    /// A worker failed while transforming a sub-block
    #[error("worker failed on sub-block {ordinal}: {message}")]
    Worker {
        /// Ordinal of the sub-block within its chunk
        ordinal: usize,
        message: String,
    },

    /// The worker pool could not be started
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// The run was cancelled between chunks
    #[error("processing cancelled")]
    Cancelled,
}

impl FilterError {
    /// Wrap an I/O error with the operation that failed
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        FilterError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        FilterError::InvalidArgument(reason.into())
    }
}

/// Result type for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;
