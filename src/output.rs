//! Output management module
//!
//! Buffered writing of filtered text to the output sink.

use crate::error::{FilterError, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Default buffer size for output writing (64KB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Buffered output sink with byte and chunk counters
pub struct OutputSink<W: Write> {
    writer: BufWriter<W>,
    bytes_written: u64,
    chunks_written: u64,
}

impl<W: Write> OutputSink<W> {
    pub fn new(inner: W, buffer_size: usize) -> Self {
        Self {
            writer: BufWriter::with_capacity(buffer_size.max(1), inner),
            bytes_written: 0,
            chunks_written: 0,
        }
    }

    /// Write one piece of filtered text
    pub fn write(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_all(text.as_bytes())
            .map_err(|e| FilterError::io("writing output stream", e))?;
        self.bytes_written += text.len() as u64;
        Ok(())
    }

    /// Mark the end of one chunk
    pub fn end_chunk(&mut self) {
        self.chunks_written += 1;
    }

    /// Flush the buffer to the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| FilterError::io("flushing output stream", e))
    }

    /// Get bytes written
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn chunks_written(&self) -> u64 {
        self.chunks_written
    }
}

/// Create (or truncate) an output file
pub fn create_output_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| FilterError::io(format!("creating output file {:?}", path), e))
}

/// Generate output filename from input filename
pub fn generate_output_name(input: &Path, suffix: &str) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}.txt", stem, suffix),
    }
}

/// Ensure the directory holding an output file exists
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| FilterError::io(format!("creating directory {:?}", parent), e))?;
        }
    }
    Ok(())
}
