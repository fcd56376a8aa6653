//! Word-boundary-safe block reader
//!
//! Pulls chunks of roughly `chunk_size` characters from a byte stream. A chunk
//! never ends inside a word: when the nominal cut lands mid-word the chunk is
//! extended one character at a time until a separator (included in the chunk)
//! or the end of the stream, reading at most `max_word_size` extra characters.

use crate::classify::{ends_on_separator, is_separator};
use crate::encoding::StreamDecoder;
use crate::error::{FilterError, Result};
use encoding_rs::Encoding;
use std::io::{ErrorKind, Read};

/// Bytes pulled from the underlying stream per read call
pub const READ_BATCH_SIZE: usize = 64 * 1024;

pub struct BlockReader<R: Read> {
    inner: R,
    decoder: StreamDecoder,
    raw: Vec<u8>,
    /// Decoded text not handed out yet
    pending: String,
    pending_chars: usize,
    /// Underlying stream exhausted and decoder flushed
    eof: bool,
    chunk_size: usize,
    max_word_size: usize,
    bytes_read: u64,
    chars_emitted: u64,
}

impl<R: Read> BlockReader<R> {
    pub fn new(
        inner: R,
        encoding: &'static Encoding,
        chunk_size: usize,
        max_word_size: usize,
    ) -> Self {
        Self {
            inner,
            decoder: StreamDecoder::new(encoding),
            raw: vec![0u8; READ_BATCH_SIZE],
            pending: String::new(),
            pending_chars: 0,
            eof: false,
            chunk_size: chunk_size.max(1),
            max_word_size,
            bytes_read: 0,
            chars_emitted: 0,
        }
    }

    /// Next chunk, or `None` at end of stream
    pub fn next_block(&mut self) -> Result<Option<String>> {
        while self.pending_chars < self.chunk_size && !self.eof {
            self.fill()?;
        }

        if self.pending_chars == 0 {
            return Ok(None);
        }

        if self.eof && self.pending_chars <= self.chunk_size {
            let count = self.pending_chars;
            return Ok(Some(self.take(self.pending.len(), count)));
        }

        let mut cut = self.byte_offset_of(self.chunk_size);
        let mut count = self.chunk_size;

        if !ends_on_separator(&self.pending[..cut]) {
            let mut extra = 0;
            loop {
                while cut == self.pending.len() && !self.eof {
                    self.fill()?;
                }

                // End of stream: the remainder is the final chunk
                let Some(c) = self.pending[cut..].chars().next() else {
                    break;
                };

                // The closing separator does not count against the limit
                let closes = is_separator(c);
                if !closes && extra == self.max_word_size {
                    return Err(FilterError::WordTooLarge {
                        max_word_size: self.max_word_size,
                        offset: self.chars_emitted + self.chunk_size as u64,
                    });
                }

                extra += 1;
                cut += c.len_utf8();
                if closes {
                    break;
                }
            }
            count += extra;
        }

        Ok(Some(self.take(cut, count)))
    }

    /// Raw bytes consumed from the underlying stream so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Characters handed out in chunks so far
    pub fn chars_emitted(&self) -> u64 {
        self.chars_emitted
    }

    pub fn had_replacements(&self) -> bool {
        self.decoder.had_replacements()
    }

    /// Read and decode one batch from the stream
    fn fill(&mut self) -> Result<()> {
        let n = loop {
            match self.inner.read(&mut self.raw) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FilterError::io("reading input stream", e)),
            }
        };
        self.bytes_read += n as u64;

        let last = n == 0;
        let start = self.pending.len();
        self.decoder.decode(&self.raw[..n], &mut self.pending, last);
        self.pending_chars += self.pending[start..].chars().count();
        self.eof = last;

        Ok(())
    }

    fn byte_offset_of(&self, char_index: usize) -> usize {
        self.pending
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.pending.len())
    }

    /// Split off the first `cut` bytes (`count` characters) as a chunk
    fn take(&mut self, cut: usize, count: usize) -> String {
        let rest = self.pending.split_off(cut);
        let block = std::mem::replace(&mut self.pending, rest);
        self.pending_chars -= count;
        self.chars_emitted += count as u64;
        block
    }
}
