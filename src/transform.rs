//! Word filtering module
//!
//! Removes words shorter than a minimum length and optionally strips
//! punctuation. Pure and stateless, safe to run on any worker.

use crate::classify::is_word_char;
use crate::error::Result;
use crate::stats::{BlockTally, LineTally};

/// Output of transforming one sub-block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformed {
    pub text: String,
    pub tally: BlockTally,
}

/// A transformation applied independently to each sub-block
pub trait BlockTransform: Send + Sync {
    fn apply(&self, text: &str) -> Result<Transformed>;
}

/// Length filter plus optional punctuation removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordTransformer {
    /// Words with fewer characters than this are removed
    pub min_word_length: usize,
    /// Remove every character that is neither a word character nor whitespace
    pub remove_punctuation: bool,
    /// Tally lines as well as words
    pub count_lines: bool,
}

impl WordTransformer {
    pub fn new(min_word_length: usize, remove_punctuation: bool) -> Self {
        Self {
            min_word_length,
            remove_punctuation,
            count_lines: false,
        }
    }

    pub fn with_line_counts(mut self, count_lines: bool) -> Self {
        self.count_lines = count_lines;
        self
    }

    /// Filter `text`.
    ///
    /// Words are judged on their original boundaries. Punctuation is dropped
    /// afterwards and never merges words for the length check, so
    /// `aaa?aa` with a minimum of 3 keeps `aaa` only, even though stripping
    /// `?` would have produced `aaaaa`.
    pub fn transform(&self, text: &str) -> Transformed {
        let mut out = String::with_capacity(text.len());
        let mut tally = BlockTally::default();
        let mut word_start = None;
        let mut word_chars = 0;

        for (i, c) in text.char_indices() {
            if is_word_char(c) {
                if word_start.is_none() {
                    word_start = Some(i);
                    word_chars = 0;
                }
                word_chars += 1;
                continue;
            }

            if let Some(start) = word_start.take() {
                self.emit_word(&text[start..i], word_chars, &mut out, &mut tally);
            }
            if self.keeps_symbol(c) {
                out.push(c);
            }
        }

        if let Some(start) = word_start {
            self.emit_word(&text[start..], word_chars, &mut out, &mut tally);
        }

        if self.count_lines {
            tally.lines = Some(LineTally::of(text));
        }

        Transformed { text: out, tally }
    }

    /// Check if a word passes the length filter
    #[inline]
    pub fn keeps_word(&self, word_chars: usize) -> bool {
        word_chars >= self.min_word_length
    }

    /// Check if a non-word character survives punctuation removal
    #[inline]
    pub fn keeps_symbol(&self, c: char) -> bool {
        !self.remove_punctuation || c.is_whitespace()
    }

    #[inline]
    fn emit_word(&self, word: &str, word_chars: usize, out: &mut String, tally: &mut BlockTally) {
        tally.words += 1;
        if self.keeps_word(word_chars) {
            out.push_str(word);
        } else {
            tally.filtered_words += 1;
        }
    }
}

impl BlockTransform for WordTransformer {
    fn apply(&self, text: &str) -> Result<Transformed> {
        Ok(self.transform(text))
    }
}
