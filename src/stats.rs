//! Line and word statistics
//!
//! Workers tally their own sub-block; the orchestrator folds the tallies in
//! ordinal order once the chunk has joined. No counter is shared between
//! threads.
//!
//! Lines can straddle sub-block and chunk boundaries, so a sub-block records
//! only what it can see: the blank state of its first and last line fragment
//! and the number of blank lines fully inside it. Merging two adjacent tallies
//! glues the last fragment of the left one to the first fragment of the right
//! one. The merge is associative but not commutative.

use memchr::memchr_iter;

/// Final counters reported after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    /// Lines seen in the input
    pub total_lines: u64,
    /// Lines that were empty or whitespace-only
    pub empty_lines: u64,
    /// Words seen in the input
    pub total_words: u64,
    /// Words removed for being shorter than the minimum length
    pub filtered_words: u64,
}

impl TextStats {
    /// Words left in the output
    pub fn kept_words(&self) -> u64 {
        self.total_words.saturating_sub(self.filtered_words)
    }
}

/// Line fragments of a span of text, split on `\n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTally {
    newlines: u64,
    /// Blank lines strictly between the first and last fragment
    interior_blank: u64,
    head_blank: bool,
    tail_blank: bool,
    tail_empty: bool,
}

impl Default for LineTally {
    fn default() -> Self {
        Self {
            newlines: 0,
            interior_blank: 0,
            head_blank: true,
            tail_blank: true,
            tail_empty: true,
        }
    }
}

impl LineTally {
    /// Tally the line fragments of `text`
    pub fn of(text: &str) -> Self {
        let mut tally = Self::default();
        let mut start = 0;

        for pos in memchr_iter(b'\n', text.as_bytes()) {
            let blank = is_blank(&text[start..pos]);
            if tally.newlines == 0 {
                tally.head_blank = blank;
            } else if blank {
                tally.interior_blank += 1;
            }
            tally.newlines += 1;
            start = pos + 1;
        }

        let tail = &text[start..];
        tally.tail_blank = is_blank(tail);
        tally.tail_empty = tail.is_empty();
        if tally.newlines == 0 {
            tally.head_blank = tally.tail_blank;
        }

        tally
    }

    /// Append the tally of the text that directly follows this one
    pub fn merge(self, next: LineTally) -> LineTally {
        let joined_blank = self.tail_blank && next.head_blank;
        let joined_interior = self.newlines > 0 && next.newlines > 0 && joined_blank;

        LineTally {
            newlines: self.newlines + next.newlines,
            interior_blank: self.interior_blank + next.interior_blank + joined_interior as u64,
            head_blank: if self.newlines == 0 {
                joined_blank
            } else {
                self.head_blank
            },
            tail_blank: if next.newlines == 0 {
                joined_blank
            } else {
                next.tail_blank
            },
            tail_empty: if next.newlines == 0 {
                self.tail_empty && next.tail_empty
            } else {
                next.tail_empty
            },
        }
    }

    /// Number of lines. A trailing fragment after the last newline only
    /// counts when it is non-empty.
    pub fn lines(&self) -> u64 {
        self.newlines + !self.tail_empty as u64
    }

    /// Number of empty or whitespace-only lines
    pub fn empty_lines(&self) -> u64 {
        let head = (self.newlines > 0 && self.head_blank) as u64;
        let tail = (!self.tail_empty && self.tail_blank) as u64;
        head + self.interior_blank + tail
    }
}

fn is_blank(fragment: &str) -> bool {
    fragment.chars().all(char::is_whitespace)
}

/// Counters gathered by one worker for one sub-block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockTally {
    pub words: u64,
    pub filtered_words: u64,
    /// Only present when line statistics were requested
    pub lines: Option<LineTally>,
}

/// Running totals owned by the orchestrator thread
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsAccumulator {
    words: u64,
    filtered_words: u64,
    lines: LineTally,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the next sub-block's tally. Must be called in input order.
    pub fn add(&mut self, tally: &BlockTally) {
        self.words += tally.words;
        self.filtered_words += tally.filtered_words;
        if let Some(lines) = tally.lines {
            self.lines = self.lines.merge(lines);
        }
    }

    pub fn finish(&self) -> TextStats {
        TextStats {
            total_lines: self.lines.lines(),
            empty_lines: self.lines.empty_lines(),
            total_words: self.words,
            filtered_words: self.filtered_words,
        }
    }
}
