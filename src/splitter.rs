//! Splitting a chunk into separator-aligned sub-blocks

use crate::classify::is_separator;

/// A slice of a chunk handed to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubBlock<'a> {
    /// Position within the chunk
    pub ordinal: usize,
    pub text: &'a str,
}

/// Split `chunk` into at most `target_count` sub-blocks.
///
/// Cut points start from an even share of the chunk's bytes and move forward
/// to just after the next separator, so no word is ever split. When no
/// separator follows, the remainder stays in the current sub-block and fewer
/// sub-blocks are produced. Non-empty input always yields at least one.
pub fn split(chunk: &str, target_count: usize) -> Vec<SubBlock<'_>> {
    if target_count <= 1 || chunk.is_empty() {
        return vec![SubBlock {
            ordinal: 0,
            text: chunk,
        }];
    }

    let len = chunk.len();
    let mut blocks = Vec::with_capacity(target_count);
    let mut start = 0;

    for i in 1..target_count {
        let approx = (len * i / target_count).max(start);
        let Some(cut) = cut_after_separator(chunk, approx) else {
            break;
        };
        blocks.push(SubBlock {
            ordinal: blocks.len(),
            text: &chunk[start..cut],
        });
        start = cut;
        if start == len {
            break;
        }
    }

    if start < len {
        blocks.push(SubBlock {
            ordinal: blocks.len(),
            text: &chunk[start..],
        });
    }

    blocks
}

/// Byte offset just past the first separator at or after `from`
fn cut_after_separator(text: &str, from: usize) -> Option<usize> {
    let mut from = from;
    while !text.is_char_boundary(from) {
        from += 1;
    }

    text[from..]
        .char_indices()
        .find(|&(_, c)| is_separator(c))
        .map(|(i, c)| from + i + c.len_utf8())
}
