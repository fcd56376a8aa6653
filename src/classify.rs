//! Per-character classification
//!
//! Word characters are letters, digits and underscore. Separators are the
//! fixed delimiter set below; chunk and sub-block cuts only ever land right
//! after a separator. Anything outside the separator set counts as part of a
//! word when looking for a cut point.

/// Characters a chunk or sub-block may end on
pub const SEPARATORS: &[char] = &[
    ' ', '\t', '\n', '\r', '\u{000B}', '\u{000C}', '.', ',', ';', ':', '!', '?', '"', '\'', '(',
    ')', '[', ']', '{', '}', '<', '>', '-', '/', '\\', '|', '&', '*', '#', '@', '%', '+', '=',
    '~', '`', '^', '$',
];

/// Class of a single character for boundary detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    WordChar,
    Separator,
}

/// Classify a character for boundary detection
#[inline]
pub fn classify(c: char) -> CharClass {
    if is_separator(c) {
        CharClass::Separator
    } else {
        CharClass::WordChar
    }
}

#[inline]
pub fn is_separator(c: char) -> bool {
    c.is_ascii() && SEPARATORS.contains(&c)
}

/// Letter, digit or underscore
#[inline]
pub fn is_word_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// True when the text ends exactly on a separator
pub fn ends_on_separator(text: &str) -> bool {
    text.chars().next_back().is_some_and(is_separator)
}
