//! Input encoding selection and incremental decoding
//!
//! Input is decoded to UTF-8 as it streams in. A byte order mark overrides
//! the configured encoding and is removed, malformed sequences become U+FFFD.

use crate::error::{FilterError, Result};
use chardetng::EncodingDetector;
use encoding_rs::{CoderResult, Decoder, Encoding};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How input bytes are turned into text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputEncoding {
    /// UTF-8, unless a BOM says otherwise
    #[default]
    Utf8,
    /// Guess from a sample of the input file (UTF-8 for plain streams)
    Detect,
    /// A specific encoding, unless a BOM says otherwise
    Label(&'static Encoding),
}

impl InputEncoding {
    /// Parse `utf-8`, `auto` or any WHATWG encoding label
    pub fn parse(label: &str) -> Result<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("auto") {
            return Ok(Self::Detect);
        }

        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) if encoding == encoding_rs::UTF_8 => Ok(Self::Utf8),
            Some(encoding) => Ok(Self::Label(encoding)),
            None => Err(FilterError::invalid(format!(
                "unknown encoding label '{}'",
                label
            ))),
        }
    }

    /// Encoding to use for a plain stream
    pub fn stream_encoding(&self) -> &'static Encoding {
        match self {
            Self::Utf8 | Self::Detect => encoding_rs::UTF_8,
            Self::Label(encoding) => encoding,
        }
    }

    /// Encoding to use for a file, sampling it when detection was requested
    pub fn file_encoding(&self, path: &Path) -> Result<&'static Encoding> {
        match self {
            Self::Detect => {
                let info = detect_encoding(path)?;
                log::info!(
                    "Detected encoding {} for {:?} (confidence {:.1})",
                    info.name,
                    path,
                    info.confidence
                );
                Ok(info.encoding)
            }
            _ => Ok(self.stream_encoding()),
        }
    }

    /// Settle detection against a file that will be read as a plain stream
    pub fn resolve_for_file(&self, path: &Path) -> Result<Self> {
        match self {
            Self::Detect => Ok(Self::Label(self.file_encoding(path)?)),
            other => Ok(*other),
        }
    }
}

/// Result of encoding detection
#[derive(Debug, Clone)]
pub struct EncodingInfo {
    /// Detected encoding name
    pub name: &'static str,
    /// Confidence level (0.0 - 1.0)
    pub confidence: f32,
    /// The encoding_rs Encoding reference
    pub encoding: &'static Encoding,
}

impl Default for EncodingInfo {
    fn default() -> Self {
        Self {
            name: "UTF-8",
            confidence: 1.0,
            encoding: encoding_rs::UTF_8,
        }
    }
}

/// Detect the encoding of a file by sampling its content
pub fn detect_encoding(path: &Path) -> Result<EncodingInfo> {
    let context = || format!("sampling {:?}", path);
    let file = File::open(path).map_err(|e| FilterError::io(context(), e))?;

    // First 64KB is enough for detection
    let mut sample = Vec::with_capacity(64 * 1024);
    file.take(64 * 1024)
        .read_to_end(&mut sample)
        .map_err(|e| FilterError::io(context(), e))?;

    if sample.is_empty() {
        return Ok(EncodingInfo::default());
    }

    if let Some((encoding, _)) = Encoding::for_bom(&sample) {
        return Ok(EncodingInfo {
            name: encoding.name(),
            confidence: 1.0,
            encoding,
        });
    }

    let mut detector = EncodingDetector::new();
    detector.feed(&sample, true);
    let encoding = detector.guess(None, true);

    // Rough confidence based on whether the sample is valid UTF-8
    let confidence = if encoding == encoding_rs::UTF_8 {
        if std::str::from_utf8(&sample).is_ok() {
            1.0
        } else {
            0.5
        }
    } else {
        0.8
    };

    Ok(EncodingInfo {
        name: encoding.name(),
        confidence,
        encoding,
    })
}

/// Incremental decoder appending UTF-8 text to a buffer
pub struct StreamDecoder {
    decoder: Decoder,
    encoding: &'static Encoding,
    had_replacements: bool,
    finished: bool,
}

impl StreamDecoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            // BOM sniffing on, BOM removed
            decoder: encoding.new_decoder(),
            encoding,
            had_replacements: false,
            finished: false,
        }
    }

    /// Decode `src` onto the end of `dst`. Bytes of a sequence cut off at the
    /// end of `src` are held back until the next call. Pass `last` once the
    /// input is exhausted; the decoder must not be fed afterwards.
    pub fn decode(&mut self, mut src: &[u8], dst: &mut String, last: bool) {
        debug_assert!(!self.finished, "decoder fed after the last batch");

        loop {
            match self.decoder.max_utf8_buffer_length(src.len()) {
                Some(needed) => dst.reserve(needed),
                None => dst.reserve(4096),
            }

            let (result, read, replaced) = self.decoder.decode_to_string(src, dst, last);
            if replaced && !self.had_replacements {
                log::warn!(
                    "Malformed {} input, replacing invalid sequences with U+FFFD",
                    self.encoding.name()
                );
            }
            self.had_replacements |= replaced;
            src = &src[read..];

            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }

        self.finished = last;
    }

    /// True once any malformed input was replaced
    pub fn had_replacements(&self) -> bool {
        self.had_replacements
    }
}
