//! Core processing engine
//!
//! Drives the read, split, transform, join and write loop over one input
//! stream. The loop itself runs on the caller's thread and owns both the
//! reader and the writer; only the transform step of each chunk fans out.

use crate::cancel::CancelToken;
use crate::cli::Args;
use crate::encoding::InputEncoding;
use crate::error::{FilterError, Result};
use crate::output::{create_output_file, OutputSink, DEFAULT_BUFFER_SIZE};
use crate::parallel::ParallelChunkProcessor;
use crate::reader::BlockReader;
use crate::splitter::split;
use crate::stats::{StatsAccumulator, TextStats};
use crate::transform::WordTransformer;

use encoding_rs::Encoding;
use indicatif::ProgressBar;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Characters per chunk read from the input
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

/// Extra characters a chunk may grow by to reach a separator
pub const DEFAULT_MAX_WORD_SIZE: usize = 1024;

/// Processor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Words shorter than this are removed
    pub min_word_length: usize,
    /// Remove characters that are neither word characters nor whitespace
    pub remove_punctuation: bool,
    /// Parallel workers per chunk
    pub worker_count: usize,
    /// Characters per chunk
    pub chunk_size: usize,
    /// Extension limit when a chunk would end mid-word
    pub max_word_size: usize,
    /// Output buffer size in bytes
    pub buffer_size: usize,
    /// Gather line and word statistics
    pub collect_stats: bool,
    pub encoding: InputEncoding,
}

impl ProcessorConfig {
    pub fn new(min_word_length: usize, remove_punctuation: bool) -> Self {
        Self {
            min_word_length,
            remove_punctuation,
            worker_count: num_cpus::get(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_word_size: DEFAULT_MAX_WORD_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            collect_stats: false,
            encoding: InputEncoding::Utf8,
        }
    }

    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        Ok(Self {
            min_word_length: args.min_length,
            remove_punctuation: args.remove_punctuation,
            worker_count: args.worker_count(),
            chunk_size: args.chunk_size,
            max_word_size: args.max_word_size,
            buffer_size: args.parse_buffer_size()?,
            collect_stats: args.stats,
            encoding: InputEncoding::parse(&args.encoding)?,
        })
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.worker_count < 1 {
            return Err(FilterError::invalid("worker count must be at least 1"));
        }
        if self.chunk_size < 1 {
            return Err(FilterError::invalid("chunk size must be at least 1 character"));
        }
        if self.max_word_size < 1 {
            return Err(FilterError::invalid("maximum word size must be at least 1 character"));
        }
        if self.buffer_size < 1 {
            return Err(FilterError::invalid("buffer size must be at least 1 byte"));
        }
        Ok(())
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self::new(0, false)
    }
}

/// What a completed run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Wall-clock time for the whole run
    pub elapsed: Duration,
    /// Raw bytes consumed from the input
    pub bytes_read: u64,
    /// UTF-8 bytes written to the output
    pub bytes_written: u64,
    /// Characters of decoded input
    pub chars: u64,
    pub chunks: u64,
    /// Malformed input was replaced with U+FFFD while decoding
    pub lossy_input: bool,
    /// Present when statistics were requested
    pub stats: Option<TextStats>,
}

/// Main processor
pub struct TextProcessor {
    config: ProcessorConfig,
    transformer: WordTransformer,
    workers: ParallelChunkProcessor,
    cancel: CancelToken,
    progress: ProgressBar,
    last_report: Option<RunReport>,
}

impl TextProcessor {
    /// Validate the configuration and start the worker pool
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        config.validate()?;

        let transformer = WordTransformer::new(config.min_word_length, config.remove_punctuation)
            .with_line_counts(config.collect_stats);
        let workers = ParallelChunkProcessor::new(config.worker_count)?;

        Ok(Self {
            config,
            transformer,
            workers,
            cancel: CancelToken::new(),
            progress: ProgressBar::hidden(),
            last_report: None,
        })
    }

    /// Use an externally owned cancellation token
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report bytes consumed from the input on this progress bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Report of the most recent successful run
    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    /// Filter `input` into `output`
    pub fn process_stream<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<RunReport> {
        let encoding = self.config.encoding.stream_encoding();
        self.run(input, output, encoding)
    }

    /// Filter the file at `input` into `output`, truncating it
    pub fn process_file(&mut self, input: &Path, output: &Path) -> Result<RunReport> {
        check_paths(input, output)?;

        let encoding = self.config.encoding.file_encoding(input)?;
        let source = File::open(input)
            .map_err(|e| FilterError::io(format!("opening input file {:?}", input), e))?;
        let sink = create_output_file(output)?;

        info!("Filtering {:?} into {:?}", input, output);

        self.run(source, sink, encoding).map_err(|e| match e {
            FilterError::Io { context, source } => FilterError::Io {
                context: format!("{} ({:?} -> {:?})", context, input, output),
                source,
            },
            other => other,
        })
    }

    fn run<R: Read, W: Write>(
        &mut self,
        input: R,
        output: W,
        encoding: &'static Encoding,
    ) -> Result<RunReport> {
        let started = Instant::now();
        let mut reader = BlockReader::new(
            input,
            encoding,
            self.config.chunk_size,
            self.config.max_word_size,
        );
        let mut sink = OutputSink::new(output, self.config.buffer_size);
        let mut stats = StatsAccumulator::new();

        info!(
            "Processing with {} workers, chunks of {} chars, min word length {}, punctuation {}",
            self.workers.worker_count(),
            self.config.chunk_size,
            self.config.min_word_length,
            if self.config.remove_punctuation { "removed" } else { "kept" }
        );

        let pumped = self.pump(&mut reader, &mut sink, &mut stats);
        // Chunks already written stay written, even when the run failed
        let flushed = sink.flush();
        pumped?;
        flushed?;

        let report = RunReport {
            elapsed: started.elapsed(),
            bytes_read: reader.bytes_read(),
            bytes_written: sink.bytes_written(),
            chars: reader.chars_emitted(),
            chunks: sink.chunks_written(),
            lossy_input: reader.had_replacements(),
            stats: self.config.collect_stats.then(|| stats.finish()),
        };

        info!(
            "Processed {} chunks ({} bytes in, {} bytes out) in {:?}",
            report.chunks, report.bytes_read, report.bytes_written, report.elapsed
        );

        self.last_report = Some(report.clone());
        Ok(report)
    }

    fn pump<R: Read, W: Write>(
        &self,
        reader: &mut BlockReader<R>,
        sink: &mut OutputSink<W>,
        stats: &mut StatsAccumulator,
    ) -> Result<()> {
        let target = self.workers.worker_count();

        loop {
            if self.cancel.is_cancelled() {
                info!("Cancelled after {} chunks", sink.chunks_written());
                return Err(FilterError::Cancelled);
            }

            let Some(chunk) = reader.next_block()? else {
                return Ok(());
            };

            let sub_blocks = split(&chunk, target);
            let results = self.workers.process_chunk(&sub_blocks, &self.transformer)?;

            for result in &results {
                sink.write(&result.text)?;
                stats.add(&result.tally);
            }
            sink.end_chunk();
            self.progress.set_position(reader.bytes_read());

            debug!(
                "Chunk {}: {} bytes in {} sub-blocks",
                sink.chunks_written(),
                chunk.len(),
                sub_blocks.len()
            );
        }
    }
}

/// Reject empty paths and an output that would overwrite the input
fn check_paths(input: &Path, output: &Path) -> Result<()> {
    if input.to_string_lossy().trim().is_empty() {
        return Err(FilterError::invalid("input file path cannot be empty"));
    }
    if output.to_string_lossy().trim().is_empty() {
        return Err(FilterError::invalid("output file path cannot be empty"));
    }

    if resolve_path(input) == resolve_path(output) {
        return Err(FilterError::invalid(format!(
            "input and output must not be the same file: {:?}",
            input
        )));
    }

    Ok(())
}

/// Canonical form of a path that may not exist yet
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }

    let absolute = || {
        std::env::current_dir()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            fs::canonicalize(parent)
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| absolute())
        }
        _ => absolute(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ends_on_separator;
    use proptest::prelude::*;
    use std::io;
    use tempfile::TempDir;

    const HELLOW: &str = "Hellow, World!";

    fn config(min_word_length: usize, remove_punctuation: bool) -> ProcessorConfig {
        ProcessorConfig {
            worker_count: 1,
            ..ProcessorConfig::new(min_word_length, remove_punctuation)
        }
    }

    fn filter_str(text: &str, config: ProcessorConfig) -> Result<String> {
        let mut processor = TextProcessor::new(config)?;
        let mut out = Vec::new();
        processor.process_stream(text.as_bytes(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn big_input(megabytes: usize) -> String {
        let line = "Hel lo, worl d! a  aa    aaa!? & aaaa aaa?aa\n";
        line.repeat(megabytes * 1024 * 1024 / line.len())
    }

    #[test]
    fn test_short_word_removed_punctuation_kept() {
        assert_eq!(filter_str(HELLOW, config(6, false)).unwrap(), "Hellow, !");
    }

    #[test]
    fn test_short_word_removed_punctuation_stripped() {
        assert_eq!(filter_str(HELLOW, config(6, true)).unwrap(), "Hellow ");
    }

    #[test]
    fn test_every_word_shorter_than_minimum() {
        assert_eq!(filter_str(HELLOW, config(7, false)).unwrap(), ", !");
        assert_eq!(filter_str(HELLOW, config(7, true)).unwrap(), " ");
    }

    #[test]
    fn test_unbroken_word_past_limit_fails() {
        let config = ProcessorConfig {
            chunk_size: 4,
            max_word_size: 8,
            ..config(0, false)
        };
        let err = filter_str("abcdefghijklmnopqrstuvwxyz more", config).unwrap_err();
        assert!(matches!(err, FilterError::WordTooLarge { max_word_size: 8, .. }));
    }

    #[test]
    fn test_failed_run_keeps_written_chunks() {
        let mut processor = TextProcessor::new(ProcessorConfig {
            chunk_size: 4,
            max_word_size: 8,
            ..config(0, false)
        })
        .unwrap();
        let mut out = Vec::new();

        let input = "ok fine abcdefghijklmnopqrstuvwxyz";
        let result = processor.process_stream(input.as_bytes(), &mut out);

        assert!(matches!(result, Err(FilterError::WordTooLarge { .. })));
        assert_eq!(out, b"ok fine ");
        assert!(processor.last_report().is_none());
    }

    #[test]
    fn test_output_identical_across_worker_counts() {
        let input = big_input(4);
        let single = filter_str(&input, config(4, true)).unwrap();
        let parallel = filter_str(
            &input,
            ProcessorConfig {
                worker_count: 8,
                ..config(4, true)
            },
        )
        .unwrap();

        assert_eq!(single.len(), parallel.len());
        assert!(single == parallel);
    }

    #[test]
    #[ignore = "timing depends on the host"]
    fn test_parallel_run_is_not_slower() {
        let input = big_input(64);

        let mut single = TextProcessor::new(config(4, true)).unwrap();
        let one = single.process_stream(input.as_bytes(), io::sink()).unwrap();

        let mut parallel = TextProcessor::new(ProcessorConfig {
            worker_count: 8,
            ..config(4, true)
        })
        .unwrap();
        let eight = parallel.process_stream(input.as_bytes(), io::sink()).unwrap();

        assert!(eight.elapsed <= one.elapsed, "{:?} > {:?}", eight.elapsed, one.elapsed);
    }

    #[test]
    fn test_multi_line_fixture_across_chunks() {
        let line = "a  aa    aaa!? & aaaa aaa?aa\n";
        let input = line.repeat(50);
        let expected = "      !? & aaaa ?\n".repeat(50);

        for (workers, chunk_size) in [(1, 7), (4, 7), (4, 64), (3, 1_000_000)] {
            let config = ProcessorConfig {
                worker_count: workers,
                chunk_size,
                ..config(4, false)
            };
            assert_eq!(filter_str(&input, config).unwrap(), expected);
        }
    }

    #[test]
    fn test_single_long_line() {
        let input = "a  aa    aaa!? & aaaa aaa?aa ".repeat(10_000);
        let expected = "      !? &  ? ".repeat(10_000);

        for workers in [1, 4] {
            let config = ProcessorConfig {
                worker_count: workers,
                chunk_size: 1000,
                ..config(10, false)
            };
            assert_eq!(filter_str(&input, config).unwrap(), expected);
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(filter_str("", config(4, true)).unwrap(), "");
    }

    #[test]
    fn test_invalid_configuration() {
        for bad in [
            ProcessorConfig {
                worker_count: 0,
                ..config(1, false)
            },
            ProcessorConfig {
                chunk_size: 0,
                ..config(1, false)
            },
            ProcessorConfig {
                max_word_size: 0,
                ..config(1, false)
            },
            ProcessorConfig {
                buffer_size: 0,
                ..config(1, false)
            },
        ] {
            assert!(matches!(
                TextProcessor::new(bad),
                Err(FilterError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_statistics() {
        let input = "Hellow, World!\n\n  \nfoo bar\nlast";
        let expected = TextStats {
            total_lines: 5,
            empty_lines: 2,
            total_words: 5,
            filtered_words: 3,
        };

        for (workers, chunk_size) in [(1, 1_000), (3, 5), (8, 2)] {
            let mut processor = TextProcessor::new(ProcessorConfig {
                worker_count: workers,
                chunk_size,
                collect_stats: true,
                ..config(5, false)
            })
            .unwrap();

            let report = processor.process_stream(input.as_bytes(), io::sink()).unwrap();
            assert_eq!(report.stats, Some(expected), "workers {workers}, chunk {chunk_size}");
            assert_eq!(processor.last_report(), Some(&report));
        }
    }

    #[test]
    fn test_report_counters() {
        let mut processor = TextProcessor::new(ProcessorConfig {
            chunk_size: 4,
            ..config(6, false)
        })
        .unwrap();

        let report = processor.process_stream(HELLOW.as_bytes(), io::sink()).unwrap();
        assert_eq!(report.bytes_read, 14);
        assert_eq!(report.bytes_written, "Hellow, !".len() as u64);
        assert_eq!(report.chars, 14);
        assert!(report.chunks >= 2);
        assert!(!report.lossy_input);
        assert!(report.stats.is_none());
    }

    #[test]
    fn test_malformed_input_is_replaced_and_reported() {
        let mut processor = TextProcessor::new(config(0, false)).unwrap();
        let mut out = Vec::new();

        let report = processor
            .process_stream(&b"ab \xFF\xFE\xFD cd"[..], &mut out)
            .unwrap();

        // Each invalid byte becomes a 3-byte replacement character
        assert_eq!(String::from_utf8(out).unwrap(), "ab \u{FFFD}\u{FFFD}\u{FFFD} cd");
        assert_eq!(report.bytes_read, 9);
        assert_eq!(report.bytes_written, 15);
        assert!(report.lossy_input);
    }

    /// Accepts nothing, every write fails
    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_error_is_io_failure() {
        for buffer_size in [4, DEFAULT_BUFFER_SIZE] {
            let mut processor = TextProcessor::new(ProcessorConfig {
                buffer_size,
                chunk_size: 5,
                ..config(0, false)
            })
            .unwrap();

            let err = processor
                .process_stream("aaaa bbbb cccc".as_bytes(), FailingWriter)
                .unwrap_err();

            match err {
                FilterError::Io { context, source } => {
                    assert!(context.contains("output stream"), "{context}");
                    assert_eq!(source.to_string(), "device full");
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(processor.last_report().is_none());
        }
    }

    /// Hands out `piece` bytes per read and cancels the token on its second read
    struct CancellingReader<'a> {
        data: &'a [u8],
        piece: usize,
        reads: usize,
        token: CancelToken,
    }

    impl Read for CancellingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.reads == 2 {
                self.token.cancel();
            }
            let n = self.piece.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_cancel_between_chunks() {
        let token = CancelToken::new();
        let mut processor = TextProcessor::new(ProcessorConfig {
            chunk_size: 4,
            ..config(0, false)
        })
        .unwrap()
        .with_cancel_token(token.clone());

        let input = CancellingReader {
            data: b"aaaa bbbb cccc dddd ",
            piece: 5,
            reads: 0,
            token,
        };
        let mut out = Vec::new();

        let err = processor.process_stream(input, &mut out).unwrap_err();
        assert!(matches!(err, FilterError::Cancelled));
        assert_eq!(out, b"aaaa bbbb ");
    }

    #[test]
    fn test_process_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.txt");
        let output = dir.path().join("output.txt");
        fs::write(&input, "Hellow, World!\nsmall words go away\n").unwrap();
        fs::write(&output, "stale content that must disappear entirely").unwrap();

        let mut processor = TextProcessor::new(ProcessorConfig {
            worker_count: 4,
            ..config(5, true)
        })
        .unwrap();
        processor.process_file(&input, &output).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Hellow World\nsmall words  \n"
        );
    }

    #[test]
    fn test_process_file_rejects_empty_paths() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.txt");
        fs::write(&input, "text").unwrap();

        let mut processor = TextProcessor::new(config(1, false)).unwrap();
        for (i, o) in [(Path::new(""), input.as_path()), (input.as_path(), Path::new("  "))] {
            assert!(matches!(
                processor.process_file(i, o),
                Err(FilterError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_process_file_rejects_same_path() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.txt");
        fs::write(&input, "keep me intact").unwrap();

        let mut processor = TextProcessor::new(config(10, true)).unwrap();
        let same = dir.path().join(".").join("input.txt");
        let err = processor.process_file(&input, &same).unwrap_err();

        assert!(matches!(err, FilterError::InvalidArgument(_)));
        assert_eq!(fs::read_to_string(&input).unwrap(), "keep me intact");
    }

    #[test]
    fn test_process_file_missing_input() {
        let dir = TempDir::new().unwrap();
        let mut processor = TextProcessor::new(config(1, false)).unwrap();

        let err = processor
            .process_file(&dir.path().join("missing.txt"), &dir.path().join("out.txt"))
            .unwrap_err();
        assert!(matches!(err, FilterError::Io { .. }));
    }

    #[test]
    fn test_process_file_with_bom_and_label() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.txt");

        // UTF-16LE with BOM
        let utf16 = dir.path().join("utf16.txt");
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "hi there".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        fs::write(&utf16, bytes).unwrap();

        let mut processor = TextProcessor::new(config(3, false)).unwrap();
        processor.process_file(&utf16, &output).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), " there");

        // windows-1252 by label
        let latin = dir.path().join("latin.txt");
        fs::write(&latin, b"caf\xE9 au lait").unwrap();

        let mut processor = TextProcessor::new(ProcessorConfig {
            encoding: InputEncoding::parse("latin1").unwrap(),
            ..config(4, false)
        })
        .unwrap();
        processor.process_file(&latin, &output).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "café  lait");
    }

    fn text_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_ëä中€ ,.!?;:'\n\t-]{0,300}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_blocks_and_sub_blocks_end_on_separators(
            text in text_strategy(),
            chunk_size in 1usize..48,
            workers in 1usize..9,
        ) {
            let mut reader =
                BlockReader::new(text.as_bytes(), encoding_rs::UTF_8, chunk_size, 1024);
            let mut pieces = Vec::new();
            while let Some(block) = reader.next_block().unwrap() {
                for sub in split(&block, workers) {
                    pieces.push(sub.text.to_string());
                }
            }

            prop_assert_eq!(pieces.concat(), text.clone());
            if let Some((_, init)) = pieces.split_last() {
                for piece in init {
                    prop_assert!(ends_on_separator(piece), "{:?}", piece);
                }
            }
        }

        #[test]
        fn prop_output_independent_of_workers_and_chunks(
            text in text_strategy(),
            min in 0usize..8,
            strip in any::<bool>(),
            chunk_size in 1usize..48,
            workers in 2usize..9,
        ) {
            let reference = WordTransformer::new(min, strip).transform(&text).text;

            let single = filter_str(
                &text,
                ProcessorConfig { chunk_size, ..config(min, strip) },
            )
            .unwrap();
            let parallel = filter_str(
                &text,
                ProcessorConfig { chunk_size, worker_count: workers, ..config(min, strip) },
            )
            .unwrap();

            prop_assert_eq!(&single, &reference);
            prop_assert_eq!(&parallel, &reference);
        }

        #[test]
        fn prop_noop_configuration_is_identity(text in text_strategy(), chunk_size in 1usize..48) {
            let out = filter_str(
                &text,
                ProcessorConfig { chunk_size, worker_count: 3, ..config(0, false) },
            )
            .unwrap();
            prop_assert_eq!(out, text);
        }

        #[test]
        fn prop_output_never_grows(
            text in text_strategy(),
            min in 0usize..8,
            strip in any::<bool>(),
        ) {
            let out = filter_str(
                &text,
                ProcessorConfig { chunk_size: 16, worker_count: 4, ..config(min, strip) },
            )
            .unwrap();
            prop_assert!(out.len() <= text.len());
        }
    }
}
