//! Text Filter - streaming, parallel removal of short words and punctuation
//!
//! Main entry point for the command-line application.

use anyhow::Context;
use clap::Parser;
use std::fs;
use std::io;
use std::process;

use text_filter::cli::Args;
use text_filter::output::{create_output_file, ensure_parent_dir};
use text_filter::processor::{ProcessorConfig, TextProcessor};
use text_filter::progress::{
    create_bytes_progress_bar, create_spinner, print_banner, print_error, print_header,
    print_info, print_success, print_summary, print_warning,
};

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging
    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Run the application
    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        // Print chain of errors
        for cause in e.chain().skip(1) {
            print_error(&format!("  Caused by: {}", cause));
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let output = args.output_path();
    let quiet = args.quiet || args.writes_stdout();

    // Print banner unless quiet mode
    if !quiet {
        print_banner();
    }

    validate_args(&args)?;

    let mut config = ProcessorConfig::from_args(&args)?;
    if !args.reads_stdin() && args.writes_stdout() {
        // Streamed from a file, so detection has to happen here
        config.encoding = config.encoding.resolve_for_file(&args.input)?;
    }

    if !quiet && args.verbose {
        print_config(&args, &config);
    }

    let progress = if quiet {
        indicatif::ProgressBar::hidden()
    } else if args.reads_stdin() {
        create_spinner("Filtering...")
    } else {
        let total = fs::metadata(&args.input).map(|m| m.len()).unwrap_or(0);
        create_bytes_progress_bar(total, "Filtering...")
    };

    let mut processor = TextProcessor::new(config)?.with_progress(progress.clone());

    let report = match (args.reads_stdin(), args.writes_stdout()) {
        (false, false) => {
            ensure_parent_dir(&output)?;
            processor
                .process_file(&args.input, &output)
                .with_context(|| format!("Failed to filter {:?}", args.input))?
        }
        (true, true) => processor
            .process_stream(io::stdin().lock(), io::stdout().lock())
            .context("Failed to filter stdin")?,
        (true, false) => {
            ensure_parent_dir(&output)?;
            let sink = create_output_file(&output)?;
            processor
                .process_stream(io::stdin().lock(), sink)
                .context("Failed to filter stdin")?
        }
        (false, true) => {
            let source = fs::File::open(&args.input)
                .with_context(|| format!("Failed to open {:?}", args.input))?;
            processor
                .process_stream(source, io::stdout().lock())
                .with_context(|| format!("Failed to filter {:?}", args.input))?
        }
    };

    progress.finish_and_clear();

    if !quiet {
        print_success(&format!("Output written to: {:?}", output));
        if args.stats || args.verbose {
            print_summary(&report);
        } else {
            print_info(&format!("Completed in {:?}", report.elapsed));
        }
    }

    Ok(())
}

/// Validate command-line arguments
fn validate_args(args: &Args) -> anyhow::Result<()> {
    if !args.reads_stdin() && !args.input.is_file() {
        anyhow::bail!("Input file does not exist: {:?}", args.input);
    }

    if args.threads == Some(0) {
        anyhow::bail!("Number of threads must be at least 1");
    }

    if args.reads_stdin() && args.encoding.eq_ignore_ascii_case("auto") {
        print_warning("Encoding detection needs a file; reading stdin as UTF-8");
    }

    Ok(())
}

/// Print configuration summary
fn print_config(args: &Args, config: &ProcessorConfig) {
    print_header("Configuration");

    print_info(&format!("Input:          {:?}", args.input));
    print_info(&format!("Output:         {:?}", args.output_path()));
    print_info(&format!("Min length:     {}", config.min_word_length));
    print_info(&format!(
        "Punctuation:    {}",
        if config.remove_punctuation { "removed" } else { "kept" }
    ));
    print_info(&format!("Workers:        {}", config.worker_count));
    print_info(&format!("Chunk size:     {} chars", config.chunk_size));
    print_info(&format!("Max word size:  {} chars", config.max_word_size));
    print_info(&format!("Buffer size:    {} KB", config.buffer_size / 1024));
    print_info(&format!("Encoding:       {}", args.encoding));
}
