//! Progress display module
//!
//! Styled progress bars, status lines and the end-of-run summary.

use crate::processor::RunReport;
use bytesize::ByteSize;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Print the application banner
pub fn print_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════════════════════╗
║                                                                              ║
║   ████████╗███████╗██╗  ██╗████████╗    ███████╗██╗██╗  ████████╗███████╗   ║
║   ╚══██╔══╝██╔════╝╚██╗██╔╝╚══██╔══╝    ██╔════╝██║██║  ╚══██╔══╝██╔════╝   ║
║      ██║   █████╗   ╚███╔╝    ██║       █████╗  ██║██║     ██║   █████╗     ║
║      ██║   ██╔══╝   ██╔██╗    ██║       ██╔══╝  ██║██║     ██║   ██╔══╝     ║
║      ██║   ███████╗██╔╝ ██╗   ██║       ██║     ██║███████╗██║   ███████╗   ║
║      ╚═╝   ╚══════╝╚═╝  ╚═╝   ╚═╝       ╚═╝     ╚═╝╚══════╝╚═╝   ╚══════╝   ║
║                                                                              ║
║                  Streaming, Parallel Word & Punctuation Filter               ║
║                                                              v1.0.0          ║
╚══════════════════════════════════════════════════════════════════════════════╝
"#;

    eprintln!("{}", banner.green());
}

/// Print a section header
pub fn print_header(text: &str) {
    eprintln!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    eprintln!("  {} {}", "ℹ".cyan(), text);
}

/// Print a success message
pub fn print_success(text: &str) {
    eprintln!("  {} {}", "✔".green(), text.green());
}

/// Print a warning message
pub fn print_warning(text: &str) {
    eprintln!("  {} {}", "⚠".yellow(), text.yellow());
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Create a bytes-based progress bar
pub fn create_bytes_progress_bar(total_bytes: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total_bytes);

    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.green/dim}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    );

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Create a styled spinner for input of unknown size
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();

    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    );

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Print final statistics
pub fn print_summary(report: &RunReport) {
    let secs = report.elapsed.as_secs_f64();
    let throughput = if secs > 0.0 {
        report.bytes_read as f64 / secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("{}", "═".repeat(60).green());
    eprintln!("{}", "                    PROCESSING COMPLETE".green().bold());
    eprintln!("{}", "═".repeat(60).green());
    eprintln!();

    eprintln!("  {} {}", "Data read:      ".green(), ByteSize(report.bytes_read));
    eprintln!("  {} {}", "Data written:   ".green(), ByteSize(report.bytes_written));
    eprintln!("  {} {}", "Characters:     ".green(), format_number(report.chars));
    eprintln!("  {} {}", "Chunks:         ".green(), format_number(report.chunks));
    if report.lossy_input {
        eprintln!("  {} {}", "Decoding:       ".yellow(), "lossy (U+FFFD substituted)".yellow());
    }

    if let Some(stats) = report.stats {
        eprintln!();
        eprintln!("  {} {}", "Total lines:    ".green(), format_number(stats.total_lines));
        eprintln!("  {} {}", "Empty lines:    ".green(), format_number(stats.empty_lines));
        eprintln!("  {} {}", "Total words:    ".green(), format_number(stats.total_words));
        eprintln!("  {} {}", "Filtered words: ".yellow(), format_number(stats.filtered_words));
        eprintln!(
            "  {} {}",
            "Kept words:     ".green().bold(),
            format_number(stats.kept_words()).as_str().green().bold()
        );
    }

    eprintln!();
    eprintln!("  {} {}", "Duration:       ".green(), format_duration(report.elapsed));
    eprintln!("  {} {}/sec", "Speed:          ".green(), ByteSize(throughput as u64));
    eprintln!();
    eprintln!("{}", "═".repeat(60).green());
}

/// Format a number with thousand separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}
