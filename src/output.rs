//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Discovery
//!
//! ```text
//! Found 3 image(s) to process
//! Output directory: shoot/INSTA
//! ```
//!
//! ## Process
//!
//! ```text
//! [1/3] beach.png
//!     → beach.jpg  1350x1013  q100  1.84 MB  landscape
//! [2/3] tall.tif
//!     → tall.jpg  1080x1350  q60  8.31 MB  portrait  (over 8.00 MB limit)
//! [3/3] broken.jpg
//!     Error: Image processing failed: Decode failed: ...
//!
//! Done!
//! Successfully processed: 2
//! Errors: 1
//! Output location: shoot/INSTA
//! ```
//!
//! ## Dry run
//!
//! ```text
//! DRY RUN - No files will be modified
//!   Would process: beach.png → beach.jpg
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::process::{BatchReport, ProcessEvent, ProcessingResult, output_path_for};
use std::path::{Path, PathBuf};

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// File name for display, falling back to the full path.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable byte size with binary units.
///
/// ```text
/// 512 B, 12.5 KB, 1.84 MB
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

// ============================================================================
// Discovery and dry run
// ============================================================================

pub fn format_discovery(count: usize, output_dir: &Path) -> Vec<String> {
    vec![
        format!("Found {count} image(s) to process"),
        format!("Output directory: {}", output_dir.display()),
    ]
}

pub fn print_discovery(count: usize, output_dir: &Path) {
    for line in format_discovery(count, output_dir) {
        println!("{}", line);
    }
}

/// List what a real run would read and write.
pub fn format_dry_run(images: &[PathBuf], output_dir: &Path) -> Vec<String> {
    let mut lines = vec!["DRY RUN - No files will be modified".to_string()];
    for image in images {
        let target = output_path_for(image, output_dir)
            .map(|p| display_name(&p))
            .unwrap_or_else(|| "(no output name)".to_string());
        lines.push(format!(
            "  Would process: {} \u{2192} {}",
            display_name(image),
            target
        ));
    }
    lines
}

pub fn print_dry_run(images: &[PathBuf], output_dir: &Path) {
    for line in format_dry_run(images, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Process events
// ============================================================================

/// One-line description of a written image.
fn result_line(result: &ProcessingResult, ceiling: Option<u64>) -> String {
    let mut line = format!(
        "{}\u{2192} {}  {}x{}  q{}  {}  {}",
        indent(1),
        display_name(&result.output),
        result.dimensions.width,
        result.dimensions.height,
        result.quality,
        format_bytes(result.file_size),
        result.orientation,
    );
    if !result.within_limit {
        match ceiling {
            Some(c) => line.push_str(&format!("  (over {} limit)", format_bytes(c))),
            None => line.push_str("  (over size limit)"),
        }
    }
    line
}

/// Format a single progress event as display lines.
///
/// `ceiling` is only used to annotate over-limit results.
pub fn format_process_event(event: &ProcessEvent, ceiling: Option<u64>) -> Vec<String> {
    match event {
        ProcessEvent::Started {
            index,
            total,
            source,
        } => vec![format!("[{index}/{total}] {}", display_name(source))],
        ProcessEvent::Processed { result, .. } => vec![result_line(result, ceiling)],
        ProcessEvent::Failed { message, .. } => {
            vec![format!("{}Error: {}", indent(1), message)]
        }
    }
}

// ============================================================================
// Summary
// ============================================================================

pub fn format_summary(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "Done!".to_string(),
        format!("Successfully processed: {}", report.success_count()),
    ];
    if report.error_count() > 0 {
        lines.push(format!("Errors: {}", report.error_count()));
        for failure in &report.failures {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                display_name(&failure.source),
                failure.message
            ));
        }
    }
    let over = report.over_limit().count();
    if over > 0 {
        lines.push(format!("Over size limit: {over}"));
    }
    lines.push(format!("Output location: {}", report.output_dir.display()));
    lines
}

pub fn print_summary(report: &BatchReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}
