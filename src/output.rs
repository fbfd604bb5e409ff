//! CLI output formatting.
//!
//! Every command's report is built by a pure `format_*` function returning
//! lines, and printed by a thin `print_*` wrapper. Tests exercise the
//! formatters directly without capturing stdout.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! photo.png
//!     Format: png
//!     Size: 640x480
//!     Transparent: no
//!     Bytes: 48213
//! ```
//!
//! ## Write
//!
//! ```text
//! Wrote out.webp (webp, 320x240)
//! ```
//!
//! ## Text bounds
//!
//! ```text
//! Text bounds
//!     upper left: 10,4
//!     upper right: 62,4
//!     lower right: 62,16
//!     lower left: 10,16
//! ```
//!
//! ## Batch
//!
//! ```text
//! Converting 3 files
//!     a.png → a.webp (png)
//!     broken.jpg failed
//!         Error: Data is not in any supported image format
//!     trip/b.jpg skipped (exists)
//! Converted 1, skipped 1, failed 1
//! ```

use crate::batch::{BatchEvent, BatchSummary};
use crate::format::{ExportableFormat, ImportableFormat};
use crate::geometry::{Point, Size};
use crate::raster::{Image, TextBounds};
use serde::Serialize;
use std::path::Path;

/// Facts about a decoded file, printed by `info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub path: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Whether any pixel is less than fully opaque.
    pub transparent: bool,
    pub bytes: u64,
}

impl ImageInfo {
    pub fn new(path: &Path, format: ImportableFormat, image: &Image, bytes: u64) -> Self {
        let size = image.size();
        Self {
            path: path.display().to_string(),
            format: format.name().to_string(),
            width: size.width,
            height: size.height,
            transparent: image.raster().pixels().any(|p| p.0[3] < u8::MAX),
            bytes,
        }
    }
}

fn dimensions(size: Size) -> String {
    format!("{}x{}", size.width, size.height)
}

fn point(p: Point) -> String {
    format!("{},{}", p.x, p.y)
}

/// Path relative to `root` when possible, for compact batch lines.
fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Single-file commands
// ============================================================================

pub fn format_info(info: &ImageInfo) -> Vec<String> {
    vec![
        info.path.clone(),
        format!("    Format: {}", info.format),
        format!("    Size: {}x{}", info.width, info.height),
        format!(
            "    Transparent: {}",
            if info.transparent { "yes" } else { "no" }
        ),
        format!("    Bytes: {}", info.bytes),
    ]
}

pub fn print_info(info: &ImageInfo) {
    for line in format_info(info) {
        println!("{}", line);
    }
}

pub fn format_write(path: &Path, format: ExportableFormat, size: Size) -> Vec<String> {
    vec![format!(
        "Wrote {} ({}, {})",
        path.display(),
        format,
        dimensions(size)
    )]
}

pub fn print_write(path: &Path, format: ExportableFormat, size: Size) {
    for line in format_write(path, format, size) {
        println!("{}", line);
    }
}

pub fn format_text_bounds(bounds: &TextBounds) -> Vec<String> {
    vec![
        "Text bounds".to_string(),
        format!("    upper left: {}", point(bounds.upper_left)),
        format!("    upper right: {}", point(bounds.upper_right)),
        format!("    lower right: {}", point(bounds.lower_right)),
        format!("    lower left: {}", point(bounds.lower_left)),
    ]
}

pub fn print_text_bounds(bounds: &TextBounds) {
    for line in format_text_bounds(bounds) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Lines for one batch event. Paths are shown relative to the batch's source
/// and destination roots.
pub fn format_batch_event(event: &BatchEvent, source_root: &Path, dest_root: &Path) -> Vec<String> {
    match event {
        BatchEvent::Started { files } => {
            let noun = if *files == 1 { "file" } else { "files" };
            vec![format!("Converting {} {}", files, noun)]
        }
        BatchEvent::Converted {
            source,
            output,
            detected,
        } => vec![format!(
            "    {} → {} ({})",
            display_relative(source, source_root),
            display_relative(output, dest_root),
            detected
        )],
        BatchEvent::Skipped { source, .. } => vec![format!(
            "    {} skipped (exists)",
            display_relative(source, source_root)
        )],
        BatchEvent::Failed { source, error } => vec![
            format!("    {} failed", display_relative(source, source_root)),
            format!("        Error: {}", error),
        ],
    }
}

pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    vec![format!(
        "Converted {}, skipped {}, failed {}",
        summary.converted, summary.skipped, summary.failed
    )]
}

pub fn print_batch_summary(summary: &BatchSummary) {
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}
