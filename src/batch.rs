//! Directory conversion.
//!
//! Walks a source tree, decodes every file with an importable extension and
//! re-encodes it into a mirrored tree under the destination directory:
//!
//! ```text
//! photos/                        out/
//! ├── a.png           →          ├── a.webp
//! ├── notes.txt       (ignored)  └── trip/
//! └── trip/                          ├── b.webp
//!     ├── b.jpg       →              └── c.webp
//!     └── c.gif       →
//! ```
//!
//! Files are converted in parallel on the global rayon pool. Progress is
//! streamed as [`BatchEvent`]s over an optional channel so the caller can
//! print while work is still running. A file that fails to decode or encode is
//! reported as an event and counted; it never aborts the rest of the run.

use crate::config::ToolConfig;
use crate::format::{ExportableFormat, ImportableFormat};
use crate::raster::{Image, RasterError, import_format_for};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Progress reported while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// Sent once, before any conversion starts.
    Started { files: usize },
    /// A file was decoded and written.
    Converted {
        source: PathBuf,
        output: PathBuf,
        detected: ImportableFormat,
    },
    /// The output already existed and overwriting is off.
    Skipped { source: PathBuf, output: PathBuf },
    /// Decoding or encoding failed.
    Failed { source: PathBuf, error: String },
}

/// Counts of what happened to each file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.converted + self.skipped + self.failed
    }

    fn record(&mut self, event: &BatchEvent) {
        match event {
            BatchEvent::Started { .. } => {}
            BatchEvent::Converted { .. } => self.converted += 1,
            BatchEvent::Skipped { .. } => self.skipped += 1,
            BatchEvent::Failed { .. } => self.failed += 1,
        }
    }
}

/// One file to convert.
#[derive(Debug)]
struct Job {
    source: PathBuf,
    output: PathBuf,
    /// Earlier source that already maps to `output`.
    collides_with: Option<PathBuf>,
}

/// Convert every importable image under `source` into `format`, mirroring
/// the directory layout under `dest`.
///
/// `config.export.allow_overwrite` decides whether existing outputs are
/// replaced or skipped.
pub fn convert_dir(
    source: &Path,
    dest: &Path,
    format: ExportableFormat,
    config: &ToolConfig,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, BatchError> {
    if !source.is_dir() {
        return Err(BatchError::NotADirectory(source.to_path_buf()));
    }
    fs::create_dir_all(dest)?;
    let jobs = collect_jobs(source, dest, format)?;

    emit(&events, BatchEvent::Started { files: jobs.len() });

    let allow_overwrite = config.export.allow_overwrite;
    let outcomes: Vec<BatchEvent> = jobs
        .par_iter()
        .map_with(events, |tx, job| {
            let event = convert_one(job, format, allow_overwrite);
            emit(tx, event.clone());
            event
        })
        .collect();

    let mut summary = BatchSummary::default();
    for event in &outcomes {
        summary.record(event);
    }
    Ok(summary)
}

fn emit(events: &Option<Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        // receiver gone means nobody is listening; keep converting
        tx.send(event).ok();
    }
}

/// Walk `source` in name order and pair each importable file with its output
/// path. Anything under `dest` is left out so converting into a subdirectory
/// of the source does not pick up its own results. `dest` must exist.
///
/// Sources sharing a stem (`a.png`, `a.gif`) map to the same output; the
/// first in walk order keeps it and the rest are marked as collisions.
fn collect_jobs(
    source: &Path,
    dest: &Path,
    format: ExportableFormat,
) -> Result<Vec<Job>, BatchError> {
    // compare canonical paths: `./out` and `out` are the same directory
    let dest_canonical = fs::canonicalize(dest)?;
    let mut jobs = Vec::new();
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    let walker = WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !entry.file_type().is_dir()
                || !fs::canonicalize(entry.path()).is_ok_and(|p| p == dest_canonical)
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if import_format_for(path) == ImportableFormat::Any {
            continue;
        }
        let relative = path.strip_prefix(source).unwrap_or(path);
        let output = dest.join(relative).with_extension(format.extension());
        let collides_with = match claimed.get(&output) {
            Some(first) => Some(first.clone()),
            None => {
                claimed.insert(output.clone(), path.to_path_buf());
                None
            }
        };
        jobs.push(Job {
            source: path.to_path_buf(),
            output,
            collides_with,
        });
    }
    Ok(jobs)
}

fn convert_one(job: &Job, format: ExportableFormat, allow_overwrite: bool) -> BatchEvent {
    if let Some(first) = &job.collides_with {
        return BatchEvent::Failed {
            source: job.source.clone(),
            error: format!(
                "output {} collides with {}",
                job.output.display(),
                first.display()
            ),
        };
    }
    match try_convert(job, format, allow_overwrite) {
        Ok(detected) => BatchEvent::Converted {
            source: job.source.clone(),
            output: job.output.clone(),
            detected,
        },
        Err(RasterError::FileExists(_)) => BatchEvent::Skipped {
            source: job.source.clone(),
            output: job.output.clone(),
        },
        Err(e) => BatchEvent::Failed {
            source: job.source.clone(),
            error: e.to_string(),
        },
    }
}

fn try_convert(
    job: &Job,
    format: ExportableFormat,
    allow_overwrite: bool,
) -> Result<ImportableFormat, RasterError> {
    if !allow_overwrite && job.output.exists() {
        return Err(RasterError::FileExists(job.output.clone()));
    }
    let bytes = fs::read(&job.source)?;
    // extensions lie; let the content decide
    let (detected, raster) = ImportableFormat::Any.import_detected(&bytes)?;
    let mut image = Image::from_raster(raster)?;
    image.set_save_alpha(true);
    if let Some(parent) = job.output.parent() {
        fs::create_dir_all(parent)?;
    }
    image.write_as(&job.output, format, allow_overwrite)?;
    Ok(detected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient, write_fixture};
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn source_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_fixture(tmp.path(), "a.png", &gradient(8, 6));
        fs::create_dir(tmp.path().join("trip")).unwrap();
        write_fixture(&tmp.path().join("trip"), "b.bmp", &gradient(4, 4));
        fs::write(tmp.path().join("notes.txt"), "not an image").unwrap();
        tmp
    }

    // =========================================================================
    // convert_dir
    // =========================================================================

    #[test]
    fn converts_tree_and_mirrors_layout() {
        let src = source_tree();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("converted");

        let summary = convert_dir(
            src.path(),
            &dest,
            ExportableFormat::Png,
            &ToolConfig::default(),
            None,
        )
        .unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                converted: 2,
                skipped: 0,
                failed: 0
            }
        );
        assert!(dest.join("a.png").exists());
        assert!(dest.join("trip/b.png").exists());
        assert!(!dest.join("notes.png").exists());

        let b = Image::open(&dest.join("trip/b.png")).unwrap();
        assert_eq!(b.raster(), &gradient(4, 4));
    }

    #[test]
    fn existing_outputs_are_skipped_unless_overwrite() {
        let src = source_tree();
        let out = TempDir::new().unwrap();
        let config = ToolConfig::default();

        convert_dir(src.path(), out.path(), ExportableFormat::Gif, &config, None).unwrap();
        let second =
            convert_dir(src.path(), out.path(), ExportableFormat::Gif, &config, None).unwrap();
        assert_eq!(second.skipped, 2);
        assert_eq!(second.converted, 0);

        let mut overwrite = ToolConfig::default();
        overwrite.export.allow_overwrite = true;
        let third =
            convert_dir(src.path(), out.path(), ExportableFormat::Gif, &overwrite, None).unwrap();
        assert_eq!(third.converted, 2);
    }

    #[test]
    fn undecodable_file_is_reported_not_fatal() {
        let src = source_tree();
        fs::write(src.path().join("broken.jpg"), b"definitely not a jpeg").unwrap();
        let out = TempDir::new().unwrap();
        let (tx, rx) = mpsc::channel();

        let summary = convert_dir(
            src.path(),
            out.path(),
            ExportableFormat::Png,
            &ToolConfig::default(),
            Some(tx),
        )
        .unwrap();

        assert_eq!(summary.converted, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 3);

        let events: Vec<BatchEvent> = rx.iter().collect();
        assert_eq!(events[0], BatchEvent::Started { files: 3 });
        assert!(events.iter().any(|e| matches!(
            e,
            BatchEvent::Failed { source, .. } if source.ends_with("broken.jpg")
        )));
    }

    #[test]
    fn content_wins_over_extension() {
        let src = TempDir::new().unwrap();
        // PNG bytes behind a .jpg name
        let png = crate::format::Exportable::export(&ExportableFormat::Png, &gradient(3, 3))
            .unwrap();
        fs::write(src.path().join("liar.jpg"), png).unwrap();
        let out = TempDir::new().unwrap();
        let (tx, rx) = mpsc::channel();

        convert_dir(
            src.path(),
            out.path(),
            ExportableFormat::Bmp { compression: false },
            &ToolConfig::default(),
            Some(tx),
        )
        .unwrap();

        let detected = rx.iter().find_map(|e| match e {
            BatchEvent::Converted { detected, .. } => Some(detected),
            _ => None,
        });
        assert_eq!(detected, Some(ImportableFormat::Png));
        assert!(out.path().join("liar.bmp").exists());
    }

    #[test]
    fn dest_inside_source_is_not_walked() {
        let src = source_tree();
        let dest = src.path().join("out");
        let mut config = ToolConfig::default();
        config.export.allow_overwrite = true;

        convert_dir(src.path(), &dest, ExportableFormat::Png, &config, None).unwrap();
        let again = convert_dir(src.path(), &dest, ExportableFormat::Png, &config, None).unwrap();
        assert_eq!(again.total(), 2);
    }

    #[test]
    fn same_stem_sources_collide_instead_of_racing() {
        let src = TempDir::new().unwrap();
        write_fixture(src.path(), "a.png", &gradient(3, 3));
        write_fixture(src.path(), "a.gif", &gradient(7, 5));
        let out = TempDir::new().unwrap();
        let mut config = ToolConfig::default();
        config.export.allow_overwrite = true;
        let (tx, rx) = mpsc::channel();

        let summary = convert_dir(
            src.path(),
            out.path(),
            ExportableFormat::Webp,
            &config,
            Some(tx),
        )
        .unwrap();

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.failed, 1);
        // name order: a.gif claims a.webp first
        let failed = rx.iter().find_map(|e| match e {
            BatchEvent::Failed { source, error } => Some((source, error)),
            _ => None,
        });
        let (source, error) = failed.unwrap();
        assert!(source.ends_with("a.png"));
        assert!(error.contains("collides with"));
        let kept = Image::open(&out.path().join("a.webp")).unwrap();
        assert_eq!(kept.size(), crate::geometry::Size::new(7, 5));
    }

    #[test]
    fn dest_spelled_differently_inside_source_is_not_walked() {
        let src = source_tree();
        // same directory as `src/out`, but not equal as a path
        let dest = src.path().join("trip").join("..").join("out");
        let mut config = ToolConfig::default();
        config.export.allow_overwrite = true;

        convert_dir(src.path(), &dest, ExportableFormat::Png, &config, None).unwrap();
        let again = convert_dir(src.path(), &dest, ExportableFormat::Png, &config, None).unwrap();
        assert_eq!(again.total(), 2);
        assert!(!src.path().join("out/out").exists());
    }

    #[test]
    fn source_must_be_directory() {
        let src = source_tree();
        let result = convert_dir(
            &src.path().join("a.png"),
            src.path(),
            ExportableFormat::Png,
            &ToolConfig::default(),
            None,
        );
        assert!(matches!(result, Err(BatchError::NotADirectory(_))));
    }

    #[test]
    fn empty_directory_converts_nothing() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let summary = convert_dir(
            src.path(),
            out.path(),
            ExportableFormat::Png,
            &ToolConfig::default(),
            None,
        )
        .unwrap();
        assert_eq!(summary.total(), 0);
    }
}
