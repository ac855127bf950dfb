//! The operations behind each command: optimize, inspect and batch.
//!
//! Every failure is caught here and turned into a report, so callers always
//! get one structured result per file. A failed preview is only a warning.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use ignore::WalkBuilder;
use rayon::prelude::*;

use crate::codec::{self, DecodeError, EncodeError};
use crate::model::{ALGORITHM, InspectReport, Pattern, Report, Status};
use crate::preview::{self, PreviewOptions};
use crate::reduce::{reduce, retained_count};

/// Prefix of generated output files. Batch runs skip files carrying it.
pub const OUTPUT_PREFIX: &str = "optimized_";

/// Errors that stop a file from being processed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("the file '{}' was not found", .0.display())]
    InputNotFound(PathBuf),

    #[error("error reading the stitch file: {0}")]
    Decode(#[from] DecodeError),

    #[error("the pattern contains no stitches to optimize")]
    EmptyPattern,

    #[error("error writing the stitch file: {0}")]
    Encode(#[from] EncodeError),

    #[error("unexpected error during processing: {0}")]
    Unexpected(String),
}

/// How to process each file.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    /// Shortest stitch to keep, in tenths of a millimeter.
    pub min_length: u32,

    /// Render a preview next to each output, or `None` to skip it.
    pub preview: Option<PreviewOptions>,
}

/// Reduce the stitch file at `input` and write the result.
///
/// The output defaults to `optimized_<timestamp>_<name>` next to the input.
pub fn optimize(input: &Path, output: Option<&Path>, settings: &Settings) -> Report {
    log::info!("optimizing {}", input.display());
    match try_optimize(input, output, settings) {
        Ok(report) => {
            log::info!("{}: {}", input.display(), report.message);
            report
        }
        Err(e) => {
            log::error!("{}: {e}", input.display());
            Report::failure(input.to_path_buf(), settings.min_length, e.to_string())
        }
    }
}

fn try_optimize(
    input: &Path,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<Report, PipelineError> {
    require_file(input)?;

    let pattern = codec::read_pattern(input)?;
    if pattern.stream.is_empty() {
        return Err(PipelineError::EmptyPattern);
    }

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_output_path(input)?,
    };

    let reduced = Pattern {
        label: label_for(&output),
        stream: reduce(&pattern.stream, f64::from(settings.min_length)),
    };
    let written = codec::write_pattern(&output, &reduced)?;
    log::debug!("wrote {} bytes to {}", written.size, output.display());

    let mut warnings = Vec::new();
    let png_path = settings.preview.and_then(|options| {
        let png = output.with_extension("png");
        match preview::write_png(&reduced.stream, &png, options) {
            Ok(()) => Some(png),
            Err(e) => {
                log::warn!("could not generate PNG preview for {}: {e}", output.display());
                warnings.push(format!("could not generate PNG preview: {e}"));
                None
            }
        }
    });

    let original_count = pattern.stream.len();
    let new_count = retained_count(&pattern.stream, &reduced.stream);
    let removed = original_count - new_count;

    Ok(Report {
        status: Status::Success,
        input_path: input.to_path_buf(),
        original_count: Some(original_count),
        new_count: Some(new_count),
        reduction_percent: Some(percent(removed, original_count)),
        output_path: Some(output),
        output_sha256: Some(written.sha256),
        png_path,
        algorithm: ALGORITHM.to_string(),
        min_length: settings.min_length,
        warnings,
        message: format!("Reduced by: {removed} stitches"),
    })
}

/// Describe the stitch file at `input` without modifying it.
///
/// When `preview` is set, renders `preview_<name>.png` next to the input.
pub fn inspect(input: &Path, preview: Option<PreviewOptions>) -> InspectReport {
    match try_inspect(input, preview) {
        Ok(report) => report,
        Err(e) => {
            log::error!("{}: {e}", input.display());
            InspectReport::failure(input.to_path_buf(), e.to_string())
        }
    }
}

fn try_inspect(
    input: &Path,
    preview: Option<PreviewOptions>,
) -> Result<InspectReport, PipelineError> {
    let file_size = require_file(input)?;
    let pattern = codec::read_pattern(input)?;
    let stream = &pattern.stream;

    let bounds = stream
        .bounds()
        .map_or_else(|| "No stitches".to_string(), |b| b.describe_mm());

    let mut warnings = Vec::new();
    let png_path = preview.and_then(|options| {
        let png = preview_path(input)?;
        match preview::write_png(stream, &png, options) {
            Ok(()) => Some(png),
            Err(e) => {
                log::warn!("could not generate PNG preview for {}: {e}", input.display());
                warnings.push(format!("could not generate PNG preview: {e}"));
                None
            }
        }
    });

    Ok(InspectReport {
        status: Status::Success,
        file_path: input.to_path_buf(),
        label: Some(pattern.label.clone()).filter(|l| !l.is_empty()),
        stitch_count: Some(stream.len()),
        color_changes: Some(stream.color_changes()),
        file_size: Some(file_size),
        bounds: Some(bounds),
        png_path,
        warnings,
        message: "Preview generated successfully".to_string(),
    })
}

/// Optimize every DST file under `root`, one file per worker.
///
/// Walks with `.gitignore` rules applied and skips earlier outputs.
/// Reports come back in path order.
pub fn batch(root: &Path, settings: &Settings) -> Result<Vec<Report>, PipelineError> {
    if !root.is_dir() {
        return Err(PipelineError::InputNotFound(root.to_path_buf()));
    }

    let files = find_stitch_files(root);
    log::info!("found {} stitch files under {}", files.len(), root.display());

    Ok(files
        .par_iter()
        .map(|path| optimize(path, None, settings))
        .collect())
}

/// DST files under `root`, excluding generated outputs, sorted by path.
pub fn find_stitch_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .sort_by_file_name(std::cmp::Ord::cmp)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        let path = entry.path();
        let is_output = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(OUTPUT_PREFIX));
        if entry.file_type().is_some_and(|ft| ft.is_file()) && codec::is_dst(path) && !is_output
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}

/// Size of the file at `path`, or `InputNotFound` if it is not a readable file.
fn require_file(path: &Path) -> Result<u64, PipelineError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(meta.len()),
        Ok(_) => Err(PipelineError::InputNotFound(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(PipelineError::InputNotFound(path.to_path_buf()))
        }
        Err(e) => Err(PipelineError::Unexpected(format!(
            "cannot access {}: {e}",
            path.display()
        ))),
    }
}

/// `optimized_<YYYYMMDD_HHMMSS>_<name>` in the input's directory.
fn default_output_path(input: &Path) -> Result<PathBuf, PipelineError> {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            PipelineError::Unexpected(format!("no usable file name in {}", input.display()))
        })?;
    let stamp = jiff::Zoned::now().strftime("%Y%m%d_%H%M%S").to_string();
    Ok(input.with_file_name(output_name(name, &stamp)))
}

fn output_name(input_name: &str, stamp: &str) -> String {
    format!("{OUTPUT_PREFIX}{stamp}_{input_name}")
}

/// `preview_<stem>.png` in the input's directory.
fn preview_path(input: &Path) -> Option<PathBuf> {
    let stem = input.file_stem()?.to_string_lossy();
    Some(input.with_file_name(format!("preview_{stem}.png")))
}

/// Header label for an output file: its stem.
fn label_for(output: &Path) -> String {
    output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
