//! Output formatting for CLI display.

use crate::model::{InspectReport, Report};

/// Summary of one optimization.
pub(super) fn format_reduction(report: &Report) -> String {
    if !report.is_success() {
        return format!("Error: {}", report.message);
    }

    let original = report.original_count.unwrap_or(0);
    let optimized = report.new_count.unwrap_or(0);
    let mut lines = vec![
        "Optimization complete.".to_string(),
        format!("Original stitches: {}", format_number(original)),
        format!("Optimized stitches: {}", format_number(optimized)),
        format!(
            "Reduction: {:.1}%",
            report.reduction_percent.unwrap_or(0.0)
        ),
    ];
    if let Some(path) = &report.output_path {
        lines.push(format!("Saved to: {}", path.display()));
    }
    if let Some(path) = &report.png_path {
        lines.push(format!("Preview: {}", path.display()));
    }
    for warning in &report.warnings {
        lines.push(format!("Warning: {warning}"));
    }
    lines.join("\n")
}

/// Summary of one inspection.
pub(super) fn format_inspection(report: &InspectReport) -> String {
    if !report.is_success() {
        return format!("Error: {}", report.message);
    }

    let mut lines = Vec::new();
    if let Some(label) = &report.label {
        lines.push(format!("Label: {label}"));
    }
    lines.push(format!(
        "Stitches: {}",
        format_number(report.stitch_count.unwrap_or(0))
    ));
    lines.push(format!(
        "Colour changes: {}",
        report.color_changes.unwrap_or(0)
    ));
    lines.push(format!(
        "File size: {}",
        format_file_size(report.file_size.unwrap_or(0))
    ));
    if let Some(bounds) = &report.bounds {
        lines.push(format!("Dimensions: {bounds}"));
    }
    if let Some(path) = &report.png_path {
        lines.push(format!("Preview: {}", path.display()));
    }
    for warning in &report.warnings {
        lines.push(format!("Warning: {warning}"));
    }
    lines.join("\n")
}

/// One line per failure, then a tally.
pub(super) fn format_batch(reports: &[Report]) -> String {
    let failed: Vec<&Report> = reports.iter().filter(|r| !r.is_success()).collect();
    let mut lines: Vec<String> = failed
        .iter()
        .map(|r| format!("Failed: {}: {}", r.input_path.display(), r.message))
        .collect();
    lines.push(format!(
        "{} succeeded, {} failed",
        reports.len() - failed.len(),
        failed.len()
    ));
    lines.join("\n")
}

/// Thousands separated with commas, e.g. `12,345`.
fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[allow(clippy::cast_precision_loss)]
fn format_file_size(bytes: u64) -> String {
    match bytes {
        0..1024 => format!("{bytes} B"),
        1024..1_048_576 => format!("{} KB", bytes / 1024),
        _ => format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    #[test]
    fn numbers_get_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn file_sizes_pick_a_unit() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(4096), "4 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024 / 2), "1.5 MB");
    }

    #[test]
    fn failed_reduction_shows_error() {
        let report = Report::failure(PathBuf::from("a.dst"), 15, "boom".into());
        assert_eq!(format_reduction(&report), "Error: boom");
    }

    #[test]
    fn batch_tally_lists_failures() {
        let reports = vec![Report::failure(PathBuf::from("a.dst"), 15, "boom".into())];
        assert_eq!(
            format_batch(&reports),
            "Failed: a.dst: boom\n0 succeeded, 1 failed"
        );
    }
}
