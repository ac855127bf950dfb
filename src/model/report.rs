//! Reports: the structured results returned by every command.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name recorded in every reduction report.
pub const ALGORITHM: &str = "adaptive_stitch_reduction";

/// Outcome of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Result of reducing one stitch file.
///
/// Failures are reported here too, with `status` set to `error` and the
/// counts left empty, so callers always receive one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub status: Status,
    pub input_path: PathBuf,

    /// Entries decoded from the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_count: Option<usize>,

    /// Input entries retained by the filter, not counting the appended terminator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduction_percent: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Hex SHA-256 of the written output file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_sha256: Option<String>,

    pub png_path: Option<PathBuf>,
    pub algorithm: String,
    pub min_length: u32,

    /// Non-fatal problems, such as a preview that could not be rendered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    pub message: String,
}

impl Report {
    /// An error report for `input`.
    pub fn failure(input_path: PathBuf, min_length: u32, message: String) -> Self {
        Self {
            status: Status::Error,
            input_path,
            original_count: None,
            new_count: None,
            reduction_percent: None,
            output_path: None,
            output_sha256: None,
            png_path: None,
            algorithm: ALGORITHM.to_string(),
            min_length,
            warnings: Vec::new(),
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Result of inspecting one stitch file without modifying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectReport {
    pub status: Status,
    pub file_path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stitch_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_changes: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    /// Physical size such as `12.5mm × 8.0mm`, or `No stitches`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<String>,

    pub png_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    pub message: String,
}

impl InspectReport {
    pub fn failure(file_path: PathBuf, message: String) -> Self {
        Self {
            status: Status::Error,
            file_path,
            label: None,
            stitch_count: None,
            color_changes: None,
            file_size: None,
            bounds: None,
            png_path: None,
            warnings: Vec::new(),
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_serializes_without_counts() {
        let report = Report::failure(PathBuf::from("a.dst"), 15, "boom".into());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "boom");
        assert_eq!(json["algorithm"], ALGORITHM);
        assert!(json.get("original_count").is_none());
        assert!(json.get("warnings").is_none());
        assert!(json["png_path"].is_null());
    }

    #[test]
    fn inspect_failure_is_not_success() {
        let report = InspectReport::failure(PathBuf::from("a.dst"), "missing".into());
        assert!(!report.is_success());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "error");
    }
}
