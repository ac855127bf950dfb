//! Reading and writing stitch files.
//!
//! Only Tajima DST is supported. Other embroidery extensions are recognized
//! so they can be rejected with a clear message rather than decoded as noise.

pub mod dst;

use std::{fs, io, path::Path, path::PathBuf};

use sha2::{Digest, Sha256};

use crate::model::Pattern;

/// Extensions of embroidery formats that are recognized but not decodable.
const OTHER_FORMATS: &[&str] = &["jef", "pes", "exp", "vp3", "u01", "pec", "xxx"];

/// Errors that can occur while decoding a stitch file.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported embroidery format: .{0} (only .dst is supported)")]
    UnsupportedFormat(String),

    #[error("not an embroidery file: {}", .0.display())]
    NotEmbroidery(PathBuf),

    #[error("file is {len} bytes, shorter than the {} byte header", dst::HEADER_LEN)]
    Truncated { len: usize },

    #[error("record {record} moves the needle outside the coordinate range")]
    OutOfRange { record: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that can occur while encoding a stitch file.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("unsupported output format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("failed to create output file: {}", .0.display())]
    Missing(PathBuf),

    #[error("output file created but is empty: {}", .0.display())]
    Empty(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A verified output file.
#[derive(Debug, Clone)]
pub struct Written {
    pub size: u64,
    /// Hex SHA-256 of the bytes on disk.
    pub sha256: String,
}

/// Lowercased extension of `path`, if any.
fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// True if `path` has a `.dst` extension, in any case.
pub fn is_dst(path: &Path) -> bool {
    extension(path).as_deref() == Some("dst")
}

/// Decode the stitch file at `path`.
pub fn read_pattern(path: &Path) -> Result<Pattern, DecodeError> {
    match extension(path) {
        Some(ext) if ext == "dst" => {}
        Some(ext) if OTHER_FORMATS.contains(&ext.as_str()) => {
            return Err(DecodeError::UnsupportedFormat(ext));
        }
        _ => return Err(DecodeError::NotEmbroidery(path.to_path_buf())),
    }

    let bytes = fs::read(path)?;
    let pattern = dst::decode(&bytes)?;
    log::debug!(
        "decoded {} entries from {} (label {:?})",
        pattern.stream.len(),
        path.display(),
        pattern.label
    );
    Ok(pattern)
}

/// Encode `pattern` to `path`, then read the file back to verify it.
///
/// A missing or empty file after writing is an error, never a degraded success.
pub fn write_pattern(path: &Path, pattern: &Pattern) -> Result<Written, EncodeError> {
    if !is_dst(path) {
        return Err(EncodeError::UnsupportedFormat(path.to_path_buf()));
    }

    fs::write(path, dst::encode(pattern))?;

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(EncodeError::Missing(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    if bytes.is_empty() {
        return Err(EncodeError::Empty(path.to_path_buf()));
    }

    Ok(Written {
        size: bytes.len() as u64,
        sha256: hex::encode(Sha256::digest(&bytes)),
    })
}
