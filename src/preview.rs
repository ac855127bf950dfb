//! PNG previews of stitch streams.
//!
//! Stitches are drawn as line segments in thread order. Any command breaks
//! the line, and each color change moves on to the next palette color.

use std::{fs, io, path::Path, path::PathBuf};

use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::model::{Bounds, MoveTag, Stream};

/// Blank margin around the drawing, in pixels.
const PADDING: u32 = 10;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Thread colors cycled through on color changes.
const PALETTE: [Rgba<u8>; 8] = [
    Rgba([0x1F, 0x1F, 0x1F, 255]),
    Rgba([0xCE, 0x19, 0x38, 255]),
    Rgba([0x13, 0x6C, 0x00, 255]),
    Rgba([0x1E, 0x4F, 0xA3, 255]),
    Rgba([0xFF, 0x86, 0x00, 255]),
    Rgba([0x7C, 0x1D, 0x8F, 255]),
    Rgba([0x00, 0x8C, 0x8C, 255]),
    Rgba([0x98, 0x5F, 0x00, 255]),
];

/// Errors that can occur while rendering a preview.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("nothing to draw: the stream is empty")]
    EmptyStream,

    #[error("preview was not written: {}", .0.display())]
    Missing(PathBuf),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Rendering options.
#[derive(Debug, Clone, Copy)]
pub struct PreviewOptions {
    /// Longest side of the image in pixels, padding included.
    pub max_side: u32,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self { max_side: 1024 }
    }
}

/// Maps stream coordinates onto image pixels.
struct Viewport {
    bounds: Bounds,
    scale: f32,
}

impl Viewport {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    fn fit(bounds: Bounds, max_side: u32) -> (Self, u32, u32) {
        let drawable = max_side.saturating_sub(2 * PADDING).max(1) as f32;
        let longest = bounds.width().max(bounds.height()).max(1) as f32;
        // One pixel per tenth of a millimeter unless that would not fit.
        let scale = (drawable / longest).min(1.0);
        let size = |units: i64| (units as f32 * scale).ceil() as u32 + 2 * PADDING + 1;
        let width = size(bounds.width());
        let height = size(bounds.height());
        (Self { bounds, scale }, width, height)
    }

    #[allow(clippy::cast_precision_loss)]
    fn project(&self, x: i32, y: i32) -> (f32, f32) {
        let px = (i64::from(x) - i64::from(self.bounds.min_x)) as f32 * self.scale;
        let py = (i64::from(y) - i64::from(self.bounds.min_y)) as f32 * self.scale;
        (px + PADDING as f32, py + PADDING as f32)
    }
}

/// Render `stream` into an image.
pub fn render(stream: &Stream, options: PreviewOptions) -> Result<RgbaImage, PreviewError> {
    let bounds = stream.bounds().ok_or(PreviewError::EmptyStream)?;
    let (viewport, width, height) = Viewport::fit(bounds, options.max_side);
    let mut image = RgbaImage::from_pixel(width, height, BACKGROUND);

    let mut color = 0;
    let mut pen: Option<(f32, f32)> = None;
    for entry in stream {
        let p = entry.point();
        let here = viewport.project(p.x, p.y);
        match entry.command() {
            MoveTag::Stitch => {
                if let Some(from) = pen {
                    draw_line_segment_mut(&mut image, from, here, PALETTE[color % PALETTE.len()]);
                }
                pen = Some(here);
            }
            MoveTag::ColorChange => {
                color += 1;
                pen = None;
            }
            _ => pen = None,
        }
    }

    Ok(image)
}

/// Render `stream` and save it as a PNG at `path`.
///
/// The file is checked after saving; an empty or missing file is an error.
pub fn write_png(stream: &Stream, path: &Path, options: PreviewOptions) -> Result<(), PreviewError> {
    let image = render(stream, options)?;
    image.save_with_format(path, ImageFormat::Png)?;

    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(PreviewError::Missing(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(PreviewError::Missing(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::model::Entry;

    fn square() -> Stream {
        Stream::from(vec![
            Entry::stitch(0, 0),
            Entry::stitch(100, 0),
            Entry::stitch(100, 100),
            Entry::color_change(100, 100, 1),
            Entry::stitch(100, 100),
            Entry::stitch(0, 100),
            Entry::stitch(0, 0),
        ])
    }

    fn is_background(image: &RgbaImage, x: u32, y: u32) -> bool {
        *image.get_pixel(x, y) == BACKGROUND
    }

    #[test]
    fn small_designs_render_at_native_scale() {
        let image = render(&square(), PreviewOptions::default()).unwrap();
        assert_eq!(image.dimensions(), (121, 121));
    }

    #[test]
    fn large_designs_are_scaled_to_fit() {
        let stream = Stream::from(vec![Entry::stitch(0, 0), Entry::stitch(4000, 2000)]);
        let image = render(&stream, PreviewOptions { max_side: 420 }).unwrap();
        let (w, h) = image.dimensions();

        // 400 drawable pixels for 4000 units, plus padding and rounding.
        assert!((420..=422).contains(&w));
        assert!(h < w);
    }

    #[test]
    fn stitches_are_drawn_in_palette_colors() {
        let image = render(&square(), PreviewOptions::default()).unwrap();

        // Top edge, first thread.
        assert_eq!(*image.get_pixel(60, PADDING), PALETTE[0]);
        // Bottom edge, drawn after the color change.
        assert_eq!(*image.get_pixel(60, PADDING + 100), PALETTE[1]);
        // Interior untouched.
        assert!(is_background(&image, 60, 60));
    }

    #[test]
    fn jumps_are_not_drawn() {
        let stream = Stream::from(vec![
            Entry::stitch(0, 0),
            Entry::jump(100, 0),
            Entry::stitch(100, 50),
        ]);
        let image = render(&stream, PreviewOptions::default()).unwrap();

        assert!(is_background(&image, PADDING + 50, PADDING));
    }

    #[test]
    fn empty_stream_is_an_error() {
        let err = render(&Stream::new(), PreviewOptions::default()).unwrap_err();
        assert!(matches!(err, PreviewError::EmptyStream));
    }

    #[test]
    fn writes_non_empty_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("square.png");

        write_png(&square(), &path, PreviewOptions::default()).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn unwritable_path_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing/square.png");

        assert!(write_png(&square(), &path, PreviewOptions::default()).is_err());
    }
}
