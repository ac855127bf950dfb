//! Stream and Pattern: ordered entries as decoded from a stitch file.

use serde::{Deserialize, Serialize};

use super::entry::Entry;

/// An ordered sequence of entries in stitching order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stream {
    entries: Vec<Entry>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// True when the final entry is an end-of-pattern marker.
    pub fn is_terminated(&self) -> bool {
        self.last().is_some_and(Entry::is_end)
    }

    pub fn color_changes(&self) -> usize {
        self.iter().filter(|e| e.is_color_change()).count()
    }

    /// Bounding box over every entry position, or `None` for an empty stream.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.entries.first()?.point();
        let init = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(self.iter().fold(init, |b, entry| {
            let p = entry.point();
            Bounds {
                min_x: b.min_x.min(p.x),
                min_y: b.min_y.min(p.y),
                max_x: b.max_x.max(p.x),
                max_y: b.max_y.max(p.y),
            }
        }))
    }
}

impl From<Vec<Entry>> for Stream {
    fn from(entries: Vec<Entry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<Entry> for Stream {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Stream {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Axis-aligned extents of a stream, in tenths of a millimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Bounds {
    pub fn width(&self) -> i64 {
        i64::from(self.max_x) - i64::from(self.min_x)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.max_y) - i64::from(self.min_y)
    }

    /// Physical size, e.g. `12.5mm × 8.0mm`.
    #[allow(clippy::cast_precision_loss)]
    pub fn describe_mm(&self) -> String {
        format!(
            "{:.1}mm × {:.1}mm",
            self.width() as f64 / 10.0,
            self.height() as f64 / 10.0
        )
    }
}

/// A decoded stitch file: its label and its stream.
///
/// The end-of-pattern marker is implicit; the encoder writes exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    pub label: String,
    pub stream: Stream,
}
