//! Entry: one element of a stitch stream.

use serde::{Deserialize, Serialize};

/// A planar position in tenths of a millimeter, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points, in tenths of a millimeter.
///
/// Differences are taken in `f64` so extreme coordinates cannot overflow.
pub fn distance(a: Point, b: Point) -> f64 {
    let dx = f64::from(b.x) - f64::from(a.x);
    let dy = f64::from(b.y) - f64::from(a.y);
    dx.hypot(dy)
}

/// The command kind carried by an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveTag {
    /// Needle penetration at the position. The only filterable kind.
    Stitch,
    /// Frame move without stitching.
    Jump,
    /// Thread cut.
    Trim,
    /// Machine pause.
    Stop,
    /// Thread change expressed as a plain move.
    ColorChange,
    /// Toggles sequin mode on or off.
    SequinMode,
    /// Drops a sequin at the position.
    SequinEject,
    /// End of pattern.
    End,
}

/// A composite command: a kind plus parameters the codec understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub command: MoveTag,
    pub params: Vec<i32>,
}

/// One element of a stitch stream.
///
/// Every entry carries a position, even commands, because the stitch formats
/// reuse the coordinate fields for them. Only [`Entry::Move`] with
/// [`MoveTag::Stitch`] is ever considered for removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Entry {
    /// A move annotated with a simple tag.
    Move { x: i32, y: i32, tag: MoveTag },

    /// A command with a structured payload. Never filtered.
    Structured {
        x: i32,
        y: i32,
        payload: CommandPayload,
    },
}

impl Entry {
    pub fn stitch(x: i32, y: i32) -> Self {
        Self::Move {
            x,
            y,
            tag: MoveTag::Stitch,
        }
    }

    pub fn jump(x: i32, y: i32) -> Self {
        Self::Move {
            x,
            y,
            tag: MoveTag::Jump,
        }
    }

    pub fn end(x: i32, y: i32) -> Self {
        Self::Move {
            x,
            y,
            tag: MoveTag::End,
        }
    }

    /// A structured color change announcing the zero-based index of the next thread.
    pub fn color_change(x: i32, y: i32, thread: i32) -> Self {
        Self::Structured {
            x,
            y,
            payload: CommandPayload {
                command: MoveTag::ColorChange,
                params: vec![thread],
            },
        }
    }

    pub fn point(&self) -> Point {
        match *self {
            Self::Move { x, y, .. } | Self::Structured { x, y, .. } => Point { x, y },
        }
    }

    /// The command kind, whether it is a simple tag or part of a payload.
    pub fn command(&self) -> MoveTag {
        match self {
            Self::Move { tag, .. } => *tag,
            Self::Structured { payload, .. } => payload.command,
        }
    }

    /// True only for a simple move tagged as a plain stitch.
    pub fn is_plain_stitch(&self) -> bool {
        matches!(
            self,
            Self::Move {
                tag: MoveTag::Stitch,
                ..
            }
        )
    }

    pub fn is_end(&self) -> bool {
        self.command() == MoveTag::End
    }

    pub fn is_color_change(&self) -> bool {
        self.command() == MoveTag::ColorChange
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        assert!((distance(Point::new(0, 0), Point::new(3, 4)) - 5.0).abs() < f64::EPSILON);
        assert!((distance(Point::new(-3, -4), Point::new(0, 0)) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = Point::new(12, -7);
        let b = Point::new(-30, 41);
        assert!((distance(a, b) - distance(b, a)).abs() < f64::EPSILON);
        assert!(distance(a, a).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_does_not_overflow_on_extremes() {
        let d = distance(Point::new(i32::MIN, 0), Point::new(i32::MAX, 0));
        assert!(d > 4.0e9);
    }

    #[test]
    fn plain_stitch_only_for_stitch_moves() {
        assert!(Entry::stitch(1, 2).is_plain_stitch());
        assert!(!Entry::jump(1, 2).is_plain_stitch());
        assert!(!Entry::end(1, 2).is_plain_stitch());
        assert!(
            !Entry::Move {
                x: 0,
                y: 0,
                tag: MoveTag::ColorChange
            }
            .is_plain_stitch()
        );
    }

    #[test]
    fn structured_stitch_payload_is_not_plain() {
        let entry = Entry::Structured {
            x: 0,
            y: 0,
            payload: CommandPayload {
                command: MoveTag::Stitch,
                params: vec![1, 2, 3],
            },
        };
        assert!(!entry.is_plain_stitch());
        assert_eq!(entry.command(), MoveTag::Stitch);
    }

    #[test]
    fn color_change_carries_thread_index() {
        let entry = Entry::color_change(5, 6, 2);
        assert!(entry.is_color_change());
        assert_eq!(entry.point(), Point::new(5, 6));
        let Entry::Structured { payload, .. } = entry else {
            panic!("expected structured entry");
        };
        assert_eq!(payload.params, vec![2]);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(Entry::stitch(1, -1)).unwrap();
        assert_eq!(json["kind"], "move");
        assert_eq!(json["tag"], "stitch");
    }
}
