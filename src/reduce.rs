//! Adaptive stitch reduction.
//!
//! A single forward pass that drops plain stitches closer than a minimum
//! length to the last *kept* entry. Because the anchor only moves when an
//! entry is kept, a run of tiny stitches accumulates until the path has
//! travelled far enough, and no two consecutive kept plain stitches end up
//! closer than the minimum.

use crate::model::{Entry, Stream, distance};

/// Default minimum stitch length, in tenths of a millimeter (1.5 mm).
pub const DEFAULT_MIN_LENGTH: u32 = 15;

/// Reduce `stream`, returning a new terminated stream.
///
/// - The first entry is always kept; it is the path origin.
/// - Any entry that is not a plain stitch, or that follows an anchor that is
///   not a plain stitch, is always kept and becomes the anchor.
/// - A plain stitch following a plain-stitch anchor is kept only when it is
///   at least `min_length` away from the anchor.
///
/// An end marker is appended unless the kept entries already end with one,
/// so reducing a reduced stream returns it unchanged. An empty stream
/// reduces to an empty stream; callers reject empty patterns beforehand.
pub fn reduce(stream: &Stream, min_length: f64) -> Stream {
    let Some((first, rest)) = stream.entries().split_first() else {
        return Stream::new();
    };

    let mut kept = Stream::new();
    kept.push(first.clone());
    let mut anchor = first;

    for entry in rest {
        if anchor.is_plain_stitch()
            && entry.is_plain_stitch()
            && distance(anchor.point(), entry.point()) < min_length
        {
            continue;
        }
        kept.push(entry.clone());
        anchor = entry;
    }

    if !kept.is_terminated() {
        let p = anchor.point();
        kept.push(Entry::end(p.x, p.y));
    }

    kept
}

/// Number of input entries retained in `reduced`, excluding an appended terminator.
pub fn retained_count(input: &Stream, reduced: &Stream) -> usize {
    if reduced.is_terminated() && !input.is_terminated() {
        reduced.len() - 1
    } else {
        reduced.len()
    }
}
