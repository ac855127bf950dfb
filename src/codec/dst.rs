//! Tajima DST: a 512-byte text header followed by 3-byte movement records.
//!
//! Each record holds a relative move in balanced ternary (digits worth
//! 1, 3, 9, 27 and 81 tenths of a millimeter on each axis) and a command in
//! the high bits of the third byte. DST's y axis points up; streams use y
//! pointing down, so y is negated on the way in and out.

use std::fmt::Write as _;

use crate::model::{Entry, MoveTag, Pattern, Point, Stream};

use super::DecodeError;

pub const HEADER_LEN: usize = 512;

/// Largest displacement a single record can carry on one axis.
pub const MAX_STEP: i32 = 121;

const FLAGS_BASE: u8 = 0b0000_0011;
const FLAG_JUMP: u8 = 0b1000_0011;
const FLAG_SEQUIN: u8 = 0b0100_0011;
const FLAG_COLOR: u8 = 0b1100_0011;
const FLAG_END: u8 = 0b1111_0011;

/// One balanced-ternary digit: its weight, the record byte holding it,
/// and the bits set for a positive or negative digit.
struct Digit {
    weight: i32,
    byte: usize,
    plus: u8,
    minus: u8,
}

const X_DIGITS: [Digit; 5] = [
    Digit { weight: 81, byte: 2, plus: 2, minus: 3 },
    Digit { weight: 27, byte: 1, plus: 2, minus: 3 },
    Digit { weight: 9, byte: 0, plus: 2, minus: 3 },
    Digit { weight: 3, byte: 1, plus: 0, minus: 1 },
    Digit { weight: 1, byte: 0, plus: 0, minus: 1 },
];

const Y_DIGITS: [Digit; 5] = [
    Digit { weight: 81, byte: 2, plus: 5, minus: 4 },
    Digit { weight: 27, byte: 1, plus: 5, minus: 4 },
    Digit { weight: 9, byte: 0, plus: 5, minus: 4 },
    Digit { weight: 3, byte: 1, plus: 7, minus: 6 },
    Digit { weight: 1, byte: 0, plus: 7, minus: 6 },
];

fn bit(byte: u8, n: u8) -> i32 {
    i32::from((byte >> n) & 1)
}

fn decode_axis(record: [u8; 3], digits: &[Digit]) -> i32 {
    digits
        .iter()
        .map(|d| d.weight * (bit(record[d.byte], d.plus) - bit(record[d.byte], d.minus)))
        .sum()
}

fn encode_axis(record: &mut [u8; 3], mut value: i32, digits: &[Digit]) {
    for d in digits {
        let half = (d.weight - 1) / 2;
        if value > half {
            record[d.byte] |= 1 << d.plus;
            value -= d.weight;
        } else if value < -half {
            record[d.byte] |= 1 << d.minus;
            value += d.weight;
        }
    }
}

/// Encode one record. `dx` and `dy` must lie within `±MAX_STEP`.
fn encode_record(dx: i32, dy: i32, flags: u8) -> [u8; 3] {
    debug_assert!(dx.abs() <= MAX_STEP && dy.abs() <= MAX_STEP);
    let mut record = [0, 0, flags];
    encode_axis(&mut record, dx, &X_DIGITS);
    encode_axis(&mut record, -dy, &Y_DIGITS);
    record
}

/// What a record's flag byte means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Stitch,
    Jump,
    SequinMode,
    ColorChange,
    End,
}

fn record_kind(flags: u8) -> RecordKind {
    if flags & FLAG_END == FLAG_END {
        RecordKind::End
    } else if flags & FLAG_COLOR == FLAG_COLOR {
        RecordKind::ColorChange
    } else if flags & FLAG_SEQUIN == FLAG_SEQUIN {
        RecordKind::SequinMode
    } else if flags & FLAG_JUMP == FLAG_JUMP {
        RecordKind::Jump
    } else {
        RecordKind::Stitch
    }
}

/// Decode a whole DST file.
///
/// Decoding stops at the first end record, which is not emitted into the
/// stream. A trailing partial record is ignored.
pub fn decode(bytes: &[u8]) -> Result<Pattern, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Truncated { len: bytes.len() });
    }
    let (header, body) = bytes.split_at(HEADER_LEN);
    let label = parse_label(header);

    let mut stream = Stream::new();
    let mut position = Point::ORIGIN;
    let mut sequin_mode = false;
    let mut next_thread = 0;

    for (index, chunk) in body.chunks_exact(3).enumerate() {
        let record = [chunk[0], chunk[1], chunk[2]];
        position = advance(position, record, index)?;
        let Point { x, y } = position;

        let entry = match record_kind(record[2]) {
            RecordKind::End => break,
            RecordKind::Stitch => Entry::stitch(x, y),
            RecordKind::Jump if sequin_mode => Entry::Move {
                x,
                y,
                tag: MoveTag::SequinEject,
            },
            RecordKind::Jump => Entry::jump(x, y),
            RecordKind::SequinMode => {
                sequin_mode = !sequin_mode;
                Entry::Move {
                    x,
                    y,
                    tag: MoveTag::SequinMode,
                }
            }
            RecordKind::ColorChange => {
                next_thread += 1;
                Entry::color_change(x, y, next_thread)
            }
        };
        stream.push(entry);
    }

    Ok(Pattern { label, stream })
}

/// Apply the move held in `record`, failing if the position leaves `i32`.
fn advance(position: Point, record: [u8; 3], index: usize) -> Result<Point, DecodeError> {
    let x = position.x.checked_add(decode_axis(record, &X_DIGITS));
    let y = position.y.checked_sub(decode_axis(record, &Y_DIGITS));
    match (x, y) {
        (Some(x), Some(y)) => Ok(Point { x, y }),
        _ => Err(DecodeError::OutOfRange { record: index }),
    }
}

/// The `LA:` field of the header, trimmed. Empty when absent.
fn parse_label(header: &[u8]) -> String {
    let Some(rest) = header.strip_prefix(b"LA:") else {
        return String::new();
    };
    let end = rest
        .iter()
        .position(|&b| b == b'\r')
        .unwrap_or(rest.len())
        .min(16);
    String::from_utf8_lossy(&rest[..end]).trim().to_string()
}

/// Accumulates records while tracking position and header statistics.
struct RecordWriter {
    records: Vec<[u8; 3]>,
    position: Point,
    min: Point,
    max: Point,
    color_changes: usize,
}

impl RecordWriter {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            position: Point::ORIGIN,
            min: Point::ORIGIN,
            max: Point::ORIGIN,
            color_changes: 0,
        }
    }

    fn push(&mut self, dx: i32, dy: i32, flags: u8) {
        self.records.push(encode_record(dx, dy, flags));
        self.position.x += dx;
        self.position.y += dy;
        self.min.x = self.min.x.min(self.position.x);
        self.min.y = self.min.y.min(self.position.y);
        self.max.x = self.max.x.max(self.position.x);
        self.max.y = self.max.y.max(self.position.y);
        if flags == FLAG_COLOR {
            self.color_changes += 1;
        }
    }

    /// Move to `target` in equal steps no longer than `MAX_STEP`.
    ///
    /// Intermediate steps use `lead` flags, the final step uses `last`.
    /// A zero-length move still writes one record.
    fn move_to(&mut self, target: Point, lead: u8, last: u8) {
        let start = self.position;
        let dx = i64::from(target.x) - i64::from(start.x);
        let dy = i64::from(target.y) - i64::from(start.y);
        let longest = dx.abs().max(dy.abs());
        let steps = ((longest + i64::from(MAX_STEP) - 1) / i64::from(MAX_STEP)).max(1);
        // Every intermediate point lies between start and target.
        #[allow(clippy::cast_possible_truncation)]
        let lerp = |from: i32, delta: i64, k: i64| (i64::from(from) + delta * k / steps) as i32;
        for k in 1..=steps {
            let next = Point::new(lerp(start.x, dx, k), lerp(start.y, dy, k));
            let flags = if k == steps { last } else { lead };
            self.push(next.x - self.position.x, next.y - self.position.y, flags);
        }
    }

    /// Jump to `target` only if not already there.
    fn jump_to(&mut self, target: Point) {
        if target != self.position {
            self.move_to(target, FLAG_JUMP, FLAG_JUMP);
        }
    }

    fn write(&mut self, entry: &Entry) {
        let target = entry.point();
        match entry.command() {
            MoveTag::Stitch => self.move_to(target, FLAGS_BASE, FLAGS_BASE),
            MoveTag::Jump | MoveTag::SequinEject => self.move_to(target, FLAG_JUMP, FLAG_JUMP),
            MoveTag::SequinMode => self.move_to(target, FLAG_JUMP, FLAG_SEQUIN),
            MoveTag::ColorChange | MoveTag::Stop => self.move_to(target, FLAG_JUMP, FLAG_COLOR),
            MoveTag::Trim => {
                // DST has no trim record; machines cut on a burst of jumps
                // that ends where it started.
                self.jump_to(target);
                self.push(2, 2, FLAG_JUMP);
                self.push(-4, -4, FLAG_JUMP);
                self.push(2, 2, FLAG_JUMP);
            }
            MoveTag::End => {}
        }
    }
}

/// Encode a pattern as a complete DST file.
///
/// Entries after the first end marker are not written, since readers stop
/// there. Exactly one end record closes the file.
pub fn encode(pattern: &Pattern) -> Vec<u8> {
    let mut writer = RecordWriter::new();
    let mut entries = pattern.stream.iter();
    for entry in entries.by_ref() {
        if entry.is_end() {
            break;
        }
        writer.write(entry);
    }
    let dropped = entries.count();
    if dropped > 0 {
        log::warn!("{dropped} entries after the end marker were not encoded");
    }
    writer.records.push([0, 0, FLAG_END]);

    let mut bytes = header(&pattern.label, &writer);
    for record in &writer.records {
        bytes.extend_from_slice(record);
    }
    bytes
}

fn header(label: &str, writer: &RecordWriter) -> Vec<u8> {
    let label: String = label.chars().filter(char::is_ascii).take(16).collect();
    let sign = |v: i32| if v < 0 { '-' } else { '+' };
    let end = writer.position;

    let mut text = String::new();
    // Writing to a String cannot fail.
    let _ = write!(text, "LA:{label:<16}\r");
    let _ = write!(text, "ST:{:>7}\r", writer.records.len());
    let _ = write!(text, "CO:{:>3}\r", writer.color_changes);
    let _ = write!(text, "+X:{:>5}\r", writer.max.x.max(0));
    let _ = write!(text, "-X:{:>5}\r", writer.min.x.min(0).unsigned_abs());
    let _ = write!(text, "+Y:{:>5}\r", writer.min.y.min(0).unsigned_abs());
    let _ = write!(text, "-Y:{:>5}\r", writer.max.y.max(0));
    let _ = write!(text, "AX:{}{:>5}\r", sign(end.x), end.x.unsigned_abs());
    let _ = write!(text, "AY:{}{:>5}\r", sign(end.y.saturating_neg()), end.y.unsigned_abs());
    let _ = write!(text, "MX:+{:>5}\r", 0);
    let _ = write!(text, "MY:+{:>5}\r", 0);
    let _ = write!(text, "PD:{:>6}\r", "******");

    let mut bytes = text.into_bytes();
    bytes.push(0x1A);
    bytes.resize(HEADER_LEN, b' ');
    bytes
}
