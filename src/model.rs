//! Core data model for stitchoptix.
//!
//! Entries and streams as decoded from a stitch file, and the reports
//! produced by each command.

mod entry;
mod report;
mod stream;

pub use entry::{CommandPayload, Entry, MoveTag, Point, distance};
pub use report::{ALGORITHM, InspectReport, Report, Status};
pub use stream::{Bounds, Pattern, Stream};
