//! Format adapters between on-disk annotation files and [`AnnotationRecord`].
//!
//! Every adapter reads a whole label file into a record (or decides to skip
//! the record entirely) and writes a record back into the format's text.

pub mod dota;
pub mod neon;
pub mod yolo;

pub use dota::Dota;
pub use neon::Neon;
pub use yolo::Yolo;

use crate::error::Result;
use crate::registry::ClassRegistry;
use crate::types::{AnnotationRecord, ImageSize, MalformedLine};

/// Result of reading one annotation file.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// The parsed record, plus lines that were dropped as malformed.
    Record {
        record: AnnotationRecord,
        malformed: Vec<MalformedLine>,
    },
    /// The whole record is excluded by policy.
    Skipped { reason: String },
}

pub trait AnnotationFormat {
    /// Human readable format name.
    const NAME: &'static str;
    /// File extension of annotation files, without the dot.
    const EXTENSION: &'static str;

    /// Parse `content` into a record identified by `id`.
    ///
    /// Formats that do not carry image dimensions require `size`. Class names
    /// are resolved through `classes`.
    fn read_record(
        id: &str,
        content: &str,
        size: Option<ImageSize>,
        classes: &mut ClassRegistry,
    ) -> Result<ReadOutcome>;

    /// Serialize `record`, looking up class names in `classes` where the
    /// format stores names.
    fn write_record(record: &AnnotationRecord, classes: &ClassRegistry) -> Result<String>;
}

/// Non-empty trimmed lines with their 1-based line numbers.
pub(crate) fn content_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

pub(crate) fn malformed(line_number: usize, line: &str) -> MalformedLine {
    MalformedLine {
        line_number,
        content: line.to_string(),
    }
}
