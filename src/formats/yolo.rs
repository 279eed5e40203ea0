//! YOLO normalized label lines: `<class_id> <cx> <cy> <w> <h>`.

use crate::conversion::{record_to_yolo, yolo_to_record, YoloLabel};
use crate::error::{LabelError, Result};
use crate::formats::{content_lines, malformed, AnnotationFormat, ReadOutcome};
use crate::registry::ClassRegistry;
use crate::types::{AnnotationRecord, CenterBox, ImageSize, MalformedLine};

pub const FIELD_COUNT: usize = 5;

/// Parse one label line, returning `None` unless it splits into exactly five
/// fields that all parse.
pub fn parse_line(line: &str) -> Option<YoloLabel> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != FIELD_COUNT {
        return None;
    }
    let class_id = parts[0].parse().ok()?;
    let cx = parts[1].parse().ok()?;
    let cy = parts[2].parse().ok()?;
    let w = parts[3].parse().ok()?;
    let h = parts[4].parse().ok()?;
    Some(YoloLabel {
        class_id,
        bbox: CenterBox::new(cx, cy, w, h),
    })
}

/// Parse every non-empty line of a label file.
pub fn parse_labels(content: &str) -> (Vec<YoloLabel>, Vec<MalformedLine>) {
    let mut labels = Vec::new();
    let mut malformed_lines = Vec::new();
    for (line_number, line) in content_lines(content) {
        match parse_line(line) {
            Some(label) => labels.push(label),
            None => malformed_lines.push(malformed(line_number, line)),
        }
    }
    (labels, malformed_lines)
}

pub fn format_label(label: &YoloLabel) -> String {
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        label.class_id, label.bbox.cx, label.bbox.cy, label.bbox.w, label.bbox.h
    )
}

/// Join labels into file content, one label per line.
pub fn format_labels(labels: &[YoloLabel]) -> String {
    labels
        .iter()
        .map(format_label)
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct Yolo;

impl AnnotationFormat for Yolo {
    const NAME: &'static str = "YOLO";
    const EXTENSION: &'static str = "txt";

    fn read_record(
        id: &str,
        content: &str,
        size: Option<ImageSize>,
        _classes: &mut ClassRegistry,
    ) -> Result<ReadOutcome> {
        let size = size.ok_or(LabelError::MissingImageSize(Self::NAME))?;
        let (labels, malformed_lines) = parse_labels(content);
        Ok(ReadOutcome::Record {
            record: yolo_to_record(id, size, &labels),
            malformed: malformed_lines,
        })
    }

    fn write_record(record: &AnnotationRecord, _classes: &ClassRegistry) -> Result<String> {
        Ok(format_labels(&record_to_yolo(record)?))
    }
}
