//! DOTA rotated-polygon labels.
//!
//! One object per line: `x1 y1 x2 y2 x3 y3 x4 y4 category difficult`.
//! The quadrilateral is reduced to its axis-aligned bounding box when read.

use crate::error::{LabelError, Result};
use crate::formats::{content_lines, malformed, AnnotationFormat, ReadOutcome};
use crate::registry::ClassRegistry;
use crate::types::{AnnotationRecord, Corners, ImageSize};

const FIELD_COUNT: usize = 10;

/// A parsed DOTA object line.
#[derive(Debug, Clone, PartialEq)]
pub struct DotaObject {
    pub polygon: [(f64, f64); 4],
    pub category: String,
    pub difficult: bool,
}

/// Parse one line, returning `None` if it does not hold exactly ten fields
/// or a coordinate is not a number.
pub fn parse_line(line: &str) -> Option<DotaObject> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != FIELD_COUNT {
        return None;
    }

    let mut coords = [0.0f64; 8];
    for (coord, part) in coords.iter_mut().zip(&parts[..8]) {
        *coord = part.parse().ok()?;
    }

    Some(DotaObject {
        polygon: [
            (coords[0], coords[1]),
            (coords[2], coords[3]),
            (coords[4], coords[5]),
            (coords[6], coords[7]),
        ],
        category: parts[8].to_lowercase(),
        difficult: parts[9] == "1",
    })
}

/// Format an axis-aligned box as a DOTA line, vertices clockwise from the
/// top-left corner.
pub fn format_line(bbox: &Corners, category: &str, difficult: bool) -> String {
    format!(
        "{} {} {} {} {} {} {} {} {} {}",
        bbox.xmin,
        bbox.ymin,
        bbox.xmax,
        bbox.ymin,
        bbox.xmax,
        bbox.ymax,
        bbox.xmin,
        bbox.ymax,
        category,
        u8::from(difficult)
    )
}

pub struct Dota;

impl AnnotationFormat for Dota {
    const NAME: &'static str = "DOTA";
    const EXTENSION: &'static str = "txt";

    fn read_record(
        id: &str,
        content: &str,
        size: Option<ImageSize>,
        classes: &mut ClassRegistry,
    ) -> Result<ReadOutcome> {
        let size = size.ok_or(LabelError::MissingImageSize(Self::NAME))?;
        let mut record = AnnotationRecord::new(id, size);
        let mut malformed_lines = Vec::new();

        for (line_number, line) in content_lines(content) {
            let Some(object) = parse_line(line) else {
                malformed_lines.push(malformed(line_number, line));
                continue;
            };
            let Some(class_id) = classes.resolve(&object.category) else {
                continue;
            };
            record.push(
                Corners::enclosing(&object.polygon),
                class_id,
                Some(object.difficult),
            );
        }

        Ok(ReadOutcome::Record {
            record,
            malformed: malformed_lines,
        })
    }

    fn write_record(record: &AnnotationRecord, classes: &ClassRegistry) -> Result<String> {
        let lines: Vec<String> = record
            .boxes
            .iter()
            .map(|labeled| {
                let category = classes
                    .name_of(labeled.class_id)
                    .map(str::to_string)
                    .unwrap_or_else(|| labeled.class_id.to_string());
                format_line(
                    &labeled.bbox,
                    &category,
                    labeled.difficult.unwrap_or(false),
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
