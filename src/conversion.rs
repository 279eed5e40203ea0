//! Coordinate normalization between corner form and normalized center form.
//!
//! Both directions are pure functions of the box and the image size. No
//! clamping is applied: coordinates outside the image produce values outside
//! `[0, 1]`.

use crate::error::{LabelError, Result};
use crate::types::{AnnotationRecord, CenterBox, Corners, ImageSize};

/// A YOLO label line: class id plus normalized center box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloLabel {
    pub class_id: usize,
    pub bbox: CenterBox,
}

fn checked_dims(width: f64, height: f64) -> Result<(f64, f64)> {
    if width > 0.0 && height > 0.0 {
        Ok((width, height))
    } else {
        Err(LabelError::InvalidImageSize { width, height })
    }
}

/// Convert a corner box to normalized center form.
pub fn normalize(corners: &Corners, width: f64, height: f64) -> Result<CenterBox> {
    let (width, height) = checked_dims(width, height)?;

    let xmin = corners.xmin / width;
    let xmax = corners.xmax / width;
    let ymin = corners.ymin / height;
    let ymax = corners.ymax / height;

    Ok(CenterBox::new(
        (xmin + xmax) / 2.0,
        (ymin + ymax) / 2.0,
        xmax - xmin,
        ymax - ymin,
    ))
}

/// Convert the four vertices of a (possibly rotated) quadrilateral to the
/// normalized center form of its axis-aligned bounding box.
pub fn normalize_polygon(points: &[(f64, f64); 4], width: f64, height: f64) -> Result<CenterBox> {
    normalize(&Corners::enclosing(points), width, height)
}

/// Convert a normalized center box back to absolute corners.
pub fn denormalize(bbox: &CenterBox, width: f64, height: f64) -> Corners {
    Corners::new(
        (bbox.cx - bbox.w / 2.0) * width,
        (bbox.cy - bbox.h / 2.0) * height,
        (bbox.cx + bbox.w / 2.0) * width,
        (bbox.cy + bbox.h / 2.0) * height,
    )
}

/// Convert every box of a record to a YOLO label, preserving order.
pub fn record_to_yolo(record: &AnnotationRecord) -> Result<Vec<YoloLabel>> {
    let ImageSize { width, height } = record.size;
    record
        .boxes
        .iter()
        .map(|labeled| {
            Ok(YoloLabel {
                class_id: labeled.class_id,
                bbox: normalize(&labeled.bbox, width as f64, height as f64)?,
            })
        })
        .collect()
}

/// Convert YOLO labels of an image back into an annotation record.
pub fn yolo_to_record(id: &str, size: ImageSize, labels: &[YoloLabel]) -> AnnotationRecord {
    let mut record = AnnotationRecord::new(id, size);
    for label in labels {
        let corners = denormalize(&label.bbox, size.width as f64, size.height as f64);
        record.push(corners, label.class_id, None);
    }
    record
}
