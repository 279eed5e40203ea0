//! NEON tree-crown annotations, a Pascal VOC style markup.
//!
//! ```xml
//! <annotation>
//!   <folder>evaluation</folder>
//!   <filename>2018_SJER_3_252000_4104000_image_628.tif</filename>
//!   <size><width>400</width><height>400</height><depth>3</depth></size>
//!   <object>
//!     <name>Tree</name>
//!     <bndbox><xmin>10</xmin><ymin>12</ymin><xmax>40</xmax><ymax>52</ymax></bndbox>
//!   </object>
//! </annotation>
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{LabelError, Result};
use crate::formats::{AnnotationFormat, ReadOutcome};
use crate::registry::ClassRegistry;
use crate::types::{AnnotationRecord, Corners, ImageSize};

/// Records declaring a wider image are excluded from conversion.
pub const MAX_IMAGE_WIDTH: f64 = 2500.0;

// Every NEON box is a tree crown
pub const NEON_CLASS_ID: usize = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "annotation")]
pub struct NeonDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    pub filename: String,
    pub size: NeonSize,
    #[serde(rename = "object", default)]
    pub objects: Vec<NeonObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeonSize {
    pub width: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeonObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficult: Option<u8>,
    pub bndbox: NeonBndBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeonBndBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl NeonDocument {
    pub fn is_oversized(&self) -> bool {
        self.size.width > MAX_IMAGE_WIDTH
    }

    pub fn image_size(&self) -> Result<ImageSize> {
        let NeonSize { width, height, .. } = self.size;
        if width > 0.0 && height > 0.0 {
            Ok(ImageSize::new(width as u32, height as u32))
        } else {
            Err(LabelError::InvalidImageSize { width, height })
        }
    }

    /// Convert to a record with every box assigned the tree class.
    pub fn to_record(&self) -> Result<AnnotationRecord> {
        let mut record = AnnotationRecord::new(self.filename.as_str(), self.image_size()?);
        for object in &self.objects {
            let NeonBndBox {
                xmin,
                ymin,
                xmax,
                ymax,
            } = object.bndbox;
            record.push(
                Corners::new(xmin, ymin, xmax, ymax),
                NEON_CLASS_ID,
                object.difficult.map(|flag| flag == 1),
            );
        }
        Ok(record)
    }
}

pub fn parse_document(content: &str) -> Result<NeonDocument> {
    Ok(quick_xml::de::from_str(content)?)
}

pub fn write_document(document: &NeonDocument) -> Result<String> {
    let mut buffer = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut buffer);
    serializer.indent(' ', 2);
    document.serialize(serializer)?;
    Ok(buffer)
}

pub struct Neon;

impl AnnotationFormat for Neon {
    const NAME: &'static str = "NEON";
    const EXTENSION: &'static str = "xml";

    fn read_record(
        _id: &str,
        content: &str,
        _size: Option<ImageSize>,
        _classes: &mut ClassRegistry,
    ) -> Result<ReadOutcome> {
        let document = parse_document(content)?;
        if document.is_oversized() {
            return Ok(ReadOutcome::Skipped {
                reason: format!("Skipping large image: {}", document.filename),
            });
        }
        Ok(ReadOutcome::Record {
            record: document.to_record()?,
            malformed: Vec::new(),
        })
    }

    fn write_record(record: &AnnotationRecord, classes: &ClassRegistry) -> Result<String> {
        let objects = record
            .boxes
            .iter()
            .map(|labeled| NeonObject {
                name: Some(
                    classes
                        .name_of(labeled.class_id)
                        .map(str::to_string)
                        .unwrap_or_else(|| labeled.class_id.to_string()),
                ),
                difficult: labeled.difficult.map(u8::from),
                bndbox: NeonBndBox {
                    xmin: labeled.bbox.xmin,
                    ymin: labeled.bbox.ymin,
                    xmax: labeled.bbox.xmax,
                    ymax: labeled.bbox.ymax,
                },
            })
            .collect();

        write_document(&NeonDocument {
            folder: None,
            filename: record.id.clone(),
            size: NeonSize {
                width: record.size.width as f64,
                height: record.size.height as f64,
                depth: Some(3),
            },
            objects,
        })
    }
}
