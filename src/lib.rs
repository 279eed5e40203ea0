//! Object-detection annotation tools
//!
//! This library converts DOTA and NEON annotations to YOLO format, filters and
//! draws YOLO labels, and attaches detector metadata to exported ONNX models.

pub mod config;
pub mod conversion;
pub mod dataset;
pub mod dota_dataset;
pub mod draw;
pub mod error;
pub mod filter_dataset;
pub mod formats;
pub mod io;
pub mod neon_dataset;
pub mod onnx_export;
pub mod registry;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use config::{DotaArgs, DrawArgs, ExportArgs, FilterArgs, NeonArgs};
pub use conversion::{denormalize, normalize, normalize_polygon, YoloLabel};
pub use dataset::split_annotations;
pub use error::{LabelError, Result};
pub use formats::{AnnotationFormat, Dota, Neon, ReadOutcome, Yolo};
pub use registry::{ClassFilter, ClassRegistry};
pub use types::{AnnotationRecord, CenterBox, Corners, ImageSize, ProcessingStats};

pub use dota_dataset::process_dota_dataset;
pub use draw::process_draw;
pub use filter_dataset::process_filter_dataset;
pub use neon_dataset::process_neon_dataset;
pub use onnx_export::export_model;
