use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while reading, converting or writing annotations.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to parse markup annotation: {0}")]
    XmlDecode(#[from] quick_xml::de::DeError),

    #[error("failed to write markup annotation: {0}")]
    XmlEncode(#[from] quick_xml::se::SeError),

    #[error("invalid image size {width}x{height}, both dimensions must be positive")]
    InvalidImageSize { width: f64, height: f64 },

    #[error("image size is required to read or write {0} annotations")]
    MissingImageSize(&'static str),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("failed to decode ONNX model: {0}")]
    Protobuf(#[from] prost::DecodeError),

    #[error("malformed ONNX model: {0}")]
    MalformedModel(String),

    #[error("failed to encode metadata value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external command `{command}` failed: {reason}")]
    Command { command: String, reason: String },
}

pub type Result<T> = std::result::Result<T, LabelError>;
