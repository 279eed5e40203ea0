use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// Convert DOTA rotated-polygon labels to YOLO, in place.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct DotaArgs {
    /// Path to the DOTA dataset (containing train/, test/, valid/)
    pub input: PathBuf,

    /// Classes to keep/merge, comma separated (e.g. plane,small-vehicle)
    #[arg(long = "classes", value_delimiter = ',')]
    pub classes: Vec<String>,

    /// Also write dataset.yaml with the class names into the dataset root
    #[arg(long = "yaml")]
    pub write_yaml: bool,
}

/// Convert the NEON tree crown dataset to a YOLO train/valid dataset.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct NeonArgs {
    /// Path to the NEON dataset (containing evaluation/RGB and annotations)
    pub input: PathBuf,

    /// Fraction of the pairs used for training, the rest goes to validation
    #[arg(long = "split", default_value_t = 0.9, value_parser = validate_split)]
    pub split: f64,

    /// Seed for the shuffle; random on every run when omitted
    #[arg(long = "seed")]
    pub seed: Option<u64>,
}

/// Draw YOLO boxes onto their images.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct DrawArgs {
    /// Path to an image or to a dataset split directory (with images/ and labels/)
    pub input: PathBuf,
}

/// Keep only the given YOLO classes and merge them into class 0, in place.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct FilterArgs {
    /// Path to the YOLO dataset (containing train/, test/, valid/)
    pub input: PathBuf,

    /// Class ids to keep/merge, comma separated (e.g. 3,4)
    #[arg(value_parser = parse_class_ids)]
    pub classes: ClassIds,
}

/// Export a YOLO model to ONNX, attach detector metadata and quantize it.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct ExportArgs {
    /// Path to the YOLO model weights (.pt)
    pub input: PathBuf,

    /// Detector type stored in the model metadata
    #[arg(long = "det-type", default_value = "YOLO_v8")]
    pub det_type: String,

    /// IOU threshold stored in the model metadata
    #[arg(long = "iou", default_value_t = 0.3)]
    pub det_iou_thresh: f64,

    /// Confidence threshold stored in the model metadata
    #[arg(long = "conf", default_value_t = 0.3)]
    pub det_conf: f64,

    /// Ground resolution stored in the model metadata
    #[arg(long = "resolution", default_value_t = 10)]
    pub resolution: u32,

    /// Tile overlap stored in the model metadata
    #[arg(long = "tiles-overlap", default_value_t = 5)]
    pub tiles_overlap: u32,

    /// Class names in id order, comma separated
    #[arg(long = "class-names", value_delimiter = ',', default_value = "tree")]
    pub class_names: Vec<String>,

    /// Exporter command, `{input}` is replaced with the weights path
    #[arg(long = "exporter", default_value = "yolo export model={input} format=onnx")]
    pub exporter: String,

    /// Simplifier command
    #[arg(long = "simplifier", default_value = "onnxsim {input} {output}")]
    pub simplifier: String,

    /// Quantization pre-processing command
    #[arg(
        long = "preprocessor",
        default_value = "python -m onnxruntime.quantization.preprocess --input {input} --output {output} --skip_symbolic_shape True"
    )]
    pub preprocessor: String,

    /// Dynamic quantization command
    #[arg(long = "quantizer", default_value = crate::onnx_export::DEFAULT_QUANTIZER)]
    pub quantizer: String,

    /// Skip the simplification step
    #[arg(long = "skip-simplify")]
    pub skip_simplify: bool,
}

/// Numeric class ids given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassIds(pub Vec<usize>);

// Parse comma separated class ids, ignoring empty entries
pub fn parse_class_ids(s: &str) -> Result<ClassIds, String> {
    s.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| {
            usize::from_str(c).map_err(|_| format!("invalid class id `{}`", c))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(ClassIds)
}

// Validate that the split is strictly between 0.0 and 1.0
pub fn validate_split(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if val > 0.0 && val < 1.0 => Ok(val),
        _ => Err("SPLIT must be between 0.0 and 1.0 (exclusive)".to_string()),
    }
}
