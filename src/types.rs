use std::path::PathBuf;

// Supported image formats when scanning dataset directories
pub const IMG_FORMATS: &[&str] = &["jpg", "tif", "png", "jpeg", "tiff"];

// Dataset splits present under a YOLO dataset root
pub const DATASET_SPLITS: &[&str] = &["train", "test", "valid"];

/// Bounding box in corner form, absolute pixel units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corners {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Corners {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Axis-aligned box enclosing all `points`, min/max taken independently
    /// for x and y.
    pub fn enclosing(points: &[(f64, f64)]) -> Self {
        let (xmin, ymin, xmax, ymax) = points.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(xmin, ymin, xmax, ymax), &(x, y)| {
                (xmin.min(x), ymin.min(y), xmax.max(x), ymax.max(y))
            },
        );
        Self::new(xmin, ymin, xmax, ymax)
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Bounding box in normalized center form, fractions of the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl CenterBox {
    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self { cx, cy, w, h }
    }
}

/// Decoded image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

// A single object of an annotation record
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBox {
    pub bbox: Corners,
    pub class_id: usize,
    pub difficult: Option<bool>,
}

/// Boxes of one annotated image together with its dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub id: String,
    pub size: ImageSize,
    pub boxes: Vec<LabeledBox>,
}

impl AnnotationRecord {
    pub fn new(id: impl Into<String>, size: ImageSize) -> Self {
        Self {
            id: id.into(),
            size,
            boxes: Vec::new(),
        }
    }

    pub fn push(&mut self, bbox: Corners, class_id: usize, difficult: Option<bool>) {
        self.boxes.push(LabeledBox {
            bbox,
            class_id,
            difficult,
        });
    }
}

/// A label line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    pub line_number: usize,
    pub content: String,
}

/// An image file paired with its annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledImage {
    pub image_path: PathBuf,
    pub label_path: PathBuf,
}

// Struct to hold the paths to the output directories of one split
#[derive(Debug, Clone)]
pub struct SplitDirs {
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

// Struct to hold the train and validation subsets of a dataset
#[derive(Debug)]
pub struct SplitData<T> {
    pub train: Vec<T>,
    pub valid: Vec<T>,
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub total_files_processed: usize,
    pub successful_conversions: usize,
    pub skipped_records: usize,
    pub skipped_missing_pair: usize,
    pub malformed_lines: usize,
    pub failed_conversions: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total(&mut self) {
        self.total_files_processed += 1;
    }

    pub fn increment_successful(&mut self) {
        self.successful_conversions += 1;
    }

    pub fn increment_skipped(&mut self) {
        self.skipped_records += 1;
    }

    pub fn increment_skipped_missing_pair(&mut self) {
        self.skipped_missing_pair += 1;
    }

    pub fn add_malformed(&mut self, count: usize) {
        self.malformed_lines += count;
    }

    pub fn increment_failed(&mut self) {
        self.failed_conversions += 1;
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Total files processed: {}", self.total_files_processed);
        log::info!("Successful conversions: {}", self.successful_conversions);
        log::info!("Skipped records: {}", self.skipped_records);
        log::info!(
            "Skipped (missing image or annotation): {}",
            self.skipped_missing_pair
        );
        log::info!("Failed conversions: {}", self.failed_conversions);

        if self.malformed_lines > 0 {
            log::warn!("Dropped {} malformed label lines", self.malformed_lines);
        }
    }
}
