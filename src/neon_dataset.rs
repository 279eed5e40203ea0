use log::{error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dataset::split_annotations;
use crate::error::{LabelError, Result};
use crate::formats::{AnnotationFormat, Neon, ReadOutcome, Yolo};
use crate::io::setup_output_directories;
use crate::registry::ClassRegistry;
use crate::types::{AnnotationRecord, ProcessingStats, SplitDirs, IMG_FORMATS};
use crate::utils::{create_progress_bar, file_name, file_stem, list_files};

/// An image file matched with its NEON annotation record.
#[derive(Debug, Clone)]
pub struct NeonPair {
    pub image_path: PathBuf,
    pub record: AnnotationRecord,
}

/// Read every annotation file in `annotations_dir` into a record keyed by
/// the image file name it declares.
///
/// Unparsable files and oversized images are logged and left out.
pub fn read_neon_annotations(
    annotations_dir: &Path,
    stats: &mut ProcessingStats,
) -> Result<Vec<AnnotationRecord>> {
    let mut classes = ClassRegistry::new();
    let mut records = Vec::new();
    for path in list_files(annotations_dir, &[Neon::EXTENSION])? {
        stats.increment_total();
        let content = fs::read_to_string(&path)?;
        match Neon::read_record(&file_stem(&path), &content, None, &mut classes) {
            Ok(ReadOutcome::Record { record, .. }) => records.push(record),
            Ok(ReadOutcome::Skipped { reason }) => {
                info!("{}", reason);
                stats.increment_skipped();
            }
            Err(e) => {
                error!("Failed to parse {}: {}", path.display(), e);
                stats.increment_failed();
            }
        }
    }
    Ok(records)
}

/// Match annotation records to images by file name.
///
/// Returns the pairs and the file names of annotations without an image.
pub fn pair_annotations(
    images: &[PathBuf],
    records: Vec<AnnotationRecord>,
) -> (Vec<NeonPair>, Vec<String>) {
    let by_name: HashMap<String, &PathBuf> =
        images.iter().map(|path| (file_name(path), path)).collect();

    let mut pairs = Vec::with_capacity(records.len());
    let mut missing = Vec::new();
    for record in records {
        match by_name.get(&record.id) {
            Some(image_path) => pairs.push(NeonPair {
                image_path: (*image_path).clone(),
                record,
            }),
            None => missing.push(record.id),
        }
    }
    (pairs, missing)
}

/// Write one pair as an RGB PNG plus YOLO labels.
///
/// Returns `false` when the decoded image size disagrees with the size
/// declared in the annotation; nothing is written in that case.
pub fn write_pair(pair: &NeonPair, dirs: &SplitDirs) -> Result<bool> {
    let image = image::open(&pair.image_path)
        .map_err(|source| LabelError::Image {
            path: pair.image_path.clone(),
            source,
        })?
        .to_rgb8();

    if image.dimensions() != (pair.record.size.width, pair.record.size.height) {
        return Ok(false);
    }

    let stem = file_stem(&pair.image_path);
    let image_output_path = dirs.images_dir.join(&stem).with_extension("png");
    image
        .save(&image_output_path)
        .map_err(|source| LabelError::Image {
            path: image_output_path.clone(),
            source,
        })?;

    let labels = Yolo::write_record(&pair.record, &ClassRegistry::new())?;
    fs::write(dirs.labels_dir.join(&stem).with_extension("txt"), labels)?;
    Ok(true)
}

fn write_split(
    label: &str,
    pairs: &[NeonPair],
    dirs: &SplitDirs,
    stats: &mut ProcessingStats,
) -> usize {
    let pb = create_progress_bar(pairs.len() as u64, label);
    let mut written = 0;
    for pair in pairs {
        pb.inc(1);
        match write_pair(pair, dirs) {
            Ok(true) => {
                written += 1;
                stats.increment_successful();
            }
            Ok(false) => {
                warn!("Width/height mismatch: {}", pair.record.id);
                stats.increment_skipped();
            }
            Err(e) => {
                error!("Failed to convert {}: {}", pair.image_path.display(), e);
                stats.increment_failed();
            }
        }
    }
    pb.finish_with_message(format!("{} processing complete", label));

    info!("Wrote {} ({} images)", dirs.images_dir.display(), written);
    info!("Wrote {} ({} annotations)", dirs.labels_dir.display(), written);
    written
}

/// Convert a NEON dataset into `<root>/output/{train,valid}`.
pub fn process_neon_dataset(root: &Path, split: f64, seed: Option<u64>) -> Result<ProcessingStats> {
    let mut stats = ProcessingStats::new();

    let images = list_files(&root.join("evaluation").join("RGB"), IMG_FORMATS)?;
    info!("Found {} images", images.len());

    let records = read_neon_annotations(&root.join("annotations"), &mut stats)?;
    info!("Found {} annotations", records.len());

    let (pairs, missing) = pair_annotations(&images, records);
    for filename in &missing {
        warn!("Cannot find {}", filename);
        stats.increment_skipped_missing_pair();
    }
    if pairs.len() == images.len() {
        info!("All annotations match");
    } else {
        warn!(
            "Skipped {} images, total: {}",
            images.len().saturating_sub(pairs.len()),
            pairs.len()
        );
    }

    let output_dirs = setup_output_directories(&root.join("output"))?;
    let split_data = split_annotations(pairs, split, seed);

    write_split("Train", &split_data.train, &output_dirs.train, &mut stats);
    write_split("Valid", &split_data.valid, &output_dirs.valid, &mut stats);

    Ok(stats)
}
