use log::{debug, info, warn};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::formats::{AnnotationFormat, Dota, ReadOutcome, Yolo};
use crate::io::dataset_splits;
use crate::registry::ClassRegistry;
use crate::types::{ImageSize, ProcessingStats, SplitDirs};
use crate::utils::{create_progress_bar, file_stem, list_files, read_image_size};

/// Convert the content of one DOTA label file into YOLO label content.
///
/// Returns `None` if the record was skipped. Malformed lines are dropped and
/// counted in `stats`.
pub fn convert_dota_labels(
    id: &str,
    content: &str,
    size: ImageSize,
    classes: &mut ClassRegistry,
    stats: &mut ProcessingStats,
) -> Result<Option<String>> {
    match Dota::read_record(id, content, Some(size), classes)? {
        ReadOutcome::Record { record, malformed } => {
            for line in &malformed {
                debug!("Ignoring line {} of {}: {}", line.line_number, id, line.content);
            }
            stats.add_malformed(malformed.len());
            Ok(Some(Yolo::write_record(&record, classes)?))
        }
        ReadOutcome::Skipped { reason } => {
            info!("{}", reason);
            Ok(None)
        }
    }
}

/// Convert every label file of one split in place.
fn process_split(
    split: &str,
    dirs: &SplitDirs,
    classes: &mut ClassRegistry,
    stats: &mut ProcessingStats,
) -> Result<()> {
    if !dirs.labels_dir.is_dir() {
        warn!(
            "Labels directory not found, skipping split {}: {}",
            split,
            dirs.labels_dir.display()
        );
        return Ok(());
    }

    let label_files = list_files(&dirs.labels_dir, &[Dota::EXTENSION])?;
    let pb = create_progress_bar(label_files.len() as u64, split);

    for label_path in &label_files {
        stats.increment_total();
        pb.inc(1);

        let stem = file_stem(label_path);
        let image_path = dirs.images_dir.join(&stem).with_extension("png");
        let size = match read_image_size(&image_path) {
            Ok(size) => size,
            Err(e) => {
                warn!("Cannot read image for {}: {}", label_path.display(), e);
                stats.increment_skipped_missing_pair();
                continue;
            }
        };

        let content = fs::read_to_string(label_path)?;
        match convert_dota_labels(&stem, &content, size, classes, stats)? {
            Some(yolo_content) => {
                fs::write(label_path, yolo_content)?;
                stats.increment_successful();
                debug!("Updated {}", label_path.display());
            }
            None => stats.increment_skipped(),
        }
    }

    pb.finish_with_message(format!("{} processing complete", split));
    Ok(())
}

/// Convert the `train`, `test` and `valid` splits of a DOTA dataset in place.
pub fn process_dota_dataset(root: &Path, classes: &mut ClassRegistry) -> Result<ProcessingStats> {
    let mut stats = ProcessingStats::new();
    for (split, dirs) in dataset_splits(root) {
        info!("Converting split {}...", split);
        process_split(split, &dirs, classes, &mut stats)?;
    }
    Ok(stats)
}
