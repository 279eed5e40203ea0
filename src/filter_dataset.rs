use log::{debug, info, warn};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::formats::content_lines;
use crate::io::dataset_splits;
use crate::registry::{ClassFilter, FilteredLine};
use crate::types::ProcessingStats;
use crate::utils::{create_progress_bar, list_files};

/// Filter the lines of one YOLO label file, returning the new content.
pub fn filter_labels(
    name: &str,
    content: &str,
    filter: &ClassFilter,
    stats: &mut ProcessingStats,
) -> String {
    let mut kept = Vec::new();
    for (line_number, line) in content_lines(content) {
        match filter.filter_line(line) {
            FilteredLine::Kept(line) => kept.push(line),
            FilteredLine::Dropped => {}
            FilteredLine::Malformed => {
                warn!("Invalid format: {}:{}: {}", name, line_number, line);
                stats.add_malformed(1);
            }
        }
    }
    kept.join("\n")
}

/// Filter the label files of the `train`, `test` and `valid` splits in place.
pub fn process_filter_dataset(root: &Path, filter: &ClassFilter) -> Result<ProcessingStats> {
    let mut stats = ProcessingStats::new();

    for (split, dirs) in dataset_splits(root) {
        if !dirs.labels_dir.is_dir() {
            warn!(
                "Labels directory not found, skipping split {}: {}",
                split,
                dirs.labels_dir.display()
            );
            continue;
        }

        info!("Filtering split {}...", split);
        let label_files = list_files(&dirs.labels_dir, &["txt"])?;
        let pb = create_progress_bar(label_files.len() as u64, split);

        for label_path in &label_files {
            stats.increment_total();
            let content = fs::read_to_string(label_path)?;
            let name = label_path.display().to_string();
            let filtered = filter_labels(&name, &content, filter, &mut stats);
            fs::write(label_path, filtered)?;
            stats.increment_successful();
            debug!("Updated {}", name);
            pb.inc(1);
        }

        pb.finish_with_message(format!("{} processing complete", split));
    }

    Ok(stats)
}
