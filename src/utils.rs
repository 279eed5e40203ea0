use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LabelError, Result};
use crate::types::ImageSize;

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Create an output directory, deleting any existing tree at that path first
pub fn create_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    if path.exists() {
        warn!(
            "Directory {:?} already exists. Deleting and recreating it.",
            path
        );
        fs::remove_dir_all(path).and_then(|_| fs::create_dir_all(path))?;
    } else {
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}

/// Files directly inside `dir` with one of the given extensions, sorted.
pub fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for ext in extensions {
        let pattern = format!("{}/*.{}", glob::Pattern::escape(&dir.to_string_lossy()), ext);
        files.extend(glob(&pattern)?.filter_map(|entry| entry.ok()));
    }
    files.sort();
    Ok(files)
}

/// Read the pixel dimensions of an image without decoding it fully.
pub fn read_image_size(path: &Path) -> Result<ImageSize> {
    let (width, height) = image::image_dimensions(path).map_err(|source| LabelError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImageSize::new(width, height))
}

/// File stem as an owned string, empty if the path has none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File name as an owned string, empty if the path has none.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
