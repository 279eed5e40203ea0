use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::registry::ClassRegistry;
use crate::types::{LabeledImage, SplitDirs, DATASET_SPLITS};
use crate::utils::{create_output_directory, file_stem};

// Struct to hold the paths to the output directories for train/valid splits
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub root: PathBuf,
    pub train: SplitDirs,
    pub valid: SplitDirs,
}

/// `images/` and `labels/` directories of a split under a dataset root.
pub fn split_dirs(root: &Path, split: &str) -> SplitDirs {
    SplitDirs {
        images_dir: root.join(split).join("images"),
        labels_dir: root.join(split).join("labels"),
    }
}

/// The standard `train`, `test`, `valid` splits of a dataset root.
pub fn dataset_splits(root: &Path) -> Vec<(&'static str, SplitDirs)> {
    DATASET_SPLITS
        .iter()
        .map(|split| (*split, split_dirs(root, split)))
        .collect()
}

/// Set up a fresh `train/` + `valid/` output tree, deleting any existing tree
pub fn setup_output_directories(output_root: &Path) -> std::io::Result<OutputDirs> {
    let root = create_output_directory(output_root)?;

    let train = split_dirs(&root, "train");
    let valid = split_dirs(&root, "valid");
    for dir in [
        &train.images_dir,
        &train.labels_dir,
        &valid.images_dir,
        &valid.labels_dir,
    ] {
        fs::create_dir_all(dir)?;
    }

    Ok(OutputDirs { root, train, valid })
}

/// Pair every image with `<labels_dir>/<image stem>.txt`.
///
/// Returns the pairs and the label paths that do not exist.
pub fn pair_images_with_labels(
    images: &[PathBuf],
    labels_dir: &Path,
) -> (Vec<LabeledImage>, Vec<PathBuf>) {
    let mut pairs = Vec::with_capacity(images.len());
    let mut missing = Vec::new();

    for image_path in images {
        let label_path = labels_dir.join(file_stem(image_path)).with_extension("txt");
        if label_path.is_file() {
            pairs.push(LabeledImage {
                image_path: image_path.clone(),
                label_path,
            });
        } else {
            missing.push(label_path);
        }
    }

    (pairs, missing)
}

/// Create the dataset.yaml file for YOLO training
pub fn create_dataset_yaml(root: &Path, classes: &ClassRegistry) -> std::io::Result<PathBuf> {
    let dataset_yaml_path = root.join("dataset.yaml");
    let mut dataset_yaml = BufWriter::new(File::create(&dataset_yaml_path)?);
    let absolute_path = fs::canonicalize(root)?;

    let mut yaml_content = format!("path: {}\n", absolute_path.to_string_lossy());
    for &split in DATASET_SPLITS {
        let key = if split == "valid" { "val" } else { split };
        if root.join(split).join("images").is_dir() {
            yaml_content.push_str(&format!("{}: {}/images\n", key, split));
        } else {
            yaml_content.push_str(&format!("{}:\n", key));
        }
    }
    yaml_content.push_str("\nnames:\n");
    for (name, id) in classes.mapping() {
        yaml_content.push_str(&format!("    {}: {}\n", id, name));
    }

    dataset_yaml.write_all(yaml_content.as_bytes())?;
    dataset_yaml.flush()?;
    Ok(dataset_yaml_path)
}
