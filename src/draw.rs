//! Draw YOLO boxes onto their images for visual inspection.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::conversion::{denormalize, YoloLabel};
use crate::error::{LabelError, Result};
use crate::formats::yolo::parse_labels;
use crate::io::pair_images_with_labels;
use crate::types::{Corners, LabeledImage, ProcessingStats, IMG_FORMATS};
use crate::utils::{file_name, list_files};

pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const BOX_THICKNESS: u32 = 4;

// 3x5 glyphs for the digits 0-9, one row per byte, most significant bit left
const DIGIT_GLYPHS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];
const GLYPH_SCALE: i32 = 2;
const TEXT_OFFSET: i32 = 10;

/// Images to draw and the labels directory they pair with.
#[derive(Debug, Clone)]
pub struct DrawInputs {
    pub images: Vec<PathBuf>,
    pub labels_dir: PathBuf,
}

/// Resolve an image path or a split directory into images and labels.
///
/// A single image pairs with `<image dir>/../labels`, a directory with its
/// own `images/` and `labels/`. A missing labels directory is an error.
pub fn resolve_inputs(input: &Path) -> Result<DrawInputs> {
    let (images, labels_dir) = if input.is_file() {
        let image_dir = input.parent().unwrap_or_else(|| Path::new("."));
        (vec![input.to_path_buf()], image_dir.join("..").join("labels"))
    } else if input.is_dir() {
        (
            list_files(&input.join("images"), IMG_FORMATS)?,
            input.join("labels"),
        )
    } else {
        (Vec::new(), input.join("labels"))
    };

    if !labels_dir.is_dir() {
        return Err(LabelError::MissingDirectory(labels_dir));
    }

    Ok(DrawInputs {
        images,
        labels_dir: fs::canonicalize(&labels_dir)?,
    })
}

/// Output directory next to the labels directory.
pub fn output_dir_for(labels_dir: &Path) -> PathBuf {
    labels_dir
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("draw_output")
}

fn draw_outline(image: &mut RgbImage, corners: &Corners, color: Rgb<u8>) {
    let x = corners.xmin.round() as i32;
    let y = corners.ymin.round() as i32;
    let width = corners.width().round() as i64;
    let height = corners.height().round() as i64;

    // Outline grows inwards from the box edge
    for inset in 0..BOX_THICKNESS as i64 {
        let w = width - 2 * inset;
        let h = height - 2 * inset;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(x + inset as i32, y + inset as i32).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}

/// Draw the decimal digits of `class_id` with the top-left corner at `(x, y)`.
fn draw_class_id(image: &mut RgbImage, x: i32, y: i32, class_id: usize, color: Rgb<u8>) {
    let glyph_width = 3 * GLYPH_SCALE + GLYPH_SCALE;
    for (pos, digit) in class_id.to_string().bytes().enumerate() {
        let glyph = &DIGIT_GLYPHS[(digit - b'0') as usize];
        let origin_x = x + pos as i32 * glyph_width;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let rect = Rect::at(
                    origin_x + col * GLYPH_SCALE,
                    y + row as i32 * GLYPH_SCALE,
                )
                .of_size(GLYPH_SCALE as u32, GLYPH_SCALE as u32);
                draw_filled_rect_mut(image, rect, color);
            }
        }
    }
}

/// Draw every label onto `image` with its class id above the box.
pub fn draw_labels(image: &mut RgbImage, labels: &[YoloLabel]) {
    let (width, height) = (image.width() as f64, image.height() as f64);
    for label in labels {
        let corners = denormalize(&label.bbox, width, height);
        draw_outline(image, &corners, BOX_COLOR);
        draw_class_id(
            image,
            corners.xmin.round() as i32,
            (corners.ymin.round() as i32 - TEXT_OFFSET).max(0),
            label.class_id,
            BOX_COLOR,
        );
    }
}

/// Draw the labels of one pair and save the result into `output_dir`.
pub fn draw_pair(pair: &LabeledImage, output_dir: &Path) -> Result<PathBuf> {
    let mut image = image::open(&pair.image_path)
        .map_err(|source| LabelError::Image {
            path: pair.image_path.clone(),
            source,
        })?
        .to_rgb8();

    let content = fs::read_to_string(&pair.label_path)?;
    let (labels, malformed) = parse_labels(&content);
    for line in &malformed {
        warn!(
            "Invalid format: {}: {}",
            file_name(&pair.label_path),
            line.content
        );
    }

    draw_labels(&mut image, &labels);

    let output_path = output_dir.join(file_name(&pair.image_path));
    image
        .save(&output_path)
        .map_err(|source| LabelError::Image {
            path: output_path.clone(),
            source,
        })?;
    Ok(output_path)
}

/// Draw every image found for `input`, returning the output directory.
pub fn process_draw(input: &Path) -> Result<(PathBuf, ProcessingStats)> {
    let DrawInputs { images, labels_dir } = resolve_inputs(input)?;
    info!("Found {} images", images.len());

    let mut stats = ProcessingStats::new();
    let (pairs, missing) = pair_images_with_labels(&images, &labels_dir);
    for label_path in &missing {
        warn!("Cannot find {}", label_path.display());
        stats.increment_skipped_missing_pair();
    }
    if pairs.len() == images.len() {
        info!("All annotations match");
    } else {
        warn!("Skipped {} images", images.len() - pairs.len());
    }

    let output_dir = output_dir_for(&labels_dir);
    fs::create_dir_all(&output_dir)?;

    for pair in &pairs {
        stats.increment_total();
        match draw_pair(pair, &output_dir) {
            Ok(_) => stats.increment_successful(),
            Err(e) => {
                warn!("Failed to draw {}: {}", pair.image_path.display(), e);
                stats.increment_failed();
            }
        }
    }

    info!("Wrote images to {}", output_dir.display());
    Ok((output_dir, stats))
}
