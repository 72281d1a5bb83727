// ============================================================
// Layer 6 - Image Panels
// ============================================================
// Turns a handful of float images into one grayscale strip and
// writes it as PNG for the tracker's media directory.
//
// Intensities are min-max scaled over the whole panel so that
// normalised inputs (roughly -0.4 .. 2.8) still render visibly.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use image::GrayImage;

use crate::domain::record::ImagePanel;

/// Lay out `images` (row-major `[count, height, width]`) side by side.
pub fn panel_from_images(
    images:  &[f32],
    height:  usize,
    width:   usize,
    caption: impl Into<String>,
) -> ImagePanel {
    let count = images.len() / (height * width);

    let (min, max) = images
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = if max > min { max - min } else { 1.0 };
    let min = if min.is_finite() { min } else { 0.0 };

    let panel_width = count * width;
    let mut pixels = vec![0u8; panel_width * height];

    for n in 0..count {
        for y in 0..height {
            for x in 0..width {
                let v = images[n * height * width + y * width + x];
                let scaled = if v.is_finite() { (v - min) / range * 255.0 } else { 0.0 };
                pixels[y * panel_width + n * width + x] = scaled.clamp(0.0, 255.0) as u8;
            }
        }
    }

    ImagePanel {
        caption: caption.into(),
        width:   panel_width as u32,
        height:  height as u32,
        pixels,
    }
}

/// Save a panel as an 8-bit grayscale PNG, creating parent directories.
pub fn write_png(panel: &ImagePanel, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let img = GrayImage::from_raw(panel.width, panel.height, panel.pixels.clone())
        .context("Image panel pixel buffer does not match its dimensions")?;

    img.save(path)
        .with_context(|| format!("Cannot write image '{}'", path.display()))?;
    Ok(())
}
