//! 8-bit image export for result artifacts.
//!
//! Normalized float frames are quantized to 8-bit and written through the
//! `image` crate; the output format follows the file extension (.png, .jpg,
//! .tiff). Export is presentation-only: quantization is lossy and nothing
//! here reads images back into the pipeline.

use std::path::Path;

use image::{ImageBuffer, Luma, Rgb};
use ndarray::{Array2, Array3, ArrayView2};
use thiserror::Error;

use crate::composite::Comparison;

/// Export failures.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Encoding or file I/O failed in the image backend.
    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),

    /// The color frame did not have three channels in the last axis.
    #[error("expected a (rows, cols, 3) color frame, got {0:?}")]
    NotColor((usize, usize, usize)),
}

/// Quantize a normalized frame to 8-bit.
///
/// Values are clamped to [0, 1] first, then mapped linearly so 1.0 becomes
/// 255. Rounding is to nearest.
pub fn quantize(image: &ArrayView2<f32>) -> Array2<u8> {
    image.mapv(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Save a normalized grayscale frame as an 8-bit image file.
pub fn save_grayscale<P: AsRef<Path>>(image: &ArrayView2<f32>, path: P) -> Result<(), ExportError> {
    let quantized = quantize(image);
    let (rows, cols) = quantized.dim();

    let mut buffer = ImageBuffer::new(cols as u32, rows as u32);
    for (x, y, pixel) in buffer.enumerate_pixels_mut() {
        *pixel = Luma([quantized[[y as usize, x as usize]]]);
    }
    buffer.save(path)?;
    Ok(())
}

/// Save a normalized channel-last color frame as an 8-bit RGB image file.
pub fn save_color<P: AsRef<Path>>(planes: &Array3<f32>, path: P) -> Result<(), ExportError> {
    let (rows, cols, channels) = planes.dim();
    if channels != 3 {
        return Err(ExportError::NotColor(planes.dim()));
    }

    let mut buffer = ImageBuffer::new(cols as u32, rows as u32);
    for (x, y, pixel) in buffer.enumerate_pixels_mut() {
        let i = y as usize;
        let j = x as usize;
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        *pixel = Rgb([
            to_u8(planes[[i, j, 0]]),
            to_u8(planes[[i, j, 1]]),
            to_u8(planes[[i, j, 2]]),
        ]);
    }
    buffer.save(path)?;
    Ok(())
}

/// Write a comparison triple as `<stem>_before`, `<stem>_after`, and
/// `<stem>_diff` PNG files in `dir`.
pub fn save_comparison(
    comparison: &Comparison,
    dir: &Path,
    stem: &str,
) -> Result<(), ExportError> {
    save_grayscale(&comparison.before.view(), dir.join(format!("{stem}_before.png")))?;
    save_grayscale(&comparison.after.view(), dir.join(format!("{stem}_after.png")))?;
    save_grayscale(
        &comparison.difference.view(),
        dir.join(format!("{stem}_diff.png")),
    )?;
    Ok(())
}
