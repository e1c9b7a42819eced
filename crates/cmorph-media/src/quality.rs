//! Alpha-coverage quality analysis for candidate stills.

use image::DynamicImage;
use std::path::Path;

use crate::error::{MediaError, MediaResult};

/// Alpha value a pixel must exceed to count as opaque foreground.
pub const OPAQUE_ALPHA: u8 = 128;

/// Fraction of an image's pixels that are opaque foreground.
///
/// Images without an alpha channel have no transparency signal and are
/// treated as fully covered (ratio 1.0). Returns `UnreadableImage` when
/// the file cannot be decoded.
pub fn foreground_ratio(path: impl AsRef<Path>) -> MediaResult<f32> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|_| MediaError::UnreadableImage(path.to_path_buf()))?;
    Ok(alpha_coverage(&img))
}

fn alpha_coverage(img: &DynamicImage) -> f32 {
    if !img.color().has_alpha() {
        return 1.0;
    }

    let rgba = img.to_rgba8();
    let total = rgba.width() as usize * rgba.height() as usize;
    if total == 0 {
        return 0.0;
    }

    let opaque = rgba.pixels().filter(|p| p.0[3] > OPAQUE_ALPHA).count();
    opaque as f32 / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn test_no_alpha_is_fully_covered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("opaque.png");
        RgbImage::from_pixel(4, 4, Rgb([200, 100, 50]))
            .save(&path)
            .unwrap();

        let ratio = foreground_ratio(&path).unwrap();
        assert!((ratio - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_alpha_coverage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.png");
        // 4 of 16 pixels opaque.
        let img = RgbaImage::from_fn(4, 4, |_, y| {
            if y == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([255, 255, 255, 0])
            }
        });
        img.save(&path).unwrap();

        let ratio = foreground_ratio(&path).unwrap();
        assert!((ratio - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_boundary_alpha_not_counted() {
        // Exactly 128 is not "exceeds 128".
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("boundary.png");
        RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, OPAQUE_ALPHA]))
            .save(&path)
            .unwrap();

        let ratio = foreground_ratio(&path).unwrap();
        assert_eq!(ratio, 0.0);
    }

    #[test]
    fn test_unreadable_image_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"not a png").unwrap();

        let err = foreground_ratio(&path).unwrap_err();
        assert!(matches!(err, MediaError::UnreadableImage(_)));
    }
}
