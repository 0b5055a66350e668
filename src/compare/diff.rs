//! Visual diff artifacts for differing captures

use image::{ImageFormat, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};

use super::strategy::{decode, pixel_differs};

/// Color marking a differing pixel
pub const DIFF_HIGHLIGHT: [u8; 4] = [255, 0, 255, 255];

/// Result of trying to produce a diff image
#[derive(Debug, Clone, PartialEq)]
pub enum DiffOutcome {
    Written(PathBuf),
    /// The verdict stands; only the visual artifact could not be made
    Unavailable(String),
}

/// Differing pixels in magenta over a dimmed grayscale copy of the baseline.
///
/// Returns `None` when the images have different sizes.
pub fn diff_image(current: &RgbaImage, baseline: &RgbaImage, tolerance: u8) -> Option<RgbaImage> {
    if current.dimensions() != baseline.dimensions() {
        return None;
    }

    let (width, height) = baseline.dimensions();
    Some(RgbaImage::from_fn(width, height, |x, y| {
        let b = baseline.get_pixel(x, y);
        if pixel_differs(current.get_pixel(x, y), b, tolerance) {
            Rgba(DIFF_HIGHLIGHT)
        } else {
            let luma = (b.0[0] as u32 * 299 + b.0[1] as u32 * 587 + b.0[2] as u32 * 114) / 1000;
            let dim = (luma / 3) as u8;
            Rgba([dim, dim, dim, 255])
        }
    }))
}

/// Write a diff for `current` vs `baseline` to `out`
pub fn write_diff(current: &Path, baseline: &Path, out: &Path, tolerance: u8) -> DiffOutcome {
    let load = |path: &Path| -> Result<RgbaImage, String> {
        let bytes = fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        decode(path, &bytes).map_err(|e| e.to_string())
    };

    let current_img = match load(current) {
        Ok(img) => img,
        Err(e) => return DiffOutcome::Unavailable(e),
    };
    let baseline_img = match load(baseline) {
        Ok(img) => img,
        Err(e) => return DiffOutcome::Unavailable(e),
    };

    let Some(diff) = diff_image(&current_img, &baseline_img, tolerance) else {
        return DiffOutcome::Unavailable(format!(
            "size changed from {}x{} to {}x{}",
            baseline_img.width(),
            baseline_img.height(),
            current_img.width(),
            current_img.height()
        ));
    };

    if let Some(parent) = out.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        return DiffOutcome::Unavailable(format!("{}: {}", parent.display(), e));
    }

    match diff.save_with_format(out, ImageFormat::Png) {
        Ok(()) => DiffOutcome::Written(out.to_path_buf()),
        Err(e) => DiffOutcome::Unavailable(format!("{}: {}", out.display(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_highlights_changed_pixels_only() {
        let base = RgbaImage::from_pixel(3, 3, Rgba([90, 90, 90, 255]));
        let mut current = base.clone();
        current.put_pixel(2, 1, Rgba([0, 0, 0, 255]));

        let diff = diff_image(&current, &base, 0).unwrap();
        assert_eq!(diff.get_pixel(2, 1).0, DIFF_HIGHLIGHT);
        assert_eq!(diff.get_pixel(0, 0).0, [30, 30, 30, 255]);
        assert_eq!(
            diff.pixels().filter(|p| p.0 == DIFF_HIGHLIGHT).count(),
            1
        );
    }

    #[test]
    fn test_unavailable_on_size_change_or_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        RgbaImage::new(2, 2).save_with_format(&a, ImageFormat::Png).unwrap();
        RgbaImage::new(3, 2).save_with_format(&b, ImageFormat::Png).unwrap();
        let out = dir.path().join("diff/a.png");

        assert!(matches!(write_diff(&a, &b, &out, 0), DiffOutcome::Unavailable(_)));
        assert!(!out.exists());

        let junk = dir.path().join("junk.png");
        fs::write(&junk, b"junk").unwrap();
        assert!(matches!(write_diff(&a, &junk, &out, 0), DiffOutcome::Unavailable(_)));
    }

    #[test]
    fn test_written_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]))
            .save_with_format(&a, ImageFormat::Png)
            .unwrap();
        RgbaImage::from_pixel(2, 2, Rgba([9, 2, 3, 255]))
            .save_with_format(&b, ImageFormat::Png)
            .unwrap();
        let out = dir.path().join("nested/diff/a.png");
        assert_eq!(write_diff(&a, &b, &out, 0), DiffOutcome::Written(out.clone()));
        assert!(out.is_file());
    }
}
