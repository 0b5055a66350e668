//! Image equality strategies

use image::RgbaImage;
use std::fs;
use std::path::Path;

use crate::error::HarnessError;
use crate::settings::{ComparisonSettings, StrategyKind};

/// How a capture is judged equal to its baseline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareStrategy {
    /// Files must be byte-identical
    ByteExact,
    /// Decoded pixels may differ by up to `channel_tolerance` per channel, and
    /// up to `max_diff_ratio` of all pixels may exceed that
    Perceptual {
        channel_tolerance: u8,
        max_diff_ratio: f64,
    },
}

impl CompareStrategy {
    pub fn from_settings(settings: &ComparisonSettings) -> Self {
        match settings.strategy {
            StrategyKind::ByteExact => CompareStrategy::ByteExact,
            StrategyKind::Perceptual => CompareStrategy::Perceptual {
                channel_tolerance: settings.channel_tolerance,
                max_diff_ratio: settings.max_diff_ratio,
            },
        }
    }

    /// Per-channel tolerance used when highlighting differences
    pub fn channel_tolerance(&self) -> u8 {
        match self {
            CompareStrategy::ByteExact => 0,
            CompareStrategy::Perceptual {
                channel_tolerance, ..
            } => *channel_tolerance,
        }
    }

    /// Decide whether `current` matches `baseline`
    pub fn matches(&self, current: &Path, baseline: &Path) -> Result<bool, HarnessError> {
        let current_bytes = fs::read(current).map_err(|e| HarnessError::io(current, e))?;
        let baseline_bytes = fs::read(baseline).map_err(|e| HarnessError::io(baseline, e))?;

        if current_bytes == baseline_bytes {
            return Ok(true);
        }

        match self {
            CompareStrategy::ByteExact => Ok(false),
            CompareStrategy::Perceptual {
                channel_tolerance,
                max_diff_ratio,
            } => {
                let a = decode(current, &current_bytes)?;
                let b = decode(baseline, &baseline_bytes)?;
                Ok(match count_differing_pixels(&a, &b, *channel_tolerance) {
                    Some(differing) => {
                        let total = (a.width() as u64 * a.height() as u64).max(1);
                        differing as f64 / total as f64 <= *max_diff_ratio
                    }
                    None => false,
                })
            }
        }
    }
}

pub(crate) fn decode(path: &Path, bytes: &[u8]) -> Result<RgbaImage, HarnessError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| HarnessError::Image {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Whether two pixels differ by more than `tolerance` on any channel
pub fn pixel_differs(a: &image::Rgba<u8>, b: &image::Rgba<u8>, tolerance: u8) -> bool {
    a.0.iter()
        .zip(b.0.iter())
        .any(|(x, y)| x.abs_diff(*y) > tolerance)
}

/// Number of differing pixels, or `None` when the sizes differ
pub fn count_differing_pixels(a: &RgbaImage, b: &RgbaImage, tolerance: u8) -> Option<u64> {
    if a.dimensions() != b.dimensions() {
        return None;
    }
    Some(
        a.pixels()
            .zip(b.pixels())
            .filter(|(pa, pb)| pixel_differs(pa, pb, tolerance))
            .count() as u64,
    )
}
