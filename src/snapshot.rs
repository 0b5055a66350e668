//! Frame capture sink - turns rendered frames into PNG files
//!
//! Captures are written to the scenario's staging directory as the replay
//! runs. A run manifest is written only once the whole scenario completed, so
//! a directory without one is an aborted run.

use bevy::prelude::*;
use chrono::Local;
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::MANIFEST_FILE;
use crate::error::HarnessError;
use crate::simulation::{Frame, RenderLayer};

/// Images produced by one run of one scenario
#[derive(Debug, Clone, Default)]
pub struct CaptureSet {
    pub scenario: String,
    /// Staging directory holding the files
    pub dir: PathBuf,
    /// Capture filename -> written file
    pub files: BTreeMap<String, PathBuf>,
}

impl CaptureSet {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Completion record for a staging run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub scenario: String,
    pub seed: u64,
    pub test_mode: bool,
    /// Steps executed
    pub frames: u64,
    /// Capture filenames in the order they were taken
    pub captures: Vec<String>,
    pub completed_at: String,
}

impl RunManifest {
    pub fn new(scenario: &str, seed: u64, test_mode: bool, frames: u64, captures: Vec<String>) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            test_mode,
            frames,
            captures,
            completed_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Save into a staging scenario directory
    pub fn write(&self, dir: &Path) -> Result<(), HarnessError> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| HarnessError::Serialization {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&path, json).map_err(|e| HarnessError::io(&path, e))
    }

    /// Load from a staging scenario directory; `None` when no completed run is recorded
    pub fn load(dir: &Path) -> Result<Option<Self>, HarnessError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| HarnessError::io(&path, e))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| HarnessError::Serialization {
                path,
                message: e.to_string(),
            })
    }
}

/// Rasterize a display list; in test mode overlay elements are left out
pub fn rasterize(frame: &Frame, test_mode: bool) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(frame.width, frame.height, Rgba(frame.background));

    for element in &frame.elements {
        if test_mode && element.layer == RenderLayer::Overlay {
            continue;
        }
        if element.width == 0 || element.height == 0 {
            continue;
        }
        draw_filled_rect_mut(
            &mut image,
            Rect::at(element.x, element.y).of_size(element.width, element.height),
            Rgba(element.color),
        );
    }

    image
}

/// Writes captures for one scenario run into `<staging-root>/<scenario>/`
pub struct CaptureSink {
    scenario: String,
    dir: PathBuf,
    test_mode: bool,
    written: BTreeMap<String, PathBuf>,
    order: Vec<String>,
}

impl CaptureSink {
    pub fn new(staging_root: &Path, scenario: &str, test_mode: bool) -> Self {
        Self {
            scenario: scenario.to_string(),
            dir: staging_root.join(scenario),
            test_mode,
            written: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Start from an empty staging directory, dropping any earlier run
    pub fn prepare(&mut self) -> Result<(), HarnessError> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).map_err(|e| HarnessError::io(&self.dir, e))?;
        }
        fs::create_dir_all(&self.dir).map_err(|e| HarnessError::io(&self.dir, e))?;
        self.written.clear();
        self.order.clear();
        Ok(())
    }

    /// Rasterize `frame` and save it losslessly as `filename`
    pub fn capture(&mut self, frame: &Frame, filename: &str) -> Result<PathBuf, HarnessError> {
        let image = rasterize(frame, self.test_mode);
        let path = self.dir.join(filename);
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| HarnessError::Image {
                path: path.clone(),
                source: e,
            })?;

        debug!("Captured {}/{}", self.scenario, filename);
        self.written.insert(filename.to_string(), path.clone());
        self.order.push(filename.to_string());
        Ok(path)
    }

    /// Remove everything this run wrote; partial runs are never compared or promoted
    pub fn discard(&mut self) {
        if self.dir.exists()
            && let Err(e) = fs::remove_dir_all(&self.dir)
        {
            warn!("Failed to discard partial captures in {}: {}", self.dir.display(), e);
        }
        self.written.clear();
        self.order.clear();
    }

    /// Record completion and hand over the capture set
    pub fn finish(self, seed: u64, frames: u64) -> Result<CaptureSet, HarnessError> {
        RunManifest::new(&self.scenario, seed, self.test_mode, frames, self.order).write(&self.dir)?;
        Ok(CaptureSet {
            scenario: self.scenario,
            dir: self.dir,
            files: self.written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERLAY: [u8; 4] = [255, 0, 255, 255];
    const WORLD: [u8; 4] = [0, 128, 0, 255];

    fn frame_with_overlay() -> Frame {
        let mut frame = Frame::new(16, 16, [0, 0, 0, 255]);
        frame.push(RenderLayer::World, 2, 2, 8, 8, WORLD);
        frame.push(RenderLayer::Overlay, 0, 0, 4, 4, OVERLAY);
        frame.push(RenderLayer::Overlay, 12, 12, 10, 10, OVERLAY);
        frame
    }

    #[test]
    fn test_rasterize_draws_and_clips() {
        let image = rasterize(&frame_with_overlay(), false);
        assert_eq!(image.get_pixel(0, 0).0, OVERLAY);
        assert_eq!(image.get_pixel(15, 15).0, OVERLAY);
        assert_eq!(image.get_pixel(5, 5).0, WORLD);
        assert_eq!(image.get_pixel(11, 3).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_test_mode_strips_overlay_pixels() {
        let image = rasterize(&frame_with_overlay(), true);
        assert!(image.pixels().all(|p| p.0 != OVERLAY));
        // World content under the stripped overlay is still drawn
        assert_eq!(image.get_pixel(3, 3).0, WORLD);
    }

    #[test]
    fn test_capture_writes_png_and_manifest() {
        let staging = tempfile::tempdir().unwrap();
        let mut sink = CaptureSink::new(staging.path(), "scene", true);
        sink.prepare().unwrap();
        let path = sink.capture(&frame_with_overlay(), "a.png").unwrap();
        assert_eq!(path, staging.path().join("scene/a.png"));

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded, rasterize(&frame_with_overlay(), true));

        let set = sink.finish(7, 3).unwrap();
        assert_eq!(set.len(), 1);
        let manifest = RunManifest::load(&set.dir).unwrap().unwrap();
        assert_eq!(manifest.captures, vec!["a.png".to_string()]);
        assert_eq!(manifest.seed, 7);
        assert!(manifest.test_mode);
    }

    #[test]
    fn test_prepare_clears_previous_run() {
        let staging = tempfile::tempdir().unwrap();
        let dir = staging.path().join("scene");
        fs::create_dir_all(dir.join("diff")).unwrap();
        fs::write(dir.join("stale.png"), b"old").unwrap();
        fs::write(dir.join(MANIFEST_FILE), b"{}").unwrap();

        let mut sink = CaptureSink::new(staging.path(), "scene", false);
        sink.prepare().unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_discard_removes_partial_run() {
        let staging = tempfile::tempdir().unwrap();
        let mut sink = CaptureSink::new(staging.path(), "scene", false);
        sink.prepare().unwrap();
        sink.capture(&frame_with_overlay(), "a.png").unwrap();
        sink.discard();
        assert!(!staging.path().join("scene").exists());
        assert_eq!(RunManifest::load(&staging.path().join("scene")).unwrap(), None);
    }
}
