//! Tunable constants for the harness and the sandbox simulation
//!
//! Directory defaults, frame timing and sandbox look-and-feel live here.

use bevy::prelude::*;

// =============================================================================
// DIRECTORY DEFAULTS (overridable via config/harness.toml or CLI flags)
// =============================================================================

pub const DEFAULT_SCENARIOS_DIR: &str = "tests/scenarios";
pub const DEFAULT_BASELINE_ROOT: &str = "tests/baselines";
pub const DEFAULT_STAGING_ROOT: &str = "target/visreg/current";
pub const DEFAULT_REPORTS_DIR: &str = "bug_reports";

/// Name of the diff artifact subdirectory inside a staging scenario directory
pub const DIFF_DIR_NAME: &str = "diff";

/// Completion record written after a successful run
pub const MANIFEST_FILE: &str = "manifest.json";

/// Extension every capture file must carry
pub const CAPTURE_EXTENSION: &str = "png";

// =============================================================================
// FRAME TIMING
// =============================================================================

/// Extra frames stepped after the last scripted event
pub const SETTLE_FRAMES: u64 = 1;

/// Highest frame index a scenario event may use (about 4.6 hours at 60 steps/s)
pub const MAX_SCENARIO_FRAME: u64 = 1_000_000;

/// Fixed simulation timestep (never derived from wall-clock time)
pub const SIM_DT: f32 = 1.0 / 60.0;

// =============================================================================
// VIEWPORT
// =============================================================================

pub const DEFAULT_VIEWPORT_WIDTH: u32 = 320;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 240;

// =============================================================================
// SANDBOX CAMERA
// =============================================================================

/// World units the camera travels per step while a pan key is held
pub const CAMERA_PAN_PER_STEP: f32 = 4.0;
/// Multiplicative zoom change per step while a zoom key is held
pub const CAMERA_ZOOM_PER_STEP: f32 = 1.02;
pub const CAMERA_MIN_ZOOM: f32 = 0.1;
pub const CAMERA_MAX_ZOOM: f32 = 10.0;

// =============================================================================
// SANDBOX WORLD
// =============================================================================

/// Half extent of the square region scenery is scattered over
pub const WORLD_HALF_EXTENT: f32 = 600.0;
pub const SCENERY_COUNT: usize = 48;
pub const SCENERY_MIN_SIZE: f32 = 8.0;
pub const SCENERY_MAX_SIZE: f32 = 40.0;
pub const DRIFTER_COUNT: usize = 4;
pub const DRIFTER_SIZE: Vec2 = Vec2::new(12.0, 12.0);
pub const DRIFTER_MAX_SPEED: f32 = 90.0;
pub const CLICK_MARKER_SIZE: Vec2 = Vec2::new(10.0, 10.0);
pub const GRID_SPACING: f32 = 100.0;
pub const GRID_LINE_WIDTH: f32 = 2.0;

pub const BACKGROUND_COLOR: [u8; 4] = [24, 26, 32, 255];
pub const GRID_COLOR: [u8; 4] = [40, 44, 54, 255];
pub const ORIGIN_COLOR: [u8; 4] = [200, 60, 60, 255];
pub const DRIFTER_COLOR: [u8; 4] = [240, 200, 80, 255];
pub const MARKER_LEFT_COLOR: [u8; 4] = [90, 200, 255, 255];
pub const MARKER_RIGHT_COLOR: [u8; 4] = [255, 120, 200, 255];
pub const MARKER_MIDDLE_COLOR: [u8; 4] = [140, 255, 140, 255];

// =============================================================================
// HUD OVERLAY (never deterministic across machines: stripped in test mode)
// =============================================================================

pub const HUD_PANEL_COLOR: [u8; 4] = [0, 0, 0, 255];
pub const HUD_TEXT_COLOR: [u8; 4] = [250, 250, 250, 255];
pub const HUD_FPS_COLOR: [u8; 4] = [80, 255, 80, 255];
pub const DEBUG_PANEL_COLOR: [u8; 4] = [60, 20, 90, 255];
/// Size of one cell in the HUD's bitmap digits
pub const HUD_DIGIT_CELL: u32 = 2;
pub const HUD_MARGIN: i32 = 4;
