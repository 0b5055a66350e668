//! JSON scenario file parsing and validation

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{CAMERA_MAX_ZOOM, CAMERA_MIN_ZOOM, CAPTURE_EXTENSION, MAX_SCENARIO_FRAME};
use crate::error::HarnessError;

use super::keys::{parse_button, parse_key};

/// Complete scenario definition from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub seed: u64,
    /// Strip overlay (HUD, debug panels) from captures
    #[serde(default)]
    pub test_mode: bool,
    /// Camera applied before the first event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraSetup>,
    #[serde(default)]
    pub events: Vec<EventDef>,
}

/// Initial camera placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSetup {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_zoom")]
    pub zoom: f32,
}

fn default_zoom() -> f32 {
    1.0
}

/// One scripted event as written in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub frame: u64,
    #[serde(flatten)]
    pub action: EventAction,
}

/// Event payload, distinguished by which field is present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventAction {
    Key { key: String, action: KeyDirection },
    Click { click: ClickDef },
    Capture { capture: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDirection {
    Down,
    Up,
    /// Down and up on the same frame
    Press,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickDef {
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_button")]
    pub button: String,
}

fn default_button() -> String {
    "left".to_string()
}

/// Event with names resolved, ready for replay
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub frame: u64,
    pub kind: ScheduledKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledKind {
    Key {
        key: KeyCode,
        direction: KeyDirection,
    },
    Click {
        x: i32,
        y: i32,
        button: MouseButton,
    },
    Capture {
        filename: String,
    },
}

impl Scenario {
    /// Validate the descriptor and resolve key/button names.
    ///
    /// Rejects decreasing frame indices, duplicate or malformed capture names,
    /// unknown keys or buttons, and an unusable camera zoom.
    pub fn schedule(&self) -> Result<Vec<ScheduledEvent>, HarnessError> {
        validate_scenario_name(&self.name)?;

        if let Some(camera) = &self.camera
            && !(camera.x.is_finite() && camera.y.is_finite())
        {
            return Err(HarnessError::invalid(&self.name, "camera position must be finite"));
        }
        if let Some(camera) = &self.camera
            && !(CAMERA_MIN_ZOOM..=CAMERA_MAX_ZOOM).contains(&camera.zoom)
        {
            return Err(HarnessError::invalid(
                &self.name,
                format!(
                    "camera zoom must be within {}..={}, got {}",
                    CAMERA_MIN_ZOOM, CAMERA_MAX_ZOOM, camera.zoom
                ),
            ));
        }

        let mut scheduled = Vec::with_capacity(self.events.len());
        let mut captures: HashSet<&str> = HashSet::new();
        let mut prev_frame = 0u64;

        for (i, event) in self.events.iter().enumerate() {
            if event.frame < prev_frame {
                return Err(HarnessError::invalid(
                    &self.name,
                    format!(
                        "event #{} at frame {} comes after frame {}; events must be in non-decreasing frame order",
                        i + 1,
                        event.frame,
                        prev_frame
                    ),
                ));
            }
            if event.frame > MAX_SCENARIO_FRAME {
                return Err(HarnessError::invalid(
                    &self.name,
                    format!(
                        "event #{} at frame {} is past the last allowed frame {}",
                        i + 1,
                        event.frame,
                        MAX_SCENARIO_FRAME
                    ),
                ));
            }
            prev_frame = event.frame;

            let kind = match &event.action {
                EventAction::Key { key, action } => {
                    let code = parse_key(key).ok_or_else(|| {
                        HarnessError::invalid(
                            &self.name,
                            format!("event #{}: unknown key '{}'", i + 1, key),
                        )
                    })?;
                    ScheduledKind::Key {
                        key: code,
                        direction: *action,
                    }
                }
                EventAction::Click { click } => {
                    let button = parse_button(&click.button).ok_or_else(|| {
                        HarnessError::invalid(
                            &self.name,
                            format!("event #{}: unknown mouse button '{}'", i + 1, click.button),
                        )
                    })?;
                    ScheduledKind::Click {
                        x: click.x,
                        y: click.y,
                        button,
                    }
                }
                EventAction::Capture { capture } => {
                    validate_capture_name(&self.name, capture)?;
                    if !captures.insert(capture.as_str()) {
                        return Err(HarnessError::invalid(
                            &self.name,
                            format!("capture filename '{}' used more than once", capture),
                        ));
                    }
                    ScheduledKind::Capture {
                        filename: capture.clone(),
                    }
                }
            };

            scheduled.push(ScheduledEvent {
                frame: event.frame,
                kind,
            });
        }

        Ok(scheduled)
    }

    /// Capture filenames in declaration order
    pub fn capture_names(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match &e.action {
                EventAction::Capture { capture } => Some(capture.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Highest frame referenced by any event
    pub fn last_frame(&self) -> Option<u64> {
        self.events.iter().map(|e| e.frame).max()
    }
}

/// Scenario names double as directory names, so they must be a single path component
pub fn validate_scenario_name(name: &str) -> Result<(), HarnessError> {
    if !is_plain_file_name(name) {
        return Err(HarnessError::invalid(
            name,
            "scenario name must be a non-empty name without path separators",
        ));
    }
    Ok(())
}

fn validate_capture_name(scenario: &str, filename: &str) -> Result<(), HarnessError> {
    if !is_plain_file_name(filename) || filename.starts_with('.') {
        return Err(HarnessError::invalid(
            scenario,
            format!("capture filename '{}' must be a plain file name", filename),
        ));
    }
    let has_png_extension = Path::new(filename)
        .extension()
        .map(|e| e == CAPTURE_EXTENSION)
        .unwrap_or(false);
    if !has_png_extension {
        return Err(HarnessError::invalid(
            scenario,
            format!("capture filename '{}' must end in .{}", filename, CAPTURE_EXTENSION),
        ));
    }
    Ok(())
}

pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}

/// Parse a scenario file from path
pub fn parse_scenario_file(path: &Path) -> Result<Scenario, HarnessError> {
    let label = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let content = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;

    serde_json::from_str(&content).map_err(|e| {
        HarnessError::invalid(&label, format!("failed to parse {}: {}", path.display(), e))
    })
}

/// Find all `.json` scenario files below `base`, sorted by path
pub fn discover_scenario_files(base: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    discover_recursive(base, &mut files);
    files.sort();
    files
}

fn discover_recursive(current: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(current) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            discover_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

/// A scenario file together with its parse outcome
#[derive(Debug)]
pub struct LoadedScenario {
    pub path: PathBuf,
    /// Scenario name, or the file stem when the file could not be parsed
    pub name: String,
    pub scenario: Result<Scenario, HarnessError>,
}

/// Load every scenario below `base`, optionally keeping only the one named `filter`.
///
/// A second file declaring an already-seen name is reported as invalid.
pub fn load_scenarios(base: &Path, filter: Option<&str>) -> Vec<LoadedScenario> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut loaded = Vec::new();

    for path in discover_scenario_files(base) {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut scenario = parse_scenario_file(&path);
        let name = match &scenario {
            Ok(s) => s.name.clone(),
            Err(_) => stem,
        };

        if let Some(f) = filter
            && f != name
        {
            continue;
        }

        if scenario.is_ok() && !seen.insert(name.clone()) {
            scenario = Err(HarnessError::invalid(
                &name,
                format!("name already declared by another file ({})", path.display()),
            ));
        }

        loaded.push(LoadedScenario {
            path,
            name,
            scenario,
        });
    }

    loaded
}
