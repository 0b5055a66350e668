//! Harness settings
//!
//! Loaded from `config/harness.toml` (built-in defaults when the file is
//! missing), then overridden by command-line flags shared by every binary.

use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use crate::constants::*;

/// Path to the settings file
pub const SETTINGS_FILE: &str = "config/harness.toml";

/// Where things live and how images are compared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessSettings {
    /// Directory searched (recursively) for scenario JSON files
    pub scenarios_dir: PathBuf,
    /// Committed ground truth, one subdirectory per scenario
    pub baseline_root: PathBuf,
    /// Ephemeral captures of the latest run
    pub staging_root: PathBuf,
    /// Where `report-bug` writes its records
    pub reports_dir: PathBuf,
    pub viewport: ViewportSettings,
    pub comparison: ComparisonSettings,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            scenarios_dir: PathBuf::from(DEFAULT_SCENARIOS_DIR),
            baseline_root: PathBuf::from(DEFAULT_BASELINE_ROOT),
            staging_root: PathBuf::from(DEFAULT_STAGING_ROOT),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            viewport: ViewportSettings::default(),
            comparison: ComparisonSettings::default(),
        }
    }
}

/// Sandbox output size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

/// Comparison strategy selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Files must be byte-identical
    #[default]
    ByteExact,
    /// Decoded pixels may differ within a tolerance
    Perceptual,
}

impl StrategyKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "byte-exact" | "exact" => Some(StrategyKind::ByteExact),
            "perceptual" => Some(StrategyKind::Perceptual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonSettings {
    pub strategy: StrategyKind,
    /// Perceptual: largest per-channel difference still counted as equal
    pub channel_tolerance: u8,
    /// Perceptual: largest fraction of differing pixels still counted as a match
    pub max_diff_ratio: f64,
    /// Write diff images for differing captures
    pub generate_diffs: bool,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::ByteExact,
            channel_tolerance: 0,
            max_diff_ratio: 0.0,
            generate_diffs: true,
        }
    }
}

/// Parsed command line: settings plus whatever positional arguments remain
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub settings: HarnessSettings,
    pub positional: Vec<String>,
    pub verbose: bool,
}

impl HarnessSettings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        toml::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }

    /// Load `config/harness.toml`, or return defaults if it doesn't exist
    pub fn load() -> Self {
        let path = Path::new(SETTINGS_FILE);
        if !path.exists() {
            debug!("No {} found, using defaults", SETTINGS_FILE);
            return Self::default();
        }

        match Self::from_file(path) {
            Ok(settings) => {
                debug!("Loaded settings from {}", SETTINGS_FILE);
                settings
            }
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Parse command line arguments (without the program name).
    ///
    /// `--settings <file>` replaces the base settings; the other flags
    /// override individual fields. Anything not starting with `-` is positional.
    pub fn from_args(args: &[String]) -> Result<CliArgs, String> {
        let mut settings = match args.iter().position(|a| a == "--settings") {
            Some(i) => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| "--settings needs a file path".to_string())?;
                Self::from_file(Path::new(path))?
            }
            None => Self::load(),
        };

        let mut positional = Vec::new();
        let mut verbose = false;

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            let mut value = || {
                i += 1;
                args.get(i)
                    .cloned()
                    .ok_or_else(|| format!("{} needs a value", arg))
            };

            match arg {
                "--settings" => {
                    value()?;
                }
                "--scenarios" => settings.scenarios_dir = PathBuf::from(value()?),
                "--baselines" => settings.baseline_root = PathBuf::from(value()?),
                "--staging" => settings.staging_root = PathBuf::from(value()?),
                "--reports" => settings.reports_dir = PathBuf::from(value()?),
                "--strategy" => {
                    let name = value()?;
                    settings.comparison.strategy = StrategyKind::parse(&name)
                        .ok_or_else(|| format!("unknown strategy '{}' (byte-exact|perceptual)", name))?;
                }
                "--tolerance" => {
                    let raw = value()?;
                    settings.comparison.channel_tolerance = raw
                        .parse()
                        .map_err(|_| format!("--tolerance expects 0-255, got '{}'", raw))?;
                }
                "--max-diff-ratio" => {
                    let raw = value()?;
                    let ratio: f64 = raw
                        .parse()
                        .map_err(|_| format!("--max-diff-ratio expects a number, got '{}'", raw))?;
                    if !(0.0..=1.0).contains(&ratio) {
                        return Err(format!("--max-diff-ratio must be within 0..1, got {}", ratio));
                    }
                    settings.comparison.max_diff_ratio = ratio;
                }
                "--no-diff" => settings.comparison.generate_diffs = false,
                "--verbose" | "-v" => verbose = true,
                other if other.starts_with('-') => {
                    return Err(format!("unknown flag '{}'", other));
                }
                other => positional.push(other.to_string()),
            }
            i += 1;
        }

        Ok(CliArgs {
            settings,
            positional,
            verbose,
        })
    }
}

static LOGGING: Once = Once::new();

/// Route `info!`/`warn!` output to stderr for the command-line tools.
///
/// `LogPlugin` installs the process-global tracing subscriber while it is
/// added, so a bare `App` is enough; the subscriber outlives it. Only the
/// first call takes effect.
pub fn init_logging(verbose: bool) {
    LOGGING.call_once(|| {
        let mut app = App::new();
        app.add_plugins(LogPlugin {
            level: if verbose { Level::DEBUG } else { Level::WARN },
            ..default()
        });
    });
}
