//! Harness error taxonomy

use std::fmt;
use std::path::{Path, PathBuf};

/// Error raised by a harness operation
#[derive(Debug)]
pub enum HarnessError {
    /// Malformed or out-of-order scenario descriptor (raised before any simulation work)
    InvalidScenario { scenario: String, reason: String },
    /// The driven simulation or renderer failed mid-run; no capture from the run is trusted
    SimulationFault {
        scenario: String,
        frame: u64,
        message: String,
    },
    /// No completed run exists in staging for the scenario
    MissingCaptures { scenario: String, dir: PathBuf },
    Io { path: PathBuf, source: std::io::Error },
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    Serialization { path: PathBuf, message: String },
}

impl HarnessError {
    pub fn invalid(scenario: &str, reason: impl Into<String>) -> Self {
        HarnessError::InvalidScenario {
            scenario: scenario.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Short machine-friendly label used in summaries
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::InvalidScenario { .. } => "InvalidScenario",
            HarnessError::SimulationFault { .. } => "SimulationFault",
            HarnessError::MissingCaptures { .. } => "MissingCaptures",
            HarnessError::Io { .. } => "Io",
            HarnessError::Image { .. } => "Image",
            HarnessError::Serialization { .. } => "Serialization",
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::InvalidScenario { scenario, reason } => {
                write!(f, "invalid scenario '{}': {}", scenario, reason)
            }
            HarnessError::SimulationFault {
                scenario,
                frame,
                message,
            } => write!(
                f,
                "simulation fault in '{}' at frame {}: {}",
                scenario, frame, message
            ),
            HarnessError::MissingCaptures { scenario, dir } => write!(
                f,
                "no completed run for '{}' in {} (run `run-tests {}` first)",
                scenario,
                dir.display(),
                scenario
            ),
            HarnessError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            HarnessError::Image { path, source } => write!(f, "{}: {}", path.display(), source),
            HarnessError::Serialization { path, message } => {
                write!(f, "{}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Io { source, .. } => Some(source),
            HarnessError::Image { source, .. } => Some(source),
            _ => None,
        }
    }
}
