//! Baseline store - committed ground-truth captures
//!
//! One directory per scenario under the baseline root. Only an explicit
//! promotion writes here; comparison never does. Files without a current
//! counterpart are left alone (stale baselines are cleaned up by hand).

use bevy::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::CAPTURE_EXTENSION;
use crate::error::HarnessError;
use crate::snapshot::RunManifest;

/// Read and promotion access to `<baseline-root>/<scenario>/`
#[derive(Debug, Clone)]
pub struct BaselineStore {
    root: PathBuf,
}

/// What a promotion did
#[derive(Debug, Clone, Default)]
pub struct UpdateSummary {
    pub scenario: String,
    /// Files copied from staging, in capture order
    pub updated: Vec<String>,
    /// The baseline directory did not exist before
    pub created_dir: bool,
    /// Baseline files with no counterpart in the promoted run (kept)
    pub stale: Vec<String>,
}

impl BaselineStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scenario_dir(&self, scenario: &str) -> PathBuf {
        self.root.join(scenario)
    }

    pub fn image_path(&self, scenario: &str, filename: &str) -> PathBuf {
        self.scenario_dir(scenario).join(filename)
    }

    pub fn has_scenario(&self, scenario: &str) -> bool {
        self.scenario_dir(scenario).is_dir()
    }

    /// Capture files stored for `scenario`; empty when the directory is missing
    pub fn list_images(&self, scenario: &str) -> Result<BTreeSet<String>, HarnessError> {
        list_capture_files(&self.scenario_dir(scenario))
    }

    /// Promote the completed staging run of `scenario` to baseline.
    ///
    /// Every capture listed in the run manifest overwrites its baseline file.
    /// Nothing is deleted. A missing or aborted staging run is an error.
    pub fn promote(&self, staging_root: &Path, scenario: &str) -> Result<UpdateSummary, HarnessError> {
        let staging_dir = staging_root.join(scenario);
        let manifest = RunManifest::load(&staging_dir)?.ok_or_else(|| HarnessError::MissingCaptures {
            scenario: scenario.to_string(),
            dir: staging_dir.clone(),
        })?;

        let target = self.scenario_dir(scenario);
        let created_dir = !target.is_dir();
        fs::create_dir_all(&target).map_err(|e| HarnessError::io(&target, e))?;

        for filename in &manifest.captures {
            let from = staging_dir.join(filename);
            let to = target.join(filename);
            // Copy then rename so a reader never sees a half-written baseline
            let partial = target.join(format!(".{}.partial", filename));
            fs::copy(&from, &partial).map_err(|e| HarnessError::io(&from, e))?;
            fs::rename(&partial, &to).map_err(|e| HarnessError::io(&to, e))?;
            debug!("Promoted {}/{}", scenario, filename);
        }

        let promoted: BTreeSet<&str> = manifest.captures.iter().map(String::as_str).collect();
        let stale: Vec<String> = list_capture_files(&target)?
            .into_iter()
            .filter(|f| !promoted.contains(f.as_str()))
            .collect();
        if !stale.is_empty() {
            warn!(
                "Baseline '{}' keeps {} file(s) not produced by this run: {}",
                scenario,
                stale.len(),
                stale.join(", ")
            );
        }

        Ok(UpdateSummary {
            scenario: scenario.to_string(),
            updated: manifest.captures,
            created_dir,
            stale,
        })
    }
}

/// `.png` files directly inside `dir`, sorted; empty when `dir` is missing
pub(crate) fn list_capture_files(dir: &Path) -> Result<BTreeSet<String>, HarnessError> {
    let mut files = BTreeSet::new();
    if !dir.is_dir() {
        return Ok(files);
    }

    let entries = fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(CAPTURE_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str())
            && !name.starts_with('.')
        {
            files.insert(name.to_string());
        }
    }
    Ok(files)
}
