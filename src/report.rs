//! Regression report generator
//!
//! Turns a detected mismatch into a Markdown record under the reports
//! directory, pointing at the expected, actual and diff images.

use bevy::prelude::*;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::baseline::{BaselineStore, list_capture_files};
use crate::constants::DIFF_DIR_NAME;
use crate::error::HarnessError;
use crate::settings::HarnessSettings;
use crate::testing::parser::{load_scenarios, validate_scenario_name};

/// One bug record
#[derive(Debug, Clone)]
pub struct BugReport {
    pub id: String,
    pub scenario: String,
    pub description: String,
    pub created_at: String,
    /// Scenario file, when it could be found
    pub scenario_file: Option<PathBuf>,
    /// Baseline images
    pub expected: Vec<PathBuf>,
    /// Latest staging captures
    pub actual: Vec<PathBuf>,
    pub diffs: Vec<PathBuf>,
}

impl BugReport {
    /// Gather references for `scenario`; unreadable directories just list nothing
    pub fn new(scenario: &str, description: &str, settings: &HarnessSettings) -> Self {
        let store = BaselineStore::new(&settings.baseline_root);
        let staging_dir = settings.staging_root.join(scenario);

        let collect = |dir: &Path| -> Vec<PathBuf> {
            match list_capture_files(dir) {
                Ok(files) => files.into_iter().map(|f| dir.join(f)).collect(),
                Err(e) => {
                    warn!("Could not list {}: {}", dir.display(), e);
                    Vec::new()
                }
            }
        };

        let scenario_file = load_scenarios(&settings.scenarios_dir, Some(scenario))
            .into_iter()
            .next()
            .map(|loaded| loaded.path);

        Self {
            id: Uuid::new_v4().to_string(),
            scenario: scenario.to_string(),
            description: description.to_string(),
            created_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            scenario_file,
            expected: collect(&store.scenario_dir(scenario)),
            actual: collect(&staging_dir),
            diffs: collect(&staging_dir.join(DIFF_DIR_NAME)),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str(&format!("# Visual regression: {}\n\n", self.scenario));

        md.push_str("## Context\n\n");
        md.push_str(&format!("- **Scenario:** `{}`\n", self.scenario));
        md.push_str(&format!("- **Report ID:** `{}`\n", self.id));
        md.push_str(&format!("- **Reported:** {}\n", self.created_at));
        if let Some(path) = &self.scenario_file {
            md.push_str(&format!("- **Scenario file:** `{}`\n", path.display()));
        }
        md.push_str(&format!("\n{}\n\n", self.description));

        md.push_str("## Reproduction\n\n");
        md.push_str(&format!("1. `cargo run --bin run-tests -- {}`\n", self.scenario));
        md.push_str(&format!("2. `cargo run --bin compare -- {}`\n", self.scenario));
        md.push_str("3. Inspect the images below\n\n");

        push_files(&mut md, "Expected (baseline)", &self.expected);
        push_files(&mut md, "Actual (latest run)", &self.actual);
        push_files(&mut md, "Diff", &self.diffs);

        md.push_str("## Resolution\n\n");
        md.push_str("- [ ] Root cause identified\n");
        md.push_str("- [ ] Fixed in code, or change confirmed intentional\n");
        md.push_str(&format!(
            "- [ ] Baseline updated if intentional (`cargo run --bin update-baseline -- {}`)\n",
            self.scenario
        ));
        md.push_str("- [ ] `compare` passes\n");
        md
    }

    /// Write to `<dir>/<YYYYMMDD_HHMMSS>_<scenario>.md`, never overwriting another report
    pub fn write(&self, dir: &Path) -> Result<PathBuf, HarnessError> {
        fs::create_dir_all(dir).map_err(|e| HarnessError::io(dir, e))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut path = dir.join(format!("{}_{}.md", timestamp, self.scenario));
        if path.exists() {
            let short = &self.id[..8.min(self.id.len())];
            path = dir.join(format!("{}_{}_{}.md", timestamp, self.scenario, short));
        }

        fs::write(&path, self.to_markdown()).map_err(|e| HarnessError::io(&path, e))?;
        info!("Wrote bug report {}", path.display());
        Ok(path)
    }
}

fn push_files(md: &mut String, title: &str, files: &[PathBuf]) {
    md.push_str(&format!("## {}\n\n", title));
    if files.is_empty() {
        md.push_str("_none found_\n\n");
        return;
    }
    for file in files {
        md.push_str(&format!("- `{}`\n", file.display()));
    }
    md.push('\n');
}

/// Write a bug report for `scenario` into the configured reports directory
pub fn report_bug(
    scenario: &str,
    description: &str,
    settings: &HarnessSettings,
) -> Result<PathBuf, HarnessError> {
    validate_scenario_name(scenario)?;
    BugReport::new(scenario, description, settings).write(&settings.reports_dir)
}
