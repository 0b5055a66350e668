//! Snapshot comparator
//!
//! Judges each scenario's latest completed staging run against its baseline
//! directory. Baselines are only read. Diff images for differing captures go
//! to `<staging>/<scenario>/diff/`, rebuilt on every comparison.

pub mod diff;
pub mod strategy;

pub use diff::{DiffOutcome, write_diff};
pub use strategy::CompareStrategy;

use bevy::prelude::*;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::baseline::BaselineStore;
use crate::constants::DIFF_DIR_NAME;
use crate::error::HarnessError;
use crate::settings::HarnessSettings;
use crate::snapshot::RunManifest;
use crate::testing::parser::{load_scenarios, validate_scenario_name};

/// Everything the comparator needs to know
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub baseline_root: PathBuf,
    pub staging_root: PathBuf,
    pub strategy: CompareStrategy,
    pub generate_diffs: bool,
}

impl CompareOptions {
    pub fn from_settings(settings: &HarnessSettings) -> Self {
        Self {
            baseline_root: settings.baseline_root.clone(),
            staging_root: settings.staging_root.clone(),
            strategy: CompareStrategy::from_settings(&settings.comparison),
            generate_diffs: settings.comparison.generate_diffs,
        }
    }
}

/// Verdict for one capture filename
#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Matching,
    /// `diff` is `None` when diff generation is turned off
    Different { diff: Option<DiffOutcome> },
    /// Captured now, never promoted
    MissingBaseline,
    /// In the baseline, not produced by the latest run
    MissingCapture,
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Matching => "matching",
            FileStatus::Different { .. } => "different",
            FileStatus::MissingBaseline => "missing-baseline",
            FileStatus::MissingCapture => "missing-capture",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileComparison {
    pub filename: String,
    pub status: FileStatus,
}

/// Outcome of comparing one scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub scenario: String,
    /// No baseline directory exists for the scenario
    pub missing_baseline_dir: bool,
    /// No completed run exists in staging for the scenario
    pub missing_capture_dir: bool,
    /// Sorted by filename
    pub files: Vec<FileComparison>,
}

impl ComparisonResult {
    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.status)).count()
    }

    pub fn matching(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Matching))
    }

    pub fn different(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Different { .. }))
    }

    pub fn missing_baseline(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::MissingBaseline))
    }

    pub fn missing_capture(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::MissingCapture))
    }

    /// Stale baselines (missing-capture) are reported but do not fail
    pub fn passed(&self) -> bool {
        !self.missing_baseline_dir
            && !self.missing_capture_dir
            && self.different() == 0
            && self.missing_baseline() == 0
    }

    /// Diff images written for this scenario
    pub fn diff_paths(&self) -> Vec<&Path> {
        self.files
            .iter()
            .filter_map(|f| match &f.status {
                FileStatus::Different {
                    diff: Some(DiffOutcome::Written(path)),
                } => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }
}

/// Compare one scenario's staging run against its baseline
pub fn compare_scenario(scenario: &str, options: &CompareOptions) -> Result<ComparisonResult, HarnessError> {
    let store = BaselineStore::new(&options.baseline_root);
    let staging_dir = options.staging_root.join(scenario);
    let diff_dir = staging_dir.join(DIFF_DIR_NAME);

    let manifest = RunManifest::load(&staging_dir)?;
    let missing_capture_dir = manifest.is_none();
    let missing_baseline_dir = !store.has_scenario(scenario);

    // Only completed runs get their diff directory rebuilt
    if manifest.is_some() && diff_dir.exists() {
        fs::remove_dir_all(&diff_dir).map_err(|e| HarnessError::io(&diff_dir, e))?;
    }

    let current: BTreeSet<String> = match &manifest {
        Some(m) => m.captures.iter().cloned().collect(),
        None => BTreeSet::new(),
    };
    let baseline = store.list_images(scenario)?;

    let mut files = Vec::new();
    for filename in current.union(&baseline) {
        let status = match (current.contains(filename), baseline.contains(filename)) {
            (true, false) => FileStatus::MissingBaseline,
            (false, _) => FileStatus::MissingCapture,
            (true, true) => {
                let current_path = staging_dir.join(filename);
                let baseline_path = store.image_path(scenario, filename);
                compare_file(&current_path, &baseline_path, &diff_dir.join(filename), options)?
            }
        };
        files.push(FileComparison {
            filename: filename.clone(),
            status,
        });
    }

    Ok(ComparisonResult {
        scenario: scenario.to_string(),
        missing_baseline_dir,
        missing_capture_dir,
        files,
    })
}

fn compare_file(
    current: &Path,
    baseline: &Path,
    diff_out: &Path,
    options: &CompareOptions,
) -> Result<FileStatus, HarnessError> {
    let matched = match options.strategy.matches(current, baseline) {
        Ok(matched) => matched,
        // Files that cannot be decoded cannot be shown equal
        Err(HarnessError::Image { path, source }) => {
            warn!("{}: {}; counting as different", path.display(), source);
            false
        }
        Err(e) => return Err(e),
    };

    if matched {
        return Ok(FileStatus::Matching);
    }

    let diff = options.generate_diffs.then(|| {
        let outcome = write_diff(current, baseline, diff_out, options.strategy.channel_tolerance());
        if let DiffOutcome::Unavailable(reason) = &outcome {
            warn!("No diff for {}: {}", current.display(), reason);
        }
        outcome
    });

    Ok(FileStatus::Different { diff })
}

/// Compare many scenarios in parallel, results in the order given
pub fn compare_all(
    scenarios: &[String],
    options: &CompareOptions,
) -> Vec<(String, Result<ComparisonResult, HarnessError>)> {
    scenarios
        .par_iter()
        .map(|name| (name.clone(), compare_scenario(name, options)))
        .collect()
}

/// Scenario names with a baseline directory or a staging run
pub fn known_scenarios(options: &CompareOptions) -> Result<Vec<String>, HarnessError> {
    let mut names = BTreeSet::new();
    for root in [&options.baseline_root, &options.staging_root] {
        if !root.is_dir() {
            continue;
        }
        let entries = fs::read_dir(root).map_err(|e| HarnessError::io(root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| HarnessError::io(root, e))?;
            if entry.path().is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                names.insert(name.to_string());
            }
        }
    }
    Ok(names.into_iter().collect())
}

/// Scenarios a batch command works on: `filter` alone when given, else every
/// scenario file's name, else whatever has a baseline or staging directory
pub fn select_scenarios(settings: &HarnessSettings, filter: Option<&str>) -> Result<Vec<String>, HarnessError> {
    if let Some(name) = filter {
        validate_scenario_name(name)?;
        return Ok(vec![name.to_string()]);
    }

    let names: BTreeSet<String> = load_scenarios(&settings.scenarios_dir, None)
        .into_iter()
        .map(|loaded| loaded.name)
        .collect();
    if !names.is_empty() {
        return Ok(names.into_iter().collect());
    }

    known_scenarios(&CompareOptions::from_settings(settings))
}

/// Aggregate over every compared scenario
#[derive(Debug, Default)]
pub struct ComparisonSummary {
    pub results: Vec<ComparisonResult>,
    /// Scenarios whose comparison itself failed
    pub errors: Vec<(String, HarnessError)>,
}

impl ComparisonSummary {
    pub fn from_results(results: Vec<(String, Result<ComparisonResult, HarnessError>)>) -> Self {
        let mut summary = Self::default();
        for (name, result) in results {
            match result {
                Ok(r) => summary.results.push(r),
                Err(e) => summary.errors.push((name, e)),
            }
        }
        summary
    }

    /// True iff every scenario compared cleanly and passed
    pub fn passed(&self) -> bool {
        self.errors.is_empty() && self.results.iter().all(ComparisonResult::passed)
    }

    pub fn total_matching(&self) -> usize {
        self.results.iter().map(ComparisonResult::matching).sum()
    }

    pub fn total_different(&self) -> usize {
        self.results.iter().map(ComparisonResult::different).sum()
    }

    pub fn total_missing_baseline(&self) -> usize {
        self.results.iter().map(ComparisonResult::missing_baseline).sum()
    }

    pub fn total_missing_capture(&self) -> usize {
        self.results.iter().map(ComparisonResult::missing_capture).sum()
    }

    /// Per-scenario table for the terminal
    pub fn format_table(&self) -> String {
        let mut output = String::new();
        output.push_str("\nCOMPARISON SUMMARY:\n");
        output.push_str("  Scenario              Match  Diff  No-base  No-capture  Status\n");
        output.push_str("  ──────────────────────────────────────────────────────────────\n");

        for r in &self.results {
            let status = if r.missing_capture_dir {
                "missing-capture-dir"
            } else if r.missing_baseline_dir {
                "missing-baseline-dir"
            } else if r.passed() {
                "PASS"
            } else {
                "FAIL"
            };
            output.push_str(&format!(
                "  {:<20}  {:>5}  {:>4}  {:>7}  {:>10}  {}\n",
                r.scenario.chars().take(20).collect::<String>(),
                r.matching(),
                r.different(),
                r.missing_baseline(),
                r.missing_capture(),
                status,
            ));
        }
        for (name, e) in &self.errors {
            output.push_str(&format!("  {:<20}  ERROR {}\n", name, e));
        }

        output.push_str(&format!(
            "\n  Total: {} matching, {} different, {} missing baseline, {} missing capture\n",
            self.total_matching(),
            self.total_different(),
            self.total_missing_baseline(),
            self.total_missing_capture(),
        ));
        output
    }
}
