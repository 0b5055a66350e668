//! Visreg - scenario-driven visual regression testing
//!
//! Replays scripted input against a deterministic headless simulation,
//! captures frames as PNG files and compares them with committed baselines.

pub mod baseline;
pub mod compare;
pub mod constants;
pub mod error;
pub mod report;
pub mod settings;
pub mod simulation;
pub mod snapshot;
pub mod testing;

pub use baseline::{BaselineStore, UpdateSummary};
pub use compare::{
    CompareOptions, CompareStrategy, ComparisonResult, ComparisonSummary, DiffOutcome,
    FileComparison, FileStatus, compare_all, compare_scenario,
};
pub use error::HarnessError;
pub use report::{BugReport, report_bug};
pub use settings::{CliArgs, HarnessSettings, StrategyKind, init_logging};
pub use simulation::{Frame, RenderLayer, SandboxSimulation, Simulation, SimulationFault};
pub use snapshot::{CaptureSet, CaptureSink, RunManifest};
pub use testing::{Scenario, TestResult, load_scenarios, run_scenario, run_test};
