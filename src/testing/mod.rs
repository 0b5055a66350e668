//! Scenario replay
//!
//! Parses scenario descriptors, accumulates their scripted input frame by
//! frame and drives a `Simulation` through them while capturing frames.

pub mod input;
pub mod keys;
pub mod parser;
pub mod runner;

pub use input::{FrameInput, ScreenClick, ScriptedInputs};
pub use keys::{parse_button, parse_key};
pub use parser::{
    CameraSetup, EventAction, EventDef, KeyDirection, LoadedScenario, Scenario, ScheduledEvent,
    ScheduledKind, load_scenarios, parse_scenario_file, validate_scenario_name,
};
pub use runner::{RunOutcome, TestResult, run_scenario, run_test};
