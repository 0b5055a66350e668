//! Scenario execution engine
//!
//! Replays a scenario against a `Simulation`: events for frame `f` are applied
//! in declared order (captures snapshot the most recent render), then the
//! simulation steps once and renders.

use bevy::prelude::*;
use std::path::Path;

use crate::error::HarnessError;
use crate::settings::HarnessSettings;
use crate::simulation::{SandboxSimulation, Simulation, SimulationFault};
use crate::snapshot::{CaptureSet, CaptureSink};

use super::input::ScriptedInputs;
use super::parser::{ScheduledEvent, ScheduledKind, Scenario};

/// Result of running a scenario
#[derive(Debug)]
pub enum TestResult {
    Pass { frames: u64, captures: usize },
    Fail { error: HarnessError },
}

impl TestResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }
}

/// What a completed replay produced
#[derive(Debug)]
pub struct RunOutcome {
    pub captures: CaptureSet,
    /// Frames stepped
    pub frames: u64,
}

/// Run a scenario against the sandbox configured by `settings`
pub fn run_test(scenario: &Scenario, settings: &HarnessSettings) -> TestResult {
    let mut sim = SandboxSimulation::new(settings.viewport.width, settings.viewport.height);
    match run_scenario(scenario, &mut sim, &settings.staging_root) {
        Ok(outcome) => TestResult::Pass {
            frames: outcome.frames,
            captures: outcome.captures.len(),
        },
        Err(error) => TestResult::Fail { error },
    }
}

/// Replay `scenario` against `sim`, writing captures under `staging_root/<name>/`.
///
/// Validation happens before the simulation is touched. On any failure after
/// that, the partial staging output is discarded.
pub fn run_scenario<S: Simulation>(
    scenario: &Scenario,
    sim: &mut S,
    staging_root: &Path,
) -> Result<RunOutcome, HarnessError> {
    let events = scenario.schedule()?;

    let mut sink = CaptureSink::new(staging_root, &scenario.name, scenario.test_mode);
    sink.prepare()?;

    if events.is_empty() {
        info!("Scenario '{}' has no events; nothing to capture", scenario.name);
        let captures = sink.finish(scenario.seed, 0)?;
        return Ok(RunOutcome {
            captures,
            frames: 0,
        });
    }

    let frames = match replay(scenario, events, sim, &mut sink) {
        Ok(frames) => frames,
        Err(e) => {
            sink.discard();
            return Err(e);
        }
    };

    let dir = sink.dir().to_path_buf();
    match sink.finish(scenario.seed, frames) {
        Ok(captures) => {
            info!(
                "Scenario '{}' finished: {} frames, {} captures",
                scenario.name,
                frames,
                captures.len()
            );
            Ok(RunOutcome { captures, frames })
        }
        Err(e) => {
            let _ = std::fs::remove_dir_all(&dir);
            Err(e)
        }
    }
}

fn replay<S: Simulation>(
    scenario: &Scenario,
    events: Vec<ScheduledEvent>,
    sim: &mut S,
    sink: &mut CaptureSink,
) -> Result<u64, HarnessError> {
    let fault = |frame: u64, f: SimulationFault| HarnessError::SimulationFault {
        scenario: scenario.name.clone(),
        frame,
        message: f.message,
    };

    sim.reset(scenario.seed, scenario.camera.as_ref())
        .map_err(|f| fault(0, f))?;
    let mut rendered = sim.render().map_err(|f| fault(0, f))?;

    let mut inputs = ScriptedInputs::new(events);
    let mut frames = 0u64;

    while inputs.should_continue() {
        let frame = inputs.current_frame;

        while let Some(event) = inputs.next_due() {
            match &event.kind {
                ScheduledKind::Capture { filename } => {
                    sink.capture(&rendered, filename)?;
                }
                _ => inputs.apply(&event),
            }
        }

        sim.step(inputs.frame_input()).map_err(|f| fault(frame, f))?;
        rendered = sim.render().map_err(|f| fault(frame, f))?;
        inputs.end_frame();
        frames += 1;
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CAMERA_PAN_PER_STEP, MANIFEST_FILE};
    use crate::simulation::{Frame, RenderLayer};
    use crate::snapshot::RunManifest;
    use crate::testing::input::FrameInput;
    use crate::testing::parser::{CameraSetup, EventAction, EventDef, KeyDirection};
    use std::fs;

    /// Records every step; its frame encodes the step count and whether W was held
    #[derive(Default)]
    struct ScriptedSim {
        resets: u32,
        steps: u64,
        w_held: Vec<bool>,
        fail_at_step: Option<u64>,
    }

    impl Simulation for ScriptedSim {
        fn reset(&mut self, _seed: u64, _camera: Option<&CameraSetup>) -> Result<(), SimulationFault> {
            self.resets += 1;
            self.steps = 0;
            self.w_held.clear();
            Ok(())
        }

        fn step(&mut self, input: &FrameInput) -> Result<(), SimulationFault> {
            if self.fail_at_step == Some(self.steps) {
                return Err(SimulationFault::new("physics exploded"));
            }
            self.w_held.push(input.keys.pressed(KeyCode::KeyW));
            self.steps += 1;
            Ok(())
        }

        fn render(&mut self) -> Result<Frame, SimulationFault> {
            let mut frame = Frame::new(4, 4, [0, 0, 0, 255]);
            frame.push(RenderLayer::World, 0, 0, 1, 1, [self.steps as u8, 0, 0, 255]);
            frame.push(RenderLayer::Overlay, 3, 3, 1, 1, [0, 0, 255, 255]);
            Ok(frame)
        }
    }

    fn scenario(name: &str, events: Vec<EventDef>) -> Scenario {
        Scenario {
            name: name.to_string(),
            description: None,
            seed: 42,
            test_mode: false,
            camera: None,
            events,
        }
    }

    fn key(frame: u64, key: &str, action: KeyDirection) -> EventDef {
        EventDef {
            frame,
            action: EventAction::Key {
                key: key.to_string(),
                action,
            },
        }
    }

    fn capture(frame: u64, name: &str) -> EventDef {
        EventDef {
            frame,
            action: EventAction::Capture {
                capture: name.to_string(),
            },
        }
    }

    fn camera_pan() -> Scenario {
        let mut s = scenario(
            "camera-pan",
            vec![
                capture(0, "initial.png"),
                key(1, "W", KeyDirection::Down),
                key(30, "W", KeyDirection::Up),
                capture(30, "after-up.png"),
            ],
        );
        s.test_mode = true;
        s
    }

    #[test]
    fn test_steps_through_settle_frame() {
        let staging = tempfile::tempdir().unwrap();
        let mut sim = ScriptedSim::default();
        let outcome = run_scenario(&camera_pan(), &mut sim, staging.path()).unwrap();

        assert_eq!(outcome.frames, 32);
        assert_eq!(sim.resets, 1);
        let held_steps = sim.w_held.iter().filter(|h| **h).count();
        assert_eq!(held_steps, 29);
        assert!(!sim.w_held[0]);
        assert!(sim.w_held[1]);
        assert!(!sim.w_held[30]);
    }

    #[test]
    fn test_capture_sees_last_render_before_step() {
        let staging = tempfile::tempdir().unwrap();
        let mut sim = ScriptedSim::default();
        let s = scenario("order", vec![capture(0, "zero.png"), capture(3, "three.png")]);
        run_scenario(&s, &mut sim, staging.path()).unwrap();

        let zero = image::open(staging.path().join("order/zero.png")).unwrap().to_rgba8();
        let three = image::open(staging.path().join("order/three.png")).unwrap().to_rgba8();
        assert_eq!(zero.get_pixel(0, 0).0[0], 0);
        assert_eq!(three.get_pixel(0, 0).0[0], 3);
        // Overlay kept outside test mode
        assert_eq!(zero.get_pixel(3, 3).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_simulation_fault_discards_partial_run() {
        let staging = tempfile::tempdir().unwrap();
        let mut sim = ScriptedSim {
            fail_at_step: Some(5),
            ..Default::default()
        };
        let err = run_scenario(&camera_pan(), &mut sim, staging.path()).unwrap_err();

        match err {
            HarnessError::SimulationFault { frame, scenario, .. } => {
                assert_eq!(frame, 5);
                assert_eq!(scenario, "camera-pan");
            }
            other => panic!("expected SimulationFault, got {other}"),
        }
        assert!(!staging.path().join("camera-pan").exists());
    }

    #[test]
    fn test_invalid_scenario_fails_before_simulation() {
        let staging = tempfile::tempdir().unwrap();
        let mut sim = ScriptedSim::default();
        let s = scenario("bad", vec![capture(4, "a.png"), capture(2, "b.png")]);
        let err = run_scenario(&s, &mut sim, staging.path()).unwrap_err();

        assert_eq!(err.kind(), "InvalidScenario");
        assert_eq!(sim.resets, 0);
        assert!(!staging.path().join("bad").exists());
    }

    #[test]
    fn test_zero_events_yields_empty_set() {
        let staging = tempfile::tempdir().unwrap();
        let mut sim = ScriptedSim::default();
        let outcome = run_scenario(&scenario("idle", Vec::new()), &mut sim, staging.path()).unwrap();

        assert!(outcome.captures.is_empty());
        assert_eq!(outcome.frames, 0);
        assert_eq!(sim.resets, 0);
        assert!(staging.path().join("idle").join(MANIFEST_FILE).is_file());
    }

    #[test]
    fn test_sandbox_camera_pan_is_deterministic() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();

        let mut sim = SandboxSimulation::new(96, 72).with_minimal_threads();
        let outcome = run_scenario(&camera_pan(), &mut sim, first.path()).unwrap();
        let camera = sim.camera().unwrap();
        assert_eq!(camera.position, Vec2::new(0.0, 29.0 * CAMERA_PAN_PER_STEP));

        let mut again = SandboxSimulation::new(96, 72).with_minimal_threads();
        run_scenario(&camera_pan(), &mut again, second.path()).unwrap();

        for name in ["initial.png", "after-up.png"] {
            let a = fs::read(first.path().join("camera-pan").join(name)).unwrap();
            let b = fs::read(second.path().join("camera-pan").join(name)).unwrap();
            assert_eq!(a, b, "{name} differs between runs");
        }

        let initial = fs::read(&outcome.captures.files["initial.png"]).unwrap();
        let after = fs::read(&outcome.captures.files["after-up.png"]).unwrap();
        assert_ne!(initial, after);

        let manifest = RunManifest::load(&first.path().join("camera-pan")).unwrap().unwrap();
        assert_eq!(manifest.captures, vec!["initial.png", "after-up.png"]);
        assert_eq!(manifest.frames, 32);
    }

    #[test]
    fn test_sandbox_initial_camera_applied() {
        let staging = tempfile::tempdir().unwrap();
        let mut s = scenario("offset", vec![capture(0, "a.png")]);
        s.camera = Some(CameraSetup {
            x: 100.0,
            y: -50.0,
            zoom: 2.0,
        });
        let mut sim = SandboxSimulation::new(64, 48).with_minimal_threads();
        run_scenario(&s, &mut sim, staging.path()).unwrap();
        let camera = sim.camera().unwrap();
        assert_eq!(camera.position, Vec2::new(100.0, -50.0));
        assert_eq!(camera.zoom, 2.0);
    }
}
