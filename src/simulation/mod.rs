//! Simulation seam driven by the event player
//!
//! The harness only needs three capabilities from a simulation: reset it to a
//! seeded initial state, step it one frame with an input snapshot, and render
//! the current frame as a display list. `SandboxSimulation` is the headless
//! Bevy world shipped with the crate.

pub mod app_builder;
pub mod control;
pub mod sandbox;
pub mod setup;
pub mod systems;

pub use control::{DrawOrder, SceneCamera, SimControl, WorldRect};
pub use sandbox::SandboxSimulation;

use std::fmt;

use crate::testing::input::FrameInput;
use crate::testing::parser::CameraSetup;

/// Which pass a draw element belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderLayer {
    /// Scene content produced by the simulation
    World,
    /// HUD text, FPS counters, debug panels
    Overlay,
}

/// Axis-aligned filled rectangle in screen pixels (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawElement {
    pub layer: RenderLayer,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub color: [u8; 4],
}

/// Display list for one rendered frame, back to front
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 4],
    pub elements: Vec<DrawElement>,
}

impl Frame {
    pub fn new(width: u32, height: u32, background: [u8; 4]) -> Self {
        Self {
            width,
            height,
            background,
            elements: Vec::new(),
        }
    }

    /// Append a rectangle; zero-area rectangles are dropped
    pub fn push(&mut self, layer: RenderLayer, x: i32, y: i32, width: u32, height: u32, color: [u8; 4]) {
        if width == 0 || height == 0 {
            return;
        }
        self.elements.push(DrawElement {
            layer,
            x,
            y,
            width,
            height,
            color,
        });
    }
}

/// Internal error reported by a simulation while resetting, stepping or rendering
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationFault {
    pub message: String,
}

impl SimulationFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SimulationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A steppable, renderable simulation
pub trait Simulation {
    /// Discard all state and start over from `seed`, optionally placing the camera
    fn reset(&mut self, seed: u64, camera: Option<&CameraSetup>) -> Result<(), SimulationFault>;

    /// Advance exactly one frame using the given input
    fn step(&mut self, input: &FrameInput) -> Result<(), SimulationFault>;

    /// Produce the display list for the current state
    fn render(&mut self) -> Result<Frame, SimulationFault>;
}
