//! Sandbox control resources and components
//!
//! Contains the state shared between the sandbox systems and the
//! `SandboxSimulation` driver.

use bevy::prelude::*;
use rand::rngs::StdRng;
use std::time::Instant;

use crate::testing::input::ScreenClick;

/// Resource to control sandbox execution
#[derive(Resource)]
pub struct SimControl {
    /// Seed the world was generated from
    pub seed: u64,
    /// Number of completed steps
    pub frame: u64,
    /// Output size in pixels
    pub viewport: UVec2,
    /// Internal errors raised by systems during the current step
    pub faults: Vec<String>,
    /// Next value handed out by `next_draw_order`
    pub next_draw_order: u32,
}

impl SimControl {
    pub fn new(seed: u64, viewport: UVec2) -> Self {
        Self {
            seed,
            frame: 0,
            viewport,
            faults: Vec::new(),
            next_draw_order: 0,
        }
    }

    /// Monotonic paint order, so rendering never depends on query iteration order
    pub fn next_draw_order(&mut self) -> DrawOrder {
        let order = DrawOrder(self.next_draw_order);
        self.next_draw_order += 1;
        order
    }
}

/// Seeded RNG owned by one sandbox instance
#[derive(Resource)]
pub struct SandboxRng(pub StdRng);

/// Camera looking at the world plane
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SceneCamera {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl SceneCamera {
    /// Screen pixel (origin top-left, y down) to world position (y up)
    pub fn screen_to_world(&self, screen: Vec2, viewport: UVec2) -> Vec2 {
        let center = viewport.as_vec2() * 0.5;
        Vec2::new(
            self.position.x + (screen.x - center.x) / self.zoom,
            self.position.y - (screen.y - center.y) / self.zoom,
        )
    }

    /// World position to screen pixel
    pub fn world_to_screen(&self, world: Vec2, viewport: UVec2) -> Vec2 {
        let center = viewport.as_vec2() * 0.5;
        Vec2::new(
            center.x + (world.x - self.position.x) * self.zoom,
            center.y - (world.y - self.position.y) * self.zoom,
        )
    }
}

/// Clicks delivered on the current step
#[derive(Resource, Default)]
pub struct PendingClicks(pub Vec<ScreenClick>);

/// Wall-clock frame timing shown by the HUD (never used by the simulation itself)
#[derive(Resource, Default)]
pub struct HudClock {
    pub last_step: Option<Instant>,
    pub fps: f32,
}

/// Filled rectangle drawn in world space at the entity's Transform
#[derive(Component, Debug, Clone, Copy)]
pub struct WorldRect {
    pub size: Vec2,
    pub color: [u8; 4],
}

/// Paint order among world rectangles
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DrawOrder(pub u32);

/// Static seeded decoration
#[derive(Component)]
pub struct Scenery;

/// Body that moves on its own every step
#[derive(Component)]
pub struct Drifter {
    pub velocity: Vec2,
}

/// Left where the user clicked
#[derive(Component)]
pub struct ClickMarker;
