//! Headless App Builder
//!
//! Builds the headless Bevy app behind `SandboxSimulation`. Every app is
//! seeded explicitly and owns all of its state, so independent scenarios can
//! build their own apps without sharing anything.

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::constants::{
    CAMERA_MAX_ZOOM, CAMERA_MIN_ZOOM, DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH,
};
use crate::testing::parser::CameraSetup;

use super::control::{HudClock, PendingClicks, SandboxRng, SceneCamera, SimControl};
use super::setup::sandbox_setup;
use super::systems::{
    advance_frame, camera_control, check_invariants, move_drifters, spawn_click_markers,
    update_hud_clock,
};

/// Builder for creating headless sandbox apps
pub struct HeadlessAppBuilder {
    seed: u64,
    camera: SceneCamera,
    viewport: UVec2,
    minimal_threads: bool,
}

impl HeadlessAppBuilder {
    /// Create a new builder for the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            camera: SceneCamera::default(),
            viewport: UVec2::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
            minimal_threads: false,
        }
    }

    /// Place the camera before the first step, zoom limited to the range the
    /// zoom keys can reach
    pub fn with_camera(mut self, camera: Option<&CameraSetup>) -> Self {
        if let Some(camera) = camera {
            self.camera = SceneCamera {
                position: Vec2::new(camera.x, camera.y),
                zoom: camera.zoom.clamp(CAMERA_MIN_ZOOM, CAMERA_MAX_ZOOM),
            };
        }
        self
    }

    /// Set the output size in pixels
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = UVec2::new(width, height);
        self
    }

    /// Enable minimal thread mode (task pools = 1)
    ///
    /// Use this when many sandboxes run side by side.
    pub fn with_minimal_threads(mut self) -> Self {
        self.minimal_threads = true;
        self
    }

    /// Build the app with minimal plugins, sandbox resources and the seeded world.
    ///
    /// Systems live in `Update`; one `app.update()` is one simulation step.
    pub fn build(self) -> App {
        let mut app = App::new();

        if self.minimal_threads {
            app.add_plugins(MinimalPlugins.set(TaskPoolPlugin {
                task_pool_options: TaskPoolOptions::with_num_threads(1),
            }));
        } else {
            app.add_plugins(MinimalPlugins);
        }

        app.insert_resource(SimControl::new(self.seed, self.viewport));
        app.insert_resource(SandboxRng(StdRng::seed_from_u64(self.seed)));
        app.insert_resource(self.camera);
        app.init_resource::<ButtonInput<KeyCode>>();
        app.init_resource::<ButtonInput<MouseButton>>();
        app.init_resource::<PendingClicks>();
        app.init_resource::<HudClock>();

        app.add_systems(
            Update,
            (
                camera_control,
                spawn_click_markers,
                move_drifters,
                check_invariants,
                update_hud_clock,
                advance_frame,
            )
                .chain(),
        );

        sandbox_setup(app.world_mut());

        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_applies_camera_and_viewport() {
        let app = HeadlessAppBuilder::new(3)
            .with_camera(Some(&CameraSetup {
                x: 10.0,
                y: -5.0,
                zoom: 2.0,
            }))
            .with_viewport(64, 48)
            .build();

        let camera = app.world().resource::<SceneCamera>();
        assert_eq!(camera.position, Vec2::new(10.0, -5.0));
        assert_eq!(camera.zoom, 2.0);
        assert_eq!(app.world().resource::<SimControl>().viewport, UVec2::new(64, 48));
    }

    #[test]
    fn test_initial_zoom_clamped() {
        let app = HeadlessAppBuilder::new(3)
            .with_camera(Some(&CameraSetup {
                x: 0.0,
                y: 0.0,
                zoom: 1e-8,
            }))
            .with_viewport(64, 48)
            .build();
        assert_eq!(app.world().resource::<SceneCamera>().zoom, CAMERA_MIN_ZOOM);
    }

    #[test]
    fn test_update_advances_one_frame() {
        let mut app = HeadlessAppBuilder::new(3).with_minimal_threads().build();
        app.update();
        app.update();
        assert_eq!(app.world().resource::<SimControl>().frame, 2);
    }
}
