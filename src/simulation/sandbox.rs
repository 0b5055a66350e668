//! Headless Bevy sandbox implementing `Simulation`
//!
//! World content is projected through `SceneCamera` into `RenderLayer::World`
//! elements; the HUD (frame counter, wall-clock FPS meter, debug panel) goes
//! into `RenderLayer::Overlay`.

use bevy::prelude::*;
use std::panic::{self, AssertUnwindSafe};

use crate::constants::*;
use crate::testing::input::FrameInput;
use crate::testing::parser::CameraSetup;

use super::app_builder::HeadlessAppBuilder;
use super::control::{
    ClickMarker, DrawOrder, Drifter, HudClock, PendingClicks, SceneCamera, SimControl, WorldRect,
};
use super::{Frame, RenderLayer, Simulation, SimulationFault};

/// The sandbox world driven by scenarios
pub struct SandboxSimulation {
    app: Option<App>,
    viewport: UVec2,
    minimal_threads: bool,
}

impl Default for SandboxSimulation {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT)
    }
}

impl SandboxSimulation {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            app: None,
            viewport: UVec2::new(width, height),
            minimal_threads: false,
        }
    }

    /// Run each sandbox on a single task-pool thread
    pub fn with_minimal_threads(mut self) -> Self {
        self.minimal_threads = true;
        self
    }

    /// Current camera, if the sandbox has been reset
    pub fn camera(&self) -> Option<SceneCamera> {
        self.app
            .as_ref()
            .map(|app| *app.world().resource::<SceneCamera>())
    }

    /// Completed steps since the last reset
    pub fn frame(&self) -> Option<u64> {
        self.app
            .as_ref()
            .map(|app| app.world().resource::<SimControl>().frame)
    }

    fn app_mut(&mut self) -> Result<&mut App, SimulationFault> {
        self.app
            .as_mut()
            .ok_or_else(|| SimulationFault::new("sandbox used before reset"))
    }
}

impl Simulation for SandboxSimulation {
    fn reset(&mut self, seed: u64, camera: Option<&CameraSetup>) -> Result<(), SimulationFault> {
        let mut builder = HeadlessAppBuilder::new(seed)
            .with_camera(camera)
            .with_viewport(self.viewport.x, self.viewport.y);
        if self.minimal_threads {
            builder = builder.with_minimal_threads();
        }

        self.app = None;
        let app = panic::catch_unwind(AssertUnwindSafe(|| builder.build()))
            .map_err(|payload| SimulationFault::new(panic_message(payload.as_ref())))?;
        debug!("Sandbox reset with seed {}", seed);
        self.app = Some(app);
        Ok(())
    }

    fn step(&mut self, input: &FrameInput) -> Result<(), SimulationFault> {
        let app = self.app_mut()?;
        {
            let world = app.world_mut();
            *world.resource_mut::<ButtonInput<KeyCode>>() = input.keys.clone();
            *world.resource_mut::<ButtonInput<MouseButton>>() = input.mouse.clone();
            world.resource_mut::<PendingClicks>().0 = input.clicks.clone();
            world.resource_mut::<SimControl>().faults.clear();
        }

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| app.update())) {
            // A world that panicked mid-schedule is not trusted again
            self.app = None;
            return Err(SimulationFault::new(format!(
                "system panicked: {}",
                panic_message(payload.as_ref())
            )));
        }

        let faults = std::mem::take(&mut app.world_mut().resource_mut::<SimControl>().faults);
        if faults.is_empty() {
            Ok(())
        } else {
            Err(SimulationFault::new(faults.join("; ")))
        }
    }

    fn render(&mut self) -> Result<Frame, SimulationFault> {
        let app = self.app_mut()?;
        Ok(render_world(app.world_mut()))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Build the display list for the sandbox's current state
pub fn render_world(world: &mut World) -> Frame {
    let camera = *world.resource::<SceneCamera>();
    let (viewport, frame_number) = {
        let control = world.resource::<SimControl>();
        (control.viewport, control.frame)
    };
    let fps = world.resource::<HudClock>().fps;

    let mut frame = Frame::new(viewport.x, viewport.y, BACKGROUND_COLOR);

    draw_grid(&mut frame, &camera, viewport);

    let mut rects: Vec<(f32, DrawOrder, Vec3, WorldRect)> = world
        .query::<(&Transform, &WorldRect, &DrawOrder)>()
        .iter(world)
        .map(|(t, rect, order)| (t.translation.z, *order, t.translation, *rect))
        .collect();
    rects.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    for (_, _, translation, rect) in &rects {
        let center = camera.world_to_screen(translation.truncate(), viewport);
        let size = rect.size * camera.zoom;
        let w = size.x.round().max(1.0) as u32;
        let h = size.y.round().max(1.0) as u32;
        frame.push(
            RenderLayer::World,
            (center.x - size.x * 0.5).round() as i32,
            (center.y - size.y * 0.5).round() as i32,
            w,
            h,
            rect.color,
        );
    }

    let drifters = world.query::<&Drifter>().iter(world).count() as u64;
    let markers = world
        .query_filtered::<(), With<ClickMarker>>()
        .iter(world)
        .count() as u64;

    draw_hud(&mut frame, frame_number, fps);
    draw_debug_panel(&mut frame, drifters, markers);

    frame
}

/// Grid lines every `GRID_SPACING` world units plus an origin cross
fn draw_grid(frame: &mut Frame, camera: &SceneCamera, viewport: UVec2) {
    let top_left = camera.screen_to_world(Vec2::ZERO, viewport);
    let bottom_right = camera.screen_to_world(viewport.as_vec2(), viewport);
    let line = (GRID_LINE_WIDTH * camera.zoom).round().max(1.0) as u32;
    let half = (line / 2) as i32;

    let first_x = (top_left.x / GRID_SPACING).ceil() as i64;
    let last_x = (bottom_right.x / GRID_SPACING).floor() as i64;
    for k in first_x..=last_x {
        let sx = camera
            .world_to_screen(Vec2::new(k as f32 * GRID_SPACING, 0.0), viewport)
            .x
            .round() as i32;
        frame.push(RenderLayer::World, sx - half, 0, line, viewport.y, GRID_COLOR);
    }

    let first_y = (bottom_right.y / GRID_SPACING).ceil() as i64;
    let last_y = (top_left.y / GRID_SPACING).floor() as i64;
    for k in first_y..=last_y {
        let sy = camera
            .world_to_screen(Vec2::new(0.0, k as f32 * GRID_SPACING), viewport)
            .y
            .round() as i32;
        frame.push(RenderLayer::World, 0, sy - half, viewport.x, line, GRID_COLOR);
    }

    let origin = camera.world_to_screen(Vec2::ZERO, viewport);
    let arm = (12.0 * camera.zoom).round().max(2.0) as u32;
    let (ox, oy) = (origin.x.round() as i32, origin.y.round() as i32);
    frame.push(RenderLayer::World, ox - arm as i32, oy - half, arm * 2, line, ORIGIN_COLOR);
    frame.push(RenderLayer::World, ox - half, oy - arm as i32, line, arm * 2, ORIGIN_COLOR);
}

/// Frame counter and FPS meter, top-left
fn draw_hud(frame: &mut Frame, frame_number: u64, fps: f32) {
    let cell = HUD_DIGIT_CELL;
    let digits = frame_number.to_string().len() as u32;
    let text_width = digits * 4 * cell;
    let panel_w = text_width.max(60) + 2 * HUD_MARGIN as u32;
    let panel_h = 5 * cell + 10 + 2 * HUD_MARGIN as u32;

    frame.push(RenderLayer::Overlay, 0, 0, panel_w, panel_h, HUD_PANEL_COLOR);
    draw_number(frame, frame_number, HUD_MARGIN, HUD_MARGIN, HUD_TEXT_COLOR);

    let bar = (fps.clamp(0.0, 240.0) / 4.0).round() as u32;
    frame.push(
        RenderLayer::Overlay,
        HUD_MARGIN,
        HUD_MARGIN + 5 * cell as i32 + 4,
        bar,
        4,
        HUD_FPS_COLOR,
    );
}

/// Entity counts, bottom-right
fn draw_debug_panel(frame: &mut Frame, drifters: u64, markers: u64) {
    let cell = HUD_DIGIT_CELL as i32;
    let panel_w = 60u32;
    let panel_h = (5 * cell * 2 + 3 * HUD_MARGIN) as u32;
    let x = frame.width as i32 - panel_w as i32;
    let y = frame.height as i32 - panel_h as i32;

    frame.push(RenderLayer::Overlay, x, y, panel_w, panel_h, DEBUG_PANEL_COLOR);
    draw_number(frame, drifters, x + HUD_MARGIN, y + HUD_MARGIN, HUD_TEXT_COLOR);
    draw_number(
        frame,
        markers,
        x + HUD_MARGIN,
        y + 2 * HUD_MARGIN + 5 * cell,
        HUD_TEXT_COLOR,
    );
}

/// 3x5 bitmap glyphs, one row per entry, high bit on the left
const DIGIT_GLYPHS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

fn draw_number(frame: &mut Frame, value: u64, x: i32, y: i32, color: [u8; 4]) {
    let cell = HUD_DIGIT_CELL;
    for (i, ch) in value.to_string().chars().enumerate() {
        let Some(digit) = ch.to_digit(10) else {
            continue;
        };
        let glyph = DIGIT_GLYPHS[digit as usize];
        let gx = x + (i as u32 * 4 * cell) as i32;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) != 0 {
                    frame.push(
                        RenderLayer::Overlay,
                        gx + (col * cell) as i32,
                        y + (row as u32 * cell) as i32,
                        cell,
                        cell,
                        color,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[KeyCode]) -> FrameInput {
        let mut input = FrameInput::default();
        for key in keys {
            input.keys.press(*key);
        }
        input
    }

    #[test]
    fn test_step_before_reset_faults() {
        let mut sim = SandboxSimulation::new(32, 32);
        assert!(sim.step(&FrameInput::default()).is_err());
        assert!(sim.render().is_err());
    }

    #[test]
    fn test_held_key_pans_camera_per_step() {
        let mut sim = SandboxSimulation::new(64, 48).with_minimal_threads();
        sim.reset(5, None).unwrap();
        let input = held(&[KeyCode::KeyW]);
        for _ in 0..10 {
            sim.step(&input).unwrap();
        }
        sim.step(&FrameInput::default()).unwrap();

        let camera = sim.camera().unwrap();
        assert_eq!(camera.position, Vec2::new(0.0, 10.0 * CAMERA_PAN_PER_STEP));
        assert_eq!(sim.frame(), Some(11));
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut sim = SandboxSimulation::new(64, 48).with_minimal_threads();
        sim.reset(5, None).unwrap();
        let before = sim.render().unwrap();
        sim.step(&held(&[KeyCode::KeyD])).unwrap();
        sim.reset(5, None).unwrap();
        assert_eq!(sim.render().unwrap(), before);
    }

    #[test]
    fn test_click_spawns_marker_under_cursor() {
        let mut sim = SandboxSimulation::new(64, 48).with_minimal_threads();
        sim.reset(5, None).unwrap();
        let mut input = FrameInput::default();
        input.clicks.push(crate::testing::input::ScreenClick {
            x: 32,
            y: 24,
            button: MouseButton::Right,
        });
        sim.step(&input).unwrap();

        let frame = sim.render().unwrap();
        assert!(frame.elements.iter().any(|e| e.layer == RenderLayer::World
            && e.color == MARKER_RIGHT_COLOR
            && e.x == 27
            && e.y == 19));
    }

    #[test]
    fn test_tiny_initial_zoom_keeps_render_bounded() {
        let mut sim = SandboxSimulation::new(64, 48).with_minimal_threads();
        let camera = CameraSetup {
            x: 0.0,
            y: 0.0,
            zoom: 1e-5,
        };
        sim.reset(5, Some(&camera)).unwrap();
        let frame = sim.render().unwrap();
        assert!(frame.elements.len() < 2_000, "{} elements", frame.elements.len());
    }

    #[test]
    fn test_overlay_elements_are_tagged() {
        let mut sim = SandboxSimulation::new(128, 96).with_minimal_threads();
        sim.reset(1, None).unwrap();
        let frame = sim.render().unwrap();
        assert!(frame.elements.iter().any(|e| e.layer == RenderLayer::Overlay));
        assert!(frame.elements.iter().any(|e| e.layer == RenderLayer::World));
        assert!(
            frame
                .elements
                .iter()
                .filter(|e| e.color == HUD_PANEL_COLOR || e.color == DEBUG_PANEL_COLOR)
                .all(|e| e.layer == RenderLayer::Overlay)
        );
    }
}
