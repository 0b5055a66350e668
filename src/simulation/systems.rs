//! Sandbox systems, run once per step in a fixed chain

use bevy::prelude::*;
use std::time::Instant;

use crate::constants::*;

use super::control::{
    ClickMarker, Drifter, HudClock, PendingClicks, SceneCamera, SimControl, WorldRect,
};

/// Upper bound on click markers before the sandbox reports a fault
pub const MAX_CLICK_MARKERS: usize = 256;

/// Pan with WASD/arrows, zoom with Q (in) and E (out)
pub fn camera_control(keyboard: Res<ButtonInput<KeyCode>>, mut camera: ResMut<SceneCamera>) {
    let mut pan = Vec2::ZERO;

    if keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp) {
        pan.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown) {
        pan.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft) {
        pan.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight) {
        pan.x += 1.0;
    }

    camera.position += pan * CAMERA_PAN_PER_STEP;

    if keyboard.pressed(KeyCode::KeyQ) {
        camera.zoom = (camera.zoom * CAMERA_ZOOM_PER_STEP).min(CAMERA_MAX_ZOOM);
    }
    if keyboard.pressed(KeyCode::KeyE) {
        camera.zoom = (camera.zoom / CAMERA_ZOOM_PER_STEP).max(CAMERA_MIN_ZOOM);
    }
}

/// Drop a marker at the world position under each click
pub fn spawn_click_markers(
    mut commands: Commands,
    clicks: Res<PendingClicks>,
    camera: Res<SceneCamera>,
    mut control: ResMut<SimControl>,
    markers: Query<(), With<ClickMarker>>,
) {
    if clicks.0.is_empty() {
        return;
    }

    if markers.iter().count() + clicks.0.len() > MAX_CLICK_MARKERS {
        control.faults.push(format!(
            "click marker budget of {} exceeded",
            MAX_CLICK_MARKERS
        ));
        return;
    }

    let viewport = control.viewport;
    for click in &clicks.0 {
        let world = camera.screen_to_world(Vec2::new(click.x as f32, click.y as f32), viewport);
        let color = match click.button {
            MouseButton::Right => MARKER_RIGHT_COLOR,
            MouseButton::Middle => MARKER_MIDDLE_COLOR,
            _ => MARKER_LEFT_COLOR,
        };
        let order = control.next_draw_order();
        commands.spawn((
            Transform::from_translation(world.extend(2.0)),
            WorldRect {
                size: CLICK_MARKER_SIZE,
                color,
            },
            order,
            ClickMarker,
        ));
    }
}

/// Move drifters with a fixed timestep, bouncing off the world bounds
pub fn move_drifters(mut drifters: Query<(&mut Transform, &mut Drifter)>) {
    for (mut transform, mut drifter) in &mut drifters {
        let mut pos = transform.translation.truncate() + drifter.velocity * SIM_DT;

        if pos.x.abs() > WORLD_HALF_EXTENT {
            drifter.velocity.x = -drifter.velocity.x;
            pos.x = pos.x.clamp(-WORLD_HALF_EXTENT, WORLD_HALF_EXTENT);
        }
        if pos.y.abs() > WORLD_HALF_EXTENT {
            drifter.velocity.y = -drifter.velocity.y;
            pos.y = pos.y.clamp(-WORLD_HALF_EXTENT, WORLD_HALF_EXTENT);
        }

        transform.translation.x = pos.x;
        transform.translation.y = pos.y;
    }
}

/// Report states the sandbox cannot render
pub fn check_invariants(camera: Res<SceneCamera>, mut control: ResMut<SimControl>) {
    if !camera.position.is_finite() {
        control
            .faults
            .push(format!("camera position is not finite: {:?}", camera.position));
    }
    if !camera.zoom.is_finite() || camera.zoom <= 0.0 {
        control
            .faults
            .push(format!("camera zoom is unusable: {}", camera.zoom));
    }
}

/// Measure wall-clock step rate for the HUD's FPS meter
pub fn update_hud_clock(mut clock: ResMut<HudClock>) {
    let now = Instant::now();
    if let Some(last) = clock.last_step {
        let elapsed = now.duration_since(last).as_secs_f32();
        if elapsed > 0.0 {
            clock.fps = 1.0 / elapsed;
        }
    }
    clock.last_step = Some(now);
}

pub fn advance_frame(mut control: ResMut<SimControl>) {
    control.frame += 1;
}
