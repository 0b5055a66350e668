//! Scripted input injection for scenarios
//!
//! Events are consumed from a frame-indexed queue and folded into a
//! level-based input accumulator that is scoped to one scenario run.

use bevy::prelude::*;
use std::collections::HashSet;

use crate::constants::SETTLE_FRAMES;

use super::parser::{KeyDirection, ScheduledEvent, ScheduledKind};

/// Mouse click in screen pixels (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenClick {
    pub x: i32,
    pub y: i32,
    pub button: MouseButton,
}

/// Input handed to the simulation for one step
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub keys: ButtonInput<KeyCode>,
    pub mouse: ButtonInput<MouseButton>,
    /// Clicks scheduled on this frame, in declaration order
    pub clicks: Vec<ScreenClick>,
}

/// Scripted inputs for one scenario run
pub struct ScriptedInputs {
    events: Vec<ScheduledEvent>,
    /// Index of the next event not yet applied
    cursor: usize,
    /// Current frame number
    pub current_frame: u64,
    /// Last frame to step (highest event frame plus settle margin)
    pub max_frame: u64,
    state: FrameInput,
    /// Keys held by `press` that release before the next frame
    auto_release: HashSet<KeyCode>,
    /// Mouse buttons held by clicks on this frame
    clicked_buttons: HashSet<MouseButton>,
}

impl ScriptedInputs {
    /// Create from validated events (non-decreasing frames)
    pub fn new(events: Vec<ScheduledEvent>) -> Self {
        let max_frame = events
            .iter()
            .map(|e| e.frame)
            .max()
            .map(|f| f.saturating_add(SETTLE_FRAMES))
            .unwrap_or(0);

        Self {
            events,
            cursor: 0,
            current_frame: 0,
            max_frame,
            state: FrameInput::default(),
            auto_release: HashSet::new(),
            clicked_buttons: HashSet::new(),
        }
    }

    /// Check if the replay should step another frame
    pub fn should_continue(&self) -> bool {
        !self.events.is_empty() && self.current_frame <= self.max_frame
    }

    /// Pop the next event scheduled for the current frame, in declaration order
    pub fn next_due(&mut self) -> Option<ScheduledEvent> {
        let event = self.events.get(self.cursor)?;
        if event.frame != self.current_frame {
            return None;
        }
        self.cursor += 1;
        Some(event.clone())
    }

    /// Fold a key or click transition into the accumulated state.
    ///
    /// The last transition applied to a key on a frame decides what the step sees.
    pub fn apply(&mut self, event: &ScheduledEvent) {
        match &event.kind {
            ScheduledKind::Key { key, direction } => match direction {
                KeyDirection::Down => {
                    self.state.keys.press(*key);
                    self.auto_release.remove(key);
                }
                KeyDirection::Up => {
                    self.state.keys.release(*key);
                    self.auto_release.remove(key);
                }
                KeyDirection::Press => {
                    self.state.keys.press(*key);
                    self.auto_release.insert(*key);
                }
            },
            ScheduledKind::Click { x, y, button } => {
                self.state.mouse.press(*button);
                self.clicked_buttons.insert(*button);
                self.state.clicks.push(ScreenClick {
                    x: *x,
                    y: *y,
                    button: *button,
                });
            }
            ScheduledKind::Capture { .. } => {}
        }
    }

    /// Input the simulation steps with on the current frame
    pub fn frame_input(&self) -> &FrameInput {
        &self.state
    }

    /// Keys currently held, for diagnostics
    pub fn held_keys(&self) -> Vec<KeyCode> {
        self.state.keys.get_pressed().copied().collect()
    }

    /// Finish the current frame: drop edge state and release one-frame presses
    pub fn end_frame(&mut self) {
        self.state.keys.clear();
        self.state.mouse.clear();
        self.state.clicks.clear();

        for key in self.auto_release.drain() {
            self.state.keys.release(key);
        }
        for button in self.clicked_buttons.drain() {
            self.state.mouse.release(button);
        }

        self.current_frame += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(frame: u64, key: KeyCode, direction: KeyDirection) -> ScheduledEvent {
        ScheduledEvent {
            frame,
            kind: ScheduledKind::Key { key, direction },
        }
    }

    /// Replay all frames and record whether `probe` was held at each step
    fn held_per_frame(events: Vec<ScheduledEvent>, probe: KeyCode) -> Vec<bool> {
        let mut inputs = ScriptedInputs::new(events);
        let mut held = Vec::new();
        while inputs.should_continue() {
            while let Some(event) = inputs.next_due() {
                inputs.apply(&event);
            }
            held.push(inputs.frame_input().keys.pressed(probe));
            inputs.end_frame();
        }
        held
    }

    #[test]
    fn test_down_holds_until_up() {
        let held = held_per_frame(
            vec![
                key(1, KeyCode::KeyW, KeyDirection::Down),
                key(4, KeyCode::KeyW, KeyDirection::Up),
            ],
            KeyCode::KeyW,
        );
        assert_eq!(held, vec![false, true, true, true, false, false]);
    }

    #[test]
    fn test_press_holds_exactly_one_frame() {
        let held = held_per_frame(vec![key(2, KeyCode::KeyQ, KeyDirection::Press)], KeyCode::KeyQ);
        assert_eq!(held, vec![false, false, true, false]);
    }

    #[test]
    fn test_last_transition_on_frame_wins() {
        let held = held_per_frame(
            vec![
                key(0, KeyCode::KeyA, KeyDirection::Down),
                key(0, KeyCode::KeyA, KeyDirection::Up),
            ],
            KeyCode::KeyA,
        );
        assert_eq!(held, vec![false, false]);

        let held = held_per_frame(
            vec![
                key(0, KeyCode::KeyA, KeyDirection::Press),
                key(0, KeyCode::KeyA, KeyDirection::Down),
            ],
            KeyCode::KeyA,
        );
        assert_eq!(held, vec![true, true]);
    }

    #[test]
    fn test_events_popped_in_declaration_order() {
        let events = vec![
            key(0, KeyCode::KeyA, KeyDirection::Down),
            ScheduledEvent {
                frame: 0,
                kind: ScheduledKind::Capture {
                    filename: "a.png".to_string(),
                },
            },
            key(0, KeyCode::KeyB, KeyDirection::Down),
            key(2, KeyCode::KeyC, KeyDirection::Down),
        ];
        let mut inputs = ScriptedInputs::new(events.clone());
        assert_eq!(inputs.next_due(), Some(events[0].clone()));
        assert_eq!(inputs.next_due(), Some(events[1].clone()));
        assert_eq!(inputs.next_due(), Some(events[2].clone()));
        assert_eq!(inputs.next_due(), None);
        inputs.end_frame();
        assert_eq!(inputs.next_due(), None);
        inputs.end_frame();
        assert_eq!(inputs.next_due(), Some(events[3].clone()));
    }

    #[test]
    fn test_click_lasts_one_frame() {
        let mut inputs = ScriptedInputs::new(vec![ScheduledEvent {
            frame: 0,
            kind: ScheduledKind::Click {
                x: 5,
                y: 6,
                button: MouseButton::Left,
            },
        }]);
        let event = inputs.next_due().unwrap();
        inputs.apply(&event);
        assert_eq!(inputs.frame_input().clicks.len(), 1);
        assert!(inputs.frame_input().mouse.just_pressed(MouseButton::Left));
        inputs.end_frame();
        assert!(inputs.frame_input().clicks.is_empty());
        assert!(!inputs.frame_input().mouse.pressed(MouseButton::Left));
    }

    #[test]
    fn test_empty_schedule_never_steps() {
        let inputs = ScriptedInputs::new(Vec::new());
        assert!(!inputs.should_continue());
    }
}
