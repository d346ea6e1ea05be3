//! Edge detection over polled input levels.
//!
//! The tracker keeps only the latest transition per button or key: its level
//! and the millisecond timestamp at which it changed. "Just pressed" and "just
//! released" are derived from that pair: the level must match and the
//! transition must be younger than [`JUST_CHANGED_WINDOW_MS`].
//!
//! The window is measured in wall-clock time, not frames. At very low frame
//! rates an edge can expire before any frame observes it, and at very high
//! rates several consecutive frames observe the same edge.
//!
//! ```
//! use gosub_render2d::event::{InputEvent, MouseButton};
//! use gosub_render2d::input::InputTracker;
//!
//! let mut input = InputTracker::new();
//! input.apply(InputEvent::Button { button: MouseButton::Left, pressed: true, timestamp_ms: 0 });
//! assert!(input.is_just_pressed(MouseButton::Left, 10));
//! assert!(!input.is_just_pressed(MouseButton::Left, 30));
//! ```

use std::collections::HashMap;

use crate::event::{InputEvent, Key, MouseButton};

/// Transitions younger than this many milliseconds count as "just" happened.
pub const JUST_CHANGED_WINDOW_MS: u64 = 25;

/// Level and last transition time of one button or key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub pressed: bool,
    pub changed_at_ms: u64,
}

impl ButtonState {
    #[inline]
    fn recent(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.changed_at_ms) < JUST_CHANGED_WINDOW_MS
    }

    pub fn is_just_pressed(&self, now_ms: u64) -> bool {
        self.pressed && self.recent(now_ms)
    }

    pub fn is_just_released(&self, now_ms: u64) -> bool {
        !self.pressed && self.recent(now_ms)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    /// `None` until the first transition of that button.
    buttons: [Option<ButtonState>; 3],
    keys: HashMap<Key, ButtonState>,
    chars: Vec<char>,
    cursor: (i32, i32),
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a raw transition. The previous transition is overwritten.
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Button { button, pressed, timestamp_ms } => {
                self.buttons[button.index()] = Some(ButtonState { pressed, changed_at_ms: timestamp_ms });
            }
            InputEvent::Key { key, pressed, timestamp_ms } => {
                self.keys.insert(key, ButtonState { pressed, changed_at_ms: timestamp_ms });
            }
        }
    }

    /// Buttons and keys never seen report as released, with no recent transition.
    pub fn button(&self, button: MouseButton) -> Option<ButtonState> {
        self.buttons[button.index()]
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.button(button).is_some_and(|b| b.pressed)
    }

    pub fn is_just_pressed(&self, button: MouseButton, now_ms: u64) -> bool {
        self.button(button).is_some_and(|b| b.is_just_pressed(now_ms))
    }

    pub fn is_just_released(&self, button: MouseButton, now_ms: u64) -> bool {
        self.button(button).is_some_and(|b| b.is_just_released(now_ms))
    }

    pub fn key(&self, key: Key) -> Option<ButtonState> {
        self.keys.get(&key).copied()
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.key(key).is_some_and(|k| k.pressed)
    }

    pub fn is_key_just_pressed(&self, key: Key, now_ms: u64) -> bool {
        self.key(key).is_some_and(|k| k.is_just_pressed(now_ms))
    }

    pub fn is_key_just_released(&self, key: Key, now_ms: u64) -> bool {
        self.key(key).is_some_and(|k| k.is_just_released(now_ms))
    }

    /// How long `key` has been held, or 0 when it is up.
    pub fn key_press_duration(&self, key: Key, now_ms: u64) -> u64 {
        match self.key(key) {
            Some(k) if k.pressed => now_ms.saturating_sub(k.changed_at_ms),
            _ => 0,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.chars.push(c);
    }

    /// Characters typed since the last [`begin_frame`](Self::begin_frame).
    pub fn input_chars(&self) -> &[char] {
        &self.chars
    }

    /// Drops per-frame text input. Level state is kept.
    pub fn begin_frame(&mut self) {
        self.chars.clear();
    }

    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = (x, y);
    }

    pub fn cursor_position(&self) -> (i32, i32) {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(pressed: bool, t: u64) -> InputEvent {
        InputEvent::Button { button: MouseButton::Left, pressed, timestamp_ms: t }
    }

    #[test]
    fn press_then_release_edges() {
        let mut input = InputTracker::new();
        input.apply(button(true, 0));
        assert!(input.is_just_pressed(MouseButton::Left, 10));
        assert!(!input.is_just_pressed(MouseButton::Left, 30));
        assert!(input.is_pressed(MouseButton::Left));

        input.apply(button(false, 30));
        assert!(input.is_just_released(MouseButton::Left, 40));
        assert!(!input.is_just_pressed(MouseButton::Left, 40));
        assert!(!input.is_pressed(MouseButton::Left));
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let mut input = InputTracker::new();
        input.apply(button(true, 100));
        assert!(input.is_just_pressed(MouseButton::Left, 124));
        assert!(!input.is_just_pressed(MouseButton::Left, 125));
    }

    #[test]
    fn repeated_polling_does_not_consume_edge() {
        let mut input = InputTracker::new();
        input.apply(button(true, 0));
        for _ in 0..50 {
            assert!(input.is_just_pressed(MouseButton::Left, 5));
        }
        assert!(!input.is_just_pressed(MouseButton::Left, 25));
    }

    #[test]
    fn only_last_transition_is_kept() {
        let mut input = InputTracker::new();
        input.apply(button(true, 0));
        input.apply(button(false, 2));
        input.apply(button(true, 4));
        assert!(input.is_just_pressed(MouseButton::Left, 6));
        assert!(!input.is_just_released(MouseButton::Left, 6));
        assert_eq!(input.button(MouseButton::Left).map(|b| b.changed_at_ms), Some(4));
    }

    #[test]
    fn fresh_tracker_reports_no_edges() {
        let input = InputTracker::new();
        for button in [MouseButton::Left, MouseButton::Middle, MouseButton::Right] {
            assert!(input.button(button).is_none());
            assert!(!input.is_pressed(button));
            assert!(!input.is_just_pressed(button, 10));
            assert!(!input.is_just_released(button, 10));
        }
        assert_eq!(input.is_just_released(MouseButton::Left, 10), input.is_key_just_released(Key::Space, 10));
    }

    #[test]
    fn buttons_are_independent() {
        let mut input = InputTracker::new();
        input.apply(InputEvent::Button { button: MouseButton::Right, pressed: true, timestamp_ms: 0 });
        assert!(input.is_pressed(MouseButton::Right));
        assert!(!input.is_pressed(MouseButton::Left));
        assert!(!input.is_pressed(MouseButton::Middle));
    }

    #[test]
    fn timestamp_in_the_future_counts_as_recent() {
        let mut input = InputTracker::new();
        input.apply(button(true, 50));
        assert!(input.is_just_pressed(MouseButton::Left, 40));
    }

    #[test]
    fn keys_track_edges_and_duration() {
        let mut input = InputTracker::new();
        assert!(!input.is_key_pressed(Key::Space));
        assert!(!input.is_key_just_released(Key::Space, 0));

        input.apply(InputEvent::Key { key: Key::Space, pressed: true, timestamp_ms: 1000 });
        assert!(input.is_key_just_pressed(Key::Space, 1010));
        assert_eq!(input.key_press_duration(Key::Space, 1500), 500);

        input.apply(InputEvent::Key { key: Key::Space, pressed: false, timestamp_ms: 1600 });
        assert!(input.is_key_just_released(Key::Space, 1601));
        assert_eq!(input.key_press_duration(Key::Space, 1700), 0);
    }

    #[test]
    fn chars_are_per_frame() {
        let mut input = InputTracker::new();
        input.push_char('h');
        input.push_char('i');
        assert_eq!(input.input_chars(), &['h', 'i']);
        input.begin_frame();
        assert!(input.input_chars().is_empty());
    }
}
