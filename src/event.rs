use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub(crate) fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MouseButton::Left => "Left",
            MouseButton::Middle => "Middle",
            MouseButton::Right => "Right",
        };
        f.write_str(s)
    }
}

/// Logical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Shift,
    Control,
    Alt,
    /// Function key `F1` ..= `F12`.
    F(u8),
    /// Printable key, identified by its unshifted character.
    Char(char),
    /// Backend specific scancode with no logical mapping.
    Other(u32),
}

/// Events produced by the presentation layer and drained by the frame loop.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Quit,
    MouseMotion { x: i32, y: i32 },
    MouseButton { button: MouseButton, pressed: bool },
    Key { key: Key, pressed: bool },
    Text(char),
    Resize { width: u32, height: u32 },
}

/// Raw, timestamped level transition fed into the [`InputTracker`](crate::input::InputTracker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Button { button: MouseButton, pressed: bool, timestamp_ms: u64 },
    Key { key: Key, pressed: bool, timestamp_ms: u64 },
}

/// Shared FIFO of pending window events.
///
/// Software-driven backends own one and hand out clones so hosts (and tests)
/// can inject events from anywhere.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<WindowEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: WindowEvent) {
        match self.inner.lock() {
            Ok(mut q) => q.push_back(event),
            Err(_) => log::warn!("event queue poisoned, dropping {event:?}"),
        }
    }

    pub fn pop(&self) -> Option<WindowEvent> {
        self.inner.lock().ok()?.pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
