//! Nested drawing state.
//!
//! Every drawable owns a [`StateStack`]: one current [`DrawState`] plus the
//! saved snapshots of every unmatched push. Each `push_*` saves a copy of the
//! current state and then changes exactly one field of it; `pop` restores the
//! most recent snapshot.
//!
//! ```
//! use gosub_render2d::render::{StateStack, Effect};
//!
//! let mut stack = StateStack::new();
//! stack.push_translation(3, 4);
//! stack.push_effect(Effect::Transparency50);
//! assert_eq!(stack.depth(), 2);
//! stack.pop_n(2).unwrap();
//! assert_eq!(stack.current().translation(), (0, 0));
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::render::Color;

/// Abstract compositing mode, resolved to alpha + blend mode at copy time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Effect {
    #[default]
    None,
    #[serde(rename = "transparency-25")]
    Transparency25,
    #[serde(rename = "transparency-50")]
    Transparency50,
    #[serde(rename = "transparency-75")]
    Transparency75,
    Modulate,
    Burn,
    Normal,
    #[serde(rename = "mod2x")]
    Mod2X,
    #[serde(rename = "mod2x-transparent")]
    Mod2XTransparent,
}

/// Texture sampling filter. Recorded but not acted upon by the backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    #[default]
    Default,
    Nearest,
    Linear,
}

/// One frame of nested drawing configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    /// Cumulative horizontal translation.
    pub x: i32,
    /// Cumulative vertical translation.
    pub y: i32,
    /// Tint override, `None` when no tint is active.
    pub color: Option<Color>,
    /// RGB multiplier for primitives, `1.0` is neutral.
    pub brightness: f64,
    pub effect: Effect,
    pub filter: Filter,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            color: None,
            brightness: 1.0,
            effect: Effect::None,
            filter: Filter::Default,
        }
    }
}

impl DrawState {
    pub fn translation(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Applies the active tint and brightness to a primitive colour.
    pub fn shade(&self, color: Color) -> Color {
        let tinted = match self.color {
            Some(tint) => color.modulate(tint),
            None => color,
        };
        if self.brightness == 1.0 {
            tinted
        } else {
            tinted.scale_rgb(self.brightness)
        }
    }
}

/// Save/restore stack of [`DrawState`] snapshots.
#[derive(Debug, Clone, Default)]
pub struct StateStack {
    saved: Vec<DrawState>,
    current: DrawState,
}

impl StateStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saved (unmatched) pushes.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn current(&self) -> &DrawState {
        &self.current
    }

    #[inline]
    fn save(&mut self) -> &mut DrawState {
        self.saved.push(self.current);
        &mut self.current
    }

    /// Translation is additive across pushes and saturates at the `i32` range.
    pub fn push_translation(&mut self, dx: i32, dy: i32) {
        let state = self.save();
        state.x = state.x.saturating_add(dx);
        state.y = state.y.saturating_add(dy);
    }

    pub fn push_color(&mut self, color: Color) {
        self.save().color = Some(color);
    }

    pub fn push_effect(&mut self, effect: Effect) {
        self.save().effect = effect;
    }

    pub fn push_brightness(&mut self, brightness: f64) {
        self.save().brightness = brightness;
    }

    pub fn push_filter(&mut self, filter: Filter) {
        self.save().filter = filter;
    }

    /// Restores the most recently saved state.
    ///
    /// Popping an empty stack is an unbalanced push/pop in the caller and
    /// returns [`RenderError::StackUnderflow`] without touching the current state.
    pub fn pop(&mut self) -> Result<(), RenderError> {
        let previous = self.saved.pop().ok_or(RenderError::StackUnderflow)?;
        self.current = previous;
        Ok(())
    }

    /// Pops `n` times. Not atomic: on underflow the pops already done stay done.
    pub fn pop_n(&mut self, n: usize) -> Result<(), RenderError> {
        for _ in 0..n {
            self.pop()?;
        }
        Ok(())
    }
}
