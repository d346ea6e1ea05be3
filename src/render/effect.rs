//! Effect to alpha/blend resolution.
//!
//! Drawables carry an abstract [`Effect`] in their draw state. When a surface
//! is copied onto another drawable the effect of the *source* surface is
//! resolved here into the alpha modulation and blend mode applied to its
//! texture.

use crate::render::backend::BlendMode;
use crate::render::Effect;

/// Concrete texture configuration for a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Composite {
    pub alpha: u8,
    pub blend: BlendMode,
}

impl Composite {
    const fn new(alpha: u8, blend: BlendMode) -> Self {
        Self { alpha, blend }
    }
}

/// Resolves `effect` into a texture configuration.
///
/// Returns `None` for `Burn`, `Normal`, `Mod2X` and `Mod2XTransparent`: these
/// have no defined mapping and leave whatever alpha/blend the texture already
/// carries untouched.
pub fn resolve_effect(effect: Effect) -> Option<Composite> {
    match effect {
        Effect::None => Some(Composite::new(255, BlendMode::Blend)),
        Effect::Transparency75 => Some(Composite::new(192, BlendMode::Blend)),
        Effect::Transparency50 => Some(Composite::new(128, BlendMode::Blend)),
        Effect::Transparency25 => Some(Composite::new(64, BlendMode::Blend)),
        Effect::Modulate => Some(Composite::new(255, BlendMode::Add)),
        // TODO: map burn and the mod2x variants once their intended blend equations are pinned down
        Effect::Burn | Effect::Normal | Effect::Mod2X | Effect::Mod2XTransparent => None,
    }
}
