//! Stateful 2D drawing on top of a pluggable rendering backend.
//!
//! Client code draws through the [`Drawable`](render::Drawable) trait, which
//! the on-screen [`Renderer`](render::Renderer) and off-screen
//! [`Surface`](render::Surface)s both implement: nested translation, tint,
//! brightness and effect state, primitive drawing, and compositing one surface
//! onto another with effect-dependent alpha and blending.

pub mod clock;
pub mod config;
pub mod errors;
pub mod event;
pub mod input;
pub mod render;

pub use config::{BackendKind, RendererConfig};
pub use errors::{ErrorClass, RenderError};
pub use render::{Drawable, Renderer, Surface};
