pub mod backend;
pub mod backends;

mod color;
mod context;
mod drawable;
mod effect;
mod rect;
mod renderer;
mod state;
mod surface;

pub use color::Color;
pub use context::{ContextGuard, GpuContext};
pub use drawable::Drawable;
pub use effect::{resolve_effect, Composite};
pub use rect::Rect;
pub use renderer::Renderer;
pub use state::{DrawState, Effect, Filter, StateStack};
pub use surface::{Surface, SurfaceFactory};
