use crate::render::backend::{BackendError, TextureId};
use crate::render::Rect;

/// Broad classification of a [`RenderError`].
///
/// Resource and presentation failures come from the environment. Usage contract
/// violations are caller bugs (unbalanced push/pop, wrongly sized buffers) and
/// should never be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ResourceCreation,
    UsageContract,
    Presentation,
    Unsupported,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Resource creation failed: {0}")]
    ResourceCreation(String),

    #[error("Drawing state stack underflow (pop without matching push)")]
    StackUnderflow,

    #[error("Pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    PixelSizeMismatch { expected: usize, actual: usize },

    #[error("Section {section:?} exceeds source bounds {width}x{height}")]
    SectionOutOfBounds { section: Rect, width: u32, height: u32 },

    #[error("Invalid texture handle {0}")]
    InvalidTexture(TextureId),

    #[error("Surface belongs to a different rendering context")]
    ForeignSurface,

    #[error("Presentation error: {0}")]
    Presentation(String),

    #[error("Rendering context lock poisoned")]
    ContextPoisoned,

    #[error("{0} is not supported")]
    Unsupported(&'static str),

    #[error("Draw callback failed: {0}")]
    Callback(anyhow::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RenderError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RenderError::ResourceCreation(_) | RenderError::Config(_) => ErrorClass::ResourceCreation,
            RenderError::StackUnderflow
            | RenderError::PixelSizeMismatch { .. }
            | RenderError::SectionOutOfBounds { .. }
            | RenderError::InvalidTexture(_)
            | RenderError::ForeignSurface => ErrorClass::UsageContract,
            RenderError::Presentation(_) | RenderError::ContextPoisoned | RenderError::Callback(_) => {
                ErrorClass::Presentation
            }
            RenderError::Unsupported(_) => ErrorClass::Unsupported,
        }
    }

    /// Returns true for caller bugs rather than environment failures.
    pub fn is_usage_violation(&self) -> bool {
        self.class() == ErrorClass::UsageContract
    }
}

impl From<BackendError> for RenderError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::UnknownTexture(id) => RenderError::InvalidTexture(id),
            BackendError::Allocation(msg) => RenderError::ResourceCreation(msg),
            BackendError::Unsupported(what) => RenderError::Unsupported(what),
            BackendError::Device(msg) => RenderError::Presentation(msg),
        }
    }
}
