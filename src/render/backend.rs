use std::any::Any;
use std::fmt;

use uuid::Uuid;

use crate::event::WindowEvent;
use crate::render::{Color, Rect};

/// Size of a surface in pixels. It's a simple struct to hold width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of bytes an RGBA8 buffer of this size occupies.
    pub fn rgba_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Straight (non-premultiplied) RGBA, one byte per channel.
    Rgba8,
}

/// RGBA snapshot read back from a render target.
#[derive(Clone)]
pub struct RgbaImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: PixelFormat,
}

impl RgbaImage {
    pub fn from_raw(pixels: Vec<u8>, width: u32, height: u32, stride: u32, format: PixelFormat) -> Self {
        assert!(
            pixels.len() >= (height as usize) * (stride as usize),
            "pixel buffer too small for image dimensions"
        );

        Self {
            pixels,
            width,
            height,
            stride,
            format,
        }
    }

    /// Returns the pixel at `(x, y)`, or `None` when outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = y as usize * self.stride as usize + x as usize * 4;
        let px = self.pixels.get(off..off + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl fmt::Debug for RgbaImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RgbaImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.pixels.len())
            .finish()
    }
}

/// Opaque handle to a texture owned by a backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(Uuid);

impl TextureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TextureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where draw and copy operations currently land.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RenderTarget {
    /// The on-screen presentation target.
    #[default]
    Window,
    /// An off-screen texture.
    Texture(TextureId),
}

/// How a texture is combined with the target when copied.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Overwrite the destination.
    None,
    /// Straight alpha blending.
    #[default]
    Blend,
    /// Additive: `dst + src * alpha`.
    Add,
    /// Modulate: `dst * src`.
    Mod,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("unknown texture {0}")]
    UnknownTexture(TextureId),

    #[error("allocation failed: {0}")]
    Allocation(String),

    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),

    #[error("device error: {0}")]
    Device(String),
}

/// Core backend interface, modelled on an immediate-mode 2D GPU renderer.
///
/// A backend is a single piece of mutable context-wide state (most notably the
/// active render target). Callers never touch it directly: all access goes
/// through [`GpuContext`](crate::render::GpuContext), which serialises it.
pub trait RenderBackend: Any + Send {
    /// Human readable name of the backend.
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Sets the window title and the physical window size.
    fn set_window(&mut self, title: &str, size: SurfaceSize) -> Result<(), BackendError>;

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), BackendError>;

    fn set_vsync(&mut self, vsync: bool) -> Result<(), BackendError>;

    /// Logical size of the presentation target. Drawing coordinates are in this space.
    fn logical_size(&self) -> SurfaceSize;

    /// Pops the next pending window event, if any.
    fn poll_event(&mut self) -> Option<WindowEvent>;

    /// Allocates a render-target capable texture.
    fn create_texture(&mut self, size: SurfaceSize) -> Result<TextureId, BackendError>;

    /// Releases a texture. Unknown handles are ignored.
    fn destroy_texture(&mut self, texture: TextureId);

    /// Replaces the entire content of a texture with tightly packed RGBA8 pixels.
    fn update_texture(&mut self, texture: TextureId, pixels: &[u8]) -> Result<(), BackendError>;

    fn set_alpha_mod(&mut self, texture: TextureId, alpha: u8) -> Result<(), BackendError>;

    fn set_blend_mode(&mut self, texture: TextureId, mode: BlendMode) -> Result<(), BackendError>;

    fn set_render_target(&mut self, target: RenderTarget) -> Result<(), BackendError>;

    fn render_target(&self) -> RenderTarget;

    fn set_draw_color(&mut self, color: Color);

    /// Outlines `rect` with the draw colour.
    fn draw_rect(&mut self, rect: Rect) -> Result<(), BackendError>;

    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32)) -> Result<(), BackendError>;

    /// Copies `src` of `texture` (or all of it) into `dst` on the current target.
    fn copy(&mut self, texture: TextureId, src: Option<Rect>, dst: Rect) -> Result<(), BackendError>;

    /// Overwrites the whole current target with the draw colour.
    fn clear(&mut self) -> Result<(), BackendError>;

    fn present(&mut self) -> Result<(), BackendError>;

    /// Reads back the pixels of the current target.
    fn read_pixels(&mut self) -> Result<RgbaImage, BackendError>;
}
