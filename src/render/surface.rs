//! Off-screen drawables.
//!
//! A [`Surface`] exclusively owns one backend texture and releases it when
//! dropped. Surfaces are created through [`Renderer::new_surface`] or, from
//! other threads, through a [`SurfaceFactory`].
//!
//! [`Renderer::new_surface`]: crate::render::Renderer::new_surface

use crate::errors::RenderError;
use crate::render::backend::{RenderTarget, SurfaceSize, TextureId};
use crate::render::{Drawable, Filter, GpuContext, StateStack};

pub struct Surface {
    gpu: GpuContext,
    texture: TextureId,
    size: SurfaceSize,
    filter: Filter,
    state: StateStack,
    /// Last successfully uploaded pixel buffer. Kept for inspection only.
    pixels: Option<Vec<u8>>,
}

impl Surface {
    pub(crate) fn create(gpu: &GpuContext, size: SurfaceSize, filter: Filter) -> Result<Self, RenderError> {
        let texture = gpu.lock()?.create_texture(size)?;
        log::debug!("Created surface {}x{} (texture {texture})", size.width, size.height);

        Ok(Self {
            gpu: gpu.clone(),
            texture,
            size,
            filter,
            state: StateStack::new(),
            pixels: None,
        })
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Filter hint given at creation.
    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }
}

impl Drawable for Surface {
    fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    fn render_target(&self) -> RenderTarget {
        RenderTarget::Texture(self.texture)
    }

    fn state_stack(&self) -> &StateStack {
        &self.state
    }

    fn state_stack_mut(&mut self) -> &mut StateStack {
        &mut self.state
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn replace_pixels(&mut self, pixels: &[u8]) -> Result<(), RenderError> {
        let expected = self.size.rgba_len();
        if pixels.len() != expected {
            return Err(RenderError::PixelSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        self.gpu.lock()?.update_texture(self.texture, pixels)?;
        self.pixels = Some(pixels.to_vec());
        Ok(())
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        match self.gpu.lock() {
            Ok(mut gpu) => {
                gpu.destroy_texture(self.texture);
                log::debug!("Released surface texture {}", self.texture);
            }
            Err(e) => log::warn!("Leaking texture {}: {e}", self.texture),
        }
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("texture", &self.texture)
            .field("size", &self.size)
            .field("depth", &self.state.depth())
            .finish()
    }
}

/// Cloneable handle for creating surfaces away from the frame loop thread,
/// e.g. from an asset loader. Creation and uploads still serialise on the
/// renderer's context.
#[derive(Clone, Debug)]
pub struct SurfaceFactory {
    gpu: GpuContext,
}

impl SurfaceFactory {
    pub(crate) fn new(gpu: GpuContext) -> Self {
        Self { gpu }
    }

    pub fn new_surface(&self, width: u32, height: u32, filter: Filter) -> Result<Surface, RenderError> {
        Surface::create(&self.gpu, SurfaceSize::new(width, height), filter)
    }

    /// Creates a surface and uploads `pixels` into it.
    pub fn surface_from_pixels(&self, width: u32, height: u32, pixels: &[u8]) -> Result<Surface, RenderError> {
        let mut surface = self.new_surface(width, height, Filter::Default)?;
        surface.replace_pixels(pixels)?;
        Ok(surface)
    }
}
