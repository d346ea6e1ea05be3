//! The drawing capability shared by the on-screen [`Renderer`](crate::render::Renderer)
//! and off-screen [`Surface`]s.
//!
//! Implementors only provide access to their context, render target and state
//! stack. Everything else (state pushes, primitives, compositing) is provided
//! here, so both kinds of drawable behave identically apart from where their
//! pixels land.

use crate::errors::RenderError;
use crate::render::backend::{RenderTarget, RgbaImage, SurfaceSize};
use crate::render::{resolve_effect, Color, DrawState, Effect, Filter, GpuContext, Rect, StateStack, Surface};

pub trait Drawable {
    /// Context this drawable's pixels live in.
    fn gpu(&self) -> &GpuContext;

    /// Target that draw and copy operations on this drawable redirect to.
    fn render_target(&self) -> RenderTarget;

    fn state_stack(&self) -> &StateStack;

    fn state_stack_mut(&mut self) -> &mut StateStack;

    fn size(&self) -> SurfaceSize;

    /// Replaces the entire content with tightly packed RGBA8 pixels.
    ///
    /// The buffer must be exactly `width * height * 4` bytes long.
    fn replace_pixels(&mut self, pixels: &[u8]) -> Result<(), RenderError>;

    fn depth(&self) -> usize {
        self.state_stack().depth()
    }

    fn current_state(&self) -> &DrawState {
        self.state_stack().current()
    }

    fn push_translation(&mut self, dx: i32, dy: i32) {
        self.state_stack_mut().push_translation(dx, dy);
    }

    fn push_color(&mut self, color: Color) {
        self.state_stack_mut().push_color(color);
    }

    fn push_effect(&mut self, effect: Effect) {
        self.state_stack_mut().push_effect(effect);
    }

    fn push_brightness(&mut self, brightness: f64) {
        self.state_stack_mut().push_brightness(brightness);
    }

    fn push_filter(&mut self, filter: Filter) {
        self.state_stack_mut().push_filter(filter);
    }

    fn pop(&mut self) -> Result<(), RenderError> {
        self.state_stack_mut().pop()
    }

    fn pop_n(&mut self, n: usize) -> Result<(), RenderError> {
        self.state_stack_mut().pop_n(n)
    }

    /// Overwrites every pixel with `color`. Translation and tint are ignored.
    fn clear(&mut self, color: Color) -> Result<(), RenderError> {
        let target = self.render_target();
        let mut gpu = self.gpu().lock()?;
        gpu.redirect(target, |b| {
            b.set_draw_color(color);
            b.clear()
        })
    }

    /// Outlines a `width` x `height` rectangle at the current translation.
    fn draw_rect(&mut self, width: u32, height: u32, color: Color) -> Result<(), RenderError> {
        let state = *self.current_state();
        let rect = Rect::new(state.x, state.y, width, height);
        let target = self.render_target();

        let mut gpu = self.gpu().lock()?;
        gpu.redirect(target, |b| {
            b.set_draw_color(state.shade(color));
            b.draw_rect(rect)
        })
    }

    /// Draws a line from the current translation to `(dx, dy)` relative to it.
    fn draw_line(&mut self, dx: i32, dy: i32, color: Color) -> Result<(), RenderError> {
        let state = *self.current_state();
        let target = self.render_target();

        let mut gpu = self.gpu().lock()?;
        gpu.redirect(target, |b| {
            b.set_draw_color(state.shade(color));
            b.draw_line((state.x, state.y), (state.x.saturating_add(dx), state.y.saturating_add(dy)))
        })
    }

    /// Text needs a font collaborator, which this crate does not provide.
    fn draw_text(&mut self, _text: &str) -> Result<(), RenderError> {
        Err(RenderError::Unsupported("text rendering"))
    }

    /// Composites all of `source` at the current translation.
    ///
    /// The alpha and blend mode come from the effect on top of `source`'s own
    /// state stack, not this drawable's.
    fn render(&mut self, source: &Surface) -> Result<(), RenderError> {
        composite(&*self, source, None)
    }

    /// Composites `section` (in `source` pixel coordinates) at the current
    /// translation. Sections reaching outside `source` are rejected.
    fn render_section(&mut self, source: &Surface, section: Rect) -> Result<(), RenderError> {
        let size = source.size();
        if !section.fits_within(size.width, size.height) {
            return Err(RenderError::SectionOutOfBounds {
                section,
                width: size.width,
                height: size.height,
            });
        }
        composite(&*self, source, Some(section))
    }

    /// Reads back the current pixels, if the backend supports it.
    fn screenshot(&self) -> Result<RgbaImage, RenderError> {
        let target = self.render_target();
        let mut gpu = self.gpu().lock()?;
        gpu.redirect(target, |b| b.read_pixels())
    }
}

fn composite<D: Drawable + ?Sized>(dest: &D, source: &Surface, section: Option<Rect>) -> Result<(), RenderError> {
    if !dest.gpu().same_as(source.gpu()) {
        return Err(RenderError::ForeignSurface);
    }

    let (x, y) = dest.current_state().translation();
    let extent = section.map(|s| s.size()).unwrap_or_else(|| source.size());
    let dst = Rect::new(x, y, extent.width, extent.height);
    let texture = source.texture();
    let target = dest.render_target();

    // Resolved on every copy: the source may have pushed a new effect since the last one.
    let composite = resolve_effect(source.current_state().effect);

    let mut gpu = dest.gpu().lock()?;
    if let Some(c) = composite {
        gpu.set_alpha_mod(texture, c.alpha)?;
        gpu.set_blend_mode(texture, c.blend)?;
    }
    gpu.redirect(target, |b| b.copy(texture, section, dst))
}
