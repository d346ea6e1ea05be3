use std::any::Any;
use std::collections::HashMap;

use crate::event::{EventQueue, WindowEvent};
use crate::render::backend::{
    BackendError, BlendMode, RenderBackend, RenderTarget, RgbaImage, SurfaceSize, TextureId,
};
use crate::render::{Color, Rect};

/// A backend call as seen by the [`NullBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    SetWindow { title: String, size: SurfaceSize },
    SetFullscreen(bool),
    SetVsync(bool),
    CreateTexture { texture: TextureId, size: SurfaceSize },
    DestroyTexture(TextureId),
    UpdateTexture { texture: TextureId, len: usize },
    SetAlphaMod { texture: TextureId, alpha: u8 },
    SetBlendMode { texture: TextureId, mode: BlendMode },
    SetRenderTarget(RenderTarget),
    SetDrawColor(Color),
    DrawRect(Rect),
    DrawLine { from: (i32, i32), to: (i32, i32) },
    Copy { texture: TextureId, src: Option<Rect>, dst: Rect, target: RenderTarget },
    Clear,
    Present,
}

#[derive(Debug, Clone, Copy)]
struct NullTexture {
    size: SurfaceSize,
    alpha: u8,
}

/// Backend that draws nothing.
///
/// It still validates texture handles and render targets like a real device.
/// A backend created with [`NullBackend::recording`] also journals every call
/// so callers can inspect exactly what was issued.
pub struct NullBackend {
    logical: SurfaceSize,
    textures: HashMap<TextureId, NullTexture>,
    target: RenderTarget,
    /// `None` unless recording.
    calls: Option<Vec<BackendCall>>,
    events: EventQueue,
    /// Frame ID, bumped on every present.
    frame_id: u64,
    fail_clear: bool,
    fail_present: bool,
    texture_limit: Option<usize>,
}

impl NullBackend {
    /// Creates a new null backend with the given logical size.
    pub fn new(logical: SurfaceSize) -> Self {
        Self {
            logical,
            textures: HashMap::new(),
            target: RenderTarget::Window,
            calls: None,
            events: EventQueue::new(),
            frame_id: 0,
            fail_clear: false,
            fail_present: false,
            texture_limit: None,
        }
    }

    /// Like [`NullBackend::new`], but journals every call.
    pub fn recording(logical: SurfaceSize) -> Self {
        Self {
            calls: Some(Vec::new()),
            ..Self::new(logical)
        }
    }

    /// Handle for injecting window events.
    pub fn events(&self) -> EventQueue {
        self.events.clone()
    }

    /// Journalled calls, always empty unless recording.
    pub fn calls(&self) -> &[BackendCall] {
        self.calls.as_deref().unwrap_or_default()
    }

    pub fn clear_calls(&mut self) {
        if let Some(calls) = self.calls.as_mut() {
            calls.clear();
        }
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn texture_alpha(&self, texture: TextureId) -> Option<u8> {
        self.textures.get(&texture).map(|t| t.alpha)
    }

    /// Makes every following `clear` fail with a device error.
    pub fn fail_clears(&mut self, fail: bool) {
        self.fail_clear = fail;
    }

    /// Makes every following `present` fail with a device error.
    pub fn fail_presents(&mut self, fail: bool) {
        self.fail_present = fail;
    }

    /// Caps the number of live textures; allocations beyond it fail.
    pub fn limit_textures(&mut self, limit: Option<usize>) {
        self.texture_limit = limit;
    }

    fn record(&mut self, call: BackendCall) {
        if let Some(calls) = self.calls.as_mut() {
            calls.push(call);
        }
    }

    fn texture_mut(&mut self, texture: TextureId) -> Result<&mut NullTexture, BackendError> {
        self.textures.get_mut(&texture).ok_or(BackendError::UnknownTexture(texture))
    }
}

impl RenderBackend for NullBackend {
    fn name(&self) -> &str {
        "NullBackend"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn set_window(&mut self, title: &str, size: SurfaceSize) -> Result<(), BackendError> {
        self.record(BackendCall::SetWindow { title: title.to_string(), size });
        Ok(())
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), BackendError> {
        self.record(BackendCall::SetFullscreen(fullscreen));
        Ok(())
    }

    fn set_vsync(&mut self, vsync: bool) -> Result<(), BackendError> {
        self.record(BackendCall::SetVsync(vsync));
        Ok(())
    }

    fn logical_size(&self) -> SurfaceSize {
        self.logical
    }

    fn poll_event(&mut self) -> Option<WindowEvent> {
        self.events.pop()
    }

    fn create_texture(&mut self, size: SurfaceSize) -> Result<TextureId, BackendError> {
        if size.is_empty() {
            return Err(BackendError::Allocation(format!(
                "zero-sized texture {}x{}",
                size.width, size.height
            )));
        }
        if let Some(limit) = self.texture_limit {
            if self.textures.len() >= limit {
                return Err(BackendError::Allocation(format!("texture limit of {limit} reached")));
            }
        }

        let texture = TextureId::new();
        self.textures.insert(
            texture,
            NullTexture { size, alpha: 255 },
        );
        self.record(BackendCall::CreateTexture { texture, size });
        Ok(texture)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_some() {
            if self.target == RenderTarget::Texture(texture) {
                self.target = RenderTarget::Window;
            }
            self.record(BackendCall::DestroyTexture(texture));
        }
    }

    fn update_texture(&mut self, texture: TextureId, pixels: &[u8]) -> Result<(), BackendError> {
        let tex = self.texture_mut(texture)?;
        if pixels.len() != tex.size.rgba_len() {
            return Err(BackendError::Device(format!(
                "texture expects {} bytes, got {}",
                tex.size.rgba_len(),
                pixels.len()
            )));
        }
        self.record(BackendCall::UpdateTexture { texture, len: pixels.len() });
        Ok(())
    }

    fn set_alpha_mod(&mut self, texture: TextureId, alpha: u8) -> Result<(), BackendError> {
        self.texture_mut(texture)?.alpha = alpha;
        self.record(BackendCall::SetAlphaMod { texture, alpha });
        Ok(())
    }

    fn set_blend_mode(&mut self, texture: TextureId, mode: BlendMode) -> Result<(), BackendError> {
        self.texture_mut(texture)?;
        self.record(BackendCall::SetBlendMode { texture, mode });
        Ok(())
    }

    fn set_render_target(&mut self, target: RenderTarget) -> Result<(), BackendError> {
        if let RenderTarget::Texture(id) = target {
            self.texture_mut(id)?;
        }
        self.target = target;
        self.record(BackendCall::SetRenderTarget(target));
        Ok(())
    }

    fn render_target(&self) -> RenderTarget {
        self.target
    }

    fn set_draw_color(&mut self, color: Color) {
        self.record(BackendCall::SetDrawColor(color));
    }

    fn draw_rect(&mut self, rect: Rect) -> Result<(), BackendError> {
        self.record(BackendCall::DrawRect(rect));
        Ok(())
    }

    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32)) -> Result<(), BackendError> {
        self.record(BackendCall::DrawLine { from, to });
        Ok(())
    }

    fn copy(&mut self, texture: TextureId, src: Option<Rect>, dst: Rect) -> Result<(), BackendError> {
        self.texture_mut(texture)?;
        self.record(BackendCall::Copy {
            texture,
            src,
            dst,
            target: self.target,
        });
        Ok(())
    }

    fn clear(&mut self) -> Result<(), BackendError> {
        if self.fail_clear {
            return Err(BackendError::Device("clear failed".into()));
        }
        self.record(BackendCall::Clear);
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        if self.fail_present {
            return Err(BackendError::Device("present failed".into()));
        }
        self.frame_id = self.frame_id.wrapping_add(1);
        self.record(BackendCall::Present);
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<RgbaImage, BackendError> {
        Err(BackendError::Unsupported("pixel read-back"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textures_are_validated() {
        let mut backend = NullBackend::recording(SurfaceSize::new(10, 10));
        let tex = backend.create_texture(SurfaceSize::new(2, 2)).unwrap();
        assert_eq!(backend.texture_alpha(tex), Some(255));

        backend.destroy_texture(tex);
        assert!(matches!(
            backend.copy(tex, None, Rect::new(0, 0, 2, 2)),
            Err(BackendError::UnknownTexture(id)) if id == tex
        ));
        assert!(backend.set_render_target(RenderTarget::Texture(tex)).is_err());
    }

    #[test]
    fn zero_sized_and_over_limit_allocations_fail() {
        let mut backend = NullBackend::recording(SurfaceSize::new(10, 10));
        assert!(matches!(
            backend.create_texture(SurfaceSize::new(0, 4)),
            Err(BackendError::Allocation(_))
        ));

        backend.limit_textures(Some(1));
        backend.create_texture(SurfaceSize::new(1, 1)).unwrap();
        assert!(matches!(
            backend.create_texture(SurfaceSize::new(1, 1)),
            Err(BackendError::Allocation(_))
        ));
    }

    #[test]
    fn present_bumps_frame_id_unless_failing() {
        let mut backend = NullBackend::recording(SurfaceSize::new(10, 10));
        backend.present().unwrap();
        assert_eq!(backend.frame_id(), 1);

        backend.fail_presents(true);
        assert!(backend.present().is_err());
        assert_eq!(backend.frame_id(), 1);
    }

    #[test]
    fn plain_backend_keeps_no_journal() {
        let mut backend = NullBackend::new(SurfaceSize::new(10, 10));
        for _ in 0..100 {
            backend.set_draw_color(Color::BLACK);
            backend.clear().unwrap();
            backend.present().unwrap();
        }
        assert!(backend.calls().is_empty());
        assert_eq!(backend.frame_id(), 100);
    }

    #[test]
    fn failing_clear_is_not_journalled() {
        let mut backend = NullBackend::recording(SurfaceSize::new(10, 10));
        backend.fail_clears(true);
        assert!(matches!(backend.clear(), Err(BackendError::Device(_))));
        assert!(backend.calls().is_empty());

        backend.fail_clears(false);
        backend.clear().unwrap();
        assert_eq!(backend.calls(), &[BackendCall::Clear]);
    }

    #[test]
    fn copy_records_active_target() {
        let mut backend = NullBackend::recording(SurfaceSize::new(10, 10));
        let src = backend.create_texture(SurfaceSize::new(2, 2)).unwrap();
        let dst = backend.create_texture(SurfaceSize::new(4, 4)).unwrap();
        backend.set_render_target(RenderTarget::Texture(dst)).unwrap();
        backend.copy(src, None, Rect::new(1, 1, 2, 2)).unwrap();

        assert_eq!(
            backend.calls().last(),
            Some(&BackendCall::Copy {
                texture: src,
                src: None,
                dst: Rect::new(1, 1, 2, 2),
                target: RenderTarget::Texture(dst),
            })
        );
    }
}
