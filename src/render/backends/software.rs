//! CPU rasteriser backend.
//!
//! Keeps the window back buffer and every texture as straight RGBA8 buffers in
//! memory and implements copies with alpha modulation and the four blend modes
//! exactly. Useful headless, and as a reference for what a GPU backend is
//! expected to produce.

use std::any::Any;
use std::collections::HashMap;

use crate::event::{EventQueue, WindowEvent};
use crate::render::backend::{
    BackendError, BlendMode, PixelFormat, RenderBackend, RenderTarget, RgbaImage, SurfaceSize, TextureId,
};
use crate::render::color::mul_u8;
use crate::render::{Color, Rect};

struct SoftTexture {
    size: SurfaceSize,
    pixels: Vec<u8>,
    alpha: u8,
    blend: BlendMode,
}

pub struct SoftwareBackend {
    title: String,
    window: SurfaceSize,
    logical: SurfaceSize,
    fullscreen: bool,
    vsync: bool,
    /// Back buffer the window target draws into.
    frame: Vec<u8>,
    /// Copy of the back buffer taken at the last present.
    presented: Vec<u8>,
    textures: HashMap<TextureId, SoftTexture>,
    target: RenderTarget,
    draw_color: Color,
    events: EventQueue,
    frames_presented: u64,
}

impl SoftwareBackend {
    pub fn new(logical: SurfaceSize) -> Self {
        Self {
            title: String::new(),
            window: logical,
            logical,
            fullscreen: false,
            vsync: false,
            frame: vec![0; logical.rgba_len()],
            presented: vec![0; logical.rgba_len()],
            textures: HashMap::new(),
            target: RenderTarget::Window,
            draw_color: Color::TRANSPARENT,
            events: EventQueue::new(),
            frames_presented: 0,
        }
    }

    /// Handle for injecting window events.
    pub fn events(&self) -> EventQueue {
        self.events.clone()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn window_size(&self) -> SurfaceSize {
        self.window
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn vsync(&self) -> bool {
        self.vsync
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// The last presented frame.
    pub fn presented(&self) -> RgbaImage {
        let size = self.logical;
        RgbaImage::from_raw(self.presented.clone(), size.width, size.height, size.width * 4, PixelFormat::Rgba8)
    }

    pub fn texture_pixels(&self, texture: TextureId) -> Option<&[u8]> {
        self.textures.get(&texture).map(|t| t.pixels.as_slice())
    }

    fn texture_mut(&mut self, texture: TextureId) -> Result<&mut SoftTexture, BackendError> {
        self.textures.get_mut(&texture).ok_or(BackendError::UnknownTexture(texture))
    }

    fn target_buffer(&mut self) -> Result<(&mut [u8], SurfaceSize), BackendError> {
        match self.target {
            RenderTarget::Window => Ok((self.frame.as_mut_slice(), self.logical)),
            RenderTarget::Texture(id) => {
                let tex = self.texture_mut(id)?;
                Ok((tex.pixels.as_mut_slice(), tex.size))
            }
        }
    }

    fn plot_all(&mut self, points: impl IntoIterator<Item = (i64, i64)>) -> Result<(), BackendError> {
        let color = self.draw_color.to_array();
        let (buf, size) = self.target_buffer()?;
        for (x, y) in points {
            if x < 0 || y < 0 || x >= size.width as i64 || y >= size.height as i64 {
                continue;
            }
            let off = pixel_offset(size, x as u32, y as u32);
            blend_pixel(&mut buf[off..off + 4], color, BlendMode::Blend);
        }
        Ok(())
    }
}

#[inline]
fn pixel_offset(size: SurfaceSize, x: u32, y: u32) -> usize {
    (y as usize * size.width as usize + x as usize) * 4
}

fn blend_pixel(dst: &mut [u8], src: [u8; 4], mode: BlendMode) {
    let a = src[3];
    match mode {
        BlendMode::None => dst.copy_from_slice(&src),
        BlendMode::Blend => {
            let inv = 255 - a;
            for c in 0..3 {
                dst[c] = mul_u8(src[c], a).saturating_add(mul_u8(dst[c], inv));
            }
            dst[3] = a.saturating_add(mul_u8(dst[3], inv));
        }
        BlendMode::Add => {
            for c in 0..3 {
                dst[c] = dst[c].saturating_add(mul_u8(src[c], a));
            }
        }
        BlendMode::Mod => {
            for c in 0..3 {
                dst[c] = mul_u8(dst[c], src[c]);
            }
        }
    }
}

/// Bresenham walk from `from` to `to`, both endpoints included.
struct LinePoints {
    x: i64,
    y: i64,
    to: (i64, i64),
    dx: i64,
    dy: i64,
    sx: i64,
    sy: i64,
    err: i64,
    done: bool,
}

fn line_points(from: (i64, i64), to: (i64, i64)) -> LinePoints {
    let dx = (to.0 - from.0).abs();
    let dy = -(to.1 - from.1).abs();
    LinePoints {
        x: from.0,
        y: from.1,
        to,
        dx,
        dy,
        sx: if from.0 < to.0 { 1 } else { -1 },
        sy: if from.1 < to.1 { 1 } else { -1 },
        err: dx + dy,
        done: false,
    }
}

impl Iterator for LinePoints {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let point = (self.x, self.y);
        if point == self.to {
            self.done = true;
            return Some(point);
        }
        let e2 = 2 * self.err;
        if e2 >= self.dy {
            self.err += self.dy;
            self.x += self.sx;
        }
        if e2 <= self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }
        Some(point)
    }
}

/// Cuts the segment down to the target plus a one pixel border (Liang-Barsky),
/// so rasterising never walks pixels far outside the target. Segments that
/// miss the target entirely yield `None`.
fn clip_line(from: (i64, i64), to: (i64, i64), size: SurfaceSize) -> Option<((i64, i64), (i64, i64))> {
    let (x0, y0) = (from.0 as f64, from.1 as f64);
    let (dx, dy) = ((to.0 - from.0) as f64, (to.1 - from.1) as f64);
    let (min_x, min_y) = (-1.0, -1.0);
    let (max_x, max_y) = (size.width as f64, size.height as f64);

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [(-dx, x0 - min_x), (dx, max_x - x0), (-dy, y0 - min_y), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| ((x0 + t * dx).round() as i64, (y0 + t * dy).round() as i64);
    let start = if t0 > 0.0 { at(t0) } else { from };
    let end = if t1 < 1.0 { at(t1) } else { to };
    Some((start, end))
}

/// Visible pixels of the outline of `rect` on a target of `size`.
fn outline_points(rect: Rect, size: SurfaceSize) -> Vec<(i64, i64)> {
    let mut points = Vec::new();
    let Some(visible) = rect.clip_to(size.width, size.height) else {
        return points;
    };
    let (left, top) = (rect.x as i64, rect.y as i64);
    let (right, bottom) = (rect.right() - 1, rect.bottom() - 1);
    let (vx0, vy0) = (visible.x as i64, visible.y as i64);
    let (vx1, vy1) = (visible.right(), visible.bottom());

    let rows = if bottom > top { vec![top, bottom] } else { vec![top] };
    for y in rows {
        if (vy0..vy1).contains(&y) {
            points.extend((vx0..vx1).map(|x| (x, y)));
        }
    }

    let cols = if right > left { vec![left, right] } else { vec![left] };
    for x in cols {
        if (vx0..vx1).contains(&x) {
            points.extend(((top + 1).max(vy0)..bottom.min(vy1)).map(|y| (x, y)));
        }
    }
    points
}

impl RenderBackend for SoftwareBackend {
    fn name(&self) -> &str {
        "SoftwareBackend"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn set_window(&mut self, title: &str, size: SurfaceSize) -> Result<(), BackendError> {
        self.title = title.to_string();
        self.window = size;
        Ok(())
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), BackendError> {
        self.fullscreen = fullscreen;
        Ok(())
    }

    fn set_vsync(&mut self, vsync: bool) -> Result<(), BackendError> {
        self.vsync = vsync;
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

        let texture = TextureId::new();
        self.textures.insert(
            texture,
            SoftTexture {
                size,
                pixels: vec![0; size.rgba_len()],
                alpha: 255,
                blend: BlendMode::Blend,
            },
        );
        Ok(texture)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        if self.target == RenderTarget::Texture(texture) {
            self.target = RenderTarget::Window;
        }
    }

    fn update_texture(&mut self, texture: TextureId, pixels: &[u8]) -> Result<(), BackendError> {
        let tex = self.texture_mut(texture)?;
        if pixels.len() != tex.pixels.len() {
            return Err(BackendError::Device(format!(
                "texture expects {} bytes, got {}",
                tex.pixels.len(),
                pixels.len()
            )));
        }
        tex.pixels.copy_from_slice(pixels);
        Ok(())
    }

    fn set_alpha_mod(&mut self, texture: TextureId, alpha: u8) -> Result<(), BackendError> {
        self.texture_mut(texture)?.alpha = alpha;
        Ok(())
    }

    fn set_blend_mode(&mut self, texture: TextureId, mode: BlendMode) -> Result<(), BackendError> {
        self.texture_mut(texture)?.blend = mode;
        Ok(())
    }

    fn set_render_target(&mut self, target: RenderTarget) -> Result<(), BackendError> {
        if let RenderTarget::Texture(id) = target {
            self.texture_mut(id)?;
        }
        self.target = target;
        Ok(())
    }

    fn render_target(&self) -> RenderTarget {
        self.target
    }

    fn set_draw_color(&mut self, color: Color) {
        self.draw_color = color;
    }

    fn draw_rect(&mut self, rect: Rect) -> Result<(), BackendError> {
        let size = self.target_buffer()?.1;
        self.plot_all(outline_points(rect, size))
    }

    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32)) -> Result<(), BackendError> {
        let size = self.target_buffer()?.1;
        let from = (from.0 as i64, from.1 as i64);
        let to = (to.0 as i64, to.1 as i64);
        match clip_line(from, to, size) {
            Some((start, end)) => self.plot_all(line_points(start, end)),
            None => Ok(()),
        }
    }

    fn copy(&mut self, texture: TextureId, src: Option<Rect>, dst: Rect) -> Result<(), BackendError> {
        // Snapshot the source so copying a texture onto itself reads stable pixels.
        let (src_pixels, src_size, alpha, blend) = {
            let tex = self.texture_mut(texture)?;
            (tex.pixels.clone(), tex.size, tex.alpha, tex.blend)
        };
        let Some(src) = src.unwrap_or(Rect::from_size(src_size)).clip_to(src_size.width, src_size.height) else {
            return Ok(());
        };
        if dst.width == 0 || dst.height == 0 {
            return Ok(());
        }

        let (buf, size) = self.target_buffer()?;
        let Some(visible) = dst.clip_to(size.width, size.height) else {
            return Ok(());
        };

        for y in visible.y..visible.y + visible.height as i32 {
            let sy = src.y as u32 + ((y - dst.y) as u64 * src.height as u64 / dst.height as u64) as u32;
            for x in visible.x..visible.x + visible.width as i32 {
                let sx = src.x as u32 + ((x - dst.x) as u64 * src.width as u64 / dst.width as u64) as u32;
                let so = pixel_offset(src_size, sx, sy);
                let mut px = [src_pixels[so], src_pixels[so + 1], src_pixels[so + 2], src_pixels[so + 3]];
                px[3] = mul_u8(px[3], alpha);

                let off = pixel_offset(size, x as u32, y as u32);
                blend_pixel(&mut buf[off..off + 4], px, blend);
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), BackendError> {
        let color = self.draw_color.to_array();
        let (buf, _) = self.target_buffer()?;
        for px in buf.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        self.presented.copy_from_slice(&self.frame);
        self.frames_presented += 1;
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<RgbaImage, BackendError> {
        let (buf, size) = self.target_buffer()?;
        Ok(RgbaImage::from_raw(
            buf.to_vec(),
            size.width,
            size.height,
            size.width * 4,
            PixelFormat::Rgba8,
        ))
    }
}
