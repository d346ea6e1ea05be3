//! The on-screen drawable and its frame loop.
//!
//! A [`Renderer`] owns the presentation context. [`Renderer::run`] repeats
//! poll events, clear, client draw and present until the presentation layer
//! reports a quit, or until any of those steps fails. Clear and present hold
//! the context lock; the draw callback runs without it, so the calls it makes
//! on the renderer and on surfaces each take the lock themselves.

use std::sync::Arc;

use crate::clock::{Clock, MonotonicClock};
use crate::config::{BackendKind, RendererConfig};
use crate::errors::RenderError;
use crate::event::{InputEvent, Key, MouseButton, WindowEvent};
use crate::input::InputTracker;
use crate::render::backend::{BlendMode, RenderBackend, RenderTarget, SurfaceSize};
use crate::render::backends::null::NullBackend;
use crate::render::backends::software::SoftwareBackend;
use crate::render::{Color, Drawable, Filter, GpuContext, Rect, StateStack, Surface, SurfaceFactory};

/// Measures frames per second over one-second windows.
#[derive(Debug, Default)]
struct FrameCounter {
    window_start: Option<u64>,
    frames: u32,
    fps: f64,
}

impl FrameCounter {
    fn tick(&mut self, now_ms: u64) {
        let Some(start) = self.window_start else {
            self.window_start = Some(now_ms);
            return;
        };

        self.frames += 1;
        let elapsed = now_ms.saturating_sub(start);
        if elapsed >= 1000 {
            self.fps = self.frames as f64 * 1000.0 / elapsed as f64;
            self.frames = 0;
            self.window_start = Some(now_ms);
        }
    }
}

pub struct Renderer {
    gpu: GpuContext,
    state: StateStack,
    input: InputTracker,
    clock: Arc<dyn Clock>,
    config: RendererConfig,
    name: String,
    logical: SurfaceSize,
    fullscreen: bool,
    vsync: bool,
    frames: FrameCounter,
}

impl Renderer {
    /// Creates a renderer with the default configuration for the given window.
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, RenderError> {
        let config = RendererConfig::builder()
            .title(title)
            .window_size(width, height)
            .build()
            .map_err(|e| RenderError::Config(e.to_string()))?;
        Self::create(config)
    }

    /// Creates a renderer with the backend selected by `config`.
    pub fn create(config: RendererConfig) -> Result<Self, RenderError> {
        config.validate().map_err(|e| RenderError::Config(e.to_string()))?;

        let logical = SurfaceSize::new(config.logical_width, config.logical_height);
        let backend: Box<dyn RenderBackend> = match config.backend {
            BackendKind::Null => Box::new(NullBackend::new(logical)),
            BackendKind::Software => Box::new(SoftwareBackend::new(logical)),
        };
        Self::with_backend(backend, config)
    }

    pub fn with_backend(backend: Box<dyn RenderBackend>, config: RendererConfig) -> Result<Self, RenderError> {
        Self::with_clock(backend, config, Arc::new(MonotonicClock::new()))
    }

    /// Creates a renderer whose input timestamps come from `clock`.
    pub fn with_clock(
        mut backend: Box<dyn RenderBackend>,
        config: RendererConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RenderError> {
        let creation = |e: crate::render::backend::BackendError| RenderError::ResourceCreation(e.to_string());

        backend
            .set_window(&config.title, SurfaceSize::new(config.window_width, config.window_height))
            .map_err(creation)?;
        if config.fullscreen {
            backend.set_fullscreen(true).map_err(creation)?;
        }
        backend.set_vsync(config.vsync).map_err(creation)?;

        let name = backend.name().to_string();
        let logical = backend.logical_size();
        log::info!(
            "Created {name} renderer: window {}x{}, logical {}x{}",
            config.window_width,
            config.window_height,
            logical.width,
            logical.height
        );

        Ok(Self {
            gpu: GpuContext::new(backend),
            state: StateStack::new(),
            input: InputTracker::new(),
            clock,
            fullscreen: config.fullscreen,
            vsync: config.vsync,
            config,
            name,
            logical,
            frames: FrameCounter::default(),
        })
    }

    pub fn renderer_name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Creates an off-screen surface sharing this renderer's context.
    pub fn new_surface(&self, width: u32, height: u32, filter: Filter) -> Result<Surface, RenderError> {
        Surface::create(&self.gpu, SurfaceSize::new(width, height), filter)
    }

    /// Handle for creating surfaces from other threads.
    pub fn surface_factory(&self) -> SurfaceFactory {
        SurfaceFactory::new(self.gpu.clone())
    }

    /// Runs the frame loop until the presentation layer reports a quit.
    ///
    /// The frame in which the quit is observed is still drawn and presented.
    /// An error from clearing, the callback or presenting ends the loop
    /// immediately, without presenting that frame.
    pub fn run<F>(&mut self, mut draw: F, width: u32, height: u32, title: &str) -> Result<(), RenderError>
    where
        F: FnMut(&mut Renderer) -> anyhow::Result<()>,
    {
        self.gpu.lock()?.set_window(title, SurfaceSize::new(width, height))?;
        self.config.title = title.to_string();
        self.config.window_width = width;
        self.config.window_height = height;

        log::debug!("Entering frame loop for '{title}'");
        let mut running = true;
        while running {
            running = self.poll_events()?;

            {
                let mut gpu = self.gpu.lock()?;
                gpu.set_draw_color(Color::TRANSPARENT);
                gpu.clear()?;
            }

            draw(self).map_err(RenderError::Callback)?;

            self.gpu.lock()?.present()?;
            self.frames.tick(self.clock.now_ms());
        }
        log::info!("Frame loop for '{title}' finished");

        Ok(())
    }

    /// Drains pending window events into the input tracker.
    ///
    /// Returns `false` once a quit event has been seen. Button and key
    /// transitions are stamped with the renderer clock.
    pub fn poll_events(&mut self) -> Result<bool, RenderError> {
        let events: Vec<WindowEvent> = {
            let mut gpu = self.gpu.lock()?;
            std::iter::from_fn(|| gpu.poll_event()).collect()
        };

        self.input.begin_frame();
        let mut running = true;
        for event in events {
            match event {
                WindowEvent::Quit => {
                    log::debug!("Quit requested");
                    running = false;
                }
                WindowEvent::MouseMotion { x, y } => self.input.set_cursor(x, y),
                WindowEvent::MouseButton { button, pressed } => {
                    let timestamp_ms = self.clock.now_ms();
                    self.input.apply(InputEvent::Button { button, pressed, timestamp_ms });
                }
                WindowEvent::Key { key, pressed } => {
                    let timestamp_ms = self.clock.now_ms();
                    self.input.apply(InputEvent::Key { key, pressed, timestamp_ms });
                }
                WindowEvent::Text(c) => self.input.push_char(c),
                WindowEvent::Resize { width, height } => {
                    log::debug!("Window resized to {width}x{height}, logical size unchanged");
                }
            }
        }
        Ok(running)
    }

    pub fn input(&self) -> &InputTracker {
        &self.input
    }

    pub fn cursor_position(&self) -> (i32, i32) {
        self.input.cursor_position()
    }

    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.input.is_pressed(button)
    }

    pub fn is_mouse_button_just_pressed(&self, button: MouseButton) -> bool {
        self.input.is_just_pressed(button, self.clock.now_ms())
    }

    pub fn is_mouse_button_just_released(&self, button: MouseButton) -> bool {
        self.input.is_just_released(button, self.clock.now_ms())
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.input.is_key_pressed(key)
    }

    pub fn is_key_just_pressed(&self, key: Key) -> bool {
        self.input.is_key_just_pressed(key, self.clock.now_ms())
    }

    pub fn is_key_just_released(&self, key: Key) -> bool {
        self.input.is_key_just_released(key, self.clock.now_ms())
    }

    /// Milliseconds `key` has been held, 0 when released.
    pub fn key_press_duration(&self, key: Key) -> u64 {
        self.input.key_press_duration(key, self.clock.now_ms())
    }

    /// Characters typed during the current frame.
    pub fn input_chars(&self) -> &[char] {
        self.input.input_chars()
    }

    pub fn is_full_screen(&self) -> bool {
        self.fullscreen
    }

    pub fn set_full_screen(&mut self, fullscreen: bool) -> Result<(), RenderError> {
        if fullscreen == self.fullscreen {
            return Ok(());
        }
        self.gpu.lock()?.set_fullscreen(fullscreen)?;
        self.fullscreen = fullscreen;
        Ok(())
    }

    pub fn vsync_enabled(&self) -> bool {
        self.vsync
    }

    pub fn set_vsync_enabled(&mut self, vsync: bool) -> Result<(), RenderError> {
        self.gpu.lock()?.set_vsync(vsync)?;
        self.vsync = vsync;
        Ok(())
    }

    /// Frames per second over the last completed one-second window.
    pub fn current_fps(&self) -> f64 {
        self.frames.fps
    }

    /// Frames are never skipped.
    pub fn is_drawing_skipped(&self) -> bool {
        false
    }
}

impl Drawable for Renderer {
    fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    fn render_target(&self) -> RenderTarget {
        RenderTarget::Window
    }

    fn state_stack(&self) -> &StateStack {
        &self.state
    }

    fn state_stack_mut(&mut self) -> &mut StateStack {
        &mut self.state
    }

    fn size(&self) -> SurfaceSize {
        self.logical
    }

    /// Uploads through a transient texture copied over the whole window.
    fn replace_pixels(&mut self, pixels: &[u8]) -> Result<(), RenderError> {
        let size = self.logical;
        let expected = size.rgba_len();
        if pixels.len() != expected {
            return Err(RenderError::PixelSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        let mut gpu = self.gpu.lock()?;
        let texture = gpu.create_texture(size)?;
        let result = gpu.redirect(RenderTarget::Window, |b| {
            b.update_texture(texture, pixels)?;
            b.set_blend_mode(texture, BlendMode::None)?;
            b.copy(texture, None, Rect::from_size(size))
        });
        gpu.destroy_texture(texture);
        result
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("name", &self.name)
            .field("logical", &self.logical)
            .field("depth", &self.state.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::errors::ErrorClass;
    use crate::event::EventQueue;
    use crate::render::backends::null::BackendCall;
    use crate::render::Effect;

    fn null_renderer() -> (Renderer, EventQueue, ManualClock) {
        let _ = env_logger::builder().is_test(true).try_init();
        let backend = NullBackend::recording(SurfaceSize::new(640, 480));
        let events = backend.events();
        let clock = ManualClock::new(0);
        let renderer = Renderer::with_clock(
            Box::new(backend),
            RendererConfig::builder().backend(BackendKind::Null).build().unwrap(),
            Arc::new(clock.clone()),
        )
        .unwrap();
        (renderer, events, clock)
    }

    fn calls(renderer: &Renderer) -> Vec<BackendCall> {
        let gpu = renderer.gpu().lock().unwrap();
        gpu.downcast_ref::<NullBackend>().unwrap().calls().to_vec()
    }

    fn clear_calls(renderer: &Renderer) {
        let mut gpu = renderer.gpu().lock().unwrap();
        gpu.downcast_mut::<NullBackend>().unwrap().clear_calls();
    }

    #[test]
    fn render_surface_with_transparency_at_translation() {
        let (mut renderer, _, _) = null_renderer();
        let mut surface = renderer.new_surface(100, 100, Filter::Default).unwrap();
        surface.clear(Color::RED).unwrap();
        surface.push_effect(Effect::Transparency50);
        clear_calls(&renderer);

        renderer.push_translation(10, 10);
        renderer.render(&surface).unwrap();
        renderer.pop().unwrap();

        let texture = surface.texture();
        assert_eq!(
            calls(&renderer),
            vec![
                BackendCall::SetAlphaMod { texture, alpha: 128 },
                BackendCall::SetBlendMode { texture, mode: BlendMode::Blend },
                BackendCall::Copy {
                    texture,
                    src: None,
                    dst: Rect::new(10, 10, 100, 100),
                    target: RenderTarget::Window,
                },
            ]
        );
    }

    #[test]
    fn destination_effect_does_not_affect_copy() {
        let (mut renderer, _, _) = null_renderer();
        let surface = renderer.new_surface(4, 4, Filter::Default).unwrap();
        renderer.push_effect(Effect::Transparency25);
        clear_calls(&renderer);

        renderer.render(&surface).unwrap();
        assert!(calls(&renderer).contains(&BackendCall::SetAlphaMod { texture: surface.texture(), alpha: 255 }));
    }

    #[test]
    fn surface_to_surface_redirects_and_restores_target() {
        let (renderer, _, _) = null_renderer();
        let mut dest = renderer.new_surface(50, 50, Filter::Default).unwrap();
        let mut src = renderer.new_surface(8, 8, Filter::Default).unwrap();
        src.push_effect(Effect::Modulate);
        dest.push_translation(3, 4);
        clear_calls(&renderer);

        dest.render(&src).unwrap();

        let dest_target = RenderTarget::Texture(dest.texture());
        assert_eq!(
            calls(&renderer),
            vec![
                BackendCall::SetAlphaMod { texture: src.texture(), alpha: 255 },
                BackendCall::SetBlendMode { texture: src.texture(), mode: BlendMode::Add },
                BackendCall::SetRenderTarget(dest_target),
                BackendCall::Copy {
                    texture: src.texture(),
                    src: None,
                    dst: Rect::new(3, 4, 8, 8),
                    target: dest_target,
                },
                BackendCall::SetRenderTarget(RenderTarget::Window),
            ]
        );
    }

    #[test]
    fn pass_through_effect_keeps_previous_texture_config() {
        let (mut renderer, _, _) = null_renderer();
        let mut surface = renderer.new_surface(4, 4, Filter::Default).unwrap();
        surface.push_effect(Effect::Transparency50);
        renderer.render(&surface).unwrap();

        surface.push_effect(Effect::Burn);
        clear_calls(&renderer);
        renderer.render(&surface).unwrap();

        let recorded = calls(&renderer);
        assert_eq!(recorded.len(), 1);
        assert!(matches!(recorded[0], BackendCall::Copy { .. }));

        let gpu = renderer.gpu().lock().unwrap();
        assert_eq!(gpu.downcast_ref::<NullBackend>().unwrap().texture_alpha(surface.texture()), Some(128));
    }

    #[test]
    fn render_section_copies_sub_rectangle() {
        let (mut renderer, _, _) = null_renderer();
        let surface = renderer.new_surface(64, 32, Filter::Default).unwrap();
        renderer.push_translation(5, 6);
        clear_calls(&renderer);

        renderer.render_section(&surface, Rect::new(16, 8, 10, 12)).unwrap();
        assert_eq!(
            calls(&renderer).last(),
            Some(&BackendCall::Copy {
                texture: surface.texture(),
                src: Some(Rect::new(16, 8, 10, 12)),
                dst: Rect::new(5, 6, 10, 12),
                target: RenderTarget::Window,
            })
        );

        let err = renderer.render_section(&surface, Rect::new(60, 0, 10, 10)).unwrap_err();
        assert!(matches!(err, RenderError::SectionOutOfBounds { width: 64, height: 32, .. }));
    }

    #[test]
    fn surfaces_from_another_renderer_are_rejected() {
        let (mut a, _, _) = null_renderer();
        let (b, _, _) = null_renderer();
        let foreign = b.new_surface(2, 2, Filter::Default).unwrap();
        assert!(matches!(a.render(&foreign), Err(RenderError::ForeignSurface)));
    }

    #[test]
    fn primitives_use_translation_and_tint() {
        let (mut renderer, _, _) = null_renderer();
        clear_calls(&renderer);

        renderer.push_translation(7, 8);
        renderer.push_color(Color::new(255, 0, 255, 255));
        renderer.draw_rect(20, 10, Color::WHITE).unwrap();
        renderer.draw_line(3, -2, Color::WHITE).unwrap();
        renderer.pop_n(2).unwrap();

        assert_eq!(
            calls(&renderer),
            vec![
                BackendCall::SetDrawColor(Color::new(255, 0, 255, 255)),
                BackendCall::DrawRect(Rect::new(7, 8, 20, 10)),
                BackendCall::SetDrawColor(Color::new(255, 0, 255, 255)),
                BackendCall::DrawLine { from: (7, 8), to: (10, 6) },
            ]
        );
    }

    #[test]
    fn line_end_saturates_at_the_coordinate_range() {
        let (mut renderer, _, _) = null_renderer();
        clear_calls(&renderer);

        renderer.push_translation(i32::MAX - 1, i32::MIN + 1);
        renderer.draw_line(10, -10, Color::WHITE).unwrap();

        assert_eq!(
            calls(&renderer).last(),
            Some(&BackendCall::DrawLine {
                from: (i32::MAX - 1, i32::MIN + 1),
                to: (i32::MAX, i32::MIN),
            })
        );
    }

    #[test]
    fn replace_pixels_on_window_uses_transient_texture() {
        let (mut renderer, _, _) = null_renderer();
        let err = renderer.replace_pixels(&[0; 4]).unwrap_err();
        assert!(matches!(err, RenderError::PixelSizeMismatch { expected: 1_228_800, actual: 4 }));

        renderer.replace_pixels(&vec![0; 640 * 480 * 4]).unwrap();
        let gpu = renderer.gpu().lock().unwrap();
        assert_eq!(gpu.downcast_ref::<NullBackend>().unwrap().texture_count(), 0);
    }

    #[test]
    fn text_and_screenshot_are_declared_unsupported() {
        let (mut renderer, _, _) = null_renderer();
        assert_eq!(renderer.draw_text("hello").unwrap_err().class(), ErrorClass::Unsupported);
        assert_eq!(renderer.screenshot().unwrap_err().class(), ErrorClass::Unsupported);
    }

    #[test]
    fn run_loops_until_quit_and_presents_each_frame() {
        let (mut renderer, events, _) = null_renderer();
        let mut frames = 0;

        renderer
            .run(
                |r| {
                    frames += 1;
                    if frames == 3 {
                        events.push(WindowEvent::Quit);
                    }
                    r.push_translation(1, 1);
                    r.pop()?;
                    Ok(())
                },
                1024,
                768,
                "loop",
            )
            .unwrap();

        // the quit is seen at the start of frame 4, which still completes
        assert_eq!(frames, 4);
        let gpu = renderer.gpu().lock().unwrap();
        let backend = gpu.downcast_ref::<NullBackend>().unwrap();
        assert_eq!(backend.frame_id(), 4);
        assert!(backend.calls().contains(&BackendCall::SetWindow {
            title: "loop".into(),
            size: SurfaceSize::new(1024, 768),
        }));
    }

    #[test]
    fn callback_error_ends_loop_without_present() {
        let (mut renderer, _, _) = null_renderer();
        let err = renderer
            .run(|r| Ok(r.pop()?), 640, 480, "underflow")
            .unwrap_err();

        match err {
            RenderError::Callback(inner) => {
                assert!(matches!(inner.downcast_ref::<RenderError>(), Some(RenderError::StackUnderflow)));
            }
            other => panic!("expected callback error, got {other:?}"),
        }
        let gpu = renderer.gpu().lock().unwrap();
        assert_eq!(gpu.downcast_ref::<NullBackend>().unwrap().frame_id(), 0);
    }

    #[test]
    fn clear_failure_ends_loop_before_drawing_or_presenting() {
        let (mut renderer, _, _) = null_renderer();
        renderer.gpu().lock().unwrap().downcast_mut::<NullBackend>().unwrap().fail_clears(true);

        let mut frames = 0;
        let err = renderer
            .run(
                |_| {
                    frames += 1;
                    Ok(())
                },
                640,
                480,
                "no-clear",
            )
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Presentation);
        assert_eq!(frames, 0);

        let gpu = renderer.gpu().lock().unwrap();
        let backend = gpu.downcast_ref::<NullBackend>().unwrap();
        assert_eq!(backend.frame_id(), 0);
        assert!(!backend.calls().contains(&BackendCall::Present));
    }

    #[test]
    fn present_failure_is_a_presentation_error() {
        let (mut renderer, _, _) = null_renderer();
        renderer.gpu().lock().unwrap().downcast_mut::<NullBackend>().unwrap().fail_presents(true);

        let mut frames = 0;
        let err = renderer
            .run(
                |_| {
                    frames += 1;
                    Ok(())
                },
                640,
                480,
                "broken",
            )
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Presentation);
        assert_eq!(frames, 1);
    }

    #[test]
    fn poll_routes_input_with_clock_timestamps() {
        let (mut renderer, events, clock) = null_renderer();
        assert!(renderer.poll_events().unwrap());
        assert!(!renderer.is_mouse_button_just_released(MouseButton::Left));

        clock.set(1000);
        events.push(WindowEvent::MouseMotion { x: 12, y: 34 });
        events.push(WindowEvent::MouseButton { button: MouseButton::Left, pressed: true });
        events.push(WindowEvent::Text('a'));
        events.push(WindowEvent::Key { key: Key::Escape, pressed: true });

        assert!(renderer.poll_events().unwrap());
        assert_eq!(renderer.cursor_position(), (12, 34));
        assert_eq!(renderer.input_chars(), &['a']);

        clock.set(1010);
        assert!(renderer.is_mouse_button_pressed(MouseButton::Left));
        assert!(renderer.is_mouse_button_just_pressed(MouseButton::Left));
        assert!(renderer.is_key_just_pressed(Key::Escape));
        assert_eq!(renderer.key_press_duration(Key::Escape), 10);

        clock.set(1030);
        assert!(!renderer.is_mouse_button_just_pressed(MouseButton::Left));
        events.push(WindowEvent::MouseButton { button: MouseButton::Left, pressed: false });
        assert!(renderer.poll_events().unwrap());
        assert!(renderer.input_chars().is_empty());

        clock.set(1040);
        assert!(renderer.is_mouse_button_just_released(MouseButton::Left));

        events.push(WindowEvent::Quit);
        assert!(!renderer.poll_events().unwrap());
    }

    #[test]
    fn fps_is_measured_over_one_second() {
        let (mut renderer, events, clock) = null_renderer();
        assert_eq!(renderer.current_fps(), 0.0);

        let mut frames = 0;
        renderer
            .run(
                |_| {
                    frames += 1;
                    clock.advance(10);
                    if frames == 101 {
                        events.push(WindowEvent::Quit);
                    }
                    Ok(())
                },
                640,
                480,
                "fps",
            )
            .unwrap();
        assert_eq!(renderer.current_fps(), 100.0);
    }

    #[test]
    fn fullscreen_toggle_is_forwarded_once() {
        let (mut renderer, _, _) = null_renderer();
        clear_calls(&renderer);
        renderer.set_full_screen(false).unwrap();
        renderer.set_full_screen(true).unwrap();
        renderer.set_full_screen(true).unwrap();
        assert!(renderer.is_full_screen());
        assert_eq!(calls(&renderer), vec![BackendCall::SetFullscreen(true)]);

        renderer.set_vsync_enabled(true).unwrap();
        assert!(renderer.vsync_enabled());
        assert!(!renderer.is_drawing_skipped());
        assert_eq!(renderer.renderer_name(), "NullBackend");
    }

    #[test]
    fn create_selects_backend_from_config() {
        let renderer = Renderer::create(RendererConfig::builder().backend(BackendKind::Software).build().unwrap()).unwrap();
        assert_eq!(renderer.renderer_name(), "SoftwareBackend");
        assert_eq!(renderer.size(), SurfaceSize::new(800, 600));

        assert!(matches!(Renderer::new("x", 0, 10), Err(RenderError::Config(_))));
    }
}
