//! Composites a few translucent layers onto the window with the software
//! backend, runs a handful of frames and reports a pixel from the last one.
//!
//! Run with `RUST_LOG=debug cargo run --example layers` to see the frame loop.

use gosub_render2d::event::WindowEvent;
use gosub_render2d::render::backends::software::SoftwareBackend;
use gosub_render2d::render::backend::SurfaceSize;
use gosub_render2d::render::{Color, Drawable, Effect, Filter, Renderer};
use gosub_render2d::{BackendKind, RendererConfig};

const FRAMES: u32 = 5;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = RendererConfig::builder()
        .title("Layers")
        .window_size(640, 480)
        .logical_size(320, 240)
        .backend(BackendKind::Software)
        .build()?;

    // Keep a handle on the event queue so we can stop the loop ourselves.
    let backend = SoftwareBackend::new(SurfaceSize::new(config.logical_width, config.logical_height));
    let events = backend.events();
    let mut renderer = Renderer::with_backend(Box::new(backend), config)?;

    let mut panel = renderer.new_surface(120, 80, Filter::Linear)?;
    panel.clear(Color::rgb(40, 40, 90))?;
    panel.push_translation(10, 10);
    panel.draw_rect(100, 60, Color::WHITE)?;
    panel.draw_line(100, 60, Color::rgb(255, 200, 0))?;
    panel.pop()?;
    panel.push_effect(Effect::Transparency75);

    let mut glow = renderer.new_surface(32, 32, Filter::Default)?;
    glow.clear(Color::rgb(90, 30, 0))?;
    glow.push_effect(Effect::Modulate);

    let mut frame = 0;
    renderer.run(
        |r| {
            frame += 1;
            r.clear(Color::rgb(10, 10, 10))?;

            r.push_translation(20 + frame as i32 * 4, 30);
            r.render(&panel)?;
            r.push_translation(40, 20);
            r.render(&glow)?;
            r.pop_n(2)?;

            if frame == FRAMES {
                events.push(WindowEvent::Quit);
            }
            Ok(())
        },
        640,
        480,
        "Layers",
    )?;

    let shot = renderer.screenshot()?;
    log::info!("Rendered {frame} frames at {:.1} fps", renderer.current_fps());
    println!("pixel at (100, 70): {:?}", shot.pixel(100, 70));

    Ok(())
}
