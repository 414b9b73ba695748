use std::process::ExitCode;
use std::sync::Arc;

use mapview::{FrameBuffer, Renderer};
use pixels::{Error as PixelsError, Pixels, SurfaceTexture};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use super::bootstrap::AppWiring;

const WINDOW_TITLE: &str = "mapview";
const WINDOW_WIDTH: u32 = 1024;
const WINDOW_HEIGHT: u32 = 768;
const ZOOM_STEP: f64 = 1.25;
const MIN_SCALE: f64 = 0.25;
const MAX_SCALE: f64 = 8.0;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize pixel buffer: {0}")]
    CreatePixels(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// What a key press asks the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ViewerAction {
    /// Steps in quarter tiles.
    Pan { dx: i32, dy: i32 },
    Zoom(f64),
    Quit,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_viewer(app) {
        error!(error = %err, "viewer_failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_viewer(app: AppWiring) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(format!("{WINDOW_TITLE} - {}", app.tileset.name()))
            .with_inner_size(LogicalSize::new(
                f64::from(WINDOW_WIDTH),
                f64::from(WINDOW_HEIGHT),
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let size = window.inner_size();
    let mut pixels =
        build_pixels(Arc::clone(&window), size.width, size.height).map_err(AppError::CreatePixels)?;
    let map = app.map;
    let mut renderer = Renderer::new(app.tileset, app.options, (size.width, size.height));
    info!(
        tileset = %renderer.tileset().name(),
        width = size.width,
        height = size.height,
        "viewer_started"
    );

    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if new_size.width == 0 || new_size.height == 0 {
                        return;
                    }
                    match build_pixels(Arc::clone(&window), new_size.width, new_size.height) {
                        Ok(rebuilt) => {
                            pixels = rebuilt;
                            renderer.set_viewport_size((new_size.width, new_size.height));
                        }
                        Err(error) => {
                            warn!(error = %error, "pixels_resize_failed");
                            window_target.exit();
                        }
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state != ElementState::Pressed {
                        return;
                    }
                    match action_for_key(event.physical_key) {
                        Some(ViewerAction::Quit) => {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                        Some(action) => apply_action(&mut renderer, action),
                        None => {}
                    }
                }
                WindowEvent::RedrawRequested => {
                    let (width, height) = renderer.viewport_size();
                    let Some(mut frame) = FrameBuffer::new(pixels.frame_mut(), width, height) else {
                        warn!(width, height, "pixel_buffer_smaller_than_viewport");
                        window_target.exit();
                        return;
                    };
                    let stats = renderer.render_dirty(&mut frame, &map);
                    debug!(
                        elements = stats.elements,
                        drawn = stats.sprites_drawn,
                        skipped = stats.sprites_skipped,
                        "frame_rendered"
                    );
                    if let Err(error) = pixels.render() {
                        warn!(error = %error, "pixels_present_failed");
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if !renderer.dirty().is_empty() {
                    window.request_redraw();
                }
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn build_pixels(window: Arc<Window>, width: u32, height: u32) -> Result<Pixels<'static>, PixelsError> {
    let surface = SurfaceTexture::new(width, height, window);
    Pixels::new(width, height, surface)
}

fn action_for_key(key: PhysicalKey) -> Option<ViewerAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let action = match code {
        KeyCode::KeyW | KeyCode::ArrowUp => ViewerAction::Pan { dx: 0, dy: -1 },
        KeyCode::KeyS | KeyCode::ArrowDown => ViewerAction::Pan { dx: 0, dy: 1 },
        KeyCode::KeyA | KeyCode::ArrowLeft => ViewerAction::Pan { dx: -1, dy: 0 },
        KeyCode::KeyD | KeyCode::ArrowRight => ViewerAction::Pan { dx: 1, dy: 0 },
        KeyCode::Equal | KeyCode::NumpadAdd => ViewerAction::Zoom(ZOOM_STEP),
        KeyCode::Minus | KeyCode::NumpadSubtract => ViewerAction::Zoom(ZOOM_STEP.recip()),
        KeyCode::Escape => ViewerAction::Quit,
        _ => return None,
    };
    Some(action)
}

fn apply_action<L: mapview::ImageLoader>(renderer: &mut Renderer<L>, action: ViewerAction) {
    match action {
        ViewerAction::Pan { dx, dy } => {
            let geometry = renderer.tileset().geometry();
            let step_x = f64::from(geometry.tile_width()) / 4.0;
            let step_y = f64::from(geometry.tile_height()) / 4.0;
            let (x, y) = renderer.origin();
            renderer.set_origin((x + f64::from(dx) * step_x, y + f64::from(dy) * step_y));
        }
        ViewerAction::Zoom(factor) => {
            let scale = zoomed_scale(renderer.scale(), factor);
            if scale == renderer.scale() {
                return;
            }
            let (width, height) = renderer.viewport_size();
            let center = (f64::from(width) / 2.0, f64::from(height) / 2.0);
            let (map_x, map_y) = renderer.screen_to_map_px(center.0, center.1);
            renderer.set_scale(scale);
            renderer.set_origin((map_x - center.0 / scale, map_y - center.1 / scale));
            debug!(scale, "viewer_zoom_changed");
        }
        ViewerAction::Quit => {}
    }
}

fn zoomed_scale(scale: f64, factor: f64) -> f64 {
    (scale * factor).clamp(MIN_SCALE, MAX_SCALE)
}
