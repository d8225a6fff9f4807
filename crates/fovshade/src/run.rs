use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use fovconfig::AppConfig;
use renderer::gpu::GlDevice;
use renderer::{ControlEvent, FoveationParams, FrameInput, PipelineConfig, PointerState, RenderPipeline};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::cli::Args;
use crate::window::GlHost;

pub fn run(args: Args) -> Result<()> {
    initialise_tracing();

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load configuration {}", args.config.display()))?;
    let vsync = args.vsync.unwrap_or(config.vsync);
    info!(config = %args.config.display(), vsync, "starting fovshade");

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let (host, gl) = GlHost::new(
        &event_loop,
        &config.window.title,
        (config.window.width, config.window.height),
    )?;
    if let Err(err) = host.set_vsync(vsync) {
        warn!(error = %err, "failed to apply vsync setting");
    }

    let device = GlDevice::new(gl).context("failed to initialise GL device")?;
    let inner = host.window().inner_size();
    let mut pipeline = Some(
        RenderPipeline::new(&device, &pipeline_config(&config), (inner.width, inner.height))
            .context("failed to build initial render pipeline")?,
    );

    let title = config.window.title.clone();
    let mut device = Some(device);
    let mut pointer = PointerState::default();
    let mut fps = FpsCounter::new();

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        if let (Some(pipeline), Some(device)) = (pipeline.take(), device.take()) {
                            pipeline.destroy(&device);
                            device.destroy();
                        }
                        target.exit();
                    }

                    WindowEvent::KeyboardInput { event, .. } => {
                        if !event.state.is_pressed() || event.repeat {
                            return;
                        }
                        let PhysicalKey::Code(code) = event.physical_key else {
                            return;
                        };
                        match code {
                            KeyCode::Escape => {
                                if let (Some(pipeline), Some(device)) =
                                    (pipeline.take(), device.take())
                                {
                                    pipeline.destroy(&device);
                                    device.destroy();
                                }
                                target.exit();
                            }
                            KeyCode::KeyR => {
                                if let (Some(pipeline), Some(device)) =
                                    (pipeline.as_mut(), device.as_ref())
                                {
                                    reload_config(&args, &host, device, pipeline);
                                }
                            }
                            other => {
                                if let (Some(event), Some(pipeline), Some(device)) =
                                    (control_event(other), pipeline.as_mut(), device.as_ref())
                                {
                                    pipeline.handle_event(device, event, Instant::now());
                                }
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        let logical = position.to_logical::<f64>(host.window().scale_factor());
                        pointer.position = (logical.x, logical.y);
                    }

                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => {
                        pointer.pressed = state == ElementState::Pressed;
                    }

                    WindowEvent::Resized(size) => {
                        host.resize(size.width, size.height);
                        host.window().request_redraw();
                    }

                    WindowEvent::RedrawRequested => {
                        let (Some(pipeline), Some(device)) =
                            (pipeline.as_mut(), device.as_ref())
                        else {
                            return;
                        };
                        let inner = host.window().inner_size();
                        let frame = FrameInput {
                            drawable_size: (inner.width, inner.height),
                            scale_factor: host.window().scale_factor(),
                            pointer,
                            now: Instant::now(),
                        };
                        if let Err(err) = pipeline.render_frame(device, &frame) {
                            error!(error = %err, "frame failed; shutting down");
                            target.exit();
                            return;
                        }
                        if let Err(err) = host.swap_buffers() {
                            error!(error = %err, "presentation failed; shutting down");
                            target.exit();
                            return;
                        }
                        if let Some(rate) = fps.tick(Instant::now()) {
                            host.window().set_title(&format!("{title} [{rate:.0} FPS]"));
                        }
                    }

                    _ => {}
                },

                Event::AboutToWait => {
                    host.window().request_redraw();
                }

                _ => {}
            }
        })
        .context("event loop failed")
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Re-reads the configuration file and applies it; if the file no longer
/// loads, falls back to re-reading just the shader sources so a broken
/// config edit never kills a running session.
fn reload_config(args: &Args, host: &GlHost, device: &GlDevice, pipeline: &mut RenderPipeline) {
    match AppConfig::load(&args.config) {
        Ok(config) => {
            if let Err(err) = host.set_vsync(args.vsync.unwrap_or(config.vsync)) {
                warn!(error = %err, "failed to apply vsync setting");
            }
            pipeline.apply_config(device, &pipeline_config(&config));
            info!(config = %args.config.display(), "configuration reloaded");
        }
        Err(err) => {
            warn!(error = %err, "config reload failed; re-reading shader sources only");
            pipeline.reload(device);
        }
    }
}

fn pipeline_config(config: &AppConfig) -> PipelineConfig {
    PipelineConfig {
        vertex_shader: config.shaders.vertex.clone(),
        fragment_dir: config.shaders.fragment_dir.clone(),
        start_fragment: config.shaders.start_fragment.clone(),
        passthrough_shader: config.shaders.passthrough.clone(),
        drop_shader: config.foveation.drop_shader.clone(),
        reconstruction_shader: config.foveation.reconstruction_shader.clone(),
        foveation_enabled: config.foveation.enabled,
        post_processing: config.foveation.post_processing,
        foveation: FoveationParams {
            stride: config.foveation.stride,
            thresholds: config.foveation.thresholds,
        },
    }
}

fn control_event(code: KeyCode) -> Option<ControlEvent> {
    match code {
        KeyCode::ArrowLeft => Some(ControlEvent::CyclePrev),
        KeyCode::ArrowRight => Some(ControlEvent::CycleNext),
        KeyCode::ArrowUp => Some(ControlEvent::StrideUp),
        KeyCode::ArrowDown => Some(ControlEvent::StrideDown),
        KeyCode::KeyP => Some(ControlEvent::TogglePostProcessing),
        KeyCode::Space => Some(ControlEvent::TogglePause),
        _ => None,
    }
}

/// Frame counter that reports the rate at most once per second.
struct FpsCounter {
    frames: u32,
    window_start: Instant,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            window_start: Instant::now(),
        }
    }

    fn tick(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Duration::from_secs(1) {
            return None;
        }
        let rate = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = now;
        Some(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_counter_reports_once_per_second() {
        let mut fps = FpsCounter::new();
        let start = fps.window_start;
        for _ in 0..59 {
            assert_eq!(fps.tick(start + Duration::from_millis(500)), None);
        }
        let rate = fps.tick(start + Duration::from_secs(1)).unwrap();
        assert!((rate - 60.0).abs() < 0.5);
        // A fresh window starts counting from zero.
        assert_eq!(fps.tick(start + Duration::from_millis(1500)), None);
    }

    #[test]
    fn arrow_and_toggle_keys_map_to_control_events() {
        assert_eq!(control_event(KeyCode::ArrowRight), Some(ControlEvent::CycleNext));
        assert_eq!(control_event(KeyCode::ArrowUp), Some(ControlEvent::StrideUp));
        assert_eq!(control_event(KeyCode::Space), Some(ControlEvent::TogglePause));
        assert_eq!(control_event(KeyCode::KeyQ), None);
    }
}
