//! Window and GL context bootstrap built on glutin + winit.

use std::ffi::CString;
use std::num::NonZeroU32;

use anyhow::{anyhow, Context, Result};
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasRawWindowHandle;
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

/// Window, surface, and current GL context for the render thread.
///
/// The `glow` context handed out by [`GlHost::new`] is only valid while this
/// host is alive and its context stays current.
pub struct GlHost {
    window: Window,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
}

impl GlHost {
    /// Creates the window, picks a config, and makes a 3.3 core context
    /// current, returning the host alongside a loaded `glow` context.
    pub fn new(
        event_loop: &EventLoop<()>,
        title: &str,
        size: (u32, u32),
    ) -> Result<(Self, glow::Context)> {
        let window_builder = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(size.0, size.1));

        let template = ConfigTemplateBuilder::new().with_alpha_size(8).with_depth_size(0);
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

        let (window, gl_config) = display_builder
            .build(event_loop, template, |configs| {
                configs
                    .reduce(|a, b| if a.num_samples() > b.num_samples() { a } else { b })
                    .expect("at least one GL config")
            })
            .map_err(|err| anyhow!("failed to build GL display: {err}"))?;
        let window = window.ok_or_else(|| anyhow!("display builder produced no window"))?;

        let raw_window_handle = window.raw_window_handle();
        let gl_display = gl_config.display();

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_window_handle));
        let not_current = unsafe {
            gl_display
                .create_context(&gl_config, &context_attributes)
                .context("failed to create GL context")?
        };

        let inner = window.inner_size();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            non_zero(inner.width),
            non_zero(inner.height),
        );
        let surface = unsafe {
            gl_display
                .create_window_surface(&gl_config, &attrs)
                .context("failed to create window surface")?
        };

        let context = not_current
            .make_current(&surface)
            .context("failed to make GL context current")?;

        let gl = unsafe {
            glow::Context::from_loader_function(|symbol| match CString::new(symbol) {
                Ok(symbol) => gl_display.get_proc_address(&symbol).cast(),
                Err(_) => std::ptr::null(),
            })
        };

        Ok((
            Self {
                window,
                surface,
                context,
            },
            gl,
        ))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.surface
            .resize(&self.context, non_zero(width), non_zero(height));
    }

    pub fn set_vsync(&self, enabled: bool) -> Result<()> {
        let interval = if enabled {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        self.surface
            .set_swap_interval(&self.context, interval)
            .context("failed to set swap interval")
    }

    pub fn swap_buffers(&self) -> Result<()> {
        self.surface
            .swap_buffers(&self.context)
            .context("failed to swap buffers")
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value.max(1)).unwrap_or(NonZeroU32::MIN)
}
