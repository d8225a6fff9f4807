use std::time::Instant;

use tracing::{info, warn};

use crate::clock::FrameClock;
use crate::error::RenderError;
use crate::gallery::{CycleDirection, GallerySources, ShaderGallery};
use crate::gpu::{GpuDevice, ProgramHandle};
use crate::offscreen::OffscreenTarget;
use crate::program::ShaderProgram;
use crate::stage::{StageKind, StageSource};
use crate::types::{ControlEvent, FoveationParams, FrameInput, PipelineConfig};

/// Background color cleared before the main pass.
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Per-frame orchestrator for the two-pass foveated pipeline.
///
/// Owns the gallery-backed main program, the reconstruction program, the
/// offscreen capture target, and the pausable clock. All of it lives on
/// the render thread; reloads and cycles complete synchronously before the
/// next frame's main pass binds a program.
pub struct RenderPipeline {
    gallery: ShaderGallery,
    reconstruction: ShaderProgram,
    reconstruction_sources: Vec<StageSource>,
    offscreen: OffscreenTarget,
    clock: FrameClock,
    foveation: FoveationParams,
    foveation_enabled: bool,
    post_processing: bool,
    frame_index: u64,
    drawable: (u32, u32),
    pointer_scale: f64,
}

impl RenderPipeline {
    /// Builds both programs and the offscreen target for the initial
    /// drawable size. Every error here is fatal: the pipeline refuses to
    /// exist without one valid program per pass.
    pub fn new<D: GpuDevice>(
        device: &D,
        config: &PipelineConfig,
        initial_size: (u32, u32),
    ) -> Result<Self, RenderError> {
        let gallery = ShaderGallery::load(device, &gallery_sources(config))?;

        let reconstruction_sources = reconstruction_sources(config);
        let mut reconstruction = ShaderProgram::new("reconstruction");
        reconstruction.build(device, &reconstruction_sources)?;

        let mut offscreen = OffscreenTarget::new();
        offscreen.ensure_size(device, initial_size.0, initial_size.1)?;
        device.set_viewport(initial_size.0, initial_size.1);

        Ok(Self {
            gallery,
            reconstruction,
            reconstruction_sources,
            offscreen,
            clock: FrameClock::new(),
            foveation: config.foveation,
            foveation_enabled: config.foveation_enabled,
            post_processing: config.post_processing,
            frame_index: 0,
            drawable: initial_size,
            pointer_scale: 1.0,
        })
    }

    /// Runs one frame: resize check, main pass, optional capture, optional
    /// reconstruction pass. Presentation happens in the caller afterwards.
    pub fn render_frame<D: GpuDevice>(
        &mut self,
        device: &D,
        frame: &FrameInput,
    ) -> Result<(), RenderError> {
        if frame.drawable_size != self.drawable || frame.scale_factor != self.pointer_scale {
            let (width, height) = frame.drawable_size;
            self.drawable = frame.drawable_size;
            self.pointer_scale = frame.scale_factor;
            device.set_viewport(width, height);
            self.offscreen.ensure_size(device, width, height)?;
        }

        self.clock.tick(frame.now);

        device.bind_default_target();
        device.clear(CLEAR_COLOR);
        let main_program = self.gallery.current()?;
        device.bind_program(main_program);
        self.push_uniforms(device, main_program, frame);
        device.draw_fullscreen();

        if self.post_processing {
            self.offscreen.capture(device);
            self.offscreen.bind_texture(device);
            device.bind_default_target();
            let reconstruction = self.reconstruction.current()?;
            device.bind_program(reconstruction);
            self.push_uniforms(device, reconstruction, frame);
            device.draw_fullscreen();
        }

        self.frame_index = self.frame_index.wrapping_add(1);
        Ok(())
    }

    /// Applies one debounced operator request. Rebuild failures are
    /// recoverable here: the diagnostic is logged and the previously valid
    /// program keeps running.
    pub fn handle_event<D: GpuDevice>(&mut self, device: &D, event: ControlEvent, now: Instant) {
        match event {
            ControlEvent::Reload => self.reload(device),
            ControlEvent::CyclePrev => self.cycle(device, CycleDirection::Backward),
            ControlEvent::CycleNext => self.cycle(device, CycleDirection::Forward),
            ControlEvent::StrideUp => {
                self.foveation.double_stride();
                info!(stride = self.foveation.stride, "stride doubled");
            }
            ControlEvent::StrideDown => {
                self.foveation.halve_stride();
                info!(stride = self.foveation.stride, "stride halved");
            }
            ControlEvent::TogglePostProcessing => {
                self.post_processing = !self.post_processing;
                info!(enabled = self.post_processing, "post-processing toggled");
            }
            ControlEvent::TogglePause => {
                if self.clock.toggle(now) {
                    info!(seconds = self.clock.seconds(), "resuming clock");
                } else {
                    info!(seconds = self.clock.seconds(), "freezing clock");
                }
            }
        }
    }

    /// Steps the gallery selection, keeping the previous program where the
    /// newly selected variant fails to build.
    fn cycle<D: GpuDevice>(&mut self, device: &D, direction: CycleDirection) {
        if let Err(err) = self.gallery.cycle(device, direction) {
            warn!(error = %err, "gallery cycle failed; keeping previous program");
        }
    }

    /// Re-reads every shader source and rebuilds both programs, keeping
    /// the previous programs where a rebuild fails.
    pub fn reload<D: GpuDevice>(&mut self, device: &D) {
        if let Err(err) = self.gallery.reload(device) {
            warn!(error = %err, "gallery reload failed; keeping previous program");
        }
        if let Err(err) = self.reconstruction.build(device, &self.reconstruction_sources) {
            warn!(error = %err, "reconstruction reload failed; keeping previous program");
        }
    }

    /// Adopts a freshly loaded configuration (explicit reload request):
    /// parameters and toggles switch over immediately, then both programs
    /// rebuild non-fatally from the new paths.
    pub fn apply_config<D: GpuDevice>(&mut self, device: &D, config: &PipelineConfig) {
        self.foveation = config.foveation;
        self.foveation_enabled = config.foveation_enabled;
        self.post_processing = config.post_processing;
        self.reconstruction_sources = reconstruction_sources(config);

        let sources = gallery_sources(config);
        if let Err(err) = self.gallery.reload_with(device, &sources) {
            warn!(error = %err, "gallery reload failed; keeping previous program");
        }
        if let Err(err) = self.reconstruction.build(device, &self.reconstruction_sources) {
            warn!(error = %err, "reconstruction reload failed; keeping previous program");
        }
    }

    pub fn foveation(&self) -> &FoveationParams {
        &self.foveation
    }

    pub fn post_processing_enabled(&self) -> bool {
        self.post_processing
    }

    pub fn foveation_enabled(&self) -> bool {
        self.foveation_enabled
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn gallery(&self) -> &ShaderGallery {
        &self.gallery
    }

    /// Releases every GPU resource the pipeline owns, each exactly once.
    pub fn destroy<D: GpuDevice>(self, device: &D) {
        self.gallery.destroy(device);
        self.reconstruction.destroy(device);
        self.offscreen.destroy(device);
    }

    /// Sets the named uniform slots on the bound program. Slots a variant
    /// does not declare are silently skipped by the device.
    fn push_uniforms<D: GpuDevice>(
        &self,
        device: &D,
        program: &ProgramHandle,
        frame: &FrameInput,
    ) {
        let (width, height) = self.drawable;
        device.set_uniform_f32(program, "iTime", self.clock.seconds());
        device.set_uniform_i32(program, "iFrame", self.frame_index as i32);
        device.set_uniform_vec2(program, "iResolution", [width as f32, height as f32]);

        let pointer = [
            (frame.pointer.position.0 * self.pointer_scale) as f32,
            (frame.pointer.position.1 * self.pointer_scale) as f32,
        ];
        if frame.pointer.pressed {
            device.set_uniform_vec2(program, "iMouse", pointer);
        }
        device.set_uniform_vec2(program, "Mouse", pointer);

        device.set_uniform_i32(program, "stride", self.foveation.stride as i32);
        let [thresh1, thresh2, thresh3] = self.foveation.scaled_thresholds(width, height);
        device.set_uniform_f32(program, "thresh1", thresh1);
        device.set_uniform_f32(program, "thresh2", thresh2);
        device.set_uniform_f32(program, "thresh3", thresh3);
    }
}

fn gallery_sources(config: &PipelineConfig) -> GallerySources {
    let closing_fragment = if config.foveation_enabled {
        config.drop_shader.clone()
    } else {
        config.passthrough_shader.clone()
    };
    GallerySources {
        vertex: config.vertex_shader.clone(),
        fragment_dir: config.fragment_dir.clone(),
        start_fragment: config.start_fragment.clone(),
        closing_fragment,
    }
}

fn reconstruction_sources(config: &PipelineConfig) -> Vec<StageSource> {
    vec![
        StageSource::new(config.vertex_shader.clone(), StageKind::Vertex, "vertex"),
        StageSource::new(
            config.reconstruction_shader.clone(),
            StageKind::Fragment,
            "reconstruct",
        ),
    ]
}
