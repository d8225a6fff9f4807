//! Graphics-device abstraction and ownership-tagged resource handles.
//!
//! Handles are deliberately neither `Clone` nor `Copy`: each wraps a driver
//! object with exactly one owner, is released exactly once, and moves when
//! ownership is reassigned (a successful reload moves the old program handle
//! into the release call before the new one becomes current).

mod gl;

#[cfg(test)]
pub(crate) mod fake;

pub use gl::GlDevice;

use std::num::NonZeroU32;

use crate::stage::StageKind;

/// Owner of one compiled-but-unlinked shader object.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StageHandle(NonZeroU32);

impl StageHandle {
    pub fn new(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0.get()
    }

    pub(crate) fn id(&self) -> NonZeroU32 {
        self.0
    }
}

/// Owner of one linked, bindable program object.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(NonZeroU32);

impl ProgramHandle {
    pub fn new(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0.get()
    }

    pub(crate) fn id(&self) -> NonZeroU32 {
        self.0
    }
}

/// Owner of one framebuffer object.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct FramebufferHandle(NonZeroU32);

impl FramebufferHandle {
    pub fn new(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0.get()
    }

    pub(crate) fn id(&self) -> NonZeroU32 {
        self.0
    }
}

/// Owner of one color texture object.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(NonZeroU32);

impl TextureHandle {
    pub fn new(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0.get()
    }

    pub(crate) fn id(&self) -> NonZeroU32 {
        self.0
    }
}

/// Framebuffer plus backing color texture, created and destroyed together.
#[derive(Debug)]
pub struct OffscreenHandles {
    pub framebuffer: FramebufferHandle,
    pub texture: TextureHandle,
}

/// Contract between the lifecycle/pipeline code and the graphics driver.
///
/// Compile and link failures carry the driver's human-readable info log as
/// the `Err` payload; implementations must release any partially created
/// driver object before returning it, so callers never hold half-built
/// state. Uniform setters resolve slots by name against the bound program
/// and silently do nothing when the slot does not exist: shader variants
/// are not required to declare every uniform.
pub trait GpuDevice {
    fn compile_stage(&self, kind: StageKind, source: &str) -> Result<StageHandle, String>;
    fn release_stage(&self, stage: StageHandle);

    fn link_program(&self, stages: &[&StageHandle]) -> Result<ProgramHandle, String>;
    fn release_program(&self, program: ProgramHandle);

    fn create_offscreen(&self, width: u32, height: u32) -> Result<OffscreenHandles, String>;
    fn release_offscreen(&self, target: OffscreenHandles);
    /// Copies the default target's color contents into `target` via a
    /// full-rectangle blit; source and destination rectangles are identical.
    fn capture_default_target(&self, target: &OffscreenHandles, width: u32, height: u32);
    fn bind_offscreen_texture(&self, target: &OffscreenHandles);

    fn bind_default_target(&self);
    fn set_viewport(&self, width: u32, height: u32);
    fn clear(&self, color: [f32; 4]);
    fn bind_program(&self, program: &ProgramHandle);
    /// Draws the full-screen quad (two triangles covering the viewport).
    fn draw_fullscreen(&self);

    fn set_uniform_f32(&self, program: &ProgramHandle, name: &str, value: f32);
    fn set_uniform_i32(&self, program: &ProgramHandle, name: &str, value: i32);
    fn set_uniform_vec2(&self, program: &ProgramHandle, name: &str, value: [f32; 2]);
}
