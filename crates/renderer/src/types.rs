//! Shared value types crossing the collaborator boundaries.

use std::path::PathBuf;
use std::time::Instant;

/// Pointer state in logical window coordinates; the pipeline maps it to
/// device pixels using the scale factor captured at resize time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    pub position: (f64, f64),
    pub pressed: bool,
}

/// Per-frame snapshot supplied by the windowing collaborator.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
    /// Drawable size in device pixels.
    pub drawable_size: (u32, u32),
    /// Device pixels per logical unit; an integer multiple of 1 on
    /// high-density displays.
    pub scale_factor: f64,
    pub pointer: PointerState,
    /// Sample point for the pausable clock.
    pub now: Instant,
}

/// One-shot operator requests. Rising-edge detection is the input
/// collaborator's job; each value represents a single physical press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    Reload,
    CyclePrev,
    CycleNext,
    StrideUp,
    StrideDown,
    TogglePostProcessing,
    TogglePause,
}

/// Foveated-rendering parameters.
///
/// `thresholds` are fractions of the screen-diagonal proxy and must be
/// strictly increasing; the configuration collaborator enforces that at
/// load time, so the pipeline may assume it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FoveationParams {
    pub stride: u32,
    pub thresholds: [f32; 3],
}

impl FoveationParams {
    pub const MIN_STRIDE: u32 = 2;
    pub const MAX_STRIDE: u32 = 256;

    /// Doubles the pixel block size, clamped to [`Self::MAX_STRIDE`].
    pub fn double_stride(&mut self) {
        self.stride = (self.stride * 2).min(Self::MAX_STRIDE);
    }

    /// Halves the pixel block size, clamped to [`Self::MIN_STRIDE`].
    pub fn halve_stride(&mut self) {
        self.stride = (self.stride / 2).max(Self::MIN_STRIDE);
    }

    /// Thresholds in device pixels for the given drawable size, using the
    /// diagonal proxy `0.5 * (width + height)`.
    pub fn scaled_thresholds(&self, width: u32, height: u32) -> [f32; 3] {
        let diagonal = 0.5 * (width as f32 + height as f32);
        [
            self.thresholds[0] * diagonal,
            self.thresholds[1] * diagonal,
            self.thresholds[2] * diagonal,
        ]
    }
}

/// Everything the pipeline consumes from the configuration collaborator.
///
/// Paths are expected to be fully resolved; precondition checks (threshold
/// monotonicity, stride bounds) have already happened at configuration
/// load, before any GPU resource exists.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub vertex_shader: PathBuf,
    pub fragment_dir: PathBuf,
    pub start_fragment: PathBuf,
    /// Closing fragment stage used when foveation is disabled.
    pub passthrough_shader: PathBuf,
    /// Closing fragment stage used when foveation is enabled.
    pub drop_shader: PathBuf,
    pub reconstruction_shader: PathBuf,
    pub foveation_enabled: bool,
    pub post_processing: bool,
    pub foveation: FoveationParams,
}
