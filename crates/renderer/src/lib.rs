//! Core rendering subsystem for fovshade.
//!
//! The crate owns the shader-program lifecycle (compile, link, atomic
//! hot-reload, variant cycling) and the two-pass foveated render pipeline.
//! The overall flow is:
//!
//! ```text
//!   fovshade (window + input)
//!          │ FrameInput / ControlEvent
//!          ▼
//!   RenderPipeline ──▶ ShaderGallery ──▶ ShaderProgram ──▶ GpuDevice
//!          │                                                   ▲
//!          └─▶ OffscreenTarget (capture + reconstruction) ─────┘
//! ```
//!
//! Everything is written against the [`gpu::GpuDevice`] trait so the
//! lifecycle guarantees (a failed reload never disturbs the running
//! program, offscreen buffers are reallocated exactly when the drawable
//! size changes) hold independently of the backing graphics API. The
//! shipped backend is [`gpu::GlDevice`], a thin `glow`/OpenGL layer.
//!
//! The render loop, GPU submission, reloads, and cycles all execute on one
//! thread; nothing in this crate suspends or spans frames, so no locking is
//! involved anywhere.

mod clock;
mod error;
mod gallery;
mod offscreen;
mod pipeline;
mod program;
mod stage;

pub mod gpu;
pub mod types;

pub use clock::FrameClock;
pub use error::RenderError;
pub use gallery::{CycleDirection, GallerySources, ShaderGallery};
pub use offscreen::OffscreenTarget;
pub use pipeline::RenderPipeline;
pub use program::ShaderProgram;
pub use stage::{ShaderStage, StageKind, StageSource};
pub use types::{ControlEvent, FoveationParams, FrameInput, PipelineConfig, PointerState};
