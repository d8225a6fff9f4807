use std::path::PathBuf;

use crate::stage::StageKind;

/// Errors surfaced by the shader lifecycle and pipeline setup.
///
/// Compile, link, and I/O failures are fatal during the initial load (no
/// valid program exists yet) and recoverable during reloads, where the
/// previously linked program keeps running untouched.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The driver rejected a stage's source text.
    #[error("{kind} shader `{label}` failed to compile: {log}")]
    Compile {
        kind: StageKind,
        label: String,
        log: String,
    },
    /// The attached stages were rejected at link time.
    #[error("program `{label}` failed to link: {log}")]
    Link { label: String, log: String },
    /// A shader source file could not be read.
    #[error("failed to read shader source {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The framebuffer/texture pair backing a capture could not be built.
    #[error("offscreen target allocation failed: {reason}")]
    Offscreen { reason: String },
    /// The graphics backend could not be initialised.
    #[error("graphics device error: {reason}")]
    Device { reason: String },
    /// `current()` was called on a program that has never linked.
    #[error("program `{0}` has never linked successfully")]
    NeverLinked(String),
}
