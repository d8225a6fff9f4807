use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RenderError;
use crate::gpu::{GpuDevice, StageHandle};

/// Role a compiled shader unit plays inside a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Recipe for one stage: where its source lives and what role it fills.
///
/// Source text is re-read from `path` on every build, so reloads and cycles
/// pick up live edits to the file.
#[derive(Clone, Debug)]
pub struct StageSource {
    pub path: PathBuf,
    pub kind: StageKind,
    pub label: String,
}

impl StageSource {
    pub fn new(path: impl Into<PathBuf>, kind: StageKind, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            label: label.into(),
        }
    }
}

/// One compiled shader unit owning its driver handle exclusively.
///
/// Stages only exist between a successful compile and the link that
/// supersedes them; they never self-destruct silently.
#[derive(Debug)]
pub struct ShaderStage {
    kind: StageKind,
    label: String,
    handle: StageHandle,
}

impl ShaderStage {
    /// Submits `text` to the driver compiler for `source`'s stage kind.
    ///
    /// On failure the backend has already released any partially created
    /// driver object; only the diagnostic comes back.
    pub fn compile<D: GpuDevice>(
        device: &D,
        source: &StageSource,
        text: &str,
    ) -> Result<Self, RenderError> {
        match device.compile_stage(source.kind, text) {
            Ok(handle) => Ok(Self {
                kind: source.kind,
                label: source.label.clone(),
                handle,
            }),
            Err(log) => Err(RenderError::Compile {
                kind: source.kind,
                label: source.label.clone(),
                log,
            }),
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn handle(&self) -> &StageHandle {
        &self.handle
    }

    /// Releases the compiled object; consumes the stage so the handle can
    /// never be freed twice.
    pub fn release<D: GpuDevice>(self, device: &D) {
        device.release_stage(self.handle);
    }
}

/// Reads a shader source file, failing with the path attached.
pub(crate) fn read_source(path: &Path) -> Result<String, RenderError> {
    tracing::debug!(path = %path.display(), "reading shader source");
    fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::fake::{FakeDevice, COMPILE_FAIL_TOKEN};

    #[test]
    fn compile_failure_reports_kind_and_label() {
        let device = FakeDevice::new();
        let source = StageSource::new("waves.frag", StageKind::Fragment, "main");
        let err = ShaderStage::compile(&device, &source, COMPILE_FAIL_TOKEN).unwrap_err();
        match err {
            RenderError::Compile { kind, label, .. } => {
                assert_eq!(kind, StageKind::Fragment);
                assert_eq!(label, "main");
            }
            other => panic!("expected compile error, got {other}"),
        }
        assert_eq!(device.live_stages(), 0);
    }

    #[test]
    fn release_consumes_the_handle() {
        let device = FakeDevice::new();
        let source = StageSource::new("quad.vert", StageKind::Vertex, "vertex");
        let stage = ShaderStage::compile(&device, &source, "void main() {}").unwrap();
        assert_eq!(device.live_stages(), 1);
        stage.release(&device);
        assert_eq!(device.live_stages(), 0);
    }

    #[test]
    fn read_source_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.frag");
        match read_source(&missing) {
            Err(RenderError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected io error, got {other:?}", other = other.map(|_| ())),
        }
    }
}
