use crate::error::RenderError;
use crate::gpu::{GpuDevice, ProgramHandle, StageHandle};
use crate::stage::{read_source, ShaderStage, StageSource};

/// A linked, directly-bindable combination of shader stages.
///
/// The program is either *valid* (a linked handle is installed and
/// bindable) or still in its previous valid state after a failed rebuild;
/// it is never observable half-linked. The one easy way to break that is
/// deleting the old driver object before the replacement link has
/// succeeded, so [`ShaderProgram::build`] defers releasing the previous
/// handle until the new one is confirmed.
#[derive(Debug)]
pub struct ShaderProgram {
    label: String,
    handle: Option<ProgramHandle>,
}

impl ShaderProgram {
    /// Creates an empty program; [`build`](Self::build) must succeed once
    /// before [`current`](Self::current) can hand out a handle.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            handle: None,
        }
    }

    /// Re-reads every source, compiles the stages, and links a replacement
    /// program.
    ///
    /// Fails fast on the first compile or read error, releasing the stages
    /// already compiled in this attempt. A link failure releases the new
    /// program object and this attempt's stages and leaves the previous
    /// handle untouched and bindable. Only on link success is the old
    /// handle released; the stage objects are always released once linking
    /// has been decided, since a linked program no longer needs them.
    pub fn build<D: GpuDevice>(
        &mut self,
        device: &D,
        sources: &[StageSource],
    ) -> Result<(), RenderError> {
        let mut stages: Vec<ShaderStage> = Vec::with_capacity(sources.len());
        for source in sources {
            let compiled = read_source(&source.path)
                .and_then(|text| ShaderStage::compile(device, source, &text));
            match compiled {
                Ok(stage) => stages.push(stage),
                Err(err) => {
                    release_stages(device, stages);
                    return Err(err);
                }
            }
        }

        let linked = {
            let handles: Vec<&StageHandle> = stages.iter().map(ShaderStage::handle).collect();
            device.link_program(&handles)
        };
        match linked {
            Ok(replacement) => {
                release_stages(device, stages);
                if let Some(previous) = self.handle.take() {
                    device.release_program(previous);
                }
                self.handle = Some(replacement);
                tracing::debug!(label = %self.label, "program linked");
                Ok(())
            }
            Err(log) => {
                release_stages(device, stages);
                Err(RenderError::Link {
                    label: self.label.clone(),
                    log,
                })
            }
        }
    }

    /// The presently valid linked handle; errors only if no build has ever
    /// succeeded.
    pub fn current(&self) -> Result<&ProgramHandle, RenderError> {
        self.handle
            .as_ref()
            .ok_or_else(|| RenderError::NeverLinked(self.label.clone()))
    }

    pub fn is_linked(&self) -> bool {
        self.handle.is_some()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Releases the linked handle, if any; consumes the program so the
    /// handle is freed exactly once.
    pub fn destroy<D: GpuDevice>(mut self, device: &D) {
        if let Some(handle) = self.handle.take() {
            device.release_program(handle);
        }
    }
}

fn release_stages<D: GpuDevice>(device: &D, stages: Vec<ShaderStage>) {
    for stage in stages {
        stage.release(device);
    }
}
