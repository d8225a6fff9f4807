use crate::error::RenderError;
use crate::gpu::{GpuDevice, OffscreenHandles};

/// Framebuffer + color texture that captures the main pass's output for
/// the reconstruction pass.
///
/// The pair is owned exclusively by the pipeline and is destroyed and
/// recreated together, never partially. The texture dimensions always
/// equal the last size passed to [`ensure_size`](Self::ensure_size);
/// the pipeline calls it before any capture in a frame where the drawable
/// size changed.
pub struct OffscreenTarget {
    handles: Option<OffscreenHandles>,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    /// Creates an unallocated target; `ensure_size` performs the first
    /// allocation.
    pub fn new() -> Self {
        Self {
            handles: None,
            width: 0,
            height: 0,
        }
    }

    /// Reallocates the framebuffer/texture pair iff the stored size differs
    /// from the requested one. Calling it again with the same size keeps
    /// the existing resources untouched.
    pub fn ensure_size<D: GpuDevice>(
        &mut self,
        device: &D,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if self.handles.is_some() && self.width == width && self.height == height {
            return Ok(());
        }
        if let Some(previous) = self.handles.take() {
            device.release_offscreen(previous);
        }
        let handles = device
            .create_offscreen(width, height)
            .map_err(|reason| RenderError::Offscreen { reason })?;
        self.handles = Some(handles);
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Copies the default target's color contents into this target via a
    /// full-rectangle blit at the stored size.
    pub fn capture<D: GpuDevice>(&self, device: &D) {
        if let Some(handles) = &self.handles {
            device.capture_default_target(handles, self.width, self.height);
        }
    }

    /// Binds the backing texture as the input sampler for the next pass.
    pub fn bind_texture<D: GpuDevice>(&self, device: &D) {
        if let Some(handles) = &self.handles {
            device.bind_offscreen_texture(handles);
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Releases framebuffer and texture together.
    pub fn destroy<D: GpuDevice>(mut self, device: &D) {
        if let Some(handles) = self.handles.take() {
            device.release_offscreen(handles);
        }
    }

    #[cfg(test)]
    fn raw_ids(&self) -> Option<(u32, u32)> {
        self.handles
            .as_ref()
            .map(|h| (h.framebuffer.raw(), h.texture.raw()))
    }
}

impl Default for OffscreenTarget {
    fn default() -> Self {
        Self::new()
    }
}
