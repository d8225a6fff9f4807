use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::RenderError;
use crate::gpu::{GpuDevice, ProgramHandle};
use crate::program::ShaderProgram;
use crate::stage::{StageKind, StageSource};

/// Which way to step through the gallery's variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleDirection {
    Forward,
    Backward,
}

/// Shader file locations a gallery is assembled from.
///
/// The main-pass program always links three stages: the fixed vertex stage,
/// the selected fragment variant, and a fixed closing fragment stage (the
/// foveation drop shader, or a pass-through when foveation is off).
#[derive(Clone, Debug)]
pub struct GallerySources {
    pub vertex: PathBuf,
    pub fragment_dir: PathBuf,
    pub start_fragment: PathBuf,
    pub closing_fragment: PathBuf,
}

/// Directory-backed set of interchangeable main-pass fragment variants.
///
/// The directory is scanned once at load time and sorted so cycling is
/// reproducible across runs; the index only moves on explicit cycle
/// requests and always stays within `[0, count)`.
#[derive(Debug)]
pub struct ShaderGallery {
    program: ShaderProgram,
    vertex: PathBuf,
    closing: PathBuf,
    active: PathBuf,
    variants: Vec<PathBuf>,
    index: usize,
}

impl ShaderGallery {
    /// Scans the variant directory and builds the initial program from the
    /// designated starting variant.
    ///
    /// Any failure here is fatal to the caller: without one valid program
    /// the pipeline has nothing to bind.
    pub fn load<D: GpuDevice>(device: &D, sources: &GallerySources) -> Result<Self, RenderError> {
        let variants = discover_variants(&sources.fragment_dir)?;
        for variant in &variants {
            info!(path = %variant.display(), "found shader variant");
        }

        // The starting variant may live outside the scanned directory; it
        // is honored as-is and cycling then steps into the scanned set.
        let (index, active) = match variants
            .iter()
            .position(|path| path == &sources.start_fragment)
        {
            Some(index) => (index, variants[index].clone()),
            None => (0, sources.start_fragment.clone()),
        };

        let mut gallery = Self {
            program: ShaderProgram::new("gallery"),
            vertex: sources.vertex.clone(),
            closing: sources.closing_fragment.clone(),
            active,
            variants,
            index,
        };
        gallery.reload(device)?;
        Ok(gallery)
    }

    /// Steps the selection with wraparound and rebuilds from the newly
    /// selected file, picking up live edits.
    ///
    /// With zero discovered variants this is a successful no-op that keeps
    /// the current program. A rebuild failure keeps the previous program
    /// but the index still moves, so the next cycle tries the neighbour.
    pub fn cycle<D: GpuDevice>(
        &mut self,
        device: &D,
        direction: CycleDirection,
    ) -> Result<(), RenderError> {
        if self.variants.is_empty() {
            return Ok(());
        }
        let count = self.variants.len();
        self.index = match direction {
            CycleDirection::Forward => (self.index + 1) % count,
            CycleDirection::Backward => (self.index + count - 1) % count,
        };
        self.active = self.variants[self.index].clone();
        info!(path = %self.active.display(), index = self.index, "cycling to shader variant");
        self.reload(device)
    }

    /// Re-reads the currently selected sources and rebuilds the program;
    /// atomicity comes from [`ShaderProgram::build`].
    pub fn reload<D: GpuDevice>(&mut self, device: &D) -> Result<(), RenderError> {
        let sources = self.stage_set();
        self.program.build(device, &sources)
    }

    /// Swaps in freshly configured vertex/closing stages (a configuration
    /// reload may toggle foveation and with it the closing shader), then
    /// rebuilds the active variant. The variant list is not rescanned.
    pub fn reload_with<D: GpuDevice>(
        &mut self,
        device: &D,
        sources: &GallerySources,
    ) -> Result<(), RenderError> {
        self.vertex = sources.vertex.clone();
        self.closing = sources.closing_fragment.clone();
        self.reload(device)
    }

    pub fn current(&self) -> Result<&ProgramHandle, RenderError> {
        self.program.current()
    }

    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Path of the variant the current program was built from.
    pub fn active_variant(&self) -> &Path {
        &self.active
    }

    pub fn destroy<D: GpuDevice>(self, device: &D) {
        self.program.destroy(device);
    }

    fn stage_set(&self) -> [StageSource; 3] {
        [
            StageSource::new(self.vertex.clone(), StageKind::Vertex, "vertex"),
            StageSource::new(self.active.clone(), StageKind::Fragment, "main"),
            StageSource::new(self.closing.clone(), StageKind::Fragment, "closing"),
        ]
    }
}

/// Lists the variant files in `dir`, sorted for deterministic cycling.
fn discover_variants(dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|source| RenderError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut variants = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() {
            variants.push(path);
        }
    }
    variants.sort();
    Ok(variants)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::gpu::fake::{FakeDevice, COMPILE_FAIL_TOKEN};

    struct Fixture {
        _root: tempfile::TempDir,
        sources: GallerySources,
    }

    /// Lays out a vertex shader, a closing shader, and `variants` fragment
    /// files named `v0.frag`, `v1.frag`, ...
    fn fixture(variants: usize) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let fragment_dir = root.path().join("gallery");
        fs::create_dir(&fragment_dir).unwrap();
        let vertex = root.path().join("quad.vert");
        let closing = root.path().join("closing.frag");
        fs::write(&vertex, "void main() {}").unwrap();
        fs::write(&closing, "void main() {}").unwrap();
        for i in 0..variants {
            fs::write(fragment_dir.join(format!("v{i}.frag")), format!("// variant {i}")).unwrap();
        }
        let start_fragment = if variants > 0 {
            fragment_dir.join("v0.frag")
        } else {
            // Zero-variant galleries still need one buildable main stage.
            let lone = root.path().join("lone.frag");
            fs::write(&lone, "// outside the gallery").unwrap();
            lone
        };
        Fixture {
            sources: GallerySources {
                vertex,
                fragment_dir,
                start_fragment,
                closing_fragment: closing,
            },
            _root: root,
        }
    }

    #[test]
    fn scan_is_sorted_and_start_variant_selected() {
        let fixture = fixture(3);
        let device = FakeDevice::new();
        let gallery = ShaderGallery::load(&device, &fixture.sources).unwrap();
        assert_eq!(gallery.variant_count(), 3);
        assert_eq!(gallery.index(), 0);
        assert!(gallery.active_variant().ends_with("v0.frag"));
    }

    #[test]
    fn start_outside_directory_is_honored_over_scanned_variants() {
        let mut fixture = fixture(2);
        let lone = fixture._root.path().join("special.frag");
        fs::write(&lone, "// outside the gallery").unwrap();
        fixture.sources.start_fragment = lone.clone();

        let device = FakeDevice::new();
        let mut gallery = ShaderGallery::load(&device, &fixture.sources).unwrap();
        assert_eq!(gallery.active_variant(), lone);
        assert_eq!(gallery.variant_count(), 2);
        assert_eq!(gallery.index(), 0);

        // Cycling leaves the out-of-directory start behind.
        gallery.cycle(&device, CycleDirection::Forward).unwrap();
        assert!(gallery.active_variant().ends_with("v1.frag"));
    }

    #[test]
    fn cycling_forward_full_circle_returns_to_start() {
        let fixture = fixture(4);
        let device = FakeDevice::new();
        let mut gallery = ShaderGallery::load(&device, &fixture.sources).unwrap();
        for _ in 0..4 {
            gallery.cycle(&device, CycleDirection::Forward).unwrap();
        }
        assert_eq!(gallery.index(), 0);
    }

    #[test]
    fn cycling_backward_from_zero_wraps_to_last() {
        let fixture = fixture(3);
        let device = FakeDevice::new();
        let mut gallery = ShaderGallery::load(&device, &fixture.sources).unwrap();
        gallery.cycle(&device, CycleDirection::Backward).unwrap();
        assert_eq!(gallery.index(), 2);
        assert!(gallery.active_variant().ends_with("v2.frag"));
    }

    #[test]
    fn cycling_empty_gallery_is_a_successful_noop() {
        let fixture = fixture(0);
        let device = FakeDevice::new();
        let mut gallery = ShaderGallery::load(&device, &fixture.sources).unwrap();
        let before = gallery.current().unwrap().raw();
        gallery.cycle(&device, CycleDirection::Forward).unwrap();
        assert_eq!(gallery.current().unwrap().raw(), before);
        assert_eq!(gallery.index(), 0);
    }

    #[test]
    fn broken_variant_keeps_previous_program() {
        let fixture = fixture(2);
        let device = FakeDevice::new();
        let mut gallery = ShaderGallery::load(&device, &fixture.sources).unwrap();
        let before = gallery.current().unwrap().raw();

        fs::write(
            fixture.sources.fragment_dir.join("v1.frag"),
            COMPILE_FAIL_TOKEN,
        )
        .unwrap();
        let err = gallery.cycle(&device, CycleDirection::Forward).unwrap_err();
        assert!(matches!(err, RenderError::Compile { .. }));
        assert_eq!(gallery.current().unwrap().raw(), before);
        // Index moved on, so the next forward cycle wraps back to v0.
        assert_eq!(gallery.index(), 1);
        gallery.cycle(&device, CycleDirection::Forward).unwrap();
        assert_eq!(gallery.index(), 0);
    }

    #[test]
    fn missing_directory_fails_load_with_io_error() {
        let mut fixture = fixture(1);
        fixture.sources.fragment_dir = fixture.sources.fragment_dir.join("missing");
        let device = FakeDevice::new();
        let err = ShaderGallery::load(&device, &fixture.sources).unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
        assert_eq!(device.live_programs(), 0);
    }
}
