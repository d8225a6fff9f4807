//! TOML configuration for the fovshade host.
//!
//! Configuration is loaded once at startup and again on explicit reload
//! requests. Validation is strict and happens entirely here, before any
//! GPU resource exists: a file that parses but violates a parameter
//! precondition (non-increasing thresholds, out-of-range stride) is
//! rejected with a [`ConfigError::Invalid`] naming the offending field.
//!
//! Shader paths in the file are interpreted relative to the directory
//! containing the configuration file, so a config tree can be relocated
//! wholesale.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Smallest permitted pixel block size.
pub const MIN_STRIDE: u32 = 2;
/// Largest permitted pixel block size.
pub const MAX_STRIDE: u32 = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level configuration, mirroring the TOML document layout.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_true")]
    pub vsync: bool,
    #[serde(default)]
    pub window: WindowConfig,
    pub shaders: ShaderConfig,
    #[serde(default)]
    pub foveation: FoveationConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_title")]
    pub title: String,
}

/// Shader file locations. All paths are relative to the config file's
/// directory until [`AppConfig::load`] resolves them.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShaderConfig {
    pub vertex: PathBuf,
    /// Directory scanned for interchangeable fragment variants.
    pub fragment_dir: PathBuf,
    /// Variant built first; may live outside `fragment_dir`.
    pub start_fragment: PathBuf,
    pub passthrough: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FoveationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub post_processing: bool,
    #[serde(default = "default_drop_shader")]
    pub drop_shader: PathBuf,
    #[serde(default = "default_reconstruction_shader")]
    pub reconstruction_shader: PathBuf,
    /// Pixel block size; a power of two keeps blocks aligned but any value
    /// in `[MIN_STRIDE, MAX_STRIDE]` is accepted.
    #[serde(default = "default_stride")]
    pub stride: u32,
    /// Ring boundaries as fractions of the screen-diagonal proxy; must be
    /// strictly increasing.
    #[serde(default = "default_thresholds")]
    pub thresholds: [f32; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
        }
    }
}

impl Default for FoveationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            post_processing: true,
            drop_shader: default_drop_shader(),
            reconstruction_shader: default_reconstruction_shader(),
            stride: default_stride(),
            thresholds: default_thresholds(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_title() -> String {
    "fovshade".to_string()
}

fn default_drop_shader() -> PathBuf {
    PathBuf::from("fr_drop.frag")
}

fn default_reconstruction_shader() -> PathBuf {
    PathBuf::from("fr_reconstruct.frag")
}

fn default_stride() -> u32 {
    8
}

fn default_thresholds() -> [f32; 3] {
    [0.1, 0.25, 0.4]
}

impl AppConfig {
    /// Reads, parses, resolves, and validates the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: AppConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.shaders.vertex,
            &mut self.shaders.fragment_dir,
            &mut self.shaders.start_fragment,
            &mut self.shaders.passthrough,
            &mut self.foveation.drop_shader,
            &mut self.foveation.reconstruction_shader,
        ] {
            if path.is_relative() {
                *path = base.join(&path);
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid {
                field: "window",
                reason: format!(
                    "dimensions must be non-zero, got {}x{}",
                    self.window.width, self.window.height
                ),
            });
        }
        let stride = self.foveation.stride;
        if !(MIN_STRIDE..=MAX_STRIDE).contains(&stride) {
            return Err(ConfigError::Invalid {
                field: "foveation.stride",
                reason: format!("{stride} is outside [{MIN_STRIDE}, {MAX_STRIDE}]"),
            });
        }
        let [t1, t2, t3] = self.foveation.thresholds;
        if !(t1 > 0.0 && t1 < t2 && t2 < t3) {
            return Err(ConfigError::Invalid {
                field: "foveation.thresholds",
                reason: format!("must be positive and strictly increasing, got [{t1}, {t2}, {t3}]"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const MINIMAL: &str = r#"
[shaders]
vertex = "quad.vert"
fragment_dir = "gallery"
start_fragment = "gallery/waves.frag"
passthrough = "passthrough.frag"
"#;

    fn write_config(text: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params").join("fovshade.toml");
        fs::create_dir(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        (dir, path)
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let (_dir, path) = write_config(MINIMAL);
        let config = AppConfig::load(&path).unwrap();
        assert!(config.vsync);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.foveation.stride, 8);
        assert_eq!(config.foveation.thresholds, [0.1, 0.25, 0.4]);
        assert!(config.foveation.enabled);
    }

    #[test]
    fn relative_paths_resolve_against_the_config_directory() {
        let (dir, path) = write_config(MINIMAL);
        let config = AppConfig::load(&path).unwrap();
        let base = dir.path().join("params");
        assert_eq!(config.shaders.vertex, base.join("quad.vert"));
        assert_eq!(config.shaders.fragment_dir, base.join("gallery"));
        assert_eq!(config.foveation.drop_shader, base.join("fr_drop.frag"));
    }

    #[test]
    fn absolute_paths_pass_through_unchanged() {
        let text = r#"
[shaders]
vertex = "/opt/shaders/quad.vert"
fragment_dir = "gallery"
start_fragment = "gallery/waves.frag"
passthrough = "passthrough.frag"
"#;
        let (_dir, path) = write_config(text);
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.shaders.vertex, PathBuf::from("/opt/shaders/quad.vert"));
    }

    #[test]
    fn non_increasing_thresholds_are_rejected() {
        let text = format!("{MINIMAL}\n[foveation]\nthresholds = [0.25, 0.25, 0.4]\n");
        let (_dir, path) = write_config(&text);
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "foveation.thresholds",
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_stride_is_rejected() {
        for stride in [0, 1, 512] {
            let text = format!("{MINIMAL}\n[foveation]\nstride = {stride}\n");
            let (_dir, path) = write_config(&text);
            let err = AppConfig::load(&path).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    field: "foveation.stride",
                    ..
                }
            ));
        }
    }

    #[test]
    fn unknown_keys_fail_the_parse() {
        let text = format!("{MINIMAL}\nspeed = 9\n");
        let (_dir, path) = write_config(&text);
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_reports_io_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = AppConfig::load(&path).unwrap_err();
        match err {
            ConfigError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
