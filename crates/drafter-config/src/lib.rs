//! Configuration management for drafter.
//!
//! Parses `drafter.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`]. Relative
//! paths in the file are resolved against the directory containing it; CLI
//! paths are resolved against the current working directory by the caller.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "drafter.toml";

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override docs source directory.
    pub source_dir: Option<PathBuf>,
    /// Override build output directory.
    pub output_dir: Option<PathBuf>,
    /// Override the debug flag for diagram rendering diagnostics.
    pub debug: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build configuration (paths are relative strings from TOML).
    build: BuildConfigRaw,
    /// Diagram rendering configuration.
    diagrams: DiagramsConfigRaw,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Resolved diagrams configuration (set after loading).
    #[serde(skip)]
    pub diagrams_resolved: DiagramsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw build configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Default, Clone)]
pub struct BuildConfig {
    /// Source directory for markdown files.
    pub source_dir: PathBuf,
    /// Output directory for rendered documents and image artifacts.
    pub output_dir: PathBuf,
}

/// Raw diagrams configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DiagramsConfigRaw {
    html_format: Option<String>,
    latex_format: Option<String>,
    font_paths: Option<Vec<String>>,
    font_map: Option<String>,
    antialias: Option<bool>,
    debug: Option<bool>,
}

/// Resolved diagram rendering configuration with absolute paths.
#[derive(Debug, Clone)]
pub struct DiagramsConfig {
    /// Output image format for HTML builds ("png", "svg" or "pdf").
    pub html_format: String,
    /// Output image format for LaTeX builds ("png", "svg" or "pdf").
    pub latex_format: String,
    /// Font files or directories to register for rendering.
    pub font_paths: Vec<PathBuf>,
    /// Optional font-map file (TOML) naming families and their font files.
    pub font_map: Option<PathBuf>,
    /// Whether to rasterize with antialiasing.
    pub antialias: bool,
    /// Whether to log full diagnostics on render failure.
    pub debug: bool,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            html_format: "png".to_owned(),
            latex_format: "png".to_owned(),
            font_paths: Vec::new(),
            font_map: None,
            antialias: false,
            debug: false,
        }
    }
}

impl Config {
    /// Load configuration and apply CLI overrides.
    ///
    /// Uses `explicit` when given; otherwise discovers `drafter.toml` upward
    /// from `start_dir`. If no config file is found, defaults are used with
    /// paths resolved against `start_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(
        start_dir: &Path,
        explicit: Option<&Path>,
        cli: &CliSettings,
    ) -> Result<Self, ConfigError> {
        let discovered = explicit.map(Path::to_path_buf).or_else(|| discover(start_dir));
        let mut config = match discovered {
            Some(path) => Self::load_file(&path)?,
            None => Self::default_with_base(start_dir),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    /// Load configuration from an explicit file path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.parent().unwrap_or(Path::new("."));
        config.resolve(base);
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            build: BuildConfigRaw::default(),
            diagrams: DiagramsConfigRaw::default(),
            build_resolved: BuildConfig::default(),
            diagrams_resolved: DiagramsConfig::default(),
            config_path: None,
        };
        config.resolve(base);
        config
    }

    /// Resolve raw string paths into absolute paths against `base`.
    fn resolve(&mut self, base: &Path) {
        let source = self.build.source_dir.as_deref().unwrap_or("docs");
        let output = self.build.output_dir.as_deref().unwrap_or("_build");
        self.build_resolved = BuildConfig {
            source_dir: base.join(source),
            output_dir: base.join(output),
        };

        let defaults = DiagramsConfig::default();
        self.diagrams_resolved = DiagramsConfig {
            html_format: self
                .diagrams
                .html_format
                .clone()
                .unwrap_or(defaults.html_format),
            latex_format: self
                .diagrams
                .latex_format
                .clone()
                .unwrap_or(defaults.latex_format),
            font_paths: self
                .diagrams
                .font_paths
                .clone()
                .unwrap_or_default()
                .iter()
                .map(|p| base.join(p))
                .collect(),
            font_map: self.diagrams.font_map.as_deref().map(|p| base.join(p)),
            antialias: self.diagrams.antialias.unwrap_or(defaults.antialias),
            debug: self.diagrams.debug.unwrap_or(defaults.debug),
        };
    }

    /// Apply CLI overrides on top of the loaded configuration.
    fn apply_cli(&mut self, cli: &CliSettings) {
        if let Some(source_dir) = &cli.source_dir {
            self.build_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &cli.output_dir {
            self.build_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(debug) = cli.debug {
            self.diagrams_resolved.debug = debug;
        }
    }
}

/// Search for `drafter.toml` in `start_dir` and its ancestors.
fn discover(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_config(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_config_file() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(tmp.path(), None, &CliSettings::default()).unwrap();

        assert_eq!(config.build_resolved.source_dir, tmp.path().join("docs"));
        assert_eq!(config.build_resolved.output_dir, tmp.path().join("_build"));
        assert_eq!(config.diagrams_resolved.html_format, "png");
        assert_eq!(config.diagrams_resolved.latex_format, "png");
        assert!(!config.diagrams_resolved.antialias);
        assert!(!config.diagrams_resolved.debug);
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_load_explicit_values() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
[build]
source_dir = "pages"
output_dir = "out"

[diagrams]
html_format = "svg"
latex_format = "pdf"
font_paths = ["fonts/body.ttf"]
font_map = "fonts.toml"
antialias = true
debug = true
"#,
        );

        let config = Config::load(tmp.path(), None, &CliSettings::default()).unwrap();
        assert_eq!(config.build_resolved.source_dir, tmp.path().join("pages"));
        assert_eq!(config.build_resolved.output_dir, tmp.path().join("out"));
        assert_eq!(config.diagrams_resolved.html_format, "svg");
        assert_eq!(config.diagrams_resolved.latex_format, "pdf");
        assert_eq!(
            config.diagrams_resolved.font_paths,
            vec![tmp.path().join("fonts/body.ttf")]
        );
        assert_eq!(
            config.diagrams_resolved.font_map,
            Some(tmp.path().join("fonts.toml"))
        );
        assert!(config.diagrams_resolved.antialias);
        assert!(config.diagrams_resolved.debug);
    }

    #[test]
    fn test_discover_in_parent_directory() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[build]\nsource_dir = \"pages\"\n");
        let nested = tmp.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::load(&nested, None, &CliSettings::default()).unwrap();
        // Paths resolve against the config file's directory, not the cwd.
        assert_eq!(config.build_resolved.source_dir, tmp.path().join("pages"));
        assert_eq!(
            config.config_path,
            Some(tmp.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_cli_overrides() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[diagrams]\ndebug = false\n");

        let cli = CliSettings {
            source_dir: Some(PathBuf::from("/elsewhere/docs")),
            output_dir: Some(PathBuf::from("/elsewhere/out")),
            debug: Some(true),
        };
        let config = Config::load(tmp.path(), None, &cli).unwrap();

        assert_eq!(
            config.build_resolved.source_dir,
            PathBuf::from("/elsewhere/docs")
        );
        assert_eq!(
            config.build_resolved.output_dir,
            PathBuf::from("/elsewhere/out")
        );
        assert!(config.diagrams_resolved.debug);
    }

    #[test]
    fn test_parse_error_reported_with_path() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "not valid toml [[[");

        let err = Config::load(tmp.path(), None, &CliSettings::default()).unwrap_err();
        match err {
            ConfigError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_format_passes_through() {
        // Format validation is the dispatcher's job; config stores the string.
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[diagrams]\nhtml_format = \"jpg\"\n");

        let config = Config::load(tmp.path(), None, &CliSettings::default()).unwrap();
        assert_eq!(config.diagrams_resolved.html_format, "jpg");
    }
}
