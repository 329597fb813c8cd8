//! Best-effort font resolution for diagram rendering.
//!
//! Builds the `fontdb` database used when the exported SVG is converted to a
//! renderable tree. Two independent inputs, both optional and both degrading
//! gracefully:
//!
//! - a font-map file (TOML) naming the default family and size plus
//!   family-to-font-file entries;
//! - font search paths (files or directories) registered on top of the
//!   system fonts.
//!
//! Failures never fail the build: they fall back to defaults and record a
//! one-time warning in the [`BuildSession`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::session::BuildSession;

/// Default font family forwarded to the diagram theme.
pub const DEFAULT_FAMILY: &str = "sans-serif";

/// Default font size forwarded to the diagram theme.
pub const DEFAULT_SIZE: f32 = 14.0;

/// How the font map was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontResolution {
    /// The configured font-map file loaded cleanly (or none was configured).
    Loaded,
    /// The configured font-map file could not be used; defaults are in
    /// effect. The reason is also emitted as a build warning.
    Fallback { reason: String },
}

/// Resolved font configuration for rendering.
#[derive(Debug, Clone)]
pub struct FontMap {
    /// Shared font database (system fonts plus registered files).
    pub db: Arc<fontdb::Database>,
    /// Default family name for diagram text.
    pub family: String,
    /// Default font size for diagram text.
    pub size: f32,
    /// Outcome of loading the configured font-map file.
    pub resolution: FontResolution,
}

/// On-disk shape of a font-map file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FontMapFile {
    family: Option<String>,
    size: Option<f32>,
    fonts: BTreeMap<String, String>,
}

/// Resolve the font configuration for this build.
///
/// Never fails; problems degrade to defaults with deduplicated warnings.
#[must_use]
pub fn resolve_fonts(
    font_map: Option<&Path>,
    font_paths: &[PathBuf],
    session: &mut BuildSession,
) -> FontMap {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let mut family = DEFAULT_FAMILY.to_owned();
    let mut size = DEFAULT_SIZE;
    let mut resolution = FontResolution::Loaded;

    if let Some(path) = font_map {
        match load_font_map(path, &mut db) {
            Ok(map) => {
                if let Some(configured) = map.family {
                    family = configured;
                }
                if let Some(configured) = map.size {
                    size = configured;
                }
            }
            Err(reason) => {
                session.warn_once(
                    "font-map",
                    format!(
                        "cannot load \"{}\" as a font map, check the diagrams.font_map setting",
                        path.display()
                    ),
                );
                resolution = FontResolution::Fallback { reason };
            }
        }
    }

    for path in font_paths {
        if path.is_dir() {
            db.load_fonts_dir(path);
        } else if let Err(err) = db.load_font_file(path) {
            session.warn_once(
                "font-path",
                format!(
                    "cannot load \"{}\" as a font, check the diagrams.font_paths setting",
                    path.display()
                ),
            );
            tracing::debug!("font file rejected: {err}");
        }
    }

    if family != DEFAULT_FAMILY {
        db.set_sans_serif_family(family.clone());
    }

    FontMap {
        db: Arc::new(db),
        family,
        size,
        resolution,
    }
}

/// Load a font-map file and register its fonts.
///
/// Returns the parsed map on success; an error string otherwise. Individual
/// font entries that fail to load are skipped with a debug log, the map
/// itself still counts as loaded.
fn load_font_map(path: &Path, db: &mut fontdb::Database) -> Result<FontMapFile, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let map: FontMapFile = toml::from_str(&text).map_err(|e| e.to_string())?;

    for (font_family, file) in &map.fonts {
        let font_path = path.parent().unwrap_or(Path::new(".")).join(file);
        if let Err(err) = db.load_font_file(&font_path) {
            tracing::debug!("font map entry {font_family} -> {file} rejected: {err}");
        }
    }
    Ok(map)
}
