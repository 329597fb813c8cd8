//! External compiler invocation wrapper.
//!
//! Parsing and layout of the diagram text are delegated to
//! `mermaid-rs-renderer`, which produces an SVG document. That SVG is parsed
//! into a `usvg` tree (the drawable object), which reports the natural page
//! size and feeds every exporter: SVG (the compiler's own output), PNG
//! (`resvg` rasterization), and PDF (`svg2pdf`, behind the `pdf` feature).
//!
//! No caching happens here; callers perform the skip-if-exists probe first.

use std::sync::Arc;

use crate::error::DiagramError;
use crate::fonts::FontMap;
use crate::format::ImageFormat;

/// A compiled diagram, ready to export to any supported format.
#[derive(Debug)]
pub struct CompiledDiagram {
    svg: String,
    tree: usvg::Tree,
}

/// Compile diagram text into a drawable object.
///
/// # Errors
///
/// Compiler rejections (parse or layout) surface as [`DiagramError::Parse`]
/// carrying the compiler's message; failures constructing the renderable
/// tree surface as [`DiagramError::Render`]. When `debug` is set the full
/// compiler diagnostic is additionally logged.
pub fn compile(
    source: &str,
    fonts: &FontMap,
    antialias: bool,
    debug: bool,
) -> Result<CompiledDiagram, DiagramError> {
    let mut theme = mermaid_rs_renderer::Theme::modern();
    theme.font_family = fonts.family.clone();
    theme.font_size = fonts.size;

    let options = mermaid_rs_renderer::RenderOptions {
        theme,
        layout: mermaid_rs_renderer::LayoutConfig::default(),
    };

    let svg = mermaid_rs_renderer::render_with_options(source, options).map_err(|err| {
        if debug {
            tracing::debug!("diagram compile failed: {err:?}");
        }
        DiagramError::Parse(err.to_string())
    })?;

    let tree = parse_tree(&svg, fonts, antialias)?;
    Ok(CompiledDiagram { svg, tree })
}

/// Parse an SVG string into a renderable tree with the build's fonts.
fn parse_tree(svg: &str, fonts: &FontMap, antialias: bool) -> Result<usvg::Tree, DiagramError> {
    let options = usvg::Options {
        fontdb: Arc::clone(&fonts.db),
        shape_rendering: if antialias {
            usvg::ShapeRendering::GeometricPrecision
        } else {
            usvg::ShapeRendering::CrispEdges
        },
        text_rendering: if antialias {
            usvg::TextRendering::OptimizeLegibility
        } else {
            usvg::TextRendering::OptimizeSpeed
        },
        ..usvg::Options::default()
    };
    usvg::Tree::from_str(svg, &options).map_err(|err| DiagramError::Render(err.to_string()))
}

impl CompiledDiagram {
    /// Natural page size in pixels, as computed by the layout.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        let size = self.tree.size();
        (f64::from(size.width()), f64::from(size.height()))
    }

    /// The compiler's SVG output.
    #[must_use]
    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// Export to the given format at the given uniform scale.
    ///
    /// Scale only affects raster output; vector formats embed the natural
    /// size and are scaled at display time.
    ///
    /// # Errors
    ///
    /// Rasterization failures surface as [`DiagramError::Render`], encoding
    /// failures as [`DiagramError::Encoding`].
    pub fn export(&self, format: ImageFormat, scale: f64) -> Result<Vec<u8>, DiagramError> {
        match format {
            ImageFormat::Svg => Ok(self.svg.clone().into_bytes()),
            ImageFormat::Png => self.render_png(scale),
            #[cfg(feature = "pdf")]
            ImageFormat::Pdf => self.render_pdf(),
            #[cfg(not(feature = "pdf"))]
            ImageFormat::Pdf => Err(DiagramError::MissingDependency),
        }
    }

    /// Rasterize to PNG bytes at a uniform scale.
    fn render_png(&self, scale: f64) -> Result<Vec<u8>, DiagramError> {
        let (width, height) = self.size();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (px_width, px_height) = (
            (width * scale).ceil().max(1.0) as u32,
            (height * scale).ceil().max(1.0) as u32,
        );

        let mut pixmap = tiny_skia::Pixmap::new(px_width, px_height)
            .ok_or_else(|| DiagramError::Render(format!("bad pixmap size {px_width}x{px_height}")))?;
        pixmap.fill(tiny_skia::Color::WHITE);

        #[allow(clippy::cast_possible_truncation)]
        let transform = tiny_skia::Transform::from_scale(scale as f32, scale as f32);
        resvg::render(&self.tree, transform, &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|err| DiagramError::Encoding(err.to_string()))
    }

    /// Convert to PDF bytes via the optional backend.
    #[cfg(feature = "pdf")]
    fn render_pdf(&self) -> Result<Vec<u8>, DiagramError> {
        // svg2pdf carries its own usvg; reparse from the SVG text instead of
        // sharing our tree so the two crates never need version-matched ASTs.
        let options = svg2pdf::usvg::Options::default();
        let tree = svg2pdf::usvg::Tree::from_str(&self.svg, &options)
            .map_err(|err| DiagramError::Render(err.to_string()))?;
        svg2pdf::to_pdf(
            &tree,
            svg2pdf::ConversionOptions::default(),
            svg2pdf::PageOptions::default(),
        )
        .map_err(|err| DiagramError::Render(err.to_string()))
    }
}

/// Recover natural dimensions from an already-rendered artifact.
///
/// Used on cache hits so the external compiler is not invoked again. PDF
/// artifacts are not probed; web output then omits explicit dimensions.
#[must_use]
pub fn probe_natural_size(format: ImageFormat, bytes: &[u8]) -> Option<(f64, f64)> {
    match format {
        ImageFormat::Png => tiny_skia::Pixmap::decode_png(bytes)
            .ok()
            .map(|pixmap| (f64::from(pixmap.width()), f64::from(pixmap.height()))),
        ImageFormat::Svg => {
            let text = std::str::from_utf8(bytes).ok()?;
            let options = usvg::Options::default();
            let tree = usvg::Tree::from_str(text, &options).ok()?;
            let size = tree.size();
            Some((f64::from(size.width()), f64::from(size.height())))
        }
        ImageFormat::Pdf => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::resolve_fonts;
    use crate::session::BuildSession;

    const FLOWCHART: &str = "graph TD\n    A[Start] --> B[End]\n";

    fn fonts() -> FontMap {
        let mut session = BuildSession::new();
        resolve_fonts(None, &[], &mut session)
    }

    #[test]
    fn test_compile_reports_natural_size() {
        let compiled = compile(FLOWCHART, &fonts(), false, false).unwrap();
        let (width, height) = compiled.size();
        assert!(width > 0.0);
        assert!(height > 0.0);
        assert!(compiled.svg().starts_with("<svg"));
    }

    #[test]
    fn test_compile_rejects_malformed_source() {
        let err = compile("this is not a diagram at all", &fonts(), false, false).unwrap_err();
        match err {
            DiagramError::Parse(message) => assert!(!message.is_empty()),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_export_svg_round_trips_bytes() {
        let compiled = compile(FLOWCHART, &fonts(), false, false).unwrap();
        let bytes = compiled.export(ImageFormat::Svg, 1.0).unwrap();
        assert_eq!(bytes, compiled.svg().as_bytes());
    }

    #[test]
    fn test_export_png_produces_png_magic() {
        let compiled = compile(FLOWCHART, &fonts(), false, false).unwrap();
        let bytes = compiled.export(ImageFormat::Png, 1.0).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n".as_slice());
    }

    #[test]
    fn test_png_thumbnail_scale_halves_dimensions() {
        let compiled = compile(FLOWCHART, &fonts(), false, false).unwrap();
        let full = compiled.export(ImageFormat::Png, 1.0).unwrap();
        let half = compiled.export(ImageFormat::Png, 0.5).unwrap();

        let (full_w, _) = probe_natural_size(ImageFormat::Png, &full).unwrap();
        let (half_w, _) = probe_natural_size(ImageFormat::Png, &half).unwrap();
        assert!((half_w - (full_w / 2.0).ceil()).abs() <= 1.0);
    }

    #[test]
    fn test_probe_recovers_svg_size() {
        let compiled = compile(FLOWCHART, &fonts(), false, false).unwrap();
        let natural = compiled.size();
        let probed = probe_natural_size(ImageFormat::Svg, compiled.svg().as_bytes()).unwrap();
        assert!((natural.0 - probed.0).abs() < f64::EPSILON);
        assert!((natural.1 - probed.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_probe_rejects_garbage() {
        assert!(probe_natural_size(ImageFormat::Png, b"not a png").is_none());
        assert!(probe_natural_size(ImageFormat::Pdf, b"%PDF-1.7").is_none());
    }
}
