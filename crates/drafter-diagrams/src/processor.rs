//! Code block processor for diagram rendering.
//!
//! [`DiagramProcessor`] implements
//! [`CodeBlockProcessor`](drafter_renderer::CodeBlockProcessor): `mermaid`
//! fences are extracted behind placeholders during rendering, then each
//! occurrence runs the render dispatch in `post_process` once the document's
//! anchors are known.
//!
//! Per occurrence: `Unrendered -> (cache hit | cache miss -> compile ->
//! export) -> spliced into output | dropped with a warning`. The terminal
//! states are exclusive; no retries. Every [`DiagramError`] is caught here
//! and converted to a build warning; a failing diagram never aborts the
//! document build.

use std::collections::HashMap;
use std::path::PathBuf;

use drafter_cache::ArtifactCache;
use drafter_renderer::{
    CodeBlockProcessor, DocumentContext, ExtractedCodeBlock, ProcessResult,
};

use crate::compiler::{self, CompiledDiagram};
use crate::error::DiagramError;
use crate::fonts::{FontMap, resolve_fonts};
use crate::format::ImageFormat;
use crate::html_out::{ImageFigure, display_size, image_figure, svg_figure};
use crate::key::{DiagramKey, artifact_name};
use crate::latex_out::latex_figure;
use crate::links::{self, HyperlinkRegion};
use crate::options::DiagramOptions;
use crate::session::BuildSession;

/// Fence language claimed by this processor.
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

/// Artifact file name prefix.
const PREFIX: &str = "mermaid";

/// Which output family this build targets, selected once per build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderKind {
    /// Web output: inline images or SVG, thumbnails, image maps.
    Web,
    /// Typeset output: `\includegraphics` with alignment/caption wrapping.
    Typeset,
    /// Any other output: always PNG, plain embedded image reference.
    Other,
}

/// Configuration for diagram processing (immutable after setup).
///
/// Separated from the mutable session so occurrences can borrow the config
/// while recording warnings.
struct ProcessorConfig {
    kind: BuilderKind,
    /// Configured format name; validated per occurrence against the closed
    /// format set (`Other` builds force PNG instead).
    format_name: String,
    store: ArtifactCache,
    /// Prefix turning an artifact file name into a document-relative
    /// reference (`_images/`, `../_images/`, or empty for typeset output).
    ref_prefix: String,
    font_map: Option<PathBuf>,
    font_paths: Vec<PathBuf>,
    antialias: bool,
    debug: bool,
}

/// Code block processor that renders `mermaid` fences to image artifacts.
pub struct DiagramProcessor {
    config: ProcessorConfig,
    session: BuildSession,
    extracted: Vec<ExtractedCodeBlock>,
}

impl DiagramProcessor {
    /// Create a processor for one build.
    ///
    /// `format_name` is the configured output format for this build's
    /// target; it is validated lazily, per occurrence, so that a bad value
    /// warns instead of failing construction.
    #[must_use]
    pub fn new(kind: BuilderKind, format_name: impl Into<String>, store: ArtifactCache) -> Self {
        Self {
            config: ProcessorConfig {
                kind,
                format_name: format_name.into(),
                store,
                ref_prefix: String::new(),
                font_map: None,
                font_paths: Vec::new(),
                antialias: false,
                debug: false,
            },
            session: BuildSession::new(),
            extracted: Vec::new(),
        }
    }

    /// Set the prefix turning artifact names into document-relative refs.
    #[must_use]
    pub fn ref_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.ref_prefix = prefix.into();
        self
    }

    /// Set the font-map file and font search paths.
    #[must_use]
    pub fn fonts(mut self, font_map: Option<PathBuf>, font_paths: Vec<PathBuf>) -> Self {
        self.config.font_map = font_map;
        self.config.font_paths = font_paths;
        self
    }

    /// Enable antialiased rasterization.
    #[must_use]
    pub fn antialias(mut self, enabled: bool) -> Self {
        self.config.antialias = enabled;
        self
    }

    /// Log full compiler diagnostics on render failure.
    #[must_use]
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Render one occurrence to its markup fragment.
    fn render_occurrence(
        config: &ProcessorConfig,
        fonts: &FontMap,
        session: &mut BuildSession,
        block: &ExtractedCodeBlock,
    ) -> Result<String, DiagramError> {
        let (options, option_warnings) = DiagramOptions::from_attrs(&block.attrs);
        for warning in option_warnings {
            session.warn(format!("diagram {}: {warning}", block.index));
        }

        let format = match config.kind {
            BuilderKind::Other => ImageFormat::Png,
            BuilderKind::Web | BuilderKind::Typeset => ImageFormat::parse(&config.format_name)?,
        };

        let hash = DiagramKey {
            source: &block.source,
            options: options.canonical(),
        }
        .compute_hash();
        let name = artifact_name(PREFIX, &hash, format);

        match config.kind {
            BuilderKind::Web => {
                Self::web_markup(config, fonts, session, block, &options, format, &hash, &name)
            }
            BuilderKind::Typeset => {
                Self::export_if_missing(config, fonts, &block.source, format, &name)?;
                Ok(latex_figure(
                    &format!("{}{name}", config.ref_prefix),
                    &options,
                ))
            }
            BuilderKind::Other => {
                Self::export_if_missing(config, fonts, &block.source, format, &name)?;
                Ok(format!(
                    r#"<img src="{}{name}" alt="diagram">"#,
                    config.ref_prefix
                ))
            }
        }
    }

    /// Compile and publish the artifact unless it is already cached.
    fn export_if_missing(
        config: &ProcessorConfig,
        fonts: &FontMap,
        source: &str,
        format: ImageFormat,
        name: &str,
    ) -> Result<(), DiagramError> {
        if config.store.contains(name) {
            tracing::debug!("diagram cache hit: {name}");
            return Ok(());
        }
        let (clean_source, _) = links::extract_click_targets(source);
        let compiled = compiler::compile(&clean_source, fonts, config.antialias, config.debug)?;
        config.store.store(name, &compiled.export(format, 1.0)?)?;
        Ok(())
    }

    /// Web-mode dispatch: inline image or SVG with thumbnails and overlays.
    #[allow(clippy::too_many_arguments)]
    fn web_markup(
        config: &ProcessorConfig,
        fonts: &FontMap,
        session: &mut BuildSession,
        block: &ExtractedCodeBlock,
        options: &DiagramOptions,
        format: ImageFormat,
        hash: &str,
        name: &str,
    ) -> Result<String, DiagramError> {
        let (clean_source, targets) = links::extract_click_targets(&block.source);
        let targets = links::resolve_targets(targets, session);

        // A cache hit skips the compiler entirely; besides a miss, the only
        // compile triggers are region geometry and a missing thumbnail.
        let mut compiled: Option<CompiledDiagram> = None;
        if !config.store.contains(name) || !targets.is_empty() {
            compiled = Some(compiler::compile(
                &clean_source,
                fonts,
                config.antialias,
                config.debug,
            )?);
        }
        if !config.store.contains(name)
            && let Some(diagram) = &compiled
        {
            config.store.store(name, &diagram.export(format, 1.0)?)?;
        }

        let natural = match &compiled {
            Some(diagram) => Some(diagram.size()),
            None => compiler::probe_natural_size(format, &config.store.read(name)?),
        };
        let mut display = natural.map(|n| display_size(n, options));

        if format == ImageFormat::Svg {
            let svg_text = match &compiled {
                Some(diagram) => diagram.svg().to_owned(),
                None => config.store.read_string(name)?,
            };
            let svg_text = if targets.is_empty() {
                svg_text
            } else {
                links::wrap_svg_links(&svg_text, &targets)
            };
            let natural = natural
                .ok_or_else(|| DiagramError::Render("could not size svg artifact".to_owned()))?;
            let display = display_size(natural, options);
            return Ok(svg_figure(&svg_text, display, natural, options));
        }

        // Thumbnail: raster only, when the natural width exceeds maxwidth.
        let mut thumb_ref = None;
        if format == ImageFormat::Png
            && let (Some(maxwidth), Some((natural_w, natural_h))) = (options.maxwidth, natural)
            && maxwidth < natural_w
        {
            let ratio = maxwidth / natural_w;
            let thumb_name = artifact_name(&format!("{PREFIX}_thumb"), hash, format);
            if !config.store.contains(&thumb_name) {
                if compiled.is_none() {
                    compiled = Some(compiler::compile(
                        &clean_source,
                        fonts,
                        config.antialias,
                        config.debug,
                    )?);
                }
                if let Some(diagram) = &compiled {
                    config
                        .store
                        .store(&thumb_name, &diagram.export(format, ratio)?)?;
                }
            }
            thumb_ref = Some(format!("{}{thumb_name}", config.ref_prefix));
            display = Some((maxwidth, natural_h * ratio));
        }

        let regions: Vec<HyperlinkRegion> = match &compiled {
            Some(diagram) if !targets.is_empty() => {
                let (factor_x, factor_y) = display
                    .zip(natural)
                    .map_or((1.0, 1.0), |((dw, dh), (nw, nh))| (dw / nw, dh / nh));
                links::locate_regions(diagram.svg(), &targets)
                    .iter()
                    .map(|region| region.scaled(factor_x, factor_y))
                    .collect()
            }
            _ => Vec::new(),
        };
        let map_name = (!regions.is_empty()).then(|| session.next_map_name());

        let full = format!("{}{name}", config.ref_prefix);
        Ok(image_figure(&ImageFigure {
            src: thumb_ref.as_deref().unwrap_or(&full),
            full: &full,
            alt: block.source.trim(),
            display,
            link_full: thumb_ref.is_some() || options.has_size_override(),
            map_name: map_name.as_deref(),
            regions: &regions,
            options,
        }))
    }

    /// Convert an occurrence failure into the build warning stream.
    fn warn_failure(session: &mut BuildSession, block: &ExtractedCodeBlock, err: &DiagramError) {
        match err {
            // Build-configuration problems repeat identically for every
            // occurrence; phrase them as hard errors but emit once.
            DiagramError::Configuration(_) | DiagramError::MissingDependency => {
                session.warn_once("output-format", format!("diagram error: {err}"));
            }
            // Parse reports echo the diagram source.
            DiagramError::Parse(_) => session.warn(format!(
                "diagram {}: {err}\n{}",
                block.index,
                block.source.trim_end()
            )),
            _ => session.warn(format!("diagram {}: {err}", block.index)),
        }
    }
}

impl CodeBlockProcessor for DiagramProcessor {
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult {
        if language != DIAGRAM_LANGUAGE {
            return ProcessResult::PassThrough;
        }

        self.extracted.push(ExtractedCodeBlock {
            index,
            language: language.to_owned(),
            source: source.to_owned(),
            attrs: attrs.clone(),
        });
        ProcessResult::Placeholder(format!("{{{{DIAGRAM_{index}}}}}"))
    }

    fn post_process(&mut self, output: &mut String, ctx: &DocumentContext) {
        if self.extracted.is_empty() {
            return;
        }

        // Anchor universe: document headings plus diagram `name` options.
        for anchor in &ctx.anchors {
            self.session.add_anchor(anchor.clone());
        }
        for block in &self.extracted {
            if let Some(name) = block.attrs.get("name") {
                self.session.add_anchor(name.clone());
            }
        }

        let fonts = resolve_fonts(
            self.config.font_map.as_deref(),
            &self.config.font_paths,
            &mut self.session,
        );

        let mut replacements = Replacements::with_capacity(self.extracted.len());
        for block in &self.extracted {
            match Self::render_occurrence(&self.config, &fonts, &mut self.session, block) {
                Ok(markup) => replacements.add(block.index, markup),
                Err(err) => {
                    Self::warn_failure(&mut self.session, block, &err);
                    // Skip-node semantics: the occurrence disappears, the
                    // rest of the document stays intact.
                    replacements.add(block.index, String::new());
                }
            }
        }
        replacements.apply(output);
    }

    fn extracted(&self) -> &[ExtractedCodeBlock] {
        &self.extracted
    }

    fn warnings(&self) -> &[String] {
        self.session.warnings()
    }
}

/// Collects diagram replacements for single-pass application.
///
/// Instead of one `String::replace` per diagram, all placeholders are
/// substituted in one scan of the output.
struct Replacements {
    map: HashMap<usize, String>,
}

impl Replacements {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    fn add(&mut self, index: usize, content: String) {
        self.map.insert(index, content);
    }

    /// Replace every `{{DIAGRAM_N}}` placeholder in one pass.
    fn apply(self, output: &mut String) {
        if self.map.is_empty() {
            return;
        }

        const MARKER: &str = "{{DIAGRAM_";
        let mut result = String::with_capacity(output.len());
        let mut remaining = output.as_str();

        while let Some(start) = remaining.find(MARKER) {
            result.push_str(&remaining[..start]);
            let after_marker = &remaining[start + MARKER.len()..];

            if let Some(end) = after_marker.find("}}") {
                let replaced = after_marker[..end]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.map.get(&index));
                match replaced {
                    Some(content) => result.push_str(content),
                    // Unknown placeholder: keep it verbatim.
                    None => result.push_str(&remaining[start..start + MARKER.len() + end + 2]),
                }
                remaining = &after_marker[end + 2..];
            } else {
                result.push_str(&remaining[start..]);
                remaining = "";
            }
        }
        result.push_str(remaining);

        *output = result;
    }
}
