//! The `build` command: render a docs tree to HTML or LaTeX.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use walkdir::WalkDir;

use drafter_cache::ArtifactCache;
use drafter_config::{CliSettings, Config};
use drafter_diagrams::{BuilderKind, DiagramProcessor};
use drafter_renderer::{
    HtmlBackend, LatexBackend, MarkdownRenderer, RenderResult, prefix_to_root,
};

use crate::error::CliError;
use crate::output::Output;

/// Output target for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Target {
    /// HTML pages with an `_images/` artifact directory.
    Html,
    /// LaTeX body fragments with artifacts alongside them.
    Latex,
}

/// Arguments for the `build` command.
#[derive(Debug, Args)]
pub(crate) struct BuildArgs {
    /// Path to drafter.toml (discovered upward from the cwd by default).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Source directory override.
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Output directory override.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output target.
    #[arg(long, value_enum, default_value = "html")]
    pub format: Target,

    /// Log full compiler diagnostics on diagram failures.
    #[arg(long)]
    pub debug: bool,

    /// Verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Run the build.
    pub(crate) fn execute(&self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source.clone(),
            output_dir: self.output.clone(),
            debug: self.debug.then_some(true),
        };
        let cwd = std::env::current_dir()?;
        let config = Config::load(&cwd, self.config.as_deref(), &cli_settings)?;

        let stats = build(&config, self.format, output)?;
        output.success(&format!(
            "Built {} page(s) with {} warning(s)",
            stats.pages, stats.warnings
        ));
        Ok(())
    }
}

/// Build statistics.
#[derive(Debug, Default)]
pub(crate) struct BuildStats {
    pub pages: usize,
    pub warnings: usize,
}

/// Render every markdown document under the source directory.
pub(crate) fn build(
    config: &Config,
    target: Target,
    output: &Output,
) -> Result<BuildStats, CliError> {
    let source_dir = &config.build_resolved.source_dir;
    let output_dir = &config.build_resolved.output_dir;
    if !source_dir.is_dir() {
        return Err(CliError::Validation(format!(
            "source directory {} does not exist",
            source_dir.display()
        )));
    }

    let mut stats = BuildStats::default();
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|err| CliError::Validation(err.to_string()))?;
        if !entry.file_type().is_file()
            || entry.path().extension().is_none_or(|ext| ext != "md")
        {
            continue;
        }

        let Ok(rel) = entry.path().strip_prefix(source_dir) else {
            continue;
        };
        let rel = rel.to_path_buf();
        tracing::info!("rendering {}", rel.display());

        let markdown = std::fs::read_to_string(entry.path())?;
        let result = render_document(config, target, &rel, &markdown);

        for warning in &result.warnings {
            output.warning(&format!("{}: {warning}", rel.display()));
            stats.warnings += 1;
        }

        let out_path = match target {
            Target::Html => output_dir.join(&rel).with_extension("html"),
            Target::Latex => output_dir.join(&rel).with_extension("tex"),
        };
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let page = match target {
            Target::Html => html_page(result.title.as_deref(), &result.content),
            Target::Latex => result.content,
        };
        std::fs::write(&out_path, page)?;
        output.info(&format!("  {} -> {}", rel.display(), out_path.display()));
        stats.pages += 1;
    }

    Ok(stats)
}

/// Render one document with the diagram processor wired for the target.
fn render_document(
    config: &Config,
    target: Target,
    rel: &Path,
    markdown: &str,
) -> RenderResult {
    let diagrams = &config.diagrams_resolved;
    let output_dir = &config.build_resolved.output_dir;

    match target {
        Target::Html => {
            let processor = DiagramProcessor::new(
                BuilderKind::Web,
                &diagrams.html_format,
                ArtifactCache::new(output_dir.join("_images")),
            )
            .ref_prefix(format!("{}_images/", prefix_to_root(rel)))
            .fonts(diagrams.font_map.clone(), diagrams.font_paths.clone())
            .antialias(diagrams.antialias)
            .debug(diagrams.debug);

            MarkdownRenderer::<HtmlBackend>::new()
                .with_title_extraction()
                .with_processor(processor)
                .render_markdown(markdown)
        }
        Target::Latex => {
            let processor = DiagramProcessor::new(
                BuilderKind::Typeset,
                &diagrams.latex_format,
                ArtifactCache::new(output_dir.clone()),
            )
            .fonts(diagrams.font_map.clone(), diagrams.font_paths.clone())
            .antialias(diagrams.antialias)
            .debug(diagrams.debug);

            MarkdownRenderer::<LatexBackend>::new()
                .with_processor(processor)
                .render_markdown(markdown)
        }
    }
}

/// Wrap rendered body content in a minimal HTML page.
fn html_page(title: Option<&str>, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        drafter_renderer::escape_html(title.unwrap_or("Documentation"))
    )
}
