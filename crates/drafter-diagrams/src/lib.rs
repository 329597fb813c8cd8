//! Build-time Mermaid diagram rendering for drafter.
//!
//! This crate is the diagram render dispatcher: invoked once per embedded
//! diagram occurrence during a document build, it derives a content-hash
//! cache key, delegates parse and layout to the external compiler
//! (`mermaid-rs-renderer`), exports the drawable to the configured image
//! format (`resvg`/`tiny-skia` for PNG, the compiler's SVG directly,
//! `svg2pdf` behind the `pdf` feature), and synthesizes the output-specific
//! markup that replaces the occurrence.
//!
//! # Architecture
//!
//! - [`processor`]: [`DiagramProcessor`] implementing the renderer's
//!   `CodeBlockProcessor` trait, with the per-occurrence state machine
//! - [`compiler`]: external compiler invocation and format exporters
//! - [`key`]: content-hash cache keys and artifact naming
//! - [`fonts`]: best-effort font resolution with graceful fallback
//! - [`links`]: `click` hyperlink targets, anchor resolution, region
//!   geometry
//! - [`html_out`] / [`latex_out`]: per-format markup synthesis
//! - [`session`]: per-build warning deduplication and anchor set
//!
//! # Example
//!
//! ```no_run
//! use drafter_cache::ArtifactCache;
//! use drafter_diagrams::{BuilderKind, DiagramProcessor};
//! use drafter_renderer::{HtmlBackend, MarkdownRenderer};
//!
//! let processor = DiagramProcessor::new(
//!     BuilderKind::Web,
//!     "png",
//!     ArtifactCache::new("_build/_images"),
//! )
//! .ref_prefix("_images/");
//!
//! let mut renderer = MarkdownRenderer::<HtmlBackend>::new().with_processor(processor);
//! let result = renderer.render_markdown("```mermaid\ngraph TD\n    A --> B\n```");
//! ```

pub mod compiler;
pub mod fonts;
pub mod html_out;
pub mod key;
pub mod latex_out;
pub mod links;
pub mod session;

mod error;
mod format;
mod options;
mod processor;

pub use error::DiagramError;
pub use format::ImageFormat;
pub use options::{Align, DiagramOptions};
pub use processor::{BuilderKind, DIAGRAM_LANGUAGE, DiagramProcessor};
