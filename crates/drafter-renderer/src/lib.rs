//! Markdown rendering with pluggable output backends.
//!
//! This crate provides a generic [`MarkdownRenderer`] that walks a
//! pulldown-cmark event stream and emits output through a [`RenderBackend`]:
//!
//! - [`HtmlBackend`]: semantic HTML5 for web builds
//! - [`LatexBackend`]: LaTeX body fragments for typeset builds
//!
//! Fenced code blocks are the extension surface: a [`CodeBlockProcessor`]
//! can claim blocks by language (the fence info string also carries a
//! `key=value` options map), extract them behind placeholders, and splice
//! final markup in `post_process` once the whole document, including its
//! anchor ids, is known.
//!
//! # Example
//!
//! ```
//! use drafter_renderer::{HtmlBackend, MarkdownRenderer};
//!
//! let mut renderer = MarkdownRenderer::<HtmlBackend>::new().with_title_extraction();
//! let result = renderer.render_markdown("# Hello\n\n**Bold** text");
//! assert!(result.content.contains("<strong>Bold</strong>"));
//! assert_eq!(result.title.as_deref(), Some("Hello"));
//! ```

mod backend;
mod code_block;
mod html;
mod latex;
mod renderer;
mod state;
mod util;

pub use backend::RenderBackend;
pub use code_block::{
    CodeBlockProcessor, DocumentContext, ExtractedCodeBlock, ProcessResult, parse_fence_info,
};
pub use html::HtmlBackend;
pub use latex::{LatexBackend, escape_latex};
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::{TocEntry, escape_html};
pub use util::prefix_to_root;
