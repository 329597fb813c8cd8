//! Generic markdown renderer with pluggable backend.

use std::collections::HashMap;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::backend::RenderBackend;
use crate::code_block::{
    CodeBlockProcessor, DocumentContext, ExtractedCodeBlock, ProcessResult, parse_fence_info,
};
use crate::state::{CodeBlockState, HeadingState, ImageState, TableState, TocEntry};
use crate::util::heading_level_to_num;

/// Result of rendering markdown.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered output in the backend's format.
    pub content: String,
    /// Title extracted from the first H1 heading (if enabled).
    pub title: Option<String>,
    /// Table of contents entries.
    pub toc: Vec<TocEntry>,
    /// Warnings accumulated by code block processors.
    pub warnings: Vec<String>,
}

/// Generic markdown renderer with pluggable backend.
///
/// Uses the [`RenderBackend`] trait for all output emission while handling
/// event ordering, nesting and state tracking generically.
///
/// # Code Block Processors
///
/// Custom code block processing can be added via [`with_processor`](Self::with_processor).
/// Processors are checked in order; the first returning a non-`PassThrough`
/// result wins. After traversal, each processor's `post_process` runs with a
/// [`DocumentContext`] carrying the document's anchor ids.
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    list_stack: Vec<bool>,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    code_block_index: usize,
    pending_attrs: HashMap<String, String>,
    gfm: bool,
    _backend: std::marker::PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    /// Create a new renderer with GFM enabled by default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            list_stack: Vec::new(),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::new(false),
            pending_image: None,
            processors: Vec::new(),
            code_block_index: 0,
            pending_attrs: HashMap::new(),
            gfm: true,
            _backend: std::marker::PhantomData,
        }
    }

    /// Enable title extraction from the first H1 heading.
    ///
    /// The heading is still rendered; its text is additionally reported as
    /// [`RenderResult::title`] and excluded from the ToC.
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.heading = HeadingState::new(true);
        self
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default (tables, strikethrough, task lists).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Add a code block processor.
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
        } else {
            Options::empty()
        }
    }

    /// Create a configured parser for the given markdown text.
    #[must_use]
    pub fn create_parser<'a>(&self, markdown: &'a str) -> Parser<'a> {
        Parser::new_ext(markdown, self.parser_options())
    }

    /// Render markdown text directly using configured parser options.
    pub fn render_markdown(&mut self, markdown: &str) -> RenderResult {
        self.render(self.create_parser(markdown))
    }

    /// Get all extracted code blocks from all processors.
    pub fn extracted_code_blocks(&self) -> impl Iterator<Item = ExtractedCodeBlock> + '_ {
        self.processors.iter().flat_map(|p| p.extracted()).cloned()
    }

    /// Get all warnings from all processors.
    pub fn processor_warnings(&self) -> impl Iterator<Item = String> + '_ {
        self.processors.iter().flat_map(|p| p.warnings()).cloned()
    }

    /// Push inline content to the output or the open heading buffer.
    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    /// Render markdown events and return the result.
    ///
    /// Automatically calls `post_process` on all registered processors with
    /// the document's anchor context, replacing their placeholders.
    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }

        let ctx = DocumentContext {
            anchors: self.heading.anchor_ids(),
        };
        let mut content = std::mem::take(&mut self.output);
        for processor in &mut self.processors {
            processor.post_process(&mut content, &ctx);
        }

        RenderResult {
            content,
            title: self.heading.take_title(),
            toc: self.heading.take_toc(),
            warnings: self.processor_warnings().collect(),
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(&tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => B::raw_html(&html, &mut self.output),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => B::hard_break(&mut self.output),
            Event::Rule => B::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => B::task_list_marker(checked, &mut self.output),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: &Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.code.is_active() {
                    B::paragraph_start(&mut self.output);
                }
            }
            Tag::Heading { level, .. } => {
                // Inline content is buffered; the opening tag is written in
                // end_tag once the anchor id is known.
                self.heading.start_heading(heading_level_to_num(*level));
            }
            Tag::BlockQuote(_) => B::blockquote_start(&mut self.output),
            Tag::CodeBlock(kind) => {
                let (lang, attrs) = match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => {
                        let (lang, attrs) = parse_fence_info(info);
                        (if lang.is_empty() { None } else { Some(lang) }, attrs)
                    }
                    _ => (None, HashMap::new()),
                };
                self.pending_attrs = attrs;
                self.code.start(lang);
            }
            Tag::List(start) => {
                self.list_stack.push(start.is_some());
                B::list_start(*start, &mut self.output);
            }
            Tag::Item => B::item_start(&mut self.output),
            Tag::Table(alignments) => {
                self.table.start(alignments.clone());
                B::table_start(self.table.alignments(), &mut self.output);
            }
            Tag::TableHead => {
                self.table.start_head();
                B::table_head_start(&mut self.output);
            }
            Tag::TableRow => {
                self.table.start_row();
                B::table_row_start(&mut self.output);
            }
            Tag::TableCell => {
                B::table_cell_start(
                    self.table.cell_index(),
                    self.table.is_in_head(),
                    self.table.current_alignment(),
                    &mut self.output,
                );
            }
            Tag::Emphasis => self.inline_mark(B::emphasis_start),
            Tag::Strong => self.inline_mark(B::strong_start),
            Tag::Strikethrough => self.inline_mark(B::strikethrough_start),
            Tag::Link { dest_url, .. } => {
                let mut buf = String::new();
                B::link_start(dest_url, &mut buf);
                self.push_inline(&buf);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Start collecting alt text; the tag is emitted in end_tag.
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if !self.code.is_active() {
                    B::paragraph_end(&mut self.output);
                }
            }
            TagEnd::Heading(_) => {
                let (level, id, _title, html) = self.heading.complete_heading();
                B::heading(level, &id, &html, &mut self.output);
            }
            TagEnd::BlockQuote(_) => B::blockquote_end(&mut self.output),
            TagEnd::CodeBlock => {
                let (lang, content) = self.code.end();
                let attrs = std::mem::take(&mut self.pending_attrs);
                let index = self.code_block_index;
                self.code_block_index += 1;

                // Try processors in order; fall back to a plain code block.
                let processed = lang.as_ref().is_some_and(|lang_str| {
                    self.processors.iter_mut().any(|processor| {
                        match processor.process(lang_str, &attrs, &content, index) {
                            ProcessResult::Placeholder(placeholder) => {
                                self.output.push_str(&placeholder);
                                true
                            }
                            ProcessResult::Inline(markup) => {
                                self.output.push_str(&markup);
                                true
                            }
                            ProcessResult::PassThrough => false,
                        }
                    })
                });

                if !processed {
                    B::code_block(lang.as_deref(), &content, &mut self.output);
                }
            }
            TagEnd::List(ordered) => {
                self.list_stack.pop();
                B::list_end(ordered, &mut self.output);
            }
            TagEnd::Item => B::item_end(&mut self.output),
            TagEnd::Table => B::table_end(&mut self.output),
            TagEnd::TableHead => {
                B::table_head_end(&mut self.output);
                self.table.end_head();
            }
            TagEnd::TableRow => B::table_row_end(&mut self.output),
            TagEnd::TableCell => {
                B::table_cell_end(self.table.is_in_head(), &mut self.output);
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.inline_mark(B::emphasis_end),
            TagEnd::Strong => self.inline_mark(B::strong_end),
            TagEnd::Strikethrough => self.inline_mark(B::strikethrough_end),
            TagEnd::Link => self.inline_mark(B::link_end),
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    B::image(&src, &alt, &title, &mut self.output);
                }
            }
            _ => {}
        }
    }

    /// Apply a paired inline mark through the heading-aware buffer.
    fn inline_mark(&mut self, emit: fn(&mut String)) {
        let mut buf = String::new();
        emit(&mut buf);
        self.push_inline(&buf);
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            let escaped = B::escape(text);
            self.heading.push_html(&escaped);
        } else {
            self.output.push_str(&B::escape(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.heading.is_active() {
            self.heading.push_text(code);
            let mut buf = String::new();
            B::inline_code(code, &mut buf);
            self.heading.push_html(&buf);
        } else {
            B::inline_code(code, &mut self.output);
        }
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_newline();
        } else {
            B::soft_break(&mut self.output);
        }
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}
