//! Rendering state trackers shared by all backends.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

/// A table-of-contents entry for a rendered heading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Plain-text heading title.
    pub title: String,
    /// Anchor id derived from the title, unique within the document.
    pub id: String,
}

/// Escape text for HTML output.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Derive an anchor id from a heading title.
///
/// Lowercases, maps whitespace runs to single dashes, and drops everything
/// that is not alphanumeric or a dash.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if (c.is_whitespace() || c == '-' || c == '_') && !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Tracks an open fenced or indented code block.
#[derive(Default)]
pub struct CodeBlockState {
    active: bool,
    lang: Option<String>,
    content: String,
}

impl CodeBlockState {
    pub fn start(&mut self, lang: Option<String>) {
        self.active = true;
        self.lang = lang;
        self.content.clear();
    }

    pub fn push_str(&mut self, text: &str) {
        self.content.push_str(text);
    }

    pub fn push_newline(&mut self) {
        self.content.push('\n');
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Close the block, returning its language and accumulated content.
    pub fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.lang.take(), std::mem::take(&mut self.content))
    }
}

/// Tracks alt-text collection for an open image tag.
#[derive(Default)]
pub struct ImageState {
    active: bool,
    alt: String,
}

impl ImageState {
    pub fn start(&mut self) {
        self.active = true;
        self.alt.clear();
    }

    pub fn push_str(&mut self, text: &str) {
        self.alt.push_str(text);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn end(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.alt)
    }
}

/// Tracks the current table's column alignments and cursor position.
#[derive(Default)]
pub struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    cell_index: usize,
}

impl TableState {
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    #[must_use]
    pub fn alignments(&self) -> &[Alignment] {
        &self.alignments
    }

    pub fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub fn end_head(&mut self) {
        self.in_head = false;
    }

    pub fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    #[must_use]
    pub fn is_in_head(&self) -> bool {
        self.in_head
    }

    #[must_use]
    pub fn cell_index(&self) -> usize {
        self.cell_index
    }

    /// Alignment of the cell the cursor is currently on.
    #[must_use]
    pub fn current_alignment(&self) -> Alignment {
        self.alignments
            .get(self.cell_index)
            .copied()
            .unwrap_or(Alignment::None)
    }
}

/// Tracks heading capture, title extraction and ToC accumulation.
pub struct HeadingState {
    extract_title: bool,
    active: bool,
    level: u8,
    text: String,
    html: String,
    title: Option<String>,
    toc: Vec<TocEntry>,
    used_ids: HashMap<String, usize>,
    ids: Vec<String>,
}

impl HeadingState {
    #[must_use]
    pub fn new(extract_title: bool) -> Self {
        Self {
            extract_title,
            active: false,
            level: 0,
            text: String::new(),
            html: String::new(),
            title: None,
            toc: Vec::new(),
            used_ids: HashMap::new(),
            ids: Vec::new(),
        }
    }

    pub fn start_heading(&mut self, level: u8) {
        self.active = true;
        self.level = level;
        self.text.clear();
        self.html.clear();
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Push plain text (used for the title and the anchor id).
    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Push backend-rendered inline markup.
    pub fn push_html(&mut self, content: &str) {
        self.html.push_str(content);
    }

    /// Mutable access to the inline markup buffer.
    pub fn html_buffer(&mut self) -> &mut String {
        &mut self.html
    }

    /// Close the heading, returning `(level, id, title, inline_markup)`.
    ///
    /// The first H1 becomes the document title when title extraction is
    /// enabled; it is still returned for rendering but excluded from the ToC.
    pub fn complete_heading(&mut self) -> (u8, String, String, String) {
        self.active = false;
        let title = self.text.trim().to_owned();
        let id = self.unique_id(&slugify(&title));

        let is_title = self.extract_title && self.level == 1 && self.title.is_none();
        if is_title {
            self.title = Some(title.clone());
        } else {
            self.toc.push(TocEntry {
                level: self.level,
                title: title.clone(),
                id: id.clone(),
            });
        }

        (self.level, id, title, std::mem::take(&mut self.html))
    }

    /// Deduplicate anchor ids: `faq`, `faq-1`, `faq-2`, ...
    fn unique_id(&mut self, slug: &str) -> String {
        let count = self.used_ids.entry(slug.to_owned()).or_insert(0);
        let id = if *count == 0 {
            slug.to_owned()
        } else {
            format!("{slug}-{count}")
        };
        *count += 1;
        self.ids.push(id.clone());
        id
    }

    pub fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    pub fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }

    /// Anchor ids of all headings completed so far, in document order.
    /// Includes the title heading even when it is excluded from the ToC.
    #[must_use]
    pub fn anchor_ids(&self) -> Vec<String> {
        self.ids.clone()
    }
}
