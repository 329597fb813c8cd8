//! Pluggable code block processing.
//!
//! Code fences are the directive surface of the build: a fence info string
//! like ` ```mermaid width=224 align=center ` names a language and carries
//! an options map. A [`CodeBlockProcessor`] can claim such a block during
//! rendering and either replace it inline or extract it behind a placeholder
//! for deferred processing in [`CodeBlockProcessor::post_process`].

use std::collections::HashMap;

/// Result of offering a code block to a processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Processor does not handle this block; try the next one.
    PassThrough,
    /// Replace the block with a placeholder, to be substituted during
    /// `post_process`.
    Placeholder(String),
    /// Replace the block with final markup immediately.
    Inline(String),
}

/// A code block extracted by a processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedCodeBlock {
    /// Zero-based index of the code block within the document.
    pub index: usize,
    /// Language token from the fence info string.
    pub language: String,
    /// Raw block content.
    pub source: String,
    /// Remaining `key=value` options from the fence info string.
    pub attrs: HashMap<String, String>,
}

/// Document-level context passed to `post_process`.
///
/// Carries what the renderer learned while traversing the document and that
/// deferred processors may need: currently the anchor ids of all rendered
/// headings, used to resolve internal hyperlink targets.
#[derive(Clone, Debug, Default)]
pub struct DocumentContext {
    /// Anchor ids available in the rendered document, in document order.
    pub anchors: Vec<String>,
}

/// A processor that can claim fenced code blocks during rendering.
///
/// Processors are consulted in registration order; the first returning a
/// non-`PassThrough` result wins. Deferred work happens in `post_process`,
/// which runs once after the whole document has been traversed.
pub trait CodeBlockProcessor {
    /// Offer a code block to this processor.
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult;

    /// Substitute placeholders in the rendered output.
    fn post_process(&mut self, _output: &mut String, _ctx: &DocumentContext) {}

    /// Blocks extracted with `ProcessResult::Placeholder` so far.
    fn extracted(&self) -> &[ExtractedCodeBlock] {
        &[]
    }

    /// Warnings accumulated during processing.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// Parse a fence info string into a language token and an options map.
///
/// The first whitespace-separated token is the language. Remaining tokens
/// are `key=value` pairs; values may be double-quoted to contain spaces
/// (`caption="hello world"`). A token without `=` becomes a key with the
/// value `"true"`.
#[must_use]
pub fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let mut tokens = split_tokens(info);
    if tokens.is_empty() {
        return (String::new(), HashMap::new());
    }

    let language = tokens.remove(0);
    let mut attrs = HashMap::new();
    for token in tokens {
        match token.split_once('=') {
            Some((key, value)) => {
                attrs.insert(key.to_owned(), unquote(value).to_owned());
            }
            None => {
                attrs.insert(token, "true".to_owned());
            }
        }
    }
    (language, attrs)
}

/// Split on whitespace, keeping double-quoted spans intact.
fn split_tokens(info: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in info.trim().chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Strip one pair of surrounding double quotes, if present.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
