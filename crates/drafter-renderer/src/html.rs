//! HTML backend for markdown rendering.
//!
//! Produces semantic HTML5 output suitable for web display.

use std::fmt::Write;

use pulldown_cmark::Alignment;

use crate::backend::RenderBackend;
use crate::state::escape_html;

/// HTML render backend.
///
/// Produces semantic HTML5 with:
/// - `<pre><code>` for code blocks
/// - `<blockquote>` for blockquotes
/// - heading ids for anchor navigation
pub struct HtmlBackend;

fn alignment_style(align: Alignment) -> &'static str {
    match align {
        Alignment::None => "",
        Alignment::Left => r#" style="text-align: left""#,
        Alignment::Center => r#" style="text-align: center""#,
        Alignment::Right => r#" style="text-align: right""#,
    }
}

impl RenderBackend for HtmlBackend {
    fn escape(text: &str) -> String {
        escape_html(text)
    }

    fn paragraph_start(out: &mut String) {
        out.push_str("<p>");
    }

    fn paragraph_end(out: &mut String) {
        out.push_str("</p>");
    }

    fn heading(level: u8, id: &str, content: &str, out: &mut String) {
        write!(out, r#"<h{level} id="{id}">{}</h{level}>"#, content.trim()).unwrap();
    }

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        if let Some(lang) = lang {
            write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(content)
            )
            .unwrap();
        } else {
            write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap();
        }
    }

    fn list_start(start: Option<u64>, out: &mut String) {
        match start {
            Some(1) => out.push_str("<ol>"),
            Some(n) => write!(out, r#"<ol start="{n}">"#).unwrap(),
            None => out.push_str("<ul>"),
        }
    }

    fn list_end(ordered: bool, out: &mut String) {
        out.push_str(if ordered { "</ol>" } else { "</ul>" });
    }

    fn item_start(out: &mut String) {
        out.push_str("<li>");
    }

    fn item_end(out: &mut String) {
        out.push_str("</li>");
    }

    fn table_start(_alignments: &[Alignment], out: &mut String) {
        out.push_str("<table>");
    }

    fn table_end(out: &mut String) {
        out.push_str("</tbody></table>");
    }

    fn table_head_start(out: &mut String) {
        out.push_str("<thead><tr>");
    }

    fn table_head_end(out: &mut String) {
        out.push_str("</tr></thead><tbody>");
    }

    fn table_row_start(out: &mut String) {
        out.push_str("<tr>");
    }

    fn table_row_end(out: &mut String) {
        out.push_str("</tr>");
    }

    fn table_cell_start(_index: usize, in_head: bool, align: Alignment, out: &mut String) {
        let tag = if in_head { "th" } else { "td" };
        write!(out, "<{tag}{}>", alignment_style(align)).unwrap();
    }

    fn table_cell_end(in_head: bool, out: &mut String) {
        out.push_str(if in_head { "</th>" } else { "</td>" });
    }

    fn emphasis_start(out: &mut String) {
        out.push_str("<em>");
    }

    fn emphasis_end(out: &mut String) {
        out.push_str("</em>");
    }

    fn strong_start(out: &mut String) {
        out.push_str("<strong>");
    }

    fn strong_end(out: &mut String) {
        out.push_str("</strong>");
    }

    fn strikethrough_start(out: &mut String) {
        out.push_str("<s>");
    }

    fn strikethrough_end(out: &mut String) {
        out.push_str("</s>");
    }

    fn inline_code(code: &str, out: &mut String) {
        write!(out, "<code>{}</code>", escape_html(code)).unwrap();
    }

    fn link_start(href: &str, out: &mut String) {
        write!(out, r#"<a href="{}">"#, escape_html(href)).unwrap();
    }

    fn link_end(out: &mut String) {
        out.push_str("</a>");
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, escape_html(title))
        };
        write!(
            out,
            r#"<img src="{}"{title_attr} alt="{}">"#,
            escape_html(src),
            escape_html(alt)
        )
        .unwrap();
    }

    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    fn task_list_marker(checked: bool, out: &mut String) {
        out.push_str(if checked {
            r#"<input type="checkbox" checked disabled>"#
        } else {
            r#"<input type="checkbox" disabled>"#
        });
    }
}
