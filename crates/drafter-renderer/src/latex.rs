//! LaTeX backend for markdown rendering.
//!
//! Produces LaTeX body fragments for typeset (print) builds. The caller is
//! responsible for the document preamble; strikethrough uses `\sout` (ulem)
//! and links use `\href` (hyperref).

use std::fmt::Write;

use pulldown_cmark::Alignment;

use crate::backend::RenderBackend;

/// Escape text for LaTeX output.
#[must_use]
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

/// LaTeX render backend.
pub struct LatexBackend;

fn column_spec(alignments: &[Alignment]) -> String {
    alignments
        .iter()
        .map(|align| match align {
            Alignment::Center => 'c',
            Alignment::Right => 'r',
            Alignment::None | Alignment::Left => 'l',
        })
        .collect()
}

impl RenderBackend for LatexBackend {
    fn escape(text: &str) -> String {
        escape_latex(text)
    }

    fn paragraph_start(_out: &mut String) {}

    fn paragraph_end(out: &mut String) {
        out.push_str("\n\n");
    }

    fn heading(level: u8, id: &str, content: &str, out: &mut String) {
        let command = match level {
            1 => r"\section",
            2 => r"\subsection",
            3 => r"\subsubsection",
            _ => r"\paragraph",
        };
        writeln!(out, "{command}{{{}}}\\label{{{id}}}", content.trim()).unwrap();
    }

    fn blockquote_start(out: &mut String) {
        out.push_str("\\begin{quote}\n");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("\\end{quote}\n");
    }

    fn code_block(_lang: Option<&str>, content: &str, out: &mut String) {
        out.push_str("\\begin{verbatim}\n");
        out.push_str(content);
        if !content.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("\\end{verbatim}\n");
    }

    fn list_start(start: Option<u64>, out: &mut String) {
        if start.is_some() {
            out.push_str("\\begin{enumerate}\n");
        } else {
            out.push_str("\\begin{itemize}\n");
        }
    }

    fn list_end(ordered: bool, out: &mut String) {
        out.push_str(if ordered {
            "\\end{enumerate}\n"
        } else {
            "\\end{itemize}\n"
        });
    }

    fn item_start(out: &mut String) {
        out.push_str("\\item ");
    }

    fn item_end(out: &mut String) {
        out.push('\n');
    }

    fn table_start(alignments: &[Alignment], out: &mut String) {
        writeln!(out, "\\begin{{tabular}}{{{}}}", column_spec(alignments)).unwrap();
    }

    fn table_end(out: &mut String) {
        out.push_str("\\end{tabular}\n");
    }

    fn table_head_start(_out: &mut String) {}

    fn table_head_end(out: &mut String) {
        out.push_str(" \\\\\n\\hline\n");
    }

    fn table_row_start(_out: &mut String) {}

    fn table_row_end(out: &mut String) {
        out.push_str(" \\\\\n");
    }

    fn table_cell_start(index: usize, _in_head: bool, _align: Alignment, out: &mut String) {
        if index > 0 {
            out.push_str(" & ");
        }
    }

    fn table_cell_end(_in_head: bool, _out: &mut String) {}

    fn emphasis_start(out: &mut String) {
        out.push_str("\\emph{");
    }

    fn emphasis_end(out: &mut String) {
        out.push('}');
    }

    fn strong_start(out: &mut String) {
        out.push_str("\\textbf{");
    }

    fn strong_end(out: &mut String) {
        out.push('}');
    }

    fn strikethrough_start(out: &mut String) {
        out.push_str("\\sout{");
    }

    fn strikethrough_end(out: &mut String) {
        out.push('}');
    }

    fn inline_code(code: &str, out: &mut String) {
        write!(out, "\\texttt{{{}}}", escape_latex(code)).unwrap();
    }

    fn link_start(href: &str, out: &mut String) {
        // Hash and percent are the only characters \href's URL argument
        // cannot carry raw.
        let url = href.replace('%', "\\%").replace('#', "\\#");
        write!(out, "\\href{{{url}}}{{").unwrap();
    }

    fn link_end(out: &mut String) {
        out.push('}');
    }

    fn image(src: &str, _alt: &str, _title: &str, out: &mut String) {
        writeln!(out, "\\includegraphics{{{src}}}").unwrap();
    }

    fn raw_html(_html: &str, _out: &mut String) {
        // Raw HTML has no LaTeX rendition.
    }

    fn hard_break(out: &mut String) {
        out.push_str("\\\\\n");
    }

    fn horizontal_rule(out: &mut String) {
        out.push_str("\\noindent\\rule{\\linewidth}{0.4pt}\n");
    }

    fn task_list_marker(checked: bool, out: &mut String) {
        out.push_str(if checked { "[x] " } else { "[ ] " });
    }
}
