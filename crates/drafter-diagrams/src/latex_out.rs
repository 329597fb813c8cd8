//! Typeset-mode markup synthesis.
//!
//! Emits the `\includegraphics` command for a rendered artifact, forwarding
//! width/height verbatim and scale as a factor, wrapped in alignment markup
//! and/or a captioned figure environment.

use std::fmt::Write;

use drafter_renderer::escape_latex;

use crate::options::{Align, DiagramOptions};

/// Bracketed options for `\includegraphics`, empty when none apply.
///
/// Width and height pass through verbatim (so `3cm` works); scale is the
/// parsed factor (`50%` becomes `scale=0.5`).
fn include_options(options: &DiagramOptions) -> String {
    let mut parts = Vec::new();
    if let Some(width) = &options.width {
        parts.push(format!("width={width}"));
    }
    if let Some(height) = &options.height {
        parts.push(format!("height={height}"));
    }
    if let Some(scale) = options.scale {
        parts.push(format!("scale={scale}"));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("[{}]", parts.join(","))
    }
}

/// Synthesize the LaTeX fragment for a rendered artifact.
#[must_use]
pub fn latex_figure(file_name: &str, options: &DiagramOptions) -> String {
    let graphics = format!(
        "\\includegraphics{}{{{file_name}}}",
        include_options(options)
    );

    match (&options.caption, options.align) {
        (Some(caption), Some(side @ (Align::Left | Align::Right))) => {
            let placement = if side == Align::Left { "l" } else { "r" };
            format!(
                "\\begin{{wrapfigure}}{{{placement}}}{{0pt}}\n\\centering\n\\noindent{graphics}\n\\caption{{{}}}\n\\end{{wrapfigure}}\n",
                escape_latex(caption)
            )
        }
        (Some(caption), _) => format!(
            "\\begin{{figure}}[htbp]\n\\centering\n{graphics}\n\\caption{{{}}}\n\\end{{figure}}\n",
            escape_latex(caption)
        ),
        (None, align) => {
            let mut out = String::from("\\par");
            match align {
                Some(Align::Left) => write!(out, "{{{graphics}\\hspace*{{\\fill}}}}").unwrap(),
                Some(Align::Center) => {
                    write!(out, "{{\\hspace*{{\\fill}}{graphics}\\hspace*{{\\fill}}}}").unwrap();
                }
                Some(Align::Right) => write!(out, "{{\\hspace*{{\\fill}}{graphics}}}").unwrap(),
                None => out.push_str(&graphics),
            }
            out.push_str("\\par\n");
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn options(pairs: &[(&str, &str)]) -> DiagramOptions {
        let attrs: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        DiagramOptions::from_attrs(&attrs).0
    }

    #[test]
    fn test_plain_include() {
        let markup = latex_figure("mermaid-abc.png", &options(&[]));
        assert_eq!(markup, "\\par\\includegraphics{mermaid-abc.png}\\par\n");
    }

    #[test]
    fn test_width_forwarded_verbatim() {
        let markup = latex_figure("d.png", &options(&[("width", "3cm")]));
        assert!(markup.contains("\\includegraphics[width=3cm]{d.png}"));
    }

    #[test]
    fn test_height_forwarded_verbatim() {
        let markup = latex_figure("d.png", &options(&[("height", "4cm")]));
        assert!(markup.contains("\\includegraphics[height=4cm]{d.png}"));
    }

    #[test]
    fn test_scale_as_factor() {
        let markup = latex_figure("d.png", &options(&[("scale", "50%")]));
        assert!(markup.contains("\\includegraphics[scale=0.5]{d.png}"));
    }

    #[test]
    fn test_align_left() {
        let markup = latex_figure("d.png", &options(&[("align", "left")]));
        assert_eq!(
            markup,
            "\\par{\\includegraphics{d.png}\\hspace*{\\fill}}\\par\n"
        );
    }

    #[test]
    fn test_align_center() {
        let markup = latex_figure("d.png", &options(&[("align", "center")]));
        assert_eq!(
            markup,
            "\\par{\\hspace*{\\fill}\\includegraphics{d.png}\\hspace*{\\fill}}\\par\n"
        );
    }

    #[test]
    fn test_align_right() {
        let markup = latex_figure("d.png", &options(&[("align", "right")]));
        assert_eq!(
            markup,
            "\\par{\\hspace*{\\fill}\\includegraphics{d.png}}\\par\n"
        );
    }

    #[test]
    fn test_caption_produces_figure_environment() {
        let markup = latex_figure("d.png", &options(&[("caption", "hello world")]));
        assert!(markup.starts_with("\\begin{figure}[htbp]\n\\centering\n"));
        assert!(markup.contains("\\includegraphics{d.png}"));
        assert!(markup.contains("\\caption{hello world}"));
        assert!(markup.ends_with("\\end{figure}\n"));
    }

    #[test]
    fn test_caption_with_side_align_produces_wrapfigure() {
        let markup = latex_figure(
            "d.png",
            &options(&[("caption", "hello"), ("align", "left")]),
        );
        assert!(markup.starts_with("\\begin{wrapfigure}{l}{0pt}\n"));
        assert!(markup.contains("\\noindent\\includegraphics{d.png}"));
        assert!(markup.ends_with("\\end{wrapfigure}\n"));

        let right = latex_figure(
            "d.png",
            &options(&[("caption", "hello"), ("align", "right")]),
        );
        assert!(right.starts_with("\\begin{wrapfigure}{r}{0pt}\n"));
    }

    #[test]
    fn test_caption_is_escaped() {
        let markup = latex_figure("d.png", &options(&[("caption", "50% done")]));
        assert!(markup.contains("\\caption{50\\% done}"));
    }
}
