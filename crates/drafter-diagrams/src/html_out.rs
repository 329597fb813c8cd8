//! Web-mode markup synthesis.
//!
//! Produces the HTML fragment spliced in place of a diagram occurrence:
//! a `<figure>` wrapper carrying anchor/alignment/styling options around
//! either an `<img>` reference (raster formats) or the inline SVG markup
//! (vector format), with optional thumbnail linking and image-map overlay.

use std::fmt::Write;
use std::sync::LazyLock;

use drafter_renderer::escape_html;
use regex::Regex;

use crate::links::HyperlinkRegion;
use crate::options::DiagramOptions;

/// Compute display dimensions from natural dimensions and options.
///
/// Width/height overrides take precedence over the natural size; a single
/// override preserves the aspect ratio. `scale` multiplies whichever
/// dimensions are in effect.
#[must_use]
pub fn display_size(natural: (f64, f64), options: &DiagramOptions) -> (f64, f64) {
    let (natural_w, natural_h) = natural;
    let (mut width, mut height) = match (options.width_px(), options.height_px()) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (
            w,
            if natural_w > 0.0 {
                natural_h * w / natural_w
            } else {
                natural_h
            },
        ),
        (None, Some(h)) => (
            if natural_h > 0.0 {
                natural_w * h / natural_h
            } else {
                natural_w
            },
            h,
        ),
        (None, None) => (natural_w, natural_h),
    };

    if let Some(scale) = options.scale {
        width *= scale;
        height *= scale;
    }
    (width, height)
}

/// Format a pixel dimension (`97`, `48.5`).
#[must_use]
pub fn fmt_px(value: f64) -> String {
    value.to_string()
}

/// Inputs for a raster image figure.
pub struct ImageFigure<'a> {
    /// Reference the `<img>` tag displays (the thumbnail when one exists).
    pub src: &'a str,
    /// Reference of the full-size artifact.
    pub full: &'a str,
    /// Alt text (raw; escaped here).
    pub alt: &'a str,
    /// Display dimensions; `None` omits explicit sizing.
    pub display: Option<(f64, f64)>,
    /// Wrap the image in a link to the full-size artifact.
    pub link_full: bool,
    /// Image-map name when regions are present.
    pub map_name: Option<&'a str>,
    /// Clickable regions in display pixel space.
    pub regions: &'a [HyperlinkRegion],
    pub options: &'a DiagramOptions,
}

/// Synthesize the figure markup for a raster artifact.
#[must_use]
pub fn image_figure(figure: &ImageFigure<'_>) -> String {
    let mut out = String::new();
    figure_open(figure.options, &mut out);

    let usemap = match (figure.map_name, figure.regions.is_empty()) {
        (Some(name), false) => {
            write!(out, r#"<map name="{name}">"#).unwrap();
            for region in figure.regions {
                write!(
                    out,
                    r#"<area shape="rect" coords="{},{},{},{}" href="{}">"#,
                    fmt_px(region.x1),
                    fmt_px(region.y1),
                    fmt_px(region.x2),
                    fmt_px(region.y2),
                    escape_html(&region.href)
                )
                .unwrap();
            }
            out.push_str("</map>");
            format!(r##" usemap="#{name}""##)
        }
        _ => String::new(),
    };

    if figure.link_full {
        write!(
            out,
            r#"<a class="image-reference" href="{}">"#,
            escape_html(figure.full)
        )
        .unwrap();
    }

    let size_attrs = figure.display.map_or_else(String::new, |(w, h)| {
        format!(r#" width="{}" height="{}""#, fmt_px(w), fmt_px(h))
    });
    write!(
        out,
        r#"<img src="{}" alt="{}"{size_attrs}{usemap}>"#,
        escape_html(figure.src),
        escape_html(figure.alt)
    )
    .unwrap();

    if figure.link_full {
        out.push_str("</a>");
    }
    figure_close(figure.options, &mut out);
    out
}

/// Synthesize the figure markup for inline SVG.
///
/// The SVG root's width/height are rewritten to the display dimensions; the
/// natural size is preserved in the `viewBox` so scaling stays lossless.
#[must_use]
pub fn svg_figure(
    svg: &str,
    display: (f64, f64),
    natural: (f64, f64),
    options: &DiagramOptions,
) -> String {
    let mut out = String::new();
    figure_open(options, &mut out);
    out.push_str(&scale_svg_root(svg, display, natural));
    figure_close(options, &mut out);
    out
}

/// Open the `<figure>` wrapper with anchor, alignment and styling classes.
fn figure_open(options: &DiagramOptions, out: &mut String) {
    out.push_str("<figure");
    if let Some(name) = &options.name {
        write!(out, r#" id="{}""#, escape_html(name)).unwrap();
    }
    out.push_str(r#" class="diagram"#);
    if let Some(align) = options.align {
        out.push(' ');
        out.push_str(align.class());
    }
    if let Some(class) = &options.class {
        out.push(' ');
        out.push_str(&escape_html(class));
    }
    out.push_str(r#"">"#);
}

/// Close the wrapper, emitting the caption when present.
fn figure_close(options: &DiagramOptions, out: &mut String) {
    if let Some(caption) = &options.caption {
        write!(out, "<figcaption>{}</figcaption>", escape_html(caption)).unwrap();
    }
    out.push_str("</figure>");
}

// A leading space keeps these off compound attributes like stroke-width.
static WIDTH_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#" width="[^"]*""#).unwrap());
static HEIGHT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#" height="[^"]*""#).unwrap());

/// Rewrite the SVG root element's display dimensions.
#[must_use]
pub fn scale_svg_root(svg: &str, display: (f64, f64), natural: (f64, f64)) -> String {
    let Some(start) = svg.find("<svg") else {
        return svg.to_owned();
    };
    let Some(root_len) = svg[start..].find('>') else {
        return svg.to_owned();
    };
    let end = start + root_len + 1;
    let root = &svg[start..end];

    let width_attr = format!(r#" width="{}""#, fmt_px(display.0));
    let height_attr = format!(r#" height="{}""#, fmt_px(display.1));

    let mut new_root = if WIDTH_ATTR.is_match(root) {
        WIDTH_ATTR.replace(root, width_attr.as_str()).into_owned()
    } else {
        root.replacen("<svg", &format!("<svg{width_attr}"), 1)
    };
    new_root = if HEIGHT_ATTR.is_match(&new_root) {
        HEIGHT_ATTR
            .replace(&new_root, height_attr.as_str())
            .into_owned()
    } else {
        new_root.replacen("<svg", &format!("<svg{height_attr}"), 1)
    };

    if !new_root.contains("viewBox=") {
        let view_box = format!(
            r#"viewBox="0 0 {} {}""#,
            fmt_px(natural.0),
            fmt_px(natural.1)
        );
        new_root = new_root.replacen("<svg", &format!("<svg {view_box}"), 1);
    }

    format!("{}{}{}", &svg[..start], new_root, &svg[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const NATURAL: (f64, f64) = (448.0, 194.0);

    fn options(pairs: &[(&str, &str)]) -> DiagramOptions {
        let attrs: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        let (options, warnings) = DiagramOptions::from_attrs(&attrs);
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        options
    }

    #[test]
    fn test_width_only_preserves_aspect_ratio() {
        assert_eq!(display_size(NATURAL, &options(&[("width", "224")])), (224.0, 97.0));
    }

    #[test]
    fn test_height_only_preserves_aspect_ratio() {
        assert_eq!(display_size(NATURAL, &options(&[("height", "97")])), (224.0, 97.0));
    }

    #[test]
    fn test_both_overrides_win() {
        assert_eq!(
            display_size(NATURAL, &options(&[("width", "100"), ("height", "200")])),
            (100.0, 200.0)
        );
    }

    #[test]
    fn test_scale_applies_to_natural_size() {
        assert_eq!(display_size(NATURAL, &options(&[("scale", "25%")])), (112.0, 48.5));
    }

    #[test]
    fn test_scale_applies_on_top_of_width() {
        assert_eq!(
            display_size(NATURAL, &options(&[("width", "28"), ("scale", "25%")])),
            (7.0, 3.03125)
        );
    }

    #[test]
    fn test_no_overrides_keep_natural_size() {
        assert_eq!(display_size(NATURAL, &options(&[])), NATURAL);
    }

    #[test]
    fn test_fmt_px_trims_integral_values() {
        assert_eq!(fmt_px(97.0), "97");
        assert_eq!(fmt_px(48.5), "48.5");
        assert_eq!(fmt_px(3.03125), "3.03125");
    }

    #[test]
    fn test_plain_image_figure() {
        let opts = options(&[]);
        let markup = image_figure(&ImageFigure {
            src: "_images/mermaid-abc.png",
            full: "_images/mermaid-abc.png",
            alt: "graph TD",
            display: Some((448.0, 194.0)),
            link_full: false,
            map_name: None,
            regions: &[],
            options: &opts,
        });

        assert_eq!(
            markup,
            r#"<figure class="diagram"><img src="_images/mermaid-abc.png" alt="graph TD" width="448" height="194"></figure>"#
        );
    }

    #[test]
    fn test_size_override_links_to_full_artifact() {
        let opts = options(&[("width", "224")]);
        let markup = image_figure(&ImageFigure {
            src: "_images/mermaid-abc.png",
            full: "_images/mermaid-abc.png",
            alt: "d",
            display: Some(display_size(NATURAL, &opts)),
            link_full: true,
            map_name: None,
            regions: &[],
            options: &opts,
        });

        assert!(markup.contains(r#"<a class="image-reference" href="_images/mermaid-abc.png">"#));
        assert!(markup.contains(r#"width="224" height="97""#));
        assert!(markup.ends_with("</a></figure>"));
    }

    #[test]
    fn test_image_map_markup() {
        let opts = options(&[]);
        let regions = vec![HyperlinkRegion {
            x1: 32.0,
            y1: 20.0,
            x2: 96.0,
            y2: 40.0,
            href: "#target".to_owned(),
        }];
        let markup = image_figure(&ImageFigure {
            src: "_images/d.png",
            full: "_images/d.png",
            alt: "d",
            display: None,
            link_full: false,
            map_name: Some("map_0"),
            regions: &regions,
            options: &opts,
        });

        assert!(markup.contains(
            r##"<map name="map_0"><area shape="rect" coords="32,20,96,40" href="#target"></map>"##
        ));
        assert!(markup.contains(r##"usemap="#map_0""##));
    }

    #[test]
    fn test_figure_options_render_on_wrapper() {
        let opts = options(&[
            ("name", "target"),
            ("align", "center"),
            ("class", "wide"),
            ("caption", "hello world"),
        ]);
        let markup = image_figure(&ImageFigure {
            src: "d.png",
            full: "d.png",
            alt: "d",
            display: None,
            link_full: false,
            map_name: None,
            regions: &[],
            options: &opts,
        });

        assert!(markup.starts_with(r#"<figure id="target" class="diagram align-center wide">"#));
        assert!(markup.ends_with("<figcaption>hello world</figcaption></figure>"));
    }

    #[test]
    fn test_scale_svg_root_rewrites_dimensions() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="448" height="194" viewBox="0 0 448 194"><rect/></svg>"#;
        let scaled = scale_svg_root(svg, (224.0, 97.0), NATURAL);

        assert!(scaled.contains(r#"width="224""#));
        assert!(scaled.contains(r#"height="97""#));
        assert!(scaled.contains(r#"viewBox="0 0 448 194""#));
        assert!(scaled.contains("<rect/>"));
    }

    #[test]
    fn test_scale_svg_root_adds_missing_viewbox() {
        let svg = r#"<svg width="448" height="194"><rect/></svg>"#;
        let scaled = scale_svg_root(svg, (112.0, 48.5), NATURAL);

        assert!(scaled.contains(r#"viewBox="0 0 448 194""#));
        assert!(scaled.contains(r#"width="112""#));
        assert!(scaled.contains(r#"height="48.5""#));
    }

    #[test]
    fn test_svg_figure_wraps_markup() {
        let opts = options(&[("name", "seq")]);
        let svg = r#"<svg width="448" height="194"></svg>"#;
        let markup = svg_figure(svg, (448.0, 194.0), NATURAL, &opts);

        assert!(markup.starts_with(r#"<figure id="seq" class="diagram">"#));
        assert!(markup.ends_with("</svg></figure>"));
    }
}
