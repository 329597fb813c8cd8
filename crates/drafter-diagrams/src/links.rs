//! Hyperlink regions for diagram nodes.
//!
//! Diagram text may carry `click` interaction lines:
//!
//! ```text
//! graph TD
//!     A[Start] --> B[Done]
//!     click A "#introduction"
//!     click B href "https://example.com/done"
//! ```
//!
//! These lines are stripped before the source reaches the external compiler
//! and turned into [`ClickTarget`]s. Targets beginning with `#` must name an
//! anchor that exists in the document; unknown anchors are dropped with an
//! "undefined label" warning (never an error). Region geometry is recovered
//! from the rendered SVG: the shape element drawn just before the node's
//! label text provides the clickable rectangle. Matching is best-effort:
//! a node whose shape cannot be located simply gets no region.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::session::BuildSession;

static CLICK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*click\s+([A-Za-z0-9_-]+)\s+(?:href\s+)?"([^"]+)"\s*$"#).unwrap()
});

static NODE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)\b([A-Za-z0-9_-]+)\s*[\[\(]"?([^\]\)"]+)"?[\]\)]"#).unwrap()
});

static PARTICIPANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:participant|actor)\s+([A-Za-z0-9_-]+)\s+as\s+(.+?)\s*$").unwrap()
});

/// A node the diagram text declares clickable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickTarget {
    /// Node identifier from the `click` line.
    pub node: String,
    /// Display label of that node, used to locate its shape in the SVG.
    pub label: String,
    /// Link target (document anchor or external URL).
    pub href: String,
}

/// A clickable rectangle in output pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperlinkRegion {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub href: String,
}

impl HyperlinkRegion {
    /// Region scaled from natural into display pixel space.
    #[must_use]
    pub fn scaled(&self, factor_x: f64, factor_y: f64) -> Self {
        Self {
            x1: self.x1 * factor_x,
            y1: self.y1 * factor_y,
            x2: self.x2 * factor_x,
            y2: self.y2 * factor_y,
            href: self.href.clone(),
        }
    }
}

/// Split `click` lines out of the diagram source.
///
/// Returns the source with those lines removed (what the compiler sees) and
/// the declared targets with their labels resolved from node definitions.
#[must_use]
pub fn extract_click_targets(source: &str) -> (String, Vec<ClickTarget>) {
    let labels = node_labels(source);

    let targets = CLICK_LINE
        .captures_iter(source)
        .map(|caps| {
            let node = caps[1].to_owned();
            let label = labels.get(&node).cloned().unwrap_or_else(|| node.clone());
            ClickTarget {
                node,
                label,
                href: caps[2].to_owned(),
            }
        })
        .collect();

    let cleaned: String = source
        .lines()
        .filter(|line| !CLICK_LINE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n");

    (cleaned, targets)
}

/// Map node ids to their display labels (`A[Start]`, `participant A as X`).
fn node_labels(source: &str) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    for caps in NODE_LABEL.captures_iter(source) {
        labels
            .entry(caps[1].to_owned())
            .or_insert_with(|| caps[2].trim().to_owned());
    }
    for caps in PARTICIPANT.captures_iter(source) {
        labels.insert(caps[1].to_owned(), caps[2].to_owned());
    }
    labels
}

/// Resolve targets against the document's anchors.
///
/// External targets pass through unchanged. Internal targets (`#anchor`)
/// must name a known anchor; unknown ones are dropped with an
/// "undefined label" warning.
#[must_use]
pub fn resolve_targets(
    targets: Vec<ClickTarget>,
    session: &mut BuildSession,
) -> Vec<ClickTarget> {
    targets
        .into_iter()
        .filter(|target| {
            match target.href.strip_prefix('#') {
                Some(anchor) if !session.has_anchor(anchor) => {
                    session.warn(format!("undefined label: {anchor}"));
                    false
                }
                _ => true,
            }
        })
        .collect()
}

/// Locate clickable regions in the rendered SVG, in natural pixel space.
///
/// Walks the document in drawing order, remembering the last shape element
/// seen; when a `<text>` element's content equals a target's label, that
/// shape's bounding box becomes the region.
#[must_use]
pub fn locate_regions(svg: &str, targets: &[ClickTarget]) -> Vec<HyperlinkRegion> {
    let Ok(doc) = roxmltree::Document::parse(svg) else {
        return Vec::new();
    };

    let mut by_label: HashMap<&str, &ClickTarget> = targets
        .iter()
        .map(|target| (target.label.as_str(), target))
        .collect();

    let mut regions = Vec::new();
    let mut last_shape: Option<(f64, f64, f64, f64)> = None;

    for node in doc.descendants().filter(roxmltree::Node::is_element) {
        if let Some(bbox) = shape_bbox(node) {
            last_shape = Some(bbox);
        } else if node.has_tag_name("text") {
            let content = text_content(node);
            if let Some(target) = by_label.remove(content.trim()) {
                if let Some((x1, y1, x2, y2)) = last_shape {
                    regions.push(HyperlinkRegion {
                        x1,
                        y1,
                        x2,
                        y2,
                        href: target.href.clone(),
                    });
                }
            }
        }
    }
    regions
}

/// Wrap the shape elements of clickable nodes in `<a href>` links.
///
/// Vector output keeps its interactivity inline instead of using an image
/// map. Splicing works on source byte ranges, applied back to front so
/// earlier ranges stay valid.
#[must_use]
pub fn wrap_svg_links(svg: &str, targets: &[ClickTarget]) -> String {
    let Ok(doc) = roxmltree::Document::parse(svg) else {
        return svg.to_owned();
    };

    let mut by_label: HashMap<&str, &ClickTarget> = targets
        .iter()
        .map(|target| (target.label.as_str(), target))
        .collect();

    let mut splices: Vec<(std::ops::Range<usize>, String)> = Vec::new();
    let mut last_shape: Option<std::ops::Range<usize>> = None;

    for node in doc.descendants().filter(roxmltree::Node::is_element) {
        if shape_bbox(node).is_some() {
            last_shape = Some(node.range());
        } else if node.has_tag_name("text") {
            let content = text_content(node);
            if let Some(target) = by_label.remove(content.trim()) {
                if let Some(range) = last_shape.clone() {
                    splices.push((range, target.href.clone()));
                }
            }
        }
    }

    let mut result = svg.to_owned();
    splices.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    for (range, href) in splices {
        result.insert_str(range.end, "</a>");
        result.insert_str(range.start, &format!(r#"<a href="{}">"#, escape_xml(&href)));
    }
    result
}

/// Bounding box of a shape element, if this is one.
fn shape_bbox(node: roxmltree::Node<'_, '_>) -> Option<(f64, f64, f64, f64)> {
    let attr = |name: &str| node.attribute(name).and_then(|v| v.parse::<f64>().ok());

    match node.tag_name().name() {
        "rect" => {
            let x = attr("x").unwrap_or(0.0);
            let y = attr("y").unwrap_or(0.0);
            let width = attr("width")?;
            let height = attr("height")?;
            Some((x, y, x + width, y + height))
        }
        "circle" => {
            let cx = attr("cx").unwrap_or(0.0);
            let cy = attr("cy").unwrap_or(0.0);
            let r = attr("r")?;
            Some((cx - r, cy - r, cx + r, cy + r))
        }
        "ellipse" => {
            let cx = attr("cx").unwrap_or(0.0);
            let cy = attr("cy").unwrap_or(0.0);
            let rx = attr("rx")?;
            let ry = attr("ry")?;
            Some((cx - rx, cy - ry, cx + rx, cy + ry))
        }
        "polygon" => {
            let points = node.attribute("points")?;
            let coords: Vec<f64> = points
                .split([' ', ','])
                .filter(|token| !token.is_empty())
                .filter_map(|token| token.parse().ok())
                .collect();
            if coords.len() < 4 {
                return None;
            }
            let xs = coords.iter().step_by(2);
            let ys = coords.iter().skip(1).step_by(2);
            Some((
                xs.clone().copied().fold(f64::INFINITY, f64::min),
                ys.clone().copied().fold(f64::INFINITY, f64::min),
                xs.copied().fold(f64::NEG_INFINITY, f64::max),
                ys.copied().fold(f64::NEG_INFINITY, f64::max),
            ))
        }
        _ => None,
    }
}

/// Concatenated text content of an element (tspans included).
fn text_content(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter_map(|n| n.text())
        .collect::<String>()
}

/// Escape a URL for use inside an XML attribute value.
fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = concat!(
        "graph TD\n",
        "    A[Start] --> B(Middle)\n",
        "    B --> C\n",
        "    click A \"#introduction\"\n",
        "    click B href \"https://example.com/b\"\n",
        "    click C \"#missing\"\n",
    );

    #[test]
    fn test_extract_click_targets() {
        let (cleaned, targets) = extract_click_targets(SOURCE);

        assert!(!cleaned.contains("click"));
        assert!(cleaned.contains("A[Start] --> B(Middle)"));
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].node, "A");
        assert_eq!(targets[0].label, "Start");
        assert_eq!(targets[0].href, "#introduction");
        assert_eq!(targets[1].label, "Middle");
        assert_eq!(targets[1].href, "https://example.com/b");
        // No bracket definition: the id doubles as the label.
        assert_eq!(targets[2].label, "C");
    }

    #[test]
    fn test_participant_labels() {
        let source = "sequenceDiagram\n    participant A as Auth Service\n    A->>B: hi\n    click A \"#auth\"\n";
        let (_, targets) = extract_click_targets(source);
        assert_eq!(targets[0].label, "Auth Service");
    }

    #[test]
    fn test_resolve_keeps_known_anchor_and_external() {
        let mut session = BuildSession::new();
        session.add_anchor("introduction");
        let (_, targets) = extract_click_targets(SOURCE);

        let resolved = resolve_targets(targets, &mut session);

        let hrefs: Vec<&str> = resolved.iter().map(|t| t.href.as_str()).collect();
        assert_eq!(hrefs, vec!["#introduction", "https://example.com/b"]);
        assert_eq!(session.warnings(), ["undefined label: missing"]);
    }

    const SVG: &str = concat!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="448" height="194">"##,
        r##"<rect x="32" y="20" width="64" height="20" fill="#fff"/>"##,
        r##"<text x="64" y="30"><tspan>Start</tspan></text>"##,
        r##"<rect x="32" y="120" width="64" height="20" fill="#fff"/>"##,
        r##"<text x="64" y="130"><tspan>Done</tspan></text>"##,
        "</svg>"
    );

    fn start_target() -> ClickTarget {
        ClickTarget {
            node: "A".to_owned(),
            label: "Start".to_owned(),
            href: "#introduction".to_owned(),
        }
    }

    #[test]
    fn test_locate_regions_from_preceding_shape() {
        let regions = locate_regions(SVG, &[start_target()]);

        assert_eq!(regions.len(), 1);
        assert_eq!(
            regions[0],
            HyperlinkRegion {
                x1: 32.0,
                y1: 20.0,
                x2: 96.0,
                y2: 40.0,
                href: "#introduction".to_owned(),
            }
        );
    }

    #[test]
    fn test_locate_regions_scaled() {
        let region = locate_regions(SVG, &[start_target()])[0].scaled(0.5, 0.5);
        assert_eq!(region.x1, 16.0);
        assert_eq!(region.y2, 20.0);
    }

    #[test]
    fn test_unmatched_label_yields_no_region() {
        let target = ClickTarget {
            node: "Z".to_owned(),
            label: "Nowhere".to_owned(),
            href: "#z".to_owned(),
        };
        assert!(locate_regions(SVG, &[target]).is_empty());
    }

    #[test]
    fn test_wrap_svg_links() {
        let wrapped = wrap_svg_links(SVG, &[start_target()]);

        assert!(wrapped.contains(
            r##"<a href="#introduction"><rect x="32" y="20" width="64" height="20" fill="#fff"/></a>"##
        ));
        // The second rect stays untouched.
        assert!(wrapped.contains(r##"<rect x="32" y="120" width="64" height="20" fill="#fff"/>"##));
    }

    #[test]
    fn test_wrap_svg_links_escapes_href() {
        let target = ClickTarget {
            node: "A".to_owned(),
            label: "Start".to_owned(),
            href: "https://example.com/?a=1&b=2".to_owned(),
        };
        let wrapped = wrap_svg_links(SVG, &[target]);
        assert!(wrapped.contains(r#"<a href="https://example.com/?a=1&amp;b=2">"#));
    }

    #[test]
    fn test_invalid_svg_degrades_gracefully() {
        assert!(locate_regions("<not-xml", &[start_target()]).is_empty());
        assert_eq!(wrap_svg_links("<not-xml", &[start_target()]), "<not-xml");
    }
}
