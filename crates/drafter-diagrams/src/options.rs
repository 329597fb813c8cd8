//! Per-occurrence directive options.
//!
//! Options arrive as the `key=value` map parsed from the fence info string.
//! The recognized set mirrors a figure directive: sizing (`width`, `height`,
//! `scale`, `maxwidth`), placement (`align`), identity (`name`), and
//! presentation (`caption`, `class`).

use std::collections::HashMap;

/// Horizontal placement of the rendered diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// CSS class suffix for web output.
    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            Self::Left => "align-left",
            Self::Center => "align-center",
            Self::Right => "align-right",
        }
    }
}

/// Recognized option keys, in canonical (sorted) order.
const KNOWN_KEYS: [&str; 8] = [
    "align", "caption", "class", "height", "maxwidth", "name", "scale", "width",
];

/// Validated per-occurrence options.
///
/// Width and height are kept verbatim: web output parses them as pixel
/// numbers, typeset output forwards them untouched (so `3cm` is legal
/// there).
#[derive(Debug, Clone, Default)]
pub struct DiagramOptions {
    pub width: Option<String>,
    pub height: Option<String>,
    /// Scale factor (a `50%` option becomes `0.5`).
    pub scale: Option<f64>,
    pub align: Option<Align>,
    /// Anchor id attached to the rendered figure.
    pub name: Option<String>,
    pub caption: Option<String>,
    /// Extra CSS class for web output.
    pub class: Option<String>,
    /// Maximum display width in pixels; wider renders get a thumbnail.
    pub maxwidth: Option<f64>,
    canonical: String,
}

impl DiagramOptions {
    /// Parse directive options from the fence attribute map.
    ///
    /// Unknown keys and unparsable values are reported as warnings and
    /// ignored; option parsing never fails an occurrence.
    #[must_use]
    pub fn from_attrs(attrs: &HashMap<String, String>) -> (Self, Vec<String>) {
        let mut options = Self::default();
        let mut warnings = Vec::new();

        for (key, value) in attrs {
            match key.as_str() {
                "width" => options.width = Some(value.clone()),
                "height" => options.height = Some(value.clone()),
                "scale" => match parse_percentage(value) {
                    Some(factor) => options.scale = Some(factor),
                    None => warnings.push(format!("invalid scale value '{value}' ignored")),
                },
                "align" => match Align::parse(value) {
                    Some(align) => options.align = Some(align),
                    None => warnings.push(format!(
                        "invalid align value '{value}' ignored (valid: left, center, right)"
                    )),
                },
                "name" => options.name = Some(value.clone()),
                "caption" => options.caption = Some(value.clone()),
                "class" => options.class = Some(value.clone()),
                "maxwidth" => match value.parse::<f64>() {
                    Ok(px) if px > 0.0 => options.maxwidth = Some(px),
                    _ => warnings.push(format!("invalid maxwidth value '{value}' ignored")),
                },
                other => warnings.push(format!("unknown option '{other}' ignored")),
            }
        }

        options.canonical = canonicalize(attrs);
        (options, warnings)
    }

    /// Canonical stringification of the recognized options.
    ///
    /// Deterministic (keys sorted) so that the same options always hash the
    /// same regardless of map iteration order.
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Width parsed as a pixel number, for web output.
    #[must_use]
    pub fn width_px(&self) -> Option<f64> {
        self.width.as_deref().and_then(|v| v.parse().ok())
    }

    /// Height parsed as a pixel number, for web output.
    #[must_use]
    pub fn height_px(&self) -> Option<f64> {
        self.height.as_deref().and_then(|v| v.parse().ok())
    }

    /// Whether any sizing override is in effect.
    #[must_use]
    pub fn has_size_override(&self) -> bool {
        self.width.is_some() || self.height.is_some() || self.scale.is_some()
    }
}

/// Parse `25%` (or a bare `25`) into the factor `0.25`.
fn parse_percentage(value: &str) -> Option<f64> {
    let number = value.strip_suffix('%').unwrap_or(value).trim();
    let percent: f64 = number.parse().ok()?;
    (percent > 0.0).then_some(percent / 100.0)
}

/// Sorted `key=value` rendition of the recognized attributes.
fn canonicalize(attrs: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = KNOWN_KEYS
        .iter()
        .filter_map(|key| attrs.get(*key).map(|value| format!("{key}={value}")))
        .collect();
    pairs.sort();
    pairs.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_sizing_options() {
        let (options, warnings) =
            DiagramOptions::from_attrs(&attrs(&[("width", "224"), ("scale", "25%")]));
        assert!(warnings.is_empty());
        assert_eq!(options.width_px(), Some(224.0));
        assert_eq!(options.scale, Some(0.25));
        assert!(options.has_size_override());
    }

    #[test]
    fn test_scale_without_percent_sign() {
        let (options, warnings) = DiagramOptions::from_attrs(&attrs(&[("scale", "50")]));
        assert!(warnings.is_empty());
        assert_eq!(options.scale, Some(0.5));
    }

    #[test]
    fn test_invalid_scale_warns_and_ignores() {
        let (options, warnings) = DiagramOptions::from_attrs(&attrs(&[("scale", "big")]));
        assert_eq!(options.scale, None);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("invalid scale value 'big'"));
    }

    #[test]
    fn test_unknown_option_warns() {
        let (_, warnings) = DiagramOptions::from_attrs(&attrs(&[("size", "large")]));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("unknown option 'size'"));
    }

    #[test]
    fn test_non_numeric_width_kept_verbatim() {
        // Typeset output forwards lengths like 3cm untouched.
        let (options, warnings) = DiagramOptions::from_attrs(&attrs(&[("width", "3cm")]));
        assert!(warnings.is_empty());
        assert_eq!(options.width.as_deref(), Some("3cm"));
        assert_eq!(options.width_px(), None);
    }

    #[test]
    fn test_align_parsing() {
        let (options, _) = DiagramOptions::from_attrs(&attrs(&[("align", "center")]));
        assert_eq!(options.align, Some(Align::Center));

        let (options, warnings) = DiagramOptions::from_attrs(&attrs(&[("align", "middle")]));
        assert_eq!(options.align, None);
        assert!(warnings[0].contains("invalid align value 'middle'"));
    }

    #[test]
    fn test_canonical_is_sorted_and_stable() {
        let (a, _) = DiagramOptions::from_attrs(&attrs(&[("width", "224"), ("align", "left")]));
        let (b, _) = DiagramOptions::from_attrs(&attrs(&[("align", "left"), ("width", "224")]));
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a.canonical(), "align=left width=224");
    }

    #[test]
    fn test_canonical_excludes_unknown_keys() {
        let (options, _) =
            DiagramOptions::from_attrs(&attrs(&[("width", "10"), ("bogus", "x")]));
        assert_eq!(options.canonical(), "width=10");
    }
}
