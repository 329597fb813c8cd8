//! Output image formats.

use crate::error::DiagramError;

/// Closed set of supported output image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Svg,
    /// Requires the optional `pdf` cargo feature.
    Pdf,
}

impl ImageFormat {
    /// Parse a configured format name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::Configuration`] echoing the offending value
    /// for anything outside the closed set, and
    /// [`DiagramError::MissingDependency`] for PDF when the `pdf` feature is
    /// not compiled in. Both checks run before any rendering work starts.
    pub fn parse(name: &str) -> Result<Self, DiagramError> {
        let format = match name.to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "svg" => Self::Svg,
            "pdf" => Self::Pdf,
            _ => return Err(DiagramError::Configuration(name.to_owned())),
        };
        format.ensure_available()?;
        Ok(format)
    }

    /// Check that the backend for this format is compiled in.
    fn ensure_available(self) -> Result<(), DiagramError> {
        #[cfg(not(feature = "pdf"))]
        if self == Self::Pdf {
            return Err(DiagramError::MissingDependency);
        }
        Ok(())
    }

    /// Lowercase file extension.
    #[must_use]
    pub fn ext(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_formats() {
        assert_eq!(ImageFormat::parse("png").unwrap(), ImageFormat::Png);
        assert_eq!(ImageFormat::parse("svg").unwrap(), ImageFormat::Svg);
        assert_eq!(ImageFormat::parse("SVG").unwrap(), ImageFormat::Svg);
    }

    #[test]
    fn test_parse_unknown_format_echoes_value() {
        let err = ImageFormat::parse("JPG").unwrap_err();
        match err {
            DiagramError::Configuration(value) => assert_eq!(value, "JPG"),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn test_pdf_requires_feature() {
        let err = ImageFormat::parse("pdf").unwrap_err();
        assert!(matches!(err, DiagramError::MissingDependency));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_pdf_available_with_feature() {
        assert_eq!(ImageFormat::parse("pdf").unwrap(), ImageFormat::Pdf);
    }

    #[test]
    fn test_extensions() {
        assert_eq!(ImageFormat::Png.ext(), "png");
        assert_eq!(ImageFormat::Svg.ext(), "svg");
        assert_eq!(ImageFormat::Pdf.ext(), "pdf");
    }
}
