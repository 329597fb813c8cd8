//! Diagram rendering error taxonomy.
//!
//! Every variant is caught at the single-occurrence boundary in the
//! processor and converted into a build warning; none aborts the build.

/// Errors raised while rendering a single diagram occurrence.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    /// The configured output format is not one of png/svg/pdf.
    #[error("unknown format: {0}")]
    Configuration(String),

    /// PDF output requested without the optional PDF backend compiled in.
    #[error("could not output PDF format; rebuild with the `pdf` feature")]
    MissingDependency,

    /// The external compiler rejected the diagram text (parse or layout).
    /// Carries the compiler's message; callers must not assume structure
    /// beyond a human-readable string.
    #[error("parse error: {0}")]
    Parse(String),

    /// A failure after layout: tree construction, rasterization, or PDF
    /// conversion.
    #[error("render failed: {0}")]
    Render(String),

    /// The output bytes could not be encoded.
    #[error("could not encode output: {0}")]
    Encoding(String),

    /// Artifact I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
