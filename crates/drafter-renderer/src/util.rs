//! Small shared helpers.

use std::path::Path;

use pulldown_cmark::HeadingLevel;

/// Convert a pulldown-cmark heading level to its numeric form.
#[must_use]
pub fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Prefix that climbs from a document's location back to the output root.
///
/// For a document at `guide/intro.md` this is `"../"`; for a root-level
/// document it is `""`. Used to reference shared directories (such as the
/// image artifact directory) from nested pages.
#[must_use]
pub fn prefix_to_root(doc_rel_path: &Path) -> String {
    let depth = doc_rel_path
        .parent()
        .map_or(0, |parent| parent.components().count());
    "../".repeat(depth)
}
