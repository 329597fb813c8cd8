//! Diagram cache key computation.
//!
//! Provides [`DiagramKey`] for computing content-based hashes used as cache
//! keys, and the artifact naming scheme built on them.

use sha2::{Digest, Sha256};

use crate::format::ImageFormat;

/// Diagram parameters for cache key computation.
///
/// Contains everything that affects the rendered output: the diagram source
/// text and the canonical stringification of the directive options. The
/// format is not part of the hash; it selects the file extension, so the
/// same diagram exported to two formats shares one hash with two names.
#[derive(Debug)]
pub struct DiagramKey<'a> {
    /// Diagram source code, exactly as written in the document.
    pub source: &'a str,
    /// Canonical options string (see `DiagramOptions::canonical`).
    pub options: &'a str,
}

impl DiagramKey<'_> {
    /// Compute the content hash for this key.
    ///
    /// SHA-256 over the UTF-8 bytes of `source` followed by `options`. Not a
    /// security boundary, just a build-cache key, but any change to either
    /// input changes the hash with overwhelming probability.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source.as_bytes());
        hasher.update(self.options.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Artifact file name: `<prefix>-<hexhash>.<ext>`.
#[must_use]
pub fn artifact_name(prefix: &str, hash: &str, format: ImageFormat) -> String {
    format!("{prefix}-{hash}.{}", format.ext())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identical_inputs_hash_identically() {
        let a = DiagramKey {
            source: "graph TD\nA-->B",
            options: "width=224",
        };
        let b = DiagramKey {
            source: "graph TD\nA-->B",
            options: "width=224",
        };
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_source_change_changes_hash() {
        let a = DiagramKey {
            source: "graph TD\nA-->B",
            options: "",
        };
        let b = DiagramKey {
            source: "graph TD\nA-->C",
            options: "",
        };
        assert_ne!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_option_change_changes_hash() {
        let a = DiagramKey {
            source: "graph TD\nA-->B",
            options: "width=224",
        };
        let b = DiagramKey {
            source: "graph TD\nA-->B",
            options: "width=225",
        };
        assert_ne!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = DiagramKey {
            source: "x",
            options: "",
        }
        .compute_hash();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_artifact_name() {
        let name = artifact_name("mermaid", "abc123", ImageFormat::Png);
        assert_eq!(name, "mermaid-abc123.png");
        let thumb = artifact_name("mermaid_thumb", "abc123", ImageFormat::Png);
        assert_eq!(thumb, "mermaid_thumb-abc123.png");
    }
}
