//! On-disk artifact cache for rendered diagrams.
//!
//! [`ArtifactCache`] manages a single directory of content-addressed files.
//! Callers derive the file name from a content hash, so the cache policy is
//! a pure existence probe: if a file with the requested name is already
//! present, the artifact is considered rendered and up to date. There is no
//! etag, no expiry, and no validity check beyond the name itself.
//!
//! Publication is atomic: [`ArtifactCache::store`] writes to a temporary
//! file in the destination directory and renames it into place, so a crashed
//! build can never leave a truncated artifact behind for the existence probe
//! to find.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A directory of content-addressed artifact files.
///
/// The directory is created lazily on first store. Reads never create it.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    dir: PathBuf,
}

impl ArtifactCache {
    /// Create a cache rooted at `dir`.
    ///
    /// The directory does not need to exist yet.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of this cache.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path an artifact with the given file name would occupy.
    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Whether an artifact with the given file name has already been
    /// published.
    ///
    /// This existence probe is the entire caching policy: names are content
    /// hashes, so a present file is by construction the right content.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    /// Publish an artifact atomically.
    ///
    /// The bytes are written to a temporary file inside the cache directory
    /// and renamed to the final name, so concurrent or interrupted builds
    /// can never expose a partial file. Returns the final path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the write or
    /// rename fails.
    pub fn store(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_of(name);
        let tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        fs::write(tmp.path(), bytes)?;
        tmp.persist(&path).map_err(|e| e.error)?;

        tracing::debug!("stored artifact {name} ({} bytes)", bytes.len());
        Ok(path)
    }

    /// Read a published artifact back as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact does not exist or cannot be read.
    pub fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_of(name))
    }

    /// Read a published artifact back as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact does not exist, cannot be read, or
    /// is not valid UTF-8.
    pub fn read_string(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.path_of(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_store_and_contains() {
        let tmp = TempDir::new().unwrap();
        let cache = ArtifactCache::new(tmp.path().join("_images"));

        assert!(!cache.contains("diagram-abc.png"));

        cache.store("diagram-abc.png", b"png bytes").unwrap();
        assert!(cache.contains("diagram-abc.png"));
    }

    #[test]
    fn test_store_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let cache = ArtifactCache::new(tmp.path().join("deeply/nested/_images"));

        let path = cache.store("diagram-abc.svg", b"<svg/>").unwrap();
        assert!(path.is_file());
        assert_eq!(path, tmp.path().join("deeply/nested/_images/diagram-abc.svg"));
    }

    #[test]
    fn test_read_back() {
        let tmp = TempDir::new().unwrap();
        let cache = ArtifactCache::new(tmp.path());

        cache.store("a.svg", b"<svg>x</svg>").unwrap();
        assert_eq!(cache.read("a.svg").unwrap(), b"<svg>x</svg>".to_vec());
        assert_eq!(cache.read_string("a.svg").unwrap(), "<svg>x</svg>");
    }

    #[test]
    fn test_store_overwrites() {
        let tmp = TempDir::new().unwrap();
        let cache = ArtifactCache::new(tmp.path());

        cache.store("a.png", b"first").unwrap();
        cache.store("a.png", b"second").unwrap();
        assert_eq!(cache.read("a.png").unwrap(), b"second".to_vec());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let cache = ArtifactCache::new(tmp.path().join("_images"));

        cache.store("a.png", b"bytes").unwrap();
        cache.store("b.png", b"bytes").unwrap();

        let names: Vec<String> = fs::read_dir(cache.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_contains_ignores_directories() {
        let tmp = TempDir::new().unwrap();
        let cache = ArtifactCache::new(tmp.path());

        fs::create_dir_all(cache.path_of("diagram-abc.png")).unwrap();
        assert!(!cache.contains("diagram-abc.png"));
    }

    #[test]
    fn test_read_missing_artifact_errors() {
        let tmp = TempDir::new().unwrap();
        let cache = ArtifactCache::new(tmp.path());

        assert!(cache.read("missing.png").is_err());
    }
}
