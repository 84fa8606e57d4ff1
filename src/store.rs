//! Image directory
//!
//! Uploads and generated images share one flat directory which is also
//! served under `/img/`. Files are named `<random>.<ext>` and are never
//! removed by the server.

use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const NAME_PREFIX: &str = "img_";
const RANDOM_CHARS: usize = 12;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid image name '{0}'")]
    InvalidName(String),

    #[error("image '{0}' not found")]
    NotFound(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Extension of a client-supplied or stored filename, without the dot
///
/// Only non-empty ASCII alphanumeric extensions are accepted so the value can
/// be used in generated filenames and URLs as-is.
pub fn extension_of(filename: &str) -> Option<&str> {
    let ext = Path::new(filename).extension()?.to_str()?;
    (!ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
}

/// A stored name must be one plain path component
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Persist `data` under a fresh unique name ending in `.{ext}`
    ///
    /// Returns the bare filename.
    pub async fn save(&self, data: Vec<u8>, ext: &str) -> Result<String, StoreError> {
        let dir = self.dir.clone();
        let suffix = format!(".{ext}");

        let path = tokio::task::spawn_blocking(move || -> std::io::Result<PathBuf> {
            let mut file = tempfile::Builder::new()
                .prefix(NAME_PREFIX)
                .suffix(&suffix)
                .rand_bytes(RANDOM_CHARS)
                .tempfile_in(&dir)?;
            file.write_all(&data)?;
            file.flush()?;
            let (_, path) = file.keep()?;
            Ok(path)
        })
        .await
        .map_err(std::io::Error::other)??;

        path.file_name()
            .and_then(|n| n.to_str())
            .map(ToString::to_string)
            .ok_or_else(|| StoreError::InvalidName(path.display().to_string()))
    }

    /// Map a request-supplied name to an existing file inside the directory
    pub async fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        if !is_safe_name(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        let path = self.dir.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StoreError::NotFound(name.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Read a stored image, returning its bytes and extension
    pub async fn load(&self, name: &str) -> Result<(Vec<u8>, String), StoreError> {
        let ext = extension_of(name).ok_or_else(|| StoreError::InvalidName(name.to_string()))?;
        let path = self.resolve(name).await?;
        let data = tokio::fs::read(&path).await?;
        Ok((data, ext.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("cat.jpg"), Some("jpg"));
        assert_eq!(extension_of("archive.tar.PNG"), Some("PNG"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("trailing."), None);
        assert_eq!(extension_of(".hidden"), None);
        assert_eq!(extension_of("weird.j p"), None);
    }

    #[test]
    fn test_safe_names() {
        assert!(is_safe_name("img_abc123.jpg"));
        assert!(!is_safe_name("../etc/passwd"));
        assert!(!is_safe_name("a/b.jpg"));
        assert!(!is_safe_name(".env"));
        assert!(!is_safe_name(""));
        assert!(!is_safe_name("x..png"));
    }

    #[tokio::test]
    async fn test_save_preserves_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let name = store.save(b"jpeg bytes".to_vec(), "jpg").await.unwrap();
        assert!(name.starts_with(NAME_PREFIX));
        assert_eq!(extension_of(&name), Some("jpg"));
        assert!(is_safe_name(&name));

        let (data, ext) = store.load(&name).await.unwrap();
        assert_eq!(data, b"jpeg bytes");
        assert_eq!(ext, "jpg");
    }

    #[tokio::test]
    async fn test_save_generates_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let a = store.save(vec![1], "png").await.unwrap();
        let b = store.save(vec![2], "png").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_resolve_rejects_unknown_and_unsafe() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        assert!(matches!(
            store.resolve("missing.png").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.resolve("../secret.png").await,
            Err(StoreError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("a/b/img"));
        store.ensure_dir().await.unwrap();
        assert!(store.dir().is_dir());
    }
}
