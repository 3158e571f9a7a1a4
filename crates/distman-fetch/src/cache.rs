use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use md5::{Digest, Md5};

use crate::error::FetchError;

/// The on-disk cache is URL-keyed and content-blind (§4.6): a fresh fetch for
/// a given URL always replaces whatever was cached for that URL, and nothing
/// validates against server-side ETag/Last-Modified (Open Question — cache
/// staleness, resolved to "no revalidation" since the request carries no
/// conditional headers).
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
    ttl: Option<Duration>,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>, ttl: Option<Duration>) -> DiskCache {
        DiskCache {
            root: root.into(),
            ttl,
        }
    }

    fn key(url: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(url.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.root.join(Self::key(url))
    }

    /// Return the cached bytes for `url` if a cache is configured, an entry
    /// exists, and it is younger than the configured TTL.
    pub fn fresh(&self, url: &str) -> Result<Option<Vec<u8>>, FetchError> {
        let Some(ttl) = self.ttl else {
            return Ok(None);
        };
        let path = self.entry_path(url);
        let metadata = match fs_err::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FetchError::io(&path, e)),
        };
        let modified = metadata
            .modified()
            .map_err(|e| FetchError::io(&path, e))?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::MAX);
        if age > ttl {
            return Ok(None);
        }
        let bytes = fs_err::read(&path).map_err(|e| FetchError::io(&path, e))?;
        Ok(Some(bytes))
    }

    /// Store `bytes` for `url`, writing through a sibling `.part` file and
    /// renaming into place so a reader never observes a half-written entry
    /// (§5's partial-download discipline, reused here for cache writes).
    pub fn store(&self, url: &str, bytes: &[u8]) -> Result<(), FetchError> {
        if self.ttl.is_none() {
            return Ok(());
        }
        fs_err::create_dir_all(&self.root).map_err(|e| FetchError::io(&self.root, e))?;
        let final_path = self.entry_path(url);
        let part_path = final_path.with_extension("part");
        fs_err::write(&part_path, bytes).map_err(|e| FetchError::io(&part_path, e))?;
        fs_err::rename(&part_path, &final_path).map_err(|e| FetchError::io(&final_path, e))?;
        Ok(())
    }
}

/// The default cache root, matching §4.6's `<temp>/luadist_cache` layout
/// under this project's own name.
pub fn default_cache_root() -> PathBuf {
    std::env::temp_dir().join("distman_cache")
}

pub fn atomic_write(dest: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    if let Some(parent) = dest.parent() {
        fs_err::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
    }
    let part_path = dest.with_extension(match dest.extension() {
        Some(ext) => format!("{}.part", ext.to_string_lossy()),
        None => "part".to_string(),
    });
    fs_err::write(&part_path, bytes).map_err(|e| FetchError::io(&part_path, e))?;
    fs_err::rename(&part_path, dest).map_err(|e| FetchError::io(dest, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cache_miss_without_ttl() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), None);
        cache.store("http://example.invalid/x", b"data").unwrap();
        assert_eq!(cache.fresh("http://example.invalid/x").unwrap(), None);
    }

    #[test]
    fn cache_hit_within_ttl() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), Some(Duration::from_secs(3600)));
        cache.store("http://example.invalid/x", b"data").unwrap();
        assert_eq!(
            cache.fresh("http://example.invalid/x").unwrap(),
            Some(b"data".to_vec())
        );
    }

    #[test]
    fn cache_miss_when_expired() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), Some(Duration::from_secs(0)));
        cache.store("http://example.invalid/x", b"data").unwrap();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.fresh("http://example.invalid/x").unwrap(), None);
    }

    #[test]
    fn atomic_write_creates_parent_and_final_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("nested/out.bin");
        atomic_write(&dest, b"payload").unwrap();
        assert_eq!(fs_err::read(&dest).unwrap(), b"payload");
        assert!(!dest.with_extension("bin.part").exists());
    }
}
