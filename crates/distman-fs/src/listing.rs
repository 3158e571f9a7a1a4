use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::FsError;

/// Join `base` and `rel` the way deploy/pack need: `rel` is always treated as
/// relative even if it looks absolute, so a malformed `files` entry can never
/// escape the destination tree by itself (path traversal via `..` is still
/// possible and is the caller's responsibility to reject, per §4.5).
pub fn join(base: &Path, rel: &str) -> PathBuf {
    base.join(rel.trim_start_matches(['/', '\\']))
}

/// List every regular file under `root`, depth-first, returning paths
/// relative to `root` with forward slashes regardless of host platform so
/// that `files` entries in a packed `dist.info` are portable (§4.6).
pub fn list_recursive(root: &Path) -> Result<Vec<PathBuf>, FsError> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let io_err = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("walkdir error"));
            FsError::io(path, io_err)
        })?;
        if entry.file_type().is_file() {
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_path_buf();
            out.push(rel);
        }
    }
    Ok(out)
}

/// Render a relative path with forward slashes, for storing in a dist's
/// `files` list independent of the platform that packed it.
pub fn to_portable(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// True if `dir` has no entries left in it. Used by delete to prune empty
/// parent directories after removing a dist's files (§4.5).
pub fn is_empty_dir(dir: &Path) -> Result<bool, FsError> {
    let mut entries = fs_err::read_dir(dir).map_err(|e| FsError::io(dir, e))?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn join_treats_rel_as_relative_even_with_leading_slash() {
        let base = Path::new("/opt/dist");
        assert_eq!(join(base, "/bin/widget"), PathBuf::from("/opt/dist/bin/widget"));
    }

    #[test]
    fn list_recursive_finds_nested_files_in_order() {
        let dir = tempdir().unwrap();
        fs_err::create_dir_all(dir.path().join("lib")).unwrap();
        fs_err::write(dir.path().join("a.txt"), b"a").unwrap();
        fs_err::write(dir.path().join("lib/b.txt"), b"b").unwrap();

        let files = list_recursive(dir.path()).unwrap();
        let rendered: Vec<String> = files.iter().map(|p| to_portable(p)).collect();
        assert_eq!(rendered, vec!["a.txt".to_string(), "lib/b.txt".to_string()]);
    }

    #[test]
    fn empty_dir_is_detected() {
        let dir = tempdir().unwrap();
        assert!(is_empty_dir(dir.path()).unwrap());
        fs_err::write(dir.path().join("f"), b"x").unwrap();
        assert!(!is_empty_dir(dir.path()).unwrap());
    }
}
