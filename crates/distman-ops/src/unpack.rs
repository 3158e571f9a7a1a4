use std::path::{Path, PathBuf};

use distman_fetch::FetchClient;
use distman_fs::ArchiveDriver;
use distman_metadata::DistInfo;
use tracing::instrument;

use crate::error::OpsError;

/// Normalize a selected dist's `path` to a local extracted directory (§4.5):
/// already a directory passes through untouched, a local archive is
/// extracted, and anything else is treated as a remote URL and fetched
/// first.
#[instrument(skip(fetch, archiver))]
pub fn unpack(
    info: &DistInfo,
    work_root: &Path,
    fetch: &FetchClient,
    archiver: &dyn ArchiveDriver,
) -> Result<PathBuf, OpsError> {
    let path_str = info
        .path
        .clone()
        .ok_or_else(|| OpsError::MissingPath(format!("{}-{}", info.name, info.version)))?;
    let path = Path::new(&path_str);
    let staging = work_root.join(format!("{}-{}", info.name, info.version));

    if path.is_dir() {
        return Ok(path.to_path_buf());
    }

    if path.is_file() {
        archiver.extract(path, &staging)?;
        return Ok(staging);
    }

    let downloaded = fetch.download(&path_str, work_root)?;
    archiver.extract(&downloaded, &staging)?;
    Ok(staging)
}

#[cfg(test)]
mod tests {
    use super::*;
    use distman_fs::ZipArchiveDriver;
    use tempfile::tempdir;

    #[test]
    fn directory_path_passes_through() {
        let root = tempdir().unwrap();
        let pkg_dir = root.path().join("widget-1.0");
        fs_err::create_dir_all(&pkg_dir).unwrap();

        let mut info = DistInfo::new("widget", "1.0");
        info.path = Some(pkg_dir.to_string_lossy().into_owned());

        let fetch = FetchClient::builder()
            .cache_root(root.path().join("cache"))
            .build()
            .unwrap();
        let archiver = ZipArchiveDriver;

        let out = unpack(&info, root.path(), &fetch, &archiver).unwrap();
        assert_eq!(out, pkg_dir);
    }

    #[test]
    fn local_archive_path_is_extracted() {
        let root = tempdir().unwrap();
        let src = root.path().join("src");
        fs_err::create_dir_all(&src).unwrap();
        fs_err::write(src.join("dist.info"), b"name = \"widget\"\nversion = \"1.0\"\n").unwrap();

        let archiver = ZipArchiveDriver;
        let archive_path = root.path().join("widget-1.0.zip");
        archiver.create(&archive_path, &src).unwrap();

        let mut info = DistInfo::new("widget", "1.0");
        info.path = Some(archive_path.to_string_lossy().into_owned());

        let fetch = FetchClient::builder()
            .cache_root(root.path().join("cache"))
            .build()
            .unwrap();

        let out = unpack(&info, root.path(), &fetch, &archiver).unwrap();
        assert!(out.join("dist.info").is_file());
    }
}
