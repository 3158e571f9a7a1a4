use std::path::{Path, PathBuf};

use distman_fs::ArchiveDriver;
use distman_metadata::{serialize_dist_info, DistInfo};
use tracing::instrument;

use crate::error::OpsError;

/// Assemble a redistributable archive for an installed dist (§4.5 Pack):
/// collect the files recorded in `installed.files` from the per-dist
/// directory, stage them alongside a `dist.info` stripped of `path` and
/// `files`, and archive the staging directory.
#[instrument(skip(installed, archiver))]
pub fn pack(
    installed: &DistInfo,
    per_dist_dir: &Path,
    staging_root: &Path,
    dest_dir: &Path,
    archiver: &dyn ArchiveDriver,
) -> Result<PathBuf, OpsError> {
    let staging = staging_root.join(format!("{}-{}-pack", installed.name, installed.version));
    fs_err::create_dir_all(&staging).map_err(|e| distman_fs::FsError::io(&staging, e))?;

    let files = if installed.files.is_empty() {
        distman_fs::list_recursive(per_dist_dir)?
            .into_iter()
            .map(|p| distman_fs::to_portable(&p))
            .collect()
    } else {
        installed.files.clone()
    };

    for rel in &files {
        let from = per_dist_dir.join(rel);
        let to = staging.join(rel);
        if let Some(parent) = to.parent() {
            fs_err::create_dir_all(parent).map_err(|e| distman_fs::FsError::io(parent, e))?;
        }
        fs_err::copy(&from, &to).map_err(|e| distman_fs::FsError::io(&from, e))?;
    }

    let mut packed = installed.clone();
    packed.path = None;
    packed.files = Vec::new();
    let text = serialize_dist_info(&packed.to_fields());
    fs_err::write(staging.join("dist.info"), text)
        .map_err(|e| distman_fs::FsError::io(&staging, e))?;

    fs_err::create_dir_all(dest_dir).map_err(|e| distman_fs::FsError::io(dest_dir, e))?;
    let archive_path = dest_dir.join(format!("{}-{}.zip", installed.name, installed.version));
    archiver.create(&archive_path, &staging)?;

    Ok(archive_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use distman_fs::ZipArchiveDriver;
    use tempfile::tempdir;

    #[test]
    fn pack_collects_recorded_files_and_strips_metadata() {
        let root = tempdir().unwrap();
        let per_dist = root.path().join("per-dist");
        fs_err::create_dir_all(per_dist.join("bin")).unwrap();
        fs_err::write(per_dist.join("bin").join("widget"), b"binary").unwrap();

        let mut installed = DistInfo::new("widget", "1.0");
        installed.files = vec!["bin/widget".to_string()];
        installed.path = Some("/somewhere".to_string());

        let archiver = ZipArchiveDriver;
        let dest = root.path().join("out");
        let archive = pack(
            &installed,
            &per_dist,
            root.path(),
            &dest,
            &archiver,
        )
        .unwrap();

        assert!(archive.is_file());
        let member = archiver
            .find_member(&archive, "dist.info")
            .unwrap()
            .expect("dist.info present");
        let text = archiver.read_member(&archive, &member).unwrap();
        assert!(!text.contains("path"));
        assert!(!text.contains("files"));
    }
}
