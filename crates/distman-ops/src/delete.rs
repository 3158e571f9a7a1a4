use std::path::{Path, PathBuf};

use distman_fs::Platform;
use distman_metadata::DistInfo;
use tracing::instrument;

use crate::error::OpsError;

/// Remove an installed dist from deployment `D` (§4.5 Delete), grounded on
/// the reverse-order prune pattern a wheel uninstaller uses: delete every
/// recorded file under `D` (this reaches through a top-level symlink into
/// the per-dist directory just as well as a top-level copy), then walk each
/// file's ancestor chain up to `deployment_root` removing directories left
/// empty, then finally remove the per-dist directory itself.
#[instrument(skip(installed, platform))]
pub fn delete(
    installed: &DistInfo,
    deployment_root: &Path,
    platform: &dyn Platform,
) -> Result<(), OpsError> {
    let per_dist_dir = deployment_root
        .join("dists")
        .join(format!("{}-{}", installed.name, installed.version));

    let mut touched_dirs: Vec<PathBuf> = Vec::new();
    for rel in installed.files.iter().rev() {
        let target = deployment_root.join(rel);
        match fs_err::symlink_metadata(&target) {
            Ok(meta) if meta.file_type().is_symlink() => {
                platform.delete_file(&target)?;
            }
            Ok(meta) if meta.is_dir() => {
                // A top-level entry that was copied in as a directory and
                // has no individually-recorded nested files left to delete.
                if distman_fs::is_empty_dir(&target)? {
                    platform.delete_dir(&target)?;
                }
            }
            Ok(_) => {
                platform.delete_file(&target)?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(distman_fs::FsError::io(&target, e).into()),
        }

        if let Some(parent) = target.parent() {
            touched_dirs.push(parent.to_path_buf());
        }
    }

    touched_dirs.sort();
    touched_dirs.dedup();
    touched_dirs.sort_by_key(|p| std::cmp::Reverse(p.components().count()));
    for dir in touched_dirs {
        if dir == deployment_root || !dir.starts_with(deployment_root) {
            continue;
        }
        match fs_err::symlink_metadata(&dir) {
            Ok(meta) if meta.file_type().is_symlink() => {
                // A top-level entry symlinked straight into the now-emptied
                // per-dist directory; drop the link itself rather than
                // trying to rmdir through it.
                if distman_fs::is_empty_dir(&dir).unwrap_or(false) {
                    platform.delete_file(&dir)?;
                }
            }
            Ok(_) if distman_fs::is_empty_dir(&dir)? => {
                platform.delete_dir(&dir)?;
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(distman_fs::FsError::io(&dir, e).into()),
        }
    }

    if per_dist_dir.is_dir() {
        fs_err::remove_dir_all(&per_dist_dir).map_err(|e| distman_fs::FsError::io(&per_dist_dir, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use distman_fs::host_platform;
    use tempfile::tempdir;

    #[test]
    fn delete_removes_copied_files_and_prunes_empty_dirs() {
        let root = tempdir().unwrap();
        let deployment_root = root.path().join("D");
        fs_err::create_dir_all(deployment_root.join("bin")).unwrap();
        fs_err::write(deployment_root.join("bin").join("widget"), b"binary").unwrap();

        let per_dist_dir = deployment_root
            .join("dists")
            .join("widget-1.0");
        fs_err::create_dir_all(per_dist_dir.join("bin")).unwrap();
        fs_err::write(per_dist_dir.join("bin").join("widget"), b"binary").unwrap();
        fs_err::write(per_dist_dir.join("dist.info"), b"name=\"widget\"\n").unwrap();

        let mut installed = DistInfo::new("widget", "1.0");
        installed.files = vec!["bin/widget".to_string()];

        let platform = host_platform();
        delete(&installed, &deployment_root, platform.as_ref()).unwrap();

        assert!(!deployment_root.join("bin").join("widget").exists());
        assert!(!deployment_root.join("bin").exists());
        assert!(!per_dist_dir.exists());
    }

    #[test]
    fn delete_unlinks_symlinked_top_level_entries() {
        let root = tempdir().unwrap();
        let deployment_root = root.path().join("D");
        let per_dist_dir = deployment_root.join("dists").join("widget-1.0");
        fs_err::create_dir_all(per_dist_dir.join("bin")).unwrap();
        fs_err::write(per_dist_dir.join("bin").join("widget"), b"binary").unwrap();
        fs_err::create_dir_all(&deployment_root).unwrap();

        let platform = host_platform();
        platform
            .symlink(&per_dist_dir.join("bin"), &deployment_root.join("bin"))
            .unwrap();

        let mut installed = DistInfo::new("widget", "1.0");
        installed.files = vec!["bin/widget".to_string()];

        delete(&installed, &deployment_root, platform.as_ref()).unwrap();

        assert!(!deployment_root.join("bin").exists());
        assert!(!per_dist_dir.exists());
    }
}
