use std::io::{BufWriter, Read, Write};
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use tracing::instrument;

use crate::error::FsError;
use crate::listing::{list_recursive, to_portable};

/// File and directory name patterns excluded from packing: VCS metadata and
/// editor/OS scratch files have no business in a distributed archive (§4.6).
pub const PACK_EXCLUDE_GLOBS: &[&str] = &[".git", ".svn", "*~", ".DS_Store"];

fn is_excluded(name: &str) -> bool {
    PACK_EXCLUDE_GLOBS.iter().any(|pat| match pat.strip_prefix('*') {
        Some(suffix) => name.ends_with(suffix),
        None => name == *pat || name.starts_with(&format!("{pat}.")),
    })
}

/// The archive subsystem boundary (§2): everything the rest of the crate
/// needs from a dist archive goes through this trait so an alternate archive
/// format can be swapped in without touching callers.
pub trait ArchiveDriver: Send + Sync {
    /// Extract every regular file in `archive` into `dest`, creating parent
    /// directories as needed. Zip-slip is prevented by only trusting
    /// `enclosed_name` (§4.3, §4.5).
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), FsError>;

    /// Create `archive` from the contents of `src_dir`, skipping any path
    /// component matching `PACK_EXCLUDE_GLOBS`.
    fn create(&self, archive: &Path, src_dir: &Path) -> Result<(), FsError>;

    /// Find the first member whose path ends with `suffix`, used to locate a
    /// `dist.info` at an unknown depth inside a downloaded archive (§4.3).
    fn find_member(&self, archive: &Path, suffix: &str) -> Result<Option<String>, FsError>;

    /// Read one member's contents as UTF-8 text.
    fn read_member(&self, archive: &Path, member: &str) -> Result<String, FsError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiveDriver;

impl ArchiveDriver for ZipArchiveDriver {
    #[instrument(skip(self))]
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), FsError> {
        let file = fs_err::File::open(archive).map_err(|e| FsError::io(archive, e))?;
        let mut zip = ZipArchive::new(file)?;

        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            let Some(relative) = entry.enclosed_name() else {
                continue;
            };
            let out_path = dest.join(&relative);

            if entry.name().ends_with('/') {
                fs_err::create_dir_all(&out_path).map_err(|e| FsError::io(&out_path, e))?;
                continue;
            }
            if let Some(parent) = out_path.parent() {
                fs_err::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
            }
            let mut out_file = BufWriter::new(
                fs_err::File::create(&out_path).map_err(|e| FsError::io(&out_path, e))?,
            );
            std::io::copy(&mut entry, &mut out_file).map_err(|e| FsError::io(&out_path, e))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    fs_err::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))
                        .map_err(|e| FsError::io(&out_path, e))?;
                }
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn create(&self, archive: &Path, src_dir: &Path) -> Result<(), FsError> {
        let file = fs_err::File::create(archive).map_err(|e| FsError::io(archive, e))?;
        let mut writer = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for rel in list_recursive(src_dir)? {
            if rel
                .components()
                .any(|c| is_excluded(&c.as_os_str().to_string_lossy()))
            {
                continue;
            }
            let name = to_portable(&rel);
            let abs = src_dir.join(&rel);
            let data = fs_err::read(&abs).map_err(|e| FsError::io(&abs, e))?;

            writer.start_file(&name, options)?;
            writer.write_all(&data).map_err(|e| FsError::io(archive, e))?;
        }

        writer.finish()?;
        Ok(())
    }

    fn find_member(&self, archive: &Path, suffix: &str) -> Result<Option<String>, FsError> {
        let file = fs_err::File::open(archive).map_err(|e| FsError::io(archive, e))?;
        let mut zip = ZipArchive::new(file)?;

        for i in 0..zip.len() {
            let entry = zip.by_index(i)?;
            if entry.name().ends_with(suffix) {
                return Ok(Some(entry.name().to_string()));
            }
        }
        Ok(None)
    }

    fn read_member(&self, archive: &Path, member: &str) -> Result<String, FsError> {
        let file = fs_err::File::open(archive).map_err(|e| FsError::io(archive, e))?;
        let mut zip = ZipArchive::new(file)?;
        let mut entry = zip
            .by_name(member)
            .map_err(|_| FsError::MemberNotFound(archive.to_path_buf(), member.to_string()))?;

        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|e| FsError::io(archive, e))?;
        Ok(text)
    }
}
