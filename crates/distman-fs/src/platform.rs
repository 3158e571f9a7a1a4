use std::path::Path;

use crate::error::FsError;

/// The filesystem component is polymorphic over a small capability set;
/// concrete implementations are selected once at construction rather than
/// branching on `cfg(windows)` throughout the rest of the crate (Design
/// Notes §9).
pub trait Platform: Send + Sync {
    /// Quote a string for safe inclusion in a shell command line on this
    /// platform.
    fn quote(&self, s: &str) -> String;

    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    fn move_path(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    fn delete_file(&self, path: &Path) -> Result<(), FsError>;

    /// Remove a directory; callers are responsible for only calling this on
    /// directories already known to be empty (see `distman_ops::delete`).
    fn delete_dir(&self, path: &Path) -> Result<(), FsError>;

    /// Create a symlink at `link` pointing at `original`.
    fn symlink(&self, original: &Path, link: &Path) -> Result<(), FsError>;
}

fn copy_file_impl(from: &Path, to: &Path) -> Result<(), FsError> {
    if let Some(parent) = to.parent() {
        fs_err::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
    }
    fs_err::copy(from, to).map_err(|e| FsError::io(from, e))?;
    Ok(())
}

fn move_path_impl(from: &Path, to: &Path) -> Result<(), FsError> {
    if let Some(parent) = to.parent() {
        fs_err::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
    }
    fs_err::rename(from, to).map_err(|e| FsError::io(from, e))
}

fn delete_file_impl(path: &Path) -> Result<(), FsError> {
    match fs_err::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FsError::io(path, e)),
    }
}

fn delete_dir_impl(path: &Path) -> Result<(), FsError> {
    match fs_err::remove_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FsError::io(path, e)),
    }
}

#[cfg(unix)]
mod unix {
    use super::*;

    #[derive(Debug, Default, Clone, Copy)]
    pub struct PosixPlatform;

    impl Platform for PosixPlatform {
        fn quote(&self, s: &str) -> String {
            if !s.is_empty()
                && s.bytes().all(|b| {
                    b.is_ascii_alphanumeric() || matches!(b, b'/' | b'.' | b'_' | b'-')
                })
            {
                s.to_string()
            } else {
                format!("'{}'", s.replace('\'', r"'\''"))
            }
        }

        fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FsError> {
            copy_file_impl(from, to)
        }

        fn move_path(&self, from: &Path, to: &Path) -> Result<(), FsError> {
            move_path_impl(from, to)
        }

        fn delete_file(&self, path: &Path) -> Result<(), FsError> {
            delete_file_impl(path)
        }

        fn delete_dir(&self, path: &Path) -> Result<(), FsError> {
            delete_dir_impl(path)
        }

        fn symlink(&self, original: &Path, link: &Path) -> Result<(), FsError> {
            if let Some(parent) = link.parent() {
                fs_err::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
            }
            std::os::unix::fs::symlink(original, link).map_err(|e| FsError::io(link, e))
        }
    }
}

#[cfg(windows)]
mod windows {
    use super::*;

    /// Windows has no single `symlink`: files and directories use distinct
    /// APIs, and creating either one typically requires an elevated process
    /// or Developer Mode. This is the platform override Design Notes §9
    /// calls out explicitly.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct WindowsPlatform;

    impl Platform for WindowsPlatform {
        fn quote(&self, s: &str) -> String {
            if !s.is_empty()
                && s.bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'\\' | b':' | b'.' | b'_' | b'-'))
            {
                s.to_string()
            } else {
                format!("\"{}\"", s.replace('"', "\"\""))
            }
        }

        fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FsError> {
            copy_file_impl(from, to)
        }

        fn move_path(&self, from: &Path, to: &Path) -> Result<(), FsError> {
            move_path_impl(from, to)
        }

        fn delete_file(&self, path: &Path) -> Result<(), FsError> {
            delete_file_impl(path)
        }

        fn delete_dir(&self, path: &Path) -> Result<(), FsError> {
            delete_dir_impl(path)
        }

        fn symlink(&self, original: &Path, link: &Path) -> Result<(), FsError> {
            if let Some(parent) = link.parent() {
                fs_err::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
            }
            if original.is_dir() {
                std::os::windows::fs::symlink_dir(original, link)
            } else {
                std::os::windows::fs::symlink_file(original, link)
            }
            .map_err(|e| FsError::io(link, e))
        }
    }
}

#[cfg(unix)]
pub use unix::PosixPlatform;
#[cfg(windows)]
pub use windows::WindowsPlatform;

/// The capability set implementation matching the host this binary was
/// built for.
pub fn host_platform() -> Box<dyn Platform> {
    #[cfg(unix)]
    {
        Box::new(PosixPlatform)
    }
    #[cfg(windows)]
    {
        Box::new(WindowsPlatform)
    }
}
