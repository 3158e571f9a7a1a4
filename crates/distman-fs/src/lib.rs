//! Portable filesystem primitives (§2): path joining and quoting, recursive
//! listing, archive handling, and symlink creation, behind a small `Platform`
//! capability set so the rest of the workspace never branches on
//! `cfg(windows)` directly.

mod archive;
mod error;
mod listing;
mod platform;

pub use archive::{ArchiveDriver, ZipArchiveDriver, PACK_EXCLUDE_GLOBS};
pub use error::FsError;
pub use listing::{is_empty_dir, join, list_recursive, to_portable};
pub use platform::{host_platform, Platform};

#[cfg(unix)]
pub use platform::PosixPlatform;
#[cfg(windows)]
pub use platform::WindowsPlatform;
