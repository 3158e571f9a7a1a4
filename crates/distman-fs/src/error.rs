use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("I/O error at `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error("archive `{0}` has no member matching `{1}`")]
    MemberNotFound(PathBuf, String),

    #[error("member `{0}` in `{1}` is not valid UTF-8")]
    NonUtf8Member(String, PathBuf),
}

impl FsError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> FsError {
        FsError::Io {
            path: path.into(),
            source,
        }
    }
}
