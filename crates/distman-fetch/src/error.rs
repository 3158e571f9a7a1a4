use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("I/O error at `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported URL scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("fetch of `{0}` returned HTTP {1}")]
    Status(String, reqwest::StatusCode),
}

impl FetchError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> FetchError {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }
}
