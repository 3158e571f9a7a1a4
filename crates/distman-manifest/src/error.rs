use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(transparent)]
    Fetch(#[from] distman_fetch::FetchError),

    #[error(transparent)]
    Fs(#[from] distman_fs::FsError),

    #[error(transparent)]
    Metadata(#[from] distman_metadata::MetadataError),
}
