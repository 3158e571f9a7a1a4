use thiserror::Error;

/// Top-level error surfacing the first failing stage's message verbatim
/// (§7), composing every crate-local error family via `#[from]`, matching
/// the teacher's layered `Error` idiom at the client-facing boundary.
#[derive(Debug, Error)]
pub enum DistmanError {
    #[error(transparent)]
    Manifest(#[from] distman_manifest::ManifestError),

    #[error(transparent)]
    Resolution(#[from] distman_resolver::ResolutionError),

    #[error(transparent)]
    Ops(#[from] distman_ops::OpsError),

    #[error(transparent)]
    Fetch(#[from] distman_fetch::FetchError),

    #[error(transparent)]
    Fs(#[from] distman_fs::FsError),

    #[error(transparent)]
    Metadata(#[from] distman_metadata::MetadataError),

    #[error("invalid constraint `{0}`")]
    InvalidConstraint(String),

    #[error("no installed dist matches `{0}`")]
    NoMatch(String),
}
