use std::path::PathBuf;
use std::process::Output;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpsError {
    #[error(transparent)]
    Fs(#[from] distman_fs::FsError),

    #[error(transparent)]
    Fetch(#[from] distman_fetch::FetchError),

    #[error(transparent)]
    Metadata(#[from] distman_metadata::MetadataError),

    #[error("dist `{0}` has no path to unpack from")]
    MissingPath(String),

    #[error("rejected `{name}-{version}`: arch `{arch}` is not Universal or the host arch")]
    ArchMismatch {
        name: String,
        version: String,
        arch: String,
    },

    #[error("rejected `{name}-{version}`: type `{kind}` is neither the host type, `all`, nor `source`")]
    TypeMismatch {
        name: String,
        version: String,
        kind: String,
    },

    #[error("failed to run {0}")]
    CommandFailed(PathBuf, #[source] std::io::Error),

    #[error("{step} failed:\n--- stdout:\n{stdout}\n--- stderr:\n{stderr}\n---")]
    BuildStep {
        step: &'static str,
        stdout: String,
        stderr: String,
    },
}

impl OpsError {
    pub fn from_output(step: &'static str, output: &Output) -> OpsError {
        OpsError::BuildStep {
            step,
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}
