use thiserror::Error;

/// Resolution failures abort the resolver call outright (§7's "Resolution"
/// error kind); there is no partial result to recover.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("no suitable dist for {0}")]
    NoCandidate(String),

    #[error("{blocked} blocked by {blocker}")]
    Blocked { blocked: String, blocker: String },
}
