use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("unexpected character `{0}` in dist.info text")]
    UnexpectedChar(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated long-bracket string")]
    UnterminatedLongString,

    #[error("invalid numeric literal `{0}`")]
    InvalidNumber(String),

    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` had the wrong shape (expected {1})")]
    WrongShape(&'static str, &'static str),

    #[error("manifest text did not start with `return`")]
    NotAManifest,

    #[error("manifest text was missing the mandatory trailing `true` sentinel")]
    MissingSentinel,
}
