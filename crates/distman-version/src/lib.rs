//! Version tokenization, comparison, and constraint parsing.
//!
//! Versions and dist names share a character class: lowercase alphanumerics plus
//! `.`, `:`, `_`, and `-`. A `NameConstraint` is a name plus zero or more `(op,
//! version)` pairs parsed out of a single compact string such as `"name>=1.2<2"`.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid name `{0}`: must be lowercase alphanumeric plus '.', ':', '_', '-'")]
    InvalidName(String),
    #[error("invalid version `{0}`: must be lowercase alphanumeric plus '.', ':', '_', '-'")]
    InvalidVersion(String),
    #[error("malformed constraint `{0}`")]
    MalformedConstraint(String),
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
}

/// One `.`/`-`-delimited piece of a version string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Numeric(u64),
    Lexical(String),
}

impl Token {
    fn parse(piece: &str) -> Token {
        if !piece.is_empty() && piece.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = piece.parse::<u64>() {
                return Token::Numeric(n);
            }
        }
        Token::Lexical(piece.to_string())
    }

    fn as_comparable_str(&self) -> String {
        match self {
            Token::Numeric(n) => n.to_string(),
            Token::Lexical(s) => s.clone(),
        }
    }
}

fn tokenize(version: &str) -> Vec<Token> {
    version
        .split(['.', '-'])
        .map(Token::parse)
        .collect()
}

fn compare_tokens(a: &Token, b: &Token) -> Ordering {
    match (a, b) {
        (Token::Numeric(x), Token::Numeric(y)) => x.cmp(y),
        _ => a.as_comparable_str().cmp(&b.as_comparable_str()),
    }
}

/// Compare two version strings per the tokenized rule in the component design:
/// corresponding tokens compare numerically if both are numeric, lexically
/// otherwise. A missing token compares lower than a present *numeric* token (so
/// `"1.2" < "1.2.3"`), but higher than a present *lexical* token (so
/// `"1.0" > "1.0-beta"`, keeping a plain release ahead of its own pre-release
/// suffix — see `DESIGN.md` for why this is the resolved reading of the spec).
pub fn compare(a: &str, b: &str) -> Ordering {
    let ta = tokenize(a);
    let tb = tokenize(b);
    let len = ta.len().max(tb.len());
    for i in 0..len {
        let ord = match (ta.get(i), tb.get(i)) {
            (Some(x), Some(y)) => compare_tokens(x, y),
            (Some(x), None) => match x {
                Token::Numeric(_) => Ordering::Greater,
                Token::Lexical(_) => Ordering::Less,
            },
            (None, Some(y)) => match y {
                Token::Numeric(_) => Ordering::Less,
                Token::Lexical(_) => Ordering::Greater,
            },
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Equality as defined in the component design: componentwise token equality
/// after tokenization (so `"1.00"` equals `"1.0"`).
pub fn version_eq(a: &str, b: &str) -> bool {
    compare(a, b) == Ordering::Equal
}

const VALID_CHARS: &str = "abcdefghijklmnopqrstuvwxyz0123456789.:_-";

/// Validate the shared name/version character class: lowercase alphanumerics
/// plus `.`, `:`, `_`, `-`.
pub fn is_valid_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| VALID_CHARS.contains(c))
}

pub fn validate_name(s: &str) -> Result<(), VersionError> {
    if is_valid_token(s) {
        Ok(())
    } else {
        Err(VersionError::InvalidName(s.to_string()))
    }
}

pub fn validate_version(s: &str) -> Result<(), VersionError> {
    if is_valid_token(s) {
        Ok(())
    } else {
        Err(VersionError::InvalidVersion(s.to_string()))
    }
}

/// One of `=` `==` `<` `<=` `>` `>=` `~=` `!=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
}

impl Operator {
    /// Operators ordered longest-first so a greedy prefix scan never mistakes
    /// `>=` for `>`.
    const TOKENS: &'static [(&'static str, Operator)] = &[
        ("==", Operator::Eq),
        ("~=", Operator::Ne),
        ("!=", Operator::Ne),
        ("<=", Operator::Le),
        (">=", Operator::Ge),
        ("=", Operator::Eq),
        ("<", Operator::Lt),
        (">", Operator::Gt),
    ];

    fn starts(s: &str) -> Option<(&'static str, Operator)> {
        Self::TOKENS
            .iter()
            .find(|(tok, _)| s.starts_with(tok))
            .copied()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "==",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Ne => "!=",
        };
        f.write_str(s)
    }
}

/// A parsed `"<name> [<op> <ver>]..."` entry. The empty constraint (no `(op,
/// version)` pairs) matches every version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConstraint {
    pub name: String,
    pub terms: Vec<(Operator, String)>,
}

impl NameConstraint {
    /// Parse a compact constraint string such as `"name>=1.2<2"`. Operators may
    /// be concatenated directly with no separating punctuation; order within
    /// the string has no bearing on satisfaction (each term is independently
    /// conjunctive).
    pub fn parse(s: &str) -> Result<NameConstraint, VersionError> {
        let first_op = (0..s.len())
            .filter(|&i| s.is_char_boundary(i))
            .find_map(|i| Operator::starts(&s[i..]).map(|_| i));

        let (name, mut rest) = match first_op {
            Some(idx) => (&s[..idx], &s[idx..]),
            None => (s, ""),
        };
        validate_name(name)?;

        let mut terms = Vec::new();
        while !rest.is_empty() {
            let (tok, op) = Operator::starts(rest)
                .ok_or_else(|| VersionError::MalformedConstraint(s.to_string()))?;
            rest = &rest[tok.len()..];

            let next_op = (0..rest.len())
                .filter(|&i| rest.is_char_boundary(i))
                .find_map(|i| Operator::starts(&rest[i..]).map(|_| i))
                .unwrap_or(rest.len());
            let ver = &rest[..next_op];
            if ver.is_empty() {
                return Err(VersionError::MalformedConstraint(s.to_string()));
            }
            validate_version(ver)?;
            terms.push((op, ver.to_string()));
            rest = &rest[next_op..];
        }

        Ok(NameConstraint {
            name: name.to_string(),
            terms,
        })
    }

    /// An unconstrained reference to `name`, matching every version.
    pub fn any(name: impl Into<String>) -> NameConstraint {
        NameConstraint {
            name: name.into(),
            terms: Vec::new(),
        }
    }

    /// Whether `version` satisfies every term of this constraint. An empty
    /// constraint is satisfied by any version.
    pub fn satisfied_by(&self, version: &str) -> bool {
        self.terms.iter().all(|(op, reference)| {
            let ord = compare(version, reference);
            match op {
                Operator::Eq => ord == Ordering::Equal,
                Operator::Ne => ord != Ordering::Equal,
                Operator::Lt => ord == Ordering::Less,
                Operator::Le => ord != Ordering::Greater,
                Operator::Gt => ord == Ordering::Greater,
                Operator::Ge => ord != Ordering::Less,
            }
        })
    }
}

impl fmt::Display for NameConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (op, ver) in &self.terms {
            write!(f, "{op}{ver}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_tokens_compare_numerically() {
        assert_eq!(compare("1.10", "1.2"), Ordering::Greater);
    }

    #[test]
    fn release_outranks_its_own_lexical_suffix() {
        assert_eq!(compare("1.0", "1.0-beta"), Ordering::Greater);
    }

    #[test]
    fn shorter_numeric_continuation_is_lower() {
        assert_eq!(compare("1.2", "1.2.3"), Ordering::Less);
    }

    #[test]
    fn equal_after_tokenization() {
        assert!(version_eq("1.0", "1.0"));
        assert_eq!(compare("1.00", "1.0"), Ordering::Equal);
    }

    #[test]
    fn split_constraint() {
        let c = NameConstraint::parse("name>=1.2<2").unwrap();
        assert_eq!(c.name, "name");
        assert_eq!(
            c.terms,
            vec![
                (Operator::Ge, "1.2".to_string()),
                (Operator::Lt, "2".to_string()),
            ]
        );
    }

    #[test]
    fn bare_name_has_no_terms() {
        let c = NameConstraint::parse("widget").unwrap();
        assert_eq!(c.name, "widget");
        assert!(c.terms.is_empty());
        assert!(c.satisfied_by("anything-1.0"));
    }

    #[test]
    fn satisfaction_ignores_term_order_in_source() {
        let a = NameConstraint::parse("lib>=1.0<2.0").unwrap();
        let b = NameConstraint::parse("lib<2.0>=1.0").unwrap();
        for v in ["1.0", "1.5", "1.9.9"] {
            assert_eq!(a.satisfied_by(v), b.satisfied_by(v));
            assert!(a.satisfied_by(v));
        }
        assert!(!a.satisfied_by("2.0"));
        assert!(!a.satisfied_by("0.9"));
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(validate_name("Name").is_err());
        assert!(validate_name("name$").is_err());
        assert!(validate_version("1.0+build").is_err());
    }
}
