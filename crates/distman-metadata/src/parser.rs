use indexmap::IndexMap;

use crate::error::MetadataError;
use crate::lexer::{lex, Tok};
use crate::value::{Table, Value};

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let t = self.toks.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, want: &Tok) -> Result<(), MetadataError> {
        match self.bump() {
            Some(ref t) if t == want => Ok(()),
            _ => Err(MetadataError::UnexpectedToken(self.pos)),
        }
    }

    /// `ident` or `_G['key']`/`_G["key"]`.
    fn parse_key(&mut self) -> Result<String, MetadataError> {
        match self.bump() {
            Some(Tok::Ident(name)) if name == "_G" => {
                self.expect(&Tok::LBracket)?;
                let key = match self.bump() {
                    Some(Tok::Str(s)) => s,
                    _ => return Err(MetadataError::UnexpectedToken(self.pos)),
                };
                self.expect(&Tok::RBracket)?;
                Ok(key)
            }
            Some(Tok::Ident(name)) => Ok(name),
            _ => Err(MetadataError::UnexpectedToken(self.pos)),
        }
    }

    fn parse_value(&mut self) -> Result<Value, MetadataError> {
        match self.bump() {
            Some(Tok::Str(s)) => Ok(Value::Str(s)),
            Some(Tok::Num(n)) => Ok(Value::Num(n)),
            Some(Tok::True) => Ok(Value::Str("true".to_string())),
            Some(Tok::LBrace) => self.parse_table(),
            _ => Err(MetadataError::UnexpectedToken(self.pos)),
        }
    }

    /// Parses the contents of a table after the opening `{` has been consumed.
    fn parse_table(&mut self) -> Result<Value, MetadataError> {
        let mut list = Vec::new();
        let mut map = IndexMap::new();

        loop {
            if matches!(self.peek(), Some(Tok::RBrace)) {
                self.bump();
                break;
            }

            match self.peek() {
                Some(Tok::LBracket) => {
                    self.bump();
                    let key = match self.bump() {
                        Some(Tok::Str(s)) => s,
                        _ => return Err(MetadataError::UnexpectedToken(self.pos)),
                    };
                    self.expect(&Tok::RBracket)?;
                    self.expect(&Tok::Eq)?;
                    let value = self.parse_value()?;
                    map.insert(key, value);
                }
                Some(Tok::Ident(name)) if name == "_G" => {
                    let key = self.parse_key()?;
                    self.expect(&Tok::Eq)?;
                    let value = self.parse_value()?;
                    map.insert(key, value);
                }
                Some(Tok::Ident(_))
                    if matches!(self.toks.get(self.pos + 1), Some(Tok::Eq)) =>
                {
                    let key = self.parse_key()?;
                    self.expect(&Tok::Eq)?;
                    let value = self.parse_value()?;
                    map.insert(key, value);
                }
                Some(_) => {
                    let value = self.parse_value()?;
                    list.push(value);
                }
                None => return Err(MetadataError::UnexpectedEof),
            }

            match self.peek() {
                Some(Tok::Comma) => {
                    self.bump();
                }
                Some(Tok::RBrace) => {
                    self.bump();
                    break;
                }
                _ => return Err(MetadataError::UnexpectedToken(self.pos)),
            }
        }

        Ok(Value::Table(Table { list, map }))
    }
}

/// Parse a `dist.info`-shaped text: a sequence of top-level `key = value`
/// assignments evaluated in an empty scope (no ambient bindings are ever
/// exposed, since this is a dedicated parser and not an interpreter).
pub fn parse_dist_info(text: &str) -> Result<IndexMap<String, Value>, MetadataError> {
    let toks = lex(text)?;
    let mut p = Parser { toks, pos: 0 };
    let mut out = IndexMap::new();

    while p.peek().is_some() {
        let key = p.parse_key()?;
        p.expect(&Tok::Eq)?;
        let value = p.parse_value()?;
        out.insert(key, value);
        while matches!(p.peek(), Some(Tok::Comma)) {
            p.bump();
        }
    }

    Ok(out)
}

/// Parse a `dist.manifest`-shaped text: `return { <dist tables> }true`. The
/// trailing `true` is a mandatory historical sentinel; it is consumed here
/// and has no effect on the result.
pub fn parse_manifest(text: &str) -> Result<Vec<IndexMap<String, Value>>, MetadataError> {
    let toks = lex(text)?;
    let mut p = Parser { toks, pos: 0 };

    match p.bump() {
        Some(Tok::Return) => {}
        _ => return Err(MetadataError::NotAManifest),
    }
    p.expect(&Tok::LBrace)?;
    let table = match p.parse_table()? {
        Value::Table(t) => t,
        _ => unreachable!("parse_table always returns Value::Table"),
    };
    match p.bump() {
        Some(Tok::True) => {}
        _ => return Err(MetadataError::MissingSentinel),
    }

    table
        .list
        .into_iter()
        .map(|v| match v {
            Value::Table(t) => Ok(t.map),
            _ => Err(MetadataError::WrongShape("manifest entry", "table")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_assignments() {
        let text = r#"name = "widget"
version = "1.0"
"#;
        let m = parse_dist_info(text).unwrap();
        assert_eq!(m.get("name").unwrap().as_str(), Some("widget"));
        assert_eq!(m.get("version").unwrap().as_str(), Some("1.0"));
    }

    #[test]
    fn parses_g_table_key() {
        let text = r#"_G['weird.key'] = "value""#;
        let m = parse_dist_info(text).unwrap();
        assert_eq!(m.get("weird.key").unwrap().as_str(), Some("value"));
    }

    #[test]
    fn parses_nested_list() {
        let text = r#"depends = { "a", "b" }"#;
        let m = parse_dist_info(text).unwrap();
        let t = m.get("depends").unwrap().as_table().unwrap();
        assert_eq!(t.list.len(), 2);
        assert!(t.map.is_empty());
    }

    #[test]
    fn parses_hybrid_table() {
        let text = r#"depends = { "common", Windows = { binary = { "win-only" } } }"#;
        let m = parse_dist_info(text).unwrap();
        let t = m.get("depends").unwrap().as_table().unwrap();
        assert_eq!(t.list.len(), 1);
        assert!(t.map.contains_key("Windows"));
    }

    #[test]
    fn parses_manifest_with_sentinel() {
        let text = r#"return { { name = "a", version = "1.0" } }true"#;
        let entries = parse_manifest(text).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].get("name").unwrap().as_str(), Some("a"));
    }

    #[test]
    fn rejects_manifest_without_sentinel() {
        let text = r#"return { { name = "a" } }"#;
        assert_eq!(parse_manifest(text), Err(MetadataError::MissingSentinel));
    }
}
