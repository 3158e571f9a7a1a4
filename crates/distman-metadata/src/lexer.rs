use crate::error::MetadataError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Ident(String),
    Str(String),
    Num(f64),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Eq,
    Comma,
    Return,
    True,
}

/// Tokenize dist.info / dist.manifest text. This is a small hand-written
/// lexer, not a general-purpose Lua one: it only understands the grammar
/// actually used by the format (assignments, table literals, `_G['key']`
/// keys, `[[...]]` long strings, `--` line comments).
pub(crate) fn lex(input: &str) -> Result<Vec<Tok>, MetadataError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    let mut toks = Vec::new();

    while i < bytes.len() {
        let c = bytes[i] as char;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '-' && bytes.get(i + 1) == Some(&b'-') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        match c {
            '{' => {
                toks.push(Tok::LBrace);
                i += 1;
            }
            '}' => {
                toks.push(Tok::RBrace);
                i += 1;
            }
            '[' if bytes.get(i + 1) == Some(&b'[') => {
                let start = i + 2;
                let end = input[start..]
                    .find("]]")
                    .map(|p| start + p)
                    .ok_or(MetadataError::UnterminatedLongString)?;
                toks.push(Tok::Str(input[start..end].to_string()));
                i = end + 2;
            }
            '[' => {
                toks.push(Tok::LBracket);
                i += 1;
            }
            ']' => {
                toks.push(Tok::RBracket);
                i += 1;
            }
            '=' => {
                toks.push(Tok::Eq);
                i += 1;
            }
            ',' => {
                toks.push(Tok::Comma);
                i += 1;
            }
            '"' | '\'' => {
                let quote = bytes[i];
                i += 1;
                let start_idx = i;
                let mut s = String::new();
                loop {
                    if i >= bytes.len() {
                        return Err(MetadataError::UnterminatedString);
                    }
                    if bytes[i] == quote {
                        break;
                    }
                    if bytes[i] == b'\\' && i + 1 < bytes.len() {
                        i += 1;
                        s.push(bytes[i] as char);
                    } else {
                        s.push(bytes[i] as char);
                    }
                    i += 1;
                }
                let _ = start_idx;
                i += 1;
                toks.push(Tok::Str(s));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let text = &input[start..i];
                let n = text
                    .parse::<f64>()
                    .map_err(|_| MetadataError::InvalidNumber(text.to_string()))?;
                toks.push(Tok::Num(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                i += 1;
                while i < bytes.len()
                    && ((bytes[i] as char).is_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                let word = &input[start..i];
                toks.push(match word {
                    "return" => Tok::Return,
                    "true" => Tok::True,
                    _ => Tok::Ident(word.to_string()),
                });
            }
            other => return Err(MetadataError::UnexpectedChar(other)),
        }
    }

    Ok(toks)
}
