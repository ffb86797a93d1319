//! Recursive-descent parser producing the lossless tree.
//!
//! Grammar: JSON, plus `//` line comments, `/* */` block comments and
//! trailing commas in objects and arrays.

use crate::tree::{Container, Entry, Key, Node, Scalar};
use crate::value::{Number, Value};
use crate::DocumentError;

const BOM: &str = "\u{feff}";

pub(crate) struct Parsed {
    pub leading: String,
    pub root: Node,
    pub trailing: String,
}

pub(crate) fn parse(src: &str) -> Result<Parsed, DocumentError> {
    let mut parser = Parser { src, pos: 0 };
    let mut leading = String::new();
    if src.starts_with(BOM) {
        parser.pos = BOM.len();
        leading.push_str(BOM);
    }
    leading.push_str(&parser.trivia()?);
    if parser.peek().is_none() {
        return Err(parser.error("empty document"));
    }
    let root = parser.value()?;
    let trailing = parser.trivia()?;
    if parser.pos < src.len() {
        return Err(parser.error("unexpected trailing characters after document"));
    }
    Ok(Parsed {
        leading,
        root,
        trailing,
    })
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + offset).copied()
    }

    fn error(&self, message: impl Into<String>) -> DocumentError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> DocumentError {
        let before = &self.src[..pos.min(self.src.len())];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        DocumentError::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), DocumentError> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(self.error(format!(
                "expected '{}', found '{}'",
                byte as char,
                self.char_at_pos(b)
            ))),
            None => Err(self.error(format!("expected '{}', found end of input", byte as char))),
        }
    }

    fn char_at_pos(&self, fallback: u8) -> char {
        self.src[self.pos..].chars().next().unwrap_or(fallback as char)
    }

    /// Whitespace and comments, returned verbatim.
    fn trivia(&mut self) -> Result<String, DocumentError> {
        let start = self.pos;
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(b' ' | b'\t' | b'\n' | b'\r'), _) => self.pos += 1,
                (Some(b'/'), Some(b'/')) => match self.src[self.pos..].find('\n') {
                    Some(offset) => self.pos += offset,
                    None => self.pos = self.src.len(),
                },
                (Some(b'/'), Some(b'*')) => match self.src[self.pos + 2..].find("*/") {
                    Some(offset) => self.pos += offset + 4,
                    None => return Err(self.error("unterminated block comment")),
                },
                _ => break,
            }
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn value(&mut self) -> Result<Node, DocumentError> {
        match self.peek() {
            Some(b'{') => self.object(),
            Some(b'[') => self.array(),
            Some(b'"') => {
                let (raw, text) = self.string()?;
                Ok(Node::Scalar(Scalar {
                    raw,
                    value: Value::String(text),
                }))
            }
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(b't') => self.literal("true", Value::Bool(true)),
            Some(b'f') => self.literal("false", Value::Bool(false)),
            Some(b'n') => self.literal("null", Value::Null),
            Some(b) => Err(self.error(format!("unexpected character '{}'", self.char_at_pos(b)))),
            None => Err(self.error("unexpected end of input, expected a value")),
        }
    }

    fn object(&mut self) -> Result<Node, DocumentError> {
        self.expect(b'{')?;
        let mut entries = Vec::new();
        loop {
            let leading = self.trivia()?;
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Node::Object(Container {
                        entries,
                        tail: leading,
                    }));
                }
                Some(b'"') => {
                    let (raw, name) = self.string()?;
                    let before_colon = self.trivia()?;
                    self.expect(b':')?;
                    let after_colon = self.trivia()?;
                    let value = self.value()?;
                    let key = Some(Key {
                        raw,
                        name,
                        before_colon,
                        after_colon,
                    });
                    if let Some(tail) = self.entry_end(&mut entries, leading, key, value)? {
                        self.expect(b'}')?;
                        return Ok(Node::Object(Container { entries, tail }));
                    }
                }
                Some(b) => {
                    return Err(self.error(format!(
                        "expected string key or '}}', found '{}'",
                        self.char_at_pos(b)
                    )))
                }
                None => return Err(self.error("unterminated object")),
            }
        }
    }

    fn array(&mut self) -> Result<Node, DocumentError> {
        self.expect(b'[')?;
        let mut entries = Vec::new();
        loop {
            let leading = self.trivia()?;
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Node::Array(Container {
                        entries,
                        tail: leading,
                    }));
                }
                Some(_) => {
                    let value = self.value()?;
                    if let Some(tail) = self.entry_end(&mut entries, leading, None, value)? {
                        self.expect(b']')?;
                        return Ok(Node::Array(Container { entries, tail }));
                    }
                }
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    /// Finish an entry. Returns the closing trivia when no comma follows,
    /// meaning the container must close next.
    fn entry_end(
        &mut self,
        entries: &mut Vec<Entry>,
        leading: String,
        key: Option<Key>,
        value: Node,
    ) -> Result<Option<String>, DocumentError> {
        let after = self.trivia()?;
        let comma = self.peek() == Some(b',');
        if comma {
            self.pos += 1;
        }
        let (trailing, tail) = if comma {
            (after, None)
        } else {
            (String::new(), Some(after))
        };
        entries.push(Entry {
            leading,
            key,
            value,
            trailing,
            comma,
        });
        Ok(tail)
    }

    /// Returns the raw token (quotes included) and the decoded text.
    fn string(&mut self) -> Result<(String, String), DocumentError> {
        let start = self.pos;
        self.expect(b'"')?;
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => self.pos += 2,
                Some(b) if b < 0x20 => {
                    return Err(self.error("control character in string literal"));
                }
                Some(_) => self.pos += 1,
                None => return Err(self.error_at(start, "unterminated string literal")),
            }
        }
        if self.pos > self.src.len() {
            return Err(self.error_at(start, "unterminated string literal"));
        }
        let raw = &self.src[start..self.pos];
        let text: String = serde_json::from_str(raw)
            .map_err(|e| self.error_at(start, format!("invalid string literal: {}", e)))?;
        Ok((raw.to_string(), text))
    }

    fn number(&mut self) -> Result<Node, DocumentError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.digits(),
            _ => return Err(self.error("invalid number")),
        }
        let mut float = false;
        if self.peek() == Some(b'.') {
            float = true;
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error("expected digit after decimal point"));
            }
            self.digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            float = true;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error("expected digit in exponent"));
            }
            self.digits();
        }
        let raw = &self.src[start..self.pos];
        let number = match (float, raw.parse::<i64>()) {
            (false, Ok(i)) => Number::Int(i),
            _ => Number::Float(
                raw.parse::<f64>()
                    .map_err(|e| self.error_at(start, format!("invalid number: {}", e)))?,
            ),
        };
        Ok(Node::Scalar(Scalar {
            raw: raw.to_string(),
            value: Value::Number(number),
        }))
    }

    fn digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    fn literal(&mut self, word: &str, value: Value) -> Result<Node, DocumentError> {
        let rest = &self.src[self.pos..];
        let boundary = rest
            .as_bytes()
            .get(word.len())
            .map_or(true, |b| !(b.is_ascii_alphanumeric() || *b == b'_'));
        if !rest.starts_with(word) || !boundary {
            return Err(self.error("invalid literal"));
        }
        self.pos += word.len();
        Ok(Node::Scalar(Scalar {
            raw: word.to_string(),
            value,
        }))
    }
}
