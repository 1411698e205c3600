//! Labeled notation parser
//!
//! Parses the bracketed forms produced by the encoder (`[a, b]`,
//! `{k=v, ...}`) into an untyped tree. JSON is accepted as well: `:` works as a
//! key separator, keys may be quoted and trailing commas are tolerated.
//! Bare values are kept as raw slices and interpreted later against the
//! declared type.

use thiserror::Error;

/// Untyped syntax tree of a labeled notation value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node<'a> {
    /// Unquoted token, trimmed.
    Atom(&'a str),
    /// Quoted string literal, unescaped.
    Str(String),
    List(Vec<Node<'a>>),
    Map(Vec<(Node<'a>, Node<'a>)>),
}

impl Node<'_> {
    /// Text payload of a scalar node.
    pub(crate) fn scalar_text(&self) -> Option<&str> {
        match self {
            Self::Atom(s) => Some(*s),
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Self::Atom(_) => "bare token",
            Self::Str(_) => "string literal",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at offset {offset}")]
pub(crate) struct NotationError {
    pub offset: usize,
    pub message: String,
}

/// Parse a complete labeled notation value. Trailing input is an error.
pub(crate) fn parse(src: &str) -> Result<Node<'_>, NotationError> {
    let mut parser = Parser { src, pos: 0 };
    let node = parser.value()?;
    parser.skip_ws();
    if parser.pos < src.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(node)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> NotationError {
        NotationError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn value(&mut self) -> Result<Node<'a>, NotationError> {
        self.skip_ws();
        match self.peek() {
            Some(b'[') => self.list(),
            Some(b'{') => self.map(),
            Some(b'"') => self.string().map(Node::Str),
            Some(_) => self.atom(b",]}"),
            None => Err(self.error("expected a value")),
        }
    }

    fn list(&mut self) -> Result<Node<'a>, NotationError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(b']') {
                self.pos += 1;
                return Ok(Node::List(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Node::List(items));
                }
                _ => return Err(self.error("expected `,` or `]`")),
            }
        }
    }

    fn map(&mut self) -> Result<Node<'a>, NotationError> {
        self.pos += 1;
        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(b'}') {
                self.pos += 1;
                return Ok(Node::Map(entries));
            }
            let key = self.key()?;
            self.skip_ws();
            match self.peek() {
                Some(b'=') | Some(b':') => self.pos += 1,
                _ => return Err(self.error("expected `=` or `:` after key")),
            }
            let value = self.value()?;
            entries.push((key, value));
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Node::Map(entries));
                }
                _ => return Err(self.error("expected `,` or `}`")),
            }
        }
    }

    /// Keys are quoted strings or bare tokens without separators.
    fn key(&mut self) -> Result<Node<'a>, NotationError> {
        if self.peek() == Some(b'"') {
            return self.string().map(Node::Str);
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || b"=:,{}[]\"".contains(&c) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected a key"));
        }
        Ok(Node::Atom(&self.src[start..self.pos]))
    }

    /// Bare token up to the next terminator, trimmed.
    fn atom(&mut self, terminators: &[u8]) -> Result<Node<'a>, NotationError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if terminators.contains(&c) {
                break;
            }
            self.pos += 1;
        }
        let text = self.src[start..self.pos].trim();
        if text.is_empty() {
            return Err(self.error("expected a value"));
        }
        Ok(Node::Atom(text))
    }

    /// JSON string literal starting at the current quote.
    fn string(&mut self) -> Result<String, NotationError> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut i = start + 1;
        let mut escape = false;
        while i < bytes.len() {
            let c = bytes[i];
            if escape {
                escape = false;
            } else if c == b'\\' {
                escape = true;
            } else if c == b'"' {
                let literal = &self.src[start..=i];
                self.pos = i + 1;
                return serde_json::from_str(literal).map_err(|e| NotationError {
                    offset: start,
                    message: format!("invalid string literal: {e}"),
                });
            }
            i += 1;
        }
        Err(self.error("unterminated string literal"))
    }
}
