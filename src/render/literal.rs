//! Bracketed-list literal codec for composite history fields.
//!
//! Composite columns of the history file hold list text such as `[1.0, 2.5]`
//! or `[[0.0], [1.0, 2.0]]`. Floats are written with Rust's shortest
//! round-trip formatting, so parsing back what was written is exact.

use std::fmt;

/// A parse failure with the byte offset of the offending character.
#[derive(Debug, PartialEq, Eq)]
pub struct LiteralError {
    /// Byte offset into the input.
    pub offset: usize,
    /// What was expected at that position.
    pub message: String,
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "literal error at byte {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for LiteralError {}

/// Formats a flat list: `[1.0, 2.0]`.
pub fn format_list(values: &[f64]) -> String {
    let mut out = String::from("[");
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        // `{:?}` keeps a trailing `.0` on integral floats, so every element
        // reads back as a float.
        out.push_str(&format!("{v:?}"));
    }
    out.push(']');
    out
}

/// Formats a nested list: `[[1.0], [2.0, 3.0]]`.
pub fn format_nested(rows: &[Vec<f64>]) -> String {
    let mut out = String::from("[");
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format_list(row));
    }
    out.push(']');
    out
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn err(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c == ' ' || c == '\t') {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn expect(&mut self, c: char) -> Result<(), LiteralError> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.err(format!("expected '{c}'")))
        }
    }

    fn number(&mut self) -> Result<f64, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || "+-.eEinfaN".contains(c))
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err("expected a number"));
        }
        self.input[start..self.pos]
            .parse::<f64>()
            .map_err(|_| LiteralError {
                offset: start,
                message: format!("invalid number \"{}\"", &self.input[start..self.pos]),
            })
    }

    fn list(&mut self) -> Result<Vec<f64>, LiteralError> {
        self.expect('[')?;
        let mut values = Vec::new();
        self.skip_ws();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(values);
        }
        loop {
            self.skip_ws();
            values.push(self.number()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(values);
                }
                _ => return Err(self.err("expected ',' or ']'")),
            }
        }
    }

    fn nested(&mut self) -> Result<Vec<Vec<f64>>, LiteralError> {
        self.expect('[')?;
        let mut rows = Vec::new();
        self.skip_ws();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(rows);
        }
        loop {
            self.skip_ws();
            rows.push(self.list()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(rows);
                }
                _ => return Err(self.err("expected ',' or ']'")),
            }
        }
    }

    fn finish(&mut self) -> Result<(), LiteralError> {
        self.skip_ws();
        if self.pos == self.input.len() {
            Ok(())
        } else {
            Err(self.err("trailing characters after literal"))
        }
    }
}

/// Parses a flat list literal.
pub fn parse_list(input: &str) -> Result<Vec<f64>, LiteralError> {
    let mut p = Parser::new(input.trim());
    let values = p.list()?;
    p.finish()?;
    Ok(values)
}

/// Parses a nested list literal.
pub fn parse_nested(input: &str) -> Result<Vec<Vec<f64>>, LiteralError> {
    let mut p = Parser::new(input.trim());
    let rows = p.nested()?;
    p.finish()?;
    Ok(rows)
}
