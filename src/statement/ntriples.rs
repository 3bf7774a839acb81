//! N-Triples / N-Quads line parser
//!
//! Parses one statement per line. Blank lines and `#` comment lines are skipped.
//! Relative IRIs are passed through unresolved.

use crate::content::{ContentError, StatementParser};
use crate::statement::Node;
use std::io::{BufRead, BufReader, Read};
use thiserror::Error;

/// A syntax error in a statement-producing body
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Parser for `application/n-triples` and `application/n-quads` bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct NTriplesParser;

impl NTriplesParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a single line into a 3- or 4-node tuple
    ///
    /// Returns `Ok(None)` for blank and comment lines.
    pub fn parse_line(&self, line: &str, line_no: usize) -> Result<Option<Vec<Node>>, ParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let mut cursor = Cursor {
            rest: trimmed,
            line: line_no,
        };

        let subject = cursor.term()?;
        if subject.is_literal() {
            return Err(cursor.error("subject must be an IRI or blank node"));
        }

        let predicate = cursor.term()?;
        if predicate.as_iri().is_none() {
            return Err(cursor.error("predicate must be an IRI"));
        }

        let object = cursor.term()?;
        let mut nodes = vec![subject, predicate, object];

        cursor.skip_ws();
        if !cursor.rest.starts_with('.') {
            let context = cursor.term()?;
            if context.is_literal() {
                return Err(cursor.error("graph name must be an IRI or blank node"));
            }
            nodes.push(context);
        }

        cursor.finish()?;
        Ok(Some(nodes))
    }
}

impl StatementParser for NTriplesParser {
    fn parse(
        &self,
        base: &str,
        body: &mut dyn Read,
        emit: &mut dyn FnMut(Vec<Node>) -> Result<(), ContentError>,
    ) -> Result<(), ContentError> {
        tracing::debug!("Parsing N-Triples body of {}", base);
        let reader = BufReader::new(body);
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if let Some(nodes) = self.parse_line(&line, index + 1)? {
                emit(nodes)?;
            }
        }
        Ok(())
    }
}

/// Cursor over the unparsed remainder of one line
struct Cursor<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, message)
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t']);
    }

    fn term(&mut self) -> Result<Node, ParseError> {
        self.skip_ws();
        match self.rest.chars().next() {
            Some('<') => self.iri().map(Node::Iri),
            Some('_') => self.blank(),
            Some('"') => self.literal(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
            None => Err(self.error("unexpected end of line")),
        }
    }

    fn iri(&mut self) -> Result<String, ParseError> {
        let rest = self.rest;
        let body = &rest[1..];
        let end = body
            .find('>')
            .ok_or_else(|| self.error("unterminated IRI"))?;
        let raw = &body[..end];
        if raw.contains([' ', '<', '"']) {
            return Err(self.error(format!("invalid character in IRI '{}'", raw)));
        }
        let iri = unescape(raw).map_err(|m| self.error(m))?;
        self.rest = &body[end + 1..];
        Ok(iri)
    }

    fn blank(&mut self) -> Result<Node, ParseError> {
        let rest = self.rest;
        let body = rest
            .strip_prefix("_:")
            .ok_or_else(|| self.error("expected '_:' blank node prefix"))?;
        let mut len = body
            .find(|c: char| c.is_whitespace() || c == '<' || c == '"')
            .unwrap_or(body.len());
        // a label cannot end with '.', which then belongs to the terminator
        while len > 0 && body[..len].ends_with('.') {
            len -= 1;
        }
        if len == 0 {
            return Err(self.error("empty blank node label"));
        }
        self.rest = &body[len..];
        Ok(Node::blank(&body[..len]))
    }

    fn literal(&mut self) -> Result<Node, ParseError> {
        let rest = self.rest;
        let body = &rest[1..];
        let mut escaped = false;
        let mut end = None;
        for (i, c) in body.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| self.error("unterminated literal"))?;
        let value = unescape(&body[..end]).map_err(|m| self.error(m))?;
        self.rest = &body[end + 1..];

        let after = self.rest;
        if let Some(rest) = after.strip_prefix("^^") {
            self.rest = rest;
            if !self.rest.starts_with('<') {
                return Err(self.error("expected datatype IRI after '^^'"));
            }
            let datatype = self.iri()?;
            Ok(Node::typed_literal(value, datatype))
        } else if let Some(rest) = after.strip_prefix('@') {
            let len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                .unwrap_or(rest.len());
            if len == 0 {
                return Err(self.error("empty language tag"));
            }
            self.rest = &rest[len..];
            Ok(Node::lang_literal(value, &rest[..len]))
        } else {
            Ok(Node::literal(value))
        }
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        self.skip_ws();
        let rest = self.rest;
        self.rest = rest
            .strip_prefix('.')
            .ok_or_else(|| self.error("expected '.' at end of statement"))?;
        self.skip_ws();
        if self.rest.is_empty() || self.rest.starts_with('#') {
            Ok(())
        } else {
            Err(self.error(format!("trailing content '{}'", self.rest)))
        }
    }
}

/// Resolves N-Triples escape sequences
fn unescape(raw: &str) -> Result<String, String> {
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('u') => out.push(unescape_code_point(&mut chars, 4)?),
            Some('U') => out.push(unescape_code_point(&mut chars, 8)?),
            Some(other) => return Err(format!("invalid escape sequence '\\{}'", other)),
            None => return Err("dangling escape at end of term".to_string()),
        }
    }
    Ok(out)
}

fn unescape_code_point(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<char, String> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return Err(format!("truncated unicode escape '{}'", hex));
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid unicode escape '{}'", hex))
}
