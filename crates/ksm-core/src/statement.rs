//! CQL schema source splitting.
//!
//! Turns the raw text of a `.cql` schema file into an ordered list of
//! executable statements. Comments are stripped, `;` is the only statement
//! boundary, and runs of whitespace outside quoted literals collapse to a
//! single space. Quoted content (`'...'`, `"..."`, `$$...$$`) is copied
//! verbatim, so a `;` inside a literal never splits a statement.
//!
//! No reordering happens here: callers rely on source order to create types
//! before the tables that use them.

use crate::checksum::compute_checksum;
use crate::error::{CoreError, CoreResult};
use std::fmt;

/// A single executable CQL statement, without its trailing `;`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement(String);

impl Statement {
    /// Return the statement text as sent to the cluster.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the statement and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Statement {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered statements parsed from one schema source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaManifest {
    statements: Vec<Statement>,
    checksum: String,
}

impl SchemaManifest {
    /// Parse raw CQL text into a manifest.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        Ok(Self {
            statements: parse_statements(raw)?,
            checksum: compute_checksum(raw),
        })
    }

    /// Statements in source order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// SHA-256 of the raw source text this manifest was parsed from.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }
}

impl<'a> IntoIterator for &'a SchemaManifest {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    DollarQuoted,
    LineComment,
    BlockComment,
}

/// Accumulates one statement while scanning.
struct StatementBuffer {
    text: String,
    pending_space: bool,
    start_line: usize,
}

impl StatementBuffer {
    fn new() -> Self {
        Self {
            text: String::new(),
            pending_space: false,
            start_line: 0,
        }
    }

    /// Push a token character, emitting a collapsed space first if needed.
    fn push_token(&mut self, c: char, line: usize) {
        if self.text.is_empty() {
            self.start_line = line;
        } else if self.pending_space {
            self.text.push(' ');
        }
        self.pending_space = false;
        self.text.push(c);
    }

    /// Push a character inside a quoted literal, verbatim.
    fn push_raw(&mut self, c: char) {
        self.text.push(c);
    }

    fn take(&mut self) -> Option<Statement> {
        self.pending_space = false;
        if self.text.is_empty() {
            None
        } else {
            Some(Statement(std::mem::take(&mut self.text)))
        }
    }
}

/// Split raw CQL text into statements.
///
/// Fails on an unterminated quoted literal or block comment, and on trailing
/// content that is not closed by a `;`.
pub fn parse_statements(raw: &str) -> CoreResult<Vec<Statement>> {
    let chars: Vec<char> = raw.chars().collect();
    let mut statements = Vec::new();
    let mut buf = StatementBuffer::new();
    let mut state = ScanState::Normal;
    let mut line = 1usize;
    let mut opened_at = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match state {
            ScanState::Normal => {
                if c == ';' {
                    statements.extend(buf.take());
                } else if (c == '-' && next == Some('-')) || (c == '/' && next == Some('/')) {
                    state = ScanState::LineComment;
                    buf.pending_space = true;
                    i += 1;
                } else if c == '/' && next == Some('*') {
                    state = ScanState::BlockComment;
                    opened_at = line;
                    buf.pending_space = true;
                    i += 1;
                } else if c.is_whitespace() {
                    buf.pending_space = true;
                } else if c == '$' && next == Some('$') {
                    state = ScanState::DollarQuoted;
                    opened_at = line;
                    buf.push_token('$', line);
                    buf.push_raw('$');
                    i += 1;
                } else {
                    if c == '\'' {
                        state = ScanState::SingleQuoted;
                        opened_at = line;
                    } else if c == '"' {
                        state = ScanState::DoubleQuoted;
                        opened_at = line;
                    }
                    buf.push_token(c, line);
                }
            }
            ScanState::SingleQuoted | ScanState::DoubleQuoted => {
                buf.push_raw(c);
                let close = if state == ScanState::SingleQuoted {
                    '\''
                } else {
                    '"'
                };
                // a doubled quote closes and immediately reopens the literal
                if c == close {
                    state = ScanState::Normal;
                }
            }
            ScanState::DollarQuoted => {
                buf.push_raw(c);
                if c == '$' && next == Some('$') {
                    buf.push_raw('$');
                    state = ScanState::Normal;
                    i += 1;
                }
            }
            ScanState::LineComment => {
                if c == '\n' {
                    state = ScanState::Normal;
                }
            }
            ScanState::BlockComment => {
                if c == '*' && next == Some('/') {
                    state = ScanState::Normal;
                    i += 1;
                }
            }
        }

        if c == '\n' {
            line += 1;
        }
        i += 1;
    }

    match state {
        ScanState::SingleQuoted | ScanState::DoubleQuoted | ScanState::DollarQuoted => {
            return Err(CoreError::StatementParse {
                line: opened_at,
                message: "unbalanced quoting: literal is never closed".to_string(),
            });
        }
        ScanState::BlockComment => {
            return Err(CoreError::StatementParse {
                line: opened_at,
                message: "block comment is never closed".to_string(),
            });
        }
        ScanState::Normal | ScanState::LineComment => {}
    }

    if !buf.text.is_empty() {
        return Err(CoreError::StatementParse {
            line: buf.start_line,
            message: format!("statement is missing a terminating ';': {}", buf.text),
        });
    }

    Ok(statements)
}

#[cfg(test)]
#[path = "statement_test.rs"]
mod tests;
