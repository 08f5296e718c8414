// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Filter Parser
//!
//! Tokenizer and recursive descent parser for OData-style `$filter`
//! expressions. Only comparisons and boolean logic are understood.
//!
//! # Grammar
//!
//! ```text
//! filter     = or_expr EOF
//! or_expr    = and_expr ( "or" or_expr )?
//! and_expr   = not_expr ( "and" and_expr | and_expr )?     (adjacent terms AND)
//! not_expr   = "not" not_expr | primary
//! primary    = "(" or_expr ")" | comparison
//! comparison = operand WS op WS operand
//! operand    = WORD | QUOTED
//! op         = "eq" | "neq" | "lt" | "lte" | "gt" | "gte"
//! WORD       = [A-Za-z0-9.]+
//! QUOTED     = '"' WORD+ '"' | "'" WORD+ "'"
//! ```
//!
//! Keywords are matched case-insensitively and only as whole words, so
//! `order` or `notes` are plain words. A `not` directly followed by an
//! operator is a field name: `not eq 1`.

use thiserror::Error;

use super::filter_ast::{ComparisonOp, FilterNode, Operand};

/// Nesting limit for parentheses and `not` chains. Flat `and`/`or` chains
/// do not count toward it.
const MAX_DEPTH: usize = 256;

/// Filter grammar rejected the input.
///
/// The display form is part of the public error envelope and must not change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Parsing failed at line {line} character {column} near: {line_text}")]
pub struct FilterParseError {
    /// 1-based line of the offending token
    pub line: usize,
    /// 1-based character column of the offending token
    pub column: usize,
    /// Full text of the offending line
    pub line_text: String,
    /// What the parser expected (diagnostics only, not displayed)
    pub reason: String,
}

impl FilterParseError {
    fn at(input: &str, offset: usize, reason: impl Into<String>) -> Self {
        let offset = offset.min(input.len());
        let line_start = input[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_end = input[offset..]
            .find('\n')
            .map(|i| offset + i)
            .unwrap_or(input.len());

        Self {
            line: input[..offset].matches('\n').count() + 1,
            column: input[line_start..offset].chars().count() + 1,
            line_text: input[line_start..line_end].to_string(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Word(String),
    Quoted(Vec<String>),
    OpenParen,
    CloseParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    /// Byte offset into the input
    offset: usize,
    /// Whitespace immediately precedes this token
    spaced: bool,
}

impl Token {
    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '.'
}

fn tokenize(input: &str) -> Result<Vec<Token>, FilterParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    let mut spaced = false;

    while let Some(&(offset, ch)) = chars.peek() {
        if ch.is_whitespace() {
            spaced = true;
            chars.next();
            continue;
        }

        let kind = match ch {
            '(' => {
                chars.next();
                TokenKind::OpenParen
            }
            ')' => {
                chars.next();
                TokenKind::CloseParen
            }
            '"' | '\'' => {
                chars.next();
                let mut words = Vec::new();
                let mut current = String::new();
                loop {
                    match chars.next() {
                        Some((_, c)) if c == ch => break,
                        Some((_, c)) if is_word_char(c) => current.push(c),
                        Some((_, c)) if c.is_whitespace() => {
                            if !current.is_empty() {
                                words.push(std::mem::take(&mut current));
                            }
                        }
                        Some((at, _)) => {
                            return Err(FilterParseError::at(
                                input,
                                at,
                                "unexpected character inside quoted literal",
                            ))
                        }
                        None => {
                            return Err(FilterParseError::at(
                                input,
                                offset,
                                "unterminated quoted literal",
                            ))
                        }
                    }
                }
                if !current.is_empty() {
                    words.push(current);
                }
                if words.is_empty() {
                    return Err(FilterParseError::at(input, offset, "empty quoted literal"));
                }
                TokenKind::Quoted(words)
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !is_word_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                TokenKind::Word(word)
            }
            _ => return Err(FilterParseError::at(input, offset, "unexpected character")),
        };

        tokens.push(Token { kind, offset, spaced });
        spaced = false;
    }

    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

/// Chain operands right-associatively: `a, [b, c]` becomes `a . (b . c)`.
fn fold_right(
    first: FilterNode,
    mut rest: Vec<FilterNode>,
    join: fn(FilterNode, FilterNode) -> FilterNode,
) -> FilterNode {
    let Some(mut acc) = rest.pop() else {
        return first;
    };
    while let Some(left) = rest.pop() {
        acc = join(left, acc);
    }
    join(first, acc)
}

/// Recursive descent parser over a tokenized filter string.
pub struct FilterParser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'a> FilterParser<'a> {
    /// Parse a complete filter expression.
    ///
    /// Fails unless the whole input reduces to exactly one expression.
    pub fn parse(input: &'a str) -> Result<FilterNode, FilterParseError> {
        let tokens = tokenize(input)?;
        let mut parser = Self {
            input,
            tokens,
            pos: 0,
            depth: 0,
        };

        let node = parser.parse_or()?;
        if let Some(tok) = parser.peek() {
            return Err(parser.error_at(tok.offset, "unexpected trailing input"));
        }
        Ok(node)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn error_at(&self, offset: usize, reason: &str) -> FilterParseError {
        FilterParseError::at(self.input, offset, reason)
    }

    /// Error positioned at the next token, or at end of input.
    fn error_here(&self, reason: &str) -> FilterParseError {
        let offset = self.peek().map(|t| t.offset).unwrap_or(self.input.len());
        self.error_at(offset, reason)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    /// True when the next token can begin another conjunct.
    fn starts_expression(&self) -> bool {
        match self.peek() {
            Some(tok) => match &tok.kind {
                TokenKind::Word(_) => !tok.is_keyword("and") && !tok.is_keyword("or"),
                TokenKind::Quoted(_) | TokenKind::OpenParen => true,
                TokenKind::CloseParen => false,
            },
            None => false,
        }
    }

    fn descend(&mut self) -> Result<(), FilterParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error_here("expression nested too deeply"));
        }
        Ok(())
    }

    /// or_expr = and_expr ("or" or_expr)?
    fn parse_or(&mut self) -> Result<FilterNode, FilterParseError> {
        let first = self.parse_and()?;
        let mut rest = Vec::new();
        while self.peek_keyword("or") {
            self.advance();
            rest.push(self.parse_and()?);
        }
        Ok(fold_right(first, rest, FilterNode::or))
    }

    /// and_expr = not_expr ("and" and_expr | and_expr)?
    fn parse_and(&mut self) -> Result<FilterNode, FilterParseError> {
        let first = self.parse_not()?;
        let mut rest = Vec::new();
        loop {
            if self.peek_keyword("and") {
                self.advance();
            } else if !self.starts_expression() {
                break;
            }
            rest.push(self.parse_not()?);
        }
        Ok(fold_right(first, rest, FilterNode::and))
    }

    /// not_expr = "not" not_expr | primary
    fn parse_not(&mut self) -> Result<FilterNode, FilterParseError> {
        if self.peek_keyword("not") && !self.not_is_field() {
            self.advance();
            self.descend()?;
            let inner = self.parse_not()?;
            self.depth -= 1;
            return Ok(inner.negate());
        }
        self.parse_primary()
    }

    /// `not eq 1` compares a field named `not`.
    fn not_is_field(&self) -> bool {
        self.tokens.get(self.pos + 1).is_some_and(|tok| {
            tok.spaced
                && matches!(&tok.kind, TokenKind::Word(w) if ComparisonOp::from_keyword(w).is_some())
        })
    }

    /// primary = "(" or_expr ")" | comparison
    fn parse_primary(&mut self) -> Result<FilterNode, FilterParseError> {
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::OpenParen)) {
            self.advance();
            self.descend()?;
            let inner = self.parse_or()?;
            self.depth -= 1;
            return match self.advance() {
                Some(Token { kind: TokenKind::CloseParen, .. }) => Ok(inner.group()),
                Some(tok) => Err(self.error_at(tok.offset, "expected ')'")),
                None => Err(self.error_at(self.input.len(), "expected ')'")),
            };
        }
        self.parse_comparison()
    }

    /// comparison = operand WS op WS operand
    fn parse_comparison(&mut self) -> Result<FilterNode, FilterParseError> {
        let field = self.parse_operand(false)?;

        let op = match self.peek() {
            Some(tok) if tok.spaced => match &tok.kind {
                TokenKind::Word(w) => ComparisonOp::from_keyword(w),
                _ => None,
            },
            _ => None,
        };
        let op = op.ok_or_else(|| self.error_here("expected comparison operator"))?;
        self.advance();

        let value = self.parse_operand(true)?;
        Ok(FilterNode::comparison(op, field, value))
    }

    fn parse_operand(&mut self, needs_space: bool) -> Result<Operand, FilterParseError> {
        let operand = match self.peek() {
            Some(tok) if needs_space && !tok.spaced => None,
            Some(Token { kind: TokenKind::Word(w), .. }) => Some(Operand::Word(w.clone())),
            Some(Token { kind: TokenKind::Quoted(words), .. }) => {
                Some(Operand::QuotedLiteral(words.clone()))
            }
            _ => None,
        };
        let operand = operand.ok_or_else(|| self.error_here("expected word or quoted literal"))?;
        self.advance();
        Ok(operand)
    }
}
