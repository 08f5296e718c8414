// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Filter AST
//!
//! Tree produced by [`FilterParser`](super::FilterParser) from an OData-style
//! `$filter` expression and consumed once by
//! [`LuceneTranslator`](super::LuceneTranslator).
//!
//! ```text
//! rating gt '3' and not (city eq 'Paris')
//!
//! And
//! ├── Comparison(gt, Word(rating), QuotedLiteral[3])
//! └── Not
//!     └── Group
//!         └── Comparison(eq, Word(city), QuotedLiteral[Paris])
//! ```

use std::fmt;

/// Comparison operator keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ComparisonOp {
    /// Match an operator keyword, ignoring ASCII case.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            _ => None,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "eq"),
            Self::Neq => write!(f, "neq"),
            Self::Lt => write!(f, "lt"),
            Self::Lte => write!(f, "lte"),
            Self::Gt => write!(f, "gt"),
            Self::Gte => write!(f, "gte"),
        }
    }
}

/// Comparison operand. Only bare words and quoted literals can appear on
/// either side of a comparison, so the parser cannot build anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Bare word: `[A-Za-z0-9.]+`
    Word(String),
    /// Quoted literal: one or more words between `"` or `'`
    QuotedLiteral(Vec<String>),
}

impl Operand {
    /// Literal text with the quote delimiters removed
    pub fn text(&self) -> String {
        match self {
            Operand::Word(word) => word.clone(),
            Operand::QuotedLiteral(words) => words.concat(),
        }
    }
}

/// Filter expression node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterNode {
    /// `field op value`
    Comparison {
        op: ComparisonOp,
        field: Operand,
        value: Operand,
    },
    /// `not x`
    Not(Box<FilterNode>),
    /// `l and r`, or `l r` (implicit conjunction)
    And(Box<FilterNode>, Box<FilterNode>),
    /// `l or r`
    Or(Box<FilterNode>, Box<FilterNode>),
    /// `( x )`
    Group(Box<FilterNode>),
}

impl FilterNode {
    pub fn comparison(op: ComparisonOp, field: Operand, value: Operand) -> Self {
        FilterNode::Comparison { op, field, value }
    }

    pub fn and(self, other: FilterNode) -> Self {
        FilterNode::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: FilterNode) -> Self {
        FilterNode::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        FilterNode::Not(Box::new(self))
    }

    pub fn group(self) -> Self {
        FilterNode::Group(Box::new(self))
    }

    /// Deepest chain of nested [`FilterNode::Group`] nodes.
    pub fn group_depth(&self) -> usize {
        match self {
            FilterNode::Comparison { .. } => 0,
            FilterNode::Not(inner) => inner.group_depth(),
            FilterNode::And(l, r) | FilterNode::Or(l, r) => l.group_depth().max(r.group_depth()),
            FilterNode::Group(inner) => 1 + inner.group_depth(),
        }
    }
}
