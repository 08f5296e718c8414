//! Lucene Translator
//!
//! Translates the filter AST to Lucene/Solr standard query syntax.
//!
//! # Output Syntax
//!
//! ```text
//! field:value               - eq
//! NOT field:value           - neq
//! field:{v TO *]            - gt
//! field:[v TO *]            - gte
//! field:[* TO v}            - lt
//! field:[* TO v]            - lte
//! q1 AND q2 / q1 OR q2      - Boolean
//! NOT q                     - Negation
//! (q)                       - Grouping
//! ```

use super::filter_ast::{ComparisonOp, FilterNode, Operand};
use super::filter_parser::{FilterParseError, FilterParser};

/// Lucene query translator
pub struct LuceneTranslator;

impl LuceneTranslator {
    /// Translate a filter AST to a Lucene query string
    pub fn translate(node: &FilterNode) -> String {
        match node {
            FilterNode::And(l, r) => {
                format!("{} AND {}", Self::translate(l), Self::translate(r))
            }
            FilterNode::Or(l, r) => {
                format!("{} OR {}", Self::translate(l), Self::translate(r))
            }
            FilterNode::Not(inner) => format!("NOT {}", Self::translate(inner)),
            FilterNode::Group(inner) => format!("({})", Self::translate(inner)),
            FilterNode::Comparison { op, field, value } => {
                Self::translate_comparison(*op, field, value)
            }
        }
    }

    /// Parse an OData filter and translate it in one step.
    pub fn translate_filter(filter: &str) -> Result<String, FilterParseError> {
        let node = FilterParser::parse(filter)?;
        Ok(Self::translate(&node))
    }

    fn translate_comparison(op: ComparisonOp, field: &Operand, value: &Operand) -> String {
        let field = field.text();
        // Range bounds take the bare term; quotes are kept for term matches.
        let bound = value.text();

        match op {
            ComparisonOp::Gt => format!("{}:{{{} TO *]", field, bound),
            ComparisonOp::Gte => format!("{}:[{} TO *]", field, bound),
            ComparisonOp::Lt => format!("{}:[* TO {}}}", field, bound),
            ComparisonOp::Lte => format!("{}:[* TO {}]", field, bound),
            ComparisonOp::Neq => format!("NOT {}:{}", field, Self::render_term(value)),
            ComparisonOp::Eq => format!("{}:{}", field, Self::render_term(value)),
        }
    }

    fn render_term(value: &Operand) -> String {
        match value {
            Operand::Word(word) => word.clone(),
            Operand::QuotedLiteral(words) => format!("\"{}\"", words.concat()),
        }
    }
}
