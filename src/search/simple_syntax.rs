//! Simple query syntax translation.
//!
//! Rewrites the managed service's "simple" operators into Lucene boolean
//! operators:
//!
//! ```text
//! wifi -luxury     →  wifi !luxury       (whitespace + '-')
//! wifi+luxury      →  wifi AND luxury    ('+', optional whitespace either side)
//! wifi | luxury    →  wifi OR luxury     ('|', optional whitespace either side)
//! luxury\+hotel    →  luxury\+hotel      (escaped, untouched)
//! wi-fi            →  wi-fi              ('-' inside a word, untouched)
//! ```
//!
//! The three passes run in the order above; each sees the previous output.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leading {
    /// Operator only counts when a whitespace character precedes it
    Required,
    /// One preceding whitespace character is folded into the replacement
    Optional,
}

/// Translate a simple-syntax query into Lucene syntax.
pub fn simple_to_lucene(query: &str) -> String {
    let query = substitute(query, '-', " !", Leading::Required, false);
    let query = substitute(&query, '+', " AND ", Leading::Optional, true);
    substitute(&query, '|', " OR ", Leading::Optional, true)
}

/// Replace every unescaped `op` with `replacement`.
///
/// Scans left to right without overlapping matches. An operator is escaped
/// when the character right before it in the input is a backslash.
fn substitute(
    input: &str,
    op: char,
    replacement: &str,
    leading: Leading,
    eat_trailing: bool,
) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        let matched = if ch.is_whitespace() && chars.get(i + 1) == Some(&op) {
            // whitespace + op; the op cannot be escaped here
            i += 2;
            true
        } else if ch == op && leading == Leading::Optional && (i == 0 || chars[i - 1] != '\\') {
            i += 1;
            true
        } else {
            false
        };

        if matched {
            out.push_str(replacement);
            if eat_trailing && chars.get(i).is_some_and(|c| c.is_whitespace()) {
                i += 1;
            }
        } else {
            out.push(ch);
            i += 1;
        }
    }

    out
}
