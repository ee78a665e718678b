//! Query string lexer.
//!
//! A query string is a mix of lowercase terms, uppercase operator keywords
//! and parentheses. Operators accept an optional `:ORD` suffix (order
//! sensitive) and an optional `:<number>` suffix (the NEAR distance), in
//! that order: `NEAR:ORD:3`, `NEAR:5`, `AND:ORD`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{QuillError, Result};

lazy_static! {
    static ref TERM_RE: Regex = Regex::new(r"^([a-z]+)").unwrap();
    static ref OPERATOR_RE: Regex = Regex::new(r"^([A-Z]+)(?::([A-Z]+))?(?::(\d+))?").unwrap();
}

const ALLOWED_OPERATORS: [&str; 5] = ["AND", "OR", "XOR", "NEAR", "NOT"];

/// One lexed piece of a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFragment {
    /// The term, operator keyword, or parenthesis.
    pub text: String,
    /// Whether the operator carried an `:ORD` suffix.
    pub ordered: bool,
    /// The operator's numeric suffix, zero when absent.
    pub option: u64,
}

impl QueryFragment {
    fn plain<S: Into<String>>(text: S) -> Self {
        QueryFragment {
            text: text.into(),
            ordered: false,
            option: 0,
        }
    }
}

fn lex_operator(rest: &str) -> Result<(QueryFragment, usize)> {
    // The first character is known to be uppercase, so the pattern always
    // matches at least the keyword group.
    let captures = OPERATOR_RE.captures(rest).unwrap();

    let keyword = captures.get(1).unwrap().as_str();
    if !ALLOWED_OPERATORS.contains(&keyword) {
        return Err(QuillError::query(format!("invalid operator: {keyword}")));
    }

    let ordered = match captures.get(2).map(|spec| spec.as_str()) {
        None => false,
        Some("ORD") => true,
        Some(other) => {
            return Err(QuillError::query(format!(
                "invalid order specifier: {other}"
            )));
        }
    };

    let option = match captures.get(3) {
        Some(digits) => digits
            .as_str()
            .parse()
            .map_err(|_| QuillError::query("operator option out of range"))?,
        None => 0,
    };

    let fragment = QueryFragment {
        text: keyword.to_string(),
        ordered,
        option,
    };
    Ok((fragment, captures.get(0).unwrap().len()))
}

/// Split a query string into fragments, or fail on the first invalid
/// character or malformed operator.
pub fn split_query(query: &str) -> Result<Vec<QueryFragment>> {
    let mut fragments = Vec::new();
    let mut index = 0;
    let bytes = query.as_bytes();

    while index < bytes.len() {
        match bytes[index] {
            b' ' | b'\t' | b'\n' | b'\r' => index += 1,
            b'a'..=b'z' => {
                let matched = TERM_RE.find(&query[index..]).unwrap();
                fragments.push(QueryFragment::plain(matched.as_str()));
                index += matched.len();
            }
            b'A'..=b'Z' => {
                let (fragment, consumed) = lex_operator(&query[index..])?;
                fragments.push(fragment);
                index += consumed;
            }
            b'(' => {
                fragments.push(QueryFragment::plain("("));
                index += 1;
            }
            b')' => {
                fragments.push(QueryFragment::plain(")"));
                index += 1;
            }
            other => {
                return Err(QuillError::query(format!(
                    "invalid character in query: {:?}",
                    other as char
                )));
            }
        }
    }

    Ok(fragments)
}
