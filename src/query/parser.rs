//! Query parser.
//!
//! Builds an executable query tree from lexed fragments with a
//! precedence-climbing pass over three parallel stacks: pending operand
//! queries, pending operators, and their precedences. `(` opens a scope at
//! precedence 0; `OR`, `XOR`, `AND` and `NEAR` bind increasingly tighter and
//! associate to the left.

use crate::error::{QuillError, Result};
use crate::query::lexer::QueryFragment;
use crate::query::{ComplexQuery, ExactQuery, Policy, Query};

const PAREN_PRECEDENCE: u8 = 0;

enum PendingOp {
    OpenParen,
    Combine { policy: Policy, ordered: bool },
}

fn reduce_one(query_stack: &mut Vec<Box<dyn Query>>, op_stack: &mut Vec<PendingOp>) -> Result<()> {
    let malformed = || QuillError::query("malformed query");

    match op_stack.pop() {
        Some(PendingOp::Combine { policy, ordered }) => {
            let rx = query_stack.pop().ok_or_else(malformed)?;
            let lx = query_stack.pop().ok_or_else(malformed)?;
            query_stack.push(Box::new(ComplexQuery::new(lx, rx, policy, ordered)));
            Ok(())
        }
        _ => Err(malformed()),
    }
}

fn push_operator(
    query_stack: &mut Vec<Box<dyn Query>>,
    op_stack: &mut Vec<PendingOp>,
    precedence_stack: &mut Vec<u8>,
    policy: Policy,
    ordered: bool,
    precedence: u8,
) -> Result<()> {
    // Left associativity: reduce everything that binds at least as tightly
    // before stacking the incoming operator.
    while precedence_stack
        .last()
        .is_some_and(|&top| top >= precedence)
    {
        precedence_stack.pop();
        reduce_one(query_stack, op_stack)?;
    }
    op_stack.push(PendingOp::Combine { policy, ordered });
    precedence_stack.push(precedence);
    Ok(())
}

/// Parse lexed fragments into an executable query tree.
///
/// The resulting query is unbound; call [`Query::init`] before driving it.
pub fn parse_query(fragments: &[QueryFragment]) -> Result<Box<dyn Query>> {
    let mut query_stack: Vec<Box<dyn Query>> = Vec::new();
    let mut op_stack: Vec<PendingOp> = Vec::new();
    let mut precedence_stack: Vec<u8> = Vec::new();

    for fragment in fragments {
        match fragment.text.as_str() {
            "(" => {
                op_stack.push(PendingOp::OpenParen);
                precedence_stack.push(PAREN_PRECEDENCE);
            }
            ")" => loop {
                match precedence_stack.pop() {
                    None => return Err(QuillError::query("unbalanced closing parenthesis")),
                    Some(PAREN_PRECEDENCE) => {
                        op_stack.pop();
                        break;
                    }
                    Some(_) => reduce_one(&mut query_stack, &mut op_stack)?,
                }
            },
            "OR" => push_operator(
                &mut query_stack,
                &mut op_stack,
                &mut precedence_stack,
                Policy::Or,
                fragment.ordered,
                1,
            )?,
            "XOR" => push_operator(
                &mut query_stack,
                &mut op_stack,
                &mut precedence_stack,
                Policy::Xor,
                fragment.ordered,
                2,
            )?,
            "AND" => push_operator(
                &mut query_stack,
                &mut op_stack,
                &mut precedence_stack,
                Policy::And,
                fragment.ordered,
                3,
            )?,
            "NEAR" => push_operator(
                &mut query_stack,
                &mut op_stack,
                &mut precedence_stack,
                Policy::Near(fragment.option),
                fragment.ordered,
                4,
            )?,
            "NOT" => return Err(QuillError::query("the NOT operator is not supported")),
            term => query_stack.push(Box::new(ExactQuery::new(term))),
        }
    }

    while let Some(precedence) = precedence_stack.pop() {
        if precedence == PAREN_PRECEDENCE {
            return Err(QuillError::query("unbalanced opening parenthesis"));
        }
        reduce_one(&mut query_stack, &mut op_stack)?;
    }

    if query_stack.len() != 1 {
        return Err(QuillError::query("query does not reduce to a single tree"));
    }
    Ok(query_stack.pop().unwrap())
}
