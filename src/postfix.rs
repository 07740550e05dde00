//! Infix to postfix rewriting of antecedent text.
//!
//! `and` and `or` are binary operators of equal precedence, left associative.
//! Parentheses group. Every other token is an operand and keeps its position
//! relative to its neighbours, so `x is very A` stays `x is very A`.

use crate::error::{FuzzyError, Result};
use crate::rules::{AND, OR};

const OPEN: &str = "(";
const CLOSE: &str = ")";

fn is_operator(token: &str) -> bool {
    token == AND || token == OR
}

/// Splits `text` on whitespace, with parentheses always standing as tokens of
/// their own even when written against a word.
pub(crate) fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();

    for word in text.split_whitespace() {
        let mut start = 0;

        for (i, c) in word.char_indices() {
            if c == '(' || c == ')' {
                if start < i {
                    tokens.push(&word[start..i]);
                }
                tokens.push(&word[i..i + 1]);
                start = i + 1;
            }
        }
        if start < word.len() {
            tokens.push(&word[start..]);
        }
    }

    tokens
}

/// Rewrites infix `text` into a postfix token stream.
pub fn to_postfix(text: &str) -> Result<Vec<&str>> {
    let mut queue = Vec::new();
    let mut stack: Vec<&str> = Vec::new();

    for token in tokenize(text) {
        if is_operator(token) {
            // Equal precedence and left associativity: flush every pending operator
            while let Some(&top) = stack.last() {
                if !is_operator(top) {
                    break;
                }
                queue.extend(stack.pop());
            }
            stack.push(token);
        } else if token == OPEN {
            stack.push(token);
        } else if token == CLOSE {
            loop {
                match stack.pop() {
                    Some(OPEN) => break,
                    Some(op) => queue.push(op),
                    None => {
                        return Err(FuzzyError::syntax_at(
                            format!("mismatching parentheses in <{text}>"),
                            CLOSE,
                        ))
                    },
                }
            }
        } else {
            queue.push(token);
        }
    }

    while let Some(token) = stack.pop() {
        if token == OPEN {
            return Err(FuzzyError::syntax_at(format!("mismatching parentheses in <{text}>"), OPEN));
        }
        queue.push(token);
    }

    Ok(queue)
}

#[test]
fn test_tokenize() {
    assert_eq!(tokenize("(x is A) and(y is B)"), vec!["(", "x", "is", "A", ")", "and", "(", "y", "is", "B", ")"]);
    assert_eq!(tokenize("  x \t is\nA  "), vec!["x", "is", "A"]);
    assert!(tokenize("").is_empty());
}

#[test]
fn test_to_postfix() {
    assert_eq!(
        to_postfix("x is A and y is B").unwrap(),
        vec!["x", "is", "A", "y", "is", "B", "and"]
    );
    assert_eq!(
        to_postfix("x is A or y is very B and z is C").unwrap(),
        vec!["x", "is", "A", "y", "is", "very", "B", "or", "z", "is", "C", "and"]
    );
    assert_eq!(
        to_postfix("x is A or (y is B and z is C)").unwrap(),
        vec!["x", "is", "A", "y", "is", "B", "z", "is", "C", "and", "or"]
    );
    assert_eq!(to_postfix("((x is any))").unwrap(), vec!["x", "is", "any"]);
}

#[test]
fn test_mismatched_parentheses() {
    for text in ["(x is A", "x is A)", "(x is A and (y is B)", ")("] {
        match to_postfix(text) {
            Err(FuzzyError::Syntax { message, .. }) => assert!(message.contains("mismatching parentheses")),
            other => panic!("expected syntax error for <{text}>, got {other:?}"),
        }
    }
}
