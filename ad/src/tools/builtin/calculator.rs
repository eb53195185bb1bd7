//! Safe arithmetic evaluator
//!
//! Supports + - * / and parentheses over f64, with unary minus.
//! Shunting-yard to RPN, then a stack evaluation; no eval, no ambient
//! state.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError};

pub struct CalculatorTool;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    LParen,
    RParen,
}

impl Token {
    fn precedence(&self) -> u8 {
        match self {
            Token::Add | Token::Sub => 1,
            Token::Mul | Token::Div => 2,
            Token::Neg => 3,
            _ => 0,
        }
    }

    fn is_operator(&self) -> bool {
        matches!(self, Token::Add | Token::Sub | Token::Mul | Token::Div | Token::Neg)
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ToolError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = literal
                    .parse()
                    .map_err(|_| ToolError::InvalidInput(format!("bad number: {literal}")))?;
                tokens.push(Token::Number(value));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Add);
            }
            '-' => {
                chars.next();
                // Unary when at the start or right after an operator/open paren
                let unary = match tokens.last() {
                    None => true,
                    Some(t) => t.is_operator() || *t == Token::LParen,
                };
                tokens.push(if unary { Token::Neg } else { Token::Sub });
            }
            '*' => {
                chars.next();
                tokens.push(Token::Mul);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Div);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            other => {
                return Err(ToolError::InvalidInput(format!("unexpected character: {other}")));
            }
        }
    }
    Ok(tokens)
}

fn to_rpn(tokens: Vec<Token>) -> Result<Vec<Token>, ToolError> {
    let mut output = Vec::new();
    let mut ops: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Number(_) => output.push(token),
            Token::LParen => ops.push(token),
            Token::RParen => {
                loop {
                    match ops.pop() {
                        Some(Token::LParen) => break,
                        Some(op) => output.push(op),
                        None => return Err(ToolError::InvalidInput("unbalanced parentheses".to_string())),
                    }
                }
            }
            op if op.is_operator() => {
                while let Some(top) = ops.last() {
                    // Neg is right-associative; binary ops are left-associative
                    let pop = top.is_operator()
                        && (top.precedence() > op.precedence()
                            || (top.precedence() == op.precedence() && op != Token::Neg));
                    if pop {
                        output.push(ops.pop().expect("checked last"));
                    } else {
                        break;
                    }
                }
                ops.push(op);
            }
            _ => unreachable!(),
        }
    }

    while let Some(op) = ops.pop() {
        if op == Token::LParen {
            return Err(ToolError::InvalidInput("unbalanced parentheses".to_string()));
        }
        output.push(op);
    }
    Ok(output)
}

fn eval_rpn(rpn: Vec<Token>) -> Result<f64, ToolError> {
    let mut stack: Vec<f64> = Vec::new();

    for token in rpn {
        match token {
            Token::Number(v) => stack.push(v),
            Token::Neg => {
                let v = stack
                    .pop()
                    .ok_or_else(|| ToolError::InvalidInput("malformed expression".to_string()))?;
                stack.push(-v);
            }
            op => {
                let rhs = stack
                    .pop()
                    .ok_or_else(|| ToolError::InvalidInput("malformed expression".to_string()))?;
                let lhs = stack
                    .pop()
                    .ok_or_else(|| ToolError::InvalidInput("malformed expression".to_string()))?;
                let result = match op {
                    Token::Add => lhs + rhs,
                    Token::Sub => lhs - rhs,
                    Token::Mul => lhs * rhs,
                    Token::Div => {
                        if rhs == 0.0 {
                            return Err(ToolError::ExecutionFailed("division by zero".to_string()));
                        }
                        lhs / rhs
                    }
                    _ => unreachable!(),
                };
                stack.push(result);
            }
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(result), true) => Ok(result),
        _ => Err(ToolError::InvalidInput("malformed expression".to_string())),
    }
}

/// Evaluate an arithmetic expression
pub fn evaluate(expr: &str) -> Result<f64, ToolError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(ToolError::InvalidInput("empty expression".to_string()));
    }
    eval_rpn(to_rpn(tokens)?)
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &'static str {
        "calculator"
    }

    fn description(&self) -> &'static str {
        "Evaluate an arithmetic expression with + - * / and parentheses."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression, e.g. (2 + 3) * 4"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, input: Value, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let expression = input
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput("expression is required".to_string()))?;

        debug!(%expression, "CalculatorTool::execute: called");
        let result = evaluate(expression)?;
        Ok(json!({ "expression": expression, "result": result }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn test_division_and_floats() {
        assert_eq!(evaluate("7 / 2").unwrap(), 3.5);
        assert_eq!(evaluate("0.5 * 4").unwrap(), 2.0);
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(evaluate("-3 + 5").unwrap(), 2.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
        assert_eq!(evaluate("-(2 + 3)").unwrap(), -5.0);
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("16 / 4 / 2").unwrap(), 2.0);
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(evaluate("1 / 0"), Err(ToolError::ExecutionFailed(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(evaluate("2 + x").is_err());
        assert!(evaluate("(2 + 3").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("").is_err());
    }
}
