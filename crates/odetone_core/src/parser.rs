use crate::ast::BinOp;
use crate::error::{CompileError, ParseError};
use crate::resolve::{Func, Region, ResolvedToken};

/// One element of the postfix (RPN) form of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum RpnItem {
    Number(f64),
    Time,
    Access { region: Region, index: usize },
    Binary(BinOp),
    UnaryNeg,
    Func(Func),
}

enum StackItem {
    Binary(BinOp),
    UnaryNeg,
    Func(Func),
    LParen,
}

const UNARY_NEG_PRECEDENCE: u8 = 5;

fn precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 2,
        BinOp::Mul | BinOp::Div => 3,
        BinOp::Pow => 4,
    }
}

fn right_assoc(op: BinOp) -> bool {
    op == BinOp::Pow
}

/// Shunting-yard conversion of a resolved infix token stream to RPN.
///
/// A `-` is classified as unary negation when no operand precedes it
/// (start of expression, or after an operator, `(`, or `,`). Function
/// markers sit on the operator stack until their closing parenthesis, or
/// until any operator arrives, which binds them tighter than everything
/// else.
pub fn to_rpn(tokens: &[ResolvedToken]) -> Result<Vec<RpnItem>, CompileError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<StackItem> = Vec::new();
    // True after a value or ')', i.e. wherever a binary operator may appear.
    let mut prev_operand = false;

    for token in tokens {
        match token {
            ResolvedToken::Number(value) => {
                output.push(RpnItem::Number(*value));
                prev_operand = true;
            }
            ResolvedToken::Time => {
                output.push(RpnItem::Time);
                prev_operand = true;
            }
            ResolvedToken::Access { region, index } => {
                output.push(RpnItem::Access {
                    region: *region,
                    index: *index,
                });
                prev_operand = true;
            }
            ResolvedToken::Func(func) => {
                stack.push(StackItem::Func(*func));
                prev_operand = false;
            }
            ResolvedToken::LParen => {
                stack.push(StackItem::LParen);
                prev_operand = false;
            }
            ResolvedToken::RParen => {
                loop {
                    match stack.pop() {
                        Some(StackItem::LParen) => break,
                        Some(item) => output.push(forward(item)),
                        None => return Err(ParseError::UnmatchedCloseParen.into()),
                    }
                }
                if matches!(stack.last(), Some(StackItem::Func(_))) {
                    if let Some(item) = stack.pop() {
                        output.push(forward(item));
                    }
                }
                prev_operand = true;
            }
            ResolvedToken::Op(',') => {
                loop {
                    match stack.last() {
                        Some(StackItem::LParen) => break,
                        Some(_) => {
                            if let Some(item) = stack.pop() {
                                output.push(forward(item));
                            }
                        }
                        None => return Err(ParseError::MisplacedComma.into()),
                    }
                }
                prev_operand = false;
            }
            ResolvedToken::Op(op) => {
                let unary = *op == '-' && !prev_operand;
                let (prec, right) = if unary {
                    (UNARY_NEG_PRECEDENCE, true)
                } else {
                    let op = binop(*op);
                    (precedence(op), right_assoc(op))
                };

                while let Some(top) = stack.last() {
                    let top_prec = match top {
                        StackItem::Func(_) => {
                            if let Some(item) = stack.pop() {
                                output.push(forward(item));
                            }
                            continue;
                        }
                        StackItem::Binary(top_op) => precedence(*top_op),
                        StackItem::UnaryNeg => UNARY_NEG_PRECEDENCE,
                        StackItem::LParen => break,
                    };
                    let pop = if right { prec < top_prec } else { prec <= top_prec };
                    if !pop {
                        break;
                    }
                    if let Some(item) = stack.pop() {
                        output.push(forward(item));
                    }
                }

                stack.push(if unary {
                    StackItem::UnaryNeg
                } else {
                    StackItem::Binary(binop(*op))
                });
                prev_operand = false;
            }
        }
    }

    while let Some(item) = stack.pop() {
        match item {
            StackItem::LParen => return Err(ParseError::MissingCloseParen.into()),
            other => output.push(forward(other)),
        }
    }

    Ok(output)
}

fn binop(op: char) -> BinOp {
    match op {
        '+' => BinOp::Add,
        '-' => BinOp::Sub,
        '*' => BinOp::Mul,
        '/' => BinOp::Div,
        '^' => BinOp::Pow,
        other => unreachable!("lexer only emits + - * / ^ as binary operators, got '{other}'"),
    }
}

fn forward(item: StackItem) -> RpnItem {
    match item {
        StackItem::Binary(op) => RpnItem::Binary(op),
        StackItem::UnaryNeg => RpnItem::UnaryNeg,
        StackItem::Func(func) => RpnItem::Func(func),
        StackItem::LParen => unreachable!("parentheses are never forwarded to the output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::resolve::SymbolTable;

    fn rpn(expr: &str) -> Vec<RpnItem> {
        let table = SymbolTable::new(
            &["x".to_string(), "v".to_string()],
            &["a".to_string(), "b".to_string()],
        )
        .expect("table");
        let tokens = tokenize(expr).expect("tokens");
        let resolved = table.resolve(&tokens).expect("resolved");
        to_rpn(&resolved).expect("rpn")
    }

    fn num(v: f64) -> RpnItem {
        RpnItem::Number(v)
    }

    fn state(i: usize) -> RpnItem {
        RpnItem::Access {
            region: Region::State,
            index: i,
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            rpn("1 + 2 * 3"),
            vec![
                num(1.0),
                num(2.0),
                num(3.0),
                RpnItem::Binary(BinOp::Mul),
                RpnItem::Binary(BinOp::Add),
            ]
        );
    }

    #[test]
    fn same_precedence_associates_left() {
        // a - b + c must parse as (a - b) + c.
        assert_eq!(
            rpn("1 - 2 + 3"),
            vec![
                num(1.0),
                num(2.0),
                RpnItem::Binary(BinOp::Sub),
                num(3.0),
                RpnItem::Binary(BinOp::Add),
            ]
        );
    }

    #[test]
    fn power_associates_right() {
        assert_eq!(
            rpn("2 ^ 3 ^ 2"),
            vec![
                num(2.0),
                num(3.0),
                num(2.0),
                RpnItem::Binary(BinOp::Pow),
                RpnItem::Binary(BinOp::Pow),
            ]
        );
    }

    #[test]
    fn unary_minus_binds_tighter_than_multiplication() {
        assert_eq!(
            rpn("2 * -x"),
            vec![
                num(2.0),
                state(0),
                RpnItem::UnaryNeg,
                RpnItem::Binary(BinOp::Mul),
            ]
        );
    }

    #[test]
    fn unary_minus_yields_to_power_on_its_right() {
        // Per the operator table, -x^2 groups as (-x)^2.
        assert_eq!(
            rpn("-x ^ 2"),
            vec![
                state(0),
                RpnItem::UnaryNeg,
                num(2.0),
                RpnItem::Binary(BinOp::Pow),
            ]
        );
    }

    #[test]
    fn function_call_groups_its_argument() {
        assert_eq!(
            rpn("sin(x + 1)"),
            vec![
                state(0),
                num(1.0),
                RpnItem::Binary(BinOp::Add),
                RpnItem::Func(Func::Sin),
            ]
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            rpn("(1 + 2) * 3"),
            vec![
                num(1.0),
                num(2.0),
                RpnItem::Binary(BinOp::Add),
                num(3.0),
                RpnItem::Binary(BinOp::Mul),
            ]
        );
    }

    fn rpn_err(expr: &str) -> CompileError {
        let table = SymbolTable::new(&["x".to_string()], &[]).expect("table");
        let tokens = tokenize(expr).expect("tokens");
        let resolved = table.resolve(&tokens).expect("resolved");
        to_rpn(&resolved).unwrap_err()
    }

    #[test]
    fn unmatched_close_paren_is_an_error() {
        assert_eq!(
            rpn_err("x + 1)"),
            CompileError::Parse(ParseError::UnmatchedCloseParen)
        );
    }

    #[test]
    fn missing_close_paren_is_an_error() {
        assert_eq!(
            rpn_err("(x + 1"),
            CompileError::Parse(ParseError::MissingCloseParen)
        );
    }

    #[test]
    fn comma_outside_call_is_an_error() {
        assert_eq!(
            rpn_err("x, 1"),
            CompileError::Parse(ParseError::MisplacedComma)
        );
    }
}
