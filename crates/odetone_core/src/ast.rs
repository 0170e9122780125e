use crate::error::CompileError;
use crate::parser::RpnItem;
use crate::resolve::{Func, Region};
use std::fmt;

/// Binary arithmetic operators of the expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    pub fn symbol(self) -> char {
        match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
            BinOp::Pow => '^',
        }
    }
}

/// Typed expression tree for one equation right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    Time,
    Access { region: Region, index: usize },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Neg(Box<Expr>),
    Call { func: Func, arg: Box<Expr> },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Time => write!(f, "t"),
            Expr::Access { region, index } => write!(f, "{}[{index}]", region.array_name()),
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Neg(operand) => write!(f, "-{operand}"),
            Expr::Call { func, arg } => write!(f, "{}({arg})", func.name()),
        }
    }
}

/// Reduces an RPN sequence to a single expression tree via an operand stack.
///
/// Operators pop as many operands as their arity; popping from an empty or
/// too-shallow stack reports the offending operator. Anything other than
/// exactly one operand at the end is an unbalanced expression, reported
/// together with the final stack contents.
pub fn build_ast(rpn: &[RpnItem]) -> Result<Expr, CompileError> {
    let mut stack: Vec<Expr> = Vec::new();

    for item in rpn {
        match item {
            RpnItem::Number(value) => stack.push(Expr::Literal(*value)),
            RpnItem::Time => stack.push(Expr::Time),
            RpnItem::Access { region, index } => stack.push(Expr::Access {
                region: *region,
                index: *index,
            }),
            RpnItem::Binary(op) => {
                if stack.len() < 2 {
                    return Err(CompileError::InsufficientOperands {
                        op: op.symbol().to_string(),
                        needed: 2,
                        available: stack.len(),
                    });
                }
                // Popping order: right operand was pushed last.
                let rhs = stack.pop().map(Box::new);
                let lhs = stack.pop().map(Box::new);
                if let (Some(lhs), Some(rhs)) = (lhs, rhs) {
                    stack.push(Expr::Binary { op: *op, lhs, rhs });
                }
            }
            RpnItem::UnaryNeg => {
                let operand = stack.pop().ok_or_else(|| CompileError::InsufficientOperands {
                    op: "unary -".to_string(),
                    needed: 1,
                    available: 0,
                })?;
                stack.push(Expr::Neg(Box::new(operand)));
            }
            RpnItem::Func(func) => {
                let arg = stack.pop().ok_or_else(|| CompileError::InsufficientOperands {
                    op: func.name().to_string(),
                    needed: 1,
                    available: 0,
                })?;
                stack.push(Expr::Call {
                    func: *func,
                    arg: Box::new(arg),
                });
            }
        }
    }

    if stack.len() == 1 {
        return Ok(stack.remove(0));
    }
    let summary = stack
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(CompileError::Unbalanced {
        leftover: stack.len(),
        summary,
    })
}
