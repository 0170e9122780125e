use crate::ast::{build_ast, BinOp, Expr};
use crate::error::CompileError;
use crate::lexer::tokenize;
use crate::module::{Instr, MemoryLayout, Program, WORD};
use crate::parser::to_rpn;
use crate::resolve::{Func, SymbolTable};

/// Runs the full front end on one expression: text → tokens → resolved
/// tokens → RPN → AST.
pub fn compile_expression(source: &str, symbols: &SymbolTable) -> Result<Expr, CompileError> {
    let tokens = tokenize(source)?;
    let resolved = symbols.resolve(&tokens)?;
    let rpn = to_rpn(&resolved)?;
    build_ast(&rpn)
}

/// Recursively lowers an expression tree into stack-machine instructions
/// that leave exactly one value on the evaluation stack.
pub fn lower_expr(expr: &Expr, code: &mut Vec<Instr>) {
    match expr {
        Expr::Literal(value) => code.push(Instr::ConstF64(*value)),
        Expr::Time => code.push(Instr::LoadTime),
        Expr::Access { region, index } => code.push(Instr::Load {
            region: *region,
            offset: index * WORD,
        }),
        Expr::Binary { op, lhs, rhs } => {
            lower_expr(lhs, code);
            lower_expr(rhs, code);
            code.push(match op {
                BinOp::Add => Instr::Add,
                BinOp::Sub => Instr::Sub,
                BinOp::Mul => Instr::Mul,
                BinOp::Div => Instr::Div,
                BinOp::Pow => Instr::Pow,
            });
        }
        Expr::Neg(operand) => {
            lower_expr(operand, code);
            code.push(Instr::Neg);
        }
        Expr::Call { func, arg } => {
            lower_expr(arg, code);
            code.push(match func {
                Func::Sin => Instr::Sin,
                Func::Cos => Instr::Cos,
                Func::Tan => Instr::Tan,
                Func::Exp => Instr::Exp,
                Func::Log => Instr::Log,
                Func::Sqrt => Instr::Sqrt,
                Func::Abs => Instr::Abs,
            });
        }
    }
}

/// Compiles every equation of a system into one module source: the body of
/// each equation followed by a store into its slot of the result region,
/// in Equation Set order. Output is a pure function of the inputs, so
/// identical text and declaration orders yield an identical `Program`.
pub fn compile_system(
    equations: &[String],
    symbols: &SymbolTable,
) -> Result<Program, CompileError> {
    let layout = MemoryLayout::new(symbols.state_len(), symbols.param_len());
    let mut code = Vec::new();
    for (slot, source) in equations.iter().enumerate() {
        let expr = compile_expression(source, symbols)?;
        lower_expr(&expr, &mut code);
        code.push(Instr::Store { offset: slot * WORD });
    }
    Ok(Program { code, layout })
}
