//! The `odetone_core` crate is the host-independent engine for odetone:
//! equation text describing the right-hand side of a first-order ODE system
//! is compiled into an executable module, which fixed-step integrators then
//! drive at audio rate.
//!
//! Key components:
//! - **Compiler pipeline**: `lexer` (text → tokens), `resolve` (names →
//!   positional accesses), `parser` (shunting-yard infix → RPN), `ast`
//!   (RPN → expression tree), `codegen` (tree → instruction program).
//! - **Module**: the assembled, validated program with its linear-memory
//!   ABI and the exported `evaluate(t, y, p, result)` entry point.
//! - **Solvers**: numerical integrators (Euler, RK4) over the
//!   `VectorField`/`Steppable` seams in `traits`.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod module;
pub mod parser;
pub mod resolve;
pub mod solvers;
pub mod traits;
