//! Expression placeholder evaluation.
//!
//! An expression placeholder is the expression leader (default `=>`)
//! followed by source in a small, safe expression language: arithmetic,
//! comparisons, field access on the `rec`/`ctx`/`data` bindings, and calls
//! into caller-registered context functions. Dynamic code execution is
//! deliberately not supported; configuration authors get a fixed grammar and
//! a whitelisted function set instead.
//!
//! ## Components
//!
//! * `ast` - expression tree and runtime values
//! * `parser` - PEST-based parser producing the AST
//! * `interpreter` - evaluator over named bindings and registered functions

pub mod ast;
pub mod interpreter;
pub mod parser;

pub use ast::{Expression, Operator, UnaryOperator, Value};
pub use interpreter::{builtin_functions, ContextFunction, Interpreter};
pub use parser::ExpressionParser;
