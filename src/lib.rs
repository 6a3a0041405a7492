//! `rexx-core`: an embeddable interpreter for a REXX-family scripting
//! language (see SPEC_FULL.md for the full component map, C1-C14).
//!
//! The pipeline is `parser::parse_script` -> `ast::Script` ->
//! `interpreter::Interpreter::run`. `builtins` installs the leaf-level
//! function library into a fresh interpreter; `security` gates what
//! `REQUIRE` is allowed to resolve.

pub mod ast;
pub mod builtins;
pub mod interpreter;
pub mod parser;
pub mod security;
pub mod value;

pub use interpreter::{ControlResult, ExecResult, Interpreter, InterpreterError, InterpreterOptions};
pub use parser::{parse_expression_str, parse_script};
pub use value::Value;
