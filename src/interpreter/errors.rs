//! Error & Signal Handling types (C6).
//!
//! Control flow that needs to unwind past `IF`/`DO`/`SELECT` bodies (RETURN,
//! EXIT, SIGNAL jumps) is modeled as data, not as a panic or a native
//! exception — see SPEC_FULL.md §9 "Exceptions for control flow". This
//! mirrors the teacher's `interpreter/errors.rs`, one leaf error type per
//! condition composed into a single enum via `thiserror`.

use crate::value::Value;
use thiserror::Error;

/// One raised failure, tagged by the taxonomy SPEC_FULL.md §7/§9 defines.
/// `SIGNAL ON` handlers are installed against the taxonomy's condition names
/// (see `signals::classify_error`), not against this enum's variant names
/// directly.
#[derive(Debug, Error, Clone)]
pub enum InterpreterError {
    #[error("arithmetic on non-numeric value: {0}")]
    NonNumericArithmetic(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("undefined function or operation: {0}")]
    UndefinedFunction(String),

    #[error("{function}: missing required parameter {parameter}")]
    MissingParameter { function: String, parameter: String },

    #[error("invalid variable reference: {0}")]
    InvalidVariableReference(String),

    #[error("ADDRESS {target} failed: {message}")]
    AddressFailure { target: String, message: String },

    #[error("REQUIRE {0}")]
    RequireFailure(String),

    #[error("INTERPRET failed: {0}")]
    InterpretFailure(String),

    #[error("stale reference: {0}")]
    StaleReference(String),

    #[error("label not found: {0}")]
    UndefinedLabel(String),

    #[error("{0}")]
    ExecutionLimit(String),

    #[error("{0}")]
    Syntax(String),

    #[error("{0}")]
    Other(String),
}

impl InterpreterError {
    pub fn other(msg: impl Into<String>) -> Self {
        InterpreterError::Other(msg.into())
    }
}

/// Sentinel produced by executing one command, replacing thrown exceptions
/// for RETURN/EXIT/SIGNAL per SPEC_FULL.md §9.
#[derive(Debug, Clone)]
pub enum ControlResult {
    /// Fall through to the next command.
    Continue,
    /// `SIGNAL label` — caller's responsibility to transfer control.
    JumpToLabel(String),
    /// `RETURN [value]` — bubbles to the nearest call frame, or becomes the
    /// run's result at top level.
    Returned(Value),
    /// `EXIT [code]` — always terminates the run.
    Exited(Value),
}

pub type ExecResult = Result<ControlResult, InterpreterError>;
