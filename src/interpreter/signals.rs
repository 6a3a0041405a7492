//! Error & Signal Handling (C6): `SIGNAL ON/OFF`, error-context snapshot,
//! jump-to-label, and the exception-taxonomy classification table.
//!
//! Grounded on the teacher's `interpreter/errors.rs` `ControlFlowError`
//! trait and per-condition error structs — one struct per condition,
//! composed via `thiserror` (§10.5) instead of hand-written `Display`/
//! `Error`/`From` impls.

use super::errors::InterpreterError;
use super::types::ErrorHandlerTable;
use crate::value::Value;
use indexmap::IndexMap;

/// The condition names `SIGNAL ON`/`SIGNAL OFF` install handlers against
/// (SPEC_FULL.md §3 "Error Handler Table").
pub const CONDITION_ERROR: &str = "ERROR";
pub const CONDITION_SYNTAX: &str = "SYNTAX";
pub const CONDITION_HALT: &str = "HALT";
pub const CONDITION_NOVALUE: &str = "NOVALUE";
pub const CONDITION_FAILURE: &str = "FAILURE";

/// Rich error-context snapshot populated when a handler fires (SPEC_FULL.md
/// §4.5 step 2).
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub line: u32,
    pub message: String,
    pub function_name: Option<String>,
    pub command_text: String,
    pub variables: IndexMap<String, Value>,
}

/// What C14 should do after an exception is raised (SPEC_FULL.md §4.1 step
/// "On thrown exception").
pub enum SignalOutcome {
    /// A `SIGNAL ON <cond>` handler claims this error; jump to its label.
    Jump(String),
    /// No handler claims it, but the taxonomy recognizes it as a
    /// terminated-with-error case (e.g. DOM-stale with no surrounding
    /// `RETRY_ON_STALE`).
    TerminatedWithError,
    /// Not recognized/handled; annotate with the source line and propagate.
    Unhandled,
}

/// Explicit taxonomy table mapping an `InterpreterError` to the condition
/// name `SIGNAL ON` installs handlers against (SPEC_FULL.md §9 Open
/// Question 1).
///
/// - parse/lexer-originated failures -> `SYNTAX`
/// - arithmetic, undefined-function/operation, ADDRESS-handler, bad-argument
///   failures -> `ERROR`
/// - execution-limit and REQUIRE failures are never claimed by either;
///   REQUIRE failures always bypass SIGNAL per §7.
/// - `HALT`/`NOVALUE` are installable but never raised internally by this
///   core (no external halt source, no strict-NOVALUE mode).
pub fn classify_error(error: &InterpreterError) -> Option<&'static str> {
    match error {
        InterpreterError::Syntax(_) => Some(CONDITION_SYNTAX),
        InterpreterError::NonNumericArithmetic(_) | InterpreterError::DivisionByZero => {
            Some(CONDITION_ERROR)
        }
        InterpreterError::UndefinedFunction(_)
        | InterpreterError::MissingParameter { .. }
        | InterpreterError::InvalidVariableReference(_) => Some(CONDITION_ERROR),
        InterpreterError::AddressFailure { .. } => Some(CONDITION_ERROR),
        InterpreterError::RequireFailure(_) => None,
        InterpreterError::InterpretFailure(_) => Some(CONDITION_ERROR),
        InterpreterError::StaleReference(_) => Some(CONDITION_FAILURE),
        InterpreterError::UndefinedLabel(_) => Some(CONDITION_ERROR),
        InterpreterError::ExecutionLimit(_) => None,
        InterpreterError::Other(_) => Some(CONDITION_ERROR),
    }
}

/// Decide the signal outcome for `error` given the currently installed
/// handler table (SPEC_FULL.md §4.5).
pub fn resolve(handlers: &ErrorHandlerTable, error: &InterpreterError) -> SignalOutcome {
    if let Some(condition) = classify_error(error) {
        if let Some(entry) = handlers.lookup(condition) {
            return SignalOutcome::Jump(entry.label.clone());
        }
    }
    match error {
        InterpreterError::StaleReference(_) => SignalOutcome::TerminatedWithError,
        InterpreterError::RequireFailure(_) => SignalOutcome::Unhandled,
        _ => SignalOutcome::Unhandled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_maps_to_error_condition() {
        assert_eq!(classify_error(&InterpreterError::DivisionByZero), Some(CONDITION_ERROR));
    }

    #[test]
    fn require_failure_is_never_claimed() {
        assert_eq!(classify_error(&InterpreterError::RequireFailure("x".into())), None);
    }

    #[test]
    fn installed_handler_produces_jump() {
        let mut handlers = ErrorHandlerTable::default();
        handlers.install(CONDITION_ERROR, "HANDLER");
        match resolve(&handlers, &InterpreterError::DivisionByZero) {
            SignalOutcome::Jump(label) => assert_eq!(label, "HANDLER"),
            _ => panic!("expected jump"),
        }
    }

    #[test]
    fn signal_on_off_idempotence() {
        let mut handlers = ErrorHandlerTable::default();
        handlers.install(CONDITION_ERROR, "L");
        handlers.install(CONDITION_ERROR, "L");
        assert_eq!(handlers.lookup(CONDITION_ERROR).unwrap().label, "L");
    }
}
