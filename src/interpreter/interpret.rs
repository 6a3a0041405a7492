//! INTERPRET Engine (C10).
//!
//! Grounded on the teacher's `interpreter/subshell_group.rs` (child-state-
//! forking pattern for `( … )` subshells: copy in, copy out a restricted
//! variable set) adapted to REXX's three INTERPRET scope modes
//! (SPEC_FULL.md §4.9).

use super::engine::Interpreter;
use super::errors::{ControlResult, InterpreterError};
use super::evaluator;
use crate::ast::InterpretMode;
use crate::value::Value;

/// Execute a run-time-supplied program fragment under one of the three
/// scope modes (SPEC_FULL.md §4.9 table).
pub async fn execute_interpret(
    interp: &mut Interpreter,
    source: &crate::ast::Expr,
    mode: &InterpretMode,
    import: &[String],
    export: &[String],
) -> Result<ControlResult, InterpreterError> {
    if interp.no_interpret {
        return Err(InterpreterError::InterpretFailure(
            "NO-INTERPRET is in effect".to_string(),
        ));
    }

    let code = evaluator::evaluate(interp, source).await?.to_display_string();
    let script = crate::parser::parse_script(&code)
        .map_err(|e| InterpreterError::InterpretFailure(format!("{}: {}", code, e)))?;

    interp.push_frame(
        crate::interpreter::types::FrameKind::Interpret,
        interp.current_line(),
        code.clone(),
    );

    let snapshot = match mode {
        InterpretMode::Default | InterpretMode::Classic => None,
        InterpretMode::Isolated => {
            let mut isolated = std::collections::HashMap::new();
            for name in import {
                isolated.insert(name.clone(), interp.variables.get(name));
            }
            Some(isolated)
        }
    };

    let previous_vars = interp.variables.clone();
    if let Some(isolated) = &snapshot {
        let mut fresh = crate::value::VariableStore::new();
        for (k, v) in isolated {
            fresh.set(k, v.clone());
        }
        interp.variables = fresh;
    }

    let outcome = Box::pin(super::engine::execute_block(interp, &script.commands)).await;

    let result = match outcome {
        Ok(control) => control,
        Err(err) => {
            interp.pop_frame();
            // Restore caller's variables before surfacing the error so a
            // partially-mutated isolated scope never leaks.
            if snapshot.is_some() {
                interp.variables = previous_vars;
            }
            return Err(InterpreterError::InterpretFailure(format!(
                "code: {}; cause: {}",
                code, err
            )));
        }
    };

    match mode {
        InterpretMode::Default | InterpretMode::Classic => {}
        InterpretMode::Isolated => {
            let exported: Vec<(String, Value)> =
                export.iter().map(|name| (name.clone(), interp.variables.get(name))).collect();
            interp.variables = previous_vars;
            for (name, value) in exported {
                interp.variables.set(&name, value);
            }
        }
    }

    interp.pop_frame();
    Ok(result)
}
