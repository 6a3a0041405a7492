//! Subroutine & Label Engine (C5).
//!
//! Grounded on the teacher's `interpreter/functions.rs` (bash function
//! definition/call machinery: parameter binding layered over parent scope,
//! call-depth tracking) and `interpreter/types.rs`'s `CallStackState`.

use super::engine::Interpreter;
use super::errors::{ControlResult, InterpreterError};
use super::evaluator;
use crate::ast::{Command, CommandKind};
use crate::interpreter::types::CallFrame;
use crate::value::Value;
use indexmap::IndexMap;

/// A discovered subroutine body: every command from its `LABEL` up to and
/// including the next `RETURN`, or the next `LABEL` (SPEC_FULL.md §4.4
/// "Discovery").
#[derive(Debug, Clone)]
pub struct Subroutine {
    pub body: Vec<Command>,
}

/// Pre-run discovery pass (SPEC_FULL.md §4.1 "runs label-discovery ... and
/// subroutine-discovery passes").
pub fn discover(commands: &[Command]) -> (IndexMap<String, usize>, IndexMap<String, Subroutine>) {
    let mut labels = IndexMap::new();
    let mut subroutines = IndexMap::new();

    for (index, command) in commands.iter().enumerate() {
        if let CommandKind::Label { name } = &command.kind {
            labels.insert(name.to_ascii_uppercase(), index);
        }
    }

    for (name, &start) in labels.iter() {
        let mut end = commands.len();
        for (index, command) in commands.iter().enumerate().skip(start + 1) {
            match &command.kind {
                CommandKind::Label { .. } => {
                    end = index;
                    break;
                }
                CommandKind::Return { .. } => {
                    end = index + 1;
                    break;
                }
                _ => {}
            }
        }
        let body = commands[start + 1..end].to_vec();
        subroutines.insert(name.clone(), Subroutine { body });
    }

    (labels, subroutines)
}

/// `CALL name [args...]` (SPEC_FULL.md §4.4).
///
/// This core has no embedding host that resolves external-script paths to a
/// filesystem, so the "invoke the external-script executor" branch is not
/// implemented; every `CALL` target must resolve to an in-program label.
pub async fn execute_call(
    interp: &mut Interpreter,
    subroutine: &str,
    arguments: &[crate::ast::Expr],
) -> Result<Value, InterpreterError> {
    let mut argv = Vec::with_capacity(arguments.len());
    for arg in arguments {
        argv.push(Box::pin(evaluator::evaluate(interp, arg)).await?);
    }

    let name = subroutine.to_ascii_uppercase();
    let body = interp
        .subroutines
        .get(&name)
        .ok_or_else(|| InterpreterError::UndefinedLabel(name.clone()))?
        .body
        .clone();

    if interp.call_stack.len() as u32 >= interp.options.limits.max_recursion_depth {
        return Err(InterpreterError::ExecutionLimit("CALL recursion depth exceeded".to_string()));
    }

    let pre_call_result = interp.variables.get("RESULT");
    interp.call_stack.push(CallFrame { argv, pre_call_result });
    interp.push_frame(crate::interpreter::types::FrameKind::Call, 0, String::new());

    let outcome = Box::pin(super::engine::execute_block(interp, &body)).await;

    interp.pop_frame();
    let frame = interp.call_stack.pop();

    match outcome {
        Ok(ControlResult::Returned(value)) => {
            interp.variables.set("RESULT", value.clone());
            Ok(value)
        }
        Ok(_) => {
            // Subroutine fell through without RETURN: RESULT is restored to
            // its pre-call value (classical REXX behavior).
            if let Some(frame) = frame {
                interp.variables.set("RESULT", frame.pre_call_result);
            }
            Ok(Value::Absent)
        }
        Err(err) => Err(err),
    }
}

/// `ARG()` built-in: `ARG()` -> count, `ARG(n)` -> 1-based value or empty,
/// `ARG(n,'E')` -> exists, `ARG(n,'O')` -> omitted (SPEC_FULL.md §4.4).
pub fn arg_builtin(interp: &Interpreter, n: Option<i64>, mode: Option<&str>) -> Value {
    let argv = interp.call_stack.last().map(|f| f.argv.as_slice()).unwrap_or(&[]);
    match n {
        None => Value::Integer(argv.len() as i64),
        Some(n) if n >= 1 => {
            let index = (n - 1) as usize;
            let exists = index < argv.len();
            match mode {
                Some(m) if m.eq_ignore_ascii_case("E") => Value::Bool(exists),
                Some(m) if m.eq_ignore_ascii_case("O") => Value::Bool(!exists),
                _ => argv.get(index).cloned().unwrap_or(Value::string("")),
            }
        }
        Some(_) => Value::string(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    #[test]
    fn discovery_splits_on_labels_and_returns() {
        let commands = vec![
            Command::new(1, CommandKind::Label { name: "SUB1".to_string() }),
            Command::new(2, CommandKind::Say { value: Expr::StringLiteral("hi".into()) }),
            Command::new(3, CommandKind::Return { value: None }),
            Command::new(4, CommandKind::Label { name: "SUB2".to_string() }),
            Command::new(5, CommandKind::Return { value: None }),
        ];
        let (labels, subs) = discover(&commands);
        assert_eq!(labels["SUB1"], 0);
        assert_eq!(labels["SUB2"], 3);
        assert_eq!(subs["SUB1"].body.len(), 2);
        assert_eq!(subs["SUB2"].body.len(), 1);
    }

    #[tokio::test]
    async fn call_binds_args_and_returns_value() {
        use crate::interpreter::engine::Interpreter;
        use crate::interpreter::types::InterpreterOptions;

        let commands = vec![
            Command::new(1, CommandKind::Label { name: "DOUBLE".to_string() }),
            Command::new(
                2,
                CommandKind::Return {
                    value: Some(Expr::Arithmetic {
                        op: crate::ast::ArithOp::Mul,
                        left: Box::new(Expr::FunctionCall {
                            name: "ARG".to_string(),
                            args: vec![crate::ast::CallArg::positional(Expr::IntLiteral(1))],
                        }),
                        right: Box::new(Expr::IntLiteral(2)),
                    }),
                },
            ),
        ];
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let (labels, subs) = discover(&commands);
        interp.labels = labels;
        interp.subroutines = subs;
        interp.install_stdlib();
        let result = execute_call(&mut interp, "DOUBLE", &[Expr::IntLiteral(21)]).await.unwrap();
        assert_eq!(result, Value::Integer(42));
    }
}
