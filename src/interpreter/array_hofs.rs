//! Interpreter-aware Array HOFs (C12): `ARRAY_FILTER`/`ARRAY_MAP` (and
//! `FILTER`/`MAP` aliases) that detect REXX-lambda vs host-style callback
//! text and dispatch accordingly.
//!
//! Grounded on the teacher's `commands/jq/mod.rs` (a filter-expression-over-
//! JSON-values command that already straddles "plain value op" vs
//! "expression evaluated per element") as the structural model for a
//! callback-style-detecting HOF.

use super::engine::Interpreter;
use super::errors::InterpreterError;
use super::evaluator;
use crate::value::Value;

/// How a callback string should be evaluated (SPEC_FULL.md §4.11).
#[derive(Debug, Clone, PartialEq, Eq)]
enum CallbackStyle {
    /// `param => body`, body contains no host-language dot-notation: a REXX
    /// lambda binding `param`.
    RexxLambda { param: String, body: String },
    /// No arrow, but the body reads as a REXX expression (function calls or
    /// `' & '`/`' | '` with no `&&`/`||`/`===`/`!==`): implicit `item`.
    RexxImplicitItem { body: String },
    /// Arrow form whose body uses dot-notation, or a non-REXX-looking
    /// expression: not evaluated by this core (no host-language runtime is
    /// embedded here; see SPEC_FULL.md §1 scope).
    HostStyle,
}

fn classify_callback(expr: &str) -> CallbackStyle {
    let trimmed = expr.trim();
    if let Some(idx) = trimmed.find("=>") {
        let param = trimmed[..idx].trim().to_string();
        let body = trimmed[idx + 2..].trim().to_string();
        if body.contains(".length") || body.contains(".includes") {
            return CallbackStyle::HostStyle;
        }
        return CallbackStyle::RexxLambda { param, body };
    }

    let has_rexx_logical = trimmed.contains(" & ") || trimmed.contains(" | ");
    let has_host_logical = trimmed.contains("&&")
        || trimmed.contains("||")
        || trimmed.contains("===")
        || trimmed.contains("!==");
    let looks_rexx_call = trimmed.chars().any(|c| c == '(')
        && trimmed.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false);

    if (has_rexx_logical || looks_rexx_call) && !has_host_logical {
        CallbackStyle::RexxImplicitItem { body: trimmed.to_string() }
    } else {
        CallbackStyle::HostStyle
    }
}

async fn eval_rexx_callback(
    interp: &mut Interpreter,
    param: &str,
    body: &str,
    item: &Value,
) -> Result<Value, InterpreterError> {
    let expr = crate::parser::parse_expression_str(body)
        .map_err(|e| InterpreterError::Other(format!("invalid callback expression: {}", e)))?;
    let previous = interp.variables.get_if_set(param).cloned();
    interp.variables.set(param, item.clone());
    let result = Box::pin(evaluator::evaluate_callback(interp, &expr)).await;
    match previous {
        Some(value) => interp.variables.set(param, value),
        None => interp.variables.unset(param),
    }
    result
}

/// `ARRAY_FILTER(array, expr?)`. With no `expr`, filters out falsy elements.
pub async fn array_filter(
    interp: &mut Interpreter,
    array: &[Value],
    expr: Option<&str>,
) -> Result<Value, InterpreterError> {
    let Some(expr) = expr else {
        return Ok(Value::Array(array.iter().filter(|v| v.is_truthy()).cloned().collect()));
    };
    match classify_callback(expr) {
        CallbackStyle::RexxLambda { param, body } => {
            let mut out = Vec::new();
            for item in array {
                if Box::pin(eval_rexx_callback(interp, &param, &body, item)).await?.is_truthy() {
                    out.push(item.clone());
                }
            }
            Ok(Value::Array(out))
        }
        CallbackStyle::RexxImplicitItem { body } => {
            let mut out = Vec::new();
            for item in array {
                if Box::pin(eval_rexx_callback(interp, "item", &body, item)).await?.is_truthy() {
                    out.push(item.clone());
                }
            }
            Ok(Value::Array(out))
        }
        CallbackStyle::HostStyle => Err(InterpreterError::Other(
            "host-style callback expressions are not evaluated by this core".to_string(),
        )),
    }
}

/// `ARRAY_MAP(array, expr?)`. With no `expr`, returns the array unchanged.
pub async fn array_map(
    interp: &mut Interpreter,
    array: &[Value],
    expr: Option<&str>,
) -> Result<Value, InterpreterError> {
    let Some(expr) = expr else {
        return Ok(Value::Array(array.to_vec()));
    };
    match classify_callback(expr) {
        CallbackStyle::RexxLambda { param, body } => {
            let mut out = Vec::with_capacity(array.len());
            for item in array {
                out.push(Box::pin(eval_rexx_callback(interp, &param, &body, item)).await?);
            }
            Ok(Value::Array(out))
        }
        CallbackStyle::RexxImplicitItem { body } => {
            let mut out = Vec::with_capacity(array.len());
            for item in array {
                out.push(Box::pin(eval_rexx_callback(interp, "item", &body, item)).await?);
            }
            Ok(Value::Array(out))
        }
        CallbackStyle::HostStyle => Err(InterpreterError::Other(
            "host-style callback expressions are not evaluated by this core".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_with_dot_notation_is_host_style() {
        assert_eq!(classify_callback("x => x.length > 0"), CallbackStyle::HostStyle);
    }

    #[test]
    fn arrow_without_dot_notation_is_rexx_lambda() {
        assert_eq!(
            classify_callback("x => x > 5"),
            CallbackStyle::RexxLambda { param: "x".to_string(), body: "x > 5".to_string() }
        );
    }

    #[test]
    fn bare_rexx_logical_is_implicit_item() {
        assert_eq!(
            classify_callback("item > 1 & item < 10"),
            CallbackStyle::RexxImplicitItem { body: "item > 1 & item < 10".to_string() }
        );
    }

    #[test]
    fn host_logical_operators_are_not_rexx() {
        assert_eq!(classify_callback("item > 1 && item < 10"), CallbackStyle::HostStyle);
    }
}
