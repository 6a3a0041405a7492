//! Built-in Function & Operation Registry (C8).
//!
//! Two parallel registries with different call conventions: functions are
//! invoked positionally (with a named-to-positional adapter keyed on
//! per-function synonyms), operations are invoked with the raw named-params
//! mapping. Grounded on the teacher's `commands/registry.rs`
//! (`CommandRegistry`, a name -> boxed-trait-object map with
//! `register`/`get`/`contains`), generalized into two registries.

use crate::ast::CallArg;
use crate::interpreter::errors::InterpreterError;
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// A built-in function: side-effect-free by convention, invoked positionally.
pub type BuiltinFn = Arc<dyn Fn(&[Value]) -> Result<Value, InterpreterError> + Send + Sync>;

/// A built-in operation: side-effecting, invoked with the named-params
/// mapping directly.
pub type OperationFn =
    Arc<dyn Fn(&IndexMap<String, Value>) -> Result<Value, InterpreterError> + Send + Sync>;

/// Per-function parameter metadata used to adapt named args to positional
/// order and to validate arity (SPEC_FULL.md §4.7).
#[derive(Debug, Clone, Default)]
pub struct FunctionMetadata {
    /// Canonical parameter names in positional order; each may have
    /// pipe-separated synonyms, e.g. `"array|arr"`.
    pub parameters: Vec<String>,
    pub requires_parameters: bool,
}

struct FunctionEntry {
    func: BuiltinFn,
    metadata: FunctionMetadata,
}

struct OperationEntry {
    func: OperationFn,
}

/// Names known to be legitimately nullary despite `requires_parameters`
/// defaulting to true for registered functions with declared parameters
/// (SPEC_FULL.md §4.7).
const NULLARY_WHITELIST: &[&str] = &["TODAY", "NOW", "UUID", "RANDOM"];

#[derive(Default)]
pub struct BuiltinRegistry {
    functions: HashMap<String, FunctionEntry>,
    operations: HashMap<String, OperationEntry>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_function(
        &mut self,
        name: &str,
        metadata: FunctionMetadata,
        func: BuiltinFn,
    ) {
        self.functions.insert(name.to_ascii_uppercase(), FunctionEntry { func, metadata });
    }

    pub fn register_operation(&mut self, name: &str, func: OperationFn) {
        self.operations.insert(name.to_ascii_uppercase(), OperationEntry { func });
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_ascii_uppercase())
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.contains_key(&name.to_ascii_uppercase())
    }

    /// Adapt call-site args (positional or named) into the function's
    /// declared positional order, then invoke it.
    pub fn call_function(&self, name: &str, args: &[CallArg], values: &[Value]) -> Result<Value, InterpreterError> {
        let key = name.to_ascii_uppercase();
        let entry = self
            .functions
            .get(&key)
            .ok_or_else(|| InterpreterError::UndefinedFunction(key.clone()))?;

        if entry.metadata.requires_parameters
            && values.is_empty()
            && !NULLARY_WHITELIST.contains(&key.as_str())
        {
            let missing = entry
                .metadata
                .parameters
                .first()
                .cloned()
                .unwrap_or_else(|| "argument".to_string());
            return Err(InterpreterError::MissingParameter { function: key, parameter: missing });
        }

        if entry.metadata.parameters.is_empty() || args.iter().all(|a| a.name.is_none()) {
            return (entry.func)(values);
        }

        let positional = adapt_named_to_positional(&entry.metadata.parameters, args, values);
        (entry.func)(&positional)
    }

    pub fn call_operation(
        &self,
        name: &str,
        params: &IndexMap<String, Value>,
    ) -> Result<Value, InterpreterError> {
        let key = name.to_ascii_uppercase();
        let entry = self
            .operations
            .get(&key)
            .ok_or_else(|| InterpreterError::UndefinedFunction(key))?;
        (entry.func)(params)
    }
}

/// Map named call-site arguments onto `parameters` (each entry possibly
/// `pipe|separated` synonyms), falling back to already-positional `values`
/// where a name doesn't match any declared parameter.
fn adapt_named_to_positional(
    parameters: &[String],
    args: &[CallArg],
    values: &[Value],
) -> Vec<Value> {
    let mut positional: Vec<Value> = vec![Value::Absent; parameters.len()];
    let mut next_positional_slot = 0usize;
    for (arg, value) in args.iter().zip(values.iter()) {
        match &arg.name {
            Some(name) => {
                if let Some(slot) = parameters.iter().position(|p| {
                    p.split('|').any(|syn| syn.eq_ignore_ascii_case(name))
                }) {
                    positional[slot] = value.clone();
                }
            }
            None => {
                if next_positional_slot < positional.len() {
                    positional[next_positional_slot] = value.clone();
                }
                next_positional_slot += 1;
            }
        }
    }
    positional
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_argument_lands_on_synonym_slot() {
        let params = vec!["array|arr".to_string(), "separator|sep".to_string()];
        let args = vec![
            CallArg::named("sep", crate::ast::Expr::StringLiteral(",".into())),
            CallArg::named("arr", crate::ast::Expr::StringLiteral("x".into())),
        ];
        let values = vec![Value::string(","), Value::string("x")];
        let positional = adapt_named_to_positional(&params, &args, &values);
        assert_eq!(positional[0], Value::string("x"));
        assert_eq!(positional[1], Value::string(","));
    }

    #[test]
    fn missing_required_parameter_errors() {
        let mut registry = BuiltinRegistry::new();
        registry.register_function(
            "UPPER",
            FunctionMetadata { parameters: vec!["text".into()], requires_parameters: true },
            Arc::new(|args| Ok(args[0].clone())),
        );
        let err = registry.call_function("UPPER", &[], &[]).unwrap_err();
        assert!(matches!(err, InterpreterError::MissingParameter { .. }));
    }

    #[test]
    fn nullary_whitelist_bypasses_requirement() {
        let mut registry = BuiltinRegistry::new();
        registry.register_function(
            "TODAY",
            FunctionMetadata { parameters: vec![], requires_parameters: true },
            Arc::new(|_| Ok(Value::string("2026-07-31"))),
        );
        assert!(registry.call_function("TODAY", &[], &[]).is_ok());
    }
}
