//! ADDRESS Dispatch (C7).
//!
//! Grounded on the teacher's `commands/curl/mod.rs` + `network/fetch.rs`
//! (an async handler trait taking a command string and context, returning a
//! structured result), generalized into a registrable target table, and
//! `interpreter/command_resolution.rs`'s external-vs-builtin dispatch ladder
//! as the model for the evaluator's function-lookup order (C2 rule 4.6).

use crate::ast::Command;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::interpolation::{self, Resolver};
use crate::interpreter::types::AddressTargetRecord;
use crate::value::Value;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_TARGET: &str = "default";

/// `sourceContext` handed to every handler call (SPEC_FULL.md §6).
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub line_number: u32,
    pub source_line: String,
    pub source_filename: Option<String>,
}

/// The structured result shape a handler may return (SPEC_FULL.md §4.6/§6).
#[derive(Debug, Clone, Default)]
pub struct AddressResult {
    pub success: bool,
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
    pub rexx_variables: IndexMap<String, Value>,
    pub result_value: Value,
}

impl AddressResult {
    pub fn ok(value: Value) -> Self {
        Self { success: true, result_value: value, ..Default::default() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: Some(1),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// An ADDRESS handler: `(commandString, context, sourceContext) -> result`
/// (SPEC_FULL.md §6 "ADDRESS handler contract").
#[async_trait]
pub trait AddressHandler: Send + Sync {
    async fn dispatch(
        &self,
        command_string: &str,
        context: &IndexMap<String, Value>,
        source: &SourceContext,
    ) -> Result<AddressResult, InterpreterError>;

    /// Method names this target declares, for assignment-context dispatch
    /// (SPEC_FULL.md §4.6 "Assignment contexts can also dispatch").
    fn declared_methods(&self) -> Vec<String> {
        Vec::new()
    }
}

/// The default pseudo-target: no handler; quoted strings become SAY output
/// at the call site (handled by the engine directly, not here).
pub struct NullHandler;

#[async_trait]
impl AddressHandler for NullHandler {
    async fn dispatch(
        &self,
        _command_string: &str,
        _context: &IndexMap<String, Value>,
        _source: &SourceContext,
    ) -> Result<AddressResult, InterpreterError> {
        Ok(AddressResult::ok(Value::Absent))
    }
}

#[derive(Default)]
pub struct AddressRegistry {
    handlers: HashMap<String, Arc<dyn AddressHandler>>,
    records: HashMap<String, AddressTargetRecord>,
    current: String,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self { current: DEFAULT_TARGET.to_string(), ..Default::default() }
    }

    pub fn register(
        &mut self,
        name: &str,
        handler: Arc<dyn AddressHandler>,
        record: AddressTargetRecord,
    ) {
        let key = name.to_ascii_uppercase();
        self.handlers.insert(key.clone(), handler);
        self.records.insert(key, record);
    }

    pub fn current_target(&self) -> &str {
        &self.current
    }

    pub fn set_current(&mut self, name: &str) {
        self.current = name.to_ascii_uppercase();
    }

    pub fn is_default(&self) -> bool {
        self.current.eq_ignore_ascii_case(DEFAULT_TARGET)
    }

    pub fn record(&self, name: &str) -> Option<&AddressTargetRecord> {
        self.records.get(&name.to_ascii_uppercase())
    }

    pub fn handler(&self, name: &str) -> Option<Arc<dyn AddressHandler>> {
        self.handlers.get(&name.to_ascii_uppercase()).cloned()
    }

    pub fn declares_method(&self, target: &str, method: &str) -> bool {
        self.records
            .get(&target.to_ascii_uppercase())
            .map(|r| r.declared_methods.iter().any(|m| m.eq_ignore_ascii_case(method)))
            .unwrap_or(false)
    }
}

/// Dispatch a QUOTED_STRING/HEREDOC_STRING/ADDRESS_WITH_STRING command to the
/// current target, applying the conditional-interpolation rule and
/// result-marshaling policy of SPEC_FULL.md §4.6.
pub async fn dispatch_command_string(
    registry: &AddressRegistry,
    raw_command: &str,
    context: &IndexMap<String, Value>,
    source: &SourceContext,
    resolver: &dyn Resolver,
) -> Result<AddressResult, InterpreterError> {
    let target = registry.current_target().to_string();
    let handler = registry
        .handler(&target)
        .ok_or_else(|| InterpreterError::AddressFailure {
            target: target.clone(),
            message: "no handler registered for target".to_string(),
        })?;

    let pre_interpolate = registry
        .record(&target)
        .map(|r| r.metadata.interpreter_handles_interpolation)
        .unwrap_or(true);

    let command_string = if pre_interpolate {
        interpolation::interpolate(raw_command, resolver)
    } else {
        raw_command.to_string()
    };

    handler.dispatch(&command_string, context, source).await.map_err(|e| {
        InterpreterError::AddressFailure { target: target.clone(), message: e.to_string() }
    })
}

pub fn source_context_for(cmd: &Command, filename: Option<&str>, line_text: &str) -> SourceContext {
    SourceContext {
        line_number: cmd.line,
        source_line: line_text.to_string(),
        source_filename: filename.map(|s| s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl AddressHandler for EchoHandler {
        async fn dispatch(
            &self,
            command_string: &str,
            _context: &IndexMap<String, Value>,
            _source: &SourceContext,
        ) -> Result<AddressResult, InterpreterError> {
            Ok(AddressResult::ok(Value::string(command_string)))
        }
    }

    #[tokio::test]
    async fn dispatch_routes_to_registered_handler() {
        let mut registry = AddressRegistry::new();
        registry.register(
            "ECHO",
            Arc::new(EchoHandler),
            AddressTargetRecord::default(),
        );
        registry.set_current("ECHO");
        let resolver = |_: &str| String::new();
        let result = dispatch_command_string(
            &registry,
            "hello",
            &IndexMap::new(),
            &SourceContext { line_number: 1, source_line: String::new(), source_filename: None },
            &resolver,
        )
        .await
        .unwrap();
        assert_eq!(result.result_value, Value::string("hello"));
    }

    #[test]
    fn unknown_method_is_not_declared() {
        let registry = AddressRegistry::new();
        assert!(!registry.declares_method("SQL", "query"));
    }
}
