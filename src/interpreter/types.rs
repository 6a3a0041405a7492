//! Shared interpreter state types: execution-context frames, call frames,
//! error-handler table, ADDRESS target records, and the ambient
//! configuration structs (§10.6). Grounded on the teacher's
//! `interpreter/types.rs`'s flat `InterpreterState`/`ExecutionLimits`/
//! `CallStackState` structs and `bash.rs`'s `BashOptions`/`ExecOptions`.

use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// The kind of a pushed execution-context frame (SPEC_FULL.md §3 "Call
/// Frame").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Main,
    Call,
    Interpret,
}

/// One entry of the execution stack (C11), consulted whenever a diagnostic
/// is emitted.
#[derive(Debug, Clone)]
pub struct ExecutionContextFrame {
    pub kind: FrameKind,
    pub line_number: u32,
    pub source_line: String,
    pub source_filename: Option<String>,
}

impl ExecutionContextFrame {
    pub fn new(kind: FrameKind, line_number: u32, source_line: impl Into<String>) -> Self {
        Self { kind, line_number, source_line: source_line.into(), source_filename: None }
    }
}

/// A `CALL`-created call frame (C5).
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub argv: Vec<Value>,
    pub pre_call_result: Value,
}

/// Mapping condition name -> handler (C6).
#[derive(Debug, Clone, Default)]
pub struct ErrorHandlerTable {
    handlers: HashMap<String, ErrorHandlerEntry>,
}

#[derive(Debug, Clone)]
pub struct ErrorHandlerEntry {
    pub label: String,
    pub enabled: bool,
}

impl ErrorHandlerTable {
    pub fn install(&mut self, condition: &str, label: impl Into<String>) {
        self.handlers.insert(
            condition.to_ascii_uppercase(),
            ErrorHandlerEntry { label: label.into(), enabled: true },
        );
    }

    pub fn remove(&mut self, condition: &str) {
        self.handlers.remove(&condition.to_ascii_uppercase());
    }

    pub fn lookup(&self, condition: &str) -> Option<&ErrorHandlerEntry> {
        self.handlers
            .get(&condition.to_ascii_uppercase())
            .filter(|entry| entry.enabled)
    }
}

/// ADDRESS target metadata (C7, C9).
#[derive(Debug, Clone, Default)]
pub struct AddressTargetMetadata {
    pub origin_library: Option<String>,
    pub interpreter_handles_interpolation: bool,
    /// Per-target opt-out of writing the handler's full result object into
    /// `RESULT` (SPEC_FULL.md §9 Open Question 2 — data-driven, not a
    /// hardcoded target name).
    pub suppress_result: bool,
}

/// An ADDRESS target record: declared methods plus metadata. The handler
/// itself lives in `AddressRegistry` (C7) keyed by the same name, since
/// trait objects don't implement `Clone` the way this plain record does.
#[derive(Debug, Clone, Default)]
pub struct AddressTargetRecord {
    pub declared_methods: Vec<String>,
    pub metadata: AddressTargetMetadata,
}

/// Dependency graph node (C9).
#[derive(Debug, Clone, Default)]
pub struct DependencyNode {
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
    pub loading: bool,
}

/// PUSH/PULL/QUEUE evaluation stack (§3 "Evaluation Stack"). LIFO for
/// PUSH/PULL, FIFO for QUEUE/PULL.
#[derive(Debug, Clone, Default)]
pub struct EvaluationStack {
    items: std::collections::VecDeque<Value>,
}

impl EvaluationStack {
    pub fn push_front(&mut self, value: Value) {
        self.items.push_front(value);
    }

    pub fn push_back(&mut self, value: Value) {
        self.items.push_back(value);
    }

    pub fn pull(&mut self) -> Option<Value> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// §10.6 Configuration
// ============================================================================

/// Guards against runaway scripts, the REXX-core analogue of the teacher's
/// `ExecutionLimits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub max_recursion_depth: u32,
    pub max_command_count: u64,
    pub max_loop_iterations: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_recursion_depth: 256,
            max_command_count: 5_000_000,
            // SPEC_FULL.md §4.3: "a hard iteration cap (10 000)".
            max_loop_iterations: 10_000,
        }
    }
}

impl ExecutionLimits {
    pub fn with_max_recursion_depth(mut self, depth: u32) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_max_loop_iterations(mut self, iterations: u64) -> Self {
        self.max_loop_iterations = iterations;
        self
    }
}

/// REQUIRE gating policy (C9), consulted by `security::approve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityPolicy {
    Strict,
    Moderate,
    #[default]
    Default,
    Permissive,
}

/// Construction-time options for an `Interpreter`, the REXX-core analogue of
/// the teacher's `BashOptions`/`ExecOptions`.
#[derive(Debug, Clone)]
pub struct InterpreterOptions {
    pub limits: ExecutionLimits,
    pub security_policy: SecurityPolicy,
    pub script_path: Option<String>,
    pub initial_trace_mode: crate::ast::TraceMode,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            limits: ExecutionLimits::default(),
            security_policy: SecurityPolicy::default(),
            script_path: None,
            initial_trace_mode: crate::ast::TraceMode::Off,
        }
    }
}

impl InterpreterOptions {
    pub fn with_security_policy(mut self, policy: SecurityPolicy) -> Self {
        self.security_policy = policy;
        self
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_script_path(mut self, path: impl Into<String>) -> Self {
        self.script_path = Some(path.into());
        self
    }
}

/// Runtime environment facts exposed at startup (§6 "Environment variables
/// & runtime facts").
pub fn runtime_facts() -> IndexMap<String, Value> {
    let mut facts = IndexMap::new();
    facts.insert("RUNTIME.TYPE".to_string(), Value::string("native"));
    facts.insert("RUNTIME.NODE_VERSION".to_string(), Value::string(""));
    facts.insert("RUNTIME.IS_PKG".to_string(), Value::Bool(false));
    facts.insert("RUNTIME.HAS_WINDOW".to_string(), Value::Bool(false));
    facts.insert("RUNTIME.HAS_DOM".to_string(), Value::Bool(false));
    facts.insert("RUNTIME.HAS_NODEJS_REQUIRE".to_string(), Value::Bool(false));
    facts
}
