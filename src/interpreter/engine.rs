//! Core Engine Orchestration (C14).
//!
//! Grounded on the teacher's `interpreter/execution_engine.rs` (`ExecutionEngine`'s
//! `execute_script -> execute_statement -> execute_command` chain, dispatching
//! on a `Result<_, InterpreterError>` and reacting to sentinel variants): the
//! REXX core's `Interpreter::run` / `execute_block` / `execute_command` chain
//! is the same shape, generalized from bash's handful of sentinel error
//! variants to the `ControlResult` sum type of SPEC_FULL.md §9.

use crate::ast::{
    CallArg, Command, CommandKind, CompareOp, Expr, NumericSetting, ParseNode, ParseSource, Script,
    SignalNode, StringTemplate, TraceMode,
};
use crate::interpreter::address::{self, AddressRegistry, NullHandler, SourceContext};
use crate::interpreter::context_stack::{TraceKind, TraceLog};
use crate::interpreter::errors::{ControlResult, ExecResult, InterpreterError};
use crate::interpreter::evaluator;
use crate::interpreter::interpolation;
use crate::interpreter::numeric::{NumericForm, NumericSettings};
use crate::interpreter::registry::BuiltinRegistry;
use crate::interpreter::require::RequireLoader;
use crate::interpreter::signals::{self, SignalOutcome};
use crate::interpreter::subroutines::{self, Subroutine};
use crate::interpreter::types::{
    CallFrame, ErrorHandlerTable, ExecutionContextFrame, FrameKind, InterpreterOptions,
};
use crate::value::{Value, VariableStore};
use indexmap::IndexMap;
use std::sync::Arc;

/// The interpreter instance: every field SPEC_FULL.md §5 "Shared-resource
/// policy" names as owned exclusively by one interpreter instance.
pub struct Interpreter {
    pub options: InterpreterOptions,
    pub variables: VariableStore,
    pub registry: BuiltinRegistry,
    pub address: AddressRegistry,
    pub numeric: NumericSettings,
    pub labels: IndexMap<String, usize>,
    pub subroutines: IndexMap<String, Subroutine>,
    pub call_stack: Vec<CallFrame>,
    pub execution_stack: Vec<ExecutionContextFrame>,
    pub error_handlers: ErrorHandlerTable,
    pub eval_stack: super::types::EvaluationStack,
    pub require_loader: RequireLoader,
    pub trace_mode: TraceMode,
    pub trace_log: TraceLog,
    pub no_interpret: bool,
    source_lines: Vec<String>,
}

impl Interpreter {
    pub fn new(options: InterpreterOptions) -> Self {
        let mut variables = VariableStore::new();
        for (name, value) in crate::interpreter::types::runtime_facts() {
            variables.set(&name, value);
        }
        variables.set("RC", Value::Integer(0));
        variables.set("RESULT", Value::Absent);
        variables.set("ERRORTEXT", Value::string(""));
        variables.set("SIGL", Value::Integer(0));

        let trace_mode = options.initial_trace_mode;
        let mut address = AddressRegistry::new();
        address.register(
            address::DEFAULT_TARGET,
            Arc::new(NullHandler),
            Default::default(),
        );

        Self {
            options,
            variables,
            registry: BuiltinRegistry::new(),
            address,
            numeric: NumericSettings::default(),
            labels: IndexMap::new(),
            subroutines: IndexMap::new(),
            call_stack: Vec::new(),
            execution_stack: Vec::new(),
            error_handlers: ErrorHandlerTable::default(),
            eval_stack: super::types::EvaluationStack::default(),
            require_loader: RequireLoader::new(),
            trace_mode,
            trace_log: TraceLog::default(),
            no_interpret: false,
            source_lines: Vec::new(),
        }
    }

    /// Populate the built-in function/operation registry (§10.2). Separate
    /// from `new` so tests that don't need the stdlib surface can skip it.
    pub fn install_stdlib(&mut self) {
        crate::builtins::stdlib::install(&mut self.registry);
    }

    pub fn current_line(&self) -> u32 {
        self.execution_stack.last().map(|f| f.line_number).unwrap_or(0)
    }

    pub fn push_frame(&mut self, kind: FrameKind, line: u32, source_line: impl Into<String>) {
        let mut frame = ExecutionContextFrame::new(kind, line, source_line);
        frame.source_filename = self.options.script_path.clone();
        self.execution_stack.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<ExecutionContextFrame> {
        self.execution_stack.pop()
    }

    fn update_main_frame(&mut self, line: u32, source_line: &str) {
        if let Some(frame) = self
            .execution_stack
            .iter_mut()
            .rev()
            .find(|f| matches!(f.kind, FrameKind::Main))
        {
            frame.line_number = line;
            frame.source_line = source_line.to_string();
        } else {
            self.push_frame(FrameKind::Main, line, source_line.to_string());
        }
    }

    fn source_line_text(&self, line: u32) -> String {
        self.source_lines
            .get((line.saturating_sub(1)) as usize)
            .cloned()
            .unwrap_or_default()
    }

    fn record_trace(&mut self, kind: TraceKind, line: u32, message: String, result: Option<String>) {
        if context_stack_should_emit(self.trace_mode, kind) {
            self.trace_log.record(crate::interpreter::context_stack::TraceRecord {
                message,
                kind,
                line_number: line,
                result,
            });
        }
    }

    /// Top-level `run(commands, sourceText?, sourceFilename?)` (SPEC_FULL.md
    /// §4.1 C14).
    pub async fn run(&mut self, script: &Script, source_text: Option<&str>) -> Result<Value, InterpreterError> {
        self.source_lines = source_text
            .map(|t| t.replace("\r\n", "\n").split('\n').map(|s| s.to_string()).collect())
            .unwrap_or_default();

        let (labels, subroutines) = subroutines::discover(&script.commands);
        self.labels = labels;
        self.subroutines = subroutines;

        self.push_frame(FrameKind::Main, 0, String::new());
        let outcome = self.run_from(&script.commands, 0).await;
        self.pop_frame();

        match outcome {
            Ok(ControlResult::Returned(value)) => Ok(value),
            Ok(ControlResult::Exited(value)) => Ok(value),
            Ok(ControlResult::Continue) => Ok(self.variables.get("RESULT")),
            Ok(ControlResult::JumpToLabel(label)) => Err(InterpreterError::UndefinedLabel(label)),
            Err(err) => Err(err),
        }
    }

    /// Top-level command loop, starting at `start_index`. Handles label
    /// skip-over (don't fall through into subroutine bodies), SIGNAL jumps,
    /// and the RETURN/EXIT termination sentinels (SPEC_FULL.md §4.1).
    async fn run_from(&mut self, commands: &[Command], start_index: usize) -> ExecResult {
        let mut index = start_index;
        while index < commands.len() {
            let command = &commands[index];

            if let CommandKind::Label { name } = &command.kind {
                // Skip forward past the subroutine body that follows a
                // top-level label, per SPEC_FULL.md §4.1.
                if let Some(sub) = self.subroutines.get(&name.to_ascii_uppercase()) {
                    index += 1 + sub.body.len();
                    continue;
                }
                index += 1;
                continue;
            }

            match self.execute_one(command).await {
                Ok(ControlResult::Continue) => {
                    index += 1;
                }
                Ok(ControlResult::JumpToLabel(label)) => {
                    match self.labels.get(&label.to_ascii_uppercase()) {
                        Some(&target) => index = target + 1,
                        None => return Err(InterpreterError::UndefinedLabel(label)),
                    }
                }
                Ok(other @ (ControlResult::Returned(_) | ControlResult::Exited(_))) => {
                    return Ok(other);
                }
                Err(err) => match signals::resolve(&self.error_handlers, &err) {
                    SignalOutcome::Jump(label) => {
                        self.populate_error_context(command.line, &err);
                        match self.labels.get(&label.to_ascii_uppercase()) {
                            Some(&target) => index = target + 1,
                            None => return Err(InterpreterError::UndefinedLabel(label)),
                        }
                    }
                    SignalOutcome::TerminatedWithError => {
                        self.populate_error_context(command.line, &err);
                        return Ok(ControlResult::Exited(Value::string(err.to_string())));
                    }
                    SignalOutcome::Unhandled => {
                        return Err(InterpreterError::Other(format!(
                            "Error at line {}: {}",
                            command.line, err
                        )));
                    }
                },
            }
        }
        Ok(ControlResult::Continue)
    }

    fn populate_error_context(&mut self, line: u32, err: &InterpreterError) {
        self.variables.set("RC", Value::Integer(1));
        self.variables.set("ERRORTEXT", Value::string(err.to_string()));
        self.variables.set("SIGL", Value::Integer(line as i64));
    }

    /// Dispatch one command to its specialist (C4/C6/C7/C10), per the
    /// per-command switch of SPEC_FULL.md §4.1/§4.14.
    async fn execute_one(&mut self, command: &Command) -> ExecResult {
        let line_text = self.source_line_text(command.line);
        self.update_main_frame(command.line, &line_text);

        match &command.kind {
            CommandKind::Assignment { variable, value } => {
                let v = Box::pin(evaluator::evaluate(self, value)).await?;
                self.record_trace(TraceKind::Assignment, command.line, format!("{} = ...", variable), Some(v.to_display_string()));
                self.variables.set(variable, v);
                Ok(ControlResult::Continue)
            }
            CommandKind::FunctionCall { name, args } => {
                if name.eq_ignore_ascii_case("REQUIRE") {
                    return self.execute_require(args).await.map(|_| ControlResult::Continue);
                }
                self.record_trace(TraceKind::Call, command.line, name.to_ascii_uppercase(), None);
                let call_args = to_call_args(args);
                let value = Box::pin(evaluator::evaluate(
                    self,
                    &Expr::FunctionCall { name: name.clone(), args: call_args },
                ))
                .await?;
                self.variables.set("RESULT", value);
                Ok(ControlResult::Continue)
            }
            CommandKind::If { condition, then_body, else_body } => {
                Box::pin(crate::interpreter::control_flow::execute_if(self, condition, then_body, else_body)).await
            }
            CommandKind::Do(node) => Box::pin(crate::interpreter::control_flow::execute_do(self, node)).await,
            CommandKind::Select { whens, otherwise } => {
                Box::pin(crate::interpreter::control_flow::execute_select(self, whens, otherwise)).await
            }
            CommandKind::Call { subroutine, arguments } => {
                subroutines::execute_call(self, subroutine, arguments).await?;
                Ok(ControlResult::Continue)
            }
            CommandKind::Return { value } => {
                let v = match value {
                    Some(expr) => Box::pin(evaluator::evaluate(self, expr)).await?,
                    None => Value::Absent,
                };
                Ok(ControlResult::Returned(v))
            }
            CommandKind::Exit { code } => {
                let v = match code {
                    Some(expr) => Box::pin(evaluator::evaluate(self, expr)).await?,
                    None => Value::Integer(0),
                };
                Ok(ControlResult::Exited(v))
            }
            CommandKind::Say { value } => {
                let v = Box::pin(evaluator::evaluate(self, value)).await?;
                println!("{}", v.to_display_string());
                Ok(ControlResult::Continue)
            }
            CommandKind::Address { target } => {
                self.address.set_current(target);
                Ok(ControlResult::Continue)
            }
            CommandKind::AddressWithString { target, command_string } => {
                self.address.set_current(target);
                self.dispatch_string_command(command.line, command_string).await?;
                Ok(ControlResult::Continue)
            }
            CommandKind::QuotedString { template } | CommandKind::HeredocString { template } => {
                self.dispatch_string_command(command.line, template).await?;
                Ok(ControlResult::Continue)
            }
            CommandKind::Signal(node) => self.execute_signal(node),
            CommandKind::Label { .. } => Ok(ControlResult::Continue),
            CommandKind::Numeric { setting, value } => {
                let v = Box::pin(evaluator::evaluate(self, value)).await?;
                self.apply_numeric_setting(setting.clone(), &v)?;
                Ok(ControlResult::Continue)
            }
            CommandKind::Parse(node) => {
                Box::pin(self.execute_parse(node)).await?;
                Ok(ControlResult::Continue)
            }
            CommandKind::Push { value } => {
                let v = Box::pin(evaluator::evaluate(self, value)).await?;
                self.eval_stack.push_front(v);
                Ok(ControlResult::Continue)
            }
            CommandKind::Queue { value } => {
                let v = Box::pin(evaluator::evaluate(self, value)).await?;
                self.eval_stack.push_back(v);
                Ok(ControlResult::Continue)
            }
            CommandKind::Pull { variable } => {
                let v = self.eval_stack.pull().unwrap_or(Value::string(""));
                if let Some(name) = variable {
                    self.variables.set(name, v);
                } else {
                    self.variables.set("RESULT", v);
                }
                Ok(ControlResult::Continue)
            }
            CommandKind::Trace { mode } => {
                self.trace_mode = *mode;
                Ok(ControlResult::Continue)
            }
            CommandKind::InterpretStatement { source, mode, import, export } => {
                Box::pin(crate::interpreter::interpret::execute_interpret(self, source, mode, import, export)).await
            }
            CommandKind::NoInterpret => {
                self.no_interpret = true;
                Ok(ControlResult::Continue)
            }
            CommandKind::RetryOnStale { body, preserve, deadline_secs } => {
                Box::pin(self.execute_retry_on_stale(body, preserve, *deadline_secs)).await
            }
        }
    }

    async fn dispatch_string_command(
        &mut self,
        line: u32,
        template: &StringTemplate,
    ) -> Result<(), InterpreterError> {
        if self.address.is_default() {
            let text = {
                let resolver = |name: &str| self.variables.get(name).to_display_string();
                interpolation::interpolate(&template.raw, &resolver)
            };
            println!("{}", text);
            return Ok(());
        }

        self.record_trace(TraceKind::AddressCommand, line, template.raw.clone(), None);

        let context = self.variables.snapshot();
        let source = SourceContext {
            line_number: line,
            source_line: template.raw.clone(),
            source_filename: self.options.script_path.clone(),
        };
        let result = {
            let resolver = |name: &str| self.variables.get(name).to_display_string();
            address::dispatch_command_string(&self.address, &template.raw, &context, &source, &resolver)
                .await
        };

        match result {
            Ok(outcome) => {
                self.variables.set("RC", Value::Integer(if outcome.success { 0 } else { outcome.error_code.unwrap_or(1) }));
                let message = outcome.error_message.clone();
                if !outcome.success {
                    if let Some(msg) = &message {
                        self.variables.set("ERRORTEXT", Value::string(msg.clone()));
                    }
                }
                let suppress = self
                    .address
                    .record(self.address.current_target())
                    .map(|r| r.metadata.suppress_result)
                    .unwrap_or(false);
                if !suppress {
                    self.variables.set("RESULT", outcome.result_value.clone());
                }
                for (name, value) in outcome.rexx_variables.iter() {
                    self.variables.set(name, value.clone());
                }
                if !outcome.success {
                    return Err(InterpreterError::AddressFailure {
                        target: self.address.current_target().to_string(),
                        message: message.unwrap_or_else(|| "ADDRESS command failed".to_string()),
                    });
                }
                Ok(())
            }
            Err(err) => {
                self.variables.set("RC", Value::Integer(1));
                self.variables.set("ERRORTEXT", Value::string(err.to_string()));
                Err(err)
            }
        }
    }

    fn execute_signal(&mut self, node: &SignalNode) -> ExecResult {
        match node {
            SignalNode::On { condition, label } => {
                self.error_handlers.install(condition, label.clone());
                Ok(ControlResult::Continue)
            }
            SignalNode::Off { condition } => {
                self.error_handlers.remove(condition);
                Ok(ControlResult::Continue)
            }
            SignalNode::Jump { label } => Ok(ControlResult::JumpToLabel(label.clone())),
        }
    }

    fn apply_numeric_setting(&mut self, setting: NumericSetting, value: &Value) -> Result<(), InterpreterError> {
        match setting {
            NumericSetting::Digits => {
                let n = value
                    .as_numeric_str()
                    .ok_or_else(|| InterpreterError::NonNumericArithmetic("NUMERIC DIGITS".to_string()))?;
                self.numeric.digits = n as u32;
            }
            NumericSetting::Fuzz => {
                let n = value
                    .as_numeric_str()
                    .ok_or_else(|| InterpreterError::NonNumericArithmetic("NUMERIC FUZZ".to_string()))?;
                self.numeric.fuzz = n as u32;
            }
            NumericSetting::Form => {
                let text = value.to_display_string().to_ascii_uppercase();
                self.numeric.form = if text.starts_with("ENG") {
                    NumericForm::Engineering
                } else {
                    NumericForm::Scientific
                };
            }
        }
        Ok(())
    }

    async fn execute_parse(&mut self, node: &ParseNode) -> Result<(), InterpreterError> {
        let source_value = match &node.source {
            ParseSource::Arg => {
                let argv = self.call_stack.last().map(|f| f.argv.clone()).unwrap_or_default();
                argv.iter().map(|v| v.to_display_string()).collect::<Vec<_>>().join(" ")
            }
            ParseSource::Value(expr) => {
                Box::pin(evaluator::evaluate(self, expr)).await?.to_display_string()
            }
            ParseSource::Var(name) => self.variables.get(name).to_display_string(),
        };

        let mut remaining = source_value.as_str();
        for part in &node.template {
            match part {
                crate::ast::ParseTemplatePart::Variable(name) => {
                    let trimmed = remaining.trim_start();
                    let (word, rest) = match trimmed.find(char::is_whitespace) {
                        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
                        None => (trimmed, ""),
                    };
                    self.variables.set(name, Value::string(word));
                    remaining = rest;
                }
                crate::ast::ParseTemplatePart::Literal(lit) => {
                    if let Some(idx) = remaining.find(lit.as_str()) {
                        remaining = &remaining[idx + lit.len()..];
                    }
                }
            }
        }
        Ok(())
    }

    async fn execute_require(&mut self, args: &[Expr]) -> Result<(), InterpreterError> {
        let call_args = to_call_args(args);
        let mut path = None;
        let mut as_clause = None;
        for arg in &call_args {
            let value = Box::pin(evaluator::evaluate(self, &arg.value)).await?.to_display_string();
            match &arg.name {
                Some(n) if n.eq_ignore_ascii_case("as") => as_clause = Some(value),
                _ if path.is_none() => path = Some(value),
                _ => as_clause = Some(value),
            }
        }
        let path = path.ok_or_else(|| InterpreterError::RequireFailure("missing library path".to_string()))?;

        let loaded = self.require_loader.require(&path, self.options.security_policy)?;
        let Some(loaded) = loaded else { return Ok(()) };

        for (name, metadata, func) in loaded.functions {
            let registered_name = match &as_clause {
                Some(clause) => crate::interpreter::require::apply_as_clause(clause, &name),
                None => name,
            };
            self.registry.register_function(&registered_name, metadata, func);
        }
        for (name, func) in loaded.operations {
            let registered_name = match &as_clause {
                Some(clause) => crate::interpreter::require::apply_as_clause(clause, &name),
                None => name,
            };
            self.registry.register_operation(&registered_name, func);
        }
        if let Some((name, handler, record)) = loaded.address_target {
            let registered_name = match &as_clause {
                Some(clause) => crate::interpreter::require::apply_as_clause_to_address_target(clause)?,
                None => name,
            };
            self.address.register(&registered_name, handler, record);
        }
        Ok(())
    }

    async fn execute_retry_on_stale(
        &mut self,
        body: &[Command],
        preserve: &[String],
        deadline_secs: Option<f64>,
    ) -> ExecResult {
        let deadline = deadline_secs.unwrap_or(10.0);
        let started = std::time::Instant::now();
        loop {
            let preserved: Vec<(String, Value)> =
                preserve.iter().map(|name| (name.clone(), self.variables.get(name))).collect();
            match Box::pin(execute_block(self, body)).await {
                Ok(result) => return Ok(result),
                Err(InterpreterError::StaleReference(_)) => {
                    if started.elapsed().as_secs_f64() >= deadline {
                        return Err(InterpreterError::StaleReference(
                            "retry deadline exceeded".to_string(),
                        ));
                    }
                    for (name, value) in preserved {
                        self.variables.set(&name, value);
                    }
                    continue;
                }
                Err(other) => return Err(other),
            }
        }
    }
}

fn context_stack_should_emit(mode: TraceMode, kind: TraceKind) -> bool {
    crate::interpreter::context_stack::should_emit(mode, kind)
}

/// `CommandKind::FunctionCall`/`REQUIRE`'s argument list is a flat `Vec<Expr>`
/// (statement-level calls carry no separate named-argument syntax in the
/// AST); a `NAME = value` argument parses as a loose-equality `Comparison`
/// whose left side is a bare variable, so that shape is reinterpreted here as
/// a named `CallArg` rather than a literal boolean expression — the same
/// convention `parser::parser` uses when building `Expr::FunctionCall` nodes.
fn to_call_args(args: &[Expr]) -> Vec<CallArg> {
    args.iter()
        .map(|expr| {
            if let Expr::Comparison { op: CompareOp::EqLoose, left, right } = expr {
                if let Expr::Variable(name) = left.as_ref() {
                    return CallArg::named(name.clone(), (**right).clone());
                }
            }
            CallArg::positional(expr.clone())
        })
        .collect()
}

/// Execute a nested command list (an `IF`/`DO`/`SELECT` body, a subroutine
/// body, or an `INTERPRET`ed script) and return the first non-Continue
/// sentinel it produces, or `Continue` if the whole body ran to completion.
pub async fn execute_block(interp: &mut Interpreter, body: &[Command]) -> ExecResult {
    for command in body {
        match interp.execute_one(command).await {
            Ok(ControlResult::Continue) => continue,
            other => return other,
        }
    }
    Ok(ControlResult::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Command, CommandKind, Expr};

    fn script(commands: Vec<Command>) -> Script {
        Script { commands }
    }

    #[tokio::test]
    async fn say_after_assignment_reads_current_value() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        interp.install_stdlib();
        let commands = vec![
            Command::new(1, CommandKind::Assignment { variable: "X".into(), value: Expr::IntLiteral(10) }),
            Command::new(2, CommandKind::Say { value: Expr::Variable("X".into()) }),
        ];
        let result = interp.run(&script(commands), None).await;
        assert!(result.is_ok());
        assert_eq!(interp.variables.get("X"), Value::Integer(10));
    }

    #[tokio::test]
    async fn exit_terminates_the_run() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let commands = vec![
            Command::new(1, CommandKind::Exit { code: Some(Expr::IntLiteral(42)) }),
            Command::new(2, CommandKind::Say { value: Expr::StringLiteral("unreachable".into()) }),
        ];
        let result = interp.run(&script(commands), None).await.unwrap();
        assert_eq!(result, Value::Integer(42));
    }

    #[tokio::test]
    async fn signal_on_error_jumps_to_handler_label() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        interp.install_stdlib();
        let commands = vec![
            Command::new(
                1,
                CommandKind::Signal(SignalNode::On { condition: "ERROR".into(), label: "HANDLER".into() }),
            ),
            Command::new(
                2,
                CommandKind::FunctionCall { name: "NOSUCHFUNC".into(), args: vec![] },
            ),
            Command::new(3, CommandKind::Say { value: Expr::StringLiteral("unreachable".into()) }),
            Command::new(4, CommandKind::Exit { code: Some(Expr::IntLiteral(0)) }),
            Command::new(5, CommandKind::Label { name: "HANDLER".into() }),
            Command::new(6, CommandKind::Say { value: Expr::StringLiteral("caught".into()) }),
            Command::new(7, CommandKind::Exit { code: Some(Expr::IntLiteral(42)) }),
        ];
        let result = interp.run(&script(commands), None).await.unwrap();
        assert_eq!(result, Value::Integer(42));
    }

    #[tokio::test]
    async fn top_level_label_is_skipped_over() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let commands = vec![
            Command::new(1, CommandKind::Say { value: Expr::StringLiteral("main".into()) }),
            Command::new(2, CommandKind::Exit { code: Some(Expr::IntLiteral(0)) }),
            Command::new(3, CommandKind::Label { name: "SUB".into() }),
            Command::new(4, CommandKind::Return { value: None }),
        ];
        let result = interp.run(&script(commands), None).await.unwrap();
        assert_eq!(result, Value::Integer(0));
    }

    #[tokio::test]
    async fn execution_stack_depth_is_zero_after_run() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let commands = vec![Command::new(1, CommandKind::Exit { code: None })];
        interp.run(&script(commands), None).await.unwrap();
        assert!(interp.execution_stack.is_empty());
    }
}
