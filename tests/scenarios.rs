//! End-to-end scenarios driving the real lexer/parser/interpreter chain
//! (SPEC_FULL.md §8 "Scenario set"). Each test builds a program as
//! concrete source text and checks the variable state that would have
//! produced the expected `SAY` output, the same way `interpreter::engine`'s
//! own inline tests check state rather than captured stdout.

use async_trait::async_trait;
use indexmap::IndexMap;
use rexx_core::interpreter::address::{AddressHandler, AddressResult, SourceContext};
use rexx_core::interpreter::require::{LibraryMetadata, LibraryType, LibrarySource, LoadedLibrary};
use rexx_core::interpreter::types::{AddressTargetRecord, InterpreterOptions};
use rexx_core::security::LibraryOrigin;
use rexx_core::{parse_script, Interpreter, InterpreterError, Value};
use std::sync::Arc;

async fn run(source: &str) -> (Interpreter, Value) {
    let script = parse_script(source).expect("script should parse");
    let mut interp = Interpreter::new(InterpreterOptions::default());
    interp.install_stdlib();
    let result = interp.run(&script, Some(source)).await.expect("script should run");
    (interp, result)
}

#[tokio::test]
async fn s1_assignment_and_say() {
    let (interp, _) = run("LET x = 10\nLET y = x + 5\nSAY y\n").await;
    assert_eq!(interp.variables.get("y"), Value::Integer(15));
}

#[tokio::test]
async fn s2_do_while_bounded_by_step_persists_control_variable() {
    let (interp, _) = run("DO i = 1 TO 3\nSAY i\nEND\nSAY i\n").await;
    assert_eq!(interp.variables.get("i"), Value::Integer(3));
}

#[tokio::test]
async fn s3_signal_on_error_catches_missing_function() {
    let source = "SIGNAL ON ERROR NAME handler\n\
                  LET z = NOSUCHFUNC(\"hi\")\n\
                  SAY \"unreachable\"\n\
                  EXIT 0\n\
                  handler:\n\
                  SAY \"caught\"\n\
                  EXIT 42\n";
    let (interp, result) = run(source).await;
    assert_eq!(result, Value::Integer(42));
    assert!(!interp.variables.is_set("z"));
}

struct CalcHandler;

#[async_trait]
impl AddressHandler for CalcHandler {
    async fn dispatch(
        &self,
        command_string: &str,
        _context: &IndexMap<String, Value>,
        _source: &SourceContext,
    ) -> Result<AddressResult, InterpreterError> {
        let parts: Vec<&str> = command_string.split_whitespace().collect();
        if parts.first() == Some(&"ADD") && parts.len() == 3 {
            let a: i64 = parts[1].parse().unwrap_or(0);
            let b: i64 = parts[2].parse().unwrap_or(0);
            let sum = a + b;
            let mut result = AddressResult::ok(Value::Integer(sum));
            result.rexx_variables.insert("SUM".to_string(), Value::Integer(sum));
            return Ok(result);
        }
        Ok(AddressResult::failure("unrecognized command"))
    }
}

#[tokio::test]
async fn s4_address_dispatch_with_result_marshaling() {
    let source = "ADDRESS calc\n\"ADD 2 3\"\nSAY RESULT\nSAY SUM\n";
    let script = parse_script(source).expect("script should parse");
    let mut interp = Interpreter::new(InterpreterOptions::default());
    interp.install_stdlib();
    interp.address.register("calc", Arc::new(CalcHandler), AddressTargetRecord::default());
    interp.run(&script, Some(source)).await.expect("script should run");
    assert_eq!(interp.variables.get("RESULT"), Value::Integer(5));
    assert_eq!(interp.variables.get("SUM"), Value::Integer(5));
}

#[tokio::test]
async fn s5_interpret_isolated_with_import_export() {
    let source = "LET a = 1\n\
                  LET b = 2\n\
                  INTERPRET \"LET c = a + b\" ISOLATED IMPORT a b EXPORT c\n\
                  SAY c\n";
    let (interp, _) = run(source).await;
    assert_eq!(interp.variables.get("c"), Value::Integer(3));
    assert!(!interp.variables.is_set("a"), "a must not leak back out of the isolated child");
}

struct MathLibSource;

impl LibrarySource for MathLibSource {
    fn origin(&self) -> LibraryOrigin {
        LibraryOrigin::LocalPath
    }

    fn try_resolve(&self, name: &str) -> Option<Result<LoadedLibrary, String>> {
        if name != "./math-lib.js" {
            return None;
        }
        let add: rexx_core::interpreter::registry::BuiltinFn = Arc::new(|args: &[Value]| {
            let a = args.first().and_then(Value::as_numeric_str).unwrap_or(0.0);
            let b = args.get(1).and_then(Value::as_numeric_str).unwrap_or(0.0);
            Ok(Value::Float(a + b))
        });
        let sub: rexx_core::interpreter::registry::BuiltinFn = Arc::new(|args: &[Value]| {
            let a = args.first().and_then(Value::as_numeric_str).unwrap_or(0.0);
            let b = args.get(1).and_then(Value::as_numeric_str).unwrap_or(0.0);
            Ok(Value::Float(a - b))
        });
        Some(Ok(LoadedLibrary {
            metadata: LibraryMetadata {
                lib_type: LibraryType::Functions,
                version: "1.0".to_string(),
                functions: vec!["add".to_string(), "sub".to_string()],
                operations: vec![],
                address_target: None,
                dependencies: vec![],
                interpreter_handles_interpolation: false,
            },
            functions: vec![
                ("add".to_string(), rexx_core::interpreter::registry::FunctionMetadata {
                    parameters: vec!["a".to_string(), "b".to_string()],
                    requires_parameters: true,
                }, add),
                ("sub".to_string(), rexx_core::interpreter::registry::FunctionMetadata {
                    parameters: vec!["a".to_string(), "b".to_string()],
                    requires_parameters: true,
                }, sub),
            ],
            operations: vec![],
            address_target: None,
        }))
    }
}

#[tokio::test]
async fn s6_require_with_as_regex_renames_exports() {
    let source = "REQUIRE \"./math-lib.js\" AS \"math_(.*)\"\n\
                  LET r = math_add(2, 3)\n\
                  SAY r\n";
    let script = parse_script(source).expect("script should parse");
    let mut interp = Interpreter::new(InterpreterOptions::default());
    interp.install_stdlib();
    interp.require_loader.add_source(Box::new(MathLibSource));
    interp.run(&script, Some(source)).await.expect("script should run");
    assert_eq!(interp.variables.get("r"), Value::Float(5.0));
    assert!(!interp.registry.has_function("add"), "bare add must not be callable after AS rename");
}

#[tokio::test]
async fn s7_array_filter_with_rexx_lambda() {
    let source = "LET xs = [1, 2, 3, 4, 5]\n\
                  LET evens = ARRAY_FILTER(xs, \"n => n // 2 = 0\")\n\
                  SAY evens\n";
    let (interp, _) = run(source).await;
    assert_eq!(
        interp.variables.get("evens"),
        Value::Array(vec![Value::Integer(2), Value::Integer(4)])
    );
}
