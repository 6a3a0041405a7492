//! Thin CLI front-end. All core logic lives in the library crate; this
//! binary only parses arguments, feeds a script to the parser/interpreter,
//! and reports the outcome (SPEC_FULL.md §10.3).

use clap::Parser;
use rexx_core::interpreter::types::{InterpreterOptions, SecurityPolicy};
use rexx_core::{parse_script, Interpreter};
use std::io::Read;

#[derive(Parser)]
#[command(name = "rexx")]
#[command(about = "An embeddable interpreter for a REXX-family scripting language")]
#[command(version)]
struct Cli {
    /// Execute the script from a command-line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Output the run's outcome as JSON (result, rc, errorText, exitCode)
    #[arg(long = "json")]
    json: bool,

    /// Initial TRACE mode: off, all, results, intermediate, normal
    #[arg(long = "trace")]
    trace: Option<String>,

    /// REQUIRE security policy: strict, moderate, default, permissive
    #[arg(long = "security-policy")]
    security_policy: Option<String>,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

fn parse_trace_mode(name: &str) -> rexx_core::ast::TraceMode {
    use rexx_core::ast::TraceMode;
    match name.to_ascii_uppercase().as_str() {
        "ALL" => TraceMode::All,
        "RESULTS" => TraceMode::Results,
        "INTERMEDIATE" => TraceMode::Intermediate,
        "NORMAL" => TraceMode::Normal,
        _ => TraceMode::Off,
    }
}

fn parse_security_policy(name: &str) -> SecurityPolicy {
    match name.to_ascii_uppercase().as_str() {
        "STRICT" => SecurityPolicy::Strict,
        "MODERATE" => SecurityPolicy::Moderate,
        "PERMISSIVE" => SecurityPolicy::Permissive,
        _ => SecurityPolicy::Default,
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error: Cannot read script file: {}: {}", file, e);
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("Error: No script provided. Use -c 'script', provide a script file, or pipe via stdin.");
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    if script.trim().is_empty() {
        if cli.json {
            println!("{}", serde_json::json!({"result": "", "rc": 0, "errorText": "", "exitCode": 0}));
        }
        std::process::exit(0);
    }

    let parsed = match parse_script(&script) {
        Ok(s) => s,
        Err(e) => {
            if cli.json {
                println!("{}", serde_json::json!({"result": "", "rc": 1, "errorText": e, "exitCode": 1}));
            } else {
                eprintln!("Syntax error: {}", e);
            }
            std::process::exit(1);
        }
    };

    let mut options = InterpreterOptions::default();
    if let Some(ref file) = cli.script_file {
        options = options.with_script_path(file.clone());
    }
    if let Some(ref policy) = cli.security_policy {
        options = options.with_security_policy(parse_security_policy(policy));
    }
    if let Some(ref trace) = cli.trace {
        options.initial_trace_mode = parse_trace_mode(trace);
    }

    let mut interp = Interpreter::new(options);
    interp.install_stdlib();

    let outcome = interp.run(&parsed, Some(&script)).await;

    let rc = interp.variables.get("RC");
    let error_text = interp.variables.get("ERRORTEXT").to_display_string();

    match outcome {
        Ok(value) => {
            let exit_code = match &value {
                rexx_core::Value::Integer(n) => (*n % 256) as i32,
                _ => rc.as_numeric_str().unwrap_or(0.0) as i32,
            };
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "result": value.to_display_string(),
                        "rc": rc.to_display_string(),
                        "errorText": error_text,
                        "exitCode": exit_code,
                    })
                );
            }
            std::process::exit(exit_code);
        }
        Err(err) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "result": "",
                        "rc": rc.to_display_string(),
                        "errorText": err.to_string(),
                        "exitCode": 1,
                    })
                );
            } else {
                eprintln!("{}", err);
            }
            std::process::exit(1);
        }
    }
}
