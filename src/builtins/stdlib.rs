//! A small, representative standard library, registered through the same
//! mechanism an externally `REQUIRE`d library would use (§10.2).
//!
//! Grounded on the teacher's `commands/` directory as a whole: a pile of
//! independently testable leaf modules, each registered into one registry.
//! This plays the same role for REXX functions that `commands/*` plays for
//! bash external commands, at the scale this crate's leaf-library budget
//! allows.

use crate::interpreter::registry::{BuiltinRegistry, FunctionMetadata};
use crate::interpreter::InterpreterError;
use crate::value::Value;
use std::sync::Arc;

pub fn install(registry: &mut BuiltinRegistry) {
    install_string_functions(registry);
    install_numeric_functions(registry);
    install_environment_functions(registry);
}

fn meta(parameters: &[&str], requires_parameters: bool) -> FunctionMetadata {
    FunctionMetadata {
        parameters: parameters.iter().map(|s| s.to_string()).collect(),
        requires_parameters,
    }
}

fn numeric_arg(values: &[Value], index: usize, function: &str) -> Result<f64, InterpreterError> {
    values
        .get(index)
        .and_then(|v| v.as_numeric_str())
        .ok_or_else(|| InterpreterError::MissingParameter {
            function: function.to_string(),
            parameter: format!("argument {}", index + 1),
        })
}

fn install_string_functions(registry: &mut BuiltinRegistry) {
    registry.register_function(
        "UPPER",
        meta(&["text|string"], true),
        Arc::new(|values| Ok(Value::string(values[0].to_display_string().to_uppercase()))),
    );

    registry.register_function(
        "LOWER",
        meta(&["text|string"], true),
        Arc::new(|values| Ok(Value::string(values[0].to_display_string().to_lowercase()))),
    );

    registry.register_function(
        "LENGTH",
        meta(&["text|string"], true),
        Arc::new(|values| Ok(Value::Integer(values[0].to_display_string().chars().count() as i64))),
    );

    // SUBSTR(text, start, length?) — 1-based start, length defaults to the
    // remainder of the string.
    registry.register_function(
        "SUBSTR",
        meta(&["text|string", "start", "length"], true),
        Arc::new(|values| {
            let text = values[0].to_display_string();
            let chars: Vec<char> = text.chars().collect();
            let start = numeric_arg(values, 1, "SUBSTR")? as i64;
            let begin = (start.max(1) - 1) as usize;
            if begin >= chars.len() {
                return Ok(Value::string(""));
            }
            let length = match values.get(2) {
                Some(v) => v.as_numeric_str().map(|n| n as usize).unwrap_or(chars.len() - begin),
                None => chars.len() - begin,
            };
            let end = (begin + length).min(chars.len());
            Ok(Value::string(chars[begin..end].iter().collect::<String>()))
        }),
    );

    // POS(needle, haystack, start?) — 1-based match position, 0 if absent.
    registry.register_function(
        "POS",
        meta(&["needle", "haystack", "start"], true),
        Arc::new(|values| {
            let needle = values[0].to_display_string();
            let haystack = values.get(1).map(|v| v.to_display_string()).unwrap_or_default();
            let start = values.get(2).and_then(|v| v.as_numeric_str()).map(|n| n as usize).unwrap_or(1);
            let chars: Vec<char> = haystack.chars().collect();
            let search_from = start.saturating_sub(1).min(chars.len());
            let haystack_tail: String = chars[search_from..].iter().collect();
            match haystack_tail.find(&needle) {
                Some(byte_idx) => {
                    let char_idx = haystack_tail[..byte_idx].chars().count();
                    Ok(Value::Integer((search_from + char_idx + 1) as i64))
                }
                None => Ok(Value::Integer(0)),
            }
        }),
    );

    // STRIP(text, option?, char?) — option ∈ {B, L, T} (both/leading/trailing).
    registry.register_function(
        "STRIP",
        meta(&["text|string", "option", "char"], true),
        Arc::new(|values| {
            let text = values[0].to_display_string();
            let option = values
                .get(1)
                .map(|v| v.to_display_string().to_ascii_uppercase())
                .unwrap_or_else(|| "B".to_string());
            let pad = values.get(2).map(|v| v.to_display_string()).unwrap_or_else(|| " ".to_string());
            let pad_char = pad.chars().next().unwrap_or(' ');
            let trimmed = match option.as_str() {
                "L" => text.trim_start_matches(pad_char).to_string(),
                "T" => text.trim_end_matches(pad_char).to_string(),
                _ => text.trim_matches(pad_char).to_string(),
            };
            Ok(Value::string(trimmed))
        }),
    );

    registry.register_function(
        "REVERSE",
        meta(&["text|string"], true),
        Arc::new(|values| Ok(Value::string(values[0].to_display_string().chars().rev().collect::<String>()))),
    );

    registry.register_function(
        "WORDS",
        meta(&["text|string"], true),
        Arc::new(|values| Ok(Value::Integer(values[0].to_display_string().split_whitespace().count() as i64))),
    );

    // WORD(text, n) — 1-based, empty string if out of range.
    registry.register_function(
        "WORD",
        meta(&["text|string", "n"], true),
        Arc::new(|values| {
            let text = values[0].to_display_string();
            let n = numeric_arg(values, 1, "WORD")? as usize;
            if n == 0 {
                return Ok(Value::string(""));
            }
            Ok(Value::string(text.split_whitespace().nth(n - 1).unwrap_or("").to_string()))
        }),
    );

    // DATATYPE(value, type?) — without `type`: "NUM" or "CHAR". With `type`
    // (first letter of N/C/W): "1"/"0".
    registry.register_function(
        "DATATYPE",
        meta(&["value", "type"], true),
        Arc::new(|values| {
            let value = &values[0];
            let is_numeric = value.as_numeric_str().is_some();
            match values.get(1).map(|v| v.to_display_string().to_ascii_uppercase()) {
                None => Ok(Value::string(if is_numeric { "NUM" } else { "CHAR" })),
                Some(kind) => {
                    let matched = match kind.chars().next() {
                        Some('N') => is_numeric,
                        Some('W') => value.is_integral() && is_numeric,
                        Some('C') => true,
                        _ => false,
                    };
                    Ok(Value::string(if matched { "1" } else { "0" }))
                }
            }
        }),
    );

    registry.register_function(
        "COPIES",
        meta(&["text|string", "n"], true),
        Arc::new(|values| {
            let text = values[0].to_display_string();
            let n = numeric_arg(values, 1, "COPIES")?.max(0.0) as usize;
            Ok(Value::string(text.repeat(n)))
        }),
    );
}

fn install_numeric_functions(registry: &mut BuiltinRegistry) {
    registry.register_function(
        "ABS",
        meta(&["n"], true),
        Arc::new(|values| {
            let n = numeric_arg(values, 0, "ABS")?;
            Ok(if values[0].is_integral() { Value::Integer(n.abs() as i64) } else { Value::Float(n.abs()) })
        }),
    );

    // MAX/MIN are variadic: the registry hands through every positional
    // value regardless of the declared parameter count.
    registry.register_function(
        "MAX",
        meta(&["a", "b"], true),
        Arc::new(|values| reduce_numeric(values, "MAX", f64::max)),
    );

    registry.register_function(
        "MIN",
        meta(&["a", "b"], true),
        Arc::new(|values| reduce_numeric(values, "MIN", f64::min)),
    );

    // TRUNC(n, decimals?) — truncate towards zero at `decimals` places.
    registry.register_function(
        "TRUNC",
        meta(&["n", "decimals"], true),
        Arc::new(|values| {
            let n = numeric_arg(values, 0, "TRUNC")?;
            let decimals = values.get(1).and_then(|v| v.as_numeric_str()).unwrap_or(0.0) as i32;
            let factor = 10f64.powi(decimals);
            let truncated = (n * factor).trunc() / factor;
            if decimals <= 0 {
                Ok(Value::Integer(truncated as i64))
            } else {
                Ok(Value::Float(truncated))
            }
        }),
    );

    registry.register_function(
        "SIGN",
        meta(&["n"], true),
        Arc::new(|values| {
            let n = numeric_arg(values, 0, "SIGN")?;
            Ok(Value::Integer(if n > 0.0 { 1 } else if n < 0.0 { -1 } else { 0 }))
        }),
    );

    // FORMAT(n, before?, after?) — pad/truncate the integer part to at least
    // `before` digits and the fractional part to exactly `after` digits.
    registry.register_function(
        "FORMAT",
        meta(&["n", "before", "after"], true),
        Arc::new(|values| {
            let n = numeric_arg(values, 0, "FORMAT")?;
            let after = values.get(2).and_then(|v| v.as_numeric_str()).map(|v| v as usize);
            let formatted = match after {
                Some(decimals) => format!("{:.*}", decimals, n),
                None => crate::value::format_float(n),
            };
            let before = values.get(1).and_then(|v| v.as_numeric_str()).map(|v| v as usize);
            let padded = match before {
                Some(width) => {
                    let (sign, digits) =
                        if let Some(stripped) = formatted.strip_prefix('-') { ("-", stripped) } else { ("", formatted.as_str()) };
                    let int_len = digits.split('.').next().unwrap_or(digits).len();
                    if int_len < width {
                        format!("{}{}{}", sign, "0".repeat(width - int_len), digits)
                    } else {
                        format!("{}{}", sign, digits)
                    }
                }
                None => formatted,
            };
            Ok(Value::string(padded))
        }),
    );
}

fn reduce_numeric(values: &[Value], name: &str, pick: fn(f64, f64) -> f64) -> Result<Value, InterpreterError> {
    if values.is_empty() {
        return Err(InterpreterError::MissingParameter { function: name.to_string(), parameter: "a".to_string() });
    }
    let mut all_integral = true;
    let mut acc = numeric_arg(values, 0, name)?;
    all_integral &= values[0].is_integral();
    for (i, v) in values.iter().enumerate().skip(1) {
        let n = numeric_arg(values, i, name)?;
        acc = pick(acc, n);
        all_integral &= v.is_integral();
    }
    Ok(if all_integral { Value::Integer(acc as i64) } else { Value::Float(acc) })
}

fn install_environment_functions(registry: &mut BuiltinRegistry) {
    registry.register_function(
        "TODAY",
        meta(&[], true),
        Arc::new(|_| Ok(Value::string(chrono::Local::now().format("%Y-%m-%d").to_string()))),
    );

    registry.register_function(
        "NOW",
        meta(&[], true),
        Arc::new(|_| Ok(Value::string(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()))),
    );

    registry.register_function("UUID", meta(&[], true), Arc::new(|_| Ok(Value::string(generate_uuid_v4()))));

    registry.register_function(
        "GETENV",
        meta(&["name"], true),
        Arc::new(|values| Ok(Value::string(std::env::var(values[0].to_display_string()).unwrap_or_default()))),
    );

    // RANDOM([min[,max]]) — inclusive range, default 0-999.
    registry.register_function(
        "RANDOM",
        meta(&["min", "max"], true),
        Arc::new(|values| {
            use rand::Rng;
            let min = values.first().and_then(|v| v.as_numeric_str()).unwrap_or(0.0) as i64;
            let max = values.get(1).and_then(|v| v.as_numeric_str()).unwrap_or(999.0) as i64;
            let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
            Ok(Value::Integer(rand::thread_rng().gen_range(lo..=hi)))
        }),
    );
}

fn generate_uuid_v4() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7], bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::registry::BuiltinRegistry;

    fn registry() -> BuiltinRegistry {
        let mut r = BuiltinRegistry::new();
        install(&mut r);
        r
    }

    #[test]
    fn upper_and_lower_round_trip() {
        let r = registry();
        assert_eq!(r.call_function("UPPER", &[], &[Value::string("abc")]).unwrap(), Value::string("ABC"));
        assert_eq!(r.call_function("LOWER", &[], &[Value::string("ABC")]).unwrap(), Value::string("abc"));
    }

    #[test]
    fn substr_extracts_one_based_range() {
        let r = registry();
        let result = r
            .call_function("SUBSTR", &[], &[Value::string("hello world"), Value::Integer(7), Value::Integer(5)])
            .unwrap();
        assert_eq!(result, Value::string("world"));
    }

    #[test]
    fn pos_reports_one_based_index_or_zero() {
        let r = registry();
        let found = r.call_function("POS", &[], &[Value::string("lo"), Value::string("hello")]).unwrap();
        assert_eq!(found, Value::Integer(4));
        let missing = r.call_function("POS", &[], &[Value::string("xyz"), Value::string("hello")]).unwrap();
        assert_eq!(missing, Value::Integer(0));
    }

    #[test]
    fn strip_defaults_to_trimming_both_sides() {
        let r = registry();
        let result = r.call_function("STRIP", &[], &[Value::string("  hi  ")]).unwrap();
        assert_eq!(result, Value::string("hi"));
    }

    #[test]
    fn datatype_distinguishes_numeric_from_character() {
        let r = registry();
        assert_eq!(r.call_function("DATATYPE", &[], &[Value::string("42")]).unwrap(), Value::string("NUM"));
        assert_eq!(r.call_function("DATATYPE", &[], &[Value::string("abc")]).unwrap(), Value::string("CHAR"));
    }

    #[test]
    fn max_and_min_are_variadic() {
        let r = registry();
        let result = r
            .call_function("MAX", &[], &[Value::Integer(3), Value::Integer(9), Value::Integer(5)])
            .unwrap();
        assert_eq!(result, Value::Integer(9));
    }

    #[test]
    fn uuid_has_version_four_nibble() {
        let r = registry();
        let id = r.call_function("UUID", &[], &[]).unwrap().to_display_string();
        assert_eq!(id.chars().nth(14), Some('4'));
    }
}
