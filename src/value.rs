//! Value Model & Variable Store (C1).
//!
//! `Value` is the dynamically-typed value every expression produces; the
//! `VariableStore` is the insertion-ordered, case-insensitive mapping the
//! engine reads and writes. See SPEC_FULL.md §3 "Value" / "Variable Store".

use indexmap::IndexMap;
use std::fmt;

/// A dynamically-typed REXX value.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    /// An opaque host handle (e.g. a DOM element reference) that round-trips
    /// through REXX without being interpretable by the core itself.
    Handle(std::sync::Arc<dyn std::any::Any + Send + Sync>),
    Absent,
}

impl Default for Value {
    fn default() -> Self {
        Value::Absent
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Handle(a), Value::Handle(b)) => std::sync::Arc::ptr_eq(a, b),
            (Value::Absent, Value::Absent) => true,
            _ => false,
        }
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// REXX truthiness: non-empty strings other than `"0"`, and non-zero
    /// numbers, are true. Used by condition evaluation (C2).
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty() && s != "0",
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Handle(_) => true,
            Value::Absent => false,
        }
    }

    /// Whether this value looks numeric as a string (REXX arithmetic coerces
    /// numeric-looking strings transparently; SPEC_FULL.md §4.2).
    pub fn as_numeric_str(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => parse_numeric_literal(s.trim()),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// True if this is an integer-valued numeric (no fractional part, no
    /// exponent in the source string) — used to decide integer vs float
    /// arithmetic results.
    pub fn is_integral(&self) -> bool {
        match self {
            Value::Integer(_) => true,
            Value::Float(f) => f.fract() == 0.0,
            Value::String(s) => {
                let t = s.trim();
                parse_numeric_literal(t).is_some()
                    && !t.contains('.')
                    && !t.to_ascii_lowercase().contains('e')
            }
            _ => false,
        }
    }

    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Bool(b) => if *b { "1".to_string() } else { "0".to_string() },
            Value::Array(a) => {
                let items: Vec<String> = a.iter().map(|v| v.to_display_string()).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Object(o) => {
                let items: Vec<String> = o
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.to_display_string()))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            Value::Handle(_) => "[object Handle]".to_string(),
            Value::Absent => String::new(),
        }
    }
}

/// Format a float the way REXX expects: no trailing `.0` for whole numbers
/// unless the value actually carries a fractional part.
pub fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        let s = format!("{}", f);
        s
    }
}

/// Parse a string as a REXX numeric literal: optional sign, digits, optional
/// decimal point, optional exponent. Whitespace-trimmed by the caller.
pub fn parse_numeric_literal(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    let bytes = s.as_bytes();
    let mut i = 0;
    if bytes[i] == b'+' || bytes[i] == b'-' {
        i += 1;
    }
    let start_digits = i;
    let mut saw_digit = false;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        saw_digit = true;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            saw_digit = true;
        }
    }
    if !saw_digit {
        return None;
    }
    let _ = start_digits;
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    if i != bytes.len() {
        return None;
    }
    s.parse::<f64>().ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// Canonicalize a REXX identifier: upper-cased, surface case-insensitive.
/// Compound names (`stem.tail`) are left intact as a single literal key
/// (SPEC_FULL.md §3: "the dot is part of the key").
pub fn canonical_name(name: &str) -> String {
    name.to_ascii_uppercase()
}

/// Insertion-ordered, case-insensitive variable store.
///
/// Reads of an absent name return the uppercased name itself (classical REXX
/// "uninitialized variable" behavior), matching SPEC_FULL.md §3.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    vars: IndexMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self { vars: IndexMap::new() }
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(canonical_name(name), value);
    }

    /// Read a variable; if unset, return the uppercased name itself as a
    /// string (classical REXX default), not an error.
    pub fn get(&self, name: &str) -> Value {
        let key = canonical_name(name);
        self.vars.get(&key).cloned().unwrap_or(Value::String(key))
    }

    /// Read a variable only if it has been explicitly set, distinguishing
    /// "set to empty string" from "never assigned" for VAR()/SYMBOL()-style
    /// presence checks (SPEC_FULL.md §3: "specific functions exist to test
    /// presence").
    pub fn get_if_set(&self, name: &str) -> Option<&Value> {
        self.vars.get(&canonical_name(name))
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.vars.contains_key(&canonical_name(name))
    }

    pub fn unset(&mut self, name: &str) {
        self.vars.shift_remove(&canonical_name(name));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    /// Snapshot all variables as a plain mapping, handed to ADDRESS handlers
    /// as `context` (SPEC_FULL.md §6).
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.vars.clone()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_read_returns_uppercased_name() {
        let store = VariableStore::new();
        assert_eq!(store.get("foo"), Value::String("FOO".to_string()));
    }

    #[test]
    fn set_then_get_is_case_insensitive() {
        let mut store = VariableStore::new();
        store.set("Name", Value::string("world"));
        assert_eq!(store.get("NAME"), Value::string("world"));
        assert_eq!(store.get("name"), Value::string("world"));
    }

    #[test]
    fn compound_name_is_a_literal_key() {
        let mut store = VariableStore::new();
        store.set("stem.1", Value::string("a"));
        store.set("stem.2", Value::string("b"));
        assert_eq!(store.get("STEM.1"), Value::string("a"));
        assert!(!store.is_set("stem"));
    }

    #[test]
    fn numeric_literal_parsing() {
        assert_eq!(parse_numeric_literal("42"), Some(42.0));
        assert_eq!(parse_numeric_literal("-3.5"), Some(-3.5));
        assert_eq!(parse_numeric_literal("1.5e3"), Some(1500.0));
        assert_eq!(parse_numeric_literal("abc"), None);
        assert_eq!(parse_numeric_literal(""), None);
    }

    #[test]
    fn truthiness_rules() {
        assert!(Value::string("1").is_truthy());
        assert!(!Value::string("0").is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("false").is_truthy()); // non-empty, non-"0" string is true
    }

    #[test]
    fn insertion_order_preserved() {
        let mut store = VariableStore::new();
        store.set("b", Value::Integer(1));
        store.set("a", Value::Integer(2));
        let keys: Vec<&String> = store.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["B", "A"]);
    }
}
