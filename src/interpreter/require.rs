//! REQUIRE / Dependency Loader (C9).
//!
//! Grounded on the teacher's `network/allow_list.rs` + `network/fetch.rs`
//! (allow-listed fetch behind an explicit policy enum) for the security
//! gate, and `commands/curl/parse.rs`'s layered-resolution style for the
//! strategy ladder. Network/git/control-bus resolution is modeled over an
//! injectable `LibrarySource` trait — the way the teacher's
//! `interpreter::interpreter::FileSystem` is an injectable trait — so the
//! core carries no hard network dependency (see DESIGN.md). CSV parsing of
//! the publisher/module registry format uses the teacher's `csv` dependency.

use crate::interpreter::address::AddressHandler;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::registry::{BuiltinFn, FunctionMetadata, OperationFn};
use crate::interpreter::types::{AddressTargetRecord, DependencyNode, SecurityPolicy};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryType {
    Functions,
    AddressTarget,
    Hybrid,
}

/// Detection-function contract result (SPEC_FULL.md §6 "Library detection
/// function contract").
#[derive(Debug, Clone)]
pub struct LibraryMetadata {
    pub lib_type: LibraryType,
    pub version: String,
    pub functions: Vec<String>,
    pub operations: Vec<String>,
    pub address_target: Option<String>,
    pub dependencies: Vec<String>,
    pub interpreter_handles_interpolation: bool,
}

/// What a resolved library hands back to the loader to register into C8/C7.
pub struct LoadedLibrary {
    pub metadata: LibraryMetadata,
    pub functions: Vec<(String, FunctionMetadata, BuiltinFn)>,
    pub operations: Vec<(String, OperationFn)>,
    pub address_target: Option<(String, Arc<dyn AddressHandler>, AddressTargetRecord)>,
}

/// Injectable resolver for one step of the resolution-strategy ladder
/// (SPEC_FULL.md §4.8 step 6). Concrete host embeddings provide sources for
/// built-in, local-path, registry, remote-git, and control-bus origins in
/// that preference order; this core ships only the built-in source plus the
/// trait, per DESIGN.md.
pub trait LibrarySource: Send + Sync {
    fn origin(&self) -> crate::security::LibraryOrigin;
    fn try_resolve(&self, name: &str) -> Option<Result<LoadedLibrary, String>>;
}

#[derive(Default)]
pub struct RequireLoader {
    loading: HashSet<String>,
    loaded: HashSet<String>,
    pub dependency_graph: IndexMap<String, DependencyNode>,
    sources: Vec<Box<dyn LibrarySource>>,
}

impl RequireLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, source: Box<dyn LibrarySource>) {
        self.sources.push(source);
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(&canonical(name))
    }

    /// Top-level `requireWithDependencies` (SPEC_FULL.md §4.8).
    pub fn require(
        &mut self,
        name: &str,
        policy: SecurityPolicy,
    ) -> Result<Option<LoadedLibrary>, InterpreterError> {
        let key = canonical(name);

        // Cycle guard (step 2).
        if self.loading.contains(&key) {
            return Ok(None);
        }
        // Already-loaded check (step 4).
        if self.loaded.contains(&key) {
            return Ok(None);
        }

        self.loading.insert(key.clone());
        let result = self.require_inner(&key, policy);
        self.loading.remove(&key);
        result
    }

    fn require_inner(
        &mut self,
        key: &str,
        policy: SecurityPolicy,
    ) -> Result<Option<LoadedLibrary>, InterpreterError> {
        let mut resolved: Option<Result<LoadedLibrary, String>> = None;
        let mut origin_used = None;
        for source in &self.sources {
            if let Some(result) = source.try_resolve(key) {
                crate::security::approve(policy, source.origin()).map_err(|e| {
                    InterpreterError::RequireFailure(format!("permission denied: {}", e))
                })?;
                origin_used = Some(source.origin());
                resolved = Some(result);
                break;
            }
        }

        let loaded = match resolved {
            Some(Ok(lib)) => lib,
            Some(Err(message)) => {
                return Err(InterpreterError::RequireFailure(format!(
                    "REQUIRE path resolution failed: {}",
                    message
                )))
            }
            None => {
                return Err(InterpreterError::RequireFailure(format!(
                    "no source could resolve library {}",
                    key
                )))
            }
        };
        log::debug!("REQUIRE resolved {} via {:?}", key, origin_used);

        // Dependency extraction + recursion (step 5) before registering self.
        let node = self
            .dependency_graph
            .entry(key.to_string())
            .or_insert_with(DependencyNode::default);
        node.dependencies = loaded.metadata.dependencies.clone();
        node.loading = true;
        let deps = loaded.metadata.dependencies.clone();
        for dep in &deps {
            self.require(dep, policy)?;
        }
        if let Some(node) = self.dependency_graph.get_mut(key) {
            node.loading = false;
        }

        self.loaded.insert(key.to_string());
        Ok(Some(loaded))
    }
}

fn canonical(name: &str) -> String {
    name.to_string()
}

/// Path-normalization predicate (SPEC_FULL.md §4.8 step 1): does `name` look
/// like a filesystem path rather than a registry/built-in identifier?
pub fn looks_like_path(name: &str) -> bool {
    name.starts_with("./")
        || name.starts_with("../")
        || name.starts_with('/')
        || name.starts_with("root:")
        || name.starts_with("cwd:")
        || (name.len() > 1 && name.as_bytes()[1] == b':') // drive letter
}

/// Rewrite a declared function/operation name under an `AS` clause
/// (SPEC_FULL.md §4.8 "AS-clause rewriting"). If the clause contains a
/// `(.*)` capture marker, everything before it is a literal prefix; else the
/// whole clause is a prefix, with `_` auto-appended if the clause doesn't
/// already end in one.
pub fn apply_as_clause(clause: &str, original_name: &str) -> String {
    if let Some(idx) = clause.find("(.*)") {
        let prefix = &clause[..idx];
        return format!("{}{}", prefix, original_name);
    }
    let mut prefix = clause.to_string();
    if !prefix.ends_with('_') {
        prefix.push('_');
    }
    format!("{}{}", prefix, original_name)
}

/// An ADDRESS target's AS-clause is the exact new name; regex patterns are
/// rejected outright.
pub fn apply_as_clause_to_address_target(clause: &str) -> Result<String, InterpreterError> {
    if clause.contains("(.*)") || clause.contains('*') {
        return Err(InterpreterError::RequireFailure(
            "AS clause for an ADDRESS target must be a literal name, not a pattern".to_string(),
        ));
    }
    Ok(clause.to_string())
}

/// Parse the publisher index format: `namespace,registry_url` CSV lines,
/// `#`-prefixed comments, blank-line tolerant (SPEC_FULL.md §6).
pub fn parse_publisher_index(csv_text: &str) -> Result<Vec<(String, String)>, InterpreterError> {
    let mut out = Vec::new();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    for record in reader.records() {
        let record = record
            .map_err(|e| InterpreterError::RequireFailure(format!("Publisher registry lookup failed: {}", e)))?;
        if record.len() < 2 {
            continue;
        }
        let namespace = record.get(0).unwrap_or("").trim();
        let url = record.get(1).unwrap_or("").trim();
        if namespace.is_empty() || url.is_empty() {
            continue;
        }
        out.push((namespace.to_string(), url.to_string()));
    }
    Ok(out)
}

/// Parse the module index format: `module_name,type,url_template` CSV lines
/// with `{tag}` as the version placeholder.
pub fn parse_module_index(
    csv_text: &str,
) -> Result<Vec<(String, String, String)>, InterpreterError> {
    let mut out = Vec::new();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    for record in reader.records() {
        let record = record
            .map_err(|e| InterpreterError::RequireFailure(format!("Publisher registry lookup failed: {}", e)))?;
        if record.len() < 3 {
            continue;
        }
        out.push((
            record.get(0).unwrap_or("").trim().to_string(),
            record.get(1).unwrap_or("").trim().to_string(),
            record.get(2).unwrap_or("").trim().to_string(),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_prefix_auto_appends_underscore() {
        assert_eq!(apply_as_clause("p", "F"), "p_F");
        assert_eq!(apply_as_clause("p_", "F"), "p_F");
    }

    #[test]
    fn capture_marker_uses_literal_prefix() {
        assert_eq!(apply_as_clause("lib_(.*)", "F"), "lib_F");
    }

    #[test]
    fn address_target_as_clause_rejects_patterns() {
        assert!(apply_as_clause_to_address_target("lib_(.*)").is_err());
        assert_eq!(apply_as_clause_to_address_target("MYSQL").unwrap(), "MYSQL");
    }

    #[test]
    fn path_detection() {
        assert!(looks_like_path("./lib.rexx"));
        assert!(looks_like_path("/abs/path"));
        assert!(!looks_like_path("json-utils"));
    }

    #[test]
    fn publisher_index_skips_comments_and_blanks() {
        let csv = "# comment\n\nacme,https://acme.example/registry\n";
        let parsed = parse_publisher_index(csv).unwrap();
        assert_eq!(parsed, vec![("acme".to_string(), "https://acme.example/registry".to_string())]);
    }

    #[test]
    fn cycle_guard_prevents_infinite_recursion() {
        struct SelfReferential;
        impl LibrarySource for SelfReferential {
            fn origin(&self) -> crate::security::LibraryOrigin {
                crate::security::LibraryOrigin::BuiltIn
            }
            fn try_resolve(&self, _name: &str) -> Option<Result<LoadedLibrary, String>> {
                Some(Ok(LoadedLibrary {
                    metadata: LibraryMetadata {
                        lib_type: LibraryType::Functions,
                        version: "1.0".into(),
                        functions: vec![],
                        operations: vec![],
                        address_target: None,
                        dependencies: vec!["A".to_string()],
                        interpreter_handles_interpolation: false,
                    },
                    functions: vec![],
                    operations: vec![],
                    address_target: None,
                }))
            }
        }
        let mut loader = RequireLoader::new();
        loader.add_source(Box::new(SelfReferential));
        let result = loader.require("A", SecurityPolicy::Permissive);
        assert!(result.is_ok());
    }
}
