//! Abstract Syntax Tree for REXX source.
//!
//! This module defines the command-node contract the parser (§10.1) produces
//! and the core engine (C14) consumes. Every node carries a `line` for
//! diagnostics; see SPEC_FULL.md §3/§6.

pub mod types;

pub use types::*;
