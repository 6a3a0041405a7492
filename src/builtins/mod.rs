//! Leaf-level built-in function library (§10.2), outside the core's
//! component budget — registered through the same mechanism an externally
//! `REQUIRE`d library would use.

pub mod stdlib;
