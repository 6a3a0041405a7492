//! REQUIRE security gating, the policy half of C9.
//!
//! Grounded on the teacher's `network/allow_list.rs` (an allow-listed
//! network fetch with an explicit policy enum) — here the policy gates
//! *what kind of library source* REQUIRE may resolve, rather than which
//! hosts a fetch may hit.

use crate::interpreter::types::SecurityPolicy;

/// Where a library would be loaded from, decided by the resolution-strategy
/// ladder before any I/O happens (SPEC_FULL.md §4.8 step 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryOrigin {
    BuiltIn,
    LocalPath,
    Registry,
    RemoteGit,
    ControlBus,
}

/// Approve or deny a REQUIRE under the active policy. `strict` allows only
/// built-ins and already-resolved local paths; `moderate` adds the registry;
/// `default` adds remote git; `permissive` allows everything including
/// control-bus loads.
pub fn approve(policy: SecurityPolicy, origin: LibraryOrigin) -> Result<(), String> {
    use LibraryOrigin::*;
    let allowed = match policy {
        SecurityPolicy::Strict => matches!(origin, BuiltIn | LocalPath),
        SecurityPolicy::Moderate => matches!(origin, BuiltIn | LocalPath | Registry),
        SecurityPolicy::Default => matches!(origin, BuiltIn | LocalPath | Registry | RemoteGit),
        SecurityPolicy::Permissive => true,
    };
    if allowed {
        Ok(())
    } else {
        Err(format!("security policy {:?} denies library origin {:?}", policy, origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_denies_registry() {
        assert!(approve(SecurityPolicy::Strict, LibraryOrigin::Registry).is_err());
    }

    #[test]
    fn permissive_allows_control_bus() {
        assert!(approve(SecurityPolicy::Permissive, LibraryOrigin::ControlBus).is_ok());
    }

    #[test]
    fn default_allows_remote_git_not_control_bus() {
        assert!(approve(SecurityPolicy::Default, LibraryOrigin::RemoteGit).is_ok());
        assert!(approve(SecurityPolicy::Default, LibraryOrigin::ControlBus).is_err());
    }
}
