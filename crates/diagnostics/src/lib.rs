// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic instrumentation: on repeated failure within a session, rewrite
//! the guest source with sentinel-prefixed trace statements at known anchor
//! points; on the next success, strip them back out.
//!
//! Injection is idempotent (re-running it on already-injected source is a
//! no-op) and reversible (stripping restores the byte-for-byte original,
//! modulo the injected lines themselves).

pub mod anchor;
pub mod injector;

pub use injector::{inject, is_injected, strip, InjectedLine};

use isolab_core::DIAGNOSTIC_SENTINEL;

/// How many consecutive failures in a session trigger an injection offer.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 2;

/// True once `failures >= threshold`. The caller must still have opted in
/// (`inject_debug=true`) for injection to actually run; this only answers
/// "is the session at the point where instrumentation would help."
pub fn should_offer_instrumentation(consecutive_failures: u32, threshold: u32) -> bool {
    consecutive_failures >= threshold
}

/// Quick sentinel scan, exposed at the crate root since callers (the engine)
/// frequently only need this check without pulling in the injector module.
pub fn contains_sentinel(source: &str) -> bool {
    source.lines().any(|line| line.contains(DIAGNOSTIC_SENTINEL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive_below_and_inclusive_at() {
        assert!(!should_offer_instrumentation(1, 2));
        assert!(should_offer_instrumentation(2, 2));
        assert!(should_offer_instrumentation(3, 2));
    }
}
