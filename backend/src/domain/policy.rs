//! Divergence policy: the pure verdict function over a scanned pair.
//!
//! Equality between the two scanned codes is the primary correctness check.
//! Any mismatch, and any exact repeat of a previously recorded triple, is
//! treated as equally suspicious and funnelled through the same override
//! path. The policy is a single total function with three outcomes and no
//! partial states; the duplicate lookup happens before the call so the
//! function itself stays pure.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::scan::{ScanCode, ScreenContext};

/// Why a scan needs a supervisor or admin before it can be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceReason {
    /// The two scanned codes differ.
    Mismatch,
    /// The triple was already recorded earlier.
    Duplicate,
}

/// Outcome of evaluating a scanned pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Record immediately: codes match and the triple is new.
    Accept,
    /// One or both codes were empty after sanitization; nothing is recorded
    /// and the operator re-enters the pair.
    Incomplete,
    /// Pause for a privileged override before anything is recorded.
    RequireOverride(DivergenceReason),
}

/// Evaluate a sanitized pair against the policy.
///
/// `duplicate` is the result of the record store's lookup for the
/// `(context, transport, order)` triple; the same rule applies in both
/// screen contexts.
pub fn evaluate(
    transport: &ScanCode,
    order: &ScanCode,
    _context: ScreenContext,
    duplicate: bool,
) -> Verdict {
    if transport.is_empty() || order.is_empty() {
        return Verdict::Incomplete;
    }
    if transport != order {
        return Verdict::RequireOverride(DivergenceReason::Mismatch);
    }
    if duplicate {
        return Verdict::RequireOverride(DivergenceReason::Duplicate);
    }
    Verdict::Accept
}
