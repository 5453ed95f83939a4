//! The override gate: a per-session state machine guarding divergences.
//!
//! Once the policy flags a scan, the gate holds the pending triple and blocks
//! further acceptance on that session until a supervisor or admin authorizes
//! it or the operator cancels. Resolutions fold straight back to idle; no
//! state carries over between independent attempts.
//!
//! The gate itself is synchronous and holds no I/O handles. The driver (the
//! scan service) pumps events into it: `flag` on a `RequireOverride` verdict,
//! then `resolve` after successful authentication and persistence, or
//! `cancel` at any time before persistence is attempted.

use crate::domain::policy::DivergenceReason;
use crate::domain::scan::{ScanCode, ScreenContext};

/// The triple (plus flag reason) held while authorization is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDivergence {
    /// Screen the flagged scan came from.
    pub context: ScreenContext,
    /// First scanned code.
    pub transport: ScanCode,
    /// Second scanned code.
    pub order: ScanCode,
    /// Why the policy flagged the pair.
    pub reason: DivergenceReason,
}

/// Errors raised by gate transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverrideGateError {
    /// A new divergence arrived while one is already awaiting authorization.
    #[error("a divergence is already awaiting authorization")]
    AlreadyPending,
    /// A submission or cancel arrived with nothing pending.
    #[error("no divergence is awaiting authorization")]
    NothingPending,
}

/// Gate state: idle, or holding one pending divergence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideGate {
    pending: Option<PendingDivergence>,
}

impl OverrideGate {
    /// A fresh idle gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a divergence is awaiting authorization.
    pub fn is_awaiting(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending divergence, if any.
    pub fn pending(&self) -> Option<&PendingDivergence> {
        self.pending.as_ref()
    }

    /// Move from idle to awaiting-authorization with the flagged triple.
    pub fn flag(&mut self, pending: PendingDivergence) -> Result<(), OverrideGateError> {
        if self.pending.is_some() {
            return Err(OverrideGateError::AlreadyPending);
        }
        self.pending = Some(pending);
        Ok(())
    }

    /// Take the pending divergence after a successful authorization.
    ///
    /// Only called once persistence succeeded; a failed append leaves the
    /// gate awaiting so the operator can retry without re-scanning.
    pub fn resolve(&mut self) -> Result<PendingDivergence, OverrideGateError> {
        self.pending.take().ok_or(OverrideGateError::NothingPending)
    }

    /// Discard the pending divergence without persisting anything.
    pub fn cancel(&mut self) -> Result<PendingDivergence, OverrideGateError> {
        self.pending.take().ok_or(OverrideGateError::NothingPending)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    fn pending() -> PendingDivergence {
        PendingDivergence {
            context: ScreenContext::Single,
            transport: ScanCode::sanitize("AAA1111111"),
            order: ScanCode::sanitize("BBB2222222"),
            reason: DivergenceReason::Mismatch,
        }
    }

    #[test]
    fn fresh_gates_are_idle() {
        let gate = OverrideGate::new();
        assert!(!gate.is_awaiting());
        assert!(gate.pending().is_none());
    }

    #[test]
    fn flagging_moves_to_awaiting() {
        let mut gate = OverrideGate::new();
        gate.flag(pending()).expect("idle gate accepts a flag");
        assert!(gate.is_awaiting());
        assert_eq!(gate.pending(), Some(&pending()));
    }

    #[test]
    fn a_second_flag_is_refused_while_awaiting() {
        let mut gate = OverrideGate::new();
        gate.flag(pending()).expect("idle gate accepts a flag");
        let err = gate.flag(pending()).expect_err("second flag must fail");
        assert_eq!(err, OverrideGateError::AlreadyPending);
        assert!(gate.is_awaiting());
    }

    #[test]
    fn resolve_returns_the_triple_and_goes_idle() {
        let mut gate = OverrideGate::new();
        gate.flag(pending()).expect("idle gate accepts a flag");
        let resolved = gate.resolve().expect("awaiting gate resolves");
        assert_eq!(resolved, pending());
        assert!(!gate.is_awaiting());
    }

    #[test]
    fn cancel_discards_and_goes_idle() {
        let mut gate = OverrideGate::new();
        gate.flag(pending()).expect("idle gate accepts a flag");
        let discarded = gate.cancel().expect("awaiting gate cancels");
        assert_eq!(discarded, pending());
        assert!(!gate.is_awaiting());
    }

    #[test]
    fn resolve_and_cancel_require_a_pending_divergence() {
        let mut gate = OverrideGate::new();
        assert_eq!(
            gate.resolve().expect_err("idle resolve must fail"),
            OverrideGateError::NothingPending
        );
        assert_eq!(
            gate.cancel().expect_err("idle cancel must fail"),
            OverrideGateError::NothingPending
        );
    }

    #[test]
    fn gates_are_reusable_after_resolution() {
        let mut gate = OverrideGate::new();
        gate.flag(pending()).expect("first flag");
        let _ = gate.resolve().expect("resolve");
        gate.flag(pending()).expect("gate accepts a new flag after resolving");
        let _ = gate.cancel().expect("cancel");
        gate.flag(pending()).expect("gate accepts a new flag after cancelling");
    }
}
