//! Status transition table.
//!
//! A single dispatcher evaluates every requested edge instead of
//! scattering status-string checks across handlers. The review loop is
//!
//! ```text
//! Submitted -> Pending MEO -> Pending BFP -> Pending Mayor -> Pending MEO
//!           -> Approved -> Permit Issued
//! ```
//!
//! with `Payment Pending -> Payment Submitted -> Pending BFP` gating the
//! first MEO-to-BFP hop, and `Rejected` reachable from anywhere.

use crate::domain::types::{ApplicationStatus, ReviewOffice};

/// Statuses that advance an application through the review pipeline.
/// Entering any of them is blocked while rejection flags are unresolved.
const FORWARD_PROGRESS: [ApplicationStatus; 4] = [
    ApplicationStatus::PendingBfp,
    ApplicationStatus::PendingMayor,
    ApplicationStatus::Approved,
    ApplicationStatus::PermitIssued,
];

pub fn is_forward_progress(status: ApplicationStatus) -> bool {
    FORWARD_PROGRESS.contains(&status)
}

/// What entering a status does to the rejection sub-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionEffect {
    /// Leave the sub-record alone.
    None,
    /// Overwrite with the caller-supplied comments and missing list,
    /// marked unresolved.
    Record,
    /// Reset to the resolved empty state (unless the caller explicitly
    /// supplies a replacement).
    Clear,
}

/// Everything the engine needs to know about one edge of the state
/// machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// Office whose admin documents must exist before this edge is taken.
    pub required_documents: Option<ReviewOffice>,
    /// Office that drives this edge, when the edge belongs to a specific
    /// desk in the pipeline.
    pub driven_by: Option<ReviewOffice>,
    pub rejection_effect: RejectionEffect,
}

/// Resolve the rule for a requested edge. Every `(from, to)` pair of
/// valid statuses has a rule; validity of the target status itself is
/// checked before this table is consulted.
pub fn rule_for(from: ApplicationStatus, to: ApplicationStatus) -> TransitionRule {
    use ApplicationStatus as S;

    let (required_documents, driven_by) = match (from, to) {
        (S::PendingMeo, S::PendingBfp) => (Some(ReviewOffice::Meo), Some(ReviewOffice::Meo)),
        (S::PendingBfp, S::PendingMayor) => (Some(ReviewOffice::Bfp), Some(ReviewOffice::Bfp)),
        (S::PendingMayor, S::PendingMeo) => (Some(ReviewOffice::Mayor), Some(ReviewOffice::Mayor)),
        (_, S::Approved) | (_, S::PermitIssued) => (None, Some(ReviewOffice::Meo)),
        _ => (None, None),
    };

    let rejection_effect = match to {
        S::Rejected => RejectionEffect::Record,
        S::Submitted | S::PendingMeo | S::PaymentPending => RejectionEffect::Clear,
        _ => RejectionEffect::None,
    };

    TransitionRule {
        required_documents,
        driven_by,
        rejection_effect,
    }
}
