//! False-positive framework
//!
//! Combines the four evidence signals into one weighted score in [0,1]
//! and maps it to a likelihood band. The pair is deterministic ground
//! truth and is never edited after computation.

use crate::models::{EvidenceResult, FalsePositiveLikelihood};

const PATTERN_WEIGHT: f64 = 0.35;
const ALIGNMENT_WEIGHT: f64 = 0.30;
const BENEFICIARY_WEIGHT: f64 = 0.20;
const VELOCITY_WEIGHT: f64 = 0.15;

/// Maximum single-signal rank (Strong = 3), used to normalize into [0,1].
const MAX_RANK: f64 = 3.0;

/// Weighted false-positive score over the integer ranks of the signals.
pub fn score(evidence: &EvidenceResult) -> f64 {
    let weighted = PATTERN_WEIGHT * evidence.pattern_consistency.rank() as f64
        + ALIGNMENT_WEIGHT * evidence.behaviour_alignment.rank() as f64
        + BENEFICIARY_WEIGHT * evidence.beneficiary_risk.rank() as f64
        + VELOCITY_WEIGHT * evidence.velocity_anomaly.rank() as f64;

    weighted / MAX_RANK
}

/// Likelihood band for a score: high scores mean strong evidence of
/// legitimate behaviour, so a *low* likelihood of true fraud.
pub fn likelihood(score: f64) -> FalsePositiveLikelihood {
    if score >= 0.7 {
        FalsePositiveLikelihood::Low
    } else if score >= 0.4 {
        FalsePositiveLikelihood::Medium
    } else {
        FalsePositiveLikelihood::High
    }
}
