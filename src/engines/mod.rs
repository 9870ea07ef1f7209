//! Deterministic scoring engines
//!
//! Evidence weighting, false-positive framework and confidence scoring,
//! composed by the analytical engine. All pure functions; the LLM is not
//! allowed here.

pub mod confidence;
pub mod evidence;
pub mod false_positive;

use crate::models::{AlertInvestigationContext, AnalyticalResult};
use tracing::info;

/// Composes the sub-engines into one deterministic result. No branching
/// of its own beyond sequencing.
pub struct AnalyticalEngine;

impl AnalyticalEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, context: &AlertInvestigationContext) -> AnalyticalResult {
        let evidence = evidence::weigh(context);
        let false_positive_score = false_positive::score(&evidence);
        let false_positive_likelihood = false_positive::likelihood(false_positive_score);
        let confidence_score = confidence::score(context);

        info!(
            alert_id = %context.alert.alert_id,
            fp_score = false_positive_score,
            fp_likelihood = %false_positive_likelihood,
            confidence = confidence_score,
            "Deterministic analysis complete"
        );

        AnalyticalResult {
            evidence,
            false_positive_score,
            false_positive_likelihood,
            confidence_score,
        }
    }
}

impl Default for AnalyticalEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Alert, FalsePositiveLikelihood};
    use chrono::Utc;

    #[test]
    fn test_degraded_context_yields_high_likelihood() {
        let alert = Alert {
            alert_id: "a-1".to_string(),
            alert_code: "STRUCT-01".to_string(),
            severity: "HIGH".to_string(),
            customer_id: "cust-1".to_string(),
            account_number: "ACC-1".to_string(),
            amount: 100.0,
            currency: "EUR".to_string(),
            risk_score: 0.5,
            status: "OPEN".to_string(),
            created_at: Utc::now(),
        };

        let context = AlertInvestigationContext::degraded(alert);
        let result = AnalyticalEngine::new().analyze(&context);

        assert_eq!(result.false_positive_score, 0.0);
        assert_eq!(
            result.false_positive_likelihood,
            FalsePositiveLikelihood::High
        );
        assert!((0.0..=1.0).contains(&result.confidence_score));
    }
}
