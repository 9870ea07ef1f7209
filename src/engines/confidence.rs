//! Confidence score engine
//!
//! Measures data completeness of the context, not model certainty.

use crate::models::AlertInvestigationContext;

/// Start at 1.0 and deduct per missing context field, floored at 0.0.
pub fn score(context: &AlertInvestigationContext) -> f64 {
    let mut score: f64 = 1.0;

    if context.triggering_transaction.is_none() || context.transaction_history.is_empty() {
        score -= 0.3;
    }
    if context.alert_history.is_empty() {
        score -= 0.1;
    }
    if context.customer_behaviour.is_none() {
        score -= 0.2;
    }

    score.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Alert, CustomerBehaviourProfile, Transaction};
    use chrono::Utc;

    fn full_context() -> AlertInvestigationContext {
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

        let tx = Transaction {
            transaction_id: "t-1".to_string(),
            transaction_type: "TRANSFER".to_string(),
            amount: 100.0,
            currency: "EUR".to_string(),
            channel: "ONLINE".to_string(),
            timestamp: Utc::now(),
            source_account: "ACC-1".to_string(),
            destination_account: "ACC-2".to_string(),
            geolocation: None,
        };

        let mut context = AlertInvestigationContext::degraded(alert.clone());
        context.alert_history = vec![alert];
        context.triggering_transaction = Some(tx.clone());
        context.transaction_history = vec![tx];
        context.customer_behaviour = Some(CustomerBehaviourProfile {
            customer_id: "cust-1".to_string(),
            average_transaction_amount: 100.0,
            max_transaction_amount: 200.0,
            preferred_channels: vec!["ONLINE".to_string()],
            last_active_at: None,
        });
        context
    }

    #[test]
    fn test_full_context_scores_one() {
        assert_eq!(score(&full_context()), 1.0);
    }

    #[test]
    fn test_monotonic_decrease_as_fields_go_missing() {
        let full = full_context();

        let mut no_behaviour = full.clone();
        no_behaviour.customer_behaviour = None;

        let mut no_behaviour_no_history = no_behaviour.clone();
        no_behaviour_no_history.alert_history.clear();

        let full_score = score(&full);
        let one_missing = score(&no_behaviour);
        let two_missing = score(&no_behaviour_no_history);

        assert!(full_score >= one_missing);
        assert!(one_missing >= two_missing);
        assert!((one_missing - 0.8).abs() < 1e-9);
        assert!((two_missing - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_fully_degraded_context_score() {
        // Every deduction applies: 1.0 - 0.3 - 0.1 - 0.2
        let alert = full_context().alert;
        let empty = AlertInvestigationContext::degraded(alert);
        let value = score(&empty);
        assert!((value - 0.4).abs() < 1e-9);
        assert!((0.0..=1.0).contains(&value));
    }
}
