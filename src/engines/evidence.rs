//! Evidence weighting engine
//!
//! Pure function of the investigation context. Four independent ordinal
//! signals; missing data always degrades to `None`, never to an error.

use crate::models::{AlertInvestigationContext, EvidenceResult, EvidenceStrength, Transaction};
use chrono::Duration;
use tracing::debug;

/// Weigh all four evidence signals for a context.
pub fn weigh(context: &AlertInvestigationContext) -> EvidenceResult {
    let result = EvidenceResult {
        pattern_consistency: pattern_consistency(context),
        behaviour_alignment: behaviour_alignment(context),
        velocity_anomaly: velocity_anomaly(context),
        beneficiary_risk: beneficiary_risk(context),
    };

    debug!(
        pattern = %result.pattern_consistency,
        alignment = %result.behaviour_alignment,
        velocity = %result.velocity_anomaly,
        beneficiary = %result.beneficiary_risk,
        "Evidence signals weighed"
    );

    result
}

/// Alert amount against the mean of the transaction history.
fn pattern_consistency(context: &AlertInvestigationContext) -> EvidenceStrength {
    if context.transaction_history.is_empty() {
        return EvidenceStrength::None;
    }

    let mean = context
        .transaction_history
        .iter()
        .map(|tx| tx.amount)
        .sum::<f64>()
        / context.transaction_history.len() as f64;

    let amount = context.alert.amount;
    if amount <= mean * 1.2 {
        EvidenceStrength::Strong
    } else if amount <= mean * 2.0 {
        EvidenceStrength::Moderate
    } else {
        EvidenceStrength::Weak
    }
}

/// Alert amount against the behavioural baseline's maximum.
fn behaviour_alignment(context: &AlertInvestigationContext) -> EvidenceStrength {
    let Some(behaviour) = &context.customer_behaviour else {
        return EvidenceStrength::None;
    };

    let amount = context.alert.amount;
    let max = behaviour.max_transaction_amount;

    if amount <= max * 1.1 {
        EvidenceStrength::Strong
    } else if amount <= max * 2.0 {
        EvidenceStrength::Moderate
    } else {
        EvidenceStrength::Weak
    }
}

/// Count and sum of transactions in the 1-hour trailing window ending at the
/// triggering transaction. Checks are ordered: count >= 10, window amount
/// >= 3x triggering amount, count >= 5.
fn velocity_anomaly(context: &AlertInvestigationContext) -> EvidenceStrength {
    let Some(triggering) = &context.triggering_transaction else {
        return EvidenceStrength::None;
    };

    let window_start = triggering.timestamp - Duration::hours(1);
    let in_window: Vec<&Transaction> = context
        .transaction_history
        .iter()
        .filter(|tx| tx.timestamp > window_start && tx.timestamp <= triggering.timestamp)
        .collect();

    let count = in_window.len();
    let window_amount: f64 = in_window.iter().map(|tx| tx.amount).sum();

    if count >= 10 {
        EvidenceStrength::Strong
    } else if window_amount >= triggering.amount * 3.0 {
        EvidenceStrength::Moderate
    } else if count >= 5 {
        EvidenceStrength::Weak
    } else {
        EvidenceStrength::None
    }
}

/// Prior transactions sharing the triggering transaction's normalized
/// destination account. A brand-new counterparty is the riskiest signal.
fn beneficiary_risk(context: &AlertInvestigationContext) -> EvidenceStrength {
    let Some(triggering) = &context.triggering_transaction else {
        return EvidenceStrength::None;
    };

    let destination = normalize_account(&triggering.destination_account);

    let prior_count = context
        .transaction_history
        .iter()
        .filter(|tx| tx.transaction_id != triggering.transaction_id)
        .filter(|tx| normalize_account(&tx.destination_account) == destination)
        .count();

    if prior_count == 0 {
        EvidenceStrength::Strong
    } else if prior_count <= 2 {
        EvidenceStrength::Moderate
    } else if prior_count <= 5 {
        EvidenceStrength::Weak
    } else {
        EvidenceStrength::None
    }
}

fn normalize_account(account: &str) -> String {
    account
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Alert;
    use chrono::Utc;

    fn alert_with_amount(amount: f64) -> Alert {
        Alert {
            alert_id: "a-1".to_string(),
            alert_code: "VEL-02".to_string(),
            severity: "HIGH".to_string(),
            customer_id: "cust-1".to_string(),
            account_number: "ACC-1".to_string(),
            amount,
            currency: "EUR".to_string(),
            risk_score: 0.5,
            status: "OPEN".to_string(),
            created_at: Utc::now(),
        }
    }

    fn tx(id: &str, amount: f64, minutes_ago: i64, destination: &str) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            transaction_type: "TRANSFER".to_string(),
            amount,
            currency: "EUR".to_string(),
            channel: "ONLINE".to_string(),
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            source_account: "ACC-1".to_string(),
            destination_account: destination.to_string(),
            geolocation: None,
        }
    }

    fn most_recent(history: &[Transaction]) -> Option<Transaction> {
        history
            .iter()
            .max_by_key(|tx| tx.timestamp)
            .cloned()
    }

    fn context_with(
        amount: f64,
        history: Vec<Transaction>,
        behaviour_max: Option<f64>,
    ) -> AlertInvestigationContext {
        let triggering = most_recent(&history);
        let mut context = AlertInvestigationContext::degraded(alert_with_amount(amount));
        context.triggering_transaction = triggering;
        context.transaction_history = history;
        context.customer_behaviour = behaviour_max.map(|max| {
            crate::models::CustomerBehaviourProfile {
                customer_id: "cust-1".to_string(),
                average_transaction_amount: max / 2.0,
                max_transaction_amount: max,
                preferred_channels: vec!["ONLINE".to_string()],
                last_active_at: None,
            }
        });
        context
    }

    #[test]
    fn test_empty_history_degrades_pattern_and_velocity_to_none() {
        let context = context_with(1000.0, vec![], None);
        let evidence = weigh(&context);
        assert_eq!(evidence.pattern_consistency, EvidenceStrength::None);
        assert_eq!(evidence.velocity_anomaly, EvidenceStrength::None);
        assert_eq!(evidence.beneficiary_risk, EvidenceStrength::None);
    }

    #[test]
    fn test_pattern_strong_within_120_percent_of_mean() {
        // Mean 900, alert 1000 <= 1080
        let history = vec![tx("t-1", 800.0, 30, "X"), tx("t-2", 1000.0, 20, "Y")];
        let context = context_with(1000.0, history, None);
        assert_eq!(weigh(&context).pattern_consistency, EvidenceStrength::Strong);
    }

    #[test]
    fn test_pattern_moderate_then_weak() {
        let history = vec![tx("t-1", 600.0, 30, "X")];
        let context = context_with(1000.0, history.clone(), None);
        assert_eq!(
            weigh(&context).pattern_consistency,
            EvidenceStrength::Moderate
        );

        let context = context_with(1300.0, history, None);
        assert_eq!(weigh(&context).pattern_consistency, EvidenceStrength::Weak);
    }

    #[test]
    fn test_alignment_weak_beyond_double_baseline_max() {
        // Behaviour max 500, alert 1200 > 1000
        let context = context_with(1200.0, vec![tx("t-1", 100.0, 5, "X")], Some(500.0));
        assert_eq!(weigh(&context).behaviour_alignment, EvidenceStrength::Weak);
    }

    #[test]
    fn test_alignment_missing_behaviour_is_none() {
        let context = context_with(1200.0, vec![tx("t-1", 100.0, 5, "X")], None);
        assert_eq!(weigh(&context).behaviour_alignment, EvidenceStrength::None);
    }

    #[test]
    fn test_velocity_strong_at_ten_in_window() {
        let history: Vec<Transaction> =
            (0..10).map(|i| tx(&format!("t-{}", i), 50.0, i, "X")).collect();
        let context = context_with(1000.0, history, None);
        assert_eq!(weigh(&context).velocity_anomaly, EvidenceStrength::Strong);
    }

    #[test]
    fn test_velocity_moderate_on_aggregate_amount() {
        // 3 transactions, window sum 900 >= 3 * triggering 100
        let history = vec![
            tx("t-1", 100.0, 0, "X"),
            tx("t-2", 400.0, 10, "X"),
            tx("t-3", 400.0, 20, "X"),
        ];
        let context = context_with(1000.0, history, None);
        assert_eq!(weigh(&context).velocity_anomaly, EvidenceStrength::Moderate);
    }

    #[test]
    fn test_velocity_weak_at_five_in_window() {
        // Window sum 1040 stays below 3x the triggering amount of 1000.
        let mut history: Vec<Transaction> =
            (1..5).map(|i| tx(&format!("t-{}", i), 10.0, i, "X")).collect();
        history.push(tx("t-0", 1000.0, 0, "X"));
        let context = context_with(1000.0, history, None);
        assert_eq!(weigh(&context).velocity_anomaly, EvidenceStrength::Weak);
    }

    #[test]
    fn test_beneficiary_strong_for_new_counterparty() {
        let history = vec![
            tx("t-new", 100.0, 0, "NEW-DEST"),
            tx("t-old", 100.0, 30, "OLD-DEST"),
        ];
        let context = context_with(100.0, history, None);
        assert_eq!(weigh(&context).beneficiary_risk, EvidenceStrength::Strong);
    }

    #[test]
    fn test_beneficiary_normalizes_destination() {
        let history = vec![
            tx("t-new", 100.0, 0, "DEST 1"),
            tx("t-old", 100.0, 30, "dest1"),
        ];
        let context = context_with(100.0, history, None);
        // One prior match after normalization
        assert_eq!(weigh(&context).beneficiary_risk, EvidenceStrength::Moderate);
    }
}
