//! Context aggregation
//!
//! Assembles the canonical investigation context from the bank data client.
//! Four independent fetches fan out concurrently and are all awaited before
//! assembly; a failed fetch degrades that field to empty, not the pipeline.

use crate::bank::BankDataClient;
use crate::models::{Alert, AlertInvestigationContext, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ContextAggregator {
    bank: Arc<dyn BankDataClient>,
}

impl ContextAggregator {
    pub fn new(bank: Arc<dyn BankDataClient>) -> Self {
        Self { bank }
    }

    /// Build the investigation context for an alert.
    ///
    /// When the authoritative alert record cannot be resolved, the context
    /// carries only the input alert and downstream stages degrade gracefully.
    pub async fn aggregate(&self, alert: &Alert) -> AlertInvestigationContext {
        let resolved = match self.bank.get_alert_by_id(&alert.alert_id).await {
            Some(resolved) => resolved,
            None => {
                warn!(
                    alert_id = %alert.alert_id,
                    "Alert not found upstream - building degraded context"
                );
                return AlertInvestigationContext::degraded(alert.clone());
            }
        };

        let customer_id = resolved.customer_id.clone();
        debug!(alert_id = %resolved.alert_id, customer_id = %customer_id, "Fanning out context fetches");

        // Fan-out/fan-in: all four fetches awaited together. Each client call
        // already degrades to empty on failure, so no early cancellation.
        let (alert_history, transaction_history, customer_profile, customer_behaviour) = tokio::join!(
            self.bank.get_alerts_by_customer(&customer_id),
            self.bank.get_transactions_by_customer(&customer_id),
            self.bank.get_customer_profile(&customer_id),
            self.bank.get_customer_behaviour(&customer_id),
        );

        let triggering_transaction = select_triggering_transaction(&transaction_history);
        let related_alerts = select_related_alerts(&resolved, &alert_history);

        info!(
            alert_id = %resolved.alert_id,
            history_alerts = alert_history.len(),
            transactions = transaction_history.len(),
            has_profile = customer_profile.is_some(),
            has_behaviour = customer_behaviour.is_some(),
            "Investigation context assembled"
        );

        AlertInvestigationContext {
            alert: resolved,
            alert_history,
            triggering_transaction,
            transaction_history,
            customer_profile,
            customer_behaviour,
            related_alerts,
            external_signals: HashMap::new(),
        }
    }
}

/// Most recent transaction by timestamp. Ties keep the earliest original
/// position so the choice stays deterministic.
fn select_triggering_transaction(history: &[Transaction]) -> Option<Transaction> {
    let mut best: Option<&Transaction> = None;

    for tx in history {
        match best {
            Some(current) if tx.timestamp <= current.timestamp => {}
            _ => best = Some(tx),
        }
    }

    best.cloned()
}

/// History entries (primary excluded) whose account OR severity matches the
/// primary alert.
fn select_related_alerts(primary: &Alert, history: &[Alert]) -> Vec<Alert> {
    history
        .iter()
        .filter(|candidate| candidate.alert_id != primary.alert_id)
        .filter(|candidate| {
            candidate.account_number == primary.account_number
                || candidate.severity == primary.severity
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::StaticBankDataClient;
    use chrono::{Duration, Utc};

    fn test_alert(alert_id: &str, account: &str, severity: &str) -> Alert {
        Alert {
            alert_id: alert_id.to_string(),
            alert_code: "STRUCT-01".to_string(),
            severity: severity.to_string(),
            customer_id: "cust-1".to_string(),
            account_number: account.to_string(),
            amount: 1000.0,
            currency: "EUR".to_string(),
            risk_score: 0.8,
            status: "OPEN".to_string(),
            created_at: Utc::now(),
        }
    }

    fn test_transaction(id: &str, minutes_ago: i64) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            transaction_type: "TRANSFER".to_string(),
            amount: 500.0,
            currency: "EUR".to_string(),
            channel: "ONLINE".to_string(),
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            source_account: "ACC-1".to_string(),
            destination_account: "ACC-2".to_string(),
            geolocation: None,
        }
    }

    #[tokio::test]
    async fn test_degraded_context_when_alert_missing() {
        let bank = Arc::new(StaticBankDataClient::new());
        let aggregator = ContextAggregator::new(bank);

        let context = aggregator.aggregate(&test_alert("a-1", "ACC-1", "HIGH")).await;

        assert_eq!(context.alert.alert_id, "a-1");
        assert!(context.transaction_history.is_empty());
        assert!(context.triggering_transaction.is_none());
        assert!(context.customer_profile.is_none());
    }

    #[tokio::test]
    async fn test_full_context_assembly() {
        let primary = test_alert("a-1", "ACC-1", "HIGH");
        let bank = StaticBankDataClient::new()
            .with_alert(primary.clone())
            .with_alert_history(
                "cust-1",
                vec![
                    primary.clone(),
                    test_alert("a-2", "ACC-1", "LOW"),
                    test_alert("a-3", "ACC-9", "HIGH"),
                    test_alert("a-4", "ACC-9", "LOW"),
                ],
            )
            .with_transactions(
                "cust-1",
                vec![
                    test_transaction("t-old", 120),
                    test_transaction("t-new", 1),
                    test_transaction("t-mid", 60),
                ],
            );

        let aggregator = ContextAggregator::new(Arc::new(bank));
        let context = aggregator.aggregate(&primary).await;

        let triggering = context.triggering_transaction.expect("triggering tx");
        assert_eq!(triggering.transaction_id, "t-new");

        // a-2 matches on account, a-3 on severity, a-4 on neither; the
        // primary itself is always excluded.
        let related: Vec<&str> = context
            .related_alerts
            .iter()
            .map(|a| a.alert_id.as_str())
            .collect();
        assert_eq!(related, vec!["a-2", "a-3"]);
    }

    #[test]
    fn test_triggering_transaction_tie_keeps_first() {
        let ts = Utc::now();
        let mut a = test_transaction("t-a", 0);
        let mut b = test_transaction("t-b", 0);
        a.timestamp = ts;
        b.timestamp = ts;

        let selected = select_triggering_transaction(&[a, b]).expect("one selected");
        assert_eq!(selected.transaction_id, "t-a");
    }
}
