//! Bank data client seam
//!
//! The raw bank API is an external collaborator: any call may come back
//! empty on failure and the aggregator treats that as missing data, never
//! as a fatal error. HTTP-backed implementation mirrors the thin REST
//! wrapper used by the upstream service.

use crate::models::{Alert, CustomerBehaviourProfile, CustomerProfile, Transaction};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use tracing::warn;

/// Contract for the upstream bank data service.
#[async_trait::async_trait]
pub trait BankDataClient: Send + Sync {
    async fn get_alert_by_id(&self, alert_id: &str) -> Option<Alert>;
    async fn get_alerts_by_customer(&self, customer_id: &str) -> Vec<Alert>;
    async fn get_transactions_by_customer(&self, customer_id: &str) -> Vec<Transaction>;
    async fn get_customer_profile(&self, customer_id: &str) -> Option<CustomerProfile>;
    async fn get_customer_behaviour(&self, customer_id: &str)
        -> Option<CustomerBehaviourProfile>;
}

/// HTTP implementation over the bank data REST service.
///
/// Every request has a bounded timeout; every failure is logged and
/// degraded to `None` / empty.
#[derive(Clone)]
pub struct HttpBankDataClient {
    client: Client,
    base_url: String,
}

impl HttpBankDataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let base_url = env::var("BANK_API_BASE_URL").ok()?;
        Some(Self::new(base_url))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(path = %path, error = %e, "Bank API request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(path = %path, status = %response.status(), "Bank API returned non-success");
            return None;
        }

        match response.json::<T>().await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path, error = %e, "Bank API returned invalid JSON");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl BankDataClient for HttpBankDataClient {
    async fn get_alert_by_id(&self, alert_id: &str) -> Option<Alert> {
        self.get_json(&format!("/api/v1/alerts/{}", alert_id)).await
    }

    async fn get_alerts_by_customer(&self, customer_id: &str) -> Vec<Alert> {
        self.get_json(&format!("/api/v1/customers/{}/alerts", customer_id))
            .await
            .unwrap_or_default()
    }

    async fn get_transactions_by_customer(&self, customer_id: &str) -> Vec<Transaction> {
        self.get_json(&format!("/api/v1/customers/{}/transactions", customer_id))
            .await
            .unwrap_or_default()
    }

    async fn get_customer_profile(&self, customer_id: &str) -> Option<CustomerProfile> {
        self.get_json(&format!("/api/v1/customers/{}/profile", customer_id))
            .await
    }

    async fn get_customer_behaviour(
        &self,
        customer_id: &str,
    ) -> Option<CustomerBehaviourProfile> {
        self.get_json(&format!("/api/v1/customers/{}/behaviour", customer_id))
            .await
    }
}

/// Fixture-backed client for demos and tests.
#[derive(Default)]
pub struct StaticBankDataClient {
    pub alerts: HashMap<String, Alert>,
    pub alerts_by_customer: HashMap<String, Vec<Alert>>,
    pub transactions_by_customer: HashMap<String, Vec<Transaction>>,
    pub profiles: HashMap<String, CustomerProfile>,
    pub behaviours: HashMap<String, CustomerBehaviourProfile>,
}

impl StaticBankDataClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alert(mut self, alert: Alert) -> Self {
        self.alerts.insert(alert.alert_id.clone(), alert);
        self
    }

    pub fn with_alert_history(mut self, customer_id: &str, alerts: Vec<Alert>) -> Self {
        self.alerts_by_customer.insert(customer_id.to_string(), alerts);
        self
    }

    pub fn with_transactions(mut self, customer_id: &str, txs: Vec<Transaction>) -> Self {
        self.transactions_by_customer
            .insert(customer_id.to_string(), txs);
        self
    }

    pub fn with_profile(mut self, profile: CustomerProfile) -> Self {
        self.profiles.insert(profile.customer_id.clone(), profile);
        self
    }

    pub fn with_behaviour(mut self, behaviour: CustomerBehaviourProfile) -> Self {
        self.behaviours
            .insert(behaviour.customer_id.clone(), behaviour);
        self
    }
}

#[async_trait::async_trait]
impl BankDataClient for StaticBankDataClient {
    async fn get_alert_by_id(&self, alert_id: &str) -> Option<Alert> {
        self.alerts.get(alert_id).cloned()
    }

    async fn get_alerts_by_customer(&self, customer_id: &str) -> Vec<Alert> {
        self.alerts_by_customer
            .get(customer_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn get_transactions_by_customer(&self, customer_id: &str) -> Vec<Transaction> {
        self.transactions_by_customer
            .get(customer_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn get_customer_profile(&self, customer_id: &str) -> Option<CustomerProfile> {
        self.profiles.get(customer_id).cloned()
    }

    async fn get_customer_behaviour(
        &self,
        customer_id: &str,
    ) -> Option<CustomerBehaviourProfile> {
        self.behaviours.get(customer_id).cloned()
    }
}
