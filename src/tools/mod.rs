//! Tool trait and registry
//!
//! Tools are stateless, independently invocable capabilities the model may
//! request mid-conversation. Execution never fails the call: invalid or
//! missing arguments produce a human-readable error string in the output.

use crate::bank::BankDataClient;
use crate::models::{ToolCall, ToolResult};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for a single tool capability.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> Value;
    /// Never returns an error; argument problems are reported in the output.
    async fn execute(&self, call: &ToolCall) -> ToolResult;
}

/// Serializable tool description handed to the LLM gateway.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Name-indexed registry built at startup. Lookup is case-insensitive.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_lowercase(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(&name.to_lowercase()).cloned()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self
            .tools
            .values()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn require_customer_id(call: &ToolCall) -> Result<String, String> {
    call.arguments
        .get("customer_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| "Expected 'customer_id' argument".to_string())
}

fn success_result(call: &ToolCall, data: Value) -> ToolResult {
    ToolResult {
        call_id: call.call_id.clone(),
        tool_name: call.tool_name.clone(),
        output: data.to_string(),
    }
}

fn error_result(call: &ToolCall, message: String) -> ToolResult {
    ToolResult {
        call_id: call.call_id.clone(),
        tool_name: call.tool_name.clone(),
        output: json!({ "error": message }).to_string(),
    }
}

/// Looks up a customer's KYC profile and behavioural baseline.
pub struct AccountLookupTool {
    bank: Arc<dyn BankDataClient>,
}

impl AccountLookupTool {
    pub fn new(bank: Arc<dyn BankDataClient>) -> Self {
        Self { bank }
    }
}

#[async_trait::async_trait]
impl Tool for AccountLookupTool {
    fn name(&self) -> &'static str {
        "AccountLookup"
    }

    fn description(&self) -> &'static str {
        "Look up a customer's KYC profile and behavioural baseline"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": { "type": "string" }
            },
            "required": ["customer_id"]
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        let customer_id = match require_customer_id(call) {
            Ok(id) => id,
            Err(message) => return error_result(call, message),
        };

        let (profile, behaviour) = tokio::join!(
            self.bank.get_customer_profile(&customer_id),
            self.bank.get_customer_behaviour(&customer_id),
        );

        success_result(
            call,
            json!({
                "customer_id": customer_id,
                "profile": profile,
                "behaviour": behaviour,
            }),
        )
    }
}

/// Fetches recent transactions for a customer, newest first.
pub struct TransactionSearchTool {
    bank: Arc<dyn BankDataClient>,
}

impl TransactionSearchTool {
    pub fn new(bank: Arc<dyn BankDataClient>) -> Self {
        Self { bank }
    }
}

#[async_trait::async_trait]
impl Tool for TransactionSearchTool {
    fn name(&self) -> &'static str {
        "TransactionSearch"
    }

    fn description(&self) -> &'static str {
        "Fetch recent transactions for a customer, newest first"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": { "type": "string" },
                "limit": { "type": "integer", "minimum": 1 }
            },
            "required": ["customer_id"]
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        let customer_id = match require_customer_id(call) {
            Ok(id) => id,
            Err(message) => return error_result(call, message),
        };

        let limit = call
            .arguments
            .get("limit")
            .and_then(|v| v.as_u64())
            .unwrap_or(10) as usize;

        let mut transactions = self.bank.get_transactions_by_customer(&customer_id).await;
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        transactions.truncate(limit);

        success_result(
            call,
            json!({
                "customer_id": customer_id,
                "count": transactions.len(),
                "transactions": transactions,
            }),
        )
    }
}

/// Fetches prior alerts raised against a customer.
pub struct AlertHistoryTool {
    bank: Arc<dyn BankDataClient>,
}

impl AlertHistoryTool {
    pub fn new(bank: Arc<dyn BankDataClient>) -> Self {
        Self { bank }
    }
}

#[async_trait::async_trait]
impl Tool for AlertHistoryTool {
    fn name(&self) -> &'static str {
        "AlertHistory"
    }

    fn description(&self) -> &'static str {
        "Fetch prior alerts raised against a customer"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": { "type": "string" }
            },
            "required": ["customer_id"]
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        let customer_id = match require_customer_id(call) {
            Ok(id) => id,
            Err(message) => return error_result(call, message),
        };

        let alerts = self.bank.get_alerts_by_customer(&customer_id).await;

        success_result(
            call,
            json!({
                "customer_id": customer_id,
                "count": alerts.len(),
                "alerts": alerts,
            }),
        )
    }
}

/// Create the default registry with the bank-backed investigation tools.
pub fn create_default_registry(bank: Arc<dyn BankDataClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(AccountLookupTool::new(bank.clone())));
    registry.register(Arc::new(TransactionSearchTool::new(bank.clone())));
    registry.register(Arc::new(AlertHistoryTool::new(bank)));

    registry
}
