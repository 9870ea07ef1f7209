//! Core data models for the alert investigation pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

//
// ================= Bank Data Entities =================
//

/// A flagged event raised by upstream detection. Read-only to this pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub alert_code: String,
    pub severity: String,
    pub customer_id: String,
    pub account_number: String,
    pub amount: f64,
    pub currency: String,
    pub risk_score: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A monetary movement, sourced externally. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub transaction_type: String,
    pub amount: f64,
    pub currency: String,
    pub channel: String,
    pub timestamp: DateTime<Utc>,
    pub source_account: String,
    pub destination_account: String,
    pub geolocation: Option<String>,
}

/// Static KYC risk attributes, immutable per investigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub kyc_level: String,
    pub risk_rating: String,
    pub segment: String,
}

/// Rolling behavioural baseline. May be absent for new customers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerBehaviourProfile {
    pub customer_id: String,
    pub average_transaction_amount: f64,
    pub max_transaction_amount: f64,
    pub preferred_channels: Vec<String>,
    pub last_active_at: Option<DateTime<Utc>>,
}

//
// ================= Investigation Context =================
//

/// Aggregate root assembled once per investigation by the context aggregator.
/// Read-only afterwards; downstream stages must tolerate missing fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertInvestigationContext {
    pub alert: Alert,
    pub alert_history: Vec<Alert>,
    pub triggering_transaction: Option<Transaction>,
    pub transaction_history: Vec<Transaction>,
    pub customer_profile: Option<CustomerProfile>,
    pub customer_behaviour: Option<CustomerBehaviourProfile>,
    pub related_alerts: Vec<Alert>,
    /// Open map for future enrichment sources.
    pub external_signals: HashMap<String, serde_json::Value>,
}

impl AlertInvestigationContext {
    /// Degraded context holding only the input alert. Used when the
    /// authoritative alert record cannot be resolved.
    pub fn degraded(alert: Alert) -> Self {
        Self {
            alert,
            alert_history: Vec::new(),
            triggering_transaction: None,
            transaction_history: Vec::new(),
            customer_profile: None,
            customer_behaviour: None,
            related_alerts: Vec::new(),
            external_signals: HashMap::new(),
        }
    }
}

//
// ================= Evidence =================
//

/// Ordinal rating of how well one signal supports "this is a false positive".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EvidenceStrength {
    None,
    Weak,
    Moderate,
    Strong,
}

impl EvidenceStrength {
    /// Integer rank used by the false-positive weighting (None=0 .. Strong=3)
    pub fn rank(&self) -> u8 {
        match self {
            EvidenceStrength::None => 0,
            EvidenceStrength::Weak => 1,
            EvidenceStrength::Moderate => 2,
            EvidenceStrength::Strong => 3,
        }
    }
}

impl PartialOrd for EvidenceStrength {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EvidenceStrength {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for EvidenceStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvidenceStrength::None => "None",
            EvidenceStrength::Weak => "Weak",
            EvidenceStrength::Moderate => "Moderate",
            EvidenceStrength::Strong => "Strong",
        };
        write!(f, "{}", s)
    }
}

/// Four independently computed evidence signals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceResult {
    pub pattern_consistency: EvidenceStrength,
    pub behaviour_alignment: EvidenceStrength,
    pub velocity_anomaly: EvidenceStrength,
    pub beneficiary_risk: EvidenceStrength,
}

//
// ================= Analytical Result =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FalsePositiveLikelihood {
    Low,
    Medium,
    High,
    Unknown,
}

impl fmt::Display for FalsePositiveLikelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FalsePositiveLikelihood::Low => "Low",
            FalsePositiveLikelihood::Medium => "Medium",
            FalsePositiveLikelihood::High => "High",
            FalsePositiveLikelihood::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Deterministic ground truth. Immutable once computed; narrative generation
/// may annotate but never overwrite these values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticalResult {
    pub evidence: EvidenceResult,
    pub false_positive_score: f64,
    pub false_positive_likelihood: FalsePositiveLikelihood,
    pub confidence_score: f64,
}

//
// ================= Narrative Schemas (fixed LLM JSON) =================
//

/// One row of the evidence matrix in the narrative report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EvidenceMatrixEntry {
    pub evidence_type: String,
    pub finding: String,
    pub risk_impact: String,
}

/// Behavioural comparison section of the narrative report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BehaviouralComparison {
    pub amount_vs_average: String,
    pub channel_assessment: String,
    pub frequency_assessment: String,
}

/// The fixed JSON schema the analytical prompt instructs the model to emit.
/// Defaults keep partially populated output deserializable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NarrativeReport {
    pub narrative_summary: String,
    pub alert_risk_posture: String,
    pub evidence_matrix: Vec<EvidenceMatrixEntry>,
    pub behavioural_comparison: BehaviouralComparison,
    pub contradictions: Vec<String>,
    pub recommended_action: String,
    pub confidence: String,
}

//
// ================= Investigation Response =================
//

/// The governed, client-facing result. The only entity allowed to merge
/// deterministic and generative data; the three deterministic fields always
/// equal the AnalyticalResult's values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationResponse {
    pub alert_id: String,

    // Narrative fields
    pub narrative_summary: String,
    pub alert_risk_posture: String,
    pub evidence_matrix: Vec<EvidenceMatrixEntry>,
    pub behavioural_comparison: BehaviouralComparison,
    pub contradictions: Vec<String>,
    pub recommended_action: String,
    pub confidence_justification: String,

    // Deterministic fields, copied verbatim from the AnalyticalResult
    pub evidence: EvidenceResult,
    pub false_positive_score: f64,
    pub false_positive_likelihood: FalsePositiveLikelihood,
    pub confidence_score: f64,

    pub investigated_at: DateTime<Utc>,
}

//
// ================= Tool I/O =================
//

/// A named tool request with JSON arguments. Transient, scoped to one
/// agentic turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            call_id: Uuid::new_v4().to_string(),
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// The string output of one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub tool_name: String,
    pub output: String,
}

//
// ================= Conversation =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One entry of the append-only conversation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

//
// ================= Chat Response =================
//

/// The fixed JSON schema for conversational follow-up turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredChatResponse {
    pub response_type: String,
    pub response: String,
    pub evidence_reference: Vec<String>,
    pub confidence_statement: String,
}

impl StructuredChatResponse {
    /// Fixed decline response used whenever a chat turn fails anywhere.
    pub fn decline() -> Self {
        Self {
            response_type: "General".to_string(),
            response: "I am unable to answer that question at the moment. \
                       Please retry or consult the investigation summary."
                .to_string(),
            evidence_reference: Vec::new(),
            confidence_statement: "Not Available".to_string(),
        }
    }
}
