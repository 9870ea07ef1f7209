//! Prompt construction
//!
//! Deterministic template rendering only, no LLM calls. Garbage input still
//! renders a syntactically valid prompt; validation happens downstream at
//! the parsing stage.

use crate::models::{AlertInvestigationContext, AnalyticalResult, InvestigationResponse};

pub struct PromptBuilder;

impl PromptBuilder {
    /// Analytical prompt for the initial narrative pass: full context,
    /// evidence signals and deterministic scores, with a fixed JSON schema
    /// and anti-hallucination constraints.
    pub fn analytical_prompt(
        context: &AlertInvestigationContext,
        analytical: &AnalyticalResult,
    ) -> String {
        let alert = &context.alert;

        let triggering = match &context.triggering_transaction {
            Some(tx) => format!(
                "{} {} {} via {} to {} at {}",
                tx.transaction_type,
                tx.amount,
                tx.currency,
                tx.channel,
                tx.destination_account,
                tx.timestamp.to_rfc3339(),
            ),
            None => "not available".to_string(),
        };

        let profile = match &context.customer_profile {
            Some(p) => format!(
                "KYC level {}, risk rating {}, segment {}",
                p.kyc_level, p.risk_rating, p.segment
            ),
            None => "not available".to_string(),
        };

        let behaviour = match &context.customer_behaviour {
            Some(b) => format!(
                "average amount {}, maximum amount {}, preferred channels {}",
                b.average_transaction_amount,
                b.max_transaction_amount,
                b.preferred_channels.join(", "),
            ),
            None => "not available".to_string(),
        };

        format!(
            r#"You are a senior financial crime analyst reviewing a fraud/AML alert.

ALERT:
- id: {alert_id}
- code: {alert_code}
- severity: {severity}
- account: {account}
- amount: {amount} {currency}
- upstream risk score: {risk_score}
- status: {status}

TRIGGERING TRANSACTION:
{triggering}

CUSTOMER PROFILE:
{profile}

BEHAVIOURAL BASELINE:
{behaviour}

TRANSACTION HISTORY SIZE: {tx_count}
PRIOR ALERTS: {alert_count}
RELATED ALERTS: {related_count}

DETERMINISTIC ANALYSIS (ground truth - do not recompute or modify):
- pattern consistency: {pattern}
- behaviour alignment: {alignment}
- velocity anomaly: {velocity}
- beneficiary risk: {beneficiary}
- false-positive score: {fp_score:.3}
- false-positive likelihood: {fp_likelihood}
- data confidence score: {confidence:.2}

Rules:
- Do not invent facts; use only the data above
- State uncertainty explicitly if data is insufficient
- Return ONLY valid JSON, no explanation text
- JSON format:

{{
  "narrativeSummary": "...",
  "alertRiskPosture": "Low|Moderate|High",
  "evidenceMatrix": [
    {{ "evidenceType": "...", "finding": "...", "riskImpact": "Low|Moderate|High" }}
  ],
  "behaviouralComparison": {{
    "amountVsAverage": "...",
    "channelAssessment": "...",
    "frequencyAssessment": "..."
  }},
  "contradictions": ["..."],
  "recommendedAction": "...",
  "confidence": "..."
}}
"#,
            alert_id = alert.alert_id,
            alert_code = alert.alert_code,
            severity = alert.severity,
            account = alert.account_number,
            amount = alert.amount,
            currency = alert.currency,
            risk_score = alert.risk_score,
            status = alert.status,
            triggering = triggering,
            profile = profile,
            behaviour = behaviour,
            tx_count = context.transaction_history.len(),
            alert_count = context.alert_history.len(),
            related_count = context.related_alerts.len(),
            pattern = analytical.evidence.pattern_consistency,
            alignment = analytical.evidence.behaviour_alignment,
            velocity = analytical.evidence.velocity_anomaly,
            beneficiary = analytical.evidence.beneficiary_risk,
            fp_score = analytical.false_positive_score,
            fp_likelihood = analytical.false_positive_likelihood,
            confidence = analytical.confidence_score,
        )
    }

    /// Follow-up system prompt seeding a chat session from a completed
    /// investigation. Deterministic fields are restated as immutable facts.
    pub fn follow_up_system_prompt(response: &InvestigationResponse) -> String {
        let matrix = response
            .evidence_matrix
            .iter()
            .map(|e| format!("- {}: {} (impact: {})", e.evidence_type, e.finding, e.risk_impact))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are a financial crime analyst answering follow-up questions about a
completed alert investigation.

IMMUTABLE FACTS (computed deterministically - you must not modify them):
- alert id: {alert_id}
- false-positive score: {fp_score:.3}
- false-positive likelihood: {fp_likelihood}
- data confidence score: {confidence:.2}
- risk posture: {posture}
- recommended action: {action}

INVESTIGATION SUMMARY:
{summary}

EVIDENCE MATRIX:
{matrix}

You may use any available tool if it helps answer the analyst's question.

Rules:
- Ground every answer in the investigation above or in tool output
- State uncertainty explicitly if data is insufficient
- Return ONLY valid JSON, no explanation text
- JSON format:

{{
  "responseType": "Evidence|Recommendation|General",
  "response": "...",
  "evidenceReference": ["..."],
  "confidenceStatement": "..."
}}
"#,
            alert_id = response.alert_id,
            fp_score = response.false_positive_score,
            fp_likelihood = response.false_positive_likelihood,
            confidence = response.confidence_score,
            posture = response.alert_risk_posture,
            action = response.recommended_action,
            summary = response.narrative_summary,
            matrix = if matrix.is_empty() { "- none recorded".to_string() } else { matrix },
        )
    }
}
