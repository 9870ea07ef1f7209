//! Investigation orchestrator
//!
//! Aggregate → analyze → prompt → narrative exchange → merge. Deterministic
//! fields are copied verbatim from the analytical result; narrative output
//! can annotate but never overwrite them. A failed or malformed narrative
//! pass degrades to rule-based fallback synthesis, never to an error.

use crate::agent::AgenticLoop;
use crate::audit::{compute_context_hash, AuditLog, InvestigationRecord};
use crate::context::ContextAggregator;
use crate::engines::AnalyticalEngine;
use crate::llm::parser;
use crate::models::{
    Alert, AnalyticalResult, BehaviouralComparison, EvidenceMatrixEntry, FalsePositiveLikelihood,
    InvestigationResponse, LlmMessage, NarrativeReport,
};
use crate::prompt::PromptBuilder;
use chrono::Utc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

pub struct InvestigationOrchestrator {
    aggregator: ContextAggregator,
    engine: AnalyticalEngine,
    agent: AgenticLoop,
    audit_log: AuditLog,
}

impl InvestigationOrchestrator {
    pub fn new(
        aggregator: ContextAggregator,
        engine: AnalyticalEngine,
        agent: AgenticLoop,
        audit_log: AuditLog,
    ) -> Self {
        Self {
            aggregator,
            engine,
            agent,
            audit_log,
        }
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit_log
    }

    /// Run one full investigation for an alert.
    ///
    /// Dependency failures never escape this boundary; the caller always
    /// receives a schema-conformant, governed response.
    pub async fn analyze_alert(&self, alert: &Alert) -> InvestigationResponse {
        let start = Instant::now();

        info!(alert_id = %alert.alert_id, "Investigation started");

        let context = self.aggregator.aggregate(alert).await;
        let analytical = self.engine.analyze(&context);

        let prompt = PromptBuilder::analytical_prompt(&context, &analytical);
        let messages = vec![LlmMessage::user(prompt)];

        // Initial pass is narrative-only: no tools.
        let narrative = match self.agent.run(messages, None).await {
            Ok(outcome) => match parser::parse_narrative(&outcome.payload) {
                Ok(mut report) => {
                    if let Some(reasoning) = &outcome.reasoning {
                        report.narrative_summary =
                            parser::merge_reasoning(reasoning, &report.narrative_summary);
                    }
                    Some(report)
                }
                Err(e) => {
                    warn!(alert_id = %alert.alert_id, error = %e, "Narrative payload unusable - falling back");
                    None
                }
            },
            Err(e) => {
                warn!(alert_id = %alert.alert_id, error = %e, "Narrative exchange failed - falling back");
                None
            }
        };

        let narrative_degraded = narrative.is_none();
        let response = merge(&context.alert.alert_id, &analytical, narrative);

        let record = InvestigationRecord {
            audit_id: Uuid::new_v4(),
            alert_id: context.alert.alert_id.clone(),
            context_hash: compute_context_hash(&context),
            context,
            analytical,
            response: response.clone(),
            narrative_degraded,
            created_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if let Err(e) = self.audit_log.record(record).await {
            warn!(alert_id = %alert.alert_id, error = %e, "Audit record failed");
        }

        info!(
            alert_id = %alert.alert_id,
            degraded = narrative_degraded,
            contradictions = response.contradictions.len(),
            "Investigation complete"
        );

        response
    }
}

/// Merge deterministic and narrative results, field by field, then apply
/// the governance shield.
fn merge(
    alert_id: &str,
    analytical: &AnalyticalResult,
    narrative: Option<NarrativeReport>,
) -> InvestigationResponse {
    let confidence_pct = analytical.confidence_score * 100.0;
    let narrative = narrative.unwrap_or_default();

    let narrative_summary = non_empty(narrative.narrative_summary).unwrap_or_else(|| {
        "Narrative generation was unavailable for this investigation; the \
         deterministic scores below are authoritative."
            .to_string()
    });

    let alert_risk_posture = non_empty(narrative.alert_risk_posture)
        .unwrap_or_else(|| posture_from_confidence(confidence_pct).to_string());

    let evidence_matrix = if narrative.evidence_matrix.is_empty() {
        vec![EvidenceMatrixEntry {
            evidence_type: "General".to_string(),
            finding: "Narrative evidence assessment unavailable; refer to the deterministic signals."
                .to_string(),
            risk_impact: posture_from_confidence(confidence_pct).to_string(),
        }]
    } else {
        narrative.evidence_matrix
    };

    let behavioural_comparison = BehaviouralComparison {
        amount_vs_average: non_empty(narrative.behavioural_comparison.amount_vs_average)
            .unwrap_or_else(|| "Comparison unavailable.".to_string()),
        channel_assessment: non_empty(narrative.behavioural_comparison.channel_assessment)
            .unwrap_or_else(|| "Comparison unavailable.".to_string()),
        frequency_assessment: non_empty(narrative.behavioural_comparison.frequency_assessment)
            .unwrap_or_else(|| "Comparison unavailable.".to_string()),
    };

    let recommended_action = non_empty(narrative.recommended_action).unwrap_or_else(|| {
        if confidence_pct >= 80.0 {
            "Escalate: context is materially complete and warrants analyst attention.".to_string()
        } else if analytical.false_positive_likelihood == FalsePositiveLikelihood::High {
            "Review: deterministic analysis indicates elevated likelihood of true fraud."
                .to_string()
        } else {
            "Review: narrative output was unavailable; manual review recommended.".to_string()
        }
    });

    let confidence_justification = non_empty(narrative.confidence)
        .unwrap_or_else(|| justification_from_confidence(confidence_pct).to_string());

    let mut response = InvestigationResponse {
        alert_id: alert_id.to_string(),
        narrative_summary,
        alert_risk_posture,
        evidence_matrix,
        behavioural_comparison,
        contradictions: narrative.contradictions,
        recommended_action,
        confidence_justification,
        evidence: analytical.evidence,
        false_positive_score: analytical.false_positive_score,
        false_positive_likelihood: analytical.false_positive_likelihood,
        confidence_score: analytical.confidence_score,
        investigated_at: Utc::now(),
    };

    // Governance shield: the narrative claiming elevated risk while the
    // deterministic engine says likely-false-positive must be flagged.
    // Runs unconditionally on every merge.
    if response.alert_risk_posture.eq_ignore_ascii_case("high")
        && analytical.false_positive_likelihood == FalsePositiveLikelihood::High
    {
        response.contradictions.push(
            "Narrative risk posture is High while deterministic analysis rates \
             false-positive likelihood High; deterministic scores take precedence."
                .to_string(),
        );
    }

    response
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn posture_from_confidence(confidence_pct: f64) -> &'static str {
    if confidence_pct >= 80.0 {
        "High"
    } else if confidence_pct >= 50.0 {
        "Moderate"
    } else {
        "Low"
    }
}

fn justification_from_confidence(confidence_pct: f64) -> &'static str {
    if confidence_pct >= 80.0 {
        "High confidence: investigation context is materially complete."
    } else if confidence_pct >= 50.0 {
        "Moderate confidence: some context fields were unavailable."
    } else {
        "Low confidence: significant context fields were unavailable."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::StaticBankDataClient;
    use crate::llm::ScriptedGateway;
    use crate::models::{EvidenceResult, EvidenceStrength};
    use std::sync::Arc;

    fn analytical(likelihood: FalsePositiveLikelihood, confidence: f64) -> AnalyticalResult {
        AnalyticalResult {
            evidence: EvidenceResult {
                pattern_consistency: EvidenceStrength::Weak,
                behaviour_alignment: EvidenceStrength::None,
                velocity_anomaly: EvidenceStrength::None,
                beneficiary_risk: EvidenceStrength::Strong,
            },
            false_positive_score: 0.3,
            false_positive_likelihood: likelihood,
            confidence_score: confidence,
        }
    }

    fn test_alert() -> Alert {
        Alert {
            alert_id: "a-1".to_string(),
            alert_code: "STRUCT-01".to_string(),
            severity: "HIGH".to_string(),
            customer_id: "cust-1".to_string(),
            account_number: "ACC-1".to_string(),
            amount: 1000.0,
            currency: "EUR".to_string(),
            risk_score: 0.9,
            status: "OPEN".to_string(),
            created_at: Utc::now(),
        }
    }

    fn orchestrator_with(gateway: ScriptedGateway) -> InvestigationOrchestrator {
        let bank = Arc::new(StaticBankDataClient::new().with_alert(test_alert()));
        InvestigationOrchestrator::new(
            ContextAggregator::new(bank),
            AnalyticalEngine::new(),
            AgenticLoop::new(Arc::new(gateway)),
            AuditLog::new(),
        )
    }

    #[test]
    fn test_merge_invariant_holds_for_any_narrative() {
        let det = analytical(FalsePositiveLikelihood::Medium, 0.7);

        let well_formed = merge(
            "a-1",
            &det,
            Some(NarrativeReport {
                narrative_summary: "legit".to_string(),
                alert_risk_posture: "Low".to_string(),
                ..Default::default()
            }),
        );
        let malformed = merge("a-1", &det, None);

        for response in [&well_formed, &malformed] {
            assert_eq!(response.false_positive_score, det.false_positive_score);
            assert_eq!(
                response.false_positive_likelihood,
                det.false_positive_likelihood
            );
            assert_eq!(response.confidence_score, det.confidence_score);
        }
    }

    #[test]
    fn test_fallback_fields_synthesized_when_narrative_missing() {
        let response = merge("a-1", &analytical(FalsePositiveLikelihood::High, 0.6), None);

        assert_eq!(response.alert_risk_posture, "Moderate");
        assert_eq!(response.evidence_matrix.len(), 1);
        assert_eq!(response.evidence_matrix[0].risk_impact, "Moderate");
        assert!(response.recommended_action.starts_with("Review:"));
        assert_eq!(
            response.behavioural_comparison.amount_vs_average,
            "Comparison unavailable."
        );
        assert!(response
            .confidence_justification
            .starts_with("Moderate confidence"));
    }

    #[test]
    fn test_fallback_escalates_on_high_confidence() {
        let response = merge("a-1", &analytical(FalsePositiveLikelihood::High, 0.9), None);
        assert_eq!(response.alert_risk_posture, "High");
        assert!(response.recommended_action.starts_with("Escalate:"));
    }

    #[test]
    fn test_partial_behavioural_comparison_falls_back_per_field() {
        let response = merge(
            "a-1",
            &analytical(FalsePositiveLikelihood::Medium, 0.7),
            Some(NarrativeReport {
                narrative_summary: "partial".to_string(),
                behavioural_comparison: BehaviouralComparison {
                    amount_vs_average: "Within 5% of average".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            }),
        );

        assert_eq!(
            response.behavioural_comparison.amount_vs_average,
            "Within 5% of average"
        );
        assert_eq!(
            response.behavioural_comparison.channel_assessment,
            "Comparison unavailable."
        );
        assert_eq!(
            response.behavioural_comparison.frequency_assessment,
            "Comparison unavailable."
        );
    }

    #[test]
    fn test_governance_shield_flags_contradiction() {
        let response = merge(
            "a-1",
            &analytical(FalsePositiveLikelihood::High, 0.5),
            Some(NarrativeReport {
                alert_risk_posture: "High".to_string(),
                narrative_summary: "suspicious".to_string(),
                ..Default::default()
            }),
        );

        assert!(!response.contradictions.is_empty());
        assert!(response.contradictions[0].contains("deterministic"));
    }

    #[test]
    fn test_no_contradiction_when_postures_agree() {
        let response = merge(
            "a-1",
            &analytical(FalsePositiveLikelihood::Low, 0.9),
            Some(NarrativeReport {
                alert_risk_posture: "High".to_string(),
                narrative_summary: "suspicious".to_string(),
                ..Default::default()
            }),
        );

        assert!(response.contradictions.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_alert_with_well_formed_narrative() {
        let orchestrator = orchestrator_with(ScriptedGateway::text_only(
            r#"{"narrativeSummary": "salary-like transfer", "alertRiskPosture": "Low",
                "recommendedAction": "Close"}"#,
        ));

        let response = orchestrator.analyze_alert(&test_alert()).await;

        assert_eq!(response.narrative_summary, "salary-like transfer");
        assert_eq!(response.alert_risk_posture, "Low");
        assert_eq!(response.recommended_action, "Close");
    }

    #[tokio::test]
    async fn test_analyze_alert_survives_llm_failure() {
        // Exhausted gateway fails the narrative pass entirely.
        let orchestrator = orchestrator_with(ScriptedGateway::new(vec![]));

        let response = orchestrator.analyze_alert(&test_alert()).await;

        assert!(!response.narrative_summary.is_empty());
        assert!((0.0..=1.0).contains(&response.false_positive_score));
    }

    #[tokio::test]
    async fn test_analyze_alert_records_audit_entry() {
        let orchestrator = orchestrator_with(ScriptedGateway::text_only("not json"));

        orchestrator.analyze_alert(&test_alert()).await;

        let ids = orchestrator.audit_log().list_for_alert("a-1").await.unwrap();
        assert_eq!(ids.len(), 1);
        let record = orchestrator.audit_log().get(ids[0]).await.unwrap().unwrap();
        assert!(record.narrative_degraded);
        assert_eq!(record.context_hash.len(), 64);
        assert!(orchestrator
            .audit_log()
            .verify_integrity(ids[0])
            .await
            .unwrap());
    }
}
