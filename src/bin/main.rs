use alert_investigation_orchestrator::{
    agent::AgenticLoop,
    audit::AuditLog,
    bank::StaticBankDataClient,
    chat::ChatSessionService,
    context::ContextAggregator,
    engines::AnalyticalEngine,
    llm::{RawModelOutput, ScriptedGateway},
    models::{Alert, CustomerBehaviourProfile, CustomerProfile, Transaction},
    orchestrator::InvestigationOrchestrator,
    tools::create_default_registry,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;

fn sample_alert() -> Alert {
    Alert {
        alert_id: "ALERT-1042".to_string(),
        alert_code: "VEL-02".to_string(),
        severity: "HIGH".to_string(),
        customer_id: "CUST-77".to_string(),
        account_number: "DE89-0001".to_string(),
        amount: 1000.0,
        currency: "EUR".to_string(),
        risk_score: 0.82,
        status: "OPEN".to_string(),
        created_at: Utc::now(),
    }
}

fn sample_bank() -> StaticBankDataClient {
    let alert = sample_alert();

    let transactions: Vec<Transaction> = (0..6)
        .map(|i| Transaction {
            transaction_id: format!("TX-{}", i),
            transaction_type: "TRANSFER".to_string(),
            amount: 900.0,
            currency: "EUR".to_string(),
            channel: "ONLINE".to_string(),
            timestamp: Utc::now() - Duration::minutes(i * 7),
            source_account: "DE89-0001".to_string(),
            destination_account: "FR76-4410".to_string(),
            geolocation: Some("DE".to_string()),
        })
        .collect();

    StaticBankDataClient::new()
        .with_alert(alert.clone())
        .with_alert_history("CUST-77", vec![alert])
        .with_transactions("CUST-77", transactions)
        .with_profile(CustomerProfile {
            customer_id: "CUST-77".to_string(),
            kyc_level: "FULL".to_string(),
            risk_rating: "MEDIUM".to_string(),
            segment: "RETAIL".to_string(),
        })
        .with_behaviour(CustomerBehaviourProfile {
            customer_id: "CUST-77".to_string(),
            average_transaction_amount: 850.0,
            max_transaction_amount: 1100.0,
            preferred_channels: vec!["ONLINE".to_string()],
            last_active_at: Some(Utc::now()),
        })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("Alert investigation orchestrator starting");

    let bank = Arc::new(sample_bank());

    // Scripted model so the demo runs without provider credentials.
    let narrative_gateway = Arc::new(ScriptedGateway::text_only(
        r#"{"narrativeSummary": "Amount sits within the customer's recent range and channel use is typical.",
            "alertRiskPosture": "Low",
            "evidenceMatrix": [{"evidenceType": "Pattern", "finding": "Amount near history mean", "riskImpact": "Low"}],
            "behaviouralComparison": {"amountVsAverage": "Within 18% of average", "channelAssessment": "Preferred channel", "frequencyAssessment": "Typical cadence"},
            "contradictions": [],
            "recommendedAction": "Close as false positive",
            "confidence": "Context is complete"}"#,
    ));

    let orchestrator = InvestigationOrchestrator::new(
        ContextAggregator::new(bank.clone()),
        AnalyticalEngine::new(),
        AgenticLoop::new(narrative_gateway),
        AuditLog::new(),
    );

    let alert = sample_alert();
    let response = orchestrator.analyze_alert(&alert).await;

    println!("\n=== INVESTIGATION RESULT ===");
    println!("Alert: {}", response.alert_id);
    println!(
        "False-positive: {:.3} ({})",
        response.false_positive_score, response.false_positive_likelihood
    );
    println!("Confidence: {:.2}", response.confidence_score);
    println!("Posture: {}", response.alert_risk_posture);
    println!("Summary: {}", response.narrative_summary);
    println!("Action: {}", response.recommended_action);
    if !response.contradictions.is_empty() {
        println!("Contradictions: {:?}", response.contradictions);
    }

    // Follow-up turn against the completed investigation.
    let chat_gateway = Arc::new(ScriptedGateway::new(vec![RawModelOutput {
        text: r#"{"responseType": "Evidence",
                  "response": "The destination account was already known from five prior transfers.",
                  "evidenceReference": ["beneficiary risk"],
                  "confidenceStatement": "High, grounded in transaction history"}"#
            .to_string(),
        tool_calls: Vec::new(),
    }]));

    let chat = ChatSessionService::in_memory(
        AgenticLoop::new(chat_gateway),
        Arc::new(create_default_registry(bank)),
    );

    let turn = chat
        .process_chat_turn(None, "Why is the beneficiary considered low risk?", Some(&response))
        .await;

    println!("\n=== CHAT TURN ===");
    println!("Session: {}", turn.session_id);
    println!("Type: {}", turn.response.response_type);
    println!("Answer: {}", turn.response.response);
    println!("Confidence: {}", turn.response.confidence_statement);

    Ok(())
}
