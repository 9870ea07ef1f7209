//! Alert Investigation Orchestrator
//!
//! Investigates banking fraud/AML alerts by combining deterministic risk
//! scoring with LLM-generated narrative enrichment:
//! - Aggregates a canonical investigation context from the bank data service
//! - Scores evidence, false-positive likelihood and data confidence
//!   deterministically (LLM excluded from scoring)
//! - Runs an agentic exchange loop with tool dispatch for narrative output
//! - Merges results under a governance shield so deterministic truth is
//!   never silently overridden by generative output
//! - Supports session-based conversational follow-up grounded in the
//!   investigation
//!
//! PIPELINE:
//! AGGREGATE → ANALYZE → PROMPT → EXCHANGE → MERGE → (CHAT FOLLOW-UP)

pub mod agent;
pub mod audit;
pub mod bank;
pub mod chat;
pub mod context;
pub mod engines;
pub mod error;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use orchestrator::InvestigationOrchestrator;
