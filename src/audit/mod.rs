//! Investigation audit trail
//!
//! Every completed investigation is recorded, including
//! fallback-synthesized ones, so the audit log stays usable even when the
//! narrative engine is degraded.

use crate::error::InvestigationError;
use crate::models::{AlertInvestigationContext, AnalyticalResult, InvestigationResponse};
use crate::Result;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One audited investigation.
#[derive(Debug, Clone)]
pub struct InvestigationRecord {
    pub audit_id: Uuid,
    pub alert_id: String,
    /// Snapshot of the context as investigated, kept for integrity checks.
    pub context: AlertInvestigationContext,
    pub context_hash: String,
    pub analytical: AnalyticalResult,
    pub response: InvestigationResponse,
    pub narrative_degraded: bool,
    pub created_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Audit trail storage
pub struct AuditLog {
    records: Arc<RwLock<HashMap<Uuid, InvestigationRecord>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store an investigation record
    pub async fn record(&self, record: InvestigationRecord) -> Result<Uuid> {
        let audit_id = record.audit_id;
        let mut records = self.records.write().await;
        records.insert(audit_id, record);
        Ok(audit_id)
    }

    /// Retrieve a record by audit ID
    pub async fn get(&self, audit_id: Uuid) -> Result<Option<InvestigationRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&audit_id).cloned())
    }

    /// List all audit IDs for an alert (sorted by created_at)
    pub async fn list_for_alert(&self, alert_id: &str) -> Result<Vec<Uuid>> {
        let records = self.records.read().await;

        let mut items: Vec<_> = records
            .iter()
            .filter(|(_, record)| record.alert_id == alert_id)
            .map(|(id, record)| (*id, record.created_at))
            .collect();

        items.sort_by_key(|(_, created_at)| *created_at);

        Ok(items.into_iter().map(|(id, _)| id).collect())
    }

    /// Recompute the hash of the stored context snapshot and compare it
    /// against the hash captured at investigation time.
    pub async fn verify_integrity(&self, audit_id: Uuid) -> Result<bool> {
        let records = self.records.read().await;

        let record = records.get(&audit_id).ok_or_else(|| {
            InvestigationError::Audit(format!("Audit record not found: {}", audit_id))
        })?;

        Ok(compute_context_hash(&record.context) == record.context_hash)
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute SHA256 hash of an investigation context for integrity checks.
/// Streams JSON directly into the hasher, no intermediate String.
pub fn compute_context_hash(context: &AlertInvestigationContext) -> String {
    let mut hasher = Sha256::new();

    if serde_json::to_writer(&mut HashWriter(&mut hasher), context).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
