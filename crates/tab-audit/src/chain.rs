use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use tab_core::canonical::canonical_hash;
use tab_types::{AuditRecord, EventKind};

/// Fields a record's hash commits to, excluding the hash itself. Kept as a
/// separate struct (rather than hashing `AuditRecord` directly with `hash`
/// zeroed out) so the hash input shape never accidentally drifts if
/// `AuditRecord` grows a field that should not be covered.
#[derive(Serialize)]
struct HashInput<'a> {
    record_id: Uuid,
    session_id: Uuid,
    index: u64,
    timestamp: chrono::DateTime<Utc>,
    kind: &'a EventKind,
    payload: &'a serde_json::Value,
    trace_correlation: &'a Option<String>,
    prev_hash: &'a Option<String>,
}

/// Builds the next record in a session's chain. `prev` is the last record
/// appended for this session, or `None` for the first.
pub fn next_record(
    session_id: Uuid,
    prev: Option<&AuditRecord>,
    kind: EventKind,
    payload: serde_json::Value,
    trace_correlation: Option<String>,
) -> AuditRecord {
    let index = prev.map(|r| r.index + 1).unwrap_or(0);
    let prev_hash = prev.map(|r| r.hash.clone());
    let record_id = Uuid::new_v4();
    let timestamp = Utc::now();

    let hash = canonical_hash(&HashInput {
        record_id,
        session_id,
        index,
        timestamp,
        kind: &kind,
        payload: &payload,
        trace_correlation: &trace_correlation,
        prev_hash: &prev_hash,
    });

    AuditRecord { record_id, session_id, index, timestamp, kind, payload, trace_correlation, prev_hash, hash }
}

/// Recomputes the hash of an existing record and compares it, detecting any
/// field having been altered after the fact.
pub fn verify_record_hash(record: &AuditRecord) -> bool {
    let recomputed = canonical_hash(&HashInput {
        record_id: record.record_id,
        session_id: record.session_id,
        index: record.index,
        timestamp: record.timestamp,
        kind: &record.kind,
        payload: &record.payload,
        trace_correlation: &record.trace_correlation,
        prev_hash: &record.prev_hash,
    });
    recomputed == record.hash
}

/// Verifies an entire chain: every record's own hash must be internally
/// consistent, and each record's `prev_hash` must match the previous
/// record's `hash`. A linear scan, since the chain is only as long as one
/// conversation's audit trail.
pub fn verify_chain(records: &[AuditRecord]) -> Result<(), (u64, String, String)> {
    let mut prev_hash: Option<String> = None;
    for record in records {
        if !verify_record_hash(record) {
            return Err((record.index, "self".to_string(), record.hash.clone()));
        }
        let expected = prev_hash.clone();
        if record.prev_hash != expected {
            return Err((
                record.index,
                expected.unwrap_or_else(|| "<none>".to_string()),
                record.prev_hash.clone().unwrap_or_else(|| "<none>".to_string()),
            ));
        }
        prev_hash = Some(record.hash.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chain_of_three_verifies() {
        let session_id = Uuid::new_v4();
        let r0 = next_record(session_id, None, EventKind::SessionCreated, json!({}), None);
        let r1 = next_record(session_id, Some(&r0), EventKind::TurnRequested, json!({"n": 1}), None);
        let r2 = next_record(session_id, Some(&r1), EventKind::TurnAppended, json!({"n": 2}), None);
        assert!(verify_chain(&[r0, r1, r2]).is_ok());
    }

    #[test]
    fn tampering_with_payload_breaks_chain() {
        let session_id = Uuid::new_v4();
        let r0 = next_record(session_id, None, EventKind::SessionCreated, json!({}), None);
        let mut r1 = next_record(session_id, Some(&r0), EventKind::TurnRequested, json!({"n": 1}), None);
        r1.payload = json!({"n": 999});
        assert!(verify_chain(&[r0, r1]).is_err());
    }

    #[test]
    fn reordering_records_breaks_chain() {
        let session_id = Uuid::new_v4();
        let r0 = next_record(session_id, None, EventKind::SessionCreated, json!({}), None);
        let r1 = next_record(session_id, Some(&r0), EventKind::TurnRequested, json!({"n": 1}), None);
        assert!(verify_chain(&[r1, r0]).is_err());
    }
}
