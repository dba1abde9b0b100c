use super::*;
use crate::store::FactStore;
use serde_json::{json, Value};

mod test_boundary;

fn create_test_ingestor() -> Ingestor {
    let store = FactStore::open_in_memory().unwrap();
    Ingestor::new(store, IngestConfig::default())
}

// ========================================================================
// Helper: event builders (wire-shaped JSON, envelope included)
// ========================================================================

fn pricing_event(event_id: &str, order_id: &str, components: Value) -> Value {
    json!({
        "event_id": event_id,
        "event_type": "PricingUpdated",
        "schema_version": "pricing.commerce.v1",
        "order_id": order_id,
        "emitted_at": "2024-06-01T10:00:00Z",
        "emitter_service": "pricing",
        "components": components
    })
}

fn supplier_event(
    event_id: &str,
    order_id: &str,
    order_detail_id: &str,
    fulfillment_instance_id: Option<&str>,
    status: &str,
    amount_due: i64,
    parties: Value,
) -> Value {
    let mut event = json!({
        "event_id": event_id,
        "event_type": "IssuanceSupplierLifecycle",
        "schema_version": "supplier.timeline.v2",
        "order_id": order_id,
        "emitted_at": "2024-06-01T10:00:00Z",
        "emitter_service": "supplier",
        "order_detail_id": order_detail_id,
        "status": status,
        "supplier_id": "SUP-1",
        "amount_due": amount_due,
        "amount_basis": "net",
        "currency": "IDR",
        "parties": parties
    });
    if let Some(id) = fulfillment_instance_id {
        event["fulfillment_instance_id"] = json!(id);
    }
    event
}

fn affiliate_party(lines: Value) -> Value {
    json!({
        "party_type": "AFFILIATE",
        "party_id": "AFF-1",
        "party_name": "Affiliate One",
        "lines": lines
    })
}

fn partner_adjustment_event(event_id: &str, order_id: &str, amount: i64) -> Value {
    json!({
        "event_id": event_id,
        "event_type": "PartnerAdjustmentEvent",
        "schema_version": "partner.adjustment.v1",
        "order_id": order_id,
        "emitted_at": "2024-06-02T08:00:00Z",
        "order_detail_id": "OD-1359185528",
        "supplier_reference_id": "SUP-1",
        "party_type": "AFFILIATE",
        "party_id": "AFF-1",
        "obligation_type": "penalty",
        "amount": amount,
        "amount_effect": "INCREASES_PAYABLE",
        "currency": "IDR"
    })
}

async fn ingest_committed(ingestor: &Ingestor, event: Value) -> usize {
    match ingestor.ingest(event).await {
        IngestOutcome::Committed { rows_written, .. } => rows_written,
        other => panic!("expected Committed, got {:?}", other),
    }
}

async fn ingest_dead_lettered(ingestor: &Ingestor, event: Value) -> shared::fact::DlqErrorKind {
    match ingestor.ingest(event).await {
        IngestOutcome::DeadLettered { error_kind, .. } => error_kind,
        other => panic!("expected DeadLettered, got {:?}", other),
    }
}
