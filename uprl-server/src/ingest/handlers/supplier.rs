//! SupplierLifecycle normalization
//!
//! Produces the timeline parent row plus one payable line per party ×
//! line, all carrying the same version (assigned at commit). v1 events may
//! not carry v2-only fields; `parties: []` is a legal no-op that leaves
//! projection to carry prior obligations forward.

use super::super::error::{IngestError, IngestResult};
use super::super::validate::ValidatedEnvelope;
use super::{validate_fulfillment_id, NormalizeContext, NormalizedEvent, NormalizedSupplier};
use shared::event::supplier::{SupplierLifecyclePayload, SupplierStatus};
use shared::event::SchemaVersion;
use shared::fact::{SupplierPayableLine, SupplierTimelineFact};

pub(super) fn normalize_supplier(
    validated: &ValidatedEnvelope,
    ctx: &NormalizeContext,
) -> IngestResult<NormalizedEvent> {
    let payload: SupplierLifecyclePayload =
        validated.envelope.parse_payload().map_err(|e| {
            IngestError::Validation(format!("malformed SupplierLifecycle payload: {e}"))
        })?;

    if validated.schema_version == SchemaVersion::SupplierTimelineV1 {
        if payload.parties.is_some() {
            return Err(IngestError::Validation(
                "supplier.timeline.v1 does not carry parties; use supplier.timeline.v2".into(),
            ));
        }
        if payload.fulfillment_instance_id.is_some() {
            return Err(IngestError::Validation(
                "supplier.timeline.v1 does not carry fulfillment_instance_id; use supplier.timeline.v2"
                    .into(),
            ));
        }
    }

    // Bad enum ⇒ ValidationError at ingest. The fact stores the raw token
    // so rows written by newer revisions still read back.
    if SupplierStatus::parse(&payload.status).is_none() {
        return Err(IngestError::Validation(format!(
            "unknown supplier status '{}'",
            payload.status
        )));
    }

    validate_fulfillment_id(&payload.fulfillment_instance_id)?;

    if payload.order_detail_id.trim().is_empty() {
        return Err(IngestError::Validation(
            "order_detail_id must not be empty".into(),
        ));
    }

    let supplier_reference_id = payload.supplier_reference_id().to_string();
    let parent = SupplierTimelineFact {
        event_id: ctx.event_id.clone(),
        order_id: ctx.order_id.clone(),
        order_detail_id: payload.order_detail_id.clone(),
        supplier_reference_id: supplier_reference_id.clone(),
        fulfillment_instance_id: payload.fulfillment_instance_id.clone(),
        supplier_timeline_version: 0, // assigned at commit
        status: payload.status.clone(),
        amount: payload.amount_due,
        amount_basis: payload.amount_basis.as_str().to_string(),
        currency: payload.currency.clone(),
        fx_context: payload.fx_context.clone(),
        entity_context: payload.entity_context.clone(),
        cancellation: payload.cancellation.clone(),
        emitted_at: ctx.emitted_at,
        ingested_at: ctx.ingested_at,
    };

    let mut lines = Vec::new();
    for party in payload.parties.as_deref().unwrap_or(&[]) {
        if party.party_id.trim().is_empty() {
            return Err(IngestError::Validation("party_id must not be empty".into()));
        }
        for line in &party.lines {
            // Magnitudes only; direction lives in amount_effect
            if line.amount < 0 {
                return Err(IngestError::Validation(format!(
                    "obligation line amount must be non-negative, got {} for party '{}'",
                    line.amount, party.party_id
                )));
            }
            lines.push(SupplierPayableLine {
                line_id: uuid::Uuid::new_v4().to_string(),
                order_id: ctx.order_id.clone(),
                order_detail_id: payload.order_detail_id.clone(),
                supplier_reference_id: supplier_reference_id.clone(),
                fulfillment_instance_id: payload.fulfillment_instance_id.clone(),
                supplier_timeline_version: 0, // assigned at commit
                party_type: party.party_type,
                party_id: party.party_id.clone(),
                party_name: party.party_name.clone(),
                obligation_type: line.obligation_type.clone(),
                amount: line.amount,
                amount_effect: line.amount_effect,
                currency: line.currency.clone(),
                calculation: line.calculation.clone(),
                description: line.description.clone(),
                ingested_at: ctx.ingested_at,
            });
        }
    }

    Ok(NormalizedEvent::Supplier(NormalizedSupplier {
        explicit_version: payload.supplier_timeline_version,
        parent,
        lines,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::validate::validate_envelope;
    use serde_json::json;
    use shared::event::supplier::AmountEffect;

    fn ctx() -> NormalizeContext {
        NormalizeContext {
            event_id: "evt-sup-1".into(),
            order_id: "ORD-1".into(),
            emitted_at: 1_700_000_000_000,
            ingested_at: 1_700_000_000_500,
        }
    }

    fn v2_event(extra: serde_json::Value) -> serde_json::Value {
        let mut raw = json!({
            "event_type": "IssuanceSupplierLifecycle",
            "schema_version": "supplier.timeline.v2",
            "order_id": "ORD-1",
            "emitted_at": "2024-06-01T10:00:00Z",
            "order_detail_id": "OD-1",
            "status": "ISSUED",
            "supplier_id": "SUP-1",
            "amount_due": 127500,
            "amount_basis": "net",
            "currency": "IDR"
        });
        raw.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        raw
    }

    fn normalize(raw: serde_json::Value) -> IngestResult<NormalizedEvent> {
        let validated = validate_envelope(&raw).unwrap();
        normalize_supplier(&validated, &ctx())
    }

    #[test]
    fn test_parties_fan_out_to_lines() {
        let result = normalize(v2_event(json!({
            "parties": [{
                "party_type": "AFFILIATE",
                "party_id": "AFF-1",
                "lines": [
                    {"obligation_type": "commission", "amount": 4694, "currency": "IDR",
                     "amount_effect": "INCREASES_PAYABLE"},
                    {"obligation_type": "commission-vat", "amount": 516, "currency": "IDR",
                     "amount_effect": "INCREASES_PAYABLE"}
                ]
            }]
        })))
        .unwrap();

        let NormalizedEvent::Supplier(supplier) = result else {
            panic!("expected supplier variant");
        };
        assert_eq!(supplier.lines.len(), 2);
        assert_eq!(supplier.lines[0].party_id, "AFF-1");
        assert_eq!(supplier.lines[0].amount_effect, AmountEffect::IncreasesPayable);
        assert_eq!(supplier.parent.status, "ISSUED");
        assert_eq!(supplier.parent.amount, 127500);
    }

    #[test]
    fn test_empty_parties_is_legal_noop() {
        let result = normalize(v2_event(json!({"parties": []}))).unwrap();
        let NormalizedEvent::Supplier(supplier) = result else {
            panic!("expected supplier variant");
        };
        assert!(supplier.lines.is_empty());
    }

    #[test]
    fn test_v1_rejects_v2_fields() {
        let mut raw = v2_event(json!({"parties": []}));
        raw["schema_version"] = json!("supplier.timeline.v1");
        assert!(normalize(raw).is_err());

        let mut raw = v2_event(json!({"fulfillment_instance_id": "ticket-1"}));
        raw["schema_version"] = json!("supplier.timeline.v1");
        assert!(normalize(raw).is_err());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let raw = v2_event(json!({"status": "Shipped"}));
        assert!(normalize(raw).is_err());
    }

    #[test]
    fn test_empty_fulfillment_id_rejected() {
        let raw = v2_event(json!({"fulfillment_instance_id": ""}));
        assert!(normalize(raw).is_err());
    }

    #[test]
    fn test_negative_line_amount_rejected() {
        let raw = v2_event(json!({
            "parties": [{
                "party_type": "AFFILIATE",
                "party_id": "AFF-1",
                "lines": [{"obligation_type": "penalty", "amount": -100, "currency": "IDR",
                           "amount_effect": "DECREASES_PAYABLE"}]
            }]
        }));
        assert!(normalize(raw).is_err());
    }

    #[test]
    fn test_supplier_ref_preferred_over_id() {
        let result = normalize(v2_event(json!({"supplier_ref": "REF-9"}))).unwrap();
        let NormalizedEvent::Supplier(supplier) = result else {
            panic!("expected supplier variant");
        };
        assert_eq!(supplier.parent.supplier_reference_id, "REF-9");
    }
}
