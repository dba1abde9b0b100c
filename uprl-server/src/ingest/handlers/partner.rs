//! PartnerAdjustment normalization
//!
//! A single standalone obligation line written with version -1. No
//! timeline parent is required and none is checked for: the projector
//! counts standalone lines whatever the instance status, so the line
//! persists across status changes by construction.

use super::super::error::{IngestError, IngestResult};
use super::super::validate::ValidatedEnvelope;
use super::{validate_fulfillment_id, NormalizeContext, NormalizedEvent};
use shared::event::supplier::PartnerAdjustmentPayload;
use shared::fact::{SupplierPayableLine, STANDALONE_VERSION};

pub(super) fn normalize_partner_adjustment(
    validated: &ValidatedEnvelope,
    ctx: &NormalizeContext,
) -> IngestResult<NormalizedEvent> {
    let payload: PartnerAdjustmentPayload =
        validated.envelope.parse_payload().map_err(|e| {
            IngestError::Validation(format!("malformed PartnerAdjustment payload: {e}"))
        })?;

    if payload.order_detail_id.trim().is_empty() {
        return Err(IngestError::Validation(
            "order_detail_id must not be empty".into(),
        ));
    }
    if payload.supplier_reference_id.trim().is_empty() {
        return Err(IngestError::Validation(
            "supplier_reference_id must not be empty".into(),
        ));
    }
    if payload.party_id.trim().is_empty() {
        return Err(IngestError::Validation("party_id must not be empty".into()));
    }
    if payload.amount < 0 {
        return Err(IngestError::Validation(format!(
            "adjustment amount must be non-negative, got {}",
            payload.amount
        )));
    }
    validate_fulfillment_id(&payload.fulfillment_instance_id)?;

    Ok(NormalizedEvent::PartnerAdjustment(SupplierPayableLine {
        line_id: uuid::Uuid::new_v4().to_string(),
        order_id: ctx.order_id.clone(),
        order_detail_id: payload.order_detail_id,
        supplier_reference_id: payload.supplier_reference_id,
        fulfillment_instance_id: payload.fulfillment_instance_id,
        supplier_timeline_version: STANDALONE_VERSION,
        party_type: payload.party_type,
        party_id: payload.party_id,
        party_name: payload.party_name,
        obligation_type: payload.obligation_type,
        amount: payload.amount,
        amount_effect: payload.amount_effect,
        currency: payload.currency,
        calculation: None,
        description: payload.description,
        ingested_at: ctx.ingested_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::validate::validate_envelope;
    use serde_json::json;
    use shared::event::supplier::{AmountEffect, PartyType};

    fn ctx() -> NormalizeContext {
        NormalizeContext {
            event_id: "evt-adj-1".into(),
            order_id: "ORD-1".into(),
            emitted_at: 1_700_000_000_000,
            ingested_at: 1_700_000_000_500,
        }
    }

    fn event(extra: serde_json::Value) -> serde_json::Value {
        let mut raw = json!({
            "event_type": "PartnerAdjustmentEvent",
            "schema_version": "partner.adjustment.v1",
            "order_id": "ORD-1",
            "emitted_at": "2024-06-01T10:00:00Z",
            "order_detail_id": "OD-1",
            "supplier_reference_id": "SUP-1",
            "party_type": "AFFILIATE",
            "party_id": "AFF-1",
            "obligation_type": "penalty",
            "amount": 500000,
            "amount_effect": "INCREASES_PAYABLE",
            "currency": "IDR"
        });
        raw.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        raw
    }

    #[test]
    fn test_standalone_line() {
        let validated = validate_envelope(&event(json!({}))).unwrap();
        let NormalizedEvent::PartnerAdjustment(line) =
            normalize_partner_adjustment(&validated, &ctx()).unwrap()
        else {
            panic!("expected partner adjustment variant");
        };
        assert_eq!(line.supplier_timeline_version, STANDALONE_VERSION);
        assert_eq!(line.party_type, PartyType::Affiliate);
        assert_eq!(line.amount_effect, AmountEffect::IncreasesPayable);
        assert!(line.is_standalone());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let validated = validate_envelope(&event(json!({"amount": -1}))).unwrap();
        assert!(normalize_partner_adjustment(&validated, &ctx()).is_err());
    }

    #[test]
    fn test_empty_fulfillment_rejected() {
        let validated =
            validate_envelope(&event(json!({"fulfillment_instance_id": ""}))).unwrap();
        assert!(normalize_partner_adjustment(&validated, &ctx()).is_err());
    }
}
