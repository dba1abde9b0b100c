//! RefundIssued and RefundLifecycle normalization
//!
//! RefundIssued reuses the pricing component builder with refund lineage
//! forced on; RefundLifecycle is a status-only row in its own family.

use super::super::error::{IngestError, IngestResult};
use super::super::validate::ValidatedEnvelope;
use super::{pricing, NormalizeContext, NormalizedEvent, NormalizedPricing, NormalizedRefund};
use shared::event::refund::{RefundIssuedPayload, RefundLifecyclePayload};
use shared::fact::RefundTimelineFact;

pub(super) fn normalize_refund_issued(
    validated: &ValidatedEnvelope,
    ctx: &NormalizeContext,
) -> IngestResult<NormalizedEvent> {
    let payload: RefundIssuedPayload = validated
        .envelope
        .parse_payload()
        .map_err(|e| IngestError::Validation(format!("malformed RefundIssued payload: {e}")))?;

    if payload.refund_id.trim().is_empty() {
        return Err(IngestError::Validation("refund_id must not be empty".into()));
    }

    let components = pricing::build_components(
        ctx,
        Some(&payload.refund_id),
        &payload.components,
        &payload.contexts(),
        payload.totals.as_ref(),
    )?;

    Ok(NormalizedEvent::Pricing(NormalizedPricing {
        order_id: ctx.order_id.clone(),
        explicit_version: payload.version,
        components,
    }))
}

pub(super) fn normalize_refund_lifecycle(
    validated: &ValidatedEnvelope,
    ctx: &NormalizeContext,
) -> IngestResult<NormalizedEvent> {
    let payload: RefundLifecyclePayload = validated
        .envelope
        .parse_payload()
        .map_err(|e| IngestError::Validation(format!("malformed RefundLifecycle payload: {e}")))?;

    if payload.refund_id.trim().is_empty() {
        return Err(IngestError::Validation("refund_id must not be empty".into()));
    }
    if payload.status.trim().is_empty() {
        return Err(IngestError::Validation("status must not be empty".into()));
    }

    Ok(NormalizedEvent::RefundLifecycle(NormalizedRefund {
        explicit_version: payload.refund_timeline_version,
        fact: RefundTimelineFact {
            event_id: ctx.event_id.clone(),
            order_id: ctx.order_id.clone(),
            refund_id: payload.refund_id,
            refund_timeline_version: 0, // assigned at commit
            status: payload.status,
            refund_amount: payload.refund_amount,
            currency: payload.currency,
            reason: payload.reason,
            emitted_at: ctx.emitted_at,
            ingested_at: ctx.ingested_at,
        },
    }))
}
