//! PricingUpdated normalization
//!
//! Builds one `PricingComponentFact` per component: dual identity, detail
//! context resolution, canonical component type, refund lineage checks.
//! The component builder is shared with RefundIssued, which runs it with a
//! refund id and forced `is_refund`.

use super::super::error::{IngestError, IngestResult};
use super::super::validate::ValidatedEnvelope;
use super::{NormalizeContext, NormalizedEvent, NormalizedPricing};
use crate::identity;
use shared::event::pricing::{
    DetailContext, PricingComponentInput, PricingTotals, PricingUpdatedPayload,
};
use shared::fact::{CanonicalComponentType, PricingComponentFact};
use serde_json::Value;
use std::collections::HashMap;

pub(super) fn normalize_pricing_updated(
    validated: &ValidatedEnvelope,
    ctx: &NormalizeContext,
) -> IngestResult<NormalizedEvent> {
    let payload: PricingUpdatedPayload = validated
        .envelope
        .parse_payload()
        .map_err(|e| IngestError::Validation(format!("malformed PricingUpdated payload: {e}")))?;

    let components = build_components(
        ctx,
        None,
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

/// Build fact rows for a batch of components (pricing or refund)
///
/// Mints one pricing_snapshot_id for the whole batch: every component of
/// one event belongs to the same snapshot occurrence.
pub(super) fn build_components(
    ctx: &NormalizeContext,
    refund_id: Option<&str>,
    inputs: &[PricingComponentInput],
    contexts: &[&DetailContext],
    totals: Option<&PricingTotals>,
) -> IngestResult<Vec<PricingComponentFact>> {
    if inputs.is_empty() {
        return Err(IngestError::Validation(
            "components must contain at least one entry".into(),
        ));
    }

    let pricing_snapshot_id = uuid::Uuid::new_v4().to_string();
    let context_by_detail: HashMap<&str, &DetailContext> = contexts
        .iter()
        .map(|c| (c.order_detail_id.as_str(), *c))
        .collect();

    let mut facts = Vec::with_capacity(inputs.len());
    for input in inputs {
        if input.currency.trim().is_empty() {
            return Err(IngestError::Validation(
                "component currency must not be empty".into(),
            ));
        }

        let is_refund = refund_id.is_some() || input.is_refund;
        if is_refund {
            if input.refund_of_component_semantic_id.is_none() {
                return Err(IngestError::Validation(
                    "refund component must carry refund_of_component_semantic_id".into(),
                ));
            }
            if input.amount >= 0 {
                return Err(IngestError::Validation(format!(
                    "refund component amount must be negative, got {}",
                    input.amount
                )));
            }
        }

        let component_semantic_id = identity::semantic_id(
            &ctx.order_id,
            refund_id,
            &input.dimensions,
            input.component_type.as_deref(),
        )?;
        let component_instance_id =
            identity::instance_id(&component_semantic_id, &pricing_snapshot_id);

        // The detail dimension selects which of the event's contexts
        // enriches this component; both the long and short key are in use
        // by producers.
        let order_detail_id = input
            .dimensions
            .get("order_detail_id")
            .or_else(|| input.dimensions.get("od"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let detail_context = order_detail_id
            .as_deref()
            .and_then(|id| context_by_detail.get(id));

        let component_type = input.component_type.clone().unwrap_or_default();
        facts.push(PricingComponentFact {
            component_instance_id,
            component_semantic_id,
            order_id: ctx.order_id.clone(),
            pricing_snapshot_id: pricing_snapshot_id.clone(),
            version: 0, // assigned at commit
            canonical_component_type: CanonicalComponentType::from_raw(&component_type),
            component_type,
            amount: input.amount,
            currency: input.currency.clone(),
            dimensions: Value::Object(input.dimensions.clone()),
            order_detail_id,
            entity_context: detail_context.and_then(|c| c.entity_context.clone()),
            fx_context: detail_context
                .and_then(|c| c.fx_context.as_ref())
                .map(|fx| serde_json::to_value(fx).unwrap_or(Value::Null)),
            description: input.description.clone(),
            is_refund,
            refund_of_component_semantic_id: input.refund_of_component_semantic_id.clone(),
            refund_id: refund_id.map(str::to_string),
            emitted_at: ctx.emitted_at,
            ingested_at: ctx.ingested_at,
        });
    }

    // Cross-check against producer totals: a mismatch is a warning, never
    // a DLQ trip.
    if let Some(customer_total) = totals.and_then(|t| t.customer_total) {
        let sum: i64 = facts.iter().map(|f| f.amount).sum();
        if sum != customer_total {
            tracing::warn!(
                order_id = %ctx.order_id,
                event_id = %ctx.event_id,
                component_sum = sum,
                customer_total,
                "Component sum does not match totals.customer_total"
            );
        }
    }

    Ok(facts)
}
