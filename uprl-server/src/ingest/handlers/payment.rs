//! PaymentLifecycle normalization
//!
//! Lifts the legacy flat shape to the nested `payment` object, validates
//! the instrument's single-population rule, and produces one timeline row.

use super::super::error::{IngestError, IngestResult};
use super::super::validate::ValidatedEnvelope;
use super::{NormalizeContext, NormalizedEvent, NormalizedPayment};
use shared::event::payment::PaymentLifecyclePayload;
use shared::fact::PaymentTimelineFact;
use serde_json::Value;

pub(super) fn normalize_payment(
    validated: &ValidatedEnvelope,
    ctx: &NormalizeContext,
) -> IngestResult<NormalizedEvent> {
    let payload: PaymentLifecyclePayload = validated
        .envelope
        .parse_payload()
        .map_err(|e| IngestError::Validation(format!("malformed PaymentLifecycle payload: {e}")))?;

    let explicit_version = payload.timeline_version;
    let payment = payload
        .canonicalize()
        .map_err(IngestError::Validation)?;

    if payment.currency.trim().is_empty() {
        return Err(IngestError::Validation(
            "payment.currency must not be empty".into(),
        ));
    }

    if let Some(instrument) = &payment.instrument {
        instrument.validate().map_err(IngestError::Validation)?;
    }

    let instrument = payment
        .instrument
        .as_ref()
        .map(|i| serde_json::to_value(i).unwrap_or(Value::Null));

    Ok(NormalizedEvent::Payment(NormalizedPayment {
        explicit_version,
        fact: PaymentTimelineFact {
            event_id: ctx.event_id.clone(),
            order_id: ctx.order_id.clone(),
            timeline_version: 0, // assigned at commit
            status: payment.status,
            payment_method: payment.payment_method,
            instrument,
            authorized_amount: payment.authorized_amount,
            captured_amount: payment.captured_amount,
            captured_amount_total: payment.captured_amount_total,
            currency: payment.currency,
            bnpl_plan: payment.bnpl_plan,
            emitted_at: ctx.emitted_at,
            ingested_at: ctx.ingested_at,
        },
    }))
}
