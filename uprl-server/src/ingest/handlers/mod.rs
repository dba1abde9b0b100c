//! Per-event-kind normalization
//!
//! Each handler turns a validated envelope into the fact rows it commits,
//! minus the family version: versions are resolved inside the write
//! transaction (under the scope lock) so the read-assign-commit window is
//! serialized. Handlers are pure CPU work and never touch storage.

use super::error::{IngestError, IngestResult};
use super::validate::ValidatedEnvelope;
use crate::versioning::VersionScope;
use shared::event::EventType;
use shared::fact::{
    PaymentTimelineFact, PricingComponentFact, RefundTimelineFact, SupplierPayableLine,
    SupplierTimelineFact, BOOKING_LEVEL,
};

mod partner;
mod payment;
mod pricing;
mod refund;
mod supplier;

/// Metadata every handler needs
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    /// Resolved delivery identity (event_id, idempotency_key, or minted)
    pub event_id: String,
    pub order_id: String,
    /// Producer clock, Unix milliseconds
    pub emitted_at: i64,
    /// Core clock, Unix milliseconds
    pub ingested_at: i64,
}

/// Pricing rows ready for commit (PricingUpdated or RefundIssued)
#[derive(Debug, Clone)]
pub struct NormalizedPricing {
    pub order_id: String,
    /// Producer-assigned version, honored verbatim when present
    pub explicit_version: Option<u64>,
    /// Rows with `version` left 0; assigned at commit
    pub components: Vec<PricingComponentFact>,
}

/// Payment row ready for commit
#[derive(Debug, Clone)]
pub struct NormalizedPayment {
    pub explicit_version: Option<u64>,
    /// `timeline_version` left 0; assigned at commit
    pub fact: PaymentTimelineFact,
}

/// Supplier parent row plus its payable lines, ready for commit
#[derive(Debug, Clone)]
pub struct NormalizedSupplier {
    pub explicit_version: Option<u64>,
    /// `supplier_timeline_version` left 0; assigned at commit
    pub parent: SupplierTimelineFact,
    /// Same version as the parent, assigned at commit
    pub lines: Vec<SupplierPayableLine>,
}

/// Refund lifecycle row ready for commit
#[derive(Debug, Clone)]
pub struct NormalizedRefund {
    pub explicit_version: Option<u64>,
    /// `refund_timeline_version` left 0; assigned at commit
    pub fact: RefundTimelineFact,
}

/// Output of normalization, one variant per write shape
#[derive(Debug, Clone)]
pub enum NormalizedEvent {
    Pricing(NormalizedPricing),
    Payment(NormalizedPayment),
    Supplier(NormalizedSupplier),
    RefundLifecycle(NormalizedRefund),
    /// Complete row carrying version -1; bypasses the registry
    PartnerAdjustment(SupplierPayableLine),
}

impl NormalizedEvent {
    /// The version scope this event writes into (None for standalone
    /// partner adjustments)
    pub fn scope(&self) -> Option<VersionScope> {
        match self {
            Self::Pricing(p) => Some(VersionScope::Pricing {
                order_id: p.order_id.clone(),
            }),
            Self::Payment(p) => Some(VersionScope::Payment {
                order_id: p.fact.order_id.clone(),
            }),
            Self::Supplier(s) => Some(VersionScope::Supplier {
                order_id: s.parent.order_id.clone(),
                order_detail_id: s.parent.order_detail_id.clone(),
                supplier_reference_id: s.parent.supplier_reference_id.clone(),
                fulfillment_or_booking: s.parent.fulfillment_or_booking().to_string(),
            }),
            Self::RefundLifecycle(r) => Some(VersionScope::Refund {
                order_id: r.fact.order_id.clone(),
                refund_id: r.fact.refund_id.clone(),
            }),
            Self::PartnerAdjustment(_) => None,
        }
    }

    /// Family tag recorded next to the event id
    pub fn family_tag(&self) -> &'static str {
        match self {
            Self::Pricing(_) => "pricing",
            Self::Payment(_) => "payment",
            Self::Supplier(_) => "supplier",
            Self::RefundLifecycle(_) => "refund",
            Self::PartnerAdjustment(_) => "partner_adjustment",
        }
    }

    /// Producer-assigned version, when the payload carried one
    pub fn explicit_version(&self) -> Option<u64> {
        match self {
            Self::Pricing(p) => p.explicit_version,
            Self::Payment(p) => p.explicit_version,
            Self::Supplier(s) => s.explicit_version,
            Self::RefundLifecycle(r) => r.explicit_version,
            Self::PartnerAdjustment(_) => None,
        }
    }
}

/// Route a validated envelope to its handler
pub fn normalize(
    validated: &ValidatedEnvelope,
    ctx: &NormalizeContext,
) -> IngestResult<NormalizedEvent> {
    match validated.event_type {
        EventType::PricingUpdated => pricing::normalize_pricing_updated(validated, ctx),
        EventType::PaymentLifecycle => payment::normalize_payment(validated, ctx),
        EventType::SupplierLifecycle => supplier::normalize_supplier(validated, ctx),
        EventType::RefundIssued => refund::normalize_refund_issued(validated, ctx),
        EventType::RefundLifecycle => refund::normalize_refund_lifecycle(validated, ctx),
        EventType::PartnerAdjustment => partner::normalize_partner_adjustment(validated, ctx),
    }
}

/// Shared check: an empty fulfillment_instance_id is never a key
///
/// null/absent is the booking-level instance; the empty string is rejected
/// so it can never alias either form.
pub(crate) fn validate_fulfillment_id(value: &Option<String>) -> IngestResult<()> {
    if let Some(id) = value {
        if id.is_empty() {
            return Err(IngestError::Validation(
                "fulfillment_instance_id must not be empty; omit it for booking level".into(),
            ));
        }
        if id == BOOKING_LEVEL {
            return Err(IngestError::Validation(format!(
                "fulfillment_instance_id must not be the reserved sentinel '{BOOKING_LEVEL}'"
            )));
        }
    }
    Ok(())
}
