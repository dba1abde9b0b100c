//! Inbound event envelope
//!
//! Every producer event carries the same envelope regardless of kind.
//! Event-kind specific fields travel at the top level of the JSON object
//! and are collected into [`EventEnvelope::payload`]; unknown fields are
//! preserved verbatim the same way.

use crate::fact::VersionFamily;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The six inbound event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    PricingUpdated,
    PaymentLifecycle,
    SupplierLifecycle,
    RefundIssued,
    RefundLifecycle,
    PartnerAdjustment,
}

impl EventType {
    /// Parse a wire token, aliases included
    ///
    /// | Canonical token | Accepted aliases |
    /// |-----------------|------------------|
    /// | `PricingUpdated` | none |
    /// | `PaymentLifecycle` | none |
    /// | `IssuanceSupplierLifecycle` | `SupplierLifecycleEvent` |
    /// | `refund.issued` | none |
    /// | `RefundLifecycle` | none |
    /// | `PartnerAdjustmentEvent` | none |
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PricingUpdated" => Some(Self::PricingUpdated),
            "PaymentLifecycle" => Some(Self::PaymentLifecycle),
            "IssuanceSupplierLifecycle" | "SupplierLifecycleEvent" => Some(Self::SupplierLifecycle),
            "refund.issued" => Some(Self::RefundIssued),
            "RefundLifecycle" => Some(Self::RefundLifecycle),
            "PartnerAdjustmentEvent" => Some(Self::PartnerAdjustment),
            _ => None,
        }
    }

    /// Canonical wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PricingUpdated => "PricingUpdated",
            Self::PaymentLifecycle => "PaymentLifecycle",
            Self::SupplierLifecycle => "IssuanceSupplierLifecycle",
            Self::RefundIssued => "refund.issued",
            Self::RefundLifecycle => "RefundLifecycle",
            Self::PartnerAdjustment => "PartnerAdjustmentEvent",
        }
    }

    /// Version family this event kind writes into
    ///
    /// Partner adjustments write version -1 verbatim and bypass the
    /// registry, hence `None`.
    pub fn family(&self) -> Option<VersionFamily> {
        match self {
            Self::PricingUpdated | Self::RefundIssued => Some(VersionFamily::Pricing),
            Self::PaymentLifecycle => Some(VersionFamily::Payment),
            Self::SupplierLifecycle => Some(VersionFamily::Supplier),
            Self::RefundLifecycle => Some(VersionFamily::Refund),
            Self::PartnerAdjustment => None,
        }
    }
}

/// Exhaustive set of schema_version tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaVersion {
    PricingCommerceV1,
    PaymentTimelineV1,
    SupplierTimelineV1,
    /// Adds multi-party obligations and `fulfillment_instance_id`
    SupplierTimelineV2,
    RefundComponentsV1,
    RefundLifecycleV1,
    PartnerAdjustmentV1,
}

impl SchemaVersion {
    /// Parse a wire token; the set is closed
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pricing.commerce.v1" => Some(Self::PricingCommerceV1),
            "payment.timeline.v1" => Some(Self::PaymentTimelineV1),
            "supplier.timeline.v1" => Some(Self::SupplierTimelineV1),
            "supplier.timeline.v2" => Some(Self::SupplierTimelineV2),
            "refund.components.v1" => Some(Self::RefundComponentsV1),
            "refund.lifecycle.v1" => Some(Self::RefundLifecycleV1),
            "partner.adjustment.v1" => Some(Self::PartnerAdjustmentV1),
            _ => None,
        }
    }

    /// Canonical wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PricingCommerceV1 => "pricing.commerce.v1",
            Self::PaymentTimelineV1 => "payment.timeline.v1",
            Self::SupplierTimelineV1 => "supplier.timeline.v1",
            Self::SupplierTimelineV2 => "supplier.timeline.v2",
            Self::RefundComponentsV1 => "refund.components.v1",
            Self::RefundLifecycleV1 => "refund.lifecycle.v1",
            Self::PartnerAdjustmentV1 => "partner.adjustment.v1",
        }
    }

    /// Whether this schema token belongs to the given event kind
    pub fn matches(&self, event_type: EventType) -> bool {
        matches!(
            (event_type, self),
            (EventType::PricingUpdated, Self::PricingCommerceV1)
                | (EventType::PaymentLifecycle, Self::PaymentTimelineV1)
                | (EventType::SupplierLifecycle, Self::SupplierTimelineV1)
                | (EventType::SupplierLifecycle, Self::SupplierTimelineV2)
                | (EventType::RefundIssued, Self::RefundComponentsV1)
                | (EventType::RefundLifecycle, Self::RefundLifecycleV1)
                | (EventType::PartnerAdjustment, Self::PartnerAdjustmentV1)
        )
    }
}

/// The inbound envelope shared by every event kind
///
/// Required fields: `event_type`, `schema_version`, `order_id`,
/// `emitted_at`. Everything else on the wire object, known or not, lands
/// in `payload` and is preserved verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub event_type: String,
    pub schema_version: String,
    pub order_id: String,
    /// ISO-8601 producer timestamp; parse is validated, the raw string kept
    pub emitted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emitter_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Event-kind fields plus any unknown envelope fields, verbatim
    #[serde(flatten)]
    pub payload: serde_json::Map<String, Value>,
}

impl EventEnvelope {
    /// Deserialize the event-kind payload struct from the flattened fields
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.payload.clone()))
    }

    /// The identity used for idempotent delivery
    ///
    /// Prefers `event_id`, falls back to `idempotency_key`. Events carrying
    /// neither cannot be deduplicated; callers mint a fresh UUID for them.
    pub fn delivery_id(&self) -> Option<&str> {
        self.event_id
            .as_deref()
            .or(self.idempotency_key.as_deref())
    }
}
