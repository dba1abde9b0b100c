//! Normalized fact rows
//!
//! The append-only rows the Core persists, one struct per table:
//!
//! | Row | Primary key | Written by |
//! |-----|-------------|-----------|
//! | [`PricingComponentFact`] | `component_instance_id` | PricingUpdated / RefundIssued |
//! | [`PaymentTimelineFact`] | `event_id` | PaymentLifecycle |
//! | [`SupplierTimelineFact`] | `event_id` | SupplierLifecycle |
//! | [`SupplierPayableLine`] | `line_id` | SupplierLifecycle / PartnerAdjustment |
//! | [`RefundTimelineFact`] | `event_id` | RefundLifecycle |
//! | [`DlqEntry`] | `dlq_id` | any failed event |
//!
//! No row is ever mutated or deleted once committed (`retry_count` on DLQ
//! entries is the one bookkeeping exception; DLQ entries are not facts).
//!
//! JSON-valued columns (`dimensions`, `fx_context`, `entity_context`,
//! `instrument`, `meta`) hold canonicalized JSON: `serde_json` maps are
//! key-sorted, so re-serialization at commit normalizes key order and
//! whitespace.

use crate::event::payment::{PaymentMethod, PaymentStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// Domain vocabulary shared between wire and fact layers
pub use crate::event::supplier::{AmountEffect, PartyType};

/// Key segment standing in for an absent `fulfillment_instance_id`
///
/// The absent value is a meaningful distinct key (the booking-level
/// instance), not a wildcard.
pub const BOOKING_LEVEL: &str = "__BOOKING_LEVEL__";

/// Sentinel version for standalone partner adjustments
pub const STANDALONE_VERSION: i64 = -1;

/// The five independent version families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionFamily {
    Pricing,
    Payment,
    Supplier,
    Refund,
    /// Reserved: scoped by `(order_id, order_detail_id)`, no trigger event yet
    Issuance,
}

impl VersionFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pricing => "pricing",
            Self::Payment => "payment",
            Self::Supplier => "supplier",
            Self::Refund => "refund",
            Self::Issuance => "issuance",
        }
    }

    /// Parse a path/query token
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pricing" => Some(Self::Pricing),
            "payment" => Some(Self::Payment),
            "supplier" => Some(Self::Supplier),
            "refund" => Some(Self::Refund),
            "issuance" => Some(Self::Issuance),
            _ => None,
        }
    }
}

impl fmt::Display for VersionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical component type derived at ingest
///
/// `component_type` stays free-form in the fact row; this column gives
/// reads a clean filter over the known set, with everything else bucketed
/// as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalComponentType {
    RoomRate,
    BaseFare,
    Tax,
    Fee,
    Markup,
    Discount,
    Commission,
    Other,
}

impl CanonicalComponentType {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "RoomRate" => Self::RoomRate,
            "BaseFare" => Self::BaseFare,
            "Tax" => Self::Tax,
            "Fee" => Self::Fee,
            "Markup" => Self::Markup,
            "Discount" => Self::Discount,
            "Commission" => Self::Commission,
            _ => Self::Other,
        }
    }
}

/// One pricing component occurrence in one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingComponentFact {
    /// Unique across the entire fact store
    pub component_instance_id: String,
    /// Deterministic semantic identity, stable across repricing
    pub component_semantic_id: String,
    pub order_id: String,
    /// UUID minted at ingest for the emitting snapshot
    pub pricing_snapshot_id: String,
    pub version: u64,
    /// Free-form producer token
    pub component_type: String,
    /// Derived filter column
    pub canonical_component_type: CanonicalComponentType,
    /// Signed amount in minor units; negative for refund components
    pub amount: i64,
    pub currency: String,
    /// Canonicalized flat scalar map
    pub dimensions: Value,
    /// Resolved from the event's detail contexts via the
    /// `order_detail_id` / `od` dimension, when the component carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_detail_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_refund: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_of_component_semantic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
    /// Producer clock, Unix milliseconds
    pub emitted_at: i64,
    /// Core clock at commit, Unix milliseconds
    pub ingested_at: i64,
}

/// One payment lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTimelineFact {
    pub event_id: String,
    pub order_id: String,
    pub timeline_version: u64,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    /// Canonicalized instrument JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_amount_total: Option<i64>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bnpl_plan: Option<Value>,
    pub emitted_at: i64,
    pub ingested_at: i64,
}

/// One supplier lifecycle event for one payable instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierTimelineFact {
    pub event_id: String,
    pub order_id: String,
    pub order_detail_id: String,
    pub supplier_reference_id: String,
    /// Absent means the booking-level instance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment_instance_id: Option<String>,
    pub supplier_timeline_version: u64,
    /// Raw wire token; read side parses and warns on unknowns
    pub status: String,
    /// Amount due to the supplier, minor units
    pub amount: i64,
    pub amount_basis: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<Value>,
    pub emitted_at: i64,
    pub ingested_at: i64,
}

impl SupplierTimelineFact {
    /// The fulfillment key segment, booking-level sentinel applied
    pub fn fulfillment_or_booking(&self) -> &str {
        self.fulfillment_instance_id.as_deref().unwrap_or(BOOKING_LEVEL)
    }
}

/// One obligation line owed to (or by) a party
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierPayableLine {
    pub line_id: String,
    pub order_id: String,
    pub order_detail_id: String,
    pub supplier_reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment_instance_id: Option<String>,
    /// -1 marks a standalone partner adjustment with no timeline parent
    pub supplier_timeline_version: i64,
    pub party_type: PartyType,
    pub party_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_name: Option<String>,
    pub obligation_type: String,
    /// Unsigned magnitude; the sign lives in `amount_effect`
    pub amount: i64,
    pub amount_effect: AmountEffect,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ingested_at: i64,
}

impl SupplierPayableLine {
    /// The fulfillment key segment, booking-level sentinel applied
    pub fn fulfillment_or_booking(&self) -> &str {
        self.fulfillment_instance_id.as_deref().unwrap_or(BOOKING_LEVEL)
    }

    /// Whether this line is a standalone partner adjustment
    pub fn is_standalone(&self) -> bool {
        self.supplier_timeline_version == STANDALONE_VERSION
    }
}

/// One refund lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundTimelineFact {
    pub event_id: String,
    pub order_id: String,
    pub refund_id: String,
    pub refund_timeline_version: u64,
    pub status: String,
    pub refund_amount: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub emitted_at: i64,
    pub ingested_at: i64,
}

/// Classification of why an event was dead-lettered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DlqErrorKind {
    ValidationError,
    IdentityError,
    VersionConflictError,
    StorageError,
}

impl DlqErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::IdentityError => "IdentityError",
            Self::VersionConflictError => "VersionConflictError",
            Self::StorageError => "StorageError",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ValidationError" => Some(Self::ValidationError),
            "IdentityError" => Some(Self::IdentityError),
            "VersionConflictError" => Some(Self::VersionConflictError),
            "StorageError" => Some(Self::StorageError),
            _ => None,
        }
    }
}

/// Dead letter queue entry
///
/// Carries the raw event verbatim so remediation can replay it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqEntry {
    pub dlq_id: String,
    pub raw_event: Value,
    pub error_kind: DlqErrorKind,
    pub error_detail: String,
    /// Order the event claimed, when it got far enough to say
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub received_at: i64,
    pub retry_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfillment_or_booking_sentinel() {
        let line = SupplierPayableLine {
            line_id: "L-1".into(),
            order_id: "ORD-1".into(),
            order_detail_id: "OD-1".into(),
            supplier_reference_id: "SUP-1".into(),
            fulfillment_instance_id: None,
            supplier_timeline_version: STANDALONE_VERSION,
            party_type: PartyType::Affiliate,
            party_id: "AFF-1".into(),
            party_name: None,
            obligation_type: "commission".into(),
            amount: 4694,
            amount_effect: AmountEffect::IncreasesPayable,
            currency: "IDR".into(),
            calculation: None,
            description: None,
            ingested_at: 0,
        };
        assert_eq!(line.fulfillment_or_booking(), BOOKING_LEVEL);
        assert!(line.is_standalone());
    }

    #[test]
    fn test_canonical_component_type_mapping() {
        assert_eq!(
            CanonicalComponentType::from_raw("RoomRate"),
            CanonicalComponentType::RoomRate
        );
        assert_eq!(
            CanonicalComponentType::from_raw("Markup"),
            CanonicalComponentType::Markup
        );
        assert_eq!(
            CanonicalComponentType::from_raw("LoyaltyAccrual"),
            CanonicalComponentType::Other
        );
    }

    #[test]
    fn test_version_family_tokens() {
        for family in [
            VersionFamily::Pricing,
            VersionFamily::Payment,
            VersionFamily::Supplier,
            VersionFamily::Refund,
            VersionFamily::Issuance,
        ] {
            assert_eq!(VersionFamily::parse(family.as_str()), Some(family));
        }
        assert_eq!(VersionFamily::parse("invoice"), None);
    }

    #[test]
    fn test_dimensions_serialize_key_sorted() {
        // serde_json maps are BTree-backed: canonical key order falls out
        // of re-serialization, which is what semantic IDs rely on.
        let mut dims = serde_json::Map::new();
        dims.insert("od".into(), Value::String("OD-001".into()));
        dims.insert("n".into(), Value::String("N1".into()));
        let serialized = serde_json::to_string(&Value::Object(dims)).unwrap();
        assert_eq!(serialized, r#"{"n":"N1","od":"OD-001"}"#);
    }
}
