//! PricingUpdated payload shapes
//!
//! Shared with RefundIssued, which reuses the component input shape with
//! refund lineage fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One pricing component as emitted by the pricing service
///
/// `component_type` is kept optional at the wire layer; the Identity
/// Builder rejects components without one (`IdentityError`), which routes
/// the whole event to the DLQ with a precise error instead of a generic
/// deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingComponentInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    /// Signed amount in minor units
    pub amount: i64,
    /// ISO-4217 code
    pub currency: String,
    /// Flat scalar → scalar map; canonicalized by the Identity Builder
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub dimensions: serde_json::Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_refund: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_of_component_semantic_id: Option<String>,
}

/// Event-level totals used for the sum cross-check (warning only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingTotals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_total: Option<i64>,
}

/// FX context attached to a detail context or supplier event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supply_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gbv_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_rate_supply: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_rate_record: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_rate_gbv: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_fx_rate: Option<String>,
}

/// Per-order-detail enrichment context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailContext {
    pub order_detail_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_context: Option<FxContext>,
}

/// PricingUpdated payload (`pricing.commerce.v1`)
///
/// Accepts both the legacy single `detail_context` and the current
/// `detail_contexts[]`; [`PricingUpdatedPayload::contexts`] lifts the
/// legacy shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingUpdatedPayload {
    pub components: Vec<PricingComponentInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<PricingTotals>,
    /// Legacy single-context form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_context: Option<DetailContext>,
    /// Current multi-context form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_contexts: Option<Vec<DetailContext>>,
    /// Producer-assigned pricing version; absent means registry-assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl PricingUpdatedPayload {
    /// All detail contexts, legacy shape lifted to the current one
    pub fn contexts(&self) -> Vec<&DetailContext> {
        match (&self.detail_contexts, &self.detail_context) {
            (Some(list), _) => list.iter().collect(),
            (None, Some(single)) => vec![single],
            (None, None) => Vec::new(),
        }
    }
}
