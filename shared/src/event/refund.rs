//! RefundIssued and RefundLifecycle payload shapes

use super::pricing::{DetailContext, PricingComponentInput, PricingTotals};
use serde::{Deserialize, Serialize};

/// RefundIssued payload (`refund.components.v1`)
///
/// Refund components write into the pricing family; every component must
/// name the semantic id it refunds and carry a negative amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundIssuedPayload {
    pub refund_id: String,
    pub components: Vec<PricingComponentInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<PricingTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_context: Option<DetailContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_contexts: Option<Vec<DetailContext>>,
    /// Producer-assigned pricing version; absent means registry-assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl RefundIssuedPayload {
    /// All detail contexts, legacy shape lifted
    pub fn contexts(&self) -> Vec<&DetailContext> {
        match (&self.detail_contexts, &self.detail_context) {
            (Some(list), _) => list.iter().collect(),
            (None, Some(single)) => vec![single],
            (None, None) => Vec::new(),
        }
    }
}

/// RefundLifecycle payload (`refund.lifecycle.v1`), a status-only event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundLifecyclePayload {
    pub refund_id: String,
    pub status: String,
    /// Refunded amount in minor units (non-positive by convention, stored
    /// as emitted)
    pub refund_amount: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Producer-assigned version; absent means registry-assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_timeline_version: Option<u64>,
}
