//! SupplierLifecycle and PartnerAdjustment payload shapes
//!
//! `supplier.timeline.v1` carries a single supplier obligation;
//! `supplier.timeline.v2` adds multi-party obligation lines and the
//! fulfillment-instance dimension. Validation of which fields a schema
//! version may carry lives in the ingestion pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supplier lifecycle status (closed wire set)
///
/// Persisted as the raw string so that rows written by newer schema
/// revisions still project; the read side falls back to a warned default
/// for tokens it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplierStatus {
    Confirmed,
    Issued,
    Invoiced,
    Settled,
    CancelledWithFee,
    CancelledNoFee,
    Voided,
}

impl SupplierStatus {
    /// Parse a wire token (`ISSUED` is upper-cased on the wire)
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Confirmed" => Some(Self::Confirmed),
            "ISSUED" => Some(Self::Issued),
            "Invoiced" => Some(Self::Invoiced),
            "Settled" => Some(Self::Settled),
            "CancelledWithFee" => Some(Self::CancelledWithFee),
            "CancelledNoFee" => Some(Self::CancelledNoFee),
            "Voided" => Some(Self::Voided),
            _ => None,
        }
    }

    /// Canonical wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed",
            Self::Issued => "ISSUED",
            Self::Invoiced => "Invoiced",
            Self::Settled => "Settled",
            Self::CancelledWithFee => "CancelledWithFee",
            Self::CancelledNoFee => "CancelledNoFee",
            Self::Voided => "Voided",
        }
    }
}

/// Basis the supplier amount is quoted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmountBasis {
    Gross,
    Net,
    RedemptionTriggered,
}

impl AmountBasis {
    /// Wire token (kebab-case)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gross => "gross",
            Self::Net => "net",
            Self::RedemptionTriggered => "redemption-triggered",
        }
    }
}

/// Obligated party kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyType {
    Supplier,
    Affiliate,
    TaxAuthority,
    Internal,
}

/// Directional effect of an obligation line on the payable total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmountEffect {
    IncreasesPayable,
    DecreasesPayable,
}

impl AmountEffect {
    /// Projection sign: +1 increases, -1 decreases
    pub fn sign(&self) -> i64 {
        match self {
            Self::IncreasesPayable => 1,
            Self::DecreasesPayable => -1,
        }
    }
}

/// One obligation line under a party
///
/// `amount` is an unsigned magnitude; the direction lives entirely in
/// `amount_effect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObligationLineInput {
    pub obligation_type: String,
    pub amount: i64,
    pub currency: String,
    pub amount_effect: AmountEffect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A party with its obligation lines (v2 only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub party_type: PartyType,
    pub party_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_name: Option<String>,
    #[serde(default)]
    pub lines: Vec<ObligationLineInput>,
}

/// SupplierLifecycle payload (`supplier.timeline.v1` / `.v2`)
///
/// `parties: None` is a legacy event with implicit empty;
/// `parties: Some([])` is an intentional no-op that leaves prior
/// obligations effective through projection. The distinction is why this
/// field is `Option<Vec<_>>` rather than a defaulted `Vec`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierLifecyclePayload {
    pub order_detail_id: String,
    pub status: String,
    pub supplier_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment_instance_id: Option<String>,
    /// Amount due to the supplier, minor units
    pub amount_due: i64,
    pub amount_basis: AmountBasis,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parties: Option<Vec<Party>>,
    /// Producer-assigned version; absent means registry-assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_timeline_version: Option<u64>,
}

impl SupplierLifecyclePayload {
    /// The reference the payable side is keyed on: `supplier_ref` when the
    /// producer sent one, the supplier id otherwise
    pub fn supplier_reference_id(&self) -> &str {
        self.supplier_ref.as_deref().unwrap_or(&self.supplier_id)
    }
}

/// PartnerAdjustment payload (`partner.adjustment.v1`)
///
/// A standalone obligation line written with version -1, unattached to any
/// supplier timeline event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerAdjustmentPayload {
    pub order_detail_id: String,
    pub supplier_reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment_instance_id: Option<String>,
    pub party_type: PartyType,
    pub party_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_name: Option<String>,
    pub obligation_type: String,
    pub amount: i64,
    pub amount_effect: AmountEffect,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_tokens() {
        assert_eq!(SupplierStatus::parse("ISSUED"), Some(SupplierStatus::Issued));
        assert_eq!(SupplierStatus::parse("Issued"), None);
        assert_eq!(
            SupplierStatus::parse("CancelledWithFee"),
            Some(SupplierStatus::CancelledWithFee)
        );
        assert_eq!(SupplierStatus::parse("Unknown"), None);
        assert_eq!(SupplierStatus::Issued.as_str(), "ISSUED");
    }

    #[test]
    fn test_amount_effect_serde_and_sign() {
        let effect: AmountEffect = serde_json::from_str("\"INCREASES_PAYABLE\"").unwrap();
        assert_eq!(effect, AmountEffect::IncreasesPayable);
        assert_eq!(effect.sign(), 1);
        assert_eq!(AmountEffect::DecreasesPayable.sign(), -1);
        assert_eq!(
            serde_json::to_string(&AmountEffect::DecreasesPayable).unwrap(),
            "\"DECREASES_PAYABLE\""
        );
    }

    #[test]
    fn test_amount_basis_kebab_case() {
        let basis: AmountBasis = serde_json::from_str("\"redemption-triggered\"").unwrap();
        assert_eq!(basis, AmountBasis::RedemptionTriggered);
        assert_eq!(
            serde_json::from_str::<AmountBasis>("\"gross\"").unwrap(),
            AmountBasis::Gross
        );
    }

    #[test]
    fn test_absent_vs_empty_parties() {
        let legacy: SupplierLifecyclePayload = serde_json::from_value(json!({
            "order_detail_id": "OD-1",
            "status": "Confirmed",
            "supplier_id": "SUP-1",
            "amount_due": 100000,
            "amount_basis": "net",
            "currency": "IDR"
        }))
        .unwrap();
        assert!(legacy.parties.is_none());

        let carry_forward: SupplierLifecyclePayload = serde_json::from_value(json!({
            "order_detail_id": "OD-1",
            "status": "CancelledWithFee",
            "supplier_id": "SUP-1",
            "amount_due": 0,
            "amount_basis": "net",
            "currency": "IDR",
            "parties": []
        }))
        .unwrap();
        assert_eq!(carry_forward.parties.map(|p| p.len()), Some(0));
    }

    #[test]
    fn test_supplier_reference_prefers_ref() {
        let payload: SupplierLifecyclePayload = serde_json::from_value(json!({
            "order_detail_id": "OD-1",
            "status": "Confirmed",
            "supplier_id": "SUP-1",
            "supplier_ref": "REF-77",
            "amount_due": 100000,
            "amount_basis": "gross",
            "currency": "IDR"
        }))
        .unwrap();
        assert_eq!(payload.supplier_reference_id(), "REF-77");
    }

    #[test]
    fn test_party_type_screaming_snake() {
        let party: PartyType = serde_json::from_str("\"TAX_AUTHORITY\"").unwrap();
        assert_eq!(party, PartyType::TaxAuthority);
    }
}
