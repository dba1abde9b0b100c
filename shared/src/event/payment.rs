//! PaymentLifecycle payload shapes
//!
//! The producer historically emitted payment fields flat on the event;
//! current events nest them under `payment`. Both shapes are accepted and
//! canonicalized to the nested form before normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payment lifecycle status (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Authorized,
    Captured,
    Refunded,
    Settled,
}

/// How the customer paid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

/// Instrument discriminator (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstrumentType {
    Va,
    Card,
    Ewallet,
    Bnpl,
    Qr,
    Loyalty,
}

impl InstrumentType {
    /// Name of the sub-payload field this type selects
    pub fn payload_field(&self) -> &'static str {
        match self {
            Self::Va => "va",
            Self::Card => "card",
            Self::Ewallet => "ewallet",
            Self::Bnpl => "bnpl",
            Self::Qr => "qr",
            Self::Loyalty => "loyalty",
        }
    }
}

/// Payment instrument with one typed sub-payload
///
/// At most one sub-payload may be populated, and when one is, it must be
/// the one selected by `type`. Multi-populated instruments are rejected at
/// validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    #[serde(rename = "type")]
    pub instrument_type: InstrumentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub va: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ewallet: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bnpl: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loyalty: Option<Value>,
}

impl Instrument {
    /// Field names of all populated sub-payloads
    pub fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.va.is_some() {
            fields.push("va");
        }
        if self.card.is_some() {
            fields.push("card");
        }
        if self.ewallet.is_some() {
            fields.push("ewallet");
        }
        if self.bnpl.is_some() {
            fields.push("bnpl");
        }
        if self.qr.is_some() {
            fields.push("qr");
        }
        if self.loyalty.is_some() {
            fields.push("loyalty");
        }
        fields
    }

    /// Single-population rule: zero sub-payloads, or exactly the one the
    /// discriminator selects
    pub fn validate(&self) -> Result<(), String> {
        let populated = self.populated_fields();
        match populated.as_slice() {
            [] => Ok(()),
            [field] if *field == self.instrument_type.payload_field() => Ok(()),
            [field] => Err(format!(
                "instrument sub-payload '{}' does not match type '{}'",
                field,
                self.instrument_type.payload_field()
            )),
            many => Err(format!(
                "instrument has multiple sub-payloads populated: {}",
                many.join(", ")
            )),
        }
    }
}

/// The canonical (nested) payment object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_amount_total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Instrument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bnpl_plan: Option<Value>,
}

/// PaymentLifecycle payload (`payment.timeline.v1`), both wire shapes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLifecyclePayload {
    /// Nested (current) form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentInfo>,

    // Legacy flat form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_amount_total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Instrument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bnpl_plan: Option<Value>,

    /// Producer-assigned timeline version; absent means registry-assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline_version: Option<u64>,
}

impl PaymentLifecyclePayload {
    /// Canonicalize to the nested form
    ///
    /// The nested object wins when present; otherwise the flat fields are
    /// lifted. Missing status / method / currency in the effective shape is
    /// a validation failure.
    pub fn canonicalize(self) -> Result<PaymentInfo, String> {
        if let Some(payment) = self.payment {
            return Ok(payment);
        }
        let status = self.status.ok_or("payment.status is required")?;
        let payment_method = self.payment_method.ok_or("payment.payment_method is required")?;
        let currency = self.currency.ok_or("payment.currency is required")?;
        Ok(PaymentInfo {
            status,
            payment_method,
            currency,
            authorized_amount: self.authorized_amount,
            captured_amount: self.captured_amount,
            captured_amount_total: self.captured_amount_total,
            instrument: self.instrument,
            bnpl_plan: self.bnpl_plan,
        })
    }
}
