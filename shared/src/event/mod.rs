//! Inbound event wire format
//!
//! # Structure
//!
//! - [`envelope`] - the shared envelope, event-type / schema-version tokens
//! - [`pricing`] - PricingUpdated payload (components, detail contexts)
//! - [`payment`] - PaymentLifecycle payload (flat + nested forms, instruments)
//! - [`supplier`] - SupplierLifecycle v1/v2 and PartnerAdjustment payloads
//! - [`refund`] - RefundIssued and RefundLifecycle payloads

pub mod envelope;
pub mod payment;
pub mod pricing;
pub mod refund;
pub mod supplier;

pub use envelope::{EventEnvelope, EventType, SchemaVersion};
pub use payment::{
    Instrument, InstrumentType, PaymentInfo, PaymentLifecyclePayload, PaymentMethod, PaymentStatus,
};
pub use pricing::{
    DetailContext, FxContext, PricingComponentInput, PricingTotals, PricingUpdatedPayload,
};
pub use refund::{RefundIssuedPayload, RefundLifecyclePayload};
pub use supplier::{
    AmountBasis, AmountEffect, ObligationLineInput, PartnerAdjustmentPayload, Party, PartyType,
    SupplierLifecyclePayload, SupplierStatus,
};
