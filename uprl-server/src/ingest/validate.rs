//! Envelope shape validation
//!
//! First pipeline stage: turn a raw JSON value into a typed envelope with
//! resolved event-type / schema-version tokens and a parsed timestamp.
//! Everything that fails here is a `ValidationError → DLQ`; the pipeline
//! never panics on producer input.

use super::error::{IngestError, IngestResult};
use shared::event::{EventEnvelope, EventType, SchemaVersion};
use shared::util;
use serde_json::Value;

/// An envelope that passed shape validation
#[derive(Debug, Clone)]
pub struct ValidatedEnvelope {
    pub envelope: EventEnvelope,
    pub event_type: EventType,
    pub schema_version: SchemaVersion,
    /// `emitted_at` parsed to Unix milliseconds
    pub emitted_at: i64,
}

/// Validate the envelope of a raw inbound event
pub fn validate_envelope(raw: &Value) -> IngestResult<ValidatedEnvelope> {
    if !raw.is_object() {
        return Err(IngestError::Validation(
            "event must be a JSON object".to_string(),
        ));
    }

    let envelope: EventEnvelope = serde_json::from_value(raw.clone())
        .map_err(|e| IngestError::Validation(format!("malformed envelope: {e}")))?;

    if envelope.order_id.trim().is_empty() {
        return Err(IngestError::Validation("order_id must not be empty".into()));
    }

    let event_type = EventType::parse(&envelope.event_type).ok_or_else(|| {
        IngestError::Validation(format!("unknown event_type '{}'", envelope.event_type))
    })?;

    let schema_version = SchemaVersion::parse(&envelope.schema_version).ok_or_else(|| {
        IngestError::Validation(format!(
            "unknown schema_version '{}'",
            envelope.schema_version
        ))
    })?;

    if !schema_version.matches(event_type) {
        return Err(IngestError::Validation(format!(
            "schema_version '{}' does not belong to event_type '{}'",
            envelope.schema_version, envelope.event_type
        )));
    }

    let emitted_at = util::parse_iso_millis(&envelope.emitted_at).ok_or_else(|| {
        IngestError::Validation(format!(
            "emitted_at '{}' is not a valid ISO-8601 timestamp",
            envelope.emitted_at
        ))
    })?;

    Ok(ValidatedEnvelope {
        envelope,
        event_type,
        schema_version,
        emitted_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_event() -> Value {
        json!({
            "event_id": "evt-1",
            "event_type": "PricingUpdated",
            "schema_version": "pricing.commerce.v1",
            "order_id": "ORD-1",
            "emitted_at": "2024-06-01T10:00:00Z",
            "components": []
        })
    }

    #[test]
    fn test_valid_envelope() {
        let validated = validate_envelope(&base_event()).unwrap();
        assert_eq!(validated.event_type, EventType::PricingUpdated);
        assert_eq!(validated.schema_version, SchemaVersion::PricingCommerceV1);
        assert_eq!(validated.emitted_at, 1_717_236_000_000);
    }

    #[test]
    fn test_missing_order_id_rejected() {
        let mut raw = base_event();
        raw.as_object_mut().unwrap().remove("order_id");
        assert!(matches!(
            validate_envelope(&raw),
            Err(IngestError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_event_type_rejected() {
        let mut raw = base_event();
        raw["event_type"] = json!("CatalogUpdated");
        let err = validate_envelope(&raw).unwrap_err();
        assert!(err.to_string().contains("unknown event_type"));
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let mut raw = base_event();
        raw["schema_version"] = json!("payment.timeline.v1");
        let err = validate_envelope(&raw).unwrap_err();
        assert!(err.to_string().contains("does not belong"));
    }

    #[test]
    fn test_malformed_timestamp_rejected() {
        let mut raw = base_event();
        raw["emitted_at"] = json!("last tuesday");
        let err = validate_envelope(&raw).unwrap_err();
        assert!(err.to_string().contains("ISO-8601"));
    }

    #[test]
    fn test_supplier_alias_accepted() {
        let raw = json!({
            "event_type": "SupplierLifecycleEvent",
            "schema_version": "supplier.timeline.v2",
            "order_id": "ORD-1",
            "emitted_at": "2024-06-01T10:00:00Z"
        });
        let validated = validate_envelope(&raw).unwrap();
        assert_eq!(validated.event_type, EventType::SupplierLifecycle);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(validate_envelope(&json!([1, 2, 3])).is_err());
        assert!(validate_envelope(&json!("event")).is_err());
    }
}
