//! Component identity builder
//!
//! Pricing and refund components carry a dual identity:
//!
//! - **Semantic ID**: deterministic over `(order_id, refund_id?, dimensions,
//!   component_type)`, stable across re-emissions regardless of dimension
//!   insertion order. This is the lineage anchor repricing and refunds hang
//!   off.
//! - **Instance ID**: unique per appearance of a semantic ID in a specific
//!   pricing snapshot, derived by hashing the semantic ID with the snapshot
//!   ID.
//!
//! CPU-only; never touches storage.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Identity construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("component_type is missing")]
    MissingComponentType,

    #[error("dimension '{0}' has a non-scalar value")]
    NonScalarDimension(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Render one dimension value as its canonical string form
///
/// Scalars only; `None` means the value is dropped (null or empty string),
/// `Err` means the dimension is structurally invalid.
fn canonical_scalar(key: &str, value: &Value) -> IdentityResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => {
            Err(IdentityError::NonScalarDimension(key.to_string()))
        }
    }
}

/// Build the deterministic semantic ID of a component
///
/// Dimensions are canonicalized by sorting keys lexicographically and
/// concatenating `key-value` pairs in that order; null and empty values are
/// dropped. Components with no surviving dimensions are order-level:
/// `cs-{order_id}[-{refund_id}]-{component_type}`.
pub fn semantic_id(
    order_id: &str,
    refund_id: Option<&str>,
    dimensions: &Map<String, Value>,
    component_type: Option<&str>,
) -> IdentityResult<String> {
    let component_type = match component_type {
        Some(ct) if !ct.trim().is_empty() => ct,
        _ => return Err(IdentityError::MissingComponentType),
    };

    // serde_json maps iterate in key order already; collect + sort keeps
    // this correct even with the preserve_order feature enabled somewhere
    // in the dependency graph.
    let mut keys: Vec<&String> = dimensions.keys().collect();
    keys.sort();

    let mut parts: Vec<String> = Vec::with_capacity(keys.len() * 2 + 3);
    parts.push(format!("cs-{}", order_id));
    if let Some(refund_id) = refund_id {
        parts.push(refund_id.to_string());
    }
    for key in keys {
        if let Some(rendered) = canonical_scalar(key, &dimensions[key.as_str()])? {
            parts.push(key.clone());
            parts.push(rendered);
        }
    }
    parts.push(component_type.to_string());

    Ok(parts.join("-"))
}

/// Build the snapshot-unique instance ID of a component
///
/// Truncated SHA-256 over `semantic_id || "\0" || pricing_snapshot_id`,
/// rendered as 32 hex characters.
pub fn instance_id(semantic_id: &str, pricing_snapshot_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(semantic_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(pricing_snapshot_id.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dims(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_semantic_id_sorted_key_value_pairs() {
        let id = semantic_id(
            "ORD-9001",
            None,
            &dims(json!({"od": "OD-001", "n": "N2"})),
            Some("RoomRate"),
        )
        .unwrap();
        // 'n' sorts before 'od'
        assert_eq!(id, "cs-ORD-9001-n-N2-od-OD-001-RoomRate");
    }

    #[test]
    fn test_semantic_id_stable_under_insertion_order() {
        let mut forward = Map::new();
        forward.insert("od".into(), json!("OD-001"));
        forward.insert("n".into(), json!("N1"));

        let mut reverse = Map::new();
        reverse.insert("n".into(), json!("N1"));
        reverse.insert("od".into(), json!("OD-001"));

        let a = semantic_id("ORD-9001", None, &forward, Some("RoomRate")).unwrap();
        let b = semantic_id("ORD-9001", None, &reverse, Some("RoomRate")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_semantic_id_empty_dimensions_is_order_level() {
        let id = semantic_id("ORD-9001", None, &Map::new(), Some("Markup")).unwrap();
        assert_eq!(id, "cs-ORD-9001-Markup");
    }

    #[test]
    fn test_semantic_id_drops_null_and_empty_values() {
        let id = semantic_id(
            "ORD-9001",
            None,
            &dims(json!({"od": "OD-001", "note": null, "tag": ""})),
            Some("Tax"),
        )
        .unwrap();
        assert_eq!(id, "cs-ORD-9001-od-OD-001-Tax");
    }

    #[test]
    fn test_semantic_id_carries_refund_id() {
        let id = semantic_id(
            "ORD-9001",
            Some("RF-1"),
            &dims(json!({"od": "OD-001"})),
            Some("RoomRate"),
        )
        .unwrap();
        assert_eq!(id, "cs-ORD-9001-RF-1-od-OD-001-RoomRate");
    }

    #[test]
    fn test_semantic_id_renders_number_and_bool_scalars() {
        let id = semantic_id(
            "ORD-1",
            None,
            &dims(json!({"night": 2, "late_checkout": true})),
            Some("Fee"),
        )
        .unwrap();
        assert_eq!(id, "cs-ORD-1-late_checkout-true-night-2-Fee");
    }

    #[test]
    fn test_missing_component_type_rejected() {
        assert_eq!(
            semantic_id("ORD-1", None, &Map::new(), None),
            Err(IdentityError::MissingComponentType)
        );
        assert_eq!(
            semantic_id("ORD-1", None, &Map::new(), Some("  ")),
            Err(IdentityError::MissingComponentType)
        );
    }

    #[test]
    fn test_non_scalar_dimension_rejected() {
        let err = semantic_id(
            "ORD-1",
            None,
            &dims(json!({"od": {"nested": true}})),
            Some("Tax"),
        )
        .unwrap_err();
        assert_eq!(err, IdentityError::NonScalarDimension("od".into()));

        let err = semantic_id("ORD-1", None, &dims(json!({"od": [1, 2]})), Some("Tax"))
            .unwrap_err();
        assert_eq!(err, IdentityError::NonScalarDimension("od".into()));
    }

    #[test]
    fn test_instance_id_shape_and_determinism() {
        let a = instance_id("cs-ORD-1-RoomRate", "snap-1");
        let b = instance_id("cs-ORD-1-RoomRate", "snap-1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_instance_id_varies_with_snapshot() {
        let a = instance_id("cs-ORD-1-RoomRate", "snap-1");
        let b = instance_id("cs-ORD-1-RoomRate", "snap-2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_instance_id_separator_prevents_ambiguity() {
        // "ab" + "c" must not collide with "a" + "bc"
        let a = instance_id("ab", "c");
        let b = instance_id("a", "bc");
        assert_ne!(a, b);
    }
}
