//! Latest-state views
//!
//! Four read-only derived views, each defined by `MAX(version)` over its
//! family's scope. Version determines recency, never arrival order: a row
//! ingested late still loses to a higher version already present.

use super::{ProjectionError, ProjectionResult};
use crate::store::FactStore;
use serde::Serialize;
use serde_json::Value;
use shared::fact::{
    PaymentTimelineFact, PricingComponentFact, RefundTimelineFact, SupplierTimelineFact,
    VersionFamily,
};
use std::collections::BTreeMap;

/// Everything a downstream consumer reads for one order
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub pricing_latest: Vec<PricingComponentFact>,
    pub payment_latest: Option<PaymentTimelineFact>,
    pub supplier_latest: Vec<SupplierTimelineFact>,
    pub refund_latest: Vec<RefundTimelineFact>,
}

/// Assemble the full order view
pub fn order_view(store: &FactStore, order_id: &str) -> ProjectionResult<OrderView> {
    Ok(OrderView {
        pricing_latest: pricing_latest(store, order_id)?,
        payment_latest: payment_latest(store, order_id)?,
        supplier_latest: supplier_latest(store, order_id)?,
        refund_latest: refund_latest(store, order_id)?,
    })
}

/// Latest pricing row per `(order_id, component_semantic_id)`
///
/// Highest version wins; ties (which a correct producer never creates)
/// break on `emitted_at`, then `ingested_at`.
pub fn pricing_latest(
    store: &FactStore,
    order_id: &str,
) -> ProjectionResult<Vec<PricingComponentFact>> {
    let rows = store.pricing_components_for_order(order_id)?;
    let mut by_semantic_id: BTreeMap<String, PricingComponentFact> = BTreeMap::new();
    for row in rows {
        match by_semantic_id.get(&row.component_semantic_id) {
            Some(current)
                if (current.version, current.emitted_at, current.ingested_at)
                    >= (row.version, row.emitted_at, row.ingested_at) => {}
            _ => {
                by_semantic_id.insert(row.component_semantic_id.clone(), row);
            }
        }
    }
    Ok(by_semantic_id.into_values().collect())
}

/// Latest payment row per order
pub fn payment_latest(
    store: &FactStore,
    order_id: &str,
) -> ProjectionResult<Option<PaymentTimelineFact>> {
    // Rows come back in ascending version order
    Ok(store.payment_rows_for_order(order_id)?.into_iter().last())
}

/// Latest supplier row per payable instance key
pub fn supplier_latest(
    store: &FactStore,
    order_id: &str,
) -> ProjectionResult<Vec<SupplierTimelineFact>> {
    let rows = store.supplier_rows_for_order(order_id)?;
    let mut by_instance: BTreeMap<(String, String, String), SupplierTimelineFact> = BTreeMap::new();
    for row in rows {
        let key = (
            row.order_detail_id.clone(),
            row.supplier_reference_id.clone(),
            row.fulfillment_or_booking().to_string(),
        );
        match by_instance.get(&key) {
            Some(current)
                if current.supplier_timeline_version >= row.supplier_timeline_version => {}
            _ => {
                by_instance.insert(key, row);
            }
        }
    }
    Ok(by_instance.into_values().collect())
}

/// Latest refund row per `(order_id, refund_id)`
pub fn refund_latest(
    store: &FactStore,
    order_id: &str,
) -> ProjectionResult<Vec<RefundTimelineFact>> {
    let rows = store.refund_rows_for_order(order_id)?;
    let mut by_refund: BTreeMap<String, RefundTimelineFact> = BTreeMap::new();
    for row in rows {
        match by_refund.get(&row.refund_id) {
            Some(current) if current.refund_timeline_version >= row.refund_timeline_version => {}
            _ => {
                by_refund.insert(row.refund_id.clone(), row);
            }
        }
    }
    Ok(by_refund.into_values().collect())
}

/// Per-family history read by inclusive version range
pub fn history(
    store: &FactStore,
    order_id: &str,
    family: VersionFamily,
    from_version: u64,
    to_version: u64,
) -> ProjectionResult<Vec<Value>> {
    let rows = match family {
        VersionFamily::Pricing => store
            .pricing_components_in_range(order_id, from_version, to_version)?
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>(),
        VersionFamily::Payment => store
            .payment_rows_in_range(order_id, from_version, to_version)?
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>(),
        VersionFamily::Supplier => store
            .supplier_rows_for_order(order_id)?
            .iter()
            .filter(|r| {
                r.supplier_timeline_version >= from_version
                    && r.supplier_timeline_version <= to_version
            })
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>(),
        VersionFamily::Refund => store
            .refund_rows_for_order(order_id)?
            .iter()
            .filter(|r| {
                r.refund_timeline_version >= from_version && r.refund_timeline_version <= to_version
            })
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>(),
        // Reserved family: nothing is ever written
        VersionFamily::Issuance => Ok(Vec::new()),
    };
    rows.map_err(|e| ProjectionError::Storage(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::fact::CanonicalComponentType;

    fn pricing_row(semantic_id: &str, version: u64, amount: i64) -> PricingComponentFact {
        PricingComponentFact {
            component_instance_id: format!("inst-{semantic_id}-{version}"),
            component_semantic_id: semantic_id.to_string(),
            order_id: "ORD-1".to_string(),
            pricing_snapshot_id: format!("snap-{version}"),
            version,
            component_type: "RoomRate".to_string(),
            canonical_component_type: CanonicalComponentType::RoomRate,
            amount,
            currency: "IDR".to_string(),
            dimensions: json!({}),
            order_detail_id: None,
            entity_context: None,
            fx_context: None,
            description: None,
            is_refund: false,
            refund_of_component_semantic_id: None,
            refund_id: None,
            emitted_at: 1_700_000_000_000,
            ingested_at: 1_700_000_000_500,
        }
    }

    #[test]
    fn test_pricing_latest_per_semantic_id() {
        let store = FactStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .append_pricing_component(&txn, &pricing_row("cs-a", 1, 100))
            .unwrap();
        store
            .append_pricing_component(&txn, &pricing_row("cs-a", 2, 200))
            .unwrap();
        store
            .append_pricing_component(&txn, &pricing_row("cs-b", 1, 50))
            .unwrap();
        txn.commit().unwrap();

        let latest = pricing_latest(&store, "ORD-1").unwrap();
        assert_eq!(latest.len(), 2);
        let a = latest
            .iter()
            .find(|r| r.component_semantic_id == "cs-a")
            .unwrap();
        assert_eq!(a.version, 2);
        assert_eq!(a.amount, 200);
    }

    #[test]
    fn test_version_beats_arrival_order() {
        let store = FactStore::open_in_memory().unwrap();
        // v3 arrives before v2
        let txn = store.begin_write().unwrap();
        store
            .append_pricing_component(&txn, &pricing_row("cs-a", 3, 300))
            .unwrap();
        txn.commit().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .append_pricing_component(&txn, &pricing_row("cs-a", 2, 200))
            .unwrap();
        txn.commit().unwrap();

        let latest = pricing_latest(&store, "ORD-1").unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].version, 3);
    }

    #[test]
    fn test_empty_order_view() {
        let store = FactStore::open_in_memory().unwrap();
        let view = order_view(&store, "ORD-missing").unwrap();
        assert!(view.pricing_latest.is_empty());
        assert!(view.payment_latest.is_none());
        assert!(view.supplier_latest.is_empty());
        assert!(view.refund_latest.is_empty());
    }

    #[test]
    fn test_history_range_read() {
        let store = FactStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        for version in 1..=5 {
            store
                .append_pricing_component(&txn, &pricing_row("cs-a", version, 100))
                .unwrap();
        }
        txn.commit().unwrap();

        let rows = history(&store, "ORD-1", VersionFamily::Pricing, 2, 4).unwrap();
        assert_eq!(rows.len(), 3);

        let none = history(&store, "ORD-1", VersionFamily::Issuance, 1, 10).unwrap();
        assert!(none.is_empty());
    }
}
