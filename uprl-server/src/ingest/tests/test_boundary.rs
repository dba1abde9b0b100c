use super::*;
use crate::projection::payables;
use crate::store::DlqFilter;
use shared::fact::DlqErrorKind;

// ========================================================================
// Boundary behaviors and failure dispositions
// ========================================================================

#[tokio::test]
async fn test_empty_components_dead_lettered() {
    let ingestor = create_test_ingestor();

    let kind = ingest_dead_lettered(
        &ingestor,
        pricing_event("evt-1", "ORD-1", json!([])),
    )
    .await;
    assert_eq!(kind, DlqErrorKind::ValidationError);

    // The entry carries the verbatim raw event for replay
    let entries = ingestor.store().list_dlq(&DlqFilter::default()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].raw_event["event_id"], json!("evt-1"));
    assert_eq!(entries[0].order_id.as_deref(), Some("ORD-1"));

    // The pipeline keeps going
    ingest_committed(
        &ingestor,
        pricing_event(
            "evt-2",
            "ORD-1",
            json!([{"component_type": "Tax", "amount": 100, "currency": "IDR"}]),
        ),
    )
    .await;
}

#[tokio::test]
async fn test_missing_required_field_dead_lettered() {
    let ingestor = create_test_ingestor();
    let kind = ingest_dead_lettered(
        &ingestor,
        json!({
            "event_type": "PricingUpdated",
            "schema_version": "pricing.commerce.v1",
            "emitted_at": "2024-06-01T10:00:00Z"
        }),
    )
    .await;
    assert_eq!(kind, DlqErrorKind::ValidationError);
}

#[tokio::test]
async fn test_unknown_event_type_dead_lettered() {
    let ingestor = create_test_ingestor();
    let kind = ingest_dead_lettered(
        &ingestor,
        json!({
            "event_type": "CatalogUpdated",
            "schema_version": "pricing.commerce.v1",
            "order_id": "ORD-1",
            "emitted_at": "2024-06-01T10:00:00Z"
        }),
    )
    .await;
    assert_eq!(kind, DlqErrorKind::ValidationError);
}

#[tokio::test]
async fn test_non_scalar_dimension_is_identity_error() {
    let ingestor = create_test_ingestor();
    let kind = ingest_dead_lettered(
        &ingestor,
        pricing_event(
            "evt-1",
            "ORD-1",
            json!([{"component_type": "Tax", "amount": 100, "currency": "IDR",
                    "dimensions": {"od": {"nested": true}}}]),
        ),
    )
    .await;
    assert_eq!(kind, DlqErrorKind::IdentityError);
}

#[tokio::test]
async fn test_empty_fulfillment_id_rejected_null_is_distinct() {
    let ingestor = create_test_ingestor();

    // Empty string is rejected outright
    let kind = ingest_dead_lettered(
        &ingestor,
        supplier_event("evt-1", "ORD-1", "OD-1", Some(""), "Confirmed", 100, json!([])),
    )
    .await;
    assert_eq!(kind, DlqErrorKind::ValidationError);

    // null (absent) and a non-empty value are two distinct instances
    ingest_committed(
        &ingestor,
        supplier_event("evt-2", "ORD-1", "OD-1", None, "Confirmed", 100, json!([])),
    )
    .await;
    ingest_committed(
        &ingestor,
        supplier_event(
            "evt-3",
            "ORD-1",
            "OD-1",
            Some("ticket-1"),
            "Confirmed",
            200,
            json!([]),
        ),
    )
    .await;

    let instances = payables::effective_payables(ingestor.store(), "ORD-1").unwrap();
    assert_eq!(instances.len(), 2);
}

#[tokio::test]
async fn test_empty_parties_carries_forward_prior_lines() {
    let ingestor = create_test_ingestor();

    ingest_committed(
        &ingestor,
        supplier_event(
            "evt-1",
            "ORD-1",
            "OD-1",
            None,
            "ISSUED",
            127_500,
            json!([affiliate_party(json!([
                {"obligation_type": "commission", "amount": 4694, "currency": "IDR",
                 "amount_effect": "INCREASES_PAYABLE"}
            ]))]),
        ),
    )
    .await;

    // parties = [] is an intentional no-op: nothing changed
    ingest_committed(
        &ingestor,
        supplier_event("evt-2", "ORD-1", "OD-1", None, "ISSUED", 127_500, json!([])),
    )
    .await;

    let instances = payables::effective_payables(ingestor.store(), "ORD-1").unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].obligations.len(), 1);
    assert_eq!(instances[0].total, 127_500 + 4694);
}

#[tokio::test]
async fn test_idempotent_redelivery() {
    let ingestor = create_test_ingestor();
    let event = pricing_event(
        "evt-same",
        "ORD-1",
        json!([{"component_type": "Tax", "amount": 100, "currency": "IDR"}]),
    );

    ingest_committed(&ingestor, event.clone()).await;
    let stats_after_first = ingestor.store().stats().unwrap();

    // Redelivery is skipped silently
    for _ in 0..3 {
        match ingestor.ingest(event.clone()).await {
            IngestOutcome::Duplicate { event_id } => assert_eq!(event_id, "evt-same"),
            other => panic!("expected Duplicate, got {:?}", other),
        }
    }

    let stats_after_redelivery = ingestor.store().stats().unwrap();
    assert_eq!(
        stats_after_first.pricing_components,
        stats_after_redelivery.pricing_components
    );
    assert_eq!(
        stats_after_first.ingested_events,
        stats_after_redelivery.ingested_events
    );
}

#[tokio::test]
async fn test_idempotency_key_fallback() {
    let ingestor = create_test_ingestor();
    let mut event = pricing_event(
        "unused",
        "ORD-1",
        json!([{"component_type": "Tax", "amount": 100, "currency": "IDR"}]),
    );
    event.as_object_mut().unwrap().remove("event_id");
    event["idempotency_key"] = json!("idem-1");

    ingest_committed(&ingestor, event.clone()).await;
    match ingestor.ingest(event).await {
        IngestOutcome::Duplicate { event_id } => assert_eq!(event_id, "idem-1"),
        other => panic!("expected Duplicate, got {:?}", other),
    }
}

#[tokio::test]
async fn test_explicit_duplicate_version_dead_lettered() {
    let ingestor = create_test_ingestor();

    let mut first = pricing_event(
        "evt-1",
        "ORD-1",
        json!([{"component_type": "Tax", "amount": 100, "currency": "IDR"}]),
    );
    first["version"] = json!(2);
    ingest_committed(&ingestor, first).await;

    let mut second = pricing_event(
        "evt-2",
        "ORD-1",
        json!([{"component_type": "Fee", "amount": 50, "currency": "IDR"}]),
    );
    second["version"] = json!(2);
    let kind = ingest_dead_lettered(&ingestor, second).await;
    assert_eq!(kind, DlqErrorKind::ValidationError);

    // The first row is untouched
    let facts = ingestor
        .store()
        .pricing_components_for_order("ORD-1")
        .unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].component_type, "Tax");
}

#[tokio::test]
async fn test_version_gap_tolerated() {
    let ingestor = create_test_ingestor();

    // v1 then v3; the gap is logged, never backfilled, and the next
    // registry-assigned version continues after the max.
    let mut v1 = pricing_event(
        "evt-1",
        "ORD-1",
        json!([{"component_type": "Tax", "amount": 100, "currency": "IDR"}]),
    );
    v1["version"] = json!(1);
    ingest_committed(&ingestor, v1).await;

    let mut v3 = pricing_event(
        "evt-3",
        "ORD-1",
        json!([{"component_type": "Tax", "amount": 300, "currency": "IDR"}]),
    );
    v3["version"] = json!(3);
    ingest_committed(&ingestor, v3).await;

    ingest_committed(
        &ingestor,
        pricing_event(
            "evt-4",
            "ORD-1",
            json!([{"component_type": "Tax", "amount": 400, "currency": "IDR"}]),
        ),
    )
    .await;

    let versions: Vec<u64> = ingestor
        .store()
        .pricing_components_for_order("ORD-1")
        .unwrap()
        .iter()
        .map(|f| f.version)
        .collect();
    assert_eq!(versions, vec![1, 3, 4]);
}

#[tokio::test]
async fn test_versions_strictly_increasing_per_scope() {
    let ingestor = create_test_ingestor();

    for i in 0..5 {
        ingest_committed(
            &ingestor,
            pricing_event(
                &format!("evt-{i}"),
                "ORD-1",
                json!([{"component_type": "Tax", "amount": 100, "currency": "IDR"}]),
            ),
        )
        .await;
    }
    // A different order versions independently
    ingest_committed(
        &ingestor,
        pricing_event(
            "evt-other",
            "ORD-2",
            json!([{"component_type": "Tax", "amount": 100, "currency": "IDR"}]),
        ),
    )
    .await;

    let versions: Vec<u64> = ingestor
        .store()
        .pricing_components_for_order("ORD-1")
        .unwrap()
        .iter()
        .map(|f| f.version)
        .collect();
    assert_eq!(versions, vec![1, 2, 3, 4, 5]);

    let other: Vec<u64> = ingestor
        .store()
        .pricing_components_for_order("ORD-2")
        .unwrap()
        .iter()
        .map(|f| f.version)
        .collect();
    assert_eq!(other, vec![1]);
}

#[tokio::test]
async fn test_concurrent_same_scope_events_serialize() {
    let ingestor = create_test_ingestor();

    let mut handles = Vec::new();
    for i in 0..8 {
        let ingestor = ingestor.clone();
        handles.push(tokio::spawn(async move {
            ingestor
                .ingest(pricing_event(
                    &format!("evt-{i}"),
                    "ORD-1",
                    json!([{"component_type": "Tax", "amount": 100, "currency": "IDR"}]),
                ))
                .await
        }));
    }
    for handle in handles {
        match handle.await.unwrap() {
            IngestOutcome::Committed { .. } => {}
            other => panic!("expected Committed, got {:?}", other),
        }
    }

    // No duplicates, no gaps, strictly increasing
    let mut versions: Vec<u64> = ingestor
        .store()
        .pricing_components_for_order("ORD-1")
        .unwrap()
        .iter()
        .map(|f| f.version)
        .collect();
    versions.sort_unstable();
    assert_eq!(versions, (1..=8).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_legacy_flat_payment_and_detail_context() {
    let ingestor = create_test_ingestor();

    // Flat payment shape
    ingest_committed(
        &ingestor,
        json!({
            "event_id": "evt-p1",
            "event_type": "PaymentLifecycle",
            "schema_version": "payment.timeline.v1",
            "order_id": "ORD-1",
            "emitted_at": "2024-06-01T10:00:00Z",
            "status": "Captured",
            "payment_method": {"channel": "online"},
            "currency": "IDR",
            "captured_amount": 100
        }),
    )
    .await;

    // Legacy single detail_context resolves onto components
    ingest_committed(
        &ingestor,
        json!({
            "event_id": "evt-pr1",
            "event_type": "PricingUpdated",
            "schema_version": "pricing.commerce.v1",
            "order_id": "ORD-1",
            "emitted_at": "2024-06-01T10:00:00Z",
            "detail_context": {"order_detail_id": "OD-1",
                               "entity_context": {"legal_entity": "PT-X"}},
            "components": [{"component_type": "RoomRate", "amount": 100, "currency": "IDR",
                            "dimensions": {"order_detail_id": "OD-1"}}]
        }),
    )
    .await;

    let facts = ingestor
        .store()
        .pricing_components_for_order("ORD-1")
        .unwrap();
    assert_eq!(facts[0].order_detail_id.as_deref(), Some("OD-1"));
    assert_eq!(
        facts[0].entity_context,
        Some(json!({"legal_entity": "PT-X"}))
    );
}

#[tokio::test]
async fn test_unknown_envelope_fields_preserved_in_dlq() {
    let ingestor = create_test_ingestor();
    let mut event = pricing_event("evt-1", "ORD-1", json!([]));
    event["x_trace_id"] = json!("trace-99");

    ingest_dead_lettered(&ingestor, event).await;

    let entries = ingestor.store().list_dlq(&DlqFilter::default()).unwrap();
    assert_eq!(entries[0].raw_event["x_trace_id"], json!("trace-99"));
}

#[tokio::test]
async fn test_dlq_replay_round_trip() {
    let ingestor = create_test_ingestor();

    // Unknown supplier status dead-letters the event
    let kind = ingest_dead_lettered(
        &ingestor,
        supplier_event("evt-1", "ORD-1", "OD-1", None, "Shipped", 100, json!([])),
    )
    .await;
    assert_eq!(kind, DlqErrorKind::ValidationError);

    let entries = ingestor.store().list_dlq(&DlqFilter::default()).unwrap();
    let dlq_id = entries[0].dlq_id.clone();

    // Replay without remediation fails again (fresh entry) and bumps the
    // original's retry counter
    match ingestor.replay_dlq(&dlq_id).await.unwrap() {
        IngestOutcome::DeadLettered { .. } => {}
        other => panic!("expected DeadLettered, got {:?}", other),
    }
    let original = ingestor.store().get_dlq(&dlq_id).unwrap().unwrap();
    assert_eq!(original.retry_count, 1);
    assert_eq!(ingestor.store().list_dlq(&DlqFilter::default()).unwrap().len(), 2);

    // Unknown DLQ id errors
    assert!(ingestor.replay_dlq("missing").await.is_err());
}

#[tokio::test]
async fn test_refund_component_positive_amount_rejected() {
    let ingestor = create_test_ingestor();
    let kind = ingest_dead_lettered(
        &ingestor,
        json!({
            "event_id": "evt-rf",
            "event_type": "refund.issued",
            "schema_version": "refund.components.v1",
            "order_id": "ORD-1",
            "emitted_at": "2024-06-01T10:00:00Z",
            "refund_id": "RF-1",
            "components": [{"component_type": "RoomRate", "amount": 500000,
                            "currency": "IDR",
                            "refund_of_component_semantic_id": "cs-ORD-1-RoomRate"}]
        }),
    )
    .await;
    assert_eq!(kind, DlqErrorKind::ValidationError);
}

#[tokio::test]
async fn test_semantic_id_stable_across_emission_order() {
    let ingestor = create_test_ingestor();

    // Same dimensions, different JSON insertion order, two snapshots
    ingest_committed(
        &ingestor,
        pricing_event(
            "evt-1",
            "ORD-1",
            json!([{"component_type": "RoomRate", "amount": 100, "currency": "IDR",
                    "dimensions": {"od": "OD-1", "n": "N1"}}]),
        ),
    )
    .await;
    ingest_committed(
        &ingestor,
        pricing_event(
            "evt-2",
            "ORD-1",
            json!([{"component_type": "RoomRate", "amount": 120, "currency": "IDR",
                    "dimensions": {"n": "N1", "od": "OD-1"}}]),
        ),
    )
    .await;

    let facts = ingestor
        .store()
        .pricing_components_for_order("ORD-1")
        .unwrap();
    assert_eq!(facts.len(), 2);
    assert_eq!(facts[0].component_semantic_id, facts[1].component_semantic_id);
    // Same semantic id, different snapshots, distinct instance ids
    assert_ne!(
        facts[0].component_instance_id,
        facts[1].component_instance_id
    );
}
