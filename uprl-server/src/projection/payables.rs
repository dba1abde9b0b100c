//! Effective payables projector
//!
//! Computes, per order, one payable result per instance
//! `(order_detail_id, supplier_reference_id, fulfillment_or_booking)`:
//!
//! ```text
//! for each instance K:
//!   latest     ← timeline row with MAX(version) for K
//!   baseline   ← baseline_for_status(latest)
//!   obligations← party projection over K's payable lines
//!   total      ← baseline + Σ sign(effect) · amount
//! ```
//!
//! Party projection is last-writer-wins per `(party_id, obligation_type)`
//! across timeline-linked lines: a later supplier event that carries
//! `parties = []` changes nothing (prior lines stay effective), while one
//! that carries new parties supersedes only the tuples it mentions.
//! Standalone lines (version -1) always count, whatever the status.
//!
//! Inconsistent rows degrade to warnings on the affected instance; one bad
//! instance never fails the whole order read.

use super::ProjectionResult;
use crate::store::FactStore;
use serde::Serialize;
use shared::event::supplier::SupplierStatus;
use shared::fact::{AmountEffect, PartyType, SupplierPayableLine, SupplierTimelineFact};
use std::collections::{BTreeMap, BTreeSet};

/// One projected obligation line
#[derive(Debug, Clone, Serialize)]
pub struct ProjectedObligation {
    pub line_id: String,
    pub party_type: PartyType,
    pub party_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_name: Option<String>,
    pub obligation_type: String,
    pub amount: i64,
    pub amount_effect: AmountEffect,
    /// -1 for standalone adjustments
    pub supplier_timeline_version: i64,
    pub currency: String,
}

/// Effective payable state of one instance
#[derive(Debug, Clone, Serialize)]
pub struct PayableInstance {
    pub order_detail_id: String,
    pub supplier_reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment_instance_id: Option<String>,
    /// Raw status token of the latest timeline row
    pub status: String,
    pub currency: String,
    pub baseline: i64,
    pub obligations: Vec<ProjectedObligation>,
    pub total: i64,
    /// Surfaced projection warnings; empty on a clean instance
    pub warnings: Vec<String>,
}

/// Compute effective payables for every instance of an order
///
/// Deterministic: instances come back sorted by key, obligations sorted
/// within each instance, so identical store content yields byte-identical
/// results.
pub fn effective_payables(
    store: &FactStore,
    order_id: &str,
) -> ProjectionResult<Vec<PayableInstance>> {
    let rows = store.supplier_rows_for_order(order_id)?;

    let mut by_instance: BTreeMap<(String, String, String), Vec<SupplierTimelineFact>> =
        BTreeMap::new();
    for row in rows {
        let key = (
            row.order_detail_id.clone(),
            row.supplier_reference_id.clone(),
            row.fulfillment_or_booking().to_string(),
        );
        by_instance.entry(key).or_default().push(row);
    }

    let mut instances = Vec::with_capacity(by_instance.len());
    for (key, timeline) in by_instance {
        match project_instance(store, order_id, &key, &timeline) {
            Ok(instance) => instances.push(instance),
            Err(err) => {
                // Partial results: emit the instance with a warning in
                // place of failing the order read.
                tracing::warn!(
                    order_id = %order_id,
                    order_detail_id = %key.0,
                    supplier_reference_id = %key.1,
                    error = %err,
                    "Payable instance projection failed"
                );
                instances.push(PayableInstance {
                    order_detail_id: key.0,
                    supplier_reference_id: key.1,
                    fulfillment_instance_id: fulfillment_from_key(&key.2),
                    status: String::new(),
                    currency: String::new(),
                    baseline: 0,
                    obligations: Vec::new(),
                    total: 0,
                    warnings: vec![format!("projection failed: {err}")],
                });
            }
        }
    }
    Ok(instances)
}

fn fulfillment_from_key(segment: &str) -> Option<String> {
    if segment == shared::fact::BOOKING_LEVEL {
        None
    } else {
        Some(segment.to_string())
    }
}

/// Baseline payable before obligation lines
///
/// | Status | Baseline |
/// |--------|----------|
/// | Confirmed, ISSUED, Invoiced, Settled | latest amount |
/// | CancelledWithFee | 0 (the fee arrives as an obligation line) |
/// | CancelledNoFee, Voided | 0 |
/// | unknown | latest amount, warn |
fn baseline_for_status(latest: &SupplierTimelineFact) -> (i64, Option<String>) {
    match SupplierStatus::parse(&latest.status) {
        Some(
            SupplierStatus::Confirmed
            | SupplierStatus::Issued
            | SupplierStatus::Invoiced
            | SupplierStatus::Settled,
        ) => (latest.amount, None),
        Some(
            SupplierStatus::CancelledWithFee
            | SupplierStatus::CancelledNoFee
            | SupplierStatus::Voided,
        ) => (0, None),
        None => (
            latest.amount,
            Some(format!(
                "unknown supplier status '{}', defaulting baseline to latest amount",
                latest.status
            )),
        ),
    }
}

/// Whether timeline-linked lines participate for this status
///
/// Cancelled-no-fee and voided instances keep only standalone
/// adjustments; everything else (unknown included) projects the latest
/// line per party tuple.
fn includes_linked_lines(status: Option<SupplierStatus>) -> bool {
    !matches!(
        status,
        Some(SupplierStatus::CancelledNoFee | SupplierStatus::Voided)
    )
}

fn project_instance(
    store: &FactStore,
    order_id: &str,
    key: &(String, String, String),
    timeline: &[SupplierTimelineFact],
) -> ProjectionResult<PayableInstance> {
    let (order_detail_id, supplier_reference_id, fulfillment_segment) = key;

    // Timeline rows arrive in ascending version order (key order), so the
    // last one is the latest; guard anyway for safety on the empty case.
    let Some(latest) = timeline.iter().max_by_key(|r| r.supplier_timeline_version) else {
        return Ok(PayableInstance {
            order_detail_id: order_detail_id.clone(),
            supplier_reference_id: supplier_reference_id.clone(),
            fulfillment_instance_id: fulfillment_from_key(fulfillment_segment),
            status: String::new(),
            currency: String::new(),
            baseline: 0,
            obligations: Vec::new(),
            total: 0,
            warnings: vec!["instance has no timeline rows".to_string()],
        });
    };

    let mut warnings = Vec::new();
    let (baseline, baseline_warning) = baseline_for_status(latest);
    if let Some(warning) = baseline_warning {
        warnings.push(warning);
    }

    let lines = store.payable_lines_for_instance(
        order_id,
        order_detail_id,
        supplier_reference_id,
        fulfillment_segment,
    )?;

    let known_versions: BTreeSet<u64> = timeline
        .iter()
        .map(|r| r.supplier_timeline_version)
        .collect();

    let status = SupplierStatus::parse(&latest.status);
    let mut obligations: Vec<&SupplierPayableLine> = Vec::new();

    // Standalone adjustments always apply
    obligations.extend(lines.iter().filter(|l| l.is_standalone()));

    if includes_linked_lines(status) {
        // Last-writer-wins per (party_id, obligation_type): lines arrive
        // in ascending (version, line_id) order, so later entries
        // supersede earlier ones for the same tuple.
        let mut by_party_tuple: BTreeMap<(String, String), &SupplierPayableLine> = BTreeMap::new();
        for line in lines.iter().filter(|l| !l.is_standalone()) {
            if line.supplier_timeline_version >= 0
                && !known_versions.contains(&(line.supplier_timeline_version as u64))
            {
                warnings.push(format!(
                    "payable line '{}' refers to absent timeline version {}",
                    line.line_id, line.supplier_timeline_version
                ));
            }
            by_party_tuple.insert(
                (line.party_id.clone(), line.obligation_type.clone()),
                line,
            );
        }
        obligations.extend(by_party_tuple.into_values());
    }

    for line in &obligations {
        if line.currency != latest.currency {
            warnings.push(format!(
                "payable line '{}' currency {} differs from instance currency {}",
                line.line_id, line.currency, latest.currency
            ));
        }
    }

    let adjustment: i64 = obligations
        .iter()
        .map(|l| l.amount_effect.sign() * l.amount)
        .sum();

    let mut projected: Vec<ProjectedObligation> = obligations
        .into_iter()
        .map(|l| ProjectedObligation {
            line_id: l.line_id.clone(),
            party_type: l.party_type,
            party_id: l.party_id.clone(),
            party_name: l.party_name.clone(),
            obligation_type: l.obligation_type.clone(),
            amount: l.amount,
            amount_effect: l.amount_effect,
            supplier_timeline_version: l.supplier_timeline_version,
            currency: l.currency.clone(),
        })
        .collect();
    projected.sort_by(|a, b| {
        (&a.party_id, &a.obligation_type, a.supplier_timeline_version, &a.line_id).cmp(&(
            &b.party_id,
            &b.obligation_type,
            b.supplier_timeline_version,
            &b.line_id,
        ))
    });

    Ok(PayableInstance {
        order_detail_id: order_detail_id.clone(),
        supplier_reference_id: supplier_reference_id.clone(),
        fulfillment_instance_id: latest.fulfillment_instance_id.clone(),
        status: latest.status.clone(),
        currency: latest.currency.clone(),
        baseline,
        obligations: projected,
        total: baseline + adjustment,
        warnings,
    })
}
