//! Version registry
//!
//! Five independent version families, each scoped differently:
//!
//! | Family | Scope |
//! |--------|-------|
//! | Pricing | `order_id` |
//! | Payment | `order_id` |
//! | Supplier | `(order_id, order_detail_id, supplier_reference_id, fulfillment_or_booking)` |
//! | Refund | `(order_id, refund_id)` |
//! | Issuance | `(order_id, order_detail_id)` (reserved) |
//!
//! `next()` derives from the committed `MAX(version)` read inside the same
//! write transaction that persists the rows; there is no in-process
//! counter to lose on crash. Serialization per scope comes from a sharded
//! lock registry: writers hold their scope's lock across the read + commit.
//!
//! Standalone partner adjustments bypass the registry entirely and write
//! version -1 verbatim.

use crate::store::{FactStore, StorageResult};
use dashmap::DashMap;
use redb::WriteTransaction;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock registry size warning threshold
const LOCK_MAP_WARN_THRESHOLD: usize = 10_000;

/// A fully-resolved version scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionScope {
    Pricing {
        order_id: String,
    },
    Payment {
        order_id: String,
    },
    Supplier {
        order_id: String,
        order_detail_id: String,
        supplier_reference_id: String,
        /// Booking-level sentinel already applied
        fulfillment_or_booking: String,
    },
    Refund {
        order_id: String,
        refund_id: String,
    },
    Issuance {
        order_id: String,
        order_detail_id: String,
    },
}

impl VersionScope {
    /// Stable key for the per-scope lock registry
    ///
    /// Unit separator keeps composite scopes unambiguous even when a
    /// component contains '-' or ':'.
    pub fn lock_key(&self) -> String {
        match self {
            Self::Pricing { order_id } => format!("pricing\u{1f}{order_id}"),
            Self::Payment { order_id } => format!("payment\u{1f}{order_id}"),
            Self::Supplier {
                order_id,
                order_detail_id,
                supplier_reference_id,
                fulfillment_or_booking,
            } => format!(
                "supplier\u{1f}{order_id}\u{1f}{order_detail_id}\u{1f}{supplier_reference_id}\u{1f}{fulfillment_or_booking}"
            ),
            Self::Refund { order_id, refund_id } => {
                format!("refund\u{1f}{order_id}\u{1f}{refund_id}")
            }
            Self::Issuance {
                order_id,
                order_detail_id,
            } => format!("issuance\u{1f}{order_id}\u{1f}{order_detail_id}"),
        }
    }
}

/// Lost the per-scope lock race after all retry attempts
#[derive(Debug, Clone, Error)]
#[error("version scope '{scope}' still locked after {attempts} attempts")]
pub struct VersionConflictError {
    pub scope: String,
    pub attempts: u32,
}

/// Per-scope version assignment and write serialization
#[derive(Clone)]
pub struct VersionRegistry {
    store: FactStore,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl VersionRegistry {
    pub fn new(store: FactStore) -> Self {
        Self {
            store,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Acquire the scope lock, retrying with jitter on timeout
    ///
    /// The guard must be held until the write transaction for the event is
    /// committed; dropping it earlier re-opens the read-assign-commit race.
    pub async fn acquire(
        &self,
        scope: &VersionScope,
        timeout: Duration,
        attempts: u32,
    ) -> Result<OwnedMutexGuard<()>, VersionConflictError> {
        let key = scope.lock_key();
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        if self.locks.len() > LOCK_MAP_WARN_THRESHOLD {
            tracing::warn!(
                lock_count = self.locks.len(),
                "Scope lock registry exceeds threshold, possible scope leak"
            );
        }

        for attempt in 1..=attempts {
            match tokio::time::timeout(timeout, lock.clone().lock_owned()).await {
                Ok(guard) => return Ok(guard),
                Err(_) => {
                    let jitter = jitter_ms(&key, attempt);
                    tracing::warn!(
                        scope = %key,
                        attempt,
                        jitter_ms = jitter,
                        "Scope lock acquisition timed out, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(jitter)).await;
                }
            }
        }

        Err(VersionConflictError {
            scope: key,
            attempts,
        })
    }

    /// Next version for a scope: committed `MAX + 1`, or 1 if none
    ///
    /// Must run inside the write transaction that persists the rows, with
    /// the scope lock held.
    pub fn next_txn(&self, txn: &WriteTransaction, scope: &VersionScope) -> StorageResult<u64> {
        let max = self.max_txn(txn, scope)?;
        Ok(max.map_or(1, |v| v + 1))
    }

    /// Committed `MAX(version)` for a scope
    pub fn max_txn(
        &self,
        txn: &WriteTransaction,
        scope: &VersionScope,
    ) -> StorageResult<Option<u64>> {
        match scope {
            VersionScope::Pricing { order_id } => {
                self.store.max_pricing_version_txn(txn, order_id)
            }
            VersionScope::Payment { order_id } => {
                self.store.max_payment_version_txn(txn, order_id)
            }
            VersionScope::Supplier {
                order_id,
                order_detail_id,
                supplier_reference_id,
                fulfillment_or_booking,
            } => self.store.max_supplier_version_txn(
                txn,
                order_id,
                order_detail_id,
                supplier_reference_id,
                fulfillment_or_booking,
            ),
            VersionScope::Refund {
                order_id,
                refund_id,
            } => self.store.max_refund_version_txn(txn, order_id, refund_id),
            VersionScope::Issuance {
                order_id,
                order_detail_id,
            } => self
                .store
                .max_issuance_version_txn(txn, order_id, order_detail_id),
        }
    }

    /// Whether a specific version is already persisted in a scope
    pub fn version_exists_txn(
        &self,
        txn: &WriteTransaction,
        scope: &VersionScope,
        version: u64,
    ) -> StorageResult<bool> {
        match scope {
            VersionScope::Pricing { order_id } => {
                self.store.pricing_version_exists_txn(txn, order_id, version)
            }
            VersionScope::Payment { order_id } => {
                self.store.payment_version_exists_txn(txn, order_id, version)
            }
            VersionScope::Supplier {
                order_id,
                order_detail_id,
                supplier_reference_id,
                fulfillment_or_booking,
            } => self.store.supplier_version_exists_txn(
                txn,
                order_id,
                order_detail_id,
                supplier_reference_id,
                fulfillment_or_booking,
                version,
            ),
            VersionScope::Refund {
                order_id,
                refund_id,
            } => self
                .store
                .refund_version_exists_txn(txn, order_id, refund_id, version),
            VersionScope::Issuance { .. } => Ok(false),
        }
    }
}

/// Deterministic retry jitter (0..50ms) from the scope key and attempt
fn jitter_ms(key: &str, attempt: u32) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    attempt.hash(&mut hasher);
    hasher.finish() % 50
}
