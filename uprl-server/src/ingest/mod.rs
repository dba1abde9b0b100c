//! Ingestion pipeline
//!
//! This module handles:
//! - Envelope shape validation and event routing
//! - Handler-specific normalization (identity, legacy lifting)
//! - Version assignment under the per-scope lock
//! - Atomic persistence of all rows for one event
//! - Idempotent skip of redelivered events
//! - DLQ routing for everything that fails
//!
//! # Event Flow
//!
//! ```text
//! ingest(raw)
//!     ├─ 1. Per-event timeout guard
//!     ├─ 2. Shape validate envelope (ValidationError → DLQ)
//!     ├─ 3. Idempotency fast path (event_id already committed → skip)
//!     ├─ 4. Route + normalize (Validation/IdentityError → DLQ)
//!     ├─ 5. Acquire version scope lock (retry w/ jitter; conflict → DLQ)
//!     ├─ 6. Begin write transaction
//!     │      ├─ re-check idempotency
//!     │      ├─ resolve version (explicit or MAX+1; gap → WARN)
//!     │      └─ append all rows + event marker
//!     ├─ 7. Commit (storage failure → backoff retry → DLQ)
//!     └─ 8. Return outcome (never an error to the transport)
//! ```
//!
//! Multiple events are in flight concurrently; two events racing for one
//! scope serialize on the scope lock, so commit order matches version
//! order. Events for different scopes only share the redb writer, which
//! serializes commits but not versions.

pub mod error;
pub mod handlers;
pub mod validate;

pub use error::{IngestError, IngestResult};

use crate::store::{FactStore, StorageError, StorageResult};
use crate::versioning::{VersionRegistry, VersionScope};
use handlers::{NormalizeContext, NormalizedEvent};
use serde_json::Value;
use shared::fact::{DlqEntry, DlqErrorKind};
use shared::util;
use std::time::Duration;

/// Pipeline tuning knobs (env-overridable via `Config`)
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Whole-event budget before the event is dead-lettered
    pub event_timeout: Duration,
    /// Scope lock acquisition budget per attempt
    pub lock_timeout: Duration,
    /// Scope lock attempts before VersionConflictError
    pub lock_attempts: u32,
    /// Commit attempts before StorageError is dead-lettered
    pub storage_attempts: u32,
    /// Base backoff between commit attempts (doubles per attempt)
    pub backoff_base: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            event_timeout: Duration::from_secs(30),
            lock_timeout: Duration::from_secs(5),
            lock_attempts: 3,
            storage_attempts: 3,
            backoff_base: Duration::from_millis(100),
        }
    }
}

/// Terminal disposition of one inbound event
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// All rows committed atomically
    Committed {
        event_id: String,
        rows_written: usize,
    },
    /// event_id already committed; at-least-once redelivery tolerated
    Duplicate { event_id: String },
    /// Parked in the DLQ; the pipeline keeps going
    DeadLettered {
        dlq_id: String,
        error_kind: DlqErrorKind,
    },
}

/// The ingestion pipeline
///
/// Cheap to clone; all state lives in the fact store and the lock
/// registry.
#[derive(Clone)]
pub struct Ingestor {
    store: FactStore,
    registry: VersionRegistry,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(store: FactStore, config: IngestConfig) -> Self {
        let registry = VersionRegistry::new(store.clone());
        Self {
            store,
            registry,
            config,
        }
    }

    /// Get the underlying fact store
    pub fn store(&self) -> &FactStore {
        &self.store
    }

    /// Ingest one raw event
    ///
    /// Never fails the caller: every error disposition ends in the DLQ and
    /// is reported through the outcome.
    pub async fn ingest(&self, raw: Value) -> IngestOutcome {
        let received_at = util::now_millis();
        let result = tokio::time::timeout(self.config.event_timeout, self.process(&raw)).await;
        match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => self.dead_letter(raw, err, received_at),
            Err(_) => self.dead_letter(raw, IngestError::EventTimeout, received_at),
        }
    }

    /// Replay a dead-lettered event verbatim
    ///
    /// Bumps the retry counter and pushes the raw event back through the
    /// full pipeline. A replay that fails again produces a fresh DLQ entry.
    pub async fn replay_dlq(&self, dlq_id: &str) -> StorageResult<IngestOutcome> {
        let entry = self
            .store
            .get_dlq(dlq_id)?
            .ok_or_else(|| StorageError::DlqEntryNotFound(dlq_id.to_string()))?;
        self.store.bump_dlq_retry(dlq_id)?;
        tracing::info!(dlq_id = %dlq_id, retry_count = entry.retry_count + 1, "Replaying DLQ entry");
        Ok(self.ingest(entry.raw_event).await)
    }

    async fn process(&self, raw: &Value) -> IngestResult<IngestOutcome> {
        // 1. Shape validation
        let validated = validate::validate_envelope(raw)?;

        // 2. Delivery identity: event_id, else idempotency_key, else a
        // minted UUID (no dedup possible for those).
        let event_id = validated
            .envelope
            .delivery_id()
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        // 3. Idempotency fast path (re-checked inside the transaction)
        if self.store.is_event_ingested(&event_id)? {
            tracing::info!(event_id = %event_id, "Duplicate event, skipping");
            return Ok(IngestOutcome::Duplicate { event_id });
        }

        // 4. Normalize
        let ctx = NormalizeContext {
            event_id: event_id.clone(),
            order_id: validated.envelope.order_id.clone(),
            emitted_at: validated.emitted_at,
            ingested_at: util::now_millis(),
        };
        let normalized = handlers::normalize(&validated, &ctx)?;

        // 5. Serialize against same-scope writers. Held until the commit
        // below returns: releasing earlier re-opens the read-assign race.
        let _guard = match normalized.scope() {
            Some(scope) => Some(
                self.registry
                    .acquire(&scope, self.config.lock_timeout, self.config.lock_attempts)
                    .await?,
            ),
            None => None,
        };

        // 6. Commit with backoff on transient storage failures
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.commit(&normalized, &event_id) {
                Ok(Some(rows_written)) => {
                    tracing::info!(
                        event_id = %event_id,
                        order_id = %ctx.order_id,
                        family = normalized.family_tag(),
                        rows_written,
                        "Event committed"
                    );
                    return Ok(IngestOutcome::Committed {
                        event_id,
                        rows_written,
                    });
                }
                Ok(None) => {
                    tracing::info!(event_id = %event_id, "Duplicate event detected in transaction, skipping");
                    return Ok(IngestOutcome::Duplicate { event_id });
                }
                Err(err) if err.is_transient() && attempt < self.config.storage_attempts => {
                    let backoff = self.config.backoff_base * 2u32.pow(attempt - 1);
                    tracing::warn!(
                        event_id = %event_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Commit failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Persist all rows for one event in a single transaction
    ///
    /// Returns `None` when the event id turned out to be already committed
    /// (lost the fast-path race to another delivery of the same event).
    fn commit(&self, normalized: &NormalizedEvent, event_id: &str) -> IngestResult<Option<usize>> {
        let txn = self.store.begin_write()?;

        if self.store.is_event_ingested_txn(&txn, event_id)? {
            return Ok(None);
        }

        let rows_written = match normalized {
            NormalizedEvent::Pricing(p) => {
                let scope = VersionScope::Pricing {
                    order_id: p.order_id.clone(),
                };
                let version = self.resolve_version(&txn, &scope, p.explicit_version)?;
                let mut written = 0;
                for fact in &p.components {
                    let mut fact = fact.clone();
                    fact.version = version;
                    if self.store.append_pricing_component(&txn, &fact)? {
                        written += 1;
                    }
                }
                written
            }
            NormalizedEvent::Payment(p) => {
                let scope = VersionScope::Payment {
                    order_id: p.fact.order_id.clone(),
                };
                let version = self.resolve_version(&txn, &scope, p.explicit_version)?;
                let mut fact = p.fact.clone();
                fact.timeline_version = version;
                self.store.append_payment(&txn, &fact)?;
                1
            }
            NormalizedEvent::Supplier(s) => {
                let scope = VersionScope::Supplier {
                    order_id: s.parent.order_id.clone(),
                    order_detail_id: s.parent.order_detail_id.clone(),
                    supplier_reference_id: s.parent.supplier_reference_id.clone(),
                    fulfillment_or_booking: s.parent.fulfillment_or_booking().to_string(),
                };
                let version = self.resolve_version(&txn, &scope, s.explicit_version)?;
                let mut parent = s.parent.clone();
                parent.supplier_timeline_version = version;
                self.store.append_supplier(&txn, &parent)?;
                let mut written = 1;
                for line in &s.lines {
                    let mut line = line.clone();
                    line.supplier_timeline_version = version as i64;
                    self.store.append_payable_line(&txn, &line)?;
                    written += 1;
                }
                written
            }
            NormalizedEvent::RefundLifecycle(r) => {
                let scope = VersionScope::Refund {
                    order_id: r.fact.order_id.clone(),
                    refund_id: r.fact.refund_id.clone(),
                };
                let version = self.resolve_version(&txn, &scope, r.explicit_version)?;
                let mut fact = r.fact.clone();
                fact.refund_timeline_version = version;
                self.store.append_refund(&txn, &fact)?;
                1
            }
            NormalizedEvent::PartnerAdjustment(line) => {
                self.store.append_payable_line(&txn, line)?;
                1
            }
        };

        self.store
            .mark_event_ingested(&txn, event_id, normalized.family_tag())?;
        txn.commit().map_err(StorageError::from)?;
        Ok(Some(rows_written))
    }

    /// Resolve the version to commit under: producer-assigned verbatim, or
    /// the registry's `MAX + 1`
    fn resolve_version(
        &self,
        txn: &redb::WriteTransaction,
        scope: &VersionScope,
        explicit: Option<u64>,
    ) -> IngestResult<u64> {
        match explicit {
            None => Ok(self.registry.next_txn(txn, scope)?),
            Some(0) => Err(IngestError::Validation(
                "explicit version must be >= 1".into(),
            )),
            Some(version) => {
                if self.registry.version_exists_txn(txn, scope, version)? {
                    return Err(IngestError::VersionAlreadyPresent {
                        scope: scope.lock_key(),
                        version,
                    });
                }
                let max = self.registry.max_txn(txn, scope)?.unwrap_or(0);
                if version > max + 1 {
                    // Gaps are tolerated, never backfilled; this is the alert hook
                    tracing::warn!(
                        scope = %scope.lock_key(),
                        version,
                        max_persisted = max,
                        "version_gap: producer-assigned version opens a gap"
                    );
                }
                Ok(version)
            }
        }
    }

    /// Park a failed event in the DLQ
    fn dead_letter(&self, raw: Value, err: IngestError, received_at: i64) -> IngestOutcome {
        let error_kind = err.dlq_kind();
        let order_id = raw
            .get("order_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        let entry = DlqEntry {
            dlq_id: uuid::Uuid::new_v4().to_string(),
            raw_event: raw,
            error_kind,
            error_detail: err.to_string(),
            order_id: order_id.clone(),
            received_at,
            retry_count: 0,
        };

        tracing::warn!(
            dlq_id = %entry.dlq_id,
            order_id = ?order_id,
            error_kind = error_kind.as_str(),
            error = %err,
            "Event dead-lettered"
        );

        if let Err(dlq_err) = self.store.append_dlq(&entry) {
            // The event is lost for replay; surface loudly, keep serving.
            tracing::error!(
                dlq_id = %entry.dlq_id,
                error = %dlq_err,
                "Failed to persist DLQ entry"
            );
        }

        IngestOutcome::DeadLettered {
            dlq_id: entry.dlq_id,
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests;
