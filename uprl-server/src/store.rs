//! redb-based fact store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `pricing_components` | `(order_id, version, semantic_id)` | `PricingComponentFact` | Pricing family (append-only) |
//! | `payment_timeline` | `(order_id, version)` | `PaymentTimelineFact` | Payment family |
//! | `supplier_timeline` | `(order_id, detail_id, supplier_ref, fulfillment, version)` | `SupplierTimelineFact` | Supplier family |
//! | `supplier_payables` | `(order_id, detail_id, supplier_ref, fulfillment, version, line_id)` | `SupplierPayableLine` | Obligation lines (version -1 = standalone) |
//! | `refund_timeline` | `(order_id, refund_id, version)` | `RefundTimelineFact` | Refund family |
//! | `issuance_timeline` | `(order_id, detail_id, version)` | none | Reserved family, never written |
//! | `component_instances` | `component_instance_id` | `()` | Global instance uniqueness |
//! | `ingested_events` | `event_id` | family tag | Idempotency check |
//! | `dlq` | `dlq_id` | `DlqEntry` | Dead letter queue |
//!
//! Keys place the version last within its scope, so `MAX(version)` per
//! scope is the last entry of a bounded prefix range and every secondary
//! index the read side needs is a plain range scan.
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns (copy-on-write
//! with atomic pointer swap). All rows produced by one inbound event are
//! written inside a single write transaction, which is what makes a
//! cancelled ingestion leave no partial writes.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::fact::{
    DlqEntry, DlqErrorKind, PaymentTimelineFact, PricingComponentFact, RefundTimelineFact,
    SupplierPayableLine, SupplierTimelineFact,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Pricing components: key = (order_id, version, component_semantic_id)
const PRICING_TABLE: TableDefinition<(&str, u64, &str), &[u8]> =
    TableDefinition::new("pricing_components");

/// Payment timeline: key = (order_id, timeline_version)
const PAYMENT_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("payment_timeline");

/// Supplier timeline: key = (order_id, order_detail_id, supplier_reference_id,
/// fulfillment_or_booking, supplier_timeline_version)
const SUPPLIER_TABLE: TableDefinition<(&str, &str, &str, &str, u64), &[u8]> =
    TableDefinition::new("supplier_timeline");

/// Payable lines: key = (order_id, order_detail_id, supplier_reference_id,
/// fulfillment_or_booking, supplier_timeline_version, line_id).
/// The version component is i64 so standalone lines (-1) sort first.
const PAYABLE_TABLE: TableDefinition<(&str, &str, &str, &str, i64, &str), &[u8]> =
    TableDefinition::new("supplier_payables");

/// Refund timeline: key = (order_id, refund_id, refund_timeline_version)
const REFUND_TABLE: TableDefinition<(&str, &str, u64), &[u8]> =
    TableDefinition::new("refund_timeline");

/// Issuance timeline: reserved family, scanned by the registry, never written
const ISSUANCE_TABLE: TableDefinition<(&str, &str, u64), &[u8]> =
    TableDefinition::new("issuance_timeline");

/// Component instance uniqueness: key = component_instance_id
const INSTANCES_TABLE: TableDefinition<&str, ()> = TableDefinition::new("component_instances");

/// Ingested event ids: key = event_id, value = family tag (idempotency)
const INGESTED_EVENTS_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("ingested_events");

/// Dead letter queue: key = dlq_id
const DLQ_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("dlq");

/// Inclusive upper bound for string key components in prefix ranges
const MAX_KEY: &str = "\u{10ffff}";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("DLQ entry not found: {0}")]
    DlqEntryNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Filter for DLQ listings
#[derive(Debug, Clone, Default)]
pub struct DlqFilter {
    pub error_kind: Option<DlqErrorKind>,
    pub order_id: Option<String>,
    pub limit: Option<usize>,
}

/// Fact store backed by redb
#[derive(Clone)]
pub struct FactStore {
    db: Arc<Database>,
}

impl FactStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(PRICING_TABLE)?;
            let _ = write_txn.open_table(PAYMENT_TABLE)?;
            let _ = write_txn.open_table(SUPPLIER_TABLE)?;
            let _ = write_txn.open_table(PAYABLE_TABLE)?;
            let _ = write_txn.open_table(REFUND_TABLE)?;
            let _ = write_txn.open_table(ISSUANCE_TABLE)?;
            let _ = write_txn.open_table(INSTANCES_TABLE)?;
            let _ = write_txn.open_table(INGESTED_EVENTS_TABLE)?;
            let _ = write_txn.open_table(DLQ_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction (one per inbound event)
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Event Idempotency ==========

    /// Check whether an event id has already been committed
    pub fn is_event_ingested(&self, event_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INGESTED_EVENTS_TABLE)?;
        Ok(table.get(event_id)?.is_some())
    }

    /// Check event id within a write transaction
    pub fn is_event_ingested_txn(
        &self,
        txn: &WriteTransaction,
        event_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(INGESTED_EVENTS_TABLE)?;
        Ok(table.get(event_id)?.is_some())
    }

    /// Record an event id as committed (same transaction as its rows)
    pub fn mark_event_ingested(
        &self,
        txn: &WriteTransaction,
        event_id: &str,
        family_tag: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(INGESTED_EVENTS_TABLE)?;
        table.insert(event_id, family_tag)?;
        Ok(())
    }

    // ========== Pricing Family ==========

    /// Append one pricing component row
    ///
    /// Idempotent on `component_instance_id`: a row whose instance id is
    /// already present is skipped. Returns whether a row was written.
    pub fn append_pricing_component(
        &self,
        txn: &WriteTransaction,
        fact: &PricingComponentFact,
    ) -> StorageResult<bool> {
        let mut instances = txn.open_table(INSTANCES_TABLE)?;
        if instances
            .get(fact.component_instance_id.as_str())?
            .is_some()
        {
            tracing::debug!(
                component_instance_id = %fact.component_instance_id,
                "Pricing component already present, skipping"
            );
            return Ok(false);
        }
        instances.insert(fact.component_instance_id.as_str(), ())?;

        let mut table = txn.open_table(PRICING_TABLE)?;
        let key = (
            fact.order_id.as_str(),
            fact.version,
            fact.component_semantic_id.as_str(),
        );
        let value = serde_json::to_vec(fact)?;
        table.insert(key, value.as_slice())?;
        Ok(true)
    }

    /// Highest pricing version for an order (within a write transaction)
    pub fn max_pricing_version_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(PRICING_TABLE)?;
        let range = table.range((order_id, 0u64, "")..=(order_id, u64::MAX, MAX_KEY))?;
        Ok(range
            .rev()
            .next()
            .transpose()?
            .map(|(key, _)| key.value().1))
    }

    /// Whether a pricing version is already persisted for an order
    pub fn pricing_version_exists_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        version: u64,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PRICING_TABLE)?;
        let mut range = table.range((order_id, version, "")..=(order_id, version, MAX_KEY))?;
        Ok(range.next().transpose()?.is_some())
    }

    /// All pricing components for an order, ascending by version
    pub fn pricing_components_for_order(
        &self,
        order_id: &str,
    ) -> StorageResult<Vec<PricingComponentFact>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRICING_TABLE)?;
        let mut rows = Vec::new();
        for entry in table.range((order_id, 0u64, "")..=(order_id, u64::MAX, MAX_KEY))? {
            let (_key, value) = entry?;
            rows.push(serde_json::from_slice(value.value())?);
        }
        Ok(rows)
    }

    /// Pricing components within an inclusive version range
    pub fn pricing_components_in_range(
        &self,
        order_id: &str,
        from_version: u64,
        to_version: u64,
    ) -> StorageResult<Vec<PricingComponentFact>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRICING_TABLE)?;
        let mut rows = Vec::new();
        for entry in table.range((order_id, from_version, "")..=(order_id, to_version, MAX_KEY))? {
            let (_key, value) = entry?;
            rows.push(serde_json::from_slice(value.value())?);
        }
        Ok(rows)
    }

    // ========== Payment Family ==========

    /// Append one payment timeline row
    pub fn append_payment(
        &self,
        txn: &WriteTransaction,
        fact: &PaymentTimelineFact,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PAYMENT_TABLE)?;
        let key = (fact.order_id.as_str(), fact.timeline_version);
        let value = serde_json::to_vec(fact)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Highest payment version for an order (within a write transaction)
    pub fn max_payment_version_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(PAYMENT_TABLE)?;
        let range = table.range((order_id, 0u64)..=(order_id, u64::MAX))?;
        Ok(range
            .rev()
            .next()
            .transpose()?
            .map(|(key, _)| key.value().1))
    }

    /// Whether a payment version is already persisted for an order
    pub fn payment_version_exists_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        version: u64,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PAYMENT_TABLE)?;
        Ok(table.get((order_id, version))?.is_some())
    }

    /// All payment rows for an order, ascending by version
    pub fn payment_rows_for_order(
        &self,
        order_id: &str,
    ) -> StorageResult<Vec<PaymentTimelineFact>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENT_TABLE)?;
        let mut rows = Vec::new();
        for entry in table.range((order_id, 0u64)..=(order_id, u64::MAX))? {
            let (_key, value) = entry?;
            rows.push(serde_json::from_slice(value.value())?);
        }
        Ok(rows)
    }

    /// Payment rows within an inclusive version range
    pub fn payment_rows_in_range(
        &self,
        order_id: &str,
        from_version: u64,
        to_version: u64,
    ) -> StorageResult<Vec<PaymentTimelineFact>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENT_TABLE)?;
        let mut rows = Vec::new();
        for entry in table.range((order_id, from_version)..=(order_id, to_version))? {
            let (_key, value) = entry?;
            rows.push(serde_json::from_slice(value.value())?);
        }
        Ok(rows)
    }

    // ========== Supplier Family ==========

    /// Append one supplier timeline row
    pub fn append_supplier(
        &self,
        txn: &WriteTransaction,
        fact: &SupplierTimelineFact,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SUPPLIER_TABLE)?;
        let key = (
            fact.order_id.as_str(),
            fact.order_detail_id.as_str(),
            fact.supplier_reference_id.as_str(),
            fact.fulfillment_or_booking(),
            fact.supplier_timeline_version,
        );
        let value = serde_json::to_vec(fact)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Highest supplier version for an instance scope (within a write transaction)
    pub fn max_supplier_version_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        order_detail_id: &str,
        supplier_reference_id: &str,
        fulfillment_or_booking: &str,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(SUPPLIER_TABLE)?;
        let range = table.range(
            (
                order_id,
                order_detail_id,
                supplier_reference_id,
                fulfillment_or_booking,
                0u64,
            )
                ..=(
                    order_id,
                    order_detail_id,
                    supplier_reference_id,
                    fulfillment_or_booking,
                    u64::MAX,
                ),
        )?;
        Ok(range
            .rev()
            .next()
            .transpose()?
            .map(|(key, _)| key.value().4))
    }

    /// Whether a supplier version is already persisted for an instance scope
    pub fn supplier_version_exists_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        order_detail_id: &str,
        supplier_reference_id: &str,
        fulfillment_or_booking: &str,
        version: u64,
    ) -> StorageResult<bool> {
        let table = txn.open_table(SUPPLIER_TABLE)?;
        Ok(table
            .get((
                order_id,
                order_detail_id,
                supplier_reference_id,
                fulfillment_or_booking,
                version,
            ))?
            .is_some())
    }

    /// All supplier rows for an order across every instance, key order
    pub fn supplier_rows_for_order(
        &self,
        order_id: &str,
    ) -> StorageResult<Vec<SupplierTimelineFact>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SUPPLIER_TABLE)?;
        let mut rows = Vec::new();
        for entry in table.range(
            (order_id, "", "", "", 0u64)..=(order_id, MAX_KEY, MAX_KEY, MAX_KEY, u64::MAX),
        )? {
            let (_key, value) = entry?;
            rows.push(serde_json::from_slice(value.value())?);
        }
        Ok(rows)
    }

    // ========== Payable Lines ==========

    /// Append one payable line row
    pub fn append_payable_line(
        &self,
        txn: &WriteTransaction,
        line: &SupplierPayableLine,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PAYABLE_TABLE)?;
        let key = (
            line.order_id.as_str(),
            line.order_detail_id.as_str(),
            line.supplier_reference_id.as_str(),
            line.fulfillment_or_booking(),
            line.supplier_timeline_version,
            line.line_id.as_str(),
        );
        let value = serde_json::to_vec(line)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// All payable lines for one instance scope, standalone (-1) rows first
    pub fn payable_lines_for_instance(
        &self,
        order_id: &str,
        order_detail_id: &str,
        supplier_reference_id: &str,
        fulfillment_or_booking: &str,
    ) -> StorageResult<Vec<SupplierPayableLine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYABLE_TABLE)?;
        let mut rows = Vec::new();
        for entry in table.range(
            (
                order_id,
                order_detail_id,
                supplier_reference_id,
                fulfillment_or_booking,
                i64::MIN,
                "",
            )
                ..=(
                    order_id,
                    order_detail_id,
                    supplier_reference_id,
                    fulfillment_or_booking,
                    i64::MAX,
                    MAX_KEY,
                ),
        )? {
            let (_key, value) = entry?;
            rows.push(serde_json::from_slice(value.value())?);
        }
        Ok(rows)
    }

    // ========== Refund Family ==========

    /// Append one refund timeline row
    pub fn append_refund(
        &self,
        txn: &WriteTransaction,
        fact: &RefundTimelineFact,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(REFUND_TABLE)?;
        let key = (
            fact.order_id.as_str(),
            fact.refund_id.as_str(),
            fact.refund_timeline_version,
        );
        let value = serde_json::to_vec(fact)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Highest refund version for `(order_id, refund_id)` (within a write transaction)
    pub fn max_refund_version_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        refund_id: &str,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(REFUND_TABLE)?;
        let range = table.range((order_id, refund_id, 0u64)..=(order_id, refund_id, u64::MAX))?;
        Ok(range
            .rev()
            .next()
            .transpose()?
            .map(|(key, _)| key.value().2))
    }

    /// Whether a refund version is already persisted for `(order_id, refund_id)`
    pub fn refund_version_exists_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        refund_id: &str,
        version: u64,
    ) -> StorageResult<bool> {
        let table = txn.open_table(REFUND_TABLE)?;
        Ok(table.get((order_id, refund_id, version))?.is_some())
    }

    /// All refund rows for an order, ascending by (refund_id, version)
    pub fn refund_rows_for_order(&self, order_id: &str) -> StorageResult<Vec<RefundTimelineFact>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REFUND_TABLE)?;
        let mut rows = Vec::new();
        for entry in table.range((order_id, "", 0u64)..=(order_id, MAX_KEY, u64::MAX))? {
            let (_key, value) = entry?;
            rows.push(serde_json::from_slice(value.value())?);
        }
        Ok(rows)
    }

    // ========== Issuance Family (reserved) ==========

    /// Highest issuance version for `(order_id, order_detail_id)`
    ///
    /// No event writes this family yet; the scan keeps the registry honest
    /// once one does.
    pub fn max_issuance_version_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        order_detail_id: &str,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(ISSUANCE_TABLE)?;
        let range =
            table.range((order_id, order_detail_id, 0u64)..=(order_id, order_detail_id, u64::MAX))?;
        Ok(range
            .rev()
            .next()
            .transpose()?
            .map(|(key, _)| key.value().2))
    }

    // ========== Dead Letter Queue ==========

    /// Append a DLQ entry (own transaction; runs after a failed event commit)
    pub fn append_dlq(&self, entry: &DlqEntry) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DLQ_TABLE)?;
            let value = serde_json::to_vec(entry)?;
            table.insert(entry.dlq_id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Get a single DLQ entry
    pub fn get_dlq(&self, dlq_id: &str) -> StorageResult<Option<DlqEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DLQ_TABLE)?;
        match table.get(dlq_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List DLQ entries matching a filter
    pub fn list_dlq(&self, filter: &DlqFilter) -> StorageResult<Vec<DlqEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DLQ_TABLE)?;
        let limit = filter.limit.unwrap_or(usize::MAX);

        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let entry: DlqEntry = serde_json::from_slice(value.value())?;
            if let Some(kind) = filter.error_kind
                && entry.error_kind != kind
            {
                continue;
            }
            if let Some(ref order_id) = filter.order_id
                && entry.order_id.as_deref() != Some(order_id.as_str())
            {
                continue;
            }
            entries.push(entry);
            if entries.len() >= limit {
                break;
            }
        }
        Ok(entries)
    }

    /// Increment the retry counter of a DLQ entry (replay bookkeeping)
    pub fn bump_dlq_retry(&self, dlq_id: &str) -> StorageResult<DlqEntry> {
        let txn = self.db.begin_write()?;
        let entry = {
            let mut table = txn.open_table(DLQ_TABLE)?;
            let mut entry: DlqEntry = match table.get(dlq_id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StorageError::DlqEntryNotFound(dlq_id.to_string())),
            };
            entry.retry_count += 1;
            let value = serde_json::to_vec(&entry)?;
            table.insert(dlq_id, value.as_slice())?;
            entry
        };
        txn.commit()?;
        Ok(entry)
    }

    // ========== Statistics ==========

    /// Get storage statistics
    pub fn stats(&self) -> StorageResult<StoreStats> {
        let read_txn = self.db.begin_read()?;
        Ok(StoreStats {
            pricing_components: read_txn.open_table(PRICING_TABLE)?.len()?,
            payment_rows: read_txn.open_table(PAYMENT_TABLE)?.len()?,
            supplier_rows: read_txn.open_table(SUPPLIER_TABLE)?.len()?,
            payable_lines: read_txn.open_table(PAYABLE_TABLE)?.len()?,
            refund_rows: read_txn.open_table(REFUND_TABLE)?.len()?,
            ingested_events: read_txn.open_table(INGESTED_EVENTS_TABLE)?.len()?,
            dlq_entries: read_txn.open_table(DLQ_TABLE)?.len()?,
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub pricing_components: u64,
    pub payment_rows: u64,
    pub supplier_rows: u64,
    pub payable_lines: u64,
    pub refund_rows: u64,
    pub ingested_events: u64,
    pub dlq_entries: u64,
}
