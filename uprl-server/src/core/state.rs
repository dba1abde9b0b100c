//! Shared server state
//!
//! `ServerState` holds every service handle the HTTP layer needs. All
//! members are cheaply cloneable (Arc or Arc-backed), so the state clones
//! into each request without ceremony.

use std::sync::Arc;

use crate::core::Config;
use crate::ingest::Ingestor;
use crate::store::FactStore;
use shared::util;

/// Server state - shared handles for all services
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration (immutable after startup)
    pub config: Config,
    /// The append-only fact store (read side)
    pub store: FactStore,
    /// The ingestion pipeline (write side)
    pub ingestor: Arc<Ingestor>,
    /// Startup instant, Unix milliseconds
    pub started_at: i64,
}

impl ServerState {
    /// Initialize all services from configuration
    ///
    /// Cold start performs no counter warm-up (versions derive from
    /// committed rows per call); it reports what the store already holds.
    pub fn initialize(config: &Config) -> crate::core::Result<Self> {
        let db_path = config.db_path();
        let store = FactStore::open(&db_path)?;
        let stats = store.stats()?;
        tracing::info!(
            db_path = %db_path.display(),
            pricing_components = stats.pricing_components,
            payment_rows = stats.payment_rows,
            supplier_rows = stats.supplier_rows,
            payable_lines = stats.payable_lines,
            refund_rows = stats.refund_rows,
            dlq_entries = stats.dlq_entries,
            "Fact store opened"
        );

        let ingestor = Arc::new(Ingestor::new(store.clone(), config.ingest_config()));

        Ok(Self {
            config: config.clone(),
            store,
            ingestor,
            started_at: util::now_millis(),
        })
    }

    /// In-memory state for tests
    #[cfg(test)]
    pub fn in_memory(config: Config) -> Self {
        let store = FactStore::open_in_memory().expect("in-memory store");
        let ingestor = Arc::new(Ingestor::new(store.clone(), config.ingest_config()));
        Self {
            config,
            store,
            ingestor,
            started_at: util::now_millis(),
        }
    }

    /// Seconds since startup
    pub fn uptime_seconds(&self) -> i64 {
        (util::now_millis() - self.started_at) / 1000
    }
}
