//! UPRL Core - Unified Pricing Read Layer
//!
//! # Architecture overview
//!
//! Event-ingestion and projection engine for commerce orders. Producer
//! services (pricing, payment, supplier, refund) push lifecycle events;
//! the Core normalizes them into an append-only fact store and serves
//! derived latest-state projections to downstream readers.
//!
//! # Module structure
//!
//! ```text
//! uprl-server/src/
//! ├── core/          # Config, state, server, errors
//! ├── identity.rs    # Semantic & instance component IDs
//! ├── versioning.rs  # Five-family version registry + scope locks
//! ├── store.rs       # Append-only redb fact store
//! ├── ingest/        # Validate → normalize → version → commit; DLQ
//! ├── projection/    # Payables projector + latest-state views
//! ├── api/           # HTTP routes (ingest push + read surface)
//! └── utils/         # Logging
//! ```

pub mod api;
pub mod core;
pub mod identity;
pub mod ingest;
pub mod projection;
pub mod store;
pub mod utils;
pub mod versioning;

// Re-export public types
pub use crate::core::{Config, Server, ServerState};
pub use crate::ingest::{IngestOutcome, Ingestor};
pub use crate::store::FactStore;

// Re-export unified error types from shared
pub use crate::utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use crate::utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
  _   _ ____  ____  _
 | | | |  _ \|  _ \| |
 | | | | |_) | |_) | |
 | |_| |  __/|  _ <| |___
  \___/|_|   |_| \_\_____|
        read layer core
    "#
    );
}
