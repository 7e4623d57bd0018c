//! # Ledger Database Crate
//!
//! The storage layer for ledger items.
//!
//! ## Architectural Principles
//!
//! - **Port and Adapters:** `ItemRepository` is the only interface the rest
//!   of the application uses. `DbRepository` implements it on PostgreSQL,
//!   `InMemoryRepository` in process memory.
//! - **Asynchronous & Pooled:** All operations are asynchronous, and the
//!   PostgreSQL store uses a connection pool (`PgPool`) shared by every request.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: Pool construction and schema upgrades.
//! - `open_repository`: Builds the store selected by configuration.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;

use configuration::{DatabaseConfig, StorageBackend};
use std::sync::Arc;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::InMemoryRepository;
pub use repository::{DbRepository, ItemRepository};

/// Opens the configured store. For PostgreSQL this connects and applies
/// pending migrations first.
pub async fn open_repository(
    backend: StorageBackend,
    database: &DatabaseConfig,
) -> Result<Arc<dyn ItemRepository>, DbError> {
    match backend {
        StorageBackend::Postgres => {
            let pool = connect(database).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(DbRepository::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; items will not survive a restart.");
            Ok(Arc::new(InMemoryRepository::new()))
        }
    }
}
