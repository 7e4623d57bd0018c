//! Shared domain types for the ledger: items, their kind, the write
//! payload used to create or update them, and range-bound parsing.

pub mod enums;
pub mod error;
pub mod structs;
pub mod time;

// Re-export the core types to provide a clean public API.
pub use enums::ItemKind;
pub use error::CoreError;
pub use structs::{LedgerItem, NewItem, MAX_AMOUNT};
pub use time::{parse_bound, BoundKind};
