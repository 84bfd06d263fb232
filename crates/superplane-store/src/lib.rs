//! The Persistent Store: a PostgreSQL-backed implementation of the
//! workflow/node/execution/request relational shapes, with row-level
//! `SELECT ... FOR UPDATE SKIP LOCKED` as the sole cross-worker
//! coordination primitive.
//!
//! `superplane-engine`'s workers call `PgStore::begin` once per polled row
//! and drive the whole of a claim's processing — from lock acquisition
//! through state transition — through the returned `StoreTransaction`,
//! committing or rolling back explicitly. A transaction-scoped handle
//! rather than a flat CRUD trait, because per-row processing spans
//! several statements that must all see (and hold the lock on) the same
//! claimed row.

mod claim;
mod error;
mod node;
mod pg;

pub use claim::Claim;
pub use error::StoreError;
pub use node::StoredNode;
pub use pg::{PgStore, StoreTransaction};
