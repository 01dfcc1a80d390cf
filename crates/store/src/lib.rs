//! Clients for the hosted backend's data plane
//!
//! The relational tables and object storage live behind REST endpoints
//! of the hosted backend; this crate wraps them the same way the
//! identity crate wraps the auth endpoints:
//! - `TableClient` with a small filter/order/limit query builder
//! - `StorageClient` for material uploads
//! - `ActivityLog`, the append-only audit trail written on every
//!   mutating action

pub mod activity;
pub mod error;
pub mod storage;
pub mod table;
pub mod token;

pub use activity::ActivityLog;
pub use error::StoreError;
pub use storage::{StorageClient, StoredObject};
pub use table::{QueryBuilder, TableClient};
pub use token::AuthToken;
