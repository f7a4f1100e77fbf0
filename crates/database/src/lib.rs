//! # Pulse Database Crate
//!
//! This crate is the warehouse adapter: collector output is flattened into
//! tables here, and the dashboard reads its inputs back from the same tables.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** All SQL lives in this crate. The rest of the
//!   application exchanges typed records or uniform [`RowSet`]s.
//! - **All-or-nothing loads:** clearing a table and reloading it happen in a
//!   single transaction.
//! - **Validated identifiers:** schema, table and column names are checked
//!   before they are spliced into SQL; values are always bound.
//!
//! ## Public API
//!
//! - `connect`: opens the connection pool from the `DATABASE_URL` credential.
//! - `Warehouse`: `write_table` / `read_table` over row sets, plus typed
//!   `write_records` / `read_records`.
//! - `TableRecord`, `collector_target`, `direct_customers_target`: record
//!   conversions and where each record type is stored.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod records;
pub mod repository;
pub mod table;

// Re-export the key components to create a clean, public-facing API.
pub use connection::connect;
pub use error::DbError;
pub use records::{collector_target, direct_customers_target, from_row_set, to_row_set, TableRecord};
pub use repository::Warehouse;
pub use table::{identifier, Cell, ColumnType, RowSet, RowView, WarehouseTarget};
