//! SQL text generation for resolved collections.
//!
//! The statements produced here are consumed verbatim by the storage layer:
//! `CREATE TABLE IF NOT EXISTS <name> (...)` when a collection is registered and
//! `INSERT OR REPLACE INTO <name> (...) VALUES (...)` for every document written.

pub mod insert;
pub mod literal;
pub mod mapper;
pub mod table;

pub use insert::generate_insert;
pub use mapper::{storage_type, ColumnType};
pub use table::generate_table_definition;
