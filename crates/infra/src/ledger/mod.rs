//! Ledger read boundary.
//!
//! The ledger exposes individual objects and an unbounded event log, never a
//! "current state" query. This module defines the read operations the
//! projections need, without making transport assumptions.

pub mod in_memory;
pub mod json_rpc;
pub mod r#trait;

pub use in_memory::InMemoryLedger;
pub use json_rpc::JsonRpcLedger;
pub use r#trait::{EventOrder, LedgerError, LedgerReader, ObjectSnapshot};
