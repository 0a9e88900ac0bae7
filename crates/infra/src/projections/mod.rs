//! Read models rebuilt from ledger reads.
//!
//! Projections here are:
//! - **Rebuildable**: every refresh starts from fresh ledger reads
//! - **Stateless between calls**: nothing is retained or persisted
//! - **Read-only**: they never write to the ledger

pub mod collectibles;
pub mod inventory;
pub mod membership;

pub use collectibles::CollectiblesMirror;
pub use inventory::InventoryProjector;
pub use membership::CreditLedgerMirror;
