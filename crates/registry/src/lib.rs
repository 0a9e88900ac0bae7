//! Registry domain module.
//!
//! Items deposited into the shared registry, the membership cards that hold
//! withdrawal credits, and the rules deciding whether a withdrawal is allowed.
//! Everything here is deterministic: no IO, no ledger access, no clocks.

pub mod collectible;
pub mod credit;
mod decode;
pub mod fetch;
pub mod inventory;
pub mod item;
pub mod transaction;
pub mod validation;

pub use collectible::Collectible;
pub use credit::{CreditEntry, CreditLedger, LedgerLookup, MembershipCard, MembershipSummary};
pub use fetch::FetchState;
pub use inventory::{project, InventoryProjection, ProjectedInventory, ProjectionReport};
pub use item::{EventKind, Item, ItemStored, ItemWithdrawn, MalformedEvent, RegistryEvent};
pub use transaction::{classify_transaction_error, MutationKind, TransactionFailure};
pub use validation::{decide, validate, ReasonCode, ValidationResult};
