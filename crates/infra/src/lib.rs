//! Infrastructure layer: ledger access, retries, configuration, projections.

pub mod config;
pub mod event_source;
pub mod ledger;
pub mod probe;
pub mod projections;
pub mod retry;

pub use config::{ConfigError, Network, OnChainNames, RegistryConfig, StructKind};
pub use event_source::EventSourceAdapter;
pub use ledger::{EventOrder, InMemoryLedger, JsonRpcLedger, LedgerError, LedgerReader, ObjectSnapshot};
pub use probe::{DeploymentProbe, DeploymentStatus, ObjectPresence};
pub use projections::{CollectiblesMirror, CreditLedgerMirror, InventoryProjector};
pub use retry::{BackoffStrategy, RetryPolicy};
