//! Keeps a session's view of the registry fresh.
//!
//! The [`RefreshScheduler`] owns the current [`RegistrySnapshot`] and
//! refreshes it per data class: on demand, after a successful mutation, and
//! from the background [`RefreshWorker`].

pub mod class;
pub mod error;
pub mod scheduler;
pub mod snapshot;
pub mod worker;

pub use class::{DataClass, RefreshIntervals};
pub use error::{RefreshError, RefreshReport};
pub use scheduler::RefreshScheduler;
pub use snapshot::RegistrySnapshot;
pub use worker::{RefreshWorker, WorkerHandle};
