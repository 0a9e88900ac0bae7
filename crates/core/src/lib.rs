//! `barterhub-core`: identifiers and the domain error model.
//!
//! This crate contains **pure domain** primitives (no IO, no ledger access).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ItemKey, ObjectId, SessionId, UserAddress};
