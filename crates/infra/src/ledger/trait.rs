use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use barterhub_core::{ObjectId, UserAddress};
use barterhub_events::RawEvent;

/// Ledger read error.
///
/// These are **infrastructure errors** (network, node, payload shape) as
/// opposed to domain outcomes such as "not registered".
///
/// ## Error Categories
///
/// - **Transport**: the request never produced a response (retryable)
/// - **Rpc**: the node answered with an error object (retryable)
/// - **Decode**: the response arrived but could not be read (not retryable)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("decode error: {0}")]
    Decode(String),
}

impl LedgerError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Transport(_) | LedgerError::Rpc { .. })
    }
}

/// Page direction for event queries.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOrder {
    Ascending,
    /// Newest first: a bounded page then holds the most recent entries.
    #[default]
    Descending,
}

/// Point-in-time view of one ledger object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub object_id: ObjectId,
    pub version: u64,
    /// Fully qualified Move type, when the node reports it.
    pub type_name: Option<String>,
    /// Set for address-owned objects; `None` for shared or immutable ones.
    pub owner: Option<UserAddress>,
    /// The object's field map.
    pub fields: JsonValue,
}

/// Read access to the ledger.
///
/// ## Semantics
///
/// - `query_events` returns at most `limit` entries of one event type. It is a
///   bounded window over the log, not a complete history.
/// - `get_object` returns `None` when the object does not exist (deleted or
///   never created); that is not an error.
/// - `owned_objects` returns the objects of one type owned by an address, in
///   the node's own order.
///
/// Implementations perform no retries; callers layer a retry policy on top.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn query_events(
        &self,
        event_type: &str,
        limit: usize,
        order: EventOrder,
    ) -> Result<Vec<RawEvent>, LedgerError>;

    async fn get_object(&self, id: &ObjectId) -> Result<Option<ObjectSnapshot>, LedgerError>;

    async fn owned_objects(
        &self,
        owner: &UserAddress,
        struct_type: &str,
    ) -> Result<Vec<ObjectSnapshot>, LedgerError>;
}

#[async_trait]
impl<S> LedgerReader for Arc<S>
where
    S: LedgerReader + ?Sized,
{
    async fn query_events(
        &self,
        event_type: &str,
        limit: usize,
        order: EventOrder,
    ) -> Result<Vec<RawEvent>, LedgerError> {
        (**self).query_events(event_type, limit, order).await
    }

    async fn get_object(&self, id: &ObjectId) -> Result<Option<ObjectSnapshot>, LedgerError> {
        (**self).get_object(id).await
    }

    async fn owned_objects(
        &self,
        owner: &UserAddress,
        struct_type: &str,
    ) -> Result<Vec<ObjectSnapshot>, LedgerError> {
        (**self).owned_objects(owner, struct_type).await
    }
}
