use tracing::debug;

use barterhub_core::UserAddress;
use barterhub_registry::Collectible;

use crate::config::{RegistryConfig, StructKind};
use crate::ledger::{LedgerError, LedgerReader};
use crate::retry::RetryPolicy;

/// Lists the collectibles (already withdrawn items) an identity owns.
#[derive(Debug, Clone)]
pub struct CollectiblesMirror<L> {
    ledger: L,
    collectible_type: String,
    retry: RetryPolicy,
}

impl<L: LedgerReader> CollectiblesMirror<L> {
    pub fn new(ledger: L, config: &RegistryConfig) -> Self {
        Self {
            ledger,
            collectible_type: config.struct_type(StructKind::Collectible),
            retry: config.retry_policy(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn mirror(&self, user: &UserAddress) -> Result<Vec<Collectible>, LedgerError> {
        let objects = self
            .retry
            .run("collectibles", || self.ledger.owned_objects(user, &self.collectible_type))
            .await?;

        let collectibles: Vec<Collectible> = objects
            .into_iter()
            .map(|obj| Collectible::from_fields(obj.object_id, &obj.fields))
            .collect();
        debug!(user = %user, count = collectibles.len(), "collectibles mirrored");
        Ok(collectibles)
    }
}
