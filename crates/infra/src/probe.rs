//! Deployment probe: does the configured contract exist on this network?

use serde::Serialize;
use tracing::{info, warn};

use barterhub_core::ObjectId;

use crate::config::RegistryConfig;
use crate::ledger::{LedgerError, LedgerReader};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectPresence {
    Found,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentStatus {
    pub package_id: ObjectId,
    pub package: ObjectPresence,
    /// `None` when no registry object is configured.
    pub registry: Option<(ObjectId, ObjectPresence)>,
}

impl DeploymentStatus {
    pub fn is_deployed(&self) -> bool {
        self.package == ObjectPresence::Found
            && self
                .registry
                .as_ref()
                .is_none_or(|(_, presence)| *presence == ObjectPresence::Found)
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentProbe<L> {
    ledger: L,
}

impl<L: LedgerReader> DeploymentProbe<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Look up the package and (if configured) registry objects.
    ///
    /// A missing object is reported, not an error; transport errors propagate.
    pub async fn verify(&self, config: &RegistryConfig) -> Result<DeploymentStatus, LedgerError> {
        let package = self.presence(&config.package_id).await?;
        let registry = match &config.registry_id {
            Some(id) => Some((id.clone(), self.presence(id).await?)),
            None => None,
        };

        let status = DeploymentStatus {
            package_id: config.package_id.clone(),
            package,
            registry,
        };
        if status.is_deployed() {
            info!(package = %status.package_id, network = config.network.as_str(), "contract deployment verified");
        } else {
            warn!(package = %status.package_id, network = config.network.as_str(), ?status, "contract deployment incomplete");
        }
        Ok(status)
    }

    async fn presence(&self, id: &ObjectId) -> Result<ObjectPresence, LedgerError> {
        Ok(match self.ledger.get_object(id).await? {
            Some(_) => ObjectPresence::Found,
            None => ObjectPresence::Missing,
        })
    }
}
