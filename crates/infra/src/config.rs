//! Registry client configuration.
//!
//! Values come from `BARTERHUB_*` environment variables with defaults for
//! everything except the contract package id.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use barterhub_core::{DomainError, ObjectId};
use barterhub_registry::EventKind;

use crate::retry::RetryPolicy;

pub const DEFAULT_RPC_URL: &str = "https://fullnode.testnet.sui.io:443";
pub const DEFAULT_MODULE: &str = "centro_trueque";
pub const DEFAULT_EVENT_PAGE_LIMIT: usize = 100;
const EXPLORER_BASE_URL: &str = "https://suiexplorer.com";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: DomainError,
    },
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Devnet,
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    pub fn as_str(self) -> &'static str {
        match self {
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Some(Network::Devnet),
            "testnet" => Some(Network::Testnet),
            "mainnet" => Some(Network::Mainnet),
            _ => None,
        }
    }
}

/// Owned object types the client reads.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StructKind {
    MembershipCard,
    Collectible,
}

/// On-chain type names declared by the registry module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainNames {
    pub stored_event: String,
    pub withdrawn_event: String,
    pub membership_card: String,
    pub collectible: String,
}

impl Default for OnChainNames {
    fn default() -> Self {
        Self {
            stored_event: "ArticuloAlmacenadoEvent".to_string(),
            withdrawn_event: "ArticuloRetiradoEvent".to_string(),
            membership_card: "CarnetDeSocio".to_string(),
            collectible: "Coleccionable".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub rpc_url: String,
    pub network: Network,
    pub package_id: ObjectId,
    /// Shared registry object, checked by the deployment probe when set.
    pub registry_id: Option<ObjectId>,
    pub module_name: String,
    pub names: OnChainNames,
    pub event_page_limit: usize,
    pub rpc_timeout_ms: u64,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub inventory_interval_ms: u64,
    pub membership_interval_ms: u64,
    pub collectibles_interval_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            network: Network::default(),
            package_id: ObjectId::zero(),
            registry_id: None,
            module_name: DEFAULT_MODULE.to_string(),
            names: OnChainNames::default(),
            event_page_limit: DEFAULT_EVENT_PAGE_LIMIT,
            rpc_timeout_ms: 10_000,
            retry_max_attempts: 3,
            retry_base_delay_ms: 200,
            retry_max_delay_ms: 2_000,
            inventory_interval_ms: 5_000,
            membership_interval_ms: 3_000,
            collectibles_interval_ms: 3_000,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any name -> value source.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let num = |name: &str, default: u64| var(name).and_then(|v| v.trim().parse().ok()).unwrap_or(default);
        // A zero period would stall a timer or the RPC client.
        let period = |name: &str, default: u64| {
            var(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(default)
        };

        let package_id = var("BARTERHUB_PACKAGE_ID").ok_or(ConfigError::Missing("BARTERHUB_PACKAGE_ID"))?;
        let package_id = ObjectId::parse(&package_id).map_err(|source| ConfigError::Invalid {
            name: "BARTERHUB_PACKAGE_ID",
            source,
        })?;
        let registry_id = var("BARTERHUB_REGISTRY_ID")
            .map(|v| ObjectId::parse(&v))
            .transpose()
            .map_err(|source| ConfigError::Invalid {
                name: "BARTERHUB_REGISTRY_ID",
                source,
            })?;

        Ok(Self {
            rpc_url: var("BARTERHUB_RPC_URL").unwrap_or(defaults.rpc_url),
            network: var("BARTERHUB_NETWORK")
                .and_then(|v| Network::parse(&v))
                .unwrap_or(defaults.network),
            package_id,
            registry_id,
            module_name: var("BARTERHUB_MODULE").unwrap_or(defaults.module_name),
            names: defaults.names,
            event_page_limit: var("BARTERHUB_EVENT_PAGE_LIMIT")
                .and_then(|v| v.trim().parse().ok())
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.event_page_limit),
            rpc_timeout_ms: period("BARTERHUB_RPC_TIMEOUT_MS", defaults.rpc_timeout_ms),
            retry_max_attempts: var("BARTERHUB_RETRY_MAX_ATTEMPTS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.retry_max_attempts),
            retry_base_delay_ms: num("BARTERHUB_RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms),
            retry_max_delay_ms: num("BARTERHUB_RETRY_MAX_DELAY_MS", defaults.retry_max_delay_ms),
            inventory_interval_ms: period("BARTERHUB_INVENTORY_INTERVAL_MS", defaults.inventory_interval_ms),
            membership_interval_ms: period("BARTERHUB_MEMBERSHIP_INTERVAL_MS", defaults.membership_interval_ms),
            collectibles_interval_ms: period("BARTERHUB_COLLECTIBLES_INTERVAL_MS", defaults.collectibles_interval_ms),
        })
    }

    fn qualified(&self, name: &str) -> String {
        format!("{}::{}::{}", self.package_id, self.module_name, name)
    }

    /// Fully qualified Move event type for an event kind.
    pub fn event_type(&self, kind: EventKind) -> String {
        match kind {
            EventKind::Stored => self.qualified(&self.names.stored_event),
            EventKind::Withdrawn => self.qualified(&self.names.withdrawn_event),
        }
    }

    /// Fully qualified Move struct type for an owned object kind.
    pub fn struct_type(&self, kind: StructKind) -> String {
        match kind {
            StructKind::MembershipCard => self.qualified(&self.names.membership_card),
            StructKind::Collectible => self.qualified(&self.names.collectible),
        }
    }

    pub fn explorer_url(&self, object_id: &ObjectId) -> String {
        format!(
            "{EXPLORER_BASE_URL}/object/{object_id}?network={}",
            self.network.as_str()
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}
