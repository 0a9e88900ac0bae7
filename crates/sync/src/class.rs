use std::time::Duration;

use serde::{Deserialize, Serialize};

use barterhub_infra::RegistryConfig;

/// Independently refreshed slice of registry state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataClass {
    /// The projected inventory (shared by every identity).
    Inventory,
    /// The connected identity's membership card and its credits.
    Membership,
    /// Collectibles owned by the connected identity.
    Collectibles,
}

impl DataClass {
    pub const ALL: [DataClass; 3] = [DataClass::Inventory, DataClass::Membership, DataClass::Collectibles];

    pub fn as_str(self) -> &'static str {
        match self {
            DataClass::Inventory => "inventory",
            DataClass::Membership => "membership",
            DataClass::Collectibles => "collectibles",
        }
    }

    /// Whether the data belongs to the connected identity.
    pub fn is_identity_scoped(self) -> bool {
        !matches!(self, DataClass::Inventory)
    }
}

impl core::fmt::Display for DataClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Background refresh period per data class.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RefreshIntervals {
    pub inventory: Duration,
    pub membership: Duration,
    pub collectibles: Duration,
}

impl RefreshIntervals {
    /// Zero periods fall back to the defaults.
    pub fn from_config(config: &RegistryConfig) -> Self {
        let defaults = RegistryConfig::default();
        let period = |ms: u64, default: u64| Duration::from_millis(if ms > 0 { ms } else { default });
        Self {
            inventory: period(config.inventory_interval_ms, defaults.inventory_interval_ms),
            membership: period(config.membership_interval_ms, defaults.membership_interval_ms),
            collectibles: period(config.collectibles_interval_ms, defaults.collectibles_interval_ms),
        }
    }

    pub fn for_class(&self, class: DataClass) -> Duration {
        match class {
            DataClass::Inventory => self.inventory,
            DataClass::Membership => self.membership,
            DataClass::Collectibles => self.collectibles,
        }
    }

    /// Timer period for a class; a zero period is replaced by the default.
    pub(crate) fn timer_period(&self, class: DataClass) -> Duration {
        match self.for_class(class) {
            Duration::ZERO => Self::default().for_class(class),
            period => period,
        }
    }
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_periods_use_the_defaults() {
        let cfg = RegistryConfig {
            inventory_interval_ms: 0,
            membership_interval_ms: 1_500,
            ..RegistryConfig::default()
        };
        let intervals = RefreshIntervals::from_config(&cfg);
        assert_eq!(intervals.inventory, Duration::from_millis(5_000));
        assert_eq!(intervals.membership, Duration::from_millis(1_500));

        let literal = RefreshIntervals {
            collectibles: Duration::ZERO,
            ..intervals
        };
        assert_eq!(literal.timer_period(DataClass::Collectibles), Duration::from_millis(3_000));
        assert_eq!(literal.timer_period(DataClass::Membership), Duration::from_millis(1_500));
    }
}
