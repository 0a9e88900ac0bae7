use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use barterhub_core::{ItemKey, SessionId, UserAddress};
use barterhub_registry::{
    validate, Collectible, FetchState, LedgerLookup, MembershipSummary, ProjectedInventory, ValidationResult,
};

use crate::class::DataClass;

/// Everything a session currently knows about the registry.
///
/// Published after every applied refresh. Identity-scoped state always
/// belongs to `user` under `session`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySnapshot {
    pub session: SessionId,
    pub user: Option<UserAddress>,
    pub inventory: FetchState<ProjectedInventory>,
    pub ledger: FetchState<LedgerLookup>,
    pub collectibles: FetchState<Vec<Collectible>>,
    /// Entries skipped by the last inventory projection.
    pub malformed_events: usize,
    pub refreshed_at: BTreeMap<DataClass, DateTime<Utc>>,
    /// Completion stamp of the result currently applied, per class.
    stamps: BTreeMap<DataClass, u64>,
}

/// A successful fetch, ready to apply.
#[derive(Debug)]
pub(crate) enum Fetched {
    Inventory {
        inventory: ProjectedInventory,
        malformed: usize,
    },
    Membership(LedgerLookup),
    Collectibles(Vec<Collectible>),
}

impl RegistrySnapshot {
    pub(crate) fn new(session: SessionId, user: Option<UserAddress>) -> Self {
        let mut snapshot = Self {
            session,
            user,
            inventory: FetchState::Pending,
            ledger: FetchState::Pending,
            collectibles: FetchState::Pending,
            malformed_events: 0,
            refreshed_at: BTreeMap::new(),
            stamps: BTreeMap::new(),
        };
        snapshot.reset_identity_scoped();
        snapshot
    }

    /// Eligibility of withdrawing `item_key` given what is loaded now.
    pub fn validate(&self, item_key: Option<ItemKey>) -> ValidationResult {
        validate(item_key, &self.inventory, &self.ledger)
    }

    /// Dashboard summary, once the membership read has completed.
    pub fn membership_summary(&self) -> Option<MembershipSummary> {
        self.ledger.ready().map(LedgerLookup::summary)
    }

    pub fn is_connected(&self) -> bool {
        self.user.is_some()
    }

    pub(crate) fn stamp(&self, class: DataClass) -> u64 {
        self.stamps.get(&class).copied().unwrap_or(0)
    }

    pub(crate) fn set_stamp(&mut self, class: DataClass, stamp: u64) {
        self.stamps.insert(class, stamp);
    }

    pub(crate) fn store(&mut self, fetched: Fetched, at: DateTime<Utc>) {
        let class = match fetched {
            Fetched::Inventory { inventory, malformed } => {
                self.inventory = FetchState::Ready(inventory);
                self.malformed_events = malformed;
                DataClass::Inventory
            }
            Fetched::Membership(lookup) => {
                self.ledger = FetchState::Ready(lookup);
                DataClass::Membership
            }
            Fetched::Collectibles(items) => {
                self.collectibles = FetchState::Ready(items);
                DataClass::Collectibles
            }
        };
        self.refreshed_at.insert(class, at);
    }

    pub(crate) fn fail(&mut self, class: DataClass, cause: String) {
        match class {
            DataClass::Inventory => self.inventory = FetchState::Failed(cause),
            DataClass::Membership => self.ledger = FetchState::Failed(cause),
            DataClass::Collectibles => self.collectibles = FetchState::Failed(cause),
        }
    }

    /// Identity-scoped state after an identity change: pending until the
    /// first read for a connected identity, known-empty when disconnected.
    pub(crate) fn reset_identity_scoped(&mut self) {
        if self.user.is_some() {
            self.ledger = FetchState::Pending;
            self.collectibles = FetchState::Pending;
        } else {
            self.ledger = FetchState::Ready(LedgerLookup::NotRegistered);
            self.collectibles = FetchState::Ready(Vec::new());
        }
        self.refreshed_at.retain(|class, _| !class.is_identity_scoped());
    }
}
