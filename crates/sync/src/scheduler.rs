//! Refresh scheduler.
//!
//! Each data class has one refresh slot. Fetches of a slot run one at a
//! time; a caller queued behind an in-flight fetch either reuses a fetch
//! that started after it asked, or runs its own once the slot is free.
//!
//! Results are applied under two checks:
//! - identity-scoped results fetched for an earlier session are dropped
//! - a result whose completion stamp is not newer than the applied one is
//!   dropped (last-completed-wins)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use barterhub_core::{ItemKey, SessionId, UserAddress};
use barterhub_infra::{
    CollectiblesMirror, CreditLedgerMirror, EventSourceAdapter, InventoryProjector, LedgerError, LedgerReader,
    RegistryConfig,
};
use barterhub_registry::{
    classify_transaction_error, LedgerLookup, MutationKind, TransactionFailure, ValidationResult,
};

use crate::class::{DataClass, RefreshIntervals};
use crate::error::{RefreshError, RefreshReport};
use crate::snapshot::{Fetched, RegistrySnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Applied,
    Discarded,
    Failed(String),
}

#[derive(Debug, Clone)]
struct Completed {
    fetch_no: u64,
    session: SessionId,
    outcome: Outcome,
}

#[derive(Debug, Default)]
struct Slot {
    gate: tokio::sync::Mutex<()>,
    /// Number of fetches started so far; the latest one's number.
    started: AtomicU64,
    last: Mutex<Option<Completed>>,
}

impl Slot {
    fn last_completed(&self) -> Option<Completed> {
        self.last.lock().ok().and_then(|last| last.clone())
    }

    fn record(&self, completed: Completed) {
        if let Ok(mut last) = self.last.lock() {
            *last = Some(completed);
        }
    }
}

#[derive(Debug, Default)]
struct Slots {
    inventory: Slot,
    membership: Slot,
    collectibles: Slot,
}

impl Slots {
    fn get(&self, class: DataClass) -> &Slot {
        match class {
            DataClass::Inventory => &self.inventory,
            DataClass::Membership => &self.membership,
            DataClass::Collectibles => &self.collectibles,
        }
    }
}

struct ClassRun {
    class: DataClass,
    outcome: Outcome,
    joined: bool,
}

struct Inner<L> {
    inventory: InventoryProjector<L>,
    membership: CreditLedgerMirror<L>,
    collectibles: CollectiblesMirror<L>,
    intervals: RefreshIntervals,
    slots: Slots,
    /// Source of completion stamps, shared by all slots.
    clock: AtomicU64,
    state: watch::Sender<RegistrySnapshot>,
}

/// Drives refreshes of the registry view for one consumer.
///
/// Cheap to clone; clones share state.
pub struct RefreshScheduler<L> {
    inner: Arc<Inner<L>>,
}

impl<L> Clone for RefreshScheduler<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L> RefreshScheduler<L>
where
    L: LedgerReader + Clone,
{
    /// Scheduler over `ledger`, starting disconnected.
    pub fn new(ledger: L, config: &RegistryConfig) -> Self {
        let source = EventSourceAdapter::new(ledger.clone(), config);
        Self::from_parts(
            InventoryProjector::new(source, config.event_page_limit),
            CreditLedgerMirror::new(ledger.clone(), config),
            CollectiblesMirror::new(ledger, config),
            RefreshIntervals::from_config(config),
        )
    }

    pub fn from_parts(
        inventory: InventoryProjector<L>,
        membership: CreditLedgerMirror<L>,
        collectibles: CollectiblesMirror<L>,
        intervals: RefreshIntervals,
    ) -> Self {
        let (state, _) = watch::channel(RegistrySnapshot::new(SessionId::new(), None));
        Self {
            inner: Arc::new(Inner {
                inventory,
                membership,
                collectibles,
                intervals,
                slots: Slots::default(),
                clock: AtomicU64::new(0),
                state,
            }),
        }
    }
}

impl<L: LedgerReader> RefreshScheduler<L> {
    pub fn intervals(&self) -> RefreshIntervals {
        self.inner.intervals
    }

    /// Current state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receives a new value after every applied change.
    pub fn subscribe(&self) -> watch::Receiver<RegistrySnapshot> {
        self.inner.state.subscribe()
    }

    pub fn session(&self) -> SessionId {
        self.inner.state.borrow().session
    }

    /// Eligibility of withdrawing `item_key`, computed fresh from the current state.
    pub fn validate(&self, item_key: Option<ItemKey>) -> ValidationResult {
        self.inner.state.borrow().validate(item_key)
    }

    /// Switch the connected identity (`None` = disconnected).
    ///
    /// A different identity starts a new session: results still in flight for
    /// the old one are discarded when they land, and identity-scoped state is
    /// reset. Setting the current identity again is a no-op.
    pub fn set_identity(&self, user: Option<UserAddress>) -> SessionId {
        let mut session = None;
        self.inner.state.send_if_modified(|snap| {
            if snap.user == user {
                session = Some(snap.session);
                return false;
            }
            let next = SessionId::new();
            info!(previous = %snap.session, session = %next, connected = user.is_some(), "identity changed");
            snap.session = next;
            snap.user = user;
            snap.reset_identity_scoped();
            session = Some(next);
            true
        });
        session.unwrap_or_else(|| self.session())
    }

    /// Refresh every data class concurrently.
    ///
    /// Resolves once all of them settle; fails listing each class whose fetch
    /// failed.
    pub async fn refresh_all(&self) -> Result<RefreshReport, RefreshError> {
        let (inventory, membership, collectibles) = tokio::join!(
            self.run(DataClass::Inventory),
            self.run(DataClass::Membership),
            self.run(DataClass::Collectibles),
        );
        report([inventory, membership, collectibles])
    }

    pub async fn refresh_class(&self, class: DataClass) -> Result<RefreshReport, RefreshError> {
        report([self.run(class).await])
    }

    /// A mutation (store, withdraw, register) went through: refresh once now
    /// instead of waiting for the next tick.
    pub async fn on_transaction_success(&self, kind: MutationKind) -> Result<RefreshReport, RefreshError> {
        info!(mutation = %kind, "mutation confirmed, refreshing");
        self.refresh_all().await
    }

    /// A mutation failed. Nothing changed on the ledger, so nothing is refreshed.
    pub fn on_transaction_error(&self, message: &str) -> TransactionFailure {
        let failure = classify_transaction_error(message);
        warn!(error = message, classified = ?failure, "mutation failed");
        failure
    }

    async fn run(&self, class: DataClass) -> ClassRun {
        let slot = self.inner.slots.get(class);
        let asked_after = slot.started.load(Ordering::SeqCst);
        let _gate = slot.gate.lock().await;

        let (session, user) = {
            let snap = self.inner.state.borrow();
            (snap.session, snap.user.clone())
        };

        if let Some(done) = slot.last_completed() {
            let reusable = done.fetch_no > asked_after
                && done.outcome != Outcome::Discarded
                && (!class.is_identity_scoped() || done.session == session);
            if reusable {
                debug!(class = %class, fetch = done.fetch_no, "reusing refresh started after request");
                return ClassRun {
                    class,
                    outcome: done.outcome,
                    joined: true,
                };
            }
        }

        let fetch_no = slot.started.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self.fetch(class, user.as_ref()).await;
        let stamp = self.inner.clock.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = self.apply(class, session, stamp, fetched);

        slot.record(Completed {
            fetch_no,
            session,
            outcome: outcome.clone(),
        });
        ClassRun {
            class,
            outcome,
            joined: false,
        }
    }

    async fn fetch(&self, class: DataClass, user: Option<&UserAddress>) -> Result<Fetched, LedgerError> {
        match (class, user) {
            (DataClass::Inventory, _) => {
                let report = self.inner.inventory.refresh().await?;
                Ok(Fetched::Inventory {
                    inventory: report.inventory,
                    malformed: report.malformed.len(),
                })
            }
            (DataClass::Membership, Some(user)) => self.inner.membership.mirror(user).await.map(Fetched::Membership),
            (DataClass::Membership, None) => Ok(Fetched::Membership(LedgerLookup::NotRegistered)),
            (DataClass::Collectibles, Some(user)) => {
                self.inner.collectibles.mirror(user).await.map(Fetched::Collectibles)
            }
            (DataClass::Collectibles, None) => Ok(Fetched::Collectibles(Vec::new())),
        }
    }

    fn apply(
        &self,
        class: DataClass,
        session: SessionId,
        stamp: u64,
        fetched: Result<Fetched, LedgerError>,
    ) -> Outcome {
        let mut outcome = Outcome::Discarded;
        self.inner.state.send_if_modified(|snap| {
            if class.is_identity_scoped() && snap.session != session {
                debug!(class = %class, fetched_for = %session, current = %snap.session, "discarding refresh from previous session");
                return false;
            }
            if stamp <= snap.stamp(class) {
                debug!(class = %class, stamp, applied = snap.stamp(class), "discarding out-of-date refresh");
                return false;
            }

            snap.set_stamp(class, stamp);
            outcome = match fetched {
                Ok(fetched) => {
                    snap.store(fetched, Utc::now());
                    Outcome::Applied
                }
                Err(err) => {
                    let cause = err.to_string();
                    snap.fail(class, cause.clone());
                    Outcome::Failed(cause)
                }
            };
            true
        });
        outcome
    }
}

fn report<const N: usize>(runs: [ClassRun; N]) -> Result<RefreshReport, RefreshError> {
    let mut report = RefreshReport::default();
    let mut failures = Vec::new();

    for run in runs {
        if run.joined {
            report.joined.push(run.class);
        }
        match run.outcome {
            Outcome::Applied => report.applied.push(run.class),
            Outcome::Discarded => report.discarded.push(run.class),
            Outcome::Failed(cause) => failures.push((run.class, cause)),
        }
    }

    if failures.is_empty() {
        Ok(report)
    } else {
        Err(RefreshError::Failed { failures })
    }
}
