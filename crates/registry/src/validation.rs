//! Withdrawal eligibility.
//!
//! The decision combines the projected inventory with the caller's credit
//! ledger. Rules are checked in a fixed order and the first match wins; later
//! rules assume the earlier ones passed.

use serde::{Deserialize, Serialize};

use barterhub_core::ItemKey;

use crate::credit::LedgerLookup;
use crate::fetch::FetchState;
use crate::inventory::ProjectedInventory;

/// Machine-readable cause behind a [`ValidationResult`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    NoItemSpecified,
    /// Upstream data still loading; not a decision.
    Pending,
    /// Upstream data could not be loaded; retryable.
    FetchFailed,
    ItemUnavailable,
    NoMembership,
    NoCredits,
    NoCreditForItem,
    Permitted,
}

impl ReasonCode {
    pub fn message(self) -> &'static str {
        match self {
            ReasonCode::NoItemSpecified => "no item specified",
            ReasonCode::Pending => "checking eligibility",
            ReasonCode::FetchFailed => "could not load registry data",
            ReasonCode::ItemUnavailable => "item does not exist or already withdrawn",
            ReasonCode::NoMembership => "no active membership",
            ReasonCode::NoCredits => "no credits available",
            ReasonCode::NoCreditForItem => "no valid credit for this item",
            ReasonCode::Permitted => "withdrawal permitted",
        }
    }
}

impl core::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Eligibility of one withdrawal attempt.
///
/// Produced fresh for every request. A `pending` result is not a decision,
/// and a result with `error_detail` set means "retry", not "denied".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub eligible: bool,
    pub reason: String,
    pub code: ReasonCode,
    /// Keys the caller could withdraw instead (or the requested key when eligible).
    pub available_credit_keys: Vec<ItemKey>,
    pub pending: bool,
    pub error_detail: Option<String>,
}

impl ValidationResult {
    fn new(code: ReasonCode) -> Self {
        Self {
            eligible: code == ReasonCode::Permitted,
            reason: code.message().to_string(),
            code,
            available_credit_keys: Vec::new(),
            pending: code == ReasonCode::Pending,
            error_detail: None,
        }
    }

    fn with_keys(mut self, keys: Vec<ItemKey>) -> Self {
        self.available_credit_keys = keys;
        self
    }

    fn failed(cause: &str) -> Self {
        let mut result = Self::new(ReasonCode::FetchFailed);
        result.error_detail = Some(cause.to_string());
        result
    }

    /// A final "no" the caller may show as a denial.
    pub fn is_definitive_denial(&self) -> bool {
        !self.eligible && !self.pending && self.error_detail.is_none()
    }
}

/// Decide eligibility over loaded data.
pub fn decide(item_key: ItemKey, inventory: &ProjectedInventory, ledger: &LedgerLookup) -> ValidationResult {
    if !inventory.contains(item_key) {
        return ValidationResult::new(ReasonCode::ItemUnavailable);
    }

    let ledger = match ledger {
        LedgerLookup::NotRegistered => return ValidationResult::new(ReasonCode::NoMembership),
        LedgerLookup::Registered(ledger) => ledger,
    };

    let active = ledger.active_keys();
    if active.is_empty() {
        return ValidationResult::new(ReasonCode::NoCredits);
    }

    if !ledger.is_active(item_key) {
        return ValidationResult::new(ReasonCode::NoCreditForItem).with_keys(active);
    }

    ValidationResult::new(ReasonCode::Permitted).with_keys(vec![item_key])
}

/// Decide eligibility, accounting for upstream reads that are still in flight
/// or that failed.
///
/// Loading takes precedence over failure: while either read is pending the
/// answer is `pending`, whatever the other one did.
pub fn validate(
    item_key: Option<ItemKey>,
    inventory: &FetchState<ProjectedInventory>,
    ledger: &FetchState<LedgerLookup>,
) -> ValidationResult {
    let Some(item_key) = item_key else {
        return ValidationResult::new(ReasonCode::NoItemSpecified);
    };

    if inventory.is_pending() || ledger.is_pending() {
        return ValidationResult::new(ReasonCode::Pending);
    }

    match (inventory, ledger) {
        (FetchState::Ready(inventory), FetchState::Ready(ledger)) => decide(item_key, inventory, ledger),
        (FetchState::Failed(cause), _) | (_, FetchState::Failed(cause)) => ValidationResult::failed(cause),
        _ => ValidationResult::new(ReasonCode::Pending),
    }
}
