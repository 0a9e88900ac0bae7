//! Outcomes reported by the transaction collaborator.
//!
//! Mutations (deposit, withdraw, register) are built and signed elsewhere;
//! this side only learns whether they succeeded, and turns failures into
//! something a person can act on.

use serde::{Deserialize, Serialize};

/// A state-changing action submitted against the registry contract.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    Store,
    Withdraw,
    Register,
}

impl core::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            MutationKind::Store => "store",
            MutationKind::Withdraw => "withdraw",
            MutationKind::Register => "register",
        })
    }
}

/// Why a submitted mutation failed, as far as the error text tells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionFailure {
    UserRejected,
    SigningFailed,
    InsufficientFunds,
    Gas,
    Network,
    Other(String),
}

impl TransactionFailure {
    pub fn message(&self) -> &str {
        match self {
            TransactionFailure::UserRejected => "transaction cancelled by the user",
            TransactionFailure::SigningFailed => "could not sign the transaction; check your wallet",
            TransactionFailure::InsufficientFunds => "insufficient funds for the transaction",
            TransactionFailure::Gas => "gas error; make sure the account can pay for gas",
            TransactionFailure::Network => "connection error; check your network",
            TransactionFailure::Other(message) => message,
        }
    }

    /// Worth offering a retry button for.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransactionFailure::Network | TransactionFailure::Gas)
    }
}

impl core::fmt::Display for TransactionFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Classify a wallet/RPC error message. First match wins.
pub fn classify_transaction_error(message: &str) -> TransactionFailure {
    let lower = message.to_ascii_lowercase();

    if lower.contains("user rejected") {
        TransactionFailure::UserRejected
    } else if lower.contains("signtransaction") {
        TransactionFailure::SigningFailed
    } else if lower.contains("insufficient funds") {
        TransactionFailure::InsufficientFunds
    } else if lower.contains("gas") {
        TransactionFailure::Gas
    } else if lower.contains("network") {
        TransactionFailure::Network
    } else if message.trim().is_empty() {
        TransactionFailure::Other("unknown transaction error".to_string())
    } else {
        TransactionFailure::Other(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_failures() {
        assert_eq!(
            classify_transaction_error("User rejected the transaction"),
            TransactionFailure::UserRejected
        );
        assert_eq!(
            classify_transaction_error("dApp.signTransactionBlock failed"),
            TransactionFailure::SigningFailed
        );
        assert_eq!(
            classify_transaction_error("insufficient funds for gas"),
            TransactionFailure::InsufficientFunds
        );
        assert_eq!(classify_transaction_error("GasBudgetTooLow"), TransactionFailure::Gas);
        assert_eq!(classify_transaction_error("network unreachable"), TransactionFailure::Network);
    }

    #[test]
    fn unknown_errors_keep_their_text() {
        assert_eq!(
            classify_transaction_error("MoveAbort(3)"),
            TransactionFailure::Other("MoveAbort(3)".to_string())
        );
        assert_eq!(classify_transaction_error("  ").message(), "unknown transaction error");
    }
}
