//! Error types for ledger operations.

use nest_core::AccountId;
use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during token-ledger calls.
///
/// A failed call never moves funds partially; callers may treat any variant
/// as "nothing happened".
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The paying account does not hold enough tokens.
    #[error("insufficient balance: {account} has {have}, needs {need}")]
    InsufficientBalance {
        /// Account being debited.
        account: AccountId,
        /// Current balance.
        have: u64,
        /// Amount required.
        need: u64,
    },

    /// The spender has not been authorized to move this much from the owner.
    #[error("insufficient allowance: {spender} may move {have} from {owner}, needs {need}")]
    InsufficientAllowance {
        /// Account whose funds would move.
        owner: AccountId,
        /// Account attempting the move.
        spender: AccountId,
        /// Currently approved amount.
        have: u64,
        /// Amount required.
        need: u64,
    },
}

impl LedgerError {
    /// Create an insufficient balance error.
    #[must_use]
    pub const fn insufficient_balance(account: AccountId, have: u64, need: u64) -> Self {
        Self::InsufficientBalance {
            account,
            have,
            need,
        }
    }

    /// Create an insufficient allowance error.
    #[must_use]
    pub const fn insufficient_allowance(
        owner: AccountId,
        spender: AccountId,
        have: u64,
        need: u64,
    ) -> Self {
        Self::InsufficientAllowance {
            owner,
            spender,
            have,
            need,
        }
    }
}
