//! The token-ledger capability and its in-memory backend.
//!
//! [`TokenLedger`] is the seam the marketplace settles through. The
//! [`InMemoryLedger`] backend keeps balances and spending allowances in
//! process, which is enough for tests and local development; a production
//! deployment substitutes a backend that talks to the real token system.

use crate::error::{LedgerError, Result};
use nest_core::AccountId;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// The two settlement calls plus the pre-authorization query.
///
/// Implementations must move funds atomically: a returned error means no
/// balance changed. Calls are fallible but never re-enter the marketplace.
pub trait TokenLedger: Send + Sync {
    /// Move `amount` from `from` to `to`, spending `from`'s own balance.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` cannot cover `amount`.
    fn transfer<'a>(
        &'a self,
        from: &'a AccountId,
        to: &'a AccountId,
        amount: u64,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Move `amount` from `from` to `to` on behalf of `spender`.
    ///
    /// Consumes `spender`'s allowance on `from`'s balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the allowance or the balance cannot cover
    /// `amount`.
    fn transfer_from<'a>(
        &'a self,
        from: &'a AccountId,
        spender: &'a AccountId,
        to: &'a AccountId,
        amount: u64,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// How much `spender` is currently authorized to move from `owner`.
    fn allowance<'a>(
        &'a self,
        owner: &'a AccountId,
        spender: &'a AccountId,
    ) -> Pin<Box<dyn Future<Output = u64> + Send + 'a>>;
}

/// Balances and allowances held in process.
#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<AccountId, u64>,
    allowances: HashMap<(AccountId, AccountId), u64>,
}

impl LedgerState {
    fn balance(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn credit(&mut self, account: &AccountId, amount: u64) {
        let balance = self.balances.entry(account.clone()).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Debit after the caller has verified the balance covers `amount`.
    fn debit(&mut self, account: &AccountId, amount: u64) {
        if let Some(balance) = self.balances.get_mut(account) {
            *balance = balance.saturating_sub(amount);
        }
    }
}

/// An in-memory token ledger.
///
/// Cloned handles share state, so a test can keep one handle for balance
/// assertions while the marketplace settles through another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit freshly issued tokens to an account.
    pub async fn mint(&self, to: &AccountId, amount: u64) {
        let mut state = self.state.lock().await;
        state.credit(to, amount);

        info!(to = %to, amount, "minted tokens");
    }

    /// Authorize `spender` to move up to `amount` from `owner`.
    ///
    /// Replaces any previous allowance for the pair.
    pub async fn approve(&self, owner: &AccountId, spender: &AccountId, amount: u64) {
        let mut state = self.state.lock().await;
        state
            .allowances
            .insert((owner.clone(), spender.clone()), amount);

        info!(owner = %owner, spender = %spender, amount, "allowance set");
    }

    /// Current balance of an account.
    pub async fn balance(&self, account: &AccountId) -> u64 {
        self.state.lock().await.balance(account)
    }
}

impl TokenLedger for InMemoryLedger {
    fn transfer<'a>(
        &'a self,
        from: &'a AccountId,
        to: &'a AccountId,
        amount: u64,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;

            let have = state.balance(from);
            if have < amount {
                return Err(LedgerError::insufficient_balance(from.clone(), have, amount));
            }

            state.debit(from, amount);
            state.credit(to, amount);

            debug!(from = %from, to = %to, amount, "transfer completed");
            Ok(())
        })
    }

    fn transfer_from<'a>(
        &'a self,
        from: &'a AccountId,
        spender: &'a AccountId,
        to: &'a AccountId,
        amount: u64,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;

            let approved = state.allowance(from, spender);
            if approved < amount {
                return Err(LedgerError::insufficient_allowance(
                    from.clone(),
                    spender.clone(),
                    approved,
                    amount,
                ));
            }

            let have = state.balance(from);
            if have < amount {
                return Err(LedgerError::insufficient_balance(from.clone(), have, amount));
            }

            state
                .allowances
                .insert((from.clone(), spender.clone()), approved - amount);
            state.debit(from, amount);
            state.credit(to, amount);

            debug!(from = %from, spender = %spender, to = %to, amount, "delegated transfer completed");
            Ok(())
        })
    }

    fn allowance<'a>(
        &'a self,
        owner: &'a AccountId,
        spender: &'a AccountId,
    ) -> Pin<Box<dyn Future<Output = u64> + Send + 'a>> {
        Box::pin(async move { self.state.lock().await.allowance(owner, spender) })
    }
}
