//! # nest-ledger
//!
//! The fungible-token ledger boundary of the Nest marketplace.
//!
//! The marketplace moves money through exactly two calls — pulling a
//! renter's escrow at confirmation and paying the owner at settlement. This
//! crate provides:
//!
//! - [`TokenLedger`] — The capability trait the marketplace consumes
//! - [`InMemoryLedger`] — A balances/allowances backend for tests and local
//!   development
//! - [`LedgerError`] — Failure modes of ledger calls
//!
//! The token's own rules (eligibility gating, supply curve) live with the
//! token system, not here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod ledger;

pub use error::{LedgerError, Result};
pub use ledger::{InMemoryLedger, TokenLedger};
