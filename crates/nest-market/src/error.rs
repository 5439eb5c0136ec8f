//! Error types for marketplace operations.
//!
//! Every variant is a guard failure: the operation checked a precondition,
//! found it unmet, and changed nothing. The one retryable-without-action
//! case is a payment failure during settlement, which leaves the booking
//! confirmed so the same call can be repeated.

use crate::booking::{BookingId, BookingStatus};
use crate::property::PropertyId;
use nest_core::{AccountId, DayIndex, Timestamp};
use thiserror::Error;

/// Errors that can occur in marketplace operations.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Unknown property id.
    #[error("property not found: {0}")]
    PropertyNotFound(PropertyId),

    /// Unknown booking id.
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    /// The caller lacks the role the operation requires.
    #[error("not authorized: {account} cannot {action}")]
    NotAuthorized {
        /// The rejected caller.
        account: AccountId,
        /// What they attempted.
        action: &'static str,
    },

    /// A half-open range with start not before end.
    #[error("invalid range: start {start} must be before end {end}")]
    InvalidRange {
        /// Range start timestamp.
        start: Timestamp,
        /// Range end timestamp.
        end: Timestamp,
    },

    /// A requested day is not open for booking.
    #[error("property {property_id} is not open on day {day}")]
    Unavailable {
        /// The property queried.
        property_id: PropertyId,
        /// First closed day in the requested range.
        day: DayIndex,
    },

    /// The booking is not in a status the transition allows.
    #[error("invalid state: booking {booking_id} cannot move {from} -> {to}")]
    InvalidState {
        /// The booking involved.
        booking_id: BookingId,
        /// Its current status.
        from: BookingStatus,
        /// The attempted target status.
        to: BookingStatus,
    },

    /// Settlement attempted before the stay's end day.
    #[error("booking {booking_id} has not ended: today is day {today}, stay ends day {end_day}")]
    StayNotEnded {
        /// The booking involved.
        booking_id: BookingId,
        /// Current day index.
        today: DayIndex,
        /// The stay's end day.
        end_day: DayIndex,
    },

    /// A token-ledger call failed; no funds moved.
    #[error("payment failed: {0}")]
    PaymentFailed(String),
}

impl From<nest_ledger::LedgerError> for MarketError {
    fn from(e: nest_ledger::LedgerError) -> Self {
        Self::PaymentFailed(e.to_string())
    }
}
