//! Booking records and their status machine.
//!
//! A booking advances only forward: `Pending -> PreApproved -> Confirmed ->
//! Completed`, with `Cancelled` reachable from the two pre-payment states.
//! No transition skips a state and none reverses.

use crate::error::MarketError;
use crate::property::PropertyId;
use nest_core::{AccountId, DayIndex};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique booking identifier, assigned sequentially starting at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BookingId(u64);

impl BookingId {
    /// Create a booking id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Requested by a renter, awaiting the owner.
    Pending,
    /// Accepted by the owner, awaiting the renter's escrow.
    PreApproved,
    /// Funds escrowed with the market; the stay will happen.
    Confirmed,
    /// Stay over and owner paid.
    Completed,
    /// Withdrawn before confirmation.
    Cancelled,
}

impl BookingStatus {
    /// Checks if a transition to the target status is valid.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        use BookingStatus::{Cancelled, Completed, Confirmed, Pending, PreApproved};

        matches!(
            (self, target),
            (Pending, PreApproved)
                | (PreApproved, Confirmed)
                | (Confirmed, Completed)
                | (Pending | PreApproved, Cancelled)
        )
    }

    /// Whether the booking can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the booking is still an open request (no funds escrowed).
    #[must_use]
    pub const fn is_open_request(self) -> bool {
        matches!(self, Self::Pending | Self::PreApproved)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::PreApproved => write!(f, "pre_approved"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A booking record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier.
    pub id: BookingId,
    /// The property being booked.
    pub property_id: PropertyId,
    /// The requesting renter.
    pub renter: AccountId,
    /// First day of the stay.
    pub start_day: DayIndex,
    /// Day after the last day of the stay (half-open).
    pub end_day: DayIndex,
    /// Current status.
    pub status: BookingStatus,
    /// Price fixed at request time; never recomputed, even if the
    /// property's nightly price later changes.
    pub total_price: u64,
}

impl Booking {
    /// Create a new pending booking.
    #[must_use]
    pub(crate) const fn new(
        id: BookingId,
        property_id: PropertyId,
        renter: AccountId,
        start_day: DayIndex,
        end_day: DayIndex,
        total_price: u64,
    ) -> Self {
        Self {
            id,
            property_id,
            renter,
            start_day,
            end_day,
            status: BookingStatus::Pending,
            total_price,
        }
    }

    /// Attempts to advance to a new status.
    pub(crate) fn transition_to(&mut self, target: BookingStatus) -> Result<(), MarketError> {
        if self.status.can_transition_to(target) {
            self.status = target;
            Ok(())
        } else {
            Err(MarketError::InvalidState {
                booking_id: self.id,
                from: self.status,
                to: target,
            })
        }
    }
}
