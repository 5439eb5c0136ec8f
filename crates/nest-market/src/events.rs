//! Marketplace notification events.
//!
//! Events are the externally durable audit trail beyond the state itself:
//! appended in call order, exactly one per successful transition, never for
//! a rejected call.

use crate::booking::{BookingId, BookingStatus};
use crate::property::PropertyId;
use nest_core::{AccountId, DayIndex};
use serde::{Deserialize, Serialize};

/// A notification appended by a successful marketplace transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A property was listed.
    PropertyListed {
        /// The new property.
        property_id: PropertyId,
        /// Its owner.
        owner: AccountId,
        /// Its nightly price.
        price_per_night: u64,
    },

    /// A renter requested a booking.
    BookingRequested {
        /// The new booking.
        booking_id: BookingId,
        /// The property requested.
        property_id: PropertyId,
        /// The requesting renter.
        renter: AccountId,
        /// First day of the stay.
        start_day: DayIndex,
        /// Day after the last day of the stay.
        end_day: DayIndex,
    },

    /// A booking moved to a new status.
    BookingStatusUpdated {
        /// The booking.
        booking_id: BookingId,
        /// Its new status.
        status: BookingStatus,
    },

    /// An owner changed a property's availability.
    AvailabilityUpdated {
        /// The property.
        property_id: PropertyId,
        /// First day changed.
        start_day: DayIndex,
        /// Day after the last day changed.
        end_day: DayIndex,
        /// Whether the range is now open.
        open: bool,
    },
}
