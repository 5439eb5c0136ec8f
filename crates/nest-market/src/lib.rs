//! # nest-market
//!
//! Peer-to-peer property-rental marketplace core.
//!
//! This crate provides:
//!
//! - Availability calendars — per-property day-level open/closed bitsets
//! - The booking ledger and its status machine
//! - [`RentalMarket`] — the orchestrator composing calendars, bookings,
//!   ownership checks, and token settlement
//! - The append-only [`MarketEvent`] notification log
//!
//! Every public operation executes atomically: the aggregate serializes all
//! state behind a single lock, so no call ever observes another call's
//! half-applied effects.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod booking;
pub mod calendar;
pub mod error;
pub mod events;
pub mod market;
pub mod pricing;
pub mod property;

pub use booking::{Booking, BookingId, BookingStatus};
pub use calendar::AvailabilityCalendar;
pub use error::MarketError;
pub use events::MarketEvent;
pub use market::RentalMarket;
pub use pricing::stay_cost;
pub use property::{Property, PropertyId, PropertyInfo};
