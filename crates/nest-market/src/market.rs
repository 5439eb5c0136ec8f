//! The rental-market orchestrator.
//!
//! [`RentalMarket`] composes property calendars, the booking ledger,
//! ownership checks, and token settlement behind one aggregate. All state
//! lives in a single [`MarketState`] guarded by one `tokio` mutex; every
//! operation holds the lock for its entire body, including the one call
//! into the token ledger, so calls serialize and none observes another's
//! half-applied effects.
//!
//! Money moves on exactly two paths: `confirm_booking` pulls the renter's
//! escrow into market custody before the status flip, and
//! `complete_booking` pays the owner out of custody, flipping the status
//! only after the payout succeeds. Either ledger failure leaves the booking
//! where it was.

use crate::booking::{Booking, BookingId, BookingStatus};
use crate::error::MarketError;
use crate::events::MarketEvent;
use crate::pricing::stay_cost;
use crate::property::{Property, PropertyId, PropertyInfo};
use nest_core::{AccountId, Clock, SystemClock, Timestamp, day_index};
use nest_ledger::TokenLedger;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// All aggregate state, guarded by the market's single lock.
#[derive(Debug)]
struct MarketState {
    properties: BTreeMap<PropertyId, Property>,
    owner_index: HashMap<AccountId, Vec<PropertyId>>,
    bookings: BTreeMap<BookingId, Booking>,
    property_bookings: HashMap<PropertyId, Vec<BookingId>>,
    renter_bookings: HashMap<AccountId, Vec<BookingId>>,
    next_property_id: u64,
    next_booking_id: u64,
    events: Vec<MarketEvent>,
}

impl MarketState {
    fn new() -> Self {
        Self {
            properties: BTreeMap::new(),
            owner_index: HashMap::new(),
            bookings: BTreeMap::new(),
            property_bookings: HashMap::new(),
            renter_bookings: HashMap::new(),
            next_property_id: 1,
            next_booking_id: 1,
            events: Vec::new(),
        }
    }
}

/// The peer-to-peer rental marketplace aggregate.
pub struct RentalMarket {
    ledger: Arc<dyn TokenLedger>,
    clock: Arc<dyn Clock>,
    custody: AccountId,
    state: Mutex<MarketState>,
}

impl RentalMarket {
    /// Create a market settling through the given ledger, holding escrowed
    /// funds under the `custody` account.
    #[must_use]
    pub fn new(ledger: Arc<dyn TokenLedger>, custody: AccountId) -> Self {
        Self::with_clock(ledger, custody, Arc::new(SystemClock))
    }

    /// Create a market with an explicit time source.
    #[must_use]
    pub fn with_clock(
        ledger: Arc<dyn TokenLedger>,
        custody: AccountId,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            clock,
            custody,
            state: Mutex::new(MarketState::new()),
        }
    }

    /// The account escrowed funds are held under.
    #[must_use]
    pub fn custody(&self) -> &AccountId {
        &self.custody
    }

    // ------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------

    /// List a property, returning its new id.
    ///
    /// The calendar starts fully closed; a zero nightly price is legal.
    pub async fn list_property(&self, owner: &AccountId, price_per_night: u64) -> PropertyId {
        let mut state = self.state.lock().await;

        let id = PropertyId::new(state.next_property_id);
        state.next_property_id += 1;

        state
            .properties
            .insert(id, Property::new(id, owner.clone(), price_per_night));
        state.owner_index.entry(owner.clone()).or_default().push(id);
        state.events.push(MarketEvent::PropertyListed {
            property_id: id,
            owner: owner.clone(),
            price_per_night,
        });

        info!(property_id = %id, owner = %owner, price_per_night, "property listed");
        id
    }

    /// Ids of the caller's properties, in listing order.
    pub async fn my_properties(&self, owner: &AccountId) -> Vec<PropertyId> {
        let state = self.state.lock().await;
        state.owner_index.get(owner).cloned().unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Availability
    // ------------------------------------------------------------------

    /// Open or close every day the range `[start, end)` touches.
    ///
    /// Owner only.
    pub async fn set_availability(
        &self,
        caller: &AccountId,
        property_id: PropertyId,
        start: Timestamp,
        end: Timestamp,
        open: bool,
    ) -> Result<(), MarketError> {
        if start >= end {
            return Err(MarketError::InvalidRange { start, end });
        }

        let mut state = self.state.lock().await;
        let property = state
            .properties
            .get_mut(&property_id)
            .ok_or(MarketError::PropertyNotFound(property_id))?;
        if property.owner() != caller {
            return Err(MarketError::NotAuthorized {
                account: caller.clone(),
                action: "update availability",
            });
        }

        let (start_day, end_day) = (day_index(start), day_index(end));
        property.set_range(start_day, end_day, open);
        state.events.push(MarketEvent::AvailabilityUpdated {
            property_id,
            start_day,
            end_day,
            open,
        });

        debug!(property_id = %property_id, start_day, end_day, open, "availability updated");
        Ok(())
    }

    /// Whether the property is open on the day containing `at`.
    pub async fn is_available(
        &self,
        property_id: PropertyId,
        at: Timestamp,
    ) -> Result<bool, MarketError> {
        let state = self.state.lock().await;
        state
            .properties
            .get(&property_id)
            .map(|property| property.is_open(day_index(at)))
            .ok_or(MarketError::PropertyNotFound(property_id))
    }

    /// One boolean per day the range `[start, end)` touches, in order.
    pub async fn availability_range(
        &self,
        property_id: PropertyId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<bool>, MarketError> {
        if start >= end {
            return Err(MarketError::InvalidRange { start, end });
        }

        let state = self.state.lock().await;
        state
            .properties
            .get(&property_id)
            .map(|property| property.query_range(day_index(start), day_index(end)))
            .ok_or(MarketError::PropertyNotFound(property_id))
    }

    // ------------------------------------------------------------------
    // Pricing
    // ------------------------------------------------------------------

    /// Total cost of a stay over `[start, end)` at the property's current
    /// nightly price.
    pub async fn total_cost(
        &self,
        property_id: PropertyId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<u64, MarketError> {
        let state = self.state.lock().await;
        state
            .properties
            .get(&property_id)
            .map(|property| stay_cost(property.price_per_night(), start, end))
            .ok_or(MarketError::PropertyNotFound(property_id))
    }

    // ------------------------------------------------------------------
    // Booking lifecycle
    // ------------------------------------------------------------------

    /// Request a stay over `[start, end)`.
    ///
    /// Every day in the range must be open and the renter must not be the
    /// owner. No funds move and no calendar days close: several pending
    /// requests may overlap the same dates, and the owner chooses which to
    /// advance. The price is fixed here and never recomputed.
    pub async fn request_booking(
        &self,
        renter: &AccountId,
        property_id: PropertyId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<BookingId, MarketError> {
        if start >= end {
            return Err(MarketError::InvalidRange { start, end });
        }
        let (start_day, end_day) = (day_index(start), day_index(end));
        // A stay needs at least one whole night
        if start_day >= end_day {
            return Err(MarketError::InvalidRange { start, end });
        }

        let mut state = self.state.lock().await;
        let property = state
            .properties
            .get(&property_id)
            .ok_or(MarketError::PropertyNotFound(property_id))?;
        if property.owner() == renter {
            return Err(MarketError::NotAuthorized {
                account: renter.clone(),
                action: "book their own property",
            });
        }
        if let Some(day) = property.first_closed(start_day, end_day) {
            return Err(MarketError::Unavailable { property_id, day });
        }
        let total_price = stay_cost(property.price_per_night(), start, end);

        let id = BookingId::new(state.next_booking_id);
        state.next_booking_id += 1;

        state.bookings.insert(
            id,
            Booking::new(id, property_id, renter.clone(), start_day, end_day, total_price),
        );
        state
            .property_bookings
            .entry(property_id)
            .or_default()
            .push(id);
        state
            .renter_bookings
            .entry(renter.clone())
            .or_default()
            .push(id);
        state.events.push(MarketEvent::BookingRequested {
            booking_id: id,
            property_id,
            renter: renter.clone(),
            start_day,
            end_day,
        });

        info!(
            booking_id = %id,
            property_id = %property_id,
            renter = %renter,
            start_day,
            end_day,
            total_price,
            "booking requested"
        );
        Ok(id)
    }

    /// Accept a pending booking request.
    ///
    /// Owner only; the renter still has to confirm with funds.
    pub async fn pre_approve_booking(
        &self,
        caller: &AccountId,
        booking_id: BookingId,
    ) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;

        let booking = state
            .bookings
            .get(&booking_id)
            .ok_or(MarketError::BookingNotFound(booking_id))?;
        let property_id = booking.property_id;
        let owner = state
            .properties
            .get(&property_id)
            .ok_or(MarketError::PropertyNotFound(property_id))?
            .owner()
            .clone();
        if owner != *caller {
            return Err(MarketError::NotAuthorized {
                account: caller.clone(),
                action: "pre-approve the booking",
            });
        }

        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or(MarketError::BookingNotFound(booking_id))?;
        booking.transition_to(BookingStatus::PreApproved)?;
        state.events.push(MarketEvent::BookingStatusUpdated {
            booking_id,
            status: BookingStatus::PreApproved,
        });

        info!(booking_id = %booking_id, "booking pre-approved");
        Ok(())
    }

    /// Confirm a pre-approved booking by escrowing its price.
    ///
    /// Renter only. The renter must have authorized the market to move at
    /// least the booking's total price; the pull happens before the status
    /// flip, so a failed payment leaves the booking pre-approved and
    /// nothing moved.
    pub async fn confirm_booking(
        &self,
        caller: &AccountId,
        booking_id: BookingId,
    ) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;

        let booking = state
            .bookings
            .get(&booking_id)
            .ok_or(MarketError::BookingNotFound(booking_id))?;
        if booking.renter != *caller {
            return Err(MarketError::NotAuthorized {
                account: caller.clone(),
                action: "confirm the booking",
            });
        }
        if !booking.status.can_transition_to(BookingStatus::Confirmed) {
            return Err(MarketError::InvalidState {
                booking_id,
                from: booking.status,
                to: BookingStatus::Confirmed,
            });
        }
        let renter = booking.renter.clone();
        let amount = booking.total_price;

        self.ledger
            .transfer_from(&renter, &self.custody, &self.custody, amount)
            .await?;

        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or(MarketError::BookingNotFound(booking_id))?;
        booking.transition_to(BookingStatus::Confirmed)?;
        state.events.push(MarketEvent::BookingStatusUpdated {
            booking_id,
            status: BookingStatus::Confirmed,
        });

        info!(booking_id = %booking_id, renter = %renter, amount, "booking confirmed, funds escrowed");
        Ok(())
    }

    /// Settle a confirmed booking whose stay has ended, paying the owner.
    ///
    /// Callable by anyone, so either party (or a third-party keeper) can
    /// trigger payout once due. A failed payout leaves the booking
    /// confirmed; the same call can simply be retried.
    pub async fn complete_booking(&self, booking_id: BookingId) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;

        let booking = state
            .bookings
            .get(&booking_id)
            .ok_or(MarketError::BookingNotFound(booking_id))?;
        if !booking.status.can_transition_to(BookingStatus::Completed) {
            return Err(MarketError::InvalidState {
                booking_id,
                from: booking.status,
                to: BookingStatus::Completed,
            });
        }
        let today = self.clock.today();
        if today < booking.end_day {
            return Err(MarketError::StayNotEnded {
                booking_id,
                today,
                end_day: booking.end_day,
            });
        }
        let property_id = booking.property_id;
        let amount = booking.total_price;
        let owner = state
            .properties
            .get(&property_id)
            .ok_or(MarketError::PropertyNotFound(property_id))?
            .owner()
            .clone();

        self.ledger.transfer(&self.custody, &owner, amount).await?;

        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or(MarketError::BookingNotFound(booking_id))?;
        booking.transition_to(BookingStatus::Completed)?;
        state.events.push(MarketEvent::BookingStatusUpdated {
            booking_id,
            status: BookingStatus::Completed,
        });

        info!(booking_id = %booking_id, owner = %owner, amount, "booking completed, owner paid");
        Ok(())
    }

    /// Cancel a booking before any funds have moved.
    ///
    /// Renter or owner; only pending and pre-approved bookings cancel. A
    /// pre-approved stay had its days taken off the market by the owner, so
    /// those days re-open; a pending request never held any days.
    pub async fn cancel_booking(
        &self,
        caller: &AccountId,
        booking_id: BookingId,
    ) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;

        let booking = state
            .bookings
            .get(&booking_id)
            .ok_or(MarketError::BookingNotFound(booking_id))?;
        let property_id = booking.property_id;
        let owner = state
            .properties
            .get(&property_id)
            .ok_or(MarketError::PropertyNotFound(property_id))?
            .owner()
            .clone();
        if booking.renter != *caller && owner != *caller {
            return Err(MarketError::NotAuthorized {
                account: caller.clone(),
                action: "cancel the booking",
            });
        }
        let prior = booking.status;
        let (start_day, end_day) = (booking.start_day, booking.end_day);

        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or(MarketError::BookingNotFound(booking_id))?;
        booking.transition_to(BookingStatus::Cancelled)?;
        state.events.push(MarketEvent::BookingStatusUpdated {
            booking_id,
            status: BookingStatus::Cancelled,
        });

        if prior == BookingStatus::PreApproved {
            if let Some(property) = state.properties.get_mut(&property_id) {
                property.set_range(start_day, end_day, true);
            }
        }

        info!(booking_id = %booking_id, caller = %caller, prior = %prior, "booking cancelled");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Properties at or under `max_price` with every day in `[start, end)`
    /// open, ascending by id.
    pub async fn available_properties(
        &self,
        start: Timestamp,
        end: Timestamp,
        max_price: u64,
    ) -> Result<Vec<PropertyId>, MarketError> {
        if start >= end {
            return Err(MarketError::InvalidRange { start, end });
        }
        let (start_day, end_day) = (day_index(start), day_index(end));

        let state = self.state.lock().await;
        Ok(state
            .properties
            .values()
            .filter(|property| {
                property.price_per_night() <= max_price
                    && property.first_closed(start_day, end_day).is_none()
            })
            .map(Property::id)
            .collect())
    }

    /// Booking ids recorded against a property, in request order.
    ///
    /// With `only_open_requests`, restricted to pending and pre-approved
    /// bookings.
    pub async fn property_bookings(
        &self,
        property_id: PropertyId,
        only_open_requests: bool,
    ) -> Result<Vec<BookingId>, MarketError> {
        let state = self.state.lock().await;
        if !state.properties.contains_key(&property_id) {
            return Err(MarketError::PropertyNotFound(property_id));
        }

        let ids = state
            .property_bookings
            .get(&property_id)
            .cloned()
            .unwrap_or_default();
        if !only_open_requests {
            return Ok(ids);
        }
        Ok(ids
            .into_iter()
            .filter(|id| {
                state
                    .bookings
                    .get(id)
                    .is_some_and(|booking| booking.status.is_open_request())
            })
            .collect())
    }

    /// Booking ids requested by a renter, in request order.
    pub async fn renter_bookings(&self, renter: &AccountId) -> Vec<BookingId> {
        let state = self.state.lock().await;
        state.renter_bookings.get(renter).cloned().unwrap_or_default()
    }

    /// Snapshot of a booking record.
    pub async fn booking(&self, booking_id: BookingId) -> Result<Booking, MarketError> {
        let state = self.state.lock().await;
        state
            .bookings
            .get(&booking_id)
            .cloned()
            .ok_or(MarketError::BookingNotFound(booking_id))
    }

    /// Snapshot of a listing (id, owner, nightly price).
    pub async fn property_info(
        &self,
        property_id: PropertyId,
    ) -> Result<PropertyInfo, MarketError> {
        let state = self.state.lock().await;
        state
            .properties
            .get(&property_id)
            .map(Property::info)
            .ok_or(MarketError::PropertyNotFound(property_id))
    }

    /// How many properties have ever been listed.
    pub async fn property_count(&self) -> u64 {
        self.state.lock().await.next_property_id - 1
    }

    /// How many bookings have ever been requested.
    pub async fn booking_count(&self) -> u64 {
        self.state.lock().await.next_booking_id - 1
    }

    /// The notification log, in call order.
    pub async fn events(&self) -> Vec<MarketEvent> {
        self.state.lock().await.events.clone()
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl fmt::Debug for RentalMarket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RentalMarket")
            .field("custody", &self.custody)
            .finish_non_exhaustive()
    }
}
