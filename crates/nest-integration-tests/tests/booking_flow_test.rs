//! End-to-end scenarios for the Nest rental marketplace.
//!
//! Walks the complete lifecycle of a stay:
//! 1. Owner lists a property
//! 2. Owner opens an availability window
//! 3. Renter requests a booking (no funds move)
//! 4. Owner pre-approves
//! 5. Renter confirms, escrowing funds with the market
//! 6. Time passes the stay's end
//! 7. Anyone settles, paying the owner
//!
//! plus the cancellation paths and the failure scenarios around each guard.

use nest_core::{AccountId, ManualClock, SECONDS_PER_DAY};
use nest_integration_tests::init_tracing;
use nest_ledger::InMemoryLedger;
use nest_market::{BookingStatus, MarketError, MarketEvent, PropertyId, RentalMarket};
use std::sync::Arc;

const DAY: i64 = SECONDS_PER_DAY;

fn ts(day: i64) -> i64 {
    day * DAY
}

fn acct(name: &str) -> AccountId {
    AccountId::new(name)
}

struct World {
    market: RentalMarket,
    ledger: InMemoryLedger,
    clock: ManualClock,
    owner: AccountId,
    renter: AccountId,
}

fn world() -> World {
    init_tracing();
    let ledger = InMemoryLedger::new();
    let clock = ManualClock::new(0);
    let market = RentalMarket::with_clock(
        Arc::new(ledger.clone()),
        acct("market-custody"),
        Arc::new(clock.clone()),
    );
    World {
        market,
        ledger,
        clock,
        owner: acct("owner-1"),
        renter: acct("renter-1"),
    }
}

// ============================================================================
// Full End-to-End Flow
// ============================================================================

#[tokio::test]
async fn full_booking_flow_end_to_end() {
    let w = world();

    // Step 1: list a property at 100 per night
    let property_id = w.market.list_property(&w.owner, 100).await;
    assert_eq!(property_id, PropertyId::new(1));

    // Step 2: open days [10, 15)
    w.market
        .set_availability(&w.owner, property_id, ts(10), ts(15), true)
        .await
        .unwrap();
    assert!(w.market.is_available(property_id, ts(10)).await.unwrap());

    // Step 3: request a stay over [10, 12) — two nights, price fixed at 200
    let booking_id = w
        .market
        .request_booking(&w.renter, property_id, ts(10), ts(12))
        .await
        .unwrap();
    let booking = w.market.booking(booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.total_price, 200);

    // Step 4: owner pre-approves
    w.market
        .pre_approve_booking(&w.owner, booking_id)
        .await
        .unwrap();

    // Step 5: renter funds an allowance and confirms; 200 moves to custody
    w.ledger.mint(&w.renter, 500).await;
    w.ledger.approve(&w.renter, w.market.custody(), 200).await;
    w.market.confirm_booking(&w.renter, booking_id).await.unwrap();

    assert_eq!(w.ledger.balance(&w.renter).await, 300);
    assert_eq!(w.ledger.balance(w.market.custody()).await, 200);

    // Step 6: advance time past the stay's end (day 12)
    w.clock.set(ts(12) + 3600);

    // Step 7: a third party settles; the owner is paid
    w.market.complete_booking(booking_id).await.unwrap();

    let booking = w.market.booking(booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Completed);
    assert_eq!(w.ledger.balance(&w.owner).await, 200);
    assert_eq!(w.ledger.balance(w.market.custody()).await, 0);
    assert_eq!(w.ledger.balance(&w.renter).await, 300);

    // The notification log tells the whole story, in order
    let events = w.market.events().await;
    assert_eq!(events.len(), 6);
    assert!(matches!(events[0], MarketEvent::PropertyListed { .. }));
    assert!(matches!(events[1], MarketEvent::AvailabilityUpdated { open: true, .. }));
    assert!(matches!(events[2], MarketEvent::BookingRequested { .. }));
    assert!(matches!(
        events[3],
        MarketEvent::BookingStatusUpdated {
            status: BookingStatus::PreApproved,
            ..
        }
    ));
    assert!(matches!(
        events[4],
        MarketEvent::BookingStatusUpdated {
            status: BookingStatus::Confirmed,
            ..
        }
    ));
    assert!(matches!(
        events[5],
        MarketEvent::BookingStatusUpdated {
            status: BookingStatus::Completed,
            ..
        }
    ));
}

// ============================================================================
// Request Failures
// ============================================================================

#[tokio::test]
async fn request_on_closed_range_creates_no_booking() {
    let w = world();
    let property_id = w.market.list_property(&w.owner, 100).await;
    // Nothing opened: every day defaults to closed

    let err = w
        .market
        .request_booking(&w.renter, property_id, ts(10), ts(12))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Unavailable { .. }));

    // No booking record, no counter movement, no event
    assert_eq!(w.market.booking_count().await, 0);
    assert!(
        w.market
            .property_bookings(property_id, false)
            .await
            .unwrap()
            .is_empty()
    );
    let events = w.market.events().await;
    assert!(matches!(events.last(), Some(MarketEvent::PropertyListed { .. })));
}

#[tokio::test]
async fn request_against_unknown_property_fails() {
    let w = world();
    let err = w
        .market
        .request_booking(&w.renter, PropertyId::new(42), ts(10), ts(12))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::PropertyNotFound(_)));
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn cancel_pending_booking_leaves_calendar_untouched() {
    let w = world();
    let property_id = w.market.list_property(&w.owner, 100).await;
    w.market
        .set_availability(&w.owner, property_id, ts(10), ts(15), true)
        .await
        .unwrap();
    let booking_id = w
        .market
        .request_booking(&w.renter, property_id, ts(10), ts(12))
        .await
        .unwrap();

    w.market.cancel_booking(&w.renter, booking_id).await.unwrap();

    assert_eq!(
        w.market.booking(booking_id).await.unwrap().status,
        BookingStatus::Cancelled
    );
    // A pending request never closed any days, so the window is as the
    // owner left it
    assert_eq!(
        w.market
            .availability_range(property_id, ts(10), ts(15))
            .await
            .unwrap(),
        vec![true; 5]
    );
    // And no funds ever moved
    assert_eq!(w.ledger.balance(&w.renter).await, 0);
    assert_eq!(w.ledger.balance(w.market.custody()).await, 0);
}

#[tokio::test]
async fn cancelled_booking_cannot_be_revived() {
    let w = world();
    let property_id = w.market.list_property(&w.owner, 100).await;
    w.market
        .set_availability(&w.owner, property_id, ts(10), ts(15), true)
        .await
        .unwrap();
    let booking_id = w
        .market
        .request_booking(&w.renter, property_id, ts(10), ts(12))
        .await
        .unwrap();
    w.market.cancel_booking(&w.owner, booking_id).await.unwrap();

    let err = w
        .market
        .pre_approve_booking(&w.owner, booking_id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MarketError::InvalidState {
            from: BookingStatus::Cancelled,
            ..
        }
    ));
    let err = w
        .market
        .confirm_booking(&w.renter, booking_id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidState { .. }));
}

// ============================================================================
// Settlement Guards
// ============================================================================

#[tokio::test]
async fn settlement_waits_for_confirmation_and_checkout() {
    let w = world();
    let property_id = w.market.list_property(&w.owner, 100).await;
    w.market
        .set_availability(&w.owner, property_id, ts(10), ts(15), true)
        .await
        .unwrap();
    let booking_id = w
        .market
        .request_booking(&w.renter, property_id, ts(10), ts(12))
        .await
        .unwrap();
    w.market
        .pre_approve_booking(&w.owner, booking_id)
        .await
        .unwrap();

    // Not yet confirmed: settlement is an invalid-state failure even after
    // the stay would have ended
    w.clock.set(ts(20));
    let err = w.market.complete_booking(booking_id).await.unwrap_err();
    assert!(matches!(err, MarketError::InvalidState { .. }));

    // Confirm, then rewind to mid-stay: the time guard fails fast
    w.ledger.mint(&w.renter, 200).await;
    w.ledger.approve(&w.renter, w.market.custody(), 200).await;
    w.market.confirm_booking(&w.renter, booking_id).await.unwrap();
    w.clock.set(ts(11));
    let err = w.market.complete_booking(booking_id).await.unwrap_err();
    assert!(matches!(err, MarketError::StayNotEnded { .. }));

    // Retrying the same call after checkout succeeds
    w.clock.set(ts(12));
    w.market.complete_booking(booking_id).await.unwrap();
    assert_eq!(w.ledger.balance(&w.owner).await, 200);
}

// ============================================================================
// Marketplace Search
// ============================================================================

#[tokio::test]
async fn renters_find_open_properties_within_budget() {
    let w = world();
    let other_owner = acct("owner-2");

    let cabin = w.market.list_property(&w.owner, 90).await;
    let loft = w.market.list_property(&other_owner, 250).await;
    let cottage = w.market.list_property(&w.owner, 60).await;

    w.market
        .set_availability(&w.owner, cabin, ts(100), ts(130), true)
        .await
        .unwrap();
    w.market
        .set_availability(&other_owner, loft, ts(100), ts(130), true)
        .await
        .unwrap();
    // The cottage is only open for part of the window
    w.market
        .set_availability(&w.owner, cottage, ts(100), ts(110), true)
        .await
        .unwrap();

    let found = w
        .market
        .available_properties(ts(105), ts(115), 100)
        .await
        .unwrap();
    assert_eq!(found, vec![cabin]);

    let found = w
        .market
        .available_properties(ts(105), ts(109), 100)
        .await
        .unwrap();
    assert_eq!(found, vec![cabin, cottage]);

    let found = w
        .market
        .available_properties(ts(105), ts(115), 300)
        .await
        .unwrap();
    assert_eq!(found, vec![cabin, loft]);
}

// ============================================================================
// Concurrent Callers
// ============================================================================

#[tokio::test]
async fn operations_serialize_under_concurrent_callers() {
    let w = world();
    let property_id = w.market.list_property(&w.owner, 10).await;
    w.market
        .set_availability(&w.owner, property_id, ts(0), ts(365), true)
        .await
        .unwrap();

    let market = Arc::new(w.market);
    let mut handles = Vec::new();
    for i in 0..8 {
        let market = Arc::clone(&market);
        handles.push(tokio::spawn(async move {
            let renter = acct(&format!("renter-{i}"));
            market
                .request_booking(&renter, property_id, ts(10 + i), ts(12 + i))
                .await
                .unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();

    // Every request got its own sequential id and its own record
    assert_eq!(ids.len(), 8);
    assert_eq!(market.booking_count().await, 8);
    for id in ids {
        assert_eq!(
            market.booking(id).await.unwrap().status,
            BookingStatus::Pending
        );
    }
}
