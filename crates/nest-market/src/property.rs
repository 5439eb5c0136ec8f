//! Listed properties.
//!
//! A property exclusively owns its availability calendar; all external
//! access goes through the query and update methods here, never through a
//! calendar handle.

use crate::calendar::AvailabilityCalendar;
use nest_core::{AccountId, DayIndex};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique property identifier, assigned sequentially starting at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PropertyId(u64);

impl PropertyId {
    /// Create a property id.
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

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A listed property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    id: PropertyId,
    owner: AccountId,
    price_per_night: u64,
    calendar: AvailabilityCalendar,
}

impl Property {
    /// Create a property with an all-closed calendar.
    pub(crate) fn new(id: PropertyId, owner: AccountId, price_per_night: u64) -> Self {
        Self {
            id,
            owner,
            price_per_night,
            calendar: AvailabilityCalendar::new(),
        }
    }

    /// The property id.
    #[must_use]
    pub const fn id(&self) -> PropertyId {
        self.id
    }

    /// The lister; immutable for the property's lifetime.
    #[must_use]
    pub const fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Nightly price in token base units. Zero is legal.
    #[must_use]
    pub const fn price_per_night(&self) -> u64 {
        self.price_per_night
    }

    /// Whether the given day is open for booking.
    #[must_use]
    pub fn is_open(&self, day: DayIndex) -> bool {
        self.calendar.is_open(day)
    }

    /// One boolean per day in `[start, end)`.
    #[must_use]
    pub fn query_range(&self, start: DayIndex, end: DayIndex) -> Vec<bool> {
        self.calendar.query_range(start, end)
    }

    /// First closed day in `[start, end)`, if any.
    pub(crate) fn first_closed(&self, start: DayIndex, end: DayIndex) -> Option<DayIndex> {
        self.calendar.first_closed(start, end)
    }

    /// Set every day in `[start, end)` to `open`.
    pub(crate) fn set_range(&mut self, start: DayIndex, end: DayIndex, open: bool) {
        self.calendar.set_range(start, end, open);
    }

    /// Calendar-free snapshot of the listing.
    #[must_use]
    pub fn info(&self) -> PropertyInfo {
        PropertyInfo {
            id: self.id,
            owner: self.owner.clone(),
            price_per_night: self.price_per_night,
        }
    }
}

/// A listing snapshot without the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInfo {
    /// The property id.
    pub id: PropertyId,
    /// The lister.
    pub owner: AccountId,
    /// Nightly price in token base units.
    pub price_per_night: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_property_is_fully_closed() {
        let property = Property::new(PropertyId::new(1), AccountId::new("owner-1"), 100);

        assert!(!property.is_open(0));
        assert!(!property.is_open(365));
        assert_eq!(property.query_range(0, 5), vec![false; 5]);
    }

    #[test]
    fn set_range_opens_days() {
        let mut property = Property::new(PropertyId::new(1), AccountId::new("owner-1"), 100);
        property.set_range(10, 15, true);

        assert!(property.is_open(10));
        assert!(property.is_open(14));
        assert!(!property.is_open(15));
        assert_eq!(property.first_closed(10, 15), None);
        assert_eq!(property.first_closed(10, 16), Some(15));
    }

    #[test]
    fn info_excludes_the_calendar() {
        let mut property = Property::new(PropertyId::new(2), AccountId::new("owner-1"), 0);
        property.set_range(0, 10, true);

        let info = property.info();
        assert_eq!(info.id, PropertyId::new(2));
        assert_eq!(info.owner, AccountId::new("owner-1"));
        assert_eq!(info.price_per_night, 0);

        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("calendar"));
    }
}
