//! Appointment wire types
//!
//! Slot pairs are offered atomically by the backend: the search endpoint
//! returns `termine` as a list of two-slot arrays, and the booking call
//! posts both slot ids together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single bookable slot as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Backend slot identifier
    #[serde(rename = "slotId")]
    pub slot_id: String,

    /// Begin of the appointment, epoch milliseconds
    pub begin: i64,

    /// Location code of the issuing practice
    pub bsnr: String,
}

impl Slot {
    /// Begin of the appointment as a UTC timestamp, if representable
    pub fn begin_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.begin)
    }

    /// Human-readable begin time for log output
    pub fn begin_display(&self) -> String {
        match self.begin_time() {
            Some(ts) => ts.format("%d.%m.%Y %H:%M").to_string(),
            None => "unknown".to_string(),
        }
    }
}

/// The two linked appointment slots (first and second dose) offered
/// together by search and booked atomically.
///
/// Ephemeral: valid only until consumed by a booking or superseded by the
/// next search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPair {
    /// First-dose slot
    pub first: Slot,
    /// Second-dose slot
    pub second: Slot,
}

impl SlotPair {
    /// The two slot ids, in dose order
    pub fn slot_ids(&self) -> [&str; 2] {
        [&self.first.slot_id, &self.second.slot_id]
    }
}

impl TryFrom<Vec<Slot>> for SlotPair {
    type Error = Error;

    fn try_from(slots: Vec<Slot>) -> Result<Self> {
        let count = slots.len();
        let mut iter = slots.into_iter();
        match (iter.next(), iter.next(), iter.next()) {
            (Some(first), Some(second), None) => Ok(Self { first, second }),
            _ => Err(Error::session(format!(
                "expected a pair of slots, got {}",
                count
            ))),
        }
    }
}

/// Login response body: the qualification ids assigned to the code
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Assigned qualification ids, absent when the code qualifies for none
    #[serde(default)]
    pub qualifikationen: Option<Vec<String>>,
}

/// Search response body: offered slot pairs in backend order
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Offered pairs; each entry is the backend's two-slot array
    #[serde(default)]
    pub termine: Option<Vec<Vec<Slot>>>,
}

impl SearchResponse {
    /// The first offered pair in response order, if any.
    ///
    /// Selection policy is always first-pair; no ranking, no user choice.
    pub fn first_pair(self) -> Option<Vec<Slot>> {
        self.termine.unwrap_or_default().into_iter().next()
    }
}

/// Booking request body posted to the booking endpoint
#[derive(Debug, Clone, Serialize)]
pub struct BookingRequest {
    /// Postal code of the service center
    pub plz: String,
    /// The two slot ids of the pair being booked
    pub slots: Vec<String>,
    /// Qualification ids assigned by the last login
    pub qualifikationen: Vec<String>,
    /// Opaque contact payload, passed through unmodified
    pub contact: serde_json::Value,
}

/// Outcome of one search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// At least one pair was offered; this is the first in response order
    Found(SlotPair),
    /// The backend answered normally but offered no pairs
    Empty,
    /// The backend rejected the call with the given HTTP status
    Rejected(u16),
}
