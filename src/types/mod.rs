//! Type definitions for the appointment bot
//!
//! This module contains the data structures shared between the catalog
//! resolver, the authenticated session and the booking state machine.

pub mod appointment;
pub mod center;
pub mod code;

pub use appointment::{BookingRequest, LoginResponse, SearchOutcome, SearchResponse, Slot, SlotPair};
pub use center::{Qualification, ServiceCenter};
pub use code::AccessCode;
