//! impfbot - automated appointment finder and booker
//!
//! Secures a time-limited two-dose appointment slot pair on the
//! impfterminservice booking portal: authenticates with a 14-character
//! access code, polls for available slot pairs, and submits a booking once
//! a pair appears.
//!
//! # Architecture
//!
//! The crate is built around four cooperating pieces:
//! - [`catalog::CatalogResolver`] resolves a postal code to its service
//!   center and the center's offered qualifications.
//! - [`session::CookieProvider`] is the opaque anti-bot token provider:
//!   given the access code it produces a complete replacement cookie set
//!   or fails. How the cookies come to exist (browser automation, a
//!   capture service, a manual process) is none of this crate's business.
//! - [`session::BookingSession`] owns the HTTP client, the basic-auth
//!   credential, and the current cookie jar, and performs the four
//!   authenticated operations: refresh, login, search, book.
//! - [`machine::BookingMachine`] drives the whole run:
//!   bootstrap, session establishment, polling, and the single booking
//!   attempt.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use impfbot::{BookingMachine, Profile, Settings};
//! use impfbot::session::HelperCommandProvider;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let profile = Profile::load(Path::new("kontaktdaten.json"))?;
//! let provider = Arc::new(HelperCommandProvider::new("impfbot-cookies"));
//! let machine = BookingMachine::new(profile, Settings::default(), provider);
//! let outcome = machine.run().await?;
//! println!("run finished: {:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod machine;
pub mod retry;
pub mod session;
pub mod types;

pub use catalog::CatalogResolver;
pub use config::{Profile, Settings};
pub use error::{Error, Result};
pub use machine::{BookingMachine, RunOutcome};
pub use retry::RetryPolicy;
pub use session::{BookingSession, CookieProvider};
pub use types::{AccessCode, Qualification, SearchOutcome, ServiceCenter, Slot, SlotPair};
