//! Authenticated session management
//!
//! This module owns the session lifecycle against one service center: the
//! basic-auth credential, the anti-bot cookie jar, and the four
//! authenticated operations (cookie refresh, login, search, book). Cookie
//! acquisition itself lives behind the [`CookieProvider`] seam.

pub mod manager;
pub mod provider;

pub use manager::BookingSession;
pub use provider::{BrowserCookie, CookieProvider, HelperCommandProvider};
