//! Error type definitions
//!
//! Defines the error taxonomy of the appointment bot: configuration
//! problems are fatal, catalog problems are retried by the caller, and
//! session problems are escalated to session re-establishment.

use thiserror::Error;

/// Main error type for the appointment bot
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors (malformed profile, bad access code)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog directory or vaccination list unavailable or malformed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The configured postal code has no matching service center
    #[error("No service center for postal code {plz}")]
    NoCenterForPostalCode {
        /// The postal code that was looked up
        plz: String,
    },

    /// Login succeeded but the backend assigned no qualifications
    #[error("No qualifications assigned for this access code")]
    NoQualifications,

    /// Session management errors (rejected calls, malformed responses)
    #[error("Session error: {0}")]
    Session(String),

    /// The cookie provider failed to deliver a replacement cookie set
    #[error("Cookie provider error: {0}")]
    CookieProvider(String),

    /// Booking call did not return the created status
    #[error("Booking rejected with status {status}")]
    Booking {
        /// HTTP status the backend answered with
        status: u16,
    },

    /// Network/HTTP client errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a new session error
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create a new cookie provider error
    pub fn cookie_provider(msg: impl Into<String>) -> Self {
        Self::CookieProvider(msg.into())
    }

    /// Create an error for a postal code without a service center
    pub fn no_center(plz: impl Into<String>) -> Self {
        Self::NoCenterForPostalCode { plz: plz.into() }
    }

    /// Create a booking rejection error
    pub fn booking(status: u16) -> Self {
        Self::Booking { status }
    }

    /// True for fatal configuration problems that must terminate the
    /// process, as opposed to transient or session-health conditions.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::NoCenterForPostalCode { .. })
    }
}
