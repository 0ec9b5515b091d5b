//! Poll-detect-book state machine
//!
//! Drives one complete run:
//!
//! ```text
//! Bootstrapping -> AwaitingSession -> LoggingIn -> Searching -> Booking -> Done
//!                        ^                |            |
//!                        +----------------+------------+
//! ```
//!
//! Transient errors at the edges are absorbed by the retry policy inside
//! the session and resolver. Session-validity errors (a rejected login or
//! a search answered with a status of 400 or above) route back through
//! session establishment: the cookies are refreshed **and** the login is
//! repeated, a stale session is never patched up halfway. The terminal
//! booking attempt happens exactly once; its outcome, good or bad, ends
//! the run.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::Instrument;

use crate::catalog::CatalogResolver;
use crate::config::{Profile, Settings};
use crate::error::Result;
use crate::session::{BookingSession, CookieProvider};
use crate::types::{SearchOutcome, SlotPair};

/// Terminal outcome of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The pair was booked; the backend acknowledged with the created
    /// status
    Booked(SlotPair),
    /// A pair was found but the booking call did not succeed; the run ends
    /// and the operator restarts to search again
    BookingFailed(SlotPair),
}

/// Session-loop states after bootstrap
#[derive(Debug)]
enum State {
    AwaitingSession,
    LoggingIn,
    Searching,
    Booking(SlotPair),
    Done(RunOutcome),
}

/// Orchestrates one booking run for one access code
#[derive(Debug)]
pub struct BookingMachine {
    profile: Profile,
    settings: Settings,
    provider: Arc<dyn CookieProvider>,
}

impl BookingMachine {
    /// Create a machine for the given profile and cookie provider
    pub fn new(profile: Profile, settings: Settings, provider: Arc<dyn CookieProvider>) -> Self {
        Self {
            profile,
            settings,
            provider,
        }
    }

    /// Drive the whole run: bootstrap, session establishment, polling and
    /// the single booking attempt.
    ///
    /// # Errors
    ///
    /// Only unrecoverable bootstrap failures surface here, most notably a
    /// postal code without a service center. Everything after bootstrap is
    /// absorbed by the retry and re-establishment edges until the run
    /// reaches a terminal outcome.
    pub async fn run(self) -> Result<RunOutcome> {
        let span = tracing::info_span!("booking", code = %self.profile.code.masked());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(self) -> Result<RunOutcome> {
        let client = reqwest::Client::builder()
            .user_agent(self.settings.session.user_agent.clone())
            .timeout(self.settings.session.request_timeout)
            .build()
            .expect("Failed to create HTTP client");
        let resolver = CatalogResolver::new(client, &self.settings.catalog);

        // Bootstrapping: an unknown postal code terminates the run, a
        // backend outage is waited out by the resolver's retry profile.
        let center = resolver.resolve_center(&self.profile.plz).await?;
        let qualifications = resolver.resolve_qualifications(&center).await?;

        let mut session = BookingSession::new(
            self.profile.code.clone(),
            center,
            &qualifications,
            self.settings.session.clone(),
            self.provider.clone(),
        );

        let check_delay = self.settings.search.check_delay;
        let reauth_pause = self.settings.session.reauth_pause;

        let mut state = State::AwaitingSession;
        loop {
            state = match state {
                State::AwaitingSession => {
                    // Cookie acquisition is assumed eventually recoverable
                    while let Err(err) = session.refresh_cookies().await {
                        tracing::warn!("Cookie refresh failed: {}; retrying shortly", err);
                        sleep(reauth_pause).await;
                    }
                    State::LoggingIn
                }

                State::LoggingIn => match session.login().await {
                    Ok(_) => State::Searching,
                    Err(err) => {
                        tracing::warn!("Login failed: {}; re-establishing session", err);
                        sleep(reauth_pause).await;
                        State::AwaitingSession
                    }
                },

                State::Searching => match session.search().await {
                    Ok(SearchOutcome::Found(pair)) => State::Booking(pair),
                    Ok(SearchOutcome::Empty) => {
                        sleep(check_delay).await;
                        State::Searching
                    }
                    Ok(SearchOutcome::Rejected(status)) if status >= 400 => {
                        tracing::warn!(
                            "Search rejected with status {}; re-establishing session",
                            status
                        );
                        State::AwaitingSession
                    }
                    Ok(SearchOutcome::Rejected(_)) => {
                        sleep(check_delay).await;
                        State::Searching
                    }
                    Err(err) => {
                        tracing::warn!("Search failed: {}; re-establishing session", err);
                        State::AwaitingSession
                    }
                },

                State::Booking(pair) => {
                    // Exactly one attempt. The pair may already be gone and
                    // a duplicate booking could conflict on the backend.
                    match session.book(&pair, &self.profile.kontakt).await {
                        Ok(()) => State::Done(RunOutcome::Booked(pair)),
                        Err(err) => {
                            tracing::error!("Booking failed: {}", err);
                            State::Done(RunOutcome::BookingFailed(pair))
                        }
                    }
                }

                State::Done(outcome) => return Ok(outcome),
            };
        }
    }
}
