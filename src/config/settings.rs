//! Runtime settings structure
//!
//! Defines the tunable parameters of the bot: catalog location, retry
//! pacing, request timeout and search cadence. Defaults match the
//! production backend; environment variables override them, CLI flags
//! override both.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Published directory of all service centers, grouped by region
const DEFAULT_DIRECTORY_URL: &str =
    "https://www.impfterminservice.de/assets/static/impfzentren.json";

/// Browser User-Agent sent on every call; the backend rejects obviously
/// non-browser clients.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_2_3) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36";

/// Main runtime settings for the appointment bot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Catalog resolution configuration
    pub catalog: CatalogSettings,
    /// Authenticated session configuration
    pub session: SessionSettings,
    /// Search loop configuration
    pub search: SearchSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Catalog resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// URL of the published center directory
    pub directory_url: String,
    /// Delay between unbounded-patient bootstrap retries
    pub retry_delay: Duration,
}

/// Authenticated session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// User-Agent header sent on every call
    pub user_agent: String,
    /// Timeout applied to every call except cookie refresh
    pub request_timeout: Duration,
    /// Attempts per steady-state call before escalating to the machine
    pub retry_attempts: u32,
    /// Delay between bounded-immediate retries
    pub retry_delay: Duration,
    /// Pause before re-entering session establishment after a failure
    pub reauth_pause: Duration,
}

/// Search loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Delay between search attempts while no pair is offered
    pub check_delay: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter when `RUST_LOG` is unset
    pub level: String,
    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: CatalogSettings {
                directory_url: DEFAULT_DIRECTORY_URL.to_string(),
                retry_delay: Duration::from_secs(60),
            },
            session: SessionSettings {
                user_agent: DEFAULT_USER_AGENT.to_string(),
                request_timeout: Duration::from_secs(15),
                retry_attempts: 3,
                retry_delay: Duration::from_secs(2),
                reauth_pause: Duration::from_secs(3),
            },
            search: SearchSettings {
                check_delay: Duration::from_secs(30),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                verbose: false,
            },
        }
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut settings = Self::default();

        if let Ok(url) = std::env::var("IMPFBOT_CATALOG_URL") {
            settings.catalog.directory_url = url;
        }

        if let Ok(secs) = std::env::var("IMPFBOT_CHECK_DELAY") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid check delay: {}", e)))?;
            settings.search.check_delay = Duration::from_secs(secs);
        }

        if let Ok(secs) = std::env::var("IMPFBOT_REQUEST_TIMEOUT") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid request timeout: {}", e)))?;
            settings.session.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(level) = std::env::var("IMPFBOT_LOG") {
            settings.logging.level = level;
        }

        Ok(settings)
    }
}
