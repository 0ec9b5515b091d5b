//! Anti-bot cookie acquisition
//!
//! The backend only accepts API calls that carry a set of anti-bot
//! cookies. How those cookies come to exist is deliberately outside this
//! crate's knowledge: a [`CookieProvider`] is handed the access code and
//! the resolved service center and must return a complete replacement
//! cookie set, or fail. Browser automation, a headless capture service and
//! a manual process are all valid implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::types::{AccessCode, ServiceCenter};

/// A single cookie as delivered by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserCookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
}

/// Source of replacement anti-bot cookie sets.
///
/// A successful call yields the complete new cookie set; the session
/// installs it wholesale. Implementations may take seconds, the caller
/// retries rather than timing them.
#[async_trait]
pub trait CookieProvider: Send + Sync + std::fmt::Debug {
    /// Produce a complete replacement cookie set for the given credentials
    async fn fetch_cookies(
        &self,
        code: &AccessCode,
        center: &ServiceCenter,
    ) -> Result<Vec<BrowserCookie>>;
}

/// Production provider that delegates to an external helper command.
///
/// The helper is invoked as
/// `helper <service-url> <plz> <code-group-1> <code-group-2> <code-group-3>`
/// and must print a JSON array of `{"name": ..., "value": ...}` objects on
/// stdout. The three code groups are passed separately because that is the
/// literal input sequence of the portal's credential-entry form.
#[derive(Debug, Clone)]
pub struct HelperCommandProvider {
    command: String,
}

impl HelperCommandProvider {
    /// Create a provider running the given helper command
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl CookieProvider for HelperCommandProvider {
    async fn fetch_cookies(
        &self,
        code: &AccessCode,
        center: &ServiceCenter,
    ) -> Result<Vec<BrowserCookie>> {
        let service_url = center.endpoint(&format!("impftermine/service?plz={}", center.plz))?;
        tracing::info!("Running cookie helper for service center {}", center.plz);

        let output = Command::new(&self.command)
            .arg(service_url.as_str())
            .arg(&center.plz)
            .args(code.groups())
            .output()
            .await
            .map_err(|e| {
                Error::cookie_provider(format!("failed to run {}: {}", self.command, e))
            })?;

        if !output.status.success() {
            return Err(Error::cookie_provider(format!(
                "{} exited with {}",
                self.command, output.status
            )));
        }

        let cookies: Vec<BrowserCookie> = serde_json::from_slice(&output.stdout).map_err(|e| {
            Error::cookie_provider(format!("helper output is not a cookie array: {}", e))
        })?;
        if cookies.is_empty() {
            return Err(Error::cookie_provider("helper returned no cookies"));
        }
        Ok(cookies)
    }
}
