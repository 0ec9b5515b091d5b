//! Access code handling
//!
//! The 14-character access code doubles as a bearer credential (basic-auth
//! password with an empty username) and, split into its three groups, as
//! the input sequence for the cookie provider's credential-entry step.

use std::fmt;
use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CODE_LEN: usize = 14;
const GROUP_LEN: usize = 4;

/// A validated, uppercase access code of the form `XXXX-XXXX-XXXX`.
///
/// Immutable once constructed; lowercase input is normalized on parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessCode(String);

impl AccessCode {
    /// Parse and normalize an access code.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the input is not three groups of
    /// four letters/digits separated by dashes.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.len() != CODE_LEN {
            return Err(Error::config(format!(
                "access code must be {} characters, got {}",
                CODE_LEN,
                normalized.len()
            )));
        }

        let groups: Vec<&str> = normalized.split('-').collect();
        let well_formed = groups.len() == 3
            && groups
                .iter()
                .all(|g| g.len() == GROUP_LEN && g.chars().all(|c| c.is_ascii_alphanumeric()));
        if !well_formed {
            return Err(Error::config(
                "access code must have the form XXXX-XXXX-XXXX",
            ));
        }

        Ok(Self(normalized))
    }

    /// The full normalized code
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The three dash-separated groups, in order.
    ///
    /// Shape is validated at construction, so there are always three.
    pub fn groups(&self) -> [&str; 3] {
        let mut parts = self.0.split('-');
        [
            parts.next().unwrap_or(""),
            parts.next().unwrap_or(""),
            parts.next().unwrap_or(""),
        ]
    }

    /// Masked form for log output: only the last group is visible.
    pub fn masked(&self) -> String {
        format!("*{}", self.groups()[2])
    }

    /// Value of the `Authorization` header: basic auth with an empty
    /// username and the raw code as password.
    pub fn authorization(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!(":{}", self.0)))
    }
}

impl FromStr for AccessCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccessCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AccessCode> for String {
    fn from(code: AccessCode) -> Self {
        code.0
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
