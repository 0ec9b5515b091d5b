//! Persisted booking profile
//!
//! The profile is the record `{code, plz, kontakt}` written once by the
//! interactive setup and read at every process start. The contact payload
//! stays opaque: it is passed to the booking call unmodified and only its
//! presence is checked here.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::AccessCode;

/// The persisted booking profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// The registrant's access code
    pub code: AccessCode,
    /// Postal code of the desired service center
    pub plz: String,
    /// Opaque contact payload for the booking call
    pub kontakt: serde_json::Value,
}

impl Profile {
    /// Load and validate a profile from a JSON file.
    ///
    /// # Errors
    ///
    /// Any failure (missing file, malformed JSON, invalid access code,
    /// empty postal code, missing contact data) is a configuration error;
    /// the caller is expected to terminate rather than retry.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read profile {}: {}", path.display(), e)))?;
        let profile: Profile = serde_json::from_str(&raw).map_err(|e| {
            Error::config(format!("profile {} is malformed: {}", path.display(), e))
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check the invariants the rest of the system relies on
    pub fn validate(&self) -> Result<()> {
        if self.plz.trim().is_empty() {
            return Err(Error::config("profile has an empty postal code"));
        }
        match self.kontakt.as_object() {
            Some(contact) if !contact.is_empty() => Ok(()),
            _ => Err(Error::config("profile has no contact data")),
        }
    }

    /// Persist the profile as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .map_err(|e| Error::config(format!("cannot write profile {}: {}", path.display(), e)))
    }
}
