//! Service center and qualification records
//!
//! Field names follow the backend's wire format: the published directory
//! exposes `PLZ`/`Zentrumsname`/`Ort`/`URL` per center, the vaccination
//! list exposes `qualification`/`name`/`age`/`interval`.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// One service center record from the published directory.
///
/// Resolved once per run and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCenter {
    /// Postal code the center is registered under
    #[serde(rename = "PLZ")]
    pub plz: String,

    /// Display name of the center
    #[serde(rename = "Zentrumsname")]
    pub name: String,

    /// Locality the center is in
    #[serde(rename = "Ort")]
    pub locality: String,

    /// Base domain of the center's booking backend
    #[serde(rename = "URL")]
    pub base_url: String,
}

impl ServiceCenter {
    /// Absolute URL for a path (optionally carrying a query string) under
    /// the center's base domain.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| Error::session(format!("invalid service center URL {}: {}", joined, e)))
    }
}

/// An eligibility category offered by a service center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualification {
    /// Eligibility category id, e.g. `L920`
    #[serde(rename = "qualification")]
    pub id: String,

    /// Vaccine display name
    #[serde(default)]
    pub name: Option<String>,

    /// Eligible age group as published, e.g. `"18-99"`
    #[serde(default)]
    pub age: Option<String>,

    /// Minimum interval between the two doses, in days
    #[serde(rename = "interval", default)]
    pub interval_days: Option<u32>,
}

impl Qualification {
    /// Display name with the backend's fallback for unnamed entries
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("N/A")
    }
}
