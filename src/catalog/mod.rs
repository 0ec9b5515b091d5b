//! Service center catalog resolution
//!
//! Resolves a postal code to its service center from the published
//! directory and loads the center's offered qualifications. Both fetches
//! run under the unbounded-patient retry profile: the bot cannot proceed
//! without them, and a failure is read as a backend outage rather than a
//! session problem. The postal code lookup itself fails fast; an unknown
//! code is a configuration error, not a transient one.

use std::collections::HashMap;

use reqwest::Client;

use crate::config::settings::CatalogSettings;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::types::{Qualification, ServiceCenter};

/// Fixed path of the vaccination list under a center's base domain
const VACCINATION_LIST_PATH: &str = "assets/static/its/vaccination-list.json";

/// Directory wire format: centers grouped by region name
type CatalogDocument = HashMap<String, Vec<ServiceCenter>>;

/// Resolves service centers and their qualifications
#[derive(Debug)]
pub struct CatalogResolver {
    /// HTTP client for directory and list fetches
    client: Client,
    /// URL of the published center directory
    directory_url: String,
    /// Bootstrap retry profile
    retry: RetryPolicy,
}

impl CatalogResolver {
    /// Create a new resolver using the unbounded-patient profile from the
    /// catalog settings
    pub fn new(client: Client, settings: &CatalogSettings) -> Self {
        Self {
            client,
            directory_url: settings.directory_url.clone(),
            retry: RetryPolicy::unbounded_patient(settings.retry_delay),
        }
    }

    /// Resolve the service center registered for a postal code.
    ///
    /// The directory fetch is retried until it succeeds; a postal code
    /// without a center fails immediately once the directory is loaded.
    pub async fn resolve_center(&self, plz: &str) -> Result<ServiceCenter> {
        let mut centers = self.fetch_directory().await?;
        tracing::info!("{} service centers available", centers.len());

        match centers.remove(plz) {
            Some(center) => {
                tracing::info!(
                    "'{}' in {} {} selected",
                    center.name.trim(),
                    center.plz,
                    center.locality
                );
                Ok(center)
            }
            None => Err(Error::no_center(plz)),
        }
    }

    /// Load the qualifications offered at a service center.
    ///
    /// An empty list is reported as failure, never as silent success;
    /// a login without any offered qualification is meaningless.
    pub async fn resolve_qualifications(
        &self,
        center: &ServiceCenter,
    ) -> Result<Vec<Qualification>> {
        let url = center.endpoint(VACCINATION_LIST_PATH)?;
        let list: Vec<Qualification> = self
            .retry
            .run("qualification fetch", || {
                let client = self.client.clone();
                let url = url.clone();
                async move {
                    let response = client.get(url).send().await?.error_for_status()?;
                    Ok(response.json().await?)
                }
            })
            .await?;

        if list.is_empty() {
            return Err(Error::catalog(format!(
                "no vaccines offered at service center {}",
                center.plz
            )));
        }

        tracing::info!("{} vaccines offered at the service center", list.len());
        for qualification in &list {
            tracing::info!(
                "{}: {} -> age group {} -> interval {} days",
                qualification.id,
                qualification.display_name(),
                qualification.age.as_deref().unwrap_or("?"),
                qualification
                    .interval_days
                    .map_or_else(|| "?".to_string(), |d| d.to_string())
            );
        }
        Ok(list)
    }

    /// Fetch the directory and flatten the per-region grouping into a
    /// postal code lookup
    async fn fetch_directory(&self) -> Result<HashMap<String, ServiceCenter>> {
        let document: CatalogDocument = self
            .retry
            .run("catalog fetch", || {
                let client = self.client.clone();
                let url = self.directory_url.clone();
                async move {
                    let response = client.get(&url).send().await?.error_for_status()?;
                    Ok(response.json().await?)
                }
            })
            .await?;

        let mut by_plz = HashMap::new();
        for (_region, centers) in document {
            for center in centers {
                by_plz.insert(center.plz.clone(), center);
            }
        }
        Ok(by_plz)
    }
}
