//! Common test utilities and helpers
//!
//! Shared between the integration tests: a scripted cookie provider and
//! builders for settings, profiles and mock backend routes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use impfbot::session::{BrowserCookie, CookieProvider};
use impfbot::{AccessCode, Profile, Result, ServiceCenter, Settings};

/// Cookie provider that counts its invocations and always succeeds
#[derive(Debug)]
pub struct CountingCookieProvider {
    calls: AtomicUsize,
}

impl CountingCookieProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    /// How often the machine asked for a fresh cookie set
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CookieProvider for CountingCookieProvider {
    async fn fetch_cookies(
        &self,
        _code: &AccessCode,
        _center: &ServiceCenter,
    ) -> Result<Vec<BrowserCookie>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![BrowserCookie {
            name: "bm_sz".to_string(),
            value: "integration".to_string(),
        }])
    }
}

/// Settings pointed at the mock backend with millisecond pacing
pub fn fast_settings(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.catalog.directory_url = format!("{}/assets/static/impfzentren.json", server.uri());
    settings.catalog.retry_delay = Duration::from_millis(10);
    settings.session.retry_attempts = 1;
    settings.session.retry_delay = Duration::from_millis(10);
    settings.session.reauth_pause = Duration::from_millis(10);
    settings.search.check_delay = Duration::from_millis(20);
    settings
}

/// A profile for the well-known test postal code
pub fn test_profile() -> Profile {
    Profile {
        code: "ABCD-EFGH-IJKL".parse().unwrap(),
        plz: "10115".to_string(),
        kontakt: serde_json::json!({
            "anrede": "Frau",
            "vorname": "Erika",
            "nachname": "Mustermann",
            "phone": "+4930123456",
            "notificationChannel": "email",
            "notificationReceiver": "erika@example.test"
        }),
    }
}

/// Mount catalog, vaccination list and login for postal code `10115`
pub async fn mount_bootstrap(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/assets/static/impfzentren.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Berlin": [{
                "PLZ": "10115",
                "Zentrumsname": "Arena Berlin",
                "Ort": "Berlin",
                "URL": server.uri()
            }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/assets/static/its/vaccination-list.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"qualification": "Q1", "name": "VaccineX", "age": "18-99", "interval": 42}
        ])))
        .mount(server)
        .await;
}

/// One offered slot pair in the backend's wire shape
pub fn slot_pair_body() -> serde_json::Value {
    serde_json::json!({
        "termine": [[
            {"slotId": "slot-first", "begin": 1616999901000i64, "bsnr": "005221080"},
            {"slotId": "slot-second", "begin": 1623999901000i64, "bsnr": "005221080"}
        ]]
    })
}
