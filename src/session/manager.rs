//! Authenticated booking session
//!
//! A [`BookingSession`] holds one coherent credential+cookie context for a
//! single service center and performs the four authenticated operations.
//! Transport failures on the steady-state calls are retried under the
//! bounded-immediate profile and then surfaced, so the state machine can
//! decide whether to re-establish the session.
//!
//! Cookie replacement is wholesale: a refresh builds a fresh jar from the
//! provider output and a fresh client bound to it. Nothing from the
//! previous cookie set can survive a successful refresh.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::settings::SessionSettings;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::session::provider::CookieProvider;
use crate::types::{
    AccessCode, BookingRequest, LoginResponse, Qualification, SearchOutcome, SearchResponse,
    ServiceCenter, SlotPair,
};

/// An authenticated session against one service center
#[derive(Debug)]
pub struct BookingSession {
    /// Bearer credential for every authenticated call
    code: AccessCode,
    /// The resolved service center; immutable for the whole run
    center: ServiceCenter,
    /// Session tuning (timeout, retry pacing, user agent)
    settings: SessionSettings,
    /// Opaque anti-bot cookie source
    provider: Arc<dyn CookieProvider>,
    /// Bounded-immediate profile for steady-state calls
    retry: RetryPolicy,
    /// Current anti-bot cookie jar; replaced wholesale on refresh
    jar: Arc<Jar>,
    /// Client bound to the current jar and credential
    client: Client,
    /// Qualification ids assigned by the last successful login
    assigned_qualifications: Vec<String>,
    /// Qualification id to vaccine display name, for log output
    vaccine_names: HashMap<String, String>,
}

impl BookingSession {
    /// Create a session for the given center.
    ///
    /// The session starts without cookies; callers must refresh before the
    /// backend will accept login or search calls.
    pub fn new(
        code: AccessCode,
        center: ServiceCenter,
        qualifications: &[Qualification],
        settings: SessionSettings,
        provider: Arc<dyn CookieProvider>,
    ) -> Self {
        let vaccine_names = qualifications
            .iter()
            .map(|q| (q.id.clone(), q.display_name().to_string()))
            .collect();
        let retry = RetryPolicy::bounded_immediate(settings.retry_attempts, settings.retry_delay);
        let jar = Arc::new(Jar::default());
        let client = build_client(&code, &settings, jar.clone());

        Self {
            code,
            center,
            settings,
            provider,
            retry,
            jar,
            client,
            assigned_qualifications: Vec::new(),
            vaccine_names,
        }
    }

    /// The service center this session talks to
    pub fn center(&self) -> &ServiceCenter {
        &self.center
    }

    /// Qualification ids assigned by the last successful login
    pub fn assigned_qualifications(&self) -> &[String] {
        &self.assigned_qualifications
    }

    /// Replace the session's anti-bot cookies wholesale.
    ///
    /// Invokes the cookie provider and, on success, installs the returned
    /// set into a fresh jar with a fresh client around it (clear-then-set,
    /// never an incremental merge). On failure the previous cookie state
    /// stays as it was and the caller decides whether to retry or abort.
    pub async fn refresh_cookies(&mut self) -> Result<()> {
        let provider = self.provider.clone();
        let code = self.code.clone();
        let center = self.center.clone();
        let cookies = self
            .retry
            .run("cookie refresh", || {
                let provider = provider.clone();
                let code = code.clone();
                let center = center.clone();
                async move { provider.fetch_cookies(&code, &center).await }
            })
            .await?;

        let base = self.base_url()?;
        let jar = Arc::new(Jar::default());
        for cookie in &cookies {
            jar.add_cookie_str(&format!("{}={}; Path=/", cookie.name, cookie.value), &base);
        }
        self.client = build_client(&self.code, &self.settings, jar.clone());
        self.jar = jar;

        tracing::info!("Installed {} fresh anti-bot cookies", cookies.len());
        Ok(())
    }

    /// Log in with the access code to obtain the assigned qualifications.
    ///
    /// The assignment is re-derived on every successful login, never
    /// accumulated across logins.
    pub async fn login(&mut self) -> Result<Vec<String>> {
        let url = self
            .center
            .endpoint(&format!("rest/login?plz={}", self.center.plz))?;
        let response = self
            .retry
            .run("login", || {
                let client = self.client.clone();
                let url = url.clone();
                async move { Ok(client.get(url).send().await?) }
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::session(format!(
                "login rejected with status {}",
                status.as_u16()
            )));
        }

        let body: LoginResponse = response.json().await?;
        let assigned = body.qualifikationen.unwrap_or_default();
        if assigned.is_empty() {
            return Err(Error::NoQualifications);
        }

        let names: Vec<&str> = assigned
            .iter()
            .map(|id| self.vaccine_names.get(id).map_or("N/A", String::as_str))
            .collect();
        tracing::info!("Logged in with access code");
        tracing::info!("Assigned vaccines: {}", names.join(" "));

        self.assigned_qualifications = assigned.clone();
        Ok(assigned)
    }

    /// Search for an available slot pair.
    ///
    /// Selects the first pair in response order when any is offered. A
    /// non-success status is returned as [`SearchOutcome::Rejected`] so
    /// the state machine can tell "no slots yet" from "session invalid".
    pub async fn search(&self) -> Result<SearchOutcome> {
        let url = self
            .center
            .endpoint(&format!("rest/suche/impfterminsuche?plz={}", self.center.plz))?;
        let response = self
            .retry
            .run("appointment search", || {
                let client = self.client.clone();
                let url = url.clone();
                async move { Ok(client.get(url).send().await?) }
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Appointment search rejected with status {}", status.as_u16());
            return Ok(SearchOutcome::Rejected(status.as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        match body.first_pair() {
            Some(slots) => {
                let pair = SlotPair::try_from(slots)?;
                tracing::info!("Slot pair found!");
                tracing::info!("Appointment 1: {}", pair.first.begin_display());
                tracing::info!("Appointment 2: {}", pair.second.begin_display());
                Ok(SearchOutcome::Found(pair))
            }
            None => {
                tracing::info!("No appointments available");
                Ok(SearchOutcome::Empty)
            }
        }
    }

    /// Book a slot pair for the given contact payload.
    ///
    /// Success is signaled only by the created status. Never retried: the
    /// backend is the sole source of truth for the booking and a duplicate
    /// attempt could conflict.
    pub async fn book(&self, pair: &SlotPair, contact: &serde_json::Value) -> Result<()> {
        let url = self.center.endpoint("rest/buchung")?;
        let request = BookingRequest {
            plz: self.center.plz.clone(),
            slots: pair.slot_ids().map(str::to_owned).to_vec(),
            qualifikationen: self.assigned_qualifications.clone(),
            contact: contact.clone(),
        };

        let response = self.client.post(url).json(&request).send().await?;
        let status = response.status();
        if status == StatusCode::CREATED {
            tracing::info!("Appointment booked successfully!");
            Ok(())
        } else {
            Err(Error::booking(status.as_u16()))
        }
    }

    /// Current `Cookie` header for the service center, if any cookies are
    /// installed
    pub fn cookie_header(&self) -> Option<String> {
        let url = self.base_url().ok()?;
        let value = self.jar.cookies(&url)?;
        value.to_str().ok().map(str::to_owned)
    }

    fn base_url(&self) -> Result<Url> {
        self.center.endpoint("")
    }
}

/// Build a client carrying the credential and bound to the given jar
fn build_client(code: &AccessCode, settings: &SessionSettings, jar: Arc<Jar>) -> Client {
    let mut headers = HeaderMap::new();
    let mut auth =
        HeaderValue::from_str(&code.authorization()).expect("authorization header is ascii");
    auth.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, auth);

    Client::builder()
        .user_agent(settings.user_agent.clone())
        .default_headers(headers)
        .timeout(settings.request_timeout)
        .cookie_provider(jar)
        .build()
        .expect("Failed to create HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::provider::BrowserCookie;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{header as header_matcher, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug)]
    struct StaticProvider(Vec<BrowserCookie>);

    #[async_trait]
    impl CookieProvider for StaticProvider {
        async fn fetch_cookies(
            &self,
            _code: &AccessCode,
            _center: &ServiceCenter,
        ) -> Result<Vec<BrowserCookie>> {
            Ok(self.0.clone())
        }
    }

    /// Pops one scripted result per call; an empty script means failure
    #[derive(Debug)]
    struct SequenceProvider {
        sets: Mutex<VecDeque<Result<Vec<BrowserCookie>>>>,
    }

    impl SequenceProvider {
        fn new(sets: Vec<Result<Vec<BrowserCookie>>>) -> Self {
            Self {
                sets: Mutex::new(sets.into()),
            }
        }
    }

    #[async_trait]
    impl CookieProvider for SequenceProvider {
        async fn fetch_cookies(
            &self,
            _code: &AccessCode,
            _center: &ServiceCenter,
        ) -> Result<Vec<BrowserCookie>> {
            self.sets
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::cookie_provider("script exhausted")))
        }
    }

    fn cookie(name: &str, value: &str) -> BrowserCookie {
        BrowserCookie {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn test_settings() -> SessionSettings {
        SessionSettings {
            user_agent: "impfbot-test".to_string(),
            request_timeout: Duration::from_secs(5),
            retry_attempts: 2,
            retry_delay: Duration::from_millis(10),
            reauth_pause: Duration::from_millis(10),
        }
    }

    fn test_center(base_url: &str) -> ServiceCenter {
        ServiceCenter {
            plz: "10115".to_string(),
            name: "Arena".to_string(),
            locality: "Berlin".to_string(),
            base_url: base_url.to_string(),
        }
    }

    fn test_qualifications() -> Vec<Qualification> {
        vec![Qualification {
            id: "Q1".to_string(),
            name: Some("VaccineX".to_string()),
            age: Some("18-99".to_string()),
            interval_days: Some(42),
        }]
    }

    fn session_with(base_url: &str, provider: Arc<dyn CookieProvider>) -> BookingSession {
        BookingSession::new(
            "ABCD-EFGH-IJKL".parse().unwrap(),
            test_center(base_url),
            &test_qualifications(),
            test_settings(),
            provider,
        )
    }

    #[tokio::test]
    async fn test_new_session_has_no_cookies_and_no_qualifications() {
        let session = session_with(
            "https://example-center.test",
            Arc::new(StaticProvider(vec![])),
        );
        assert!(session.cookie_header().is_none());
        assert!(session.assigned_qualifications().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_installs_provider_cookies() {
        let provider = Arc::new(StaticProvider(vec![
            cookie("bm_sz", "abc123"),
            cookie("akavpau", "xyz"),
        ]));
        let mut session = session_with("https://example-center.test", provider);

        session.refresh_cookies().await.unwrap();

        let header = session.cookie_header().unwrap();
        assert!(header.contains("bm_sz=abc123"));
        assert!(header.contains("akavpau=xyz"));
    }

    #[tokio::test]
    async fn test_refresh_replaces_cookies_wholesale() {
        let provider = Arc::new(SequenceProvider::new(vec![
            Ok(vec![cookie("old", "1"), cookie("stale", "2")]),
            Ok(vec![cookie("fresh", "3")]),
        ]));
        let mut session = session_with("https://example-center.test", provider);

        session.refresh_cookies().await.unwrap();
        session.refresh_cookies().await.unwrap();

        // Exactly the new provider output, no residue from the prior set
        let header = session.cookie_header().unwrap();
        assert_eq!(header, "fresh=3");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_cookies() {
        let provider = Arc::new(SequenceProvider::new(vec![Ok(vec![cookie("kept", "1")])]));
        let mut session = session_with("https://example-center.test", provider);

        session.refresh_cookies().await.unwrap();
        let result = session.refresh_cookies().await;

        assert!(matches!(result, Err(Error::CookieProvider(_))));
        assert_eq!(session.cookie_header().unwrap(), "kept=1");
    }

    #[tokio::test]
    async fn test_login_records_assigned_qualifications() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/login"))
            .and(query_param("plz", "10115"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"qualifikationen": ["Q1"]})),
            )
            .mount(&server)
            .await;

        let mut session = session_with(&server.uri(), Arc::new(StaticProvider(vec![])));
        let assigned = session.login().await.unwrap();

        assert_eq!(assigned, vec!["Q1".to_string()]);
        assert_eq!(session.assigned_qualifications(), ["Q1".to_string()]);
    }

    #[tokio::test]
    async fn test_login_rederives_qualifications() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"qualifikationen": ["Q1"]})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"qualifikationen": ["Q2", "Q3"]})),
            )
            .mount(&server)
            .await;

        let mut session = session_with(&server.uri(), Arc::new(StaticProvider(vec![])));
        session.login().await.unwrap();
        session.login().await.unwrap();

        // Replaced, not accumulated
        assert_eq!(
            session.assigned_qualifications(),
            ["Q2".to_string(), "Q3".to_string()]
        );
    }

    #[tokio::test]
    async fn test_login_without_qualifications_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"qualifikationen": []})),
            )
            .mount(&server)
            .await;

        let mut session = session_with(&server.uri(), Arc::new(StaticProvider(vec![])));
        let result = session.login().await;
        assert!(matches!(result, Err(Error::NoQualifications)));
        assert!(session.assigned_qualifications().is_empty());
    }

    #[tokio::test]
    async fn test_login_rejection_is_session_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut session = session_with(&server.uri(), Arc::new(StaticProvider(vec![])));
        let result = session.login().await;
        assert!(matches!(result, Err(Error::Session(_))));
    }

    #[tokio::test]
    async fn test_installed_cookies_reach_the_wire() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/login"))
            .and(header_matcher("cookie", "bm_sz=wire123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"qualifikationen": ["Q1"]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = Arc::new(StaticProvider(vec![cookie("bm_sz", "wire123")]));
        let mut session = session_with(&server.uri(), provider);
        session.refresh_cookies().await.unwrap();
        session.login().await.unwrap();
    }

    #[tokio::test]
    async fn test_search_selects_first_pair() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/suche/impfterminsuche"))
            .and(query_param("plz", "10115"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "termine": [
                    [
                        {"slotId": "slot-a1", "begin": 1616999901000i64, "bsnr": "005221080"},
                        {"slotId": "slot-a2", "begin": 1623999901000i64, "bsnr": "005221080"}
                    ],
                    [
                        {"slotId": "slot-b1", "begin": 1617999901000i64, "bsnr": "005221080"},
                        {"slotId": "slot-b2", "begin": 1624999901000i64, "bsnr": "005221080"}
                    ]
                ]
            })))
            .mount(&server)
            .await;

        let session = session_with(&server.uri(), Arc::new(StaticProvider(vec![])));
        let outcome = session.search().await.unwrap();

        match outcome {
            SearchOutcome::Found(pair) => assert_eq!(pair.slot_ids(), ["slot-a1", "slot-a2"]),
            other => panic!("expected a found pair, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/suche/impfterminsuche"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"termine": []})))
            .mount(&server)
            .await;

        let session = session_with(&server.uri(), Arc::new(StaticProvider(vec![])));
        assert_eq!(session.search().await.unwrap(), SearchOutcome::Empty);
    }

    #[tokio::test]
    async fn test_search_rejection_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/suche/impfterminsuche"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let session = session_with(&server.uri(), Arc::new(StaticProvider(vec![])));
        assert_eq!(session.search().await.unwrap(), SearchOutcome::Rejected(429));
    }

    #[tokio::test]
    async fn test_book_succeeds_only_on_created() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/buchung"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let session = session_with(&server.uri(), Arc::new(StaticProvider(vec![])));
        let pair = SlotPair {
            first: crate::types::Slot {
                slot_id: "s1".to_string(),
                begin: 1,
                bsnr: "x".to_string(),
            },
            second: crate::types::Slot {
                slot_id: "s2".to_string(),
                begin: 2,
                bsnr: "x".to_string(),
            },
        };
        let contact = serde_json::json!({"vorname": "Erika"});
        assert!(session.book(&pair, &contact).await.is_ok());
    }

    #[tokio::test]
    async fn test_book_rejection_is_terminal_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/buchung"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_with(&server.uri(), Arc::new(StaticProvider(vec![])));
        let pair = SlotPair {
            first: crate::types::Slot {
                slot_id: "s1".to_string(),
                begin: 1,
                bsnr: "x".to_string(),
            },
            second: crate::types::Slot {
                slot_id: "s2".to_string(),
                begin: 2,
                bsnr: "x".to_string(),
            },
        };
        let contact = serde_json::json!({});
        let result = session.book(&pair, &contact).await;
        assert!(matches!(result, Err(Error::Booking { status: 400 })));
    }

    #[tokio::test]
    async fn test_transport_errors_exhaust_bounded_retry() {
        // Nothing listens here; every attempt is a connection error
        let provider = Arc::new(StaticProvider(vec![]));
        let mut session = session_with("http://127.0.0.1:9/", provider);

        let result = session.login().await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
