//! Shared harness for the HTTP integration tests

#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use campus_auth::cache::{cache_key, CacheBackend, InMemoryCache, ProfileCache};
use campus_auth::auth::TokenCodec;
use campus_auth::configuration::{CookieSettings, JwtSettings};
use campus_auth::principal::{Account, Instructor, Principal, Role, Student};
use campus_auth::session::{CookieTransport, SessionService};
use campus_auth::startup::{run, ROUTE_PREFIX};
use campus_auth::store::RoleRegistry;
use campus_auth::telemetry::init_test_telemetry;

pub const STUDENT_ID: &str = "42";
pub const INSTRUCTOR_ID: &str = "7";

pub struct TestApp {
    pub address: String,
    pub sessions: SessionService,
    pub cache: Arc<InMemoryCache>,
    pub client: reqwest::Client,
}

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        access_secret: "integration-access-secret-0123456789".to_string(),
        refresh_secret: "integration-refresh-secret-0123456789".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
        issuer: "campus_auth".to_string(),
        leeway_seconds: 0,
    }
}

async fn seed(registry: &RoleRegistry) {
    let student: Principal = Student {
        account: Account::new(STUDENT_ID, "sam@example.com", "Sam", "Student"),
        enrolled_courses: vec!["rust-101".to_string()],
    }
    .into();
    let instructor: Principal = Instructor {
        account: Account::new(INSTRUCTOR_ID, "ada@example.com", "Ada", "Lovelace"),
        bio: Some("Analytical engines".to_string()),
        expertise: vec!["math".to_string()],
    }
    .into();

    registry
        .resolve(Role::Student)
        .insert(student)
        .await
        .expect("Failed to seed student");
    registry
        .resolve(Role::Instructor)
        .insert(instructor)
        .await
        .expect("Failed to seed instructor");
}

pub async fn spawn_app() -> TestApp {
    init_test_telemetry();

    let jwt = jwt_settings();
    let registry = RoleRegistry::in_memory();
    seed(&registry).await;

    let cache = Arc::new(InMemoryCache::new());
    let profile_cache = ProfileCache::new(cache.clone(), Duration::from_secs(3600));
    let sessions = SessionService::new(Arc::new(TokenCodec::new(&jwt)), registry, profile_cache);
    let transport = CookieTransport::new(CookieSettings::default(), jwt.refresh_token_expiry);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let server = run(listener, sessions.clone(), transport).expect("Failed to create server");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}{}", port, ROUTE_PREFIX),
        sessions,
        cache,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_refresh(&self, cookie: Option<&str>) -> reqwest::Response {
        self.with_cookie(self.client.post(self.url("/refresh")), cookie)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_session(&self, cookie: Option<&str>) -> reqwest::Response {
        self.with_cookie(self.client.get(self.url("/auth/session")), cookie)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_logout(&self, cookie: Option<&str>) -> reqwest::Response {
        self.with_cookie(self.client.post(self.url("/logout")), cookie)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_me(&self, bearer: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url("/me"));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request")
    }

    fn with_cookie(
        &self,
        request: reqwest::RequestBuilder,
        cookie: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match cookie {
            Some(value) => request.header(reqwest::header::COOKIE, format!("session={}", value)),
            None => request,
        }
    }

    pub async fn cached_profile(&self, id: &str, role: Role) -> Option<String> {
        self.cache
            .get(&cache_key(id, role))
            .await
            .expect("In-memory cache never fails")
    }
}

/// Raw `Set-Cookie` header for the session cookie, if the response sent one
pub fn session_set_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .map(str::to_string)
}

/// Value carried by the session `Set-Cookie` header
pub fn session_cookie_value(response: &reqwest::Response) -> Option<String> {
    session_set_cookie(response).map(|header| {
        header
            .trim_start_matches("session=")
            .split(';')
            .next()
            .unwrap_or_default()
            .to_string()
    })
}

pub fn is_cleared(set_cookie: &str) -> bool {
    set_cookie.starts_with("session=;") && set_cookie.contains("Max-Age=0")
}
