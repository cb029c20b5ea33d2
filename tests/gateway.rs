//! End-to-end pipeline scenarios exercised against an in-process router,
//! with wiremock standing in for the backend services.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api_gateway::{
    auth::TokenVerifier,
    config::{
        AuthConfig, BackendConfig, CorsConfig, ObservabilityConfig, ProxyConfig, RateLimitConfig,
        ServerConfig, Settings,
    },
    rate_limit::RateLimiter,
    registry::ServiceRegistry,
    routes, AppState,
};
use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JWT_SECRET: &str = "test-secret";

#[derive(Serialize)]
struct Claims<'a> {
    sub: &'a str,
    email: Option<&'a str>,
    role: &'a str,
    exp: i64,
}

fn bearer_token(subject: &str, role: &str) -> String {
    let exp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
        + 3600;
    let token = encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            sub: subject,
            email: None,
            role,
            exp,
        },
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

/// Assembles an `AppState` pointing every backend at `default_backend`
/// unless overridden, with small rate-limit/timeout knobs so tests run
/// fast and deterministically.
struct TestGateway {
    backends: BackendConfig,
    rpm: u32,
    burst: u32,
    proxy_timeout: Duration,
    aggregator_timeout: Duration,
}

impl TestGateway {
    fn new(default_backend: &str) -> Self {
        let url = default_backend.to_string();
        Self {
            backends: BackendConfig {
                radio: url.clone(),
                concerts: url.clone(),
                auth: url.clone(),
                analytics: url.clone(),
                discovery: url.clone(),
                events: url.clone(),
                admin: url,
            },
            rpm: 6000,
            burst: 20,
            proxy_timeout: Duration::from_secs(30),
            aggregator_timeout: Duration::from_secs(5),
        }
    }

    fn router(self) -> axum::Router {
        let settings = Arc::new(Settings {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8000,
            },
            backends: self.backends,
            auth: AuthConfig {
                secret_key: JWT_SECRET.into(),
                jwt_algorithm: "HS256".into(),
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: self.rpm,
                burst_size: self.burst,
                cleanup_interval: Duration::from_secs(300),
            },
            proxy: ProxyConfig {
                timeout: self.proxy_timeout,
                aggregator_timeout: self.aggregator_timeout,
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".into()],
            },
            observability: ObservabilityConfig {
                log_level: "error".into(),
                log_format: "pretty".into(),
                app_version: "test".into(),
                environment: "test".into(),
            },
        });

        let registry = Arc::new(ServiceRegistry::new(settings.backends.clone()));
        let rate_limiter = Arc::new(RateLimiter::new(
            settings.rate_limit.requests_per_minute,
            settings.rate_limit.burst_size,
            settings.rate_limit.cleanup_interval,
        ));
        let token_verifier = Arc::new(TokenVerifier::new(
            &settings.auth.secret_key,
            &settings.auth.jwt_algorithm,
        ));
        let http_client = reqwest::Client::builder()
            .timeout(settings.proxy.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .unwrap();

        let state = AppState {
            settings,
            registry,
            http_client,
            rate_limiter,
            token_verifier,
            metrics_handle: None,
        };

        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        routes::build_router(state).layer(MockConnectInfo(addr))
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A public-route proxy request carries no Authorization, resolves to a
/// backend, and relays its response with rate-limit headers set.
#[tokio::test]
async fn public_bypass_relays_backend_response() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/radio/stations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&backend)
        .await;

    let app = TestGateway::new(&backend.uri()).router();

    let request = Request::builder()
        .uri("/api/v1/radio/stations")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-ratelimit-limit").unwrap(),
        "6000"
    );
    assert!(response.headers().contains_key("x-ratelimit-remaining"));
    let body = body_json(response).await;
    assert_eq!(body, json!([{"id": 1}]));
}

/// Back-to-back requests exhaust the burst then the next one is denied
/// with 429 and a `Retry-After` header.
#[tokio::test]
async fn burst_then_deny() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&backend)
        .await;

    let mut gateway = TestGateway::new(&backend.uri());
    gateway.burst = 3;
    gateway.rpm = 60;
    let app = gateway.router();

    for expected_remaining in [2u32, 1, 0] {
        let request = Request::builder()
            .uri("/api/v1/events")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // The limit header reports requests-per-minute, not the burst size,
        // even while `remaining` counts down against the burst capacity.
        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "60");
        let remaining: u32 = response
            .headers()
            .get("x-ratelimit-remaining")
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(remaining, expected_remaining);
    }

    let request = Request::builder()
        .uri("/api/v1/events")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response
        .headers()
        .get("retry-after")
        .unwrap()
        .to_str()
        .unwrap()
        .parse::<u64>()
        .unwrap()
        >= 1);
    let body = body_json(response).await;
    assert_eq!(body, json!({"detail": "Rate limit exceeded. Try again later."}));
}

/// Admin-only aggregator endpoint rejects a `user` principal with 403
/// and accepts an `admin` principal, echoing its subject.
#[tokio::test]
async fn admin_gate() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&backend)
        .await;

    let app = TestGateway::new(&backend.uri()).router();

    let user_token = bearer_token("user-1", "user");
    let request = Request::builder()
        .uri("/api/v1/admin/overview")
        .header("authorization", user_token)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_token = bearer_token("admin-1", "admin");
    let request = Request::builder()
        .uri("/api/v1/admin/overview")
        .header("authorization", admin_token)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["admin_id"], json!("admin-1"));
    for field in ["radio_stats", "concert_stats", "analytics_stats", "storage_stats"] {
        assert!(body[field].is_object());
    }
}

/// A backend that never responds within the proxy timeout yields a 504
/// with the synthetic JSON body.
#[tokio::test]
async fn backend_timeout_yields_504() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/concerts"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&backend)
        .await;

    let mut gateway = TestGateway::new(&backend.uri());
    gateway.proxy_timeout = Duration::from_millis(50);
    let app = gateway.router();

    let request = Request::builder()
        .uri("/api/v1/concerts")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let body = body_json(response).await;
    assert_eq!(body, json!({"detail": "Service timeout"}));
}

/// One aggregator fan-out call failing doesn't change the composite
/// status or the shape of the sibling result.
#[tokio::test]
async fn aggregator_partial_failure() {
    let radio = MockServer::start().await;
    let stations: Vec<Value> = (0..10).map(|i| json!({"id": i})).collect();
    Mock::given(method("GET"))
        .and(path("/api/v1/radio/stations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&stations))
        .mount(&radio)
        .await;

    let mut gateway = TestGateway::new("http://127.0.0.1:1");
    gateway.backends.radio = radio.uri();
    let app = gateway.router();

    let request = Request::builder()
        .uri("/api/v1/home")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["featured_stations"].as_array().unwrap().len(), 6);
    assert_eq!(body["upcoming_concerts"], json!([]));
}

/// An inbound correlation id is forwarded to the backend verbatim and
/// echoed back on the gateway response.
#[tokio::test]
async fn correlation_id_propagates() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/events"))
        .and(header("x-correlation-id", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&backend)
        .await;

    let app = TestGateway::new(&backend.uri()).router();

    let request = Request::builder()
        .uri("/api/v1/events")
        .header("x-correlation-id", "abc123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-correlation-id").unwrap(),
        "abc123"
    );
}

/// Hop-by-hop headers never survive the proxy round trip, even when the
/// backend (mis)behaves and sends one.
#[tokio::test]
async fn hop_by_hop_headers_are_stripped() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/radio/stations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .insert_header("connection", "keep-alive")
                .insert_header("transfer-encoding", "chunked"),
        )
        .mount(&backend)
        .await;

    let app = TestGateway::new(&backend.uri()).router();

    let request = Request::builder()
        .uri("/api/v1/radio/stations")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(!response.headers().contains_key("connection"));
    assert!(!response.headers().contains_key("transfer-encoding"));
}

/// A rate-limit-exempt path never gets throttled even past the burst
/// size, since health checks must not be subject to client quotas.
#[tokio::test]
async fn health_is_exempt_from_rate_limiting() {
    let mut gateway = TestGateway::new("http://127.0.0.1:1");
    gateway.burst = 1;
    let app = gateway.router();

    for _ in 0..5 {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
