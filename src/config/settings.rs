use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Backend base URLs, keyed by the service names recognized throughout the
/// gateway: radio, concerts, auth, analytics, discovery, events, admin.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub radio: String,
    pub concerts: String,
    pub auth: String,
    pub analytics: String,
    pub discovery: String,
    pub events: String,
    pub admin: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub jwt_algorithm: String,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst_size: u32,
    pub cleanup_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub timeout: Duration,
    pub aggregator_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
    pub app_version: String,
    pub environment: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub backends: BackendConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub proxy: ProxyConfig,
    pub cors: CorsConfig,
    pub observability: ObservabilityConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Settings {
    /// Load configuration from the environment, falling back to
    /// development-friendly defaults for everything except the JWT signing
    /// secret, which has no safe default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_parse_or("PORT", 8000),
            },
            backends: BackendConfig {
                radio: env_or("RADIO_STREAMING_URL", "http://localhost:8001"),
                concerts: env_or("CONCERT_MANAGEMENT_URL", "http://localhost:8002"),
                auth: env_or("AUTHENTICATION_URL", "http://localhost:8003"),
                analytics: env_or("ANALYTICS_URL", "http://localhost:8004"),
                discovery: env_or("MUSIC_DISCOVERY_URL", "http://localhost:8005"),
                events: env_or("EVENT_MANAGER_URL", "http://localhost:8006"),
                admin: env_or("ADMIN_MANAGEMENT_URL", "http://localhost:8007"),
            },
            auth: AuthConfig {
                secret_key: std::env::var("JWT_SECRET_KEY")
                    .expect("JWT_SECRET_KEY must be set in environment variables"),
                jwt_algorithm: env_or("JWT_ALGORITHM", "HS256"),
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: env_parse_or("RATE_LIMIT_RPM", 100),
                burst_size: env_parse_or("RATE_LIMIT_BURST", 20),
                cleanup_interval: Duration::from_secs(env_parse_or(
                    "RATE_LIMIT_CLEANUP_INTERVAL_SECS",
                    300,
                )),
            },
            proxy: ProxyConfig {
                timeout: Duration::from_secs(env_parse_or("PROXY_TIMEOUT_SECS", 30)),
                aggregator_timeout: Duration::from_secs(env_parse_or(
                    "AGGREGATOR_TIMEOUT_SECS",
                    5,
                )),
            },
            cors: CorsConfig {
                allowed_origins: env_or("CORS_ALLOWED_ORIGINS", "*")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            observability: ObservabilityConfig {
                log_level: env_or("LOG_LEVEL", "info"),
                log_format: env_or("LOG_FORMAT", "pretty"),
                app_version: env_or("APP_VERSION", env!("CARGO_PKG_VERSION")),
                environment: env_or("ENVIRONMENT", "development"),
            },
        }
    }
}
