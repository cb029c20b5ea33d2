mod settings;

pub use settings::{
    AuthConfig, BackendConfig, CorsConfig, ObservabilityConfig, ProxyConfig, RateLimitConfig,
    ServerConfig, Settings,
};
