use std::sync::Arc;

use api_gateway::{
    auth::TokenVerifier, config::Settings, metrics, rate_limit::RateLimiter,
    registry::ServiceRegistry, routes, AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Arc::new(Settings::from_env());

    init_tracing(&settings);

    tracing::info!(
        environment = %settings.observability.environment,
        version = %settings.observability.app_version,
        "starting api gateway"
    );

    let metrics_handle = metrics::init_metrics().map(Arc::new);
    if metrics_handle.is_some() {
        metrics::set_service_info(&settings.observability.app_version);
    }

    let http_client = reqwest::Client::builder()
        .timeout(settings.proxy.timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;

    let rate_limiter = Arc::new(RateLimiter::new(
        settings.rate_limit.requests_per_minute,
        settings.rate_limit.burst_size,
        settings.rate_limit.cleanup_interval,
    ));
    rate_limiter
        .clone()
        .spawn_sweeper(settings.rate_limit.cleanup_interval);

    let token_verifier = Arc::new(TokenVerifier::new(
        &settings.auth.secret_key,
        &settings.auth.jwt_algorithm,
    ));

    let registry = Arc::new(ServiceRegistry::new(settings.backends.clone()));

    let state = AppState {
        settings: settings.clone(),
        registry,
        http_client,
        rate_limiter,
        token_verifier,
        metrics_handle,
    };

    let app = routes::build_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "api gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("api_gateway={},tower_http=info", settings.observability.log_level).into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if settings.observability.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
