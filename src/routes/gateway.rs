//! Local (non-proxied) gateway endpoints: service discovery, the current
//! user, composite/aggregated views, and the backend health rollup.
//!
//! Each composite endpoint fans requests out to several backends and
//! stitches the results into one response under a stable key set, rather
//! than making the caller issue several round trips.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    aggregator::{fetch_all, fetch_all_as_objects, AggregateCall},
    auth::{RequireAdmin, RequireUser},
    health,
    registry::ServiceName,
    AppState,
};

pub async fn list_services(State(state): State<AppState>) -> Json<Value> {
    let names = state.registry.service_names();
    Json(json!({ "services": names, "count": names.len() }))
}

pub async fn check_services_health(State(state): State<AppState>) -> Json<Value> {
    let services = state.registry.all_services();
    let (results, all_healthy) = health::check_all(
        &state.http_client,
        &services,
        state.settings.proxy.aggregator_timeout,
    )
    .await;

    let healthy_count = results
        .iter()
        .filter(|r| matches!(r.status, health::HealthStatus::Healthy))
        .count();

    Json(json!({
        "services": results,
        "total": results.len(),
        "healthy": healthy_count,
        "status": if all_healthy { "healthy" } else { "degraded" },
    }))
}

pub async fn get_current_user(RequireUser(principal): RequireUser) -> Json<Value> {
    Json(json!({
        "user_id": principal.subject,
        "email": principal.email,
        "role": principal.role,
        "authenticated": true,
    }))
}

fn take_list(value: Value, limit: usize) -> Value {
    match value {
        Value::Array(mut items) => {
            items.truncate(limit);
            Value::Array(items)
        }
        _ => Value::Array(vec![]),
    }
}

pub async fn get_home_data(State(state): State<AppState>) -> Json<Value> {
    let timeout = state.settings.proxy.aggregator_timeout;
    let radio_url = state.registry.base_url(ServiceName::Radio);
    let concerts_url = state.registry.base_url(ServiceName::Concerts);

    let calls = vec![
        AggregateCall {
            key: "featured_stations",
            url: format!("{radio_url}/api/v1/radio/stations"),
            query: &[("limit", "6".to_string())],
        },
        AggregateCall {
            key: "upcoming_concerts",
            url: format!("{concerts_url}/api/v1/concerts"),
            query: &[("limit", "6".to_string()), ("upcoming", "true".to_string())],
        },
    ];

    let mut results = fetch_all(&state.http_client, timeout, calls).await.into_iter();
    let stations = take_list(results.next().map(|(_, v)| v).unwrap_or(Value::Array(vec![])), 6);
    let concerts = take_list(results.next().map(|(_, v)| v).unwrap_or(Value::Array(vec![])), 6);

    Json(json!({
        "featured_stations": stations,
        "upcoming_concerts": concerts,
    }))
}

pub async fn get_dashboard_data(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
) -> Json<Value> {
    let timeout = state.settings.proxy.aggregator_timeout;
    let analytics_url = state.registry.base_url(ServiceName::Analytics);
    let radio_url = state.registry.base_url(ServiceName::Radio);

    let calls = vec![
        AggregateCall {
            key: "listening_history",
            url: format!("{analytics_url}/api/v1/analytics/history"),
            query: &[
                ("user_id", principal.subject.clone()),
                ("limit", "10".to_string()),
            ],
        },
        AggregateCall {
            key: "recommended_stations",
            url: format!("{radio_url}/api/v1/radio/stations"),
            query: &[("limit", "4".to_string())],
        },
    ];

    let mut results = fetch_all(&state.http_client, timeout, calls).await.into_iter();
    let history = results.next().map(|(_, v)| v).unwrap_or(Value::Array(vec![]));
    let recommendations = results.next().map(|(_, v)| v).unwrap_or(Value::Array(vec![]));

    Json(json!({
        "user_id": principal.subject,
        "listening_history": history,
        "recommended_stations": recommendations,
    }))
}

pub async fn get_admin_overview(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
) -> Json<Value> {
    let timeout = state.settings.proxy.aggregator_timeout;
    let radio_url = state.registry.base_url(ServiceName::Radio);
    let concerts_url = state.registry.base_url(ServiceName::Concerts);
    let analytics_url = state.registry.base_url(ServiceName::Analytics);
    let discovery_url = state.registry.base_url(ServiceName::Discovery);

    let calls = vec![
        AggregateCall {
            key: "radio_stats",
            url: format!("{radio_url}/api/v1/radio/stats"),
            query: &[],
        },
        AggregateCall {
            key: "concert_stats",
            url: format!("{concerts_url}/api/v1/concerts/stats"),
            query: &[],
        },
        AggregateCall {
            key: "analytics_stats",
            url: format!("{analytics_url}/api/v1/analytics/stats"),
            query: &[],
        },
        AggregateCall {
            key: "storage_stats",
            url: format!("{discovery_url}/api/v1/discover/storage/stats"),
            query: &[],
        },
    ];

    let mut results = fetch_all_as_objects(&state.http_client, timeout, calls)
        .await
        .into_iter();
    let radio_stats = results.next().map(|(_, v)| v).unwrap_or(json!({}));
    let concert_stats = results.next().map(|(_, v)| v).unwrap_or(json!({}));
    let analytics_stats = results.next().map(|(_, v)| v).unwrap_or(json!({}));
    let storage_stats = results.next().map(|(_, v)| v).unwrap_or(json!({}));

    Json(json!({
        "admin_id": principal.subject,
        "radio_stats": radio_stats,
        "concert_stats": concert_stats,
        "analytics_stats": analytics_stats,
        "storage_stats": storage_stats,
    }))
}
