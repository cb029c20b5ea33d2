//! Prometheus metrics, installed via the `metrics` facade and exported by
//! `metrics-exporter-prometheus`.
//!
//! `metrics` has no native `Info` instrument, so the service-info gauge
//! fixed at `1.0` with descriptive labels below stands in for one.

use once_cell::sync::Lazy;
use regex::Regex;

const DURATION_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});
static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// Install the process-wide Prometheus recorder and fix histogram buckets
/// for the two latency instruments. Safe to call once at startup; returns
/// `None` (and logs) if a recorder is already installed.
pub fn init_metrics() -> Option<metrics_exporter_prometheus::PrometheusHandle> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let builder = builder
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(
                "api_gateway_request_duration_seconds".to_string(),
            ),
            DURATION_BUCKETS,
        )
        .and_then(|b| {
            b.set_buckets_for_metric(
                metrics_exporter_prometheus::Matcher::Full(
                    "api_gateway_proxy_duration_seconds".to_string(),
                ),
                DURATION_BUCKETS,
            )
        });

    match builder {
        Ok(builder) => match builder.install_recorder() {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!(error = %err, "failed to install prometheus recorder");
                None
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "failed to configure prometheus histogram buckets");
            None
        }
    }
}

/// Collapse path segments that look like UUIDs or bare numeric ids into a
/// fixed placeholder so metrics labels stay low-cardinality regardless of
/// how many distinct resource ids are requested.
///
/// Works segment-by-segment (split on `/`) rather than with a single
/// whole-path regex so that two ids back to back (e.g.
/// `/api/v1/analytics/history/2024/12`) both get folded — a regex with a
/// consumed `/` delimiter would eat the separator between them and miss
/// the second match.
///
/// `/api/v1/concerts/550e8400-e29b-41d4-a716-446655440000` normalizes to
/// `/api/v1/concerts/{uuid}`; `/api/v1/concerts/42` normalizes to
/// `/api/v1/concerts/{id}`.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if UUID_SEGMENT.is_match(segment) {
                "{uuid}"
            } else if NUMERIC_SEGMENT.is_match(segment) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Records one completed request against the blanket request counters.
pub fn record_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    metrics::counter!(
        "api_gateway_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!(
        "api_gateway_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
    )
    .record(duration_secs);
}

pub fn record_proxy_request(service: &str, status: u16, duration_secs: f64) {
    metrics::counter!(
        "api_gateway_proxy_requests_total",
        "service" => service.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!(
        "api_gateway_proxy_duration_seconds",
        "service" => service.to_string(),
    )
    .record(duration_secs);
}

pub fn record_rate_limit_hit(client_type: &str) {
    metrics::counter!(
        "api_gateway_rate_limit_hits_total",
        "client_type" => client_type.to_string(),
    )
    .increment(1);
}

pub fn record_auth_attempt(status: &str) {
    metrics::counter!(
        "api_gateway_auth_attempts_total",
        "status" => status.to_string(),
    )
    .increment(1);
}

pub fn set_service_info(version: &str) {
    metrics::gauge!(
        "api_gateway_service_info",
        "version" => version.to_string(),
        "service" => "api-gateway",
    )
    .set(1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_uuid_segment() {
        let path = "/api/v1/concerts/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/concerts/{uuid}");
    }

    #[test]
    fn normalizes_numeric_segment() {
        assert_eq!(
            normalize_path("/api/v1/radio/stations/42"),
            "/api/v1/radio/stations/{id}"
        );
    }

    #[test]
    fn leaves_plain_paths_untouched() {
        assert_eq!(normalize_path("/api/v1/gateway/services"), "/api/v1/gateway/services");
    }

    #[test]
    fn normalizes_numeric_segment_mid_path() {
        assert_eq!(
            normalize_path("/api/v1/events/7/attendees"),
            "/api/v1/events/{id}/attendees"
        );
    }

    #[test]
    fn normalizes_adjacent_numeric_segments() {
        assert_eq!(
            normalize_path("/api/v1/analytics/history/2024/12"),
            "/api/v1/analytics/history/{id}/{id}"
        );
    }
}
