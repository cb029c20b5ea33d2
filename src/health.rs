//! Health rollup across registered backend services, used by
//! `/api/v1/gateway/health`.
//!
//! Each service's `/health` endpoint is probed concurrently with a short
//! timeout, and the overall status degrades rather than fails when a
//! backend is unreachable.

use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Probe every `(name, base_url)` service concurrently and summarize.
pub async fn check_all(
    client: &reqwest::Client,
    services: &[(&str, &str)],
    timeout: Duration,
) -> (Vec<ServiceHealth>, bool) {
    let probes = services.iter().map(|(name, base_url)| {
        let client = client.clone();
        let name = name.to_string();
        let url = format!("{base_url}/health");
        async move { probe(&client, timeout, name, url).await }
    });

    let results: Vec<ServiceHealth> = futures::future::join_all(probes).await;
    let all_healthy = results
        .iter()
        .all(|r| matches!(r.status, HealthStatus::Healthy));
    (results, all_healthy)
}

async fn probe(client: &reqwest::Client, timeout: Duration, name: String, url: String) -> ServiceHealth {
    match client.get(&url).timeout(timeout).send().await {
        Ok(response) => {
            let code = response.status().as_u16();
            let status = if response.status() == reqwest::StatusCode::OK {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            };
            ServiceHealth {
                name,
                status,
                code: Some(code),
                error: None,
            }
        }
        Err(err) => ServiceHealth {
            name,
            status: HealthStatus::Unavailable,
            code: None,
            error: Some(err.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let client = reqwest::Client::new();
        let services = [("radio", "http://127.0.0.1:1")];
        let (results, all_healthy) = check_all(&client, &services, Duration::from_millis(200)).await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0].status, HealthStatus::Unavailable));
        assert!(!all_healthy);
    }
}
