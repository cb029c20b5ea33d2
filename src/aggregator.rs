//! Fan-out helper for the composite endpoints (`/home`, `/dashboard`,
//! `/admin/overview`) that stitch together JSON from several backends into
//! one response.
//!
//! Every call is independent and isolated from its siblings. A slow or
//! failing backend degrades that one field to an empty/null value rather
//! than failing the whole composite response.

use std::time::Duration;

use serde_json::Value;

/// One backend call to make as part of a fan-out, identified by the key
/// it should land under in the aggregated result.
pub struct AggregateCall<'a> {
    pub key: &'a str,
    pub url: String,
    pub query: &'a [(&'a str, String)],
}

/// Run every call concurrently against `client` with `timeout` applied per
/// call, returning `(key, value)` pairs. A failed or timed-out call yields
/// `Value::Array(vec![])` so one flaky backend never fails the whole
/// composite response.
pub async fn fetch_all(
    client: &reqwest::Client,
    timeout: Duration,
    calls: Vec<AggregateCall<'_>>,
) -> Vec<(String, Value)> {
    let futures = calls.into_iter().map(|call| {
        let client = client.clone();
        async move {
            let key = call.key.to_string();
            let value = fetch_one(&client, timeout, &call.url, call.query).await;
            (key, value)
        }
    });

    futures::future::join_all(futures).await
}

async fn fetch_one(
    client: &reqwest::Client,
    timeout: Duration,
    url: &str,
    query: &[(&str, String)],
) -> Value {
    let request = client.get(url).query(query).timeout(timeout);

    match request.send().await {
        Ok(response) if response.status().is_success() => {
            response.json::<Value>().await.unwrap_or(Value::Array(vec![]))
        }
        Ok(response) => {
            tracing::warn!(url, status = %response.status(), "aggregate fetch returned non-2xx");
            Value::Array(vec![])
        }
        Err(err) => {
            tracing::warn!(url, error = %err, "aggregate fetch failed");
            Value::Array(vec![])
        }
    }
}

/// Like [`fetch_all`] but degrades to an empty JSON object (`{}`) on
/// failure instead of an empty array — used by `/admin/overview`, whose
/// per-service stats are objects, not lists.
pub async fn fetch_all_as_objects(
    client: &reqwest::Client,
    timeout: Duration,
    calls: Vec<AggregateCall<'_>>,
) -> Vec<(String, Value)> {
    let futures = calls.into_iter().map(|call| {
        let client = client.clone();
        async move {
            let key = call.key.to_string();
            let request = client.get(&call.url).query(call.query).timeout(timeout);
            let value = match request.send().await {
                Ok(response) if response.status().is_success() => response
                    .json::<Value>()
                    .await
                    .unwrap_or(Value::Object(Default::default())),
                Ok(response) => {
                    tracing::warn!(url = %call.url, status = %response.status(), "aggregate stats fetch returned non-2xx");
                    Value::Object(Default::default())
                }
                Err(err) => {
                    tracing::warn!(url = %call.url, error = %err, "aggregate stats fetch failed");
                    Value::Object(Default::default())
                }
            };
            (key, value)
        }
    });

    futures::future::join_all(futures).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_backend_degrades_to_empty_array() {
        let client = reqwest::Client::new();
        let calls = vec![AggregateCall {
            key: "stations",
            url: "http://127.0.0.1:1/stations".to_string(),
            query: &[],
        }];
        let results = fetch_all(&client, Duration::from_millis(200), calls).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "stations");
        assert_eq!(results[0].1, Value::Array(vec![]));
    }
}
