//! Host-side capability dispatch for worker `call` frames.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use glance_cache::NamespacedCache;

use crate::protocol::CapabilityMethod;

/// The capability surface one worker invocation may use.
///
/// Everything here executes host-side: the worker only ever sees protocol
/// frames, never handles to engine state.
pub struct CapabilitySet {
    integration_name: String,
    cache: NamespacedCache,
    http: reqwest::Client,
    default_ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
struct CacheGetParams {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheSetParams {
    key: String,
    value: Value,
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchParams {
    url: String,
    method: Option<String>,
    headers: Option<HashMap<String, String>>,
    body: Option<String>,
}

impl CapabilitySet {
    /// Capabilities scoped to one integration.
    ///
    /// `default_ttl_secs` backs `cache.set` calls that omit `ttlSeconds`
    /// (the integration's own declared TTL).
    pub fn new(
        integration_name: impl Into<String>,
        cache: NamespacedCache,
        http: reqwest::Client,
        default_ttl_secs: u64,
    ) -> Self {
        Self {
            integration_name: integration_name.into(),
            cache,
            http,
            default_ttl_secs,
        }
    }

    /// The integration this surface is scoped to.
    pub fn integration_name(&self) -> &str {
        &self.integration_name
    }

    /// Execute one capability call. The error string travels back to the
    /// worker in a `reply` frame; it never aborts the invocation.
    pub async fn dispatch(&self, method: CapabilityMethod, params: Value) -> Result<Value, String> {
        match method {
            CapabilityMethod::CacheGet => self.cache_get(params).await,
            CapabilityMethod::CacheSet => self.cache_set(params).await,
            CapabilityMethod::Fetch => self.fetch(params).await,
        }
    }

    async fn cache_get(&self, params: Value) -> Result<Value, String> {
        let params: CacheGetParams =
            serde_json::from_value(params).map_err(|e| format!("invalid cache.get params: {e}"))?;
        let value = self.cache.get(&params.key).await;
        debug!(
            integration = %self.integration_name,
            key = %params.key,
            hit = value.is_some(),
            "module cache.get"
        );
        Ok(value.unwrap_or(Value::Null))
    }

    async fn cache_set(&self, params: Value) -> Result<Value, String> {
        let params: CacheSetParams =
            serde_json::from_value(params).map_err(|e| format!("invalid cache.set params: {e}"))?;
        let ttl = params.ttl_seconds.unwrap_or(self.default_ttl_secs);
        self.cache.set(&params.key, params.value, ttl).await;
        Ok(Value::Null)
    }

    async fn fetch(&self, params: Value) -> Result<Value, String> {
        let params: FetchParams =
            serde_json::from_value(params).map_err(|e| format!("invalid fetch params: {e}"))?;

        let method: reqwest::Method = params
            .method
            .as_deref()
            .unwrap_or("GET")
            .parse()
            .map_err(|_| format!("invalid fetch method {:?}", params.method))?;

        let mut request = self.http.request(method, params.url.as_str());
        if let Some(headers) = params.headers {
            for (name, value) in headers {
                request = request.header(name, value);
            }
        }
        if let Some(body) = params.body {
            request = request.body(body);
        }

        debug!(integration = %self.integration_name, url = %params.url, "module fetch");

        let response = request.send().await.map_err(|e| format!("fetch failed: {e}"))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| format!("fetch body read failed: {e}"))?;

        Ok(json!({
            "status": status,
            "ok": (200..300).contains(&status),
            "body": body,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
