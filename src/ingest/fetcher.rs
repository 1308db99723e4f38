use reqwest::Client;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;

use crate::config::{Config, Endpoint};
use crate::error::{ModgraphError, Result};
use crate::graph::{Edge, GraphSnapshot, Node, NodeId};

/// JSON-RPC client for the remote graph API
///
/// Network failures, non-2xx statuses and bodies that are not JSON are retried
/// with a fixed delay; a JSON-RPC `error` member is final.
pub struct GraphFetcher {
    client: Client,
    host: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl GraphFetcher {
    pub fn new(host: impl Into<String>, max_retries: u32, retry_delay: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ModgraphError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        let host = host.into().trim_end_matches('/').to_string();
        log::info!("Initialized GraphFetcher with host: {}", host);

        Ok(Self {
            client,
            host,
            max_retries: max_retries.max(1),
            retry_delay,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.source.host, config.retry.max_retries, config.retry.delay())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn fetch_module_graph(&self, module_ids: &[NodeId], options: &Value) -> Result<GraphSnapshot> {
        self.fetch(Endpoint::Module, module_ids, options).await
    }

    pub async fn fetch_reverse_graph(&self, module_ids: &[NodeId], options: &Value) -> Result<GraphSnapshot> {
        self.fetch(Endpoint::Reverse, module_ids, options).await
    }

    /// POST a `call` request to `endpoint`, retrying transport failures
    pub async fn fetch(&self, endpoint: Endpoint, module_ids: &[NodeId], options: &Value) -> Result<GraphSnapshot> {
        let url = format!("{}{}", self.host, endpoint.path());
        let payload = rpc_payload(module_ids, options);

        let snapshot = with_retry(self.max_retries, self.retry_delay, || {
            self.request_once(&url, &payload)
        })
        .await?;

        log::info!(
            "Fetched graph from {}: {} nodes, {} edges",
            url,
            snapshot.nodes.len(),
            snapshot.edges.len()
        );
        Ok(snapshot)
    }

    async fn request_once(&self, url: &str, payload: &Value) -> Result<GraphSnapshot> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ModgraphError::Transport(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(ModgraphError::Transport(format!("Graph API error {}: {}", status, body)));
        }

        // An undecodable body is treated like a dropped connection and retried.
        let body: Value = response
            .json()
            .await
            .map_err(|e| ModgraphError::Transport(format!("Failed to decode response body: {}", e)))?;

        parse_rpc_response(body)
    }
}

/// JSON-RPC 2.0 `call` envelope; `null` options are sent as `{}`
pub fn rpc_payload(module_ids: &[NodeId], options: &Value) -> Value {
    let options = if options.is_null() { json!({}) } else { options.clone() };
    json!({
        "jsonrpc": "2.0",
        "method": "call",
        "params": {
            "module_ids": module_ids,
            "options": options,
        },
        "id": 1,
    })
}

/// Unwrap a JSON-RPC response body into a snapshot
pub fn parse_rpc_response(body: Value) -> Result<GraphSnapshot> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        log::error!("JSON-RPC error: {}", message);
        return Err(ModgraphError::Remote(message));
    }

    match body.get("result") {
        Some(Value::Null) => Err(ModgraphError::Remote("empty result".to_string())),
        Some(result) => Ok(serde_json::from_value(result.clone())?),
        None => {
            log::warn!("Unexpected response format: 'result' field missing");
            Err(ModgraphError::Remote("unexpected response format".to_string()))
        }
    }
}

/// Run `op` up to `max_attempts` times, sleeping `delay` between attempts.
/// Only retryable errors trigger another attempt.
pub async fn with_retry<F, Fut, T>(max_attempts: u32, delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        log::debug!("Attempt {}/{}", attempt, max_attempts);
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                log::warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    log::error!("Max retries reached. Giving up: {}", e);
                }
                return Err(e);
            }
        }
    }
}

/// Split a snapshot into its node and edge lists
pub fn extract_graph_components(snapshot: GraphSnapshot) -> (Vec<Node>, Vec<Edge>) {
    log::info!(
        "Extracted {} nodes and {} edges from graph data",
        snapshot.nodes.len(),
        snapshot.edges.len()
    );
    (snapshot.nodes, snapshot.edges)
}
