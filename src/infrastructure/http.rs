//! Shared outbound HTTP client.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::config::HttpClientConfig;

/// Build the client shared by the gateway, the document store and the
/// token providers.
pub fn build_http_client(config: &HttpClientConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(format!("push-queue-dispatcher/{}", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Body of a non-success response, for error reporting. An unreadable body
/// is logged and treated as empty so callers fall back to the status.
pub async fn read_error_body(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(status = status.as_u16(), error = %e, "Failed to read error response body");
            String::new()
        }
    }
}
