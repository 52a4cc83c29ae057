// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::{Client, Proxy};

use crate::error::Result;
use crate::models::AcquisitionConfig;

/// Create an HTTP client with the given timeout, routed through the SOCKS
/// proxy when proxy routing is enabled and connecting directly otherwise.
pub fn create_async_client(config: &AcquisitionConfig, timeout: Duration) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(timeout);

    // Routing is decided by configuration alone, never by proxy env vars.
    builder = match config.proxy_url() {
        Some(proxy_url) => {
            log::debug!("Routing requests through SOCKS proxy {}", proxy_url);
            builder.proxy(Proxy::all(&proxy_url)?)
        }
        None => builder.no_proxy(),
    };

    Ok(builder.build()?)
}

/// Fetch a URL and return its body; non-success statuses are errors.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}
