//! HTTP Client Factory
//!
//! Builds the `reqwest::Client` shared by every API call.

use crate::types::{ClientError, ClientResult, ClientSettings};

/// Build a `reqwest::Client` from the client settings.
///
/// - `proxy: Some(url)` -> route every request through that proxy
/// - `proxy: None` -> explicitly disable proxying (`no_proxy`), ignoring env vars
///
/// Only the connect phase is bounded; a request-wide timeout would cut off
/// long analysis streams.
pub fn build_http_client(settings: &ClientSettings) -> ClientResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
    match &settings.proxy {
        Some(url) => {
            let proxy = reqwest::Proxy::all(url)
                .map_err(|e| ClientError::config(format!("invalid proxy {}: {}", url, e)))?;
            builder = builder.proxy(proxy);
        }
        None => {
            builder = builder.no_proxy();
        }
    }
    builder
        .build()
        .map_err(|e| ClientError::config(format!("failed to build HTTP client: {}", e)))
}
