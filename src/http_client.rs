//! Outbound HTTP plumbing shared by the provider adapters

use reqwest::{Client, Response, Url};
use std::time::Duration;
use tracing::error;

use crate::error::{AppError, AppResult};

/// Which family of provider a request went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Payment,
    Shipping,
}

impl Upstream {
    /// Provider failure (transport error, 5xx, unreadable body)
    pub fn failure(&self, name: &str, message: impl Into<String>) -> AppError {
        match self {
            Upstream::Payment => AppError::payment_provider(name, message),
            Upstream::Shipping => AppError::shipping_provider(name, message),
        }
    }
}

/// Builds the client an adapter keeps for its lifetime
pub fn build_client(name: &str, timeout_secs: u64) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::configuration(format!("Failed to create {} HTTP client: {}", name, e)))
}

/// Maps a `send()` failure to a timeout or provider error
pub fn transport_error(
    upstream: Upstream,
    name: &str,
    timeout_secs: u64,
    err: reqwest::Error,
) -> AppError {
    if err.is_timeout() {
        error!("{} request timed out after {}s", name, timeout_secs);
        return AppError::timeout(name, timeout_secs);
    }
    error!("{} request failed: {}", name, err);
    upstream.failure(name, format!("Request error: {}", err))
}

/// Reads the status and full body; body read failures become provider errors
pub async fn read_body(
    upstream: Upstream,
    name: &str,
    timeout_secs: u64,
    response: Response,
) -> AppResult<(u16, String)> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(upstream, name, timeout_secs, e))?;
    Ok((status, body))
}

/// `application/x-www-form-urlencoded` body from ordered pairs
pub fn form_body(pairs: &[(String, String)]) -> AppResult<String> {
    serde_urlencoded::to_string(pairs)
        .map_err(|e| AppError::internal(format!("Failed to encode form body: {}", e)))
}

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Appends path segments to a provider base URL, percent-encoding each one
pub fn endpoint(base_url: &str, segments: &[&str]) -> AppResult<Url> {
    let mut url = Url::parse(base_url).map_err(|e| {
        AppError::configuration(format!("Invalid provider base URL {}: {}", base_url, e))
    })?;
    url.path_segments_mut()
        .map_err(|_| AppError::configuration(format!("Provider base URL has no path: {}", base_url)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Session, checkout and tracking ids are opaque tokens of `[A-Za-z0-9._-]`
pub fn reference_segment<'a>(label: &str, value: &'a str) -> AppResult<&'a str> {
    let plain = !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if plain {
        Ok(value)
    } else {
        Err(AppError::validation(format!("Invalid {}: {:?}", label, value)))
    }
}
