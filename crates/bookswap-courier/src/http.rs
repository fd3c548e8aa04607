//! Shared HTTP plumbing for courier clients.

use std::time::Duration;

use reqwest::{Client, Response};

use bookswap_core::error::{AppError, ErrorKind};

/// Build the HTTP client shared by all providers.
pub fn build_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .user_agent(concat!("bookswap/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
        })
}

/// Map a transport error from `provider` into an [`AppError`].
pub fn request_error(provider: &str, err: reqwest::Error) -> AppError {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_decode() {
        ErrorKind::Serialization
    } else {
        ErrorKind::ExternalService
    };
    AppError::with_source(kind, format!("{provider} request failed: {err}"), err)
}

/// Reject non-2xx responses.
pub fn ensure_success(provider: &str, response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status.is_server_error() || status.as_u16() == 429 {
        Err(AppError::service_unavailable(format!(
            "{provider} returned {status}"
        )))
    } else {
        Err(AppError::external_service(format!(
            "{provider} rejected the request with {status}"
        )))
    }
}
