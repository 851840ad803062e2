//! LLM Provider implementations for termpilot.
//!
//! All providers implement the `termpilot_core::Provider` trait.
//! The factory selects the correct provider based on configuration.

pub mod anthropic;
pub mod demo;
pub mod factory;
pub mod openai_compat;
mod sse;

pub use anthropic::AnthropicProvider;
pub use demo::DemoProvider;
pub use factory::{build_named, build_provider};
pub use openai_compat::OpenAiCompatProvider;

use termpilot_core::error::ProviderError;
use tracing::warn;

/// Build the shared HTTP client with a request timeout.
fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Map a transport failure onto the provider error taxonomy.
fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Turn a non-success HTTP status into a `ProviderError`.
async fn check_status(
    response: reqwest::Response,
    provider: &str,
) -> std::result::Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        warn!(provider, status, "Provider rate limited the request");
        return Err(ProviderError::RateLimited { retry_after_secs });
    }

    if status == 401 || status == 403 {
        warn!(provider, status, "Provider rejected credentials");
        return Err(ProviderError::AuthenticationFailed(format!(
            "Invalid {provider} API key or insufficient permissions"
        )));
    }

    if !response.status().is_success() {
        let error_body = response.text().await.unwrap_or_default();
        warn!(provider, status, body = %error_body, "Provider returned error");
        return Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    Ok(response)
}
