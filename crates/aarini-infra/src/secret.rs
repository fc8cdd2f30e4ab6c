//! Upstream credential lookup.
//!
//! The API key comes from the environment only: `GEMINI_API_KEY` first, then
//! the generic `API_KEY`. Values are wrapped in [`SecretString`] immediately
//! so they never reach logs.

use secrecy::SecretString;

use aarini_types::error::ConfigError;

/// Environment variables checked for the API key, in order.
pub const CREDENTIAL_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Resolve the API key from the process environment.
pub fn resolve_api_key() -> Result<SecretString, ConfigError> {
    resolve_api_key_with(|name| std::env::var(name).ok())
}

/// Resolve the API key through `lookup`, treating blank values as unset.
pub fn resolve_api_key_with<F>(lookup: F) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for name in CREDENTIAL_VARS {
        if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(source = name, "Resolved upstream credential");
            return Ok(SecretString::from(value.trim().to_string()));
        }
    }
    Err(ConfigError::MissingCredential {
        checked: CREDENTIAL_VARS.join(", "),
    })
}
