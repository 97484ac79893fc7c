//! Shared helpers for provider adapters.

use pl_domain::error::Error;

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Read an API key from the named environment variable.
///
/// An unset or empty variable yields `None`; local endpoints run without
/// credentials.
pub fn resolve_api_key(env_var: &str) -> Option<String> {
    if env_var.is_empty() {
        return None;
    }
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Some(key),
        Ok(_) | Err(_) => {
            tracing::debug!(env_var = %env_var, "no API key in environment, sending unauthenticated requests");
            None
        }
    }
}
