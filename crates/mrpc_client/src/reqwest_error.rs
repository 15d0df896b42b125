/// Wrapper around [`reqwest_middleware::Error`] so it doesn't leak into the
/// public API.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct MiddlewareError(#[from] reqwest_middleware::Error);

/// Wrapper around [`reqwest::Error`] so it doesn't leak into the public API.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ReqwestError(#[from] reqwest::Error);

