use std::{collections::HashMap, time::Duration};

/// Numeric identifier of a chain.
pub type ChainId = u64;

/// How long requests are accumulated before a batch is dispatched.
pub const DEFAULT_BATCH_WAIT: Duration = Duration::from_millis(50);
/// Upper bound on a single batch exchange, after which all of its requests
/// resolve with a timeout error.
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration of a [`BatchingProvider`](crate::BatchingProvider).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Chain served by the endpoint. Used to answer `eth_chainId` locally.
    pub chain_id: ChainId,
    /// The endpoint URL
    pub url: String,
    /// See [`DEFAULT_BATCH_WAIT`].
    pub batch_wait: Duration,
    /// See [`DEFAULT_BATCH_TIMEOUT`].
    pub batch_timeout: Duration,
    /// Headers sent with every batch, in addition to the JSON and CORS
    /// headers.
    pub http_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Creates a configuration with default timings and no extra headers.
    pub fn new(chain_id: ChainId, url: impl Into<String>) -> Self {
        Self {
            chain_id,
            url: url.into(),
            batch_wait: DEFAULT_BATCH_WAIT,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
            http_headers: None,
        }
    }
}
