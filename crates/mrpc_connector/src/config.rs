use std::{collections::HashMap, fs, path::Path, time::Duration};

use mrpc_client::{ChainId, DEFAULT_BATCH_TIMEOUT, DEFAULT_BATCH_WAIT, ProviderConfig};

use crate::error::ConfigError;

/// Endpoints served by a [`NetworkConnector`](crate::NetworkConnector).
///
/// ```toml
/// default_chain_id = 1
///
/// [[networks]]
/// chain_id = 1
/// url = "https://eth.example.org"
///
/// [[networks]]
/// chain_id = 10
/// url = "https://optimism.example.org"
/// batch_wait_ms = 20
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct NetworkConfig {
    /// Chain that is active after construction. Required when more than one
    /// network is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_chain_id: Option<ChainId>,
    /// One entry per chain.
    #[serde(default)]
    pub networks: Vec<EndpointConfig>,
}

/// A single chain's endpoint.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct EndpointConfig {
    /// Chain served by the endpoint
    pub chain_id: ChainId,
    /// The endpoint URL
    pub url: String,
    /// Overrides [`DEFAULT_BATCH_WAIT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_wait_ms: Option<u64>,
    /// Overrides [`DEFAULT_BATCH_TIMEOUT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_timeout_ms: Option<u64>,
    /// Extra HTTP headers, e.g. for authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

impl NetworkConfig {
    /// Builds a configuration from a chain id to URL mapping.
    pub fn from_urls<UrlT: Into<String>>(
        urls: impl IntoIterator<Item = (ChainId, UrlT)>,
        default_chain_id: Option<ChainId>,
    ) -> Self {
        Self {
            default_chain_id,
            networks: urls
                .into_iter()
                .map(|(chain_id, url)| EndpointConfig::new(chain_id, url))
                .collect(),
        }
    }

    /// Reads a TOML configuration file.
    pub fn load(file_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_path = file_path.as_ref();
        let contents = fs::read_to_string(file_path).map_err(|error| ConfigError::Io {
            path: file_path.to_path_buf(),
            error,
        })?;

        let config = Self::from_toml_str(&contents)?;
        log::debug!("network config: {config:?}");

        Ok(config)
    }

    /// Parses a TOML configuration.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

impl EndpointConfig {
    /// Creates an endpoint with default batching parameters.
    pub fn new(chain_id: ChainId, url: impl Into<String>) -> Self {
        Self {
            chain_id,
            url: url.into(),
            batch_wait_ms: None,
            batch_timeout_ms: None,
            headers: None,
        }
    }
}

impl From<EndpointConfig> for ProviderConfig {
    fn from(value: EndpointConfig) -> Self {
        let EndpointConfig {
            chain_id,
            url,
            batch_wait_ms,
            batch_timeout_ms,
            headers,
        } = value;

        ProviderConfig {
            chain_id,
            url,
            batch_wait: batch_wait_ms.map_or(DEFAULT_BATCH_WAIT, Duration::from_millis),
            batch_timeout: batch_timeout_ms.map_or(DEFAULT_BATCH_TIMEOUT, Duration::from_millis),
            http_headers: headers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_networks_with_overrides() -> anyhow::Result<()> {
        let config = NetworkConfig::from_toml_str(
            r#"
            default_chain_id = 10

            [[networks]]
            chain_id = 1
            url = "https://eth.example.org"

            [[networks]]
            chain_id = 10
            url = "https://optimism.example.org"
            batch_wait_ms = 20
            batch_timeout_ms = 5000

            [networks.headers]
            Authorization = "Bearer token"
            "#,
        )?;

        assert_eq!(config.default_chain_id, Some(10));
        assert_eq!(config.networks.len(), 2);

        let optimism = config
            .networks
            .last()
            .cloned()
            .map(ProviderConfig::from)
            .expect("two networks are configured");
        assert_eq!(optimism.batch_wait, Duration::from_millis(20));
        assert_eq!(optimism.batch_timeout, Duration::from_secs(5));
        assert_eq!(
            optimism
                .http_headers
                .as_ref()
                .and_then(|headers| headers.get("Authorization"))
                .map(String::as_str),
            Some("Bearer token")
        );

        Ok(())
    }

    #[test]
    fn endpoint_defaults() {
        let provider_config = ProviderConfig::from(EndpointConfig::new(1, "http://localhost:8545"));

        assert_eq!(
            provider_config,
            ProviderConfig::new(1, "http://localhost:8545")
        );
    }

    #[test]
    fn missing_url_is_rejected() {
        let error = NetworkConfig::from_toml_str("[[networks]]\nchain_id = 1\n")
            .expect_err("url is required");

        assert!(matches!(error, ConfigError::Toml(_)));
    }

    #[test]
    fn from_urls_preserves_entries() {
        let config = NetworkConfig::from_urls([(5, "http://a"), (1, "http://b")], None);

        assert_eq!(config.default_chain_id, None);
        assert_eq!(
            config.networks,
            vec![EndpointConfig::new(5, "http://a"), EndpointConfig::new(1, "http://b")]
        );
    }
}
