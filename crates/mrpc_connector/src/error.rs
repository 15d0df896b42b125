use std::{io, path::PathBuf};

use mrpc_client::{ChainId, ProviderCreationError};

/// An error that occurs while constructing or operating a
/// [`NetworkConnector`](crate::NetworkConnector).
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// More (or fewer) than one network is configured without a default
    /// chain id.
    #[error("A default chain id is required when {num_networks} networks are configured")]
    MissingDefaultChainId {
        /// The number of configured networks
        num_networks: usize,
    },

    /// The chain id has no configured network.
    #[error("Unsupported chain id {chain_id}. Supported chain ids: {supported:?}")]
    UnsupportedChainId {
        /// The requested chain id
        chain_id: ChainId,
        /// The configured chain ids
        supported: Vec<ChainId>,
    },

    /// The same chain id is configured more than once.
    #[error("Chain id {0} is configured more than once")]
    DuplicateChainId(ChainId),

    /// A provider could not be created for the network.
    #[error("Failed to create provider for chain id {chain_id}: {error}")]
    ProviderCreation {
        /// The chain id of the network
        chain_id: ChainId,
        /// The underlying error
        #[source]
        error: ProviderCreationError,
    },
}

/// An error that occurs while loading a [`NetworkConfig`](crate::NetworkConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read '{}': {error}", .path.display())]
    Io {
        /// The path of the file
        path: PathBuf,
        /// The IO error
        #[source]
        error: io::Error,
    },

    /// The configuration is not valid TOML or doesn't match the schema.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
