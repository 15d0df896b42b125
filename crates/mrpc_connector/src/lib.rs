#![warn(missing_docs)]

//! Multi-chain connector over batched JSON-RPC providers

mod config;
mod connector;
mod error;

pub use mrpc_client::{BatchingProvider, ChainId};

pub use self::{
    config::{EndpointConfig, NetworkConfig},
    connector::{Connector, ConnectorUpdate, NetworkConnector, SyncUpdateCallback},
    error::{ConfigError, ConnectorError},
};
