#![warn(missing_docs)]

//! Batched JSON-RPC transport for Ethereum-compatible endpoints

mod config;
mod dispatch;
mod error;
/// Substitutes for upstream errors of read-only methods
pub mod fallback;
/// Types specific to JSON-RPC
pub mod jsonrpc;
mod provider;
mod reqwest_error;

pub use self::{
    config::{ChainId, DEFAULT_BATCH_TIMEOUT, DEFAULT_BATCH_WAIT, ProviderConfig},
    error::{CONNECTION_UNAVAILABLE_MESSAGE, ProviderCreationError},
    provider::{BatchingProvider, PendingResponse},
    reqwest_error::{MiddlewareError, ReqwestError},
};
