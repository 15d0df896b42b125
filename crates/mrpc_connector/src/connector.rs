use std::collections::BTreeMap;

use alloy_primitives::Address;
use dyn_clone::DynClone;
use mrpc_client::{BatchingProvider, ChainId};
use parking_lot::{Mutex, RwLock};
use tokio::runtime;

use crate::{config::NetworkConfig, error::ConnectorError};

/// The capabilities through which wallet-connection logic obtains a provider.
pub trait Connector {
    /// The provider type handed out by the connector.
    type Provider;

    /// Activates the connector, returning the active provider and chain.
    fn activate(&self) -> ConnectorUpdate<Self::Provider>;

    /// The provider for the current chain.
    fn provider(&self) -> Self::Provider;

    /// The current chain id.
    fn chain_id(&self) -> ChainId;

    /// The connected account, if the connector holds one.
    fn account(&self) -> Option<Address>;

    /// Deactivates the connector.
    fn deactivate(&self);
}

/// State reported on activation and after a chain switch.
#[derive(Clone, Debug)]
pub struct ConnectorUpdate<ProviderT> {
    /// The provider of the active chain
    pub provider: ProviderT,
    /// The active chain id
    pub chain_id: ChainId,
    /// The connected account
    pub account: Option<Address>,
}

/// Supertrait for chain update callbacks.
pub trait SyncUpdateCallback: Fn(ConnectorUpdate<BatchingProvider>) + DynClone + Send + Sync {}

impl<F> SyncUpdateCallback for F where
    F: Fn(ConnectorUpdate<BatchingProvider>) + DynClone + Send + Sync
{
}

dyn_clone::clone_trait_object!(SyncUpdateCallback);

/// A read-only connector with one [`BatchingProvider`] per configured chain.
///
/// It never holds an account; signing is left to wallets.
pub struct NetworkConnector {
    current_chain_id: RwLock<ChainId>,
    providers: BTreeMap<ChainId, BatchingProvider>,
    subscribers: Mutex<Vec<Box<dyn SyncUpdateCallback>>>,
    /// Serializes chain switches, so subscribers observe them in write order.
    switch_guard: Mutex<()>,
}

impl NetworkConnector {
    /// Constructs a connector for the configured networks.
    ///
    /// A default chain id is required unless exactly one network is
    /// configured.
    pub fn new(runtime: runtime::Handle, config: NetworkConfig) -> Result<Self, ConnectorError> {
        let NetworkConfig {
            default_chain_id,
            networks,
        } = config;

        let current_chain_id = match (default_chain_id, networks.as_slice()) {
            (Some(chain_id), _) => chain_id,
            (None, [network]) => network.chain_id,
            (None, networks) => {
                return Err(ConnectorError::MissingDefaultChainId {
                    num_networks: networks.len(),
                });
            }
        };

        let mut providers = BTreeMap::new();
        for network in networks {
            let chain_id = network.chain_id;
            if providers.contains_key(&chain_id) {
                return Err(ConnectorError::DuplicateChainId(chain_id));
            }

            let provider = BatchingProvider::new(runtime.clone(), network.into())
                .map_err(|error| ConnectorError::ProviderCreation { chain_id, error })?;
            providers.insert(chain_id, provider);
        }

        if !providers.contains_key(&current_chain_id) {
            return Err(ConnectorError::UnsupportedChainId {
                chain_id: current_chain_id,
                supported: providers.keys().copied().collect(),
            });
        }

        log::debug!(
            "Network connector created for chain ids {:?}, active chain id {current_chain_id}",
            providers.keys().collect::<Vec<_>>()
        );

        Ok(Self {
            current_chain_id: RwLock::new(current_chain_id),
            providers,
            subscribers: Mutex::new(Vec::new()),
            switch_guard: Mutex::new(()),
        })
    }

    /// The configured chain ids, in ascending order.
    pub fn supported_chain_ids(&self) -> Vec<ChainId> {
        self.providers.keys().copied().collect()
    }

    /// The provider for `chain_id`, whether or not it is active.
    pub fn provider_for(&self, chain_id: ChainId) -> Option<&BatchingProvider> {
        self.providers.get(&chain_id)
    }

    /// Makes `chain_id` the current chain and notifies subscribers if it
    /// changed.
    ///
    /// Concurrent switches are applied and notified one at a time, so the
    /// last update a subscriber receives matches [`Connector::chain_id`].
    /// Subscribers must not call `switch_chain` themselves.
    pub fn switch_chain(&self, chain_id: ChainId) -> Result<(), ConnectorError> {
        let provider = self.provider_for(chain_id).cloned().ok_or_else(|| {
            ConnectorError::UnsupportedChainId {
                chain_id,
                supported: self.supported_chain_ids(),
            }
        })?;

        let _switching = self.switch_guard.lock();

        let previous = std::mem::replace(&mut *self.current_chain_id.write(), chain_id);
        if previous == chain_id {
            return Ok(());
        }

        log::debug!("Switched chain id from {previous} to {chain_id}");

        // Invoke callbacks outside the state locks, so they can read the
        // connector.
        let subscribers = self.subscribers.lock().clone();
        for subscriber in subscribers {
            subscriber(ConnectorUpdate {
                provider: provider.clone(),
                chain_id,
                account: None,
            });
        }

        Ok(())
    }

    /// Registers a callback that is invoked after every chain switch.
    pub fn subscribe(&self, callback: Box<dyn SyncUpdateCallback>) {
        self.subscribers.lock().push(callback);
    }

    fn current(&self) -> (ChainId, &BatchingProvider) {
        let chain_id = *self.current_chain_id.read();
        let provider = self
            .providers
            .get(&chain_id)
            .expect("current chain id is always configured");

        (chain_id, provider)
    }
}

impl Connector for NetworkConnector {
    type Provider = BatchingProvider;

    fn activate(&self) -> ConnectorUpdate<BatchingProvider> {
        let (chain_id, provider) = self.current();

        ConnectorUpdate {
            provider: provider.clone(),
            chain_id,
            account: None,
        }
    }

    fn provider(&self) -> BatchingProvider {
        let (_chain_id, provider) = self.current();
        provider.clone()
    }

    fn chain_id(&self) -> ChainId {
        *self.current_chain_id.read()
    }

    fn account(&self) -> Option<Address> {
        None
    }

    fn deactivate(&self) {}
}

impl std::fmt::Debug for NetworkConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkConnector")
            .field("current_chain_id", &*self.current_chain_id.read())
            .field("providers", &self.providers)
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}
