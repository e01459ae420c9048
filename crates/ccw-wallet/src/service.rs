//! One wallet per (user, network), created on first use.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use ccw_core::client::NetworkClient;
use ccw_core::currency::Currency;
use ccw_core::network::NetworkParams;

use crate::error::WalletError;
use crate::keys::MasterKey;
use crate::wallet::Wallet;

/// Chat-platform user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a wallet needs to know about the network it lives on.
#[derive(Clone)]
pub struct NetworkContext {
    pub params: NetworkParams,
    pub currency: Arc<dyn Currency>,
    pub client: Arc<dyn NetworkClient>,
}

impl fmt::Debug for NetworkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkContext")
            .field("params", &self.params)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

/// Source of users' master keys.
pub trait KeyStore: Send + Sync {
    fn master_key(&self, user: UserId, network: &NetworkParams) -> Result<MasterKey, WalletError>;
}

/// Derives each user's BIP-32 seed as `SHA-256(root || user_id_be)`.
pub struct SeedKeyStore {
    root: Zeroizing<Vec<u8>>,
}

impl SeedKeyStore {
    pub fn new(root: impl Into<Vec<u8>>) -> Self {
        Self {
            root: Zeroizing::new(root.into()),
        }
    }
}

impl KeyStore for SeedKeyStore {
    fn master_key(&self, user: UserId, network: &NetworkParams) -> Result<MasterKey, WalletError> {
        let mut hasher = Sha256::new();
        hasher.update(self.root.as_slice());
        hasher.update(user.0.to_be_bytes());
        let seed: Zeroizing<[u8; 32]> = Zeroizing::new(hasher.finalize().into());
        MasterKey::from_seed(seed.as_slice(), network)
    }
}

impl fmt::Debug for SeedKeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedKeyStore")
            .field("root", &"[REDACTED]")
            .finish()
    }
}

/// Registry of per-user wallets.
pub struct WalletService {
    networks: HashMap<&'static str, NetworkContext>,
    keys: Arc<dyn KeyStore>,
    wallets: DashMap<(UserId, &'static str), Arc<Wallet>>,
}

impl WalletService {
    pub fn new(keys: Arc<dyn KeyStore>) -> Self {
        Self {
            networks: HashMap::new(),
            keys,
            wallets: DashMap::new(),
        }
    }

    /// Make a network available. Replaces any context with the same name.
    pub fn register(&mut self, context: NetworkContext) -> &mut Self {
        self.networks.insert(context.params.name, context);
        self
    }

    /// Registered network names, sorted.
    pub fn network_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.networks.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// The user's wallet on `network`, opening it on first access.
    pub fn wallet(&self, user: UserId, network: &str) -> Result<Arc<Wallet>, WalletError> {
        let context = self
            .networks
            .get(network)
            .ok_or_else(|| WalletError::UnknownNetwork(network.to_owned()))?;

        match self.wallets.entry((user, context.params.name)) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let master = self.keys.master_key(user, &context.params)?;
                let wallet = Arc::new(Wallet::new(
                    master,
                    context.params,
                    Arc::clone(&context.currency),
                    Arc::clone(&context.client),
                )?);
                debug!(%user, network = context.params.name, "wallet created");
                entry.insert(Arc::clone(&wallet));
                Ok(wallet)
            }
        }
    }

    /// Number of open wallets across all users and networks.
    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }
}

impl fmt::Debug for WalletService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletService")
            .field("networks", &self.network_names())
            .field("wallets", &self.wallets.len())
            .finish_non_exhaustive()
    }
}
