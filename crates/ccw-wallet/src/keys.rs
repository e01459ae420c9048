//! BIP-32/BIP-44 key paths, the user's master key, and input signing.
//!
//! The master extended key never leaves [`MasterKey`]. Callers get either an
//! address or a signature out of it; the derived private key exists only as
//! a short-lived [`DerivedKey`] that is erased on drop.

use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv};
use bitcoin::hashes::Hash;
use bitcoin::script::PushBytesBuf;
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{PrivateKey, PublicKey, ScriptBuf, Transaction};
use std::fmt;
use tracing::debug;

use ccw_core::address::Address;
use ccw_core::constants::{BIP44_PURPOSE, HARDENED_BIT, TESTNET_COIN_TYPE};
use ccw_core::currency::Currency;
use ccw_core::network::NetworkParams;

use crate::error::WalletError;

/// `m / purpose' / coin_type' / account' / change / index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyPath([u32; 5]);

impl KeyPath {
    /// Build a BIP-44 path. The first three segments are hardened; the high
    /// bit of `change` and `index` is cleared, whatever the caller passed.
    pub fn bip44(purpose: u32, coin_type: u32, account: u32, change: u32, index: u32) -> Self {
        Self([
            HARDENED_BIT | purpose,
            HARDENED_BIT | coin_type,
            HARDENED_BIT | account,
            !HARDENED_BIT & change,
            !HARDENED_BIT & index,
        ])
    }

    /// Raw segments, hardened ones with the high bit set.
    pub fn segments(&self) -> [u32; 5] {
        self.0
    }

    pub fn to_derivation_path(&self) -> DerivationPath {
        self.0.iter().copied().map(ChildNumber::from).collect()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for segment in self.0 {
            if segment & HARDENED_BIT != 0 {
                write!(f, "/{}'", segment & !HARDENED_BIT)?;
            } else {
                write!(f, "/{segment}")?;
            }
        }
        Ok(())
    }
}

/// SLIP-44 coin type for a currency on a network. Test networks share the
/// reserved value 1.
pub fn coin_type(network: &NetworkParams, currency: &dyn Currency) -> u32 {
    if network.kind.is_mainnet() {
        currency.bip44_coin_type()
    } else {
        TESTNET_COIN_TYPE
    }
}

/// Path of the wallet's single receiving key: `m/44'/coin'/0'/0/0`.
pub fn receiving_key_path(network: &NetworkParams, currency: &dyn Currency) -> KeyPath {
    KeyPath::bip44(BIP44_PURPOSE, coin_type(network, currency), 0, 0, 0)
}

/// A user's master extended private key.
pub struct MasterKey {
    xpriv: Xpriv,
}

impl MasterKey {
    /// Master key from BIP-32 seed bytes (16 to 64 bytes).
    pub fn from_seed(seed: &[u8], network: &NetworkParams) -> Result<Self, WalletError> {
        let xpriv = Xpriv::new_master(network.kind.bip32_kind(), seed)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        Ok(Self { xpriv })
    }

    pub fn from_xpriv(xpriv: Xpriv) -> Self {
        Self { xpriv }
    }

    /// Derive the key at `path`. The result should be dropped as soon as it
    /// has been used.
    pub fn derive(&self, path: &KeyPath) -> Result<DerivedKey, WalletError> {
        let secp = Secp256k1::new();
        let mut child = self
            .xpriv
            .derive_priv(&secp, &path.to_derivation_path())
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        let private_key = PrivateKey::new(child.private_key, child.network);
        child.private_key.non_secure_erase();
        let public_key = PublicKey::from_private_key(&secp, &private_key);
        debug!(%path, "derived key");
        Ok(DerivedKey {
            path: *path,
            private_key,
            public_key,
        })
    }

    /// Derive the key at `path` and sign every input of `tx` with it.
    pub fn sign_inputs(&self, path: &KeyPath, tx: &mut Transaction) -> Result<(), WalletError> {
        self.derive(path)?.sign_p2pkh_inputs(tx)
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey")
            .field("xpriv", &"[REDACTED]")
            .finish()
    }
}

/// An ephemeral child key. The secret is overwritten on drop.
pub struct DerivedKey {
    path: KeyPath,
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl DerivedKey {
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Sign every input of `tx` as a spend of a P2PKH output locked to this
    /// key, with `SIGHASH_ALL`.
    pub fn sign_p2pkh_inputs(&self, tx: &mut Transaction) -> Result<(), WalletError> {
        let secp = Secp256k1::new();
        let script_code = ScriptBuf::new_p2pkh(&self.public_key.pubkey_hash());

        let mut script_sigs = Vec::with_capacity(tx.input.len());
        {
            let cache = SighashCache::new(&*tx);
            for index in 0..tx.input.len() {
                let sighash = cache
                    .legacy_signature_hash(index, &script_code, EcdsaSighashType::All.to_u32())
                    .map_err(|e| WalletError::Signing(e.to_string()))?;
                let message = Message::from_digest(sighash.to_byte_array());
                let signature = bitcoin::ecdsa::Signature {
                    signature: secp.sign_ecdsa(&message, &self.private_key.inner),
                    sighash_type: EcdsaSighashType::All,
                };
                let push = PushBytesBuf::try_from(signature.to_vec())
                    .map_err(|e| WalletError::Signing(e.to_string()))?;
                script_sigs.push(
                    ScriptBuf::builder()
                        .push_slice(push)
                        .push_key(&self.public_key)
                        .into_script(),
                );
            }
        }

        for (input, script_sig) in tx.input.iter_mut().zip(script_sigs) {
            input.script_sig = script_sig;
        }
        Ok(())
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.private_key.inner.non_secure_erase();
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("path", &self.path.to_string())
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Derive the wallet's receiving key from its master key.
pub fn derive_receiving_key(
    master: &MasterKey,
    network: &NetworkParams,
    currency: &dyn Currency,
) -> Result<DerivedKey, WalletError> {
    master.derive(&receiving_key_path(network, currency))
}

/// Single-signature receiving address of a derived key.
pub fn derive_address(key: &DerivedKey, network: &NetworkParams) -> Address {
    Address::p2pkh(&key.public_key(), network)
}
