//! Base58Check addresses for legacy single-signature and script outputs.
//!
//! An address is a version byte followed by a 20-byte hash, encoded with
//! Base58Check. The version byte comes from [`NetworkParams`], which lets
//! one implementation serve every supported chain.

use bitcoin::hashes::Hash;
use bitcoin::{PubkeyHash, PublicKey, ScriptBuf, ScriptHash};
use std::fmt;

use crate::error::AddressError;
use crate::network::NetworkParams;

/// Length of the hash carried by an address.
const HASH_LEN: usize = 20;

/// What an address pays to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressPayload {
    PubkeyHash(PubkeyHash),
    ScriptHash(ScriptHash),
}

/// A network-bound Base58Check address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    network: &'static str,
    payload: AddressPayload,
    encoded: String,
}

impl Address {
    /// Pay-to-pubkey-hash address for a public key.
    pub fn p2pkh(public_key: &PublicKey, network: &NetworkParams) -> Self {
        Self::from_payload(AddressPayload::PubkeyHash(public_key.pubkey_hash()), network)
    }

    pub fn from_payload(payload: AddressPayload, network: &NetworkParams) -> Self {
        let (version, hash) = match payload {
            AddressPayload::PubkeyHash(h) => (network.pubkey_address_prefix, h.to_byte_array()),
            AddressPayload::ScriptHash(h) => (network.script_address_prefix, h.to_byte_array()),
        };
        let encoded = bs58::encode(hash).with_check_version(version).into_string();
        Self {
            network: network.name,
            payload,
            encoded,
        }
    }

    /// Parse an address and check that it belongs to `network`.
    pub fn parse(s: &str, network: &NetworkParams) -> Result<Self, AddressError> {
        let bytes = bs58::decode(s.trim())
            .with_check(None)
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
        if bytes.len() != HASH_LEN + 1 {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        let version = bytes[0];
        let mut hash = [0u8; HASH_LEN];
        hash.copy_from_slice(&bytes[1..]);

        let payload = if version == network.pubkey_address_prefix {
            AddressPayload::PubkeyHash(PubkeyHash::from_byte_array(hash))
        } else if version == network.script_address_prefix {
            AddressPayload::ScriptHash(ScriptHash::from_byte_array(hash))
        } else {
            return Err(AddressError::WrongNetwork {
                version,
                network: network.name,
            });
        };

        Ok(Self::from_payload(payload, network))
    }

    /// Name of the network this address was encoded for.
    pub fn network(&self) -> &'static str {
        self.network
    }

    pub fn payload(&self) -> AddressPayload {
        self.payload
    }

    /// Locking script paying to this address.
    pub fn script_pubkey(&self) -> ScriptBuf {
        match self.payload {
            AddressPayload::PubkeyHash(h) => ScriptBuf::new_p2pkh(&h),
            AddressPayload::ScriptHash(h) => ScriptBuf::new_p2sh(&h),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hex::FromHex;

    // Hash160 of the compressed generator point (private key = 1).
    const GENERATOR_HASH: &str = "751e76e8199196d454941c45d1b3a323f1433bd6";

    fn generator_pkh() -> PubkeyHash {
        PubkeyHash::from_byte_array(<[u8; 20]>::from_hex(GENERATOR_HASH).unwrap())
    }

    #[test]
    fn encodes_known_mainnet_address() {
        let addr = Address::from_payload(
            AddressPayload::PubkeyHash(generator_pkh()),
            &NetworkParams::bitcoin_mainnet(),
        );
        assert_eq!(addr.as_str(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
    }

    #[test]
    fn encodes_known_testnet_address() {
        let addr = Address::from_payload(
            AddressPayload::PubkeyHash(generator_pkh()),
            &NetworkParams::bitcoin_testnet(),
        );
        assert_eq!(addr.as_str(), "mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r");
    }

    #[test]
    fn parse_roundtrip_keeps_payload() {
        let net = NetworkParams::monacoin_mainnet();
        let addr = Address::from_payload(AddressPayload::PubkeyHash(generator_pkh()), &net);
        let parsed = Address::parse(addr.as_str(), &net).unwrap();
        assert_eq!(parsed, addr);
        assert_eq!(parsed.network(), "monacoin-main");
    }

    #[test]
    fn parse_rejects_other_network() {
        let addr = Address::from_payload(
            AddressPayload::PubkeyHash(generator_pkh()),
            &NetworkParams::bitcoin_testnet(),
        );
        let err = Address::parse(addr.as_str(), &NetworkParams::bitcoin_mainnet()).unwrap_err();
        assert_eq!(
            err,
            AddressError::WrongNetwork {
                version: 0x6f,
                network: "bitcoin-main"
            }
        );
    }

    #[test]
    fn parse_rejects_bad_checksum() {
        let err = Address::parse(
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMi",
            &NetworkParams::bitcoin_mainnet(),
        )
        .unwrap_err();
        assert!(matches!(err, AddressError::InvalidBase58(_)));
    }

    #[test]
    fn script_hash_address_uses_script_prefix() {
        let net = NetworkParams::bitcoin_mainnet();
        let addr = Address::from_payload(
            AddressPayload::ScriptHash(ScriptHash::from_byte_array([0u8; 20])),
            &net,
        );
        assert!(addr.as_str().starts_with('3'));
        assert!(addr.script_pubkey().is_p2sh());
    }

    #[test]
    fn p2pkh_script() {
        let addr = Address::from_payload(
            AddressPayload::PubkeyHash(generator_pkh()),
            &NetworkParams::bitcoin_mainnet(),
        );
        assert!(addr.script_pubkey().is_p2pkh());
    }
}
