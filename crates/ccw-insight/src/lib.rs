//! # ccw-insight: Insight block-explorer client.
//!
//! Implements [`NetworkClient`] over the Insight REST API:
//!
//! - `GET  {base}/addr/{address}/utxo` for unspent outputs
//! - `POST {base}/tx/send` with `{"rawtx": "<hex>"}` for broadcast
//!
//! Any non-2xx response becomes [`TransportError::Http`] carrying the
//! response body verbatim, which is where nodes put their rejection reason.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::{OutPoint, ScriptBuf, Transaction, Txid};
use serde::{Deserialize, Serialize};
use tracing::debug;

use ccw_core::address::Address;
use ccw_core::client::NetworkClient;
use ccw_core::error::TransportError;
use ccw_core::money::Money;
use ccw_core::types::UnspentCoin;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One element of the `/addr/{address}/utxo` response.
#[derive(Debug, Deserialize)]
struct UtxoEntry {
    txid: String,
    vout: u32,
    #[serde(rename = "scriptPubKey", default)]
    script_pubkey: String,
    satoshis: u64,
    #[serde(default)]
    confirmations: u32,
}

impl UtxoEntry {
    fn into_coin(self) -> Result<UnspentCoin, TransportError> {
        let txid = Txid::from_str(&self.txid)
            .map_err(|e| TransportError::Decode(format!("txid {}: {e}", self.txid)))?;
        let script_pubkey = ScriptBuf::from_hex(&self.script_pubkey)
            .map_err(|e| TransportError::Decode(format!("scriptPubKey: {e}")))?;
        Ok(UnspentCoin::new(
            OutPoint::new(txid, self.vout),
            Money::from_units(self.satoshis),
            self.confirmations,
            script_pubkey,
        ))
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    rawtx: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    txid: String,
}

/// Decode a `/utxo` response body.
pub fn parse_utxos(body: &str) -> Result<Vec<UnspentCoin>, TransportError> {
    let entries: Vec<UtxoEntry> =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    entries.into_iter().map(UtxoEntry::into_coin).collect()
}

/// Decode a `/tx/send` response body.
pub fn parse_send_response(body: &str) -> Result<Txid, TransportError> {
    let response: SendResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    Txid::from_str(&response.txid).map_err(|e| TransportError::Decode(e.to_string()))
}

fn transport_error(e: reqwest::Error) -> TransportError {
    if e.is_decode() {
        TransportError::Decode(e.to_string())
    } else {
        TransportError::Io(e.to_string())
    }
}

/// Insight API client for one explorer instance.
#[derive(Debug, Clone)]
pub struct InsightClient {
    http: reqwest::Client,
    base_url: String,
}

impl InsightClient {
    /// Client for `base_url` (e.g. `https://explorer.example/insight-api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self::with_client(http, base_url))
    }

    /// Reuse an existing HTTP client.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Body of a successful response, or `Http { status, body }`.
    async fn read_body(response: reqwest::Response) -> Result<String, TransportError> {
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl NetworkClient for InsightClient {
    async fn unspent_coins(&self, address: &Address) -> Result<Vec<UnspentCoin>, TransportError> {
        let url = self.url(&format!("addr/{address}/utxo"));
        debug!(%url, "querying unspent outputs");
        let response = self.http.get(&url).send().await.map_err(transport_error)?;
        parse_utxos(&Self::read_body(response).await?)
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<Txid, TransportError> {
        let url = self.url("tx/send");
        let rawtx = serialize_hex(tx);
        debug!(%url, bytes = rawtx.len() / 2, "broadcasting transaction");
        let response = self
            .http
            .post(&url)
            .json(&SendRequest { rawtx: &rawtx })
            .send()
            .await
            .map_err(transport_error)?;
        parse_send_response(&Self::read_body(response).await?)
    }
}
