//! CLI configuration loaded from environment variables.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use ccw_core::locale::Locale;
use ccw_core::network::NetworkParams;
use zeroize::Zeroizing;

/// Default explorer endpoints per network name.
const DEFAULT_INSIGHT_URLS: [(&str, &str); 6] = [
    ("bitcoin-main", "https://insight.bitpay.com/api"),
    ("bitcoin-test", "https://test-insight.bitpay.com/api"),
    ("litecoin-main", "https://insight.litecore.io/api"),
    ("litecoin-test", "https://testnet.litecore.io/api"),
    ("monacoin-main", "https://mona.insight.monaco-ex.org/insight-api-monacoin"),
    ("monacoin-test", "https://testnet-mona.insight.monaco-ex.org/insight-api-monacoin"),
];

#[derive(Clone)]
pub struct Config {
    /// Secret all user master keys are derived from.
    pub root_secret: Option<Zeroizing<Vec<u8>>>,
    /// Insight base URL per network name.
    pub insight_urls: BTreeMap<&'static str, String>,
    /// Locale for formatted amounts.
    pub locale: Locale,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let root_secret = var("CCW_ROOT_SECRET")
            .map(|s| hex::decode(s.trim()).context("CCW_ROOT_SECRET must be hex"))
            .transpose()?
            .map(Zeroizing::new);
        if root_secret.as_ref().is_some_and(|s| s.is_empty()) {
            bail!("CCW_ROOT_SECRET must not be empty");
        }

        let mut insight_urls = BTreeMap::new();
        for network in NetworkParams::known() {
            let default = DEFAULT_INSIGHT_URLS
                .iter()
                .find(|(name, _)| *name == network.name)
                .map(|(_, url)| (*url).to_string())
                .with_context(|| format!("no default explorer for {network}"))?;
            let url = var(&insight_url_var(network.name)).unwrap_or(default);
            insight_urls.insert(network.name, url);
        }

        let locale = match var("CCW_LOCALE") {
            Some(tag) => Locale::from_tag(&tag)
                .with_context(|| format!("CCW_LOCALE: unsupported locale {tag}"))?,
            None => Locale::default(),
        };

        let log_filter = var("CCW_LOG").unwrap_or_else(|| "info".to_string());

        let http_timeout_secs: u64 = var("CCW_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("CCW_HTTP_TIMEOUT_SECS must be a positive integer")?;

        Ok(Config {
            root_secret,
            insight_urls,
            locale,
            log_filter,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

/// `bitcoin-main` -> `CCW_INSIGHT_URL_BITCOIN_MAIN`.
pub fn insight_url_var(network: &str) -> String {
    format!(
        "CCW_INSIGHT_URL_{}",
        network.to_ascii_uppercase().replace('-', "_")
    )
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("root_secret", &self.root_secret.as_ref().map(|_| "[REDACTED]"))
            .field("insight_urls", &self.insight_urls)
            .field("locale", &self.locale)
            .field("log_filter", &self.log_filter)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}
