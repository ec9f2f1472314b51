//! Configuration for the deposit dapp.
//!
//! Build a [`DappConfig`] with [`DappConfigBuilder`], or load one from the
//! environment (and an optional `.env` file) with [`DappConfig::from_env`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;

use crate::common::error::{DappError, Result};

/// Sepolia chain id.
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;
/// Public Sepolia RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://sepolia.drpc.org";
/// Local wallet JSON-RPC endpoint (Frame's default port).
pub const DEFAULT_WALLET_URL: &str = "http://127.0.0.1:1248";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 4_000;
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SESSION_FILE: &str = ".deposit-dapp-session.json";

/// A wallet endpoint the user can connect through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    /// Stable identifier, persisted with the session.
    pub id: String,
    pub name: String,
    /// JSON-RPC endpoint that answers `eth_requestAccounts` and
    /// `eth_sendTransaction`.
    pub url: String,
}

impl Connector {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
        }
    }

    /// The default connector for a locally running wallet.
    pub fn injected(url: impl Into<String>) -> Self {
        Self::new("injected", "Injected Wallet", url)
    }
}

/// Validated dapp configuration.
#[derive(Debug, Clone)]
pub struct DappConfig {
    /// Chain RPC used for receipts and reads.
    pub rpc_url: String,
    /// Optional WebSocket endpoint for `newHeads` notifications.
    pub ws_url: Option<String>,
    pub contract_address: Address,
    pub chain_id: u64,
    /// Wallet connectors; the first one is the default.
    pub connectors: Vec<Connector>,
    pub poll_interval: Duration,
    pub confirmation_timeout: Duration,
    /// Where the wallet session is persisted. `None` disables persistence.
    pub session_file: Option<PathBuf>,
}

impl DappConfig {
    /// Loads configuration from the process environment, reading `.env` first
    /// if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Recognized keys: `RPC_URL`, `WS_URL`, `WALLET_URL`, `CONTRACT_ADDRESS`,
    /// `CHAIN_ID`, `POLL_INTERVAL_MS`, `CONFIRMATION_TIMEOUT_SECS` and
    /// `SESSION_FILE` (empty string disables persistence).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let contract_address = lookup("CONTRACT_ADDRESS")
            .ok_or_else(|| DappError::ConfigError("CONTRACT_ADDRESS is not set".to_string()))?;

        let mut builder = DappConfigBuilder::new()
            .with_rpc(get("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()))
            .with_wallet(get("WALLET_URL").unwrap_or_else(|| DEFAULT_WALLET_URL.to_string()))
            .contract_address(contract_address);

        if let Some(ws_url) = get("WS_URL") {
            builder = builder.with_ws(ws_url);
        }
        if let Some(chain_id) = get("CHAIN_ID") {
            builder = builder.with_chain_id(parse_number("CHAIN_ID", &chain_id)?);
        }
        if let Some(ms) = get("POLL_INTERVAL_MS") {
            builder = builder.with_poll_interval_ms(parse_number("POLL_INTERVAL_MS", &ms)?);
        }
        if let Some(secs) = get("CONFIRMATION_TIMEOUT_SECS") {
            builder = builder
                .with_confirmation_timeout(parse_number("CONFIRMATION_TIMEOUT_SECS", &secs)?);
        }
        match lookup("SESSION_FILE") {
            Some(path) if path.trim().is_empty() => builder = builder.without_session_file(),
            Some(path) => builder = builder.with_session_file(path),
            None => {}
        }

        builder.build()
    }

    /// The connector used by a plain `connect`.
    #[must_use]
    pub fn default_connector(&self) -> Option<&Connector> {
        self.connectors.first()
    }

    #[must_use]
    pub fn connector(&self, id: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.id == id)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| DappError::ConfigError(format!("{key}={value:?}: {e}")))
}

/// Builder for [`DappConfig`].
#[derive(Debug, Clone)]
pub struct DappConfigBuilder {
    rpc_url: Option<String>,
    ws_url: Option<String>,
    contract_address: Option<String>,
    chain_id: u64,
    connectors: Vec<Connector>,
    poll_interval_ms: u64,
    confirmation_timeout_secs: u64,
    session_file: Option<PathBuf>,
}

impl Default for DappConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DappConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rpc_url: None,
            ws_url: None,
            contract_address: None,
            chain_id: DEFAULT_CHAIN_ID,
            connectors: Vec::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
            session_file: Some(PathBuf::from(DEFAULT_SESSION_FILE)),
        }
    }

    #[must_use]
    pub fn with_rpc(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_ws(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    /// Adds the default `injected` connector at `url`.
    #[must_use]
    pub fn with_wallet(self, url: impl Into<String>) -> Self {
        self.with_connector(Connector::injected(url))
    }

    #[must_use]
    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connectors.push(connector);
        self
    }

    #[must_use]
    pub fn contract_address(mut self, address: impl Into<String>) -> Self {
        self.contract_address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    #[must_use]
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn with_confirmation_timeout(mut self, secs: u64) -> Self {
        self.confirmation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn without_session_file(mut self) -> Self {
        self.session_file = None;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<DappConfig> {
        let rpc_url = self
            .rpc_url
            .ok_or_else(|| DappError::ConfigError("RPC URL is required".to_string()))?;
        require_scheme("RPC URL", &rpc_url, &["http://", "https://"])?;

        if let Some(ws_url) = &self.ws_url {
            require_scheme("WebSocket URL", ws_url, &["ws://", "wss://"])?;
        }

        if self.connectors.is_empty() {
            return Err(DappError::ConfigError(
                "at least one wallet connector is required".to_string(),
            ));
        }
        for connector in &self.connectors {
            require_scheme("wallet URL", &connector.url, &["http://", "https://"])?;
        }

        let raw_address = self
            .contract_address
            .ok_or_else(|| DappError::ConfigError("contract address is required".to_string()))?;
        let contract_address = Address::from_str(raw_address.trim()).map_err(|e| {
            DappError::ConfigError(format!("invalid contract address {raw_address:?}: {e}"))
        })?;

        if self.poll_interval_ms == 0 {
            return Err(DappError::ConfigError(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.confirmation_timeout_secs == 0 {
            return Err(DappError::ConfigError(
                "confirmation timeout must be greater than zero".to_string(),
            ));
        }

        Ok(DappConfig {
            rpc_url,
            ws_url: self.ws_url,
            contract_address,
            chain_id: self.chain_id,
            connectors: self.connectors,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            session_file: self.session_file,
        })
    }
}

fn require_scheme(what: &str, url: &str, schemes: &[&str]) -> Result<()> {
    if schemes.iter().any(|s| url.starts_with(s)) {
        Ok(())
    } else {
        Err(DappError::ConfigError(format!(
            "{what} {url:?} must start with one of {}",
            schemes.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn base() -> DappConfigBuilder {
        DappConfigBuilder::new()
            .with_rpc("http://127.0.0.1:8545")
            .with_wallet("http://127.0.0.1:1248")
            .contract_address(CONTRACT)
    }

    #[test]
    fn test_builder_defaults() {
        let config = base().build().unwrap();
        assert_eq!(config.chain_id, DEFAULT_CHAIN_ID);
        assert_eq!(config.poll_interval, Duration::from_millis(4_000));
        assert_eq!(config.confirmation_timeout, Duration::from_secs(300));
        assert_eq!(config.default_connector().unwrap().id, "injected");
        assert_eq!(config.contract_address, Address::from_str(CONTRACT).unwrap());
        assert!(config.ws_url.is_none());
    }

    #[test]
    fn test_builder_rejects_bad_values() {
        assert!(matches!(
            base().contract_address("0x1234").build(),
            Err(DappError::ConfigError(_))
        ));
        assert!(matches!(
            base().with_ws("http://not-a-socket").build(),
            Err(DappError::ConfigError(_))
        ));
        assert!(matches!(
            base().with_poll_interval_ms(0).build(),
            Err(DappError::ConfigError(_))
        ));
        assert!(matches!(
            DappConfigBuilder::new()
                .with_rpc("http://127.0.0.1:8545")
                .contract_address(CONTRACT)
                .build(),
            Err(DappError::ConfigError(_))
        ));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CONTRACT_ADDRESS", CONTRACT),
            ("RPC_URL", "http://localhost:8545"),
            ("WS_URL", "ws://localhost:8546"),
            ("CHAIN_ID", "31337"),
            ("POLL_INTERVAL_MS", "250"),
            ("SESSION_FILE", ""),
        ]);
        let config = DappConfig::from_lookup(|k| vars.get(k).map(ToString::to_string)).unwrap();

        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.ws_url.as_deref(), Some("ws://localhost:8546"));
        assert_eq!(config.chain_id, 31_337);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.default_connector().unwrap().url, DEFAULT_WALLET_URL);
        assert!(config.session_file.is_none());
    }

    #[test]
    fn test_from_lookup_requires_contract() {
        let result = DappConfig::from_lookup(|_| None);
        assert!(matches!(result, Err(DappError::ConfigError(_))));
    }

    #[test]
    fn test_from_lookup_rejects_bad_number() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("CONTRACT_ADDRESS", CONTRACT), ("CHAIN_ID", "sepolia")]);
        let result = DappConfig::from_lookup(|k| vars.get(k).map(ToString::to_string));
        assert!(matches!(result, Err(DappError::ConfigError(_))));
    }
}
