//! Wallet session provider backed by a wallet's JSON-RPC endpoint.
//!
//! The wallet holds the keys and does the signing; this side only asks for
//! account access (`eth_requestAccounts`) and checks the wallet is on the
//! configured chain.

use std::sync::{Arc, RwLock};

use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::json;

use crate::common::error::{DappError, Result};
use crate::common::logging;
use crate::config::Connector;
use crate::rpc::client::JsonRpcClient;
use crate::rpc::parse_quantity;
use crate::types::traits::WalletSessionProvider;

#[derive(Debug, Clone)]
struct ConnectedWallet {
    connector_id: String,
    address: Address,
    client: Arc<JsonRpcClient>,
}

/// [`WalletSessionProvider`] over an EIP-1193 style JSON-RPC wallet.
#[derive(Debug)]
pub struct JsonRpcWallet {
    chain_id: u64,
    session: RwLock<Option<ConnectedWallet>>,
}

impl JsonRpcWallet {
    /// A disconnected wallet that will only accept sessions on `chain_id`.
    #[must_use]
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            session: RwLock::new(None),
        }
    }

    /// Client for the connected wallet endpoint, used to send transactions.
    #[must_use]
    pub fn signer(&self) -> Option<Arc<JsonRpcClient>> {
        self.read_session().map(|s| s.client)
    }

    /// Id of the connector the current session was opened through.
    #[must_use]
    pub fn connector_id(&self) -> Option<String> {
        self.read_session().map(|s| s.connector_id)
    }

    fn read_session(&self) -> Option<ConnectedWallet> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_session(&self, value: Option<ConnectedWallet>) {
        match self.session.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

#[async_trait]
impl WalletSessionProvider for JsonRpcWallet {
    async fn connect(&self, connector: &Connector) -> Result<Address> {
        logging::log(
            logging::LogLevel::Info,
            &format!("Connecting to {} at {}", connector.name, connector.url),
        );
        let client = Arc::new(JsonRpcClient::new(&connector.url)?);

        let accounts: Vec<Address> = client.call("eth_requestAccounts", json!([])).await?;
        let address = accounts
            .first()
            .copied()
            .ok_or_else(|| DappError::RpcError("wallet returned no accounts".to_string()))?;

        let chain_hex: String = client.call("eth_chainId", json!([])).await?;
        let actual = parse_quantity(&chain_hex)?;
        if actual != self.chain_id {
            return Err(DappError::ChainMismatch {
                expected: self.chain_id,
                actual,
            });
        }

        self.write_session(Some(ConnectedWallet {
            connector_id: connector.id.clone(),
            address,
            client,
        }));
        logging::log(
            logging::LogLevel::Success,
            &format!("Connected account {address}"),
        );
        Ok(address)
    }

    async fn disconnect(&self) -> Result<()> {
        let Some(session) = self.read_session() else {
            return Ok(());
        };
        self.write_session(None);

        // EIP-2255; wallets that don't implement it simply keep the grant.
        let revoke = session
            .client
            .call::<serde_json::Value>(
                "wallet_revokePermissions",
                json!([{ "eth_accounts": {} }]),
            )
            .await;
        if let Err(e) = revoke {
            logging::log(
                logging::LogLevel::Debug,
                &format!("wallet_revokePermissions not honoured: {e}"),
            );
        }

        logging::log(
            logging::LogLevel::Info,
            &format!("Disconnected {}", session.address),
        );
        Ok(())
    }

    fn account(&self) -> Option<Address> {
        self.read_session().map(|s| s.address)
    }
}
