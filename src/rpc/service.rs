//! Contract call service over JSON-RPC.
//!
//! Transactions go to the connected wallet (`eth_sendTransaction`), which
//! signs and broadcasts them. Receipts, view calls and balances are read from
//! the chain RPC endpoint.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, TxHash, U256, hex};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::common::error::{DappError, Result};
use crate::common::logging;
use crate::contract::abi::{ContractDescriptor, decode_uint};
use crate::rpc::client::JsonRpcClient;
use crate::rpc::parse_quantity;
use crate::rpc::wallet::JsonRpcWallet;
use crate::types::action::{AbiValue, ReceiptStatus, TransactionRequest};
use crate::types::traits::ContractCallService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// [`ContractCallService`] for the deposit contract.
pub struct RpcContractService {
    rpc: JsonRpcClient,
    contract: ContractDescriptor,
    wallet: Arc<JsonRpcWallet>,
}

impl RpcContractService {
    pub fn new(
        rpc_url: impl Into<String>,
        contract: ContractDescriptor,
        wallet: Arc<JsonRpcWallet>,
    ) -> Result<Self> {
        Ok(Self {
            rpc: JsonRpcClient::new(rpc_url)?,
            contract,
            wallet,
        })
    }

    #[must_use]
    pub fn contract(&self) -> &ContractDescriptor {
        &self.contract
    }
}

fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

#[async_trait]
impl ContractCallService for RpcContractService {
    async fn submit(&self, from: Address, request: &TransactionRequest) -> Result<TxHash> {
        let signer = self.wallet.signer().ok_or(DappError::WalletNotConnected)?;
        let data = self.contract.encode_request(request)?;

        let mut tx = json!({
            "from": from,
            "to": self.contract.address,
            "data": to_hex(&data),
        });
        if let Some(value) = request.value {
            tx["value"] = Value::String(format!("{value:#x}"));
        }

        let hash = signer
            .call::<TxHash>("eth_sendTransaction", json!([tx]))
            .await
            .map_err(|e| DappError::SubmissionError(e.status_text()))?;

        logging::log(
            logging::LogLevel::Info,
            &format!("{} submitted as {hash}", request.function),
        );
        Ok(hash)
    }

    async fn poll_receipt(&self, handle: &TxHash) -> Result<ReceiptStatus> {
        let receipt: Option<RpcReceipt> = self
            .rpc
            .call("eth_getTransactionReceipt", json!([handle]))
            .await?;

        let Some(receipt) = receipt else {
            return Ok(ReceiptStatus::Pending);
        };
        let Some(block_hex) = receipt.block_number else {
            return Ok(ReceiptStatus::Pending);
        };
        let block_number = parse_quantity(&block_hex)?;

        match receipt.status.as_deref().map(parse_quantity).transpose()? {
            Some(0) => Ok(ReceiptStatus::Failed {
                reason: format!("Transaction {handle} reverted in block {block_number}"),
            }),
            _ => Ok(ReceiptStatus::Confirmed { block_number }),
        }
    }

    async fn read_view(&self, function: &str, args: &[AbiValue]) -> Result<U256> {
        let abi_function = self.contract.function(function)?;
        if !abi_function.is_view() {
            return Err(DappError::AbiError(format!(
                "`{}` is not a view function",
                abi_function.signature()
            )));
        }
        let data = self.contract.encode_call(function, args, None)?;

        let output: Bytes = self
            .rpc
            .call(
                "eth_call",
                json!([{ "to": self.contract.address, "data": to_hex(&data) }, "latest"]),
            )
            .await?;
        decode_uint(&output)
    }

    async fn read_native_balance(&self, address: Address) -> Result<U256> {
        self.rpc
            .call("eth_getBalance", json!([address, "latest"]))
            .await
    }
}
