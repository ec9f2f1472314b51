//! Contract descriptor: address plus the parsed Solidity JSON ABI.
//!
//! Only the subset of the ABI the deposit contract needs is supported:
//! functions taking `uint256` or `address` arguments.

use std::collections::HashMap;

use alloy_primitives::{Address, U256, keccak256};
use serde::Deserialize;

use crate::common::error::{DappError, Result};
use crate::types::action::{AbiValue, TransactionRequest};

/// ABI of the deposit contract, bundled with the crate.
pub const DEPOSIT_ABI_JSON: &str = include_str!("../../abi/Deposit.json");

/// Functions the dapp calls. Loading fails if any is missing.
pub const REQUIRED_FUNCTIONS: [&str; 4] = ["deposit", "withdraw", "ownerWithdraw", "balanceOf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    Nonpayable,
    Payable,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Deserialize)]
struct AbiEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<AbiParam>,
    #[serde(default)]
    outputs: Vec<AbiParam>,
    #[serde(rename = "stateMutability")]
    state_mutability: Option<StateMutability>,
}

/// A contract function with its precomputed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiFunction {
    pub name: String,
    pub inputs: Vec<AbiParam>,
    pub outputs: Vec<AbiParam>,
    pub state_mutability: StateMutability,
    pub selector: [u8; 4],
}

impl AbiFunction {
    fn new(
        name: String,
        inputs: Vec<AbiParam>,
        outputs: Vec<AbiParam>,
        state_mutability: StateMutability,
    ) -> Self {
        let signature = signature(&name, &inputs);
        let hash = keccak256(signature.as_bytes());
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&hash[..4]);
        Self {
            name,
            inputs,
            outputs,
            state_mutability,
            selector,
        }
    }

    /// Canonical signature, e.g. `withdraw(uint256)`.
    #[must_use]
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    #[must_use]
    pub fn is_payable(&self) -> bool {
        self.state_mutability == StateMutability::Payable
    }

    #[must_use]
    pub fn is_view(&self) -> bool {
        matches!(
            self.state_mutability,
            StateMutability::View | StateMutability::Pure
        )
    }
}

fn signature(name: &str, inputs: &[AbiParam]) -> String {
    let types: Vec<&str> = inputs.iter().map(|p| p.ty.as_str()).collect();
    format!("{name}({})", types.join(","))
}

/// Static address + ABI pair for the deposit contract.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    pub address: Address,
    functions: HashMap<String, AbiFunction>,
}

impl ContractDescriptor {
    /// The deposit contract at `address`, using the bundled ABI.
    pub fn deposit_contract(address: Address) -> Result<Self> {
        Self::from_abi_json(address, DEPOSIT_ABI_JSON)
    }

    /// Parses a Solidity JSON ABI and checks that every required function is
    /// present.
    pub fn from_abi_json(address: Address, json: &str) -> Result<Self> {
        let entries: Vec<AbiEntry> = serde_json::from_str(json)
            .map_err(|e| DappError::AbiError(format!("malformed ABI: {e}")))?;

        let mut functions = HashMap::new();
        for entry in entries.into_iter().filter(|e| e.kind == "function") {
            let name = entry
                .name
                .ok_or_else(|| DappError::AbiError("function entry without a name".to_string()))?;
            let mutability = entry.state_mutability.unwrap_or(StateMutability::Nonpayable);
            // Overloads are not supported; the first definition wins.
            functions
                .entry(name.clone())
                .or_insert_with(|| AbiFunction::new(name, entry.inputs, entry.outputs, mutability));
        }

        for required in REQUIRED_FUNCTIONS {
            if !functions.contains_key(required) {
                return Err(DappError::AbiError(format!(
                    "ABI is missing required function `{required}`"
                )));
            }
        }

        Ok(Self { address, functions })
    }

    pub fn function(&self, name: &str) -> Result<&AbiFunction> {
        self.functions
            .get(name)
            .ok_or_else(|| DappError::AbiError(format!("unknown function `{name}`")))
    }

    /// Encodes calldata for `name`. `value` is only allowed on payable
    /// functions.
    pub fn encode_call(
        &self,
        name: &str,
        args: &[AbiValue],
        value: Option<U256>,
    ) -> Result<Vec<u8>> {
        let function = self.function(name)?;

        if value.is_some_and(|v| !v.is_zero()) && !function.is_payable() {
            return Err(DappError::AbiError(format!(
                "`{}` is not payable but a value was attached",
                function.signature()
            )));
        }
        if args.len() != function.inputs.len() {
            return Err(DappError::AbiError(format!(
                "`{}` takes {} argument(s), got {}",
                function.signature(),
                function.inputs.len(),
                args.len()
            )));
        }

        let mut data = Vec::with_capacity(4 + 32 * args.len());
        data.extend_from_slice(&function.selector);
        for (param, arg) in function.inputs.iter().zip(args) {
            match (param.ty.as_str(), arg) {
                ("uint256", AbiValue::Uint(v)) => data.extend_from_slice(&v.to_be_bytes::<32>()),
                ("address", AbiValue::Address(a)) => data.extend_from_slice(a.into_word().as_slice()),
                (ty, other) => {
                    return Err(DappError::AbiError(format!(
                        "argument `{}` of `{}` expects {ty}, got {other:?}",
                        param.name,
                        function.signature()
                    )));
                }
            }
        }
        Ok(data)
    }

    /// Encodes the calldata for a dapp request.
    pub fn encode_request(&self, request: &TransactionRequest) -> Result<Vec<u8>> {
        self.encode_call(request.function, &request.args, request.value)
    }
}

/// Decodes a single `uint256` return value.
pub fn decode_uint(data: &[u8]) -> Result<U256> {
    if data.len() < 32 {
        return Err(DappError::AbiError(format!(
            "expected a 32-byte uint256 return value, got {} byte(s)",
            data.len()
        )));
    }
    U256::try_from_be_slice(&data[..32])
        .ok_or_else(|| DappError::AbiError("uint256 out of range".to_string()))
}
