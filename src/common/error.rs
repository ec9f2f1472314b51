//! Error types for the deposit dapp.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is the single [`DappError`] enum.

use alloy_primitives::TxHash;
use thiserror::Error;

/// Errors raised while driving wallet sessions and contract calls.
#[derive(Debug, Error)]
pub enum DappError {
    /// Another action already occupies the single action slot.
    #[error("Another transaction is already in progress")]
    Busy,

    /// Deposit or withdraw was requested with an empty amount field.
    #[error("Amount is required")]
    EmptyAmount,

    /// The amount text is not a valid ether value.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// An operation needs a connected account and none is present.
    #[error("Wallet is not connected")]
    WalletNotConnected,

    /// The wallet or node rejected the transaction. Displayed verbatim.
    #[error("{0}")]
    SubmissionError(String),

    /// JSON-RPC level error object returned by an endpoint.
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpcError { code: i64, message: String },

    /// Malformed or unexpected RPC response.
    #[error("RPC error: {0}")]
    RpcError(String),

    /// Transport failure talking to an HTTP endpoint.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The wallet is connected to a different chain than configured.
    #[error("Wallet is on chain {actual}, expected chain {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Contract ABI could not be loaded or a call could not be encoded.
    #[error("ABI error: {0}")]
    AbiError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No receipt arrived before the confirmation timeout elapsed.
    #[error("Timed out waiting for confirmation of {0}")]
    ConfirmationTimeout(TxHash),

    /// The wait was aborted by shutdown.
    #[error("Operation cancelled")]
    Cancelled,

    /// Filesystem failure (session store).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invariant violation inside the crate.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DappError {
    /// Text shown to the user when this error ends an action.
    #[must_use]
    pub fn status_text(&self) -> String {
        match self {
            Self::JsonRpcError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DappError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_error_is_verbatim() {
        let err = DappError::SubmissionError("insufficient funds".to_string());
        assert_eq!(err.to_string(), "insufficient funds");
        assert_eq!(err.status_text(), "insufficient funds");
    }

    #[test]
    fn test_json_rpc_status_text_drops_code() {
        let err = DappError::JsonRpcError {
            code: 4001,
            message: "User rejected the request.".to_string(),
        };
        assert_eq!(err.status_text(), "User rejected the request.");
        assert!(err.to_string().contains("4001"));
    }
}
