//! Error types for liquidity transfer reconciliation
//!
//! Every variant is fatal to the call that produced it. Events whose
//! participant addresses do not match the configured contracts are not errors:
//! they are skipped and logged where the matching happens.

use alloy::primitives::{B256, U256};
use thiserror::Error;

use crate::nonce::NonceDecodeError;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    // ========================================================================
    // Matching Errors
    // ========================================================================

    #[error("failed to decode nonce from {field} of tx {tx_hash} (data 0x{data_hex}): {source}")]
    NonceDecode {
        tx_hash: B256,
        field: &'static str,
        data_hex: String,
        source: NonceDecodeError,
    },

    #[error("ready transfers and ready payloads differ in length: {ready} != {payloads}")]
    ReadyDataMismatch { ready: usize, payloads: usize },

    // ========================================================================
    // Quorum Errors
    // ========================================================================

    #[error("not enough payloads: got {got}, need more than {f}")]
    InsufficientPayloads { got: usize, f: usize },

    #[error("failed to decode nonce from payload {index} (data 0x{data_hex}): {source}")]
    PayloadDecode {
        index: usize,
        data_hex: String,
        source: NonceDecodeError,
    },

    #[error("nonce mismatch in payload {index}: expected {expected}, got {got}")]
    NonceMismatch {
        index: usize,
        expected: U256,
        got: U256,
    },

    // ========================================================================
    // Collaborator Errors
    // ========================================================================

    #[error("{context}: {report:#}")]
    External {
        context: String,
        report: eyre::Report,
    },

    #[error("failed to unregister log filters: {}", .errors.join("; "))]
    Close { errors: Vec<String> },
}

impl BridgeError {
    /// Wrap a nonce decode failure with the offending transaction and payload
    pub fn nonce_decode(
        tx_hash: B256,
        field: &'static str,
        data: &[u8],
        source: NonceDecodeError,
    ) -> Self {
        BridgeError::NonceDecode {
            tx_hash,
            field,
            data_hex: hex::encode(data),
            source,
        }
    }

    /// Wrap a collaborator failure with operation context
    pub fn external(context: impl Into<String>, report: eyre::Report) -> Self {
        BridgeError::External {
            context: context.into(),
            report,
        }
    }
}

/// Attach operation context to collaborator results
pub trait ExternalContext<T> {
    fn external_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> ExternalContext<T> for eyre::Result<T> {
    fn external_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|report| BridgeError::external(f(), report))
    }
}
