//! Transfer nonce codec
//!
//! The bridge adapter returns the transfer nonce ABI-encoded as a single
//! `uint256` in `bridgeReturnData`. The same word travels in the native
//! bridge's `extraData` and in the `bridgeSpecificData` of the step and
//! received events, which is what makes the three streams joinable.

use alloy::primitives::{Bytes, U256};
use alloy::sol_types::SolValue;
use thiserror::Error;

/// ABI-encoded size of a single `uint256`
pub const NONCE_WORD_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum NonceDecodeError {
    #[error("expected exactly 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("abi decode: {0}")]
    Abi(#[from] alloy::sol_types::Error),

    #[error("expected a finalize withdrawal payload, got action {0}")]
    UnexpectedAction(u8),
}

/// Decode exactly one `uint256` from `data`
pub fn decode_nonce(data: &[u8]) -> Result<U256, NonceDecodeError> {
    if data.len() != NONCE_WORD_SIZE {
        return Err(NonceDecodeError::InvalidLength(data.len()));
    }
    Ok(U256::abi_decode(data, true)?)
}

/// Encode a nonce the way the bridge adapter does
pub fn encode_nonce(nonce: U256) -> Bytes {
    Bytes::from(nonce.abi_encode())
}
