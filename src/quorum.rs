//! Payload agreement across independent observers
//!
//! Every observer proposes the bridge payload it saw for a transfer. The
//! payload is accepted only if more than `f` observers proposed one and all of
//! them carry the same nonce.

use alloy::primitives::Bytes;

use crate::error::{BridgeError, Result};
use crate::nonce::decode_nonce;

/// Return the first payload if more than `f` payloads agree on one nonce
pub fn quorumized_bridge_payload(payloads: &[Bytes], f: usize) -> Result<Bytes> {
    if payloads.len() <= f {
        return Err(BridgeError::InsufficientPayloads {
            got: payloads.len(),
            f,
        });
    }

    let mut expected = None;
    for (index, payload) in payloads.iter().enumerate() {
        let nonce = decode_nonce(payload).map_err(|source| BridgeError::PayloadDecode {
            index,
            data_hex: hex::encode(payload),
            source,
        })?;

        match expected {
            None => expected = Some(nonce),
            Some(first) if first != nonce => {
                return Err(BridgeError::NonceMismatch {
                    index,
                    expected: first,
                    got: nonce,
                });
            }
            Some(_) => {}
        }
    }

    Ok(payloads[0].clone())
}
