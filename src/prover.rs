//! Withdrawal proof collaborator
//!
//! Finalizing a withdrawal on L1 needs the withdrawal message and, for the
//! prove step, a storage proof of the message against an L2 output root.
//! Producing that proof depends on the rollup's state layout, so it is left to
//! a [`WithdrawalProver`] implementation; this module only fixes the payload
//! envelope the L1 bridge adapter expects.

use alloy::primitives::{Bytes, B256, U256};
use alloy::sol_types::SolValue;
use async_trait::async_trait;

use crate::evm::contracts::{
    FinalizeWithdrawERC20Payload, OutputRootProof, ProveWithdrawalParams, WithdrawalTransaction,
    ACTION_FINALIZE_WITHDRAWAL, ACTION_PROVE_WITHDRAWAL,
};
use crate::nonce::NonceDecodeError;

/// Proof that a withdrawal message was passed on L2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalProof {
    pub withdrawal: WithdrawalTransaction,
    pub l2_output_index: U256,
    pub output_root_proof: OutputRootProof,
    /// Storage proof of the message in the L2 message passer
    pub withdrawal_proof: Vec<Bytes>,
}

/// Encode the adapter payload for the prove step
pub fn encode_prove_withdrawal_payload(proof: &WithdrawalProof) -> Bytes {
    let params = ProveWithdrawalParams {
        withdrawalTransaction: proof.withdrawal.clone(),
        l2OutputIndex: proof.l2_output_index,
        outputRootProof: proof.output_root_proof.clone(),
        withdrawalProof: proof.withdrawal_proof.clone(),
    };
    envelope(ACTION_PROVE_WITHDRAWAL, params.abi_encode())
}

/// Encode the adapter payload for the finalize step
pub fn encode_finalize_withdrawal_payload(withdrawal: &WithdrawalTransaction) -> Bytes {
    envelope(ACTION_FINALIZE_WITHDRAWAL, withdrawal.abi_encode())
}

/// Read the message passer nonce back out of a finalize payload.
///
/// The L1 liquidity manager echoes the payload it finalized with as the
/// `bridgeSpecificData` of its received event.
pub fn decode_finalize_withdrawal_nonce(payload: &[u8]) -> Result<U256, NonceDecodeError> {
    let envelope = FinalizeWithdrawERC20Payload::abi_decode(payload, true)?;
    if envelope.action != ACTION_FINALIZE_WITHDRAWAL {
        return Err(NonceDecodeError::UnexpectedAction(envelope.action));
    }
    Ok(WithdrawalTransaction::abi_decode(&envelope.data, true)?.nonce)
}

fn envelope(action: u8, data: Vec<u8>) -> Bytes {
    FinalizeWithdrawERC20Payload {
        action,
        data: data.into(),
    }
    .abi_encode()
    .into()
}

/// Generates withdrawal proofs from L2 transaction receipts
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait WithdrawalProver: Send + Sync {
    /// Build the proof for the withdrawal initiated in `tx_hash` on L2
    async fn prove(&self, tx_hash: B256) -> eyre::Result<WithdrawalProof>;

    fn encode_prove_withdrawal_payload(&self, proof: &WithdrawalProof) -> Bytes {
        encode_prove_withdrawal_payload(proof)
    }

    fn encode_finalize_withdrawal_payload(&self, withdrawal: &WithdrawalTransaction) -> Bytes {
        encode_finalize_withdrawal_payload(withdrawal)
    }
}
