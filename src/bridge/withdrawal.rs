//! L2 -> L1 withdrawals, proven then finalized on L1

use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::Log;
use async_trait::async_trait;
use eyre::eyre;
use std::sync::Arc;
use tracing::debug;

use super::{Partition, StepSource, TransferStrategy};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, ExternalContext, Result};
use crate::evm::{topics, FinalizationStepEvent, SentEvent};
use crate::matching::{partition_withdrawals, WithdrawalExpectations};
use crate::prover::WithdrawalProver;
use crate::types::Direction;

/// `FinalizationStepCompleted` indexes `remoteChainSelector` as topic 2
const STEP_REMOTE_SELECTOR_TOPIC_INDEX: usize = 2;

#[derive(Clone)]
pub struct WithdrawalStrategy {
    prover: Arc<dyn WithdrawalProver>,
}

impl WithdrawalStrategy {
    pub fn new(prover: Arc<dyn WithdrawalProver>) -> Self {
        Self { prover }
    }
}

#[async_trait]
impl TransferStrategy for WithdrawalStrategy {
    type Step = FinalizationStepEvent;

    fn direction(&self) -> Direction {
        Direction::Withdrawal
    }

    fn step_source(&self, config: &BridgeConfig) -> StepSource {
        StepSource {
            address: config.remote_liquidity_manager,
            event: topics::topic(topics::FINALIZATION_STEP_COMPLETED),
            topic_index: STEP_REMOTE_SELECTOR_TOPIC_INDEX,
            value: config.local_selector.to_topic(),
        }
    }

    fn parse_step(&self, log: &Log) -> eyre::Result<FinalizationStepEvent> {
        FinalizationStepEvent::from_log(log)
    }

    fn partition(
        &self,
        config: &BridgeConfig,
        _local_token: Address,
        sent: &[SentEvent],
        steps: &[FinalizationStepEvent],
        received: &[SentEvent],
    ) -> Result<Partition> {
        let expected = WithdrawalExpectations {
            local_selector: config.local_selector,
            remote_liquidity_manager: config.remote_liquidity_manager,
        };
        let partition = partition_withdrawals(&expected, sent, steps, received)?;

        Ok(Partition {
            not_ready: partition.needs_to_be_proven,
            ready: partition.needs_to_be_finalized,
        })
    }

    /// Proven withdrawals are finalized with the withdrawal message proven
    /// for the sent transaction. The message nonce must be the sent nonce,
    /// since L1 echoes the payload back as the received nonce.
    async fn ready_payloads(&self, ready: &[SentEvent]) -> Result<Vec<Bytes>> {
        let mut payloads = Vec::with_capacity(ready.len());
        for event in ready {
            let tx_hash = event.raw.tx_hash;
            let sent_nonce = event.sent_nonce()?;
            let proof = self
                .prover
                .prove(tx_hash)
                .await
                .external_context(|| format!("prove withdrawal {}", tx_hash))?;
            if proof.withdrawal.nonce != sent_nonce {
                return Err(BridgeError::external(
                    format!("prove withdrawal {}", tx_hash),
                    eyre!(
                        "withdrawal message nonce {} does not match sent nonce {}",
                        proof.withdrawal.nonce,
                        sent_nonce
                    ),
                ));
            }
            debug!(tx_hash = %tx_hash, l2_output_index = %proof.l2_output_index, "Withdrawal proven");
            payloads.push(
                self.prover
                    .encode_finalize_withdrawal_payload(&proof.withdrawal),
            );
        }
        Ok(payloads)
    }
}
